//! aegis-adapter-email - 邮件适配器
//!
//! 提供邮件发送功能，支持：
//! - SMTP 邮件发送
//! - HTML 和纯文本邮件

mod client;

pub use client::{EmailClient, EmailMessage};

// 重新导出 EmailConfig，调用方无需直接依赖 aegis-config
pub use aegis_config::EmailConfig;

use aegis_errors::AppResult;

/// 邮件发送接口
///
/// 传输失败映射为 `AppError::DeliveryFailed`，
/// 调用方据此回滚已持久化的状态 (如密码重置令牌)。
#[async_trait::async_trait]
pub trait EmailSender: Send + Sync {
    /// 发送纯文本邮件
    async fn send_text_email(&self, to: &str, subject: &str, body: &str) -> AppResult<()>;

    /// 发送 HTML 邮件
    async fn send_html_email(
        &self,
        to: &str,
        subject: &str,
        html_body: &str,
        text_body: Option<&str>,
    ) -> AppResult<()>;
}
