//! 密码重置应用服务
//!
//! 签发单次有效的重置令牌并通过邮件投递明文，
//! 存储侧只保留令牌哈希。

use std::sync::Arc;

use aegis_adapter_email::EmailSender;
use aegis_config::PasswordResetConfig;
use aegis_errors::{AppError, AppResult};
use chrono::{Duration, Utc};
use rand::Rng;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::domain::entities::Account;
use crate::domain::repositories::AccountRepository;
use crate::domain::services::PasswordService;
use crate::domain::value_objects::Email;
use crate::infrastructure::metrics;

/// 密码重置服务
pub struct PasswordResetService {
    accounts: Arc<dyn AccountRepository>,
    mailer: Arc<dyn EmailSender>,
    config: PasswordResetConfig,
}

impl PasswordResetService {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        mailer: Arc<dyn EmailSender>,
        config: PasswordResetConfig,
    ) -> Self {
        Self {
            accounts,
            mailer,
            config,
        }
    }

    /// 请求密码重置
    ///
    /// 未知邮箱按成功处理，不暴露账户是否存在。
    /// 邮件投递失败时回滚已写入的令牌字段再上报错误，
    /// 不给投递失败的请求留下可用令牌。
    pub async fn request_reset(&self, email: &str) -> AppResult<()> {
        let email = Email::new(email)?;

        let Some(mut account) = self.accounts.find_by_email(&email).await? else {
            debug!(email = %email, "Password reset requested for unknown email");
            return Ok(());
        };

        // 1. 生成令牌：32 随机字节，十六进制编码即发给用户的明文
        let token_bytes: [u8; 32] = rand::thread_rng().r#gen();
        let token_string = hex::encode(token_bytes);

        // 2. 只存哈希和过期时间
        let token_hash = sha256_hex(&token_string);
        let expires_at = Utc::now() + Duration::minutes(self.config.token_expires_minutes);
        account.set_reset_token(token_hash, expires_at);
        account.audit_info.update(None);
        self.accounts.update(&account).await?;

        // 3. 投递明文令牌，失败则回滚
        if let Err(e) = self.send_reset_email(&account, &token_string).await {
            warn!(
                account_id = %account.id,
                error = %e,
                "Reset email delivery failed, rolling back token"
            );
            account.clear_reset_token();
            account.audit_info.update(None);
            self.accounts.update(&account).await?;
            metrics::record_password_reset_completed(false);
            return Err(e);
        }

        metrics::record_password_reset_requested();
        info!(
            account_id = %account.id,
            expires_at = %expires_at,
            "Password reset token issued"
        );
        Ok(())
    }

    /// 兑换重置令牌，设置新密码
    ///
    /// 令牌单次有效：成功兑换清除存储的哈希，再次出示同一令牌失败。
    /// 成功重置同时解除锁定，持有邮箱即证明了账户所有权。
    pub async fn redeem(&self, token: &str, new_password: &str) -> AppResult<()> {
        let token_hash = sha256_hex(token);

        // 1. 按哈希查找，过期的令牌等同不存在
        let Some(mut account) = self
            .accounts
            .find_by_reset_token_hash(&token_hash, Utc::now())
            .await?
        else {
            warn!("Invalid or expired password reset token presented");
            return Err(AppError::token_invalid_or_expired(
                "Invalid or expired reset token",
            ));
        };

        // 2. 强度校验失败在任何状态改变之前返回，令牌保持可用
        let password_hash = PasswordService::hash_password(new_password)?;
        account.set_password(password_hash);

        // 3. 清除令牌字段和锁定状态后落库
        account.clear_reset_token();
        account.clear_lockout();
        account.audit_info.update(None);
        self.accounts.update(&account).await?;

        metrics::record_password_reset_completed(true);
        info!(account_id = %account.id, "Password reset completed");
        Ok(())
    }

    async fn send_reset_email(&self, account: &Account, token: &str) -> AppResult<()> {
        let subject = "Password reset request";
        let text_body = format!(
            "Hello {},\n\n\
             Your password reset token is: {}\n\n\
             It expires in {} minutes. If you did not request a reset, ignore this email.",
            account.username, token, self.config.token_expires_minutes
        );
        let html_body = format!(
            "<p>Hello {},</p>\
             <p>Your password reset token is:</p>\
             <p><code>{}</code></p>\
             <p>It expires in {} minutes. If you did not request a reset, ignore this email.</p>",
            account.username, token, self.config.token_expires_minutes
        );

        self.mailer
            .send_html_email(account.email.as_str(), subject, &html_body, Some(&text_body))
            .await
    }
}

fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}
