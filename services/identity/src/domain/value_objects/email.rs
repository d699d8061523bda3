//! Email 值对象

use aegis_errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Email 值对象
///
/// 构造时归一化为小写，相等比较因此不区分大小写。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Email(String);

impl Email {
    /// 创建新的 Email
    pub fn new(email: impl Into<String>) -> AppResult<Self> {
        let email = email.into();

        // 使用 email_address crate 进行 RFC 5322 验证
        if !email_address::EmailAddress::is_valid(&email) {
            return Err(AppError::validation(format!("Invalid email format: {}", email)));
        }

        // 额外要求域名带点，拒绝裸主机名 (user@localhost)
        let domain_has_dot = email
            .rsplit('@')
            .next()
            .map(|domain| domain.contains('.'))
            .unwrap_or(false);
        if !domain_has_dot {
            return Err(AppError::validation(format!("Invalid email format: {}", email)));
        }

        Ok(Self(email.to_lowercase()))
    }

    /// 获取邮箱域名
    pub fn domain(&self) -> Option<&str> {
        self.0.split('@').nth(1)
    }

    /// 获取邮箱本地部分
    pub fn local_part(&self) -> Option<&str> {
        self.0.split('@').next()
    }

    /// 获取字符串引用
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
