//! 应用层数据传输对象

use aegis_common::AccountId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::{Account, Role};

/// 一对新签发的令牌
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// 访问令牌有效期（秒）
    pub expires_in: i64,
}

impl TokenPair {
    pub fn new(access_token: String, refresh_token: String, expires_in: i64) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in,
        }
    }
}

/// TOTP 注册结果
///
/// `secret` 只在这里返回一次，之后服务端不再吐出。
#[derive(Debug, Clone, Serialize)]
pub struct TotpEnrollment {
    pub secret: String,
    pub otpauth_url: String,
}

/// 登出结果
///
/// 登出是幂等的：无效令牌或已移除的令牌不报错。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutStatus {
    LoggedOut,
    AlreadyLoggedOut,
}

/// 对外暴露的账户视图
///
/// 不携带密码哈希、TOTP 密钥、刷新令牌和重置令牌字段。
#[derive(Debug, Clone, Serialize)]
pub struct AccountView {
    pub id: AccountId,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub totp_enabled: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&Account> for AccountView {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id.clone(),
            username: account.username.as_str().to_string(),
            email: account.email.as_str().to_string(),
            role: account.role,
            totp_enabled: account.totp_enabled,
            created_at: account.audit_info.created_at,
        }
    }
}

/// 注册请求
#[derive(Debug, Clone, Deserialize)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// 账户更新请求，None 字段保持原值
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
}
