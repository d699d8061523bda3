//! 账户实体

use aegis_common::{AccountId, AuditInfo};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{Email, HashedPassword, Username};

/// 每账户保留的刷新令牌数量上限
pub const MAX_REFRESH_TOKENS: usize = 5;

/// 账户角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Default for Role {
    fn default() -> Self {
        Self::User
    }
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 账户实体
///
/// 刷新令牌按插入顺序保存，位置 0 是最旧的一个；
/// TOTP 启用标志只有在密钥存在时才可能为 true。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub username: Username,
    pub email: Email,
    pub password_hash: HashedPassword,
    pub role: Role,
    pub failed_login_attempts: u32,
    pub is_locked: bool,
    pub lock_expires_at: Option<DateTime<Utc>>,
    pub totp_secret: Option<String>,
    pub totp_enabled: bool,
    pub reset_token_hash: Option<String>,
    pub reset_token_expires_at: Option<DateTime<Utc>>,
    pub refresh_tokens: Vec<String>,
    pub audit_info: AuditInfo,
}

impl Account {
    pub fn new(username: Username, email: Email, password_hash: HashedPassword) -> Self {
        Self {
            id: AccountId::new(),
            username,
            email,
            password_hash,
            role: Role::default(),
            failed_login_attempts: 0,
            is_locked: false,
            lock_expires_at: None,
            totp_secret: None,
            totp_enabled: false,
            reset_token_hash: None,
            reset_token_expires_at: None,
            refresh_tokens: Vec::new(),
            audit_info: AuditInfo::default(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// 追加刷新令牌，超出上限时淘汰最旧的
    pub fn push_refresh_token(&mut self, token: String) {
        self.refresh_tokens.push(token);
        while self.refresh_tokens.len() > MAX_REFRESH_TOKENS {
            self.refresh_tokens.remove(0);
        }
    }

    /// 移除指定刷新令牌，返回它此前是否在集合内
    pub fn remove_refresh_token(&mut self, token: &str) -> bool {
        let before = self.refresh_tokens.len();
        self.refresh_tokens.retain(|t| t != token);
        self.refresh_tokens.len() < before
    }

    pub fn has_refresh_token(&self, token: &str) -> bool {
        self.refresh_tokens.iter().any(|t| t == token)
    }

    /// 只保留满足谓词的刷新令牌
    pub fn retain_refresh_tokens(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.refresh_tokens.retain(|t| keep(t));
    }

    /// 写入新的 TOTP 密钥并退回待确认状态
    ///
    /// 重新注册会覆盖旧密钥；已启用的账户降级为未启用，
    /// 必须重新确认后才恢复二因素校验。
    pub fn provision_totp(&mut self, secret: String) {
        self.totp_secret = Some(secret);
        self.totp_enabled = false;
    }

    /// 启用 TOTP，调用方需保证密钥已写入
    pub fn enable_totp(&mut self) {
        self.totp_enabled = true;
    }

    pub fn set_reset_token(&mut self, token_hash: String, expires_at: DateTime<Utc>) {
        self.reset_token_hash = Some(token_hash);
        self.reset_token_expires_at = Some(expires_at);
    }

    pub fn clear_reset_token(&mut self) {
        self.reset_token_hash = None;
        self.reset_token_expires_at = None;
    }

    pub fn set_password(&mut self, password_hash: HashedPassword) {
        self.password_hash = password_hash;
    }

    /// 清除失败计数和锁定状态
    pub fn clear_lockout(&mut self) {
        self.failed_login_attempts = 0;
        self.is_locked = false;
        self.lock_expires_at = None;
    }
}
