//! aegis-errors - 统一错误处理
//!
//! 基于 RFC 7807 Problem Details 规范

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 应用错误类型
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// 登录失败。不区分「账户不存在」和「密码错误」，防止账户枚举
    #[error("Invalid credentials or account not found")]
    InvalidCredentials,

    /// 账户锁定，携带剩余锁定分钟数
    #[error("Account locked. Try again in {0} minutes")]
    AccountLocked(i64),

    #[error("Invalid verification code: {0}")]
    InvalidCode(String),

    #[error("Two-factor authentication not provisioned: {0}")]
    NotProvisioned(String),

    #[error("Token invalid or expired: {0}")]
    TokenInvalidOrExpired(String),

    #[error("Token revoked: {0}")]
    TokenRevoked(String),

    #[error("Delivery failed: {0}")]
    DeliveryFailed(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl AppError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_credentials() -> Self {
        Self::InvalidCredentials
    }

    pub fn account_locked(remaining_minutes: i64) -> Self {
        Self::AccountLocked(remaining_minutes)
    }

    pub fn invalid_code(msg: impl Into<String>) -> Self {
        Self::InvalidCode(msg.into())
    }

    pub fn not_provisioned(msg: impl Into<String>) -> Self {
        Self::NotProvisioned(msg.into())
    }

    pub fn token_invalid_or_expired(msg: impl Into<String>) -> Self {
        Self::TokenInvalidOrExpired(msg.into())
    }

    pub fn token_revoked(msg: impl Into<String>) -> Self {
        Self::TokenRevoked(msg.into())
    }

    pub fn delivery_failed(msg: impl Into<String>) -> Self {
        Self::DeliveryFailed(msg.into())
    }

    pub fn permission_denied(msg: impl Into<String>) -> Self {
        Self::PermissionDenied(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    /// 转换为 HTTP 状态码
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Validation(_) => 400,
            Self::InvalidCredentials => 401,
            Self::AccountLocked(_) => 403,
            Self::InvalidCode(_) => 401,
            Self::NotProvisioned(_) => 400,
            Self::TokenInvalidOrExpired(_) => 401,
            Self::TokenRevoked(_) => 403,
            Self::DeliveryFailed(_) => 502,
            Self::PermissionDenied(_) => 403,
            Self::Conflict(_) => 409,
            Self::Internal(_) => 500,
            Self::Database(_) => 500,
        }
    }

    /// 转换为 Problem Details
    pub fn to_problem_details(&self) -> ProblemDetails {
        ProblemDetails {
            r#type: self.problem_type(),
            title: self.problem_title(),
            status: self.status_code(),
            detail: self.to_string(),
            instance: None,
        }
    }

    fn problem_type(&self) -> String {
        let slug = match self {
            Self::NotFound(_) => "not-found",
            Self::Validation(_) => "validation",
            Self::InvalidCredentials => "invalid-credentials",
            Self::AccountLocked(_) => "account-locked",
            Self::InvalidCode(_) => "invalid-code",
            Self::NotProvisioned(_) => "not-provisioned",
            Self::TokenInvalidOrExpired(_) => "token-invalid-or-expired",
            Self::TokenRevoked(_) => "token-revoked",
            Self::DeliveryFailed(_) => "delivery-failed",
            Self::PermissionDenied(_) => "permission-denied",
            Self::Conflict(_) => "conflict",
            Self::Internal(_) => "internal",
            Self::Database(_) => "database",
        };
        format!("https://api.aegis-auth.dev/problems/{}", slug)
    }

    fn problem_title(&self) -> String {
        match self {
            Self::NotFound(_) => "Resource Not Found",
            Self::Validation(_) => "Validation Error",
            Self::InvalidCredentials => "Invalid Credentials",
            Self::AccountLocked(_) => "Account Locked",
            Self::InvalidCode(_) => "Invalid Verification Code",
            Self::NotProvisioned(_) => "Second Factor Not Provisioned",
            Self::TokenInvalidOrExpired(_) => "Token Invalid Or Expired",
            Self::TokenRevoked(_) => "Token Revoked",
            Self::DeliveryFailed(_) => "Delivery Failed",
            Self::PermissionDenied(_) => "Permission Denied",
            Self::Conflict(_) => "Conflict",
            Self::Internal(_) => "Internal Server Error",
            Self::Database(_) => "Database Error",
        }
        .to_string()
    }
}

/// RFC 7807 Problem Details
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemDetails {
    pub r#type: String,
    pub title: String,
    pub status: u16,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
}

/// Result 类型别名
pub type AppResult<T> = Result<T, AppError>;
