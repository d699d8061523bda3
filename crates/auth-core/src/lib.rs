//! aegis-auth-core - 认证核心库
//!
//! JWT 签发与验证。访问令牌和刷新令牌使用独立密钥，
//! 两类令牌不可互换使用。

use aegis_common::AccountId;
use aegis_errors::{AppError, AppResult};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT Claims
///
/// 访问令牌携带身份快照 (username/email/role)；
/// 刷新令牌只携带账户 ID，身份字段为空。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (account ID)
    pub sub: String,
    /// Username
    #[serde(default)]
    pub username: String,
    /// Email
    #[serde(default)]
    pub email: String,
    /// Role
    #[serde(default)]
    pub role: String,
    /// Expiration time
    pub exp: i64,
    /// Issued at
    pub iat: i64,
    /// JWT ID
    pub jti: String,
    /// Token type (access or refresh)
    #[serde(default)]
    pub token_type: String,
}

impl Claims {
    pub fn new(
        account_id: &AccountId,
        username: &str,
        email: &str,
        role: &str,
        expires_in_secs: i64,
        token_type: &str,
    ) -> Self {
        let now = Utc::now();
        Self {
            sub: account_id.0.to_string(),
            username: username.to_string(),
            email: email.to_string(),
            role: role.to_string(),
            exp: (now + Duration::seconds(expires_in_secs)).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::now_v7().to_string(),
            token_type: token_type.to_string(),
        }
    }

    pub fn account_id(&self) -> AppResult<AccountId> {
        Uuid::parse_str(&self.sub)
            .map(AccountId::from_uuid)
            .map_err(|_| AppError::token_invalid_or_expired("Invalid account ID in token"))
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.role == role
    }

    /// 验证 token 类型
    pub fn is_access_token(&self) -> bool {
        self.token_type == "access"
    }

    /// 验证 token 类型
    pub fn is_refresh_token(&self) -> bool {
        self.token_type == "refresh"
    }
}

/// Token 服务
///
/// 无状态验证：有效性完全由签名和 exp 决定，
/// 吊销状态由调用方比对账户的刷新令牌集合。
#[derive(Clone)]
pub struct TokenService {
    access_encoding_key: EncodingKey,
    access_decoding_key: DecodingKey,
    refresh_encoding_key: EncodingKey,
    refresh_decoding_key: DecodingKey,
    access_expires_in: i64,
    refresh_expires_in: i64,
}

impl TokenService {
    pub fn new(
        access_secret: &str,
        refresh_secret: &str,
        access_expires_in: i64,
        refresh_expires_in: i64,
    ) -> Self {
        Self {
            access_encoding_key: EncodingKey::from_secret(access_secret.as_bytes()),
            access_decoding_key: DecodingKey::from_secret(access_secret.as_bytes()),
            refresh_encoding_key: EncodingKey::from_secret(refresh_secret.as_bytes()),
            refresh_decoding_key: DecodingKey::from_secret(refresh_secret.as_bytes()),
            access_expires_in,
            refresh_expires_in,
        }
    }

    /// 生成访问令牌
    pub fn generate_access_token(
        &self,
        account_id: &AccountId,
        username: &str,
        email: &str,
        role: &str,
    ) -> AppResult<String> {
        let claims = Claims::new(
            account_id,
            username,
            email,
            role,
            self.access_expires_in,
            "access",
        );

        encode(&Header::default(), &claims, &self.access_encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to generate access token: {}", e)))
    }

    /// 生成刷新令牌
    pub fn generate_refresh_token(&self, account_id: &AccountId) -> AppResult<String> {
        let claims = Claims::new(account_id, "", "", "", self.refresh_expires_in, "refresh");

        encode(&Header::default(), &claims, &self.refresh_encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to generate refresh token: {}", e)))
    }

    fn validate_token(&self, token: &str, decoding_key: &DecodingKey) -> AppResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.validate_nbf = false;
        validation.leeway = 0; // 不允许时间偏差

        let token_data = decode::<Claims>(token, decoding_key, &validation)
            .map_err(|e| AppError::token_invalid_or_expired(format!("Invalid token: {}", e)))?;

        let claims = token_data.claims;

        // 额外验证：检查 token 类型
        if claims.token_type.is_empty() {
            return Err(AppError::token_invalid_or_expired("Token type not specified"));
        }

        // 额外验证：检查 JTI 存在
        if claims.jti.is_empty() {
            return Err(AppError::token_invalid_or_expired("Token ID (jti) missing"));
        }

        Ok(claims)
    }

    /// 验证访问令牌（确保是 access token）
    pub fn validate_access_token(&self, token: &str) -> AppResult<Claims> {
        let claims = self.validate_token(token, &self.access_decoding_key)?;

        if !claims.is_access_token() {
            return Err(AppError::token_invalid_or_expired("Not an access token"));
        }

        Ok(claims)
    }

    /// 验证刷新令牌（确保是 refresh token）
    pub fn validate_refresh_token(&self, token: &str) -> AppResult<Claims> {
        let claims = self.validate_token(token, &self.refresh_decoding_key)?;

        if !claims.is_refresh_token() {
            return Err(AppError::token_invalid_or_expired("Not a refresh token"));
        }

        Ok(claims)
    }

    /// 获取访问令牌过期时间（秒）
    pub fn access_token_expires_in(&self) -> i64 {
        self.access_expires_in
    }
}

/// 角色检查宏
#[macro_export]
macro_rules! require_role {
    ($claims:expr, $role:expr) => {
        if !$claims.has_role($role) {
            return Err(aegis_errors::AppError::permission_denied(format!(
                "Missing role: {}",
                $role
            )));
        }
    };
}
