//! aegis-config - 统一配置管理
//!
//! 基于 figment 的分层配置加载：
//! 1. 默认配置文件 (config/default.toml)
//! 2. 环境配置文件 (config/{env}.toml)
//! 3. 环境变量 (最高优先级)
//!
//! 所有密钥字段使用 `secrecy::Secret` 包装，防止意外泄露到日志。

use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use secrecy::Secret;
use serde::Deserialize;

#[cfg(test)]
mod tests;

/// 配置加载错误
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] figment::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// 应用配置根结构
#[derive(Debug, Deserialize)]
pub struct AppConfig {
    /// 应用名称
    pub app_name: String,
    /// 运行环境 (development, staging, production)
    pub app_env: String,
    /// 可观测性配置
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    /// JWT 令牌配置
    pub jwt: JwtConfig,
    /// 登录失败锁定策略
    #[serde(default)]
    pub lockout: LockoutConfig,
    /// TOTP 双因素认证配置
    #[serde(default)]
    pub totp: TotpConfig,
    /// 密码重置配置
    #[serde(default)]
    pub password_reset: PasswordResetConfig,
    /// SMTP 邮件配置
    pub email: EmailConfig,
    /// 限流配置
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    /// 初始管理员账户配置
    #[serde(default)]
    pub seed_admin: SeedAdminConfig,
}

impl AppConfig {
    /// 从配置目录和环境变量加载配置
    ///
    /// 加载顺序 (后者覆盖前者):
    /// 1. {config_dir}/default.toml
    /// 2. {config_dir}/{APP_ENV}.toml
    /// 3. 环境变量 (JWT_ACCESS_SECRET 映射到 jwt.access_secret)
    pub fn load(config_dir: &str) -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config: AppConfig = Figment::new()
            .merge(Toml::file(format!("{config_dir}/default.toml")))
            .merge(Toml::file(format!("{config_dir}/{env}.toml")))
            .merge(Env::prefixed("").split("_"))
            .extract()?;

        config.validate()?;
        Ok(config)
    }

    /// 校验跨字段约束
    fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt.access_expires_in <= 0 {
            return Err(ConfigError::Invalid(
                "jwt.access_expires_in must be positive".to_string(),
            ));
        }
        if self.jwt.refresh_expires_in <= self.jwt.access_expires_in {
            return Err(ConfigError::Invalid(
                "jwt.refresh_expires_in must exceed jwt.access_expires_in".to_string(),
            ));
        }
        if self.lockout.max_failed_attempts == 0 {
            return Err(ConfigError::Invalid(
                "lockout.max_failed_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.app_env == "production"
    }

    pub fn is_development(&self) -> bool {
        self.app_env == "development"
    }
}

/// 可观测性配置
#[derive(Debug, Deserialize)]
pub struct TelemetryConfig {
    /// 日志级别 (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// JWT 令牌配置
///
/// 访问令牌和刷新令牌使用独立密钥签名，
/// 泄露其中一个不会危及另一类令牌。
#[derive(Debug, Deserialize)]
pub struct JwtConfig {
    /// 访问令牌签名密钥
    pub access_secret: Secret<String>,
    /// 刷新令牌签名密钥
    pub refresh_secret: Secret<String>,
    /// 访问令牌有效期 (秒)
    #[serde(default = "default_access_expires_in")]
    pub access_expires_in: i64,
    /// 刷新令牌有效期 (秒)
    #[serde(default = "default_refresh_expires_in")]
    pub refresh_expires_in: i64,
}

/// 登录失败锁定策略
#[derive(Debug, Clone, Deserialize)]
pub struct LockoutConfig {
    /// 触发锁定的连续失败次数
    #[serde(default = "default_max_failed_attempts")]
    pub max_failed_attempts: u32,
    /// 锁定持续时间 (分钟)
    #[serde(default = "default_lock_duration_minutes")]
    pub lock_duration_minutes: i64,
}

impl Default for LockoutConfig {
    fn default() -> Self {
        Self {
            max_failed_attempts: default_max_failed_attempts(),
            lock_duration_minutes: default_lock_duration_minutes(),
        }
    }
}

/// TOTP 双因素认证配置
#[derive(Debug, Clone, Deserialize)]
pub struct TotpConfig {
    /// otpauth URI 中的发行方名称
    #[serde(default = "default_totp_issuer")]
    pub issuer: String,
}

impl Default for TotpConfig {
    fn default() -> Self {
        Self {
            issuer: default_totp_issuer(),
        }
    }
}

/// 密码重置配置
#[derive(Debug, Clone, Deserialize)]
pub struct PasswordResetConfig {
    /// 重置令牌有效期 (分钟)
    #[serde(default = "default_reset_token_expires_minutes")]
    pub token_expires_minutes: i64,
}

impl Default for PasswordResetConfig {
    fn default() -> Self {
        Self {
            token_expires_minutes: default_reset_token_expires_minutes(),
        }
    }
}

/// SMTP 邮件配置
#[derive(Debug, Deserialize)]
pub struct EmailConfig {
    /// SMTP 服务器地址
    pub smtp_host: String,
    /// SMTP 服务器端口
    pub smtp_port: u16,
    /// SMTP 用户名
    pub username: String,
    /// SMTP 密码
    pub password: Secret<String>,
    /// 发件人邮箱
    pub from_email: String,
    /// 发件人名称
    pub from_name: String,
    /// 是否使用 STARTTLS
    #[serde(default = "default_use_tls")]
    pub use_tls: bool,
    /// 连接超时 (秒)
    #[serde(default = "default_email_timeout_secs")]
    pub timeout_secs: u64,
}

/// 单条限流规则 (固定窗口)
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitRule {
    /// 窗口内最大请求数
    pub max_requests: u64,
    /// 窗口长度 (秒)
    pub window_secs: u64,
    /// 突发容量 (额外允许的请求数)
    #[serde(default)]
    pub burst_size: u64,
}

/// 限流配置
///
/// login 和 password_reset 按邮箱限流，global 按来源 IP 限流。
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_rate_limit_enabled")]
    pub enabled: bool,
    /// 登录尝试限流
    #[serde(default = "default_login_rule")]
    pub login: RateLimitRule,
    /// 密码重置请求限流
    #[serde(default = "default_password_reset_rule")]
    pub password_reset: RateLimitRule,
    /// 全局限流
    #[serde(default = "default_global_rule")]
    pub global: RateLimitRule,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: default_rate_limit_enabled(),
            login: default_login_rule(),
            password_reset: default_password_reset_rule(),
            global: default_global_rule(),
        }
    }
}

/// 初始管理员账户配置
///
/// 仅在不存在任何管理员账户时生效。
#[derive(Debug, Deserialize)]
pub struct SeedAdminConfig {
    #[serde(default = "default_seed_admin_username")]
    pub username: String,
    #[serde(default = "default_seed_admin_email")]
    pub email: String,
    #[serde(default = "default_seed_admin_password")]
    pub password: Secret<String>,
}

impl Default for SeedAdminConfig {
    fn default() -> Self {
        Self {
            username: default_seed_admin_username(),
            email: default_seed_admin_email(),
            password: default_seed_admin_password(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_access_expires_in() -> i64 {
    1800
}

fn default_refresh_expires_in() -> i64 {
    604_800
}

fn default_max_failed_attempts() -> u32 {
    5
}

fn default_lock_duration_minutes() -> i64 {
    15
}

fn default_totp_issuer() -> String {
    "Aegis".to_string()
}

fn default_reset_token_expires_minutes() -> i64 {
    10
}

fn default_use_tls() -> bool {
    true
}

fn default_email_timeout_secs() -> u64 {
    30
}

fn default_rate_limit_enabled() -> bool {
    true
}

fn default_login_rule() -> RateLimitRule {
    RateLimitRule {
        max_requests: 5,
        window_secs: 300,
        burst_size: 0,
    }
}

fn default_password_reset_rule() -> RateLimitRule {
    RateLimitRule {
        max_requests: 3,
        window_secs: 600,
        burst_size: 0,
    }
}

fn default_global_rule() -> RateLimitRule {
    RateLimitRule {
        max_requests: 300,
        window_secs: 900,
        burst_size: 0,
    }
}

fn default_seed_admin_username() -> String {
    "admin".to_string()
}

fn default_seed_admin_email() -> String {
    "admin@aegis.local".to_string()
}

fn default_seed_admin_password() -> Secret<String> {
    Secret::new("Admin1234".to_string())
}
