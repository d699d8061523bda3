//! TOTP 服务
//!
//! 提供 TOTP 密钥生成、otpauth URI 构建和动态码验证

use aegis_errors::{AppError, AppResult};
use chrono::Utc;
use data_encoding::BASE32;
use rand::Rng;
use totp_rs::{Algorithm, Secret, TOTP};

/// 时间步长（秒）
const TIME_STEP_SECS: i64 = 30;

/// 注册确认允许 ±2 步时钟漂移
const ENROLLMENT_WINDOW_STEPS: i64 = 2;

/// 登录验证收紧为 ±1 步
const LOGIN_WINDOW_STEPS: i64 = 1;

/// TOTP 服务
pub struct TotpService {
    issuer: String,
}

impl TotpService {
    pub fn new(issuer: String) -> Self {
        Self { issuer }
    }

    /// 生成 TOTP 密钥（20 随机字节的 Base32 编码）
    pub fn generate_secret(&self) -> String {
        let mut rng = rand::thread_rng();
        let secret_bytes: Vec<u8> = (0..20).map(|_| rng.r#gen()).collect();

        BASE32.encode(&secret_bytes)
    }

    /// 构建注册用的 otpauth:// URI
    pub fn enrollment_uri(&self, email: &str, secret: &str) -> String {
        format!(
            "otpauth://totp/{}:{}?secret={}&issuer={}&algorithm=SHA1&digits=6&period=30",
            urlencoding::encode(&self.issuer),
            urlencoding::encode(email),
            secret,
            urlencoding::encode(&self.issuer)
        )
    }

    /// 验证注册确认码
    pub fn verify_enrollment_code(&self, secret: &str, code: &str) -> AppResult<bool> {
        self.verify_at(
            secret,
            code,
            Utc::now().timestamp(),
            ENROLLMENT_WINDOW_STEPS,
        )
    }

    /// 验证登录动态码
    pub fn verify_login_code(&self, secret: &str, code: &str) -> AppResult<bool> {
        self.verify_at(secret, code, Utc::now().timestamp(), LOGIN_WINDOW_STEPS)
    }

    /// 在指定时间点验证动态码
    ///
    /// 遍历整个窗口而不提前返回，逐候选做常数时间比较，
    /// 响应耗时不泄露命中的是哪一步。
    pub fn verify_at(
        &self,
        secret: &str,
        code: &str,
        at_unix: i64,
        window_steps: i64,
    ) -> AppResult<bool> {
        let totp = self.create_totp(secret)?;

        let mut matched = false;
        for step in -window_steps..=window_steps {
            let ts = at_unix + step * TIME_STEP_SECS;
            if ts < 0 {
                continue;
            }
            let candidate = totp.generate(ts as u64);
            matched |= constant_time_eq(candidate.as_bytes(), code.as_bytes());
        }

        Ok(matched)
    }

    /// 创建 TOTP 实例
    fn create_totp(&self, secret: &str) -> AppResult<TOTP> {
        let secret = Secret::Encoded(secret.to_string())
            .to_bytes()
            .map_err(|e| AppError::internal(format!("Invalid secret: {}", e)))?;

        TOTP::new(
            Algorithm::SHA1,
            6,  // 6 位数字
            1,  // 1 步时间窗口
            30, // 30 秒有效期
            secret,
        )
        .map_err(|e| AppError::internal(format!("Failed to create TOTP: {}", e)))
    }
}

/// 常数时间字节比较
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
