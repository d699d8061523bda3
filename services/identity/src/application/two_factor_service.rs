//! 双因素认证应用服务
//!
//! TOTP 注册与确认。状态机：未开启 → enroll → 待确认 → confirm → 已启用；
//! 已启用的账户重新 enroll 会退回待确认。

use std::sync::Arc;

use aegis_common::AccountId;
use aegis_errors::{AppError, AppResult};
use tracing::info;

use crate::application::dto::TotpEnrollment;
use crate::domain::repositories::AccountRepository;
use crate::domain::services::TotpService;
use crate::infrastructure::metrics;

/// 双因素服务
pub struct TwoFactorService {
    accounts: Arc<dyn AccountRepository>,
    totp: TotpService,
}

impl TwoFactorService {
    pub fn new(accounts: Arc<dyn AccountRepository>, totp: TotpService) -> Self {
        Self { accounts, totp }
    }

    /// 开始 TOTP 注册
    ///
    /// 生成新密钥并无条件落库（覆盖旧密钥、清掉启用标志），
    /// 返回密钥和 otpauth URI。启用要等 `confirm_enrollment`。
    pub async fn enroll(&self, account_id: &AccountId) -> AppResult<TotpEnrollment> {
        let Some(mut account) = self.accounts.find_by_id(account_id).await? else {
            return Err(AppError::not_found("Account not found"));
        };

        let secret = self.totp.generate_secret();
        account.provision_totp(secret.clone());
        account.audit_info.update(Some(account_id.clone()));
        self.accounts.update(&account).await?;

        let otpauth_url = self.totp.enrollment_uri(account.email.as_str(), &secret);

        info!(account_id = %account.id, "TOTP enrollment started");
        Ok(TotpEnrollment { secret, otpauth_url })
    }

    /// 确认 TOTP 注册
    ///
    /// 确认窗口放宽到 ±2 步，容忍新设备的时钟漂移；
    /// 码错误返回 InvalidCode，状态不变，可以重试。
    pub async fn confirm_enrollment(&self, account_id: &AccountId, code: &str) -> AppResult<()> {
        let Some(mut account) = self.accounts.find_by_id(account_id).await? else {
            return Err(AppError::not_found("Account not found"));
        };

        let Some(secret) = account.totp_secret.clone() else {
            return Err(AppError::not_provisioned(
                "Two-factor enrollment has not been started",
            ));
        };

        if !self.totp.verify_enrollment_code(&secret, code)? {
            metrics::record_2fa_verification(false);
            return Err(AppError::invalid_code("Invalid two-factor code"));
        }

        account.enable_totp();
        account.audit_info.update(Some(account_id.clone()));
        self.accounts.update(&account).await?;

        metrics::record_2fa_verification(true);
        metrics::record_2fa_enabled();
        info!(account_id = %account.id, "TOTP enabled");
        Ok(())
    }
}
