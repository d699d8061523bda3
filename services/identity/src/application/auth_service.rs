//! 认证应用服务
//!
//! 登录、刷新令牌旋转、登出

use std::sync::Arc;

use aegis_auth_core::TokenService;
use aegis_errors::{AppError, AppResult};
use tracing::{debug, info, warn};

use crate::application::dto::{LogoutStatus, TokenPair};
use crate::domain::entities::Account;
use crate::domain::repositories::AccountRepository;
use crate::domain::services::{LockoutPolicy, PasswordService, TotpService};
use crate::domain::value_objects::Email;
use crate::infrastructure::metrics;

/// 认证服务
pub struct AuthService {
    accounts: Arc<dyn AccountRepository>,
    tokens: TokenService,
    lockout: LockoutPolicy,
    totp: TotpService,
}

impl AuthService {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        tokens: TokenService,
        lockout: LockoutPolicy,
        totp: TotpService,
    ) -> Self {
        Self {
            accounts,
            tokens,
            lockout,
            totp,
        }
    }

    /// 邮箱 + 密码登录，启用 2FA 的账户还需动态码
    ///
    /// 未知邮箱和密码错误返回同一个错误，避免账户枚举。
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        totp_code: Option<&str>,
    ) -> AppResult<TokenPair> {
        let email = Email::new(email)?;

        // 1. 查找账户
        let Some(mut account) = self.accounts.find_by_email(&email).await? else {
            debug!(email = %email, "Login attempt for unknown email");
            metrics::record_login_attempt(false, false);
            return Err(AppError::invalid_credentials());
        };

        // 2. 检查锁定状态，过期的锁按未锁定处理
        if let Some(remaining) = self.lockout.check(&account) {
            warn!(
                account_id = %account.id,
                remaining_minutes = remaining,
                "Login attempt on locked account"
            );
            metrics::record_login_attempt(false, account.totp_enabled);
            return Err(AppError::account_locked(remaining));
        }

        // 3. 校验密码；失败推进锁定计数并持久化后才返回
        if !PasswordService::verify_password(password, &account.password_hash)? {
            let just_locked = self.lockout.record_failure(&mut account);
            account.audit_info.update(None);
            self.accounts.update(&account).await?;

            metrics::record_login_attempt(false, account.totp_enabled);
            if just_locked {
                warn!(account_id = %account.id, "Account locked after repeated failures");
                metrics::record_account_locked("failed_attempts");
                return Err(AppError::account_locked(self.lockout.lock_duration_minutes()));
            }
            return Err(AppError::invalid_credentials());
        }

        // 4. 第二因素校验；动态码错误不计入锁定计数
        if account.totp_enabled {
            let secret = account
                .totp_secret
                .as_deref()
                .ok_or_else(|| AppError::not_provisioned("Two-factor secret missing"))?;
            let Some(code) = totp_code else {
                return Err(AppError::validation("Two-factor code is required"));
            };
            if !self.totp.verify_login_code(secret, code)? {
                metrics::record_2fa_verification(false);
                metrics::record_login_attempt(false, true);
                return Err(AppError::invalid_code("Invalid two-factor code"));
            }
            metrics::record_2fa_verification(true);
        }

        // 5. 签发令牌对，清除失败计数，持久化后返回
        let pair = self.issue_token_pair(&mut account)?;
        self.lockout.record_success(&mut account);
        account.audit_info.update(None);
        self.accounts.update(&account).await?;

        metrics::record_login_attempt(true, account.totp_enabled);
        metrics::record_session_created();
        info!(account_id = %account.id, "Login successful");
        Ok(pair)
    }

    /// 刷新令牌旋转：一次性使用，旧令牌换新令牌对
    pub async fn refresh_session(&self, refresh_token: &str) -> AppResult<TokenPair> {
        // 1. 签名与过期校验
        let claims = self.tokens.validate_refresh_token(refresh_token)?;
        let account_id = claims.account_id()?;

        // 2. 账户存在且令牌仍在活动集合内，否则视为已吊销
        let Some(mut account) = self.accounts.find_by_id(&account_id).await? else {
            warn!(account_id = %account_id, "Refresh token for missing account");
            metrics::record_session_revoked("account_missing");
            return Err(AppError::token_revoked("Refresh token is no longer valid"));
        };
        if !account.has_refresh_token(refresh_token) {
            warn!(account_id = %account.id, "Refresh token not in active set");
            metrics::record_session_revoked("not_in_set");
            return Err(AppError::token_revoked("Refresh token is no longer valid"));
        }

        // 3. 顺带清理集合里已过期或无效的令牌
        account.retain_refresh_tokens(|t| self.tokens.validate_refresh_token(t).is_ok());

        // 4. 旋转：移除本次出示的令牌
        account.remove_refresh_token(refresh_token);

        // 5. 签发新令牌对并持久化
        let pair = self.issue_token_pair(&mut account)?;
        account.audit_info.update(None);
        self.accounts.update(&account).await?;

        metrics::record_session_rotated();
        debug!(
            account_id = %account.id,
            active_tokens = account.refresh_tokens.len(),
            "Refresh token rotated"
        );
        Ok(pair)
    }

    /// 登出：从活动集合移除出示的刷新令牌
    ///
    /// 幂等操作，无效令牌、未知账户、已移除的令牌都按已登出处理。
    pub async fn logout(&self, refresh_token: &str) -> AppResult<LogoutStatus> {
        let Ok(claims) = self.tokens.validate_refresh_token(refresh_token) else {
            return Ok(LogoutStatus::AlreadyLoggedOut);
        };
        let Ok(account_id) = claims.account_id() else {
            return Ok(LogoutStatus::AlreadyLoggedOut);
        };
        let Some(mut account) = self.accounts.find_by_id(&account_id).await? else {
            return Ok(LogoutStatus::AlreadyLoggedOut);
        };

        if !account.remove_refresh_token(refresh_token) {
            return Ok(LogoutStatus::AlreadyLoggedOut);
        }

        account.audit_info.update(None);
        self.accounts.update(&account).await?;

        metrics::record_session_revoked("logout");
        info!(account_id = %account.id, "Logout successful");
        Ok(LogoutStatus::LoggedOut)
    }

    fn issue_token_pair(&self, account: &mut Account) -> AppResult<TokenPair> {
        let access = self.tokens.generate_access_token(
            &account.id,
            account.username.as_str(),
            account.email.as_str(),
            account.role.as_str(),
        )?;
        let refresh = self.tokens.generate_refresh_token(&account.id)?;

        account.push_refresh_token(refresh.clone());

        Ok(TokenPair::new(
            access,
            refresh,
            self.tokens.access_token_expires_in(),
        ))
    }
}
