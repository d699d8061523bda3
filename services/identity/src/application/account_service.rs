//! 账户管理应用服务
//!
//! 注册、查询、管理员操作和初始管理员种子

use std::sync::Arc;

use aegis_auth_core::Claims;
use aegis_common::{AccountId, PagedResult, Pagination};
use aegis_config::SeedAdminConfig;
use aegis_errors::{AppError, AppResult};
use secrecy::ExposeSecret;
use tracing::{debug, info};

use crate::application::dto::{AccountUpdate, AccountView, NewAccount};
use crate::domain::entities::{Account, Role};
use crate::domain::repositories::AccountRepository;
use crate::domain::services::PasswordService;
use crate::domain::value_objects::{Email, Username};
use crate::infrastructure::metrics;

/// 账户服务
pub struct AccountService {
    accounts: Arc<dyn AccountRepository>,
}

impl AccountService {
    pub fn new(accounts: Arc<dyn AccountRepository>) -> Self {
        Self { accounts }
    }

    /// 注册新账户，默认角色 user
    pub async fn register(&self, request: NewAccount) -> AppResult<AccountView> {
        let username = Username::new(request.username)?;
        let email = Email::new(request.email)?;
        let password_hash = PasswordService::hash_password(&request.password)?;

        // 邮箱唯一性预检，存储层的唯一约束兜底
        if self.accounts.exists_by_email(&email).await? {
            return Err(AppError::conflict("Email is already registered"));
        }

        let account = Account::new(username, email, password_hash);
        self.accounts.create(&account).await?;

        metrics::record_account_registered();
        info!(account_id = %account.id, "Account registered");
        Ok(AccountView::from(&account))
    }

    /// 当前调用方自己的账户
    pub async fn current_account(&self, claims: &Claims) -> AppResult<AccountView> {
        let id = claims.account_id()?;
        let account = self
            .accounts
            .find_by_id(&id)
            .await?
            .ok_or_else(|| AppError::not_found("Account not found"))?;

        Ok(AccountView::from(&account))
    }

    /// 分页列出账户，仅管理员
    pub async fn list_accounts(
        &self,
        claims: &Claims,
        pagination: Pagination,
    ) -> AppResult<PagedResult<AccountView>> {
        aegis_auth_core::require_role!(claims, "admin");

        let page = self.accounts.list(&pagination).await?;
        Ok(page.map(|account| AccountView::from(&account)))
    }

    /// 更新账户：管理员可改任何人，普通用户只能改自己
    ///
    /// 角色变更仅限管理员；邮箱变更重新检查唯一性；
    /// 新密码重新走强度校验和哈希。
    pub async fn update_account(
        &self,
        claims: &Claims,
        id: &AccountId,
        changes: AccountUpdate,
    ) -> AppResult<AccountView> {
        let actor_id = claims.account_id()?;
        let is_admin = claims.has_role("admin");

        if !is_admin && actor_id != *id {
            return Err(AppError::permission_denied("Cannot modify another account"));
        }

        let Some(mut account) = self.accounts.find_by_id(id).await? else {
            return Err(AppError::not_found("Account not found"));
        };

        if let Some(username) = changes.username {
            account.username = Username::new(username)?;
        }

        if let Some(email) = changes.email {
            let email = Email::new(email)?;
            if email != account.email && self.accounts.exists_by_email(&email).await? {
                return Err(AppError::conflict("Email is already registered"));
            }
            account.email = email;
        }

        if let Some(password) = changes.password {
            account.set_password(PasswordService::hash_password(&password)?);
        }

        if let Some(role) = changes.role {
            if !is_admin {
                return Err(AppError::permission_denied(
                    "Only administrators can change roles",
                ));
            }
            account.role = role;
        }

        account.audit_info.update(Some(actor_id));
        self.accounts.update(&account).await?;

        info!(account_id = %account.id, "Account updated");
        Ok(AccountView::from(&account))
    }

    /// 删除账户，仅管理员
    pub async fn delete_account(&self, claims: &Claims, id: &AccountId) -> AppResult<()> {
        aegis_auth_core::require_role!(claims, "admin");

        if self.accounts.find_by_id(id).await?.is_none() {
            return Err(AppError::not_found("Account not found"));
        }

        self.accounts.delete(id).await?;

        info!(account_id = %id, "Account deleted");
        Ok(())
    }

    /// 创建初始管理员
    ///
    /// 只在不存在任何管理员时创建，重复调用返回 None。
    pub async fn seed_admin(&self, config: &SeedAdminConfig) -> AppResult<Option<AccountView>> {
        if self.accounts.exists_by_role(Role::Admin).await? {
            debug!("Admin account already present, skipping seed");
            return Ok(None);
        }

        let username = Username::new(config.username.clone())?;
        let email = Email::new(config.email.clone())?;
        let password_hash = PasswordService::hash_password(config.password.expose_secret())?;

        let mut account = Account::new(username, email, password_hash);
        account.role = Role::Admin;
        self.accounts.create(&account).await?;

        info!(account_id = %account.id, "Seed admin account created");
        Ok(Some(AccountView::from(&account)))
    }
}
