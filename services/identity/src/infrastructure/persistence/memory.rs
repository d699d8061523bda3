//! 内存账户存储
//!
//! 供测试和本地运行使用，行为与持久化适配器对齐：
//! 唯一约束、重置令牌哈希查找、分页排序。

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use aegis_common::{AccountId, PagedResult, Pagination};
use aegis_errors::{AppError, AppResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::entities::{Account, Role};
use crate::domain::repositories::AccountRepository;
use crate::domain::value_objects::Email;

/// 内存账户存储
pub struct InMemoryAccountStore {
    accounts: RwLock<HashMap<AccountId, Account>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
        }
    }

    fn read_guard(&self) -> AppResult<RwLockReadGuard<'_, HashMap<AccountId, Account>>> {
        self.accounts
            .read()
            .map_err(|_| AppError::database("Account store lock poisoned"))
    }

    fn write_guard(&self) -> AppResult<RwLockWriteGuard<'_, HashMap<AccountId, Account>>> {
        self.accounts
            .write()
            .map_err(|_| AppError::database("Account store lock poisoned"))
    }
}

impl Default for InMemoryAccountStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountStore {
    async fn create(&self, account: &Account) -> AppResult<()> {
        let mut accounts = self.write_guard()?;

        if accounts.values().any(|a| a.email == account.email) {
            return Err(AppError::conflict("Email is already registered"));
        }
        if accounts.values().any(|a| a.username == account.username) {
            return Err(AppError::conflict("Username is already taken"));
        }

        accounts.insert(account.id.clone(), account.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &AccountId) -> AppResult<Option<Account>> {
        let accounts = self.read_guard()?;
        Ok(accounts.get(id).cloned())
    }

    async fn find_by_email(&self, email: &Email) -> AppResult<Option<Account>> {
        let accounts = self.read_guard()?;
        Ok(accounts.values().find(|a| a.email == *email).cloned())
    }

    async fn find_by_reset_token_hash(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Account>> {
        let accounts = self.read_guard()?;
        Ok(accounts
            .values()
            .find(|a| {
                a.reset_token_hash.as_deref() == Some(token_hash)
                    && a.reset_token_expires_at.is_some_and(|expires| expires > now)
            })
            .cloned())
    }

    async fn update(&self, account: &Account) -> AppResult<()> {
        let mut accounts = self.write_guard()?;

        match accounts.get_mut(&account.id) {
            Some(stored) => {
                *stored = account.clone();
                Ok(())
            }
            None => Err(AppError::not_found("Account not found")),
        }
    }

    async fn delete(&self, id: &AccountId) -> AppResult<()> {
        let mut accounts = self.write_guard()?;

        match accounts.remove(id) {
            Some(_) => Ok(()),
            None => Err(AppError::not_found("Account not found")),
        }
    }

    async fn exists_by_email(&self, email: &Email) -> AppResult<bool> {
        let accounts = self.read_guard()?;
        Ok(accounts.values().any(|a| a.email == *email))
    }

    async fn exists_by_role(&self, role: Role) -> AppResult<bool> {
        let accounts = self.read_guard()?;
        Ok(accounts.values().any(|a| a.role == role))
    }

    async fn list(&self, pagination: &Pagination) -> AppResult<PagedResult<Account>> {
        let accounts = self.read_guard()?;

        let mut items: Vec<Account> = accounts.values().cloned().collect();
        // 稳定排序：创建时间为主，ID 决胜
        items.sort_by_key(|a| (a.audit_info.created_at, a.id.0));

        let total = items.len() as u64;
        let items = items
            .into_iter()
            .skip(pagination.offset() as usize)
            .take(pagination.page_size as usize)
            .collect();

        Ok(PagedResult::new(items, total, pagination))
    }
}
