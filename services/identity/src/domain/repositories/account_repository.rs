//! 账户 Repository trait

use aegis_common::{AccountId, PagedResult, Pagination};
use aegis_errors::AppResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::entities::{Account, Role};
use crate::domain::value_objects::Email;

/// 账户存储接口
///
/// 返回完整实体，机密字段的裁剪发生在应用层的 `AccountView` 投影。
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// 创建账户，邮箱或用户名重复时返回 Conflict
    async fn create(&self, account: &Account) -> AppResult<()>;

    /// 根据 ID 查找账户
    async fn find_by_id(&self, id: &AccountId) -> AppResult<Option<Account>>;

    /// 根据邮箱查找账户
    async fn find_by_email(&self, email: &Email) -> AppResult<Option<Account>>;

    /// 查找持有指定重置令牌哈希且令牌未过期的账户
    async fn find_by_reset_token_hash(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Account>>;

    /// 保存账户的全部字段
    async fn update(&self, account: &Account) -> AppResult<()>;

    /// 删除账户
    async fn delete(&self, id: &AccountId) -> AppResult<()>;

    /// 检查邮箱是否已注册
    async fn exists_by_email(&self, email: &Email) -> AppResult<bool>;

    /// 检查是否存在指定角色的账户
    async fn exists_by_role(&self, role: Role) -> AppResult<bool>;

    /// 分页查询账户列表
    async fn list(&self, pagination: &Pagination) -> AppResult<PagedResult<Account>>;
}
