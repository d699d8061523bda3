//! 登录失败锁定策略

use aegis_config::LockoutConfig;
use chrono::{DateTime, Duration, Utc};

use crate::domain::entities::Account;

/// 锁定策略
///
/// 锁定状态惰性过期：到期后的账户视为未锁定，
/// 没有单独的解锁步骤。
#[derive(Debug, Clone)]
pub struct LockoutPolicy {
    config: LockoutConfig,
}

impl LockoutPolicy {
    pub fn new(config: LockoutConfig) -> Self {
        Self { config }
    }

    pub fn lock_duration_minutes(&self) -> i64 {
        self.config.lock_duration_minutes
    }

    /// 记录一次失败尝试，返回本次是否触发锁定
    ///
    /// 带着已过期的锁进入时，计数从 1 重新开始。
    pub fn record_failure(&self, account: &mut Account) -> bool {
        if account.is_locked {
            account.clear_lockout();
        }

        account.failed_login_attempts += 1;

        if account.failed_login_attempts >= self.config.max_failed_attempts {
            account.is_locked = true;
            account.lock_expires_at =
                Some(Utc::now() + Duration::minutes(self.config.lock_duration_minutes));
            return true;
        }

        false
    }

    /// 记录成功认证，清除计数和锁定状态
    pub fn record_success(&self, account: &mut Account) {
        account.clear_lockout();
    }

    /// 返回剩余锁定分钟数（向上取整），未锁定或已过期返回 None
    pub fn check(&self, account: &Account) -> Option<i64> {
        self.check_at(account, Utc::now())
    }

    pub fn check_at(&self, account: &Account, now: DateTime<Utc>) -> Option<i64> {
        if !account.is_locked {
            return None;
        }

        match account.lock_expires_at {
            Some(expires_at) if expires_at > now => {
                let remaining_secs = (expires_at - now).num_seconds().max(0);
                Some((remaining_secs + 59) / 60)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{Email, HashedPassword, Username};

    fn policy() -> LockoutPolicy {
        LockoutPolicy::new(LockoutConfig {
            max_failed_attempts: 5,
            lock_duration_minutes: 15,
        })
    }

    fn test_account() -> Account {
        Account::new(
            Username::new("alice").unwrap(),
            Email::new("alice@example.com").unwrap(),
            HashedPassword::from_hash("$argon2id$stub"),
        )
    }

    #[test]
    fn test_locks_after_threshold_failures() {
        let policy = policy();
        let mut account = test_account();

        for i in 1..5 {
            assert!(!policy.record_failure(&mut account));
            assert_eq!(account.failed_login_attempts, i);
            assert!(policy.check(&account).is_none());
        }

        // 第 5 次失败触发锁定
        assert!(policy.record_failure(&mut account));
        assert!(account.is_locked);
        assert_eq!(policy.check(&account), Some(15));
    }

    #[test]
    fn test_remaining_minutes_rounds_up() {
        let policy = policy();
        let mut account = test_account();
        account.is_locked = true;

        let now = Utc::now();
        account.lock_expires_at = Some(now + Duration::seconds(61));
        assert_eq!(policy.check_at(&account, now), Some(2));

        account.lock_expires_at = Some(now + Duration::seconds(60));
        assert_eq!(policy.check_at(&account, now), Some(1));

        account.lock_expires_at = Some(now + Duration::seconds(1));
        assert_eq!(policy.check_at(&account, now), Some(1));
    }

    #[test]
    fn test_expired_lock_is_not_locked() {
        let policy = policy();
        let mut account = test_account();
        account.is_locked = true;
        account.lock_expires_at = Some(Utc::now() - Duration::minutes(1));

        assert!(policy.check(&account).is_none());
    }

    #[test]
    fn test_failure_after_expired_lock_restarts_count() {
        let policy = policy();
        let mut account = test_account();
        account.failed_login_attempts = 5;
        account.is_locked = true;
        account.lock_expires_at = Some(Utc::now() - Duration::minutes(1));

        // 过期后的第一次失败重新从 1 计数，不会立即再锁
        assert!(!policy.record_failure(&mut account));
        assert_eq!(account.failed_login_attempts, 1);
        assert!(!account.is_locked);
    }

    #[test]
    fn test_record_success_clears_state() {
        let policy = policy();
        let mut account = test_account();
        account.failed_login_attempts = 4;

        policy.record_success(&mut account);

        assert_eq!(account.failed_login_attempts, 0);
        assert!(!account.is_locked);
        assert!(account.lock_expires_at.is_none());
    }

    #[test]
    fn test_lock_without_expiry_is_ignored() {
        let policy = policy();
        let mut account = test_account();
        account.is_locked = true;
        account.lock_expires_at = None;

        assert!(policy.check(&account).is_none());
    }
}
