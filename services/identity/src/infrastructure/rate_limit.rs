//! 限流器
//!
//! 进程内固定窗口实现，传输层在登录和密码重置入口前调用。
//! 限流只是防护措施，引擎的正确性不依赖它；内部故障时放行。

use std::collections::HashMap;
use std::sync::RwLock;

use aegis_config::{RateLimitConfig, RateLimitRule};
use chrono::Utc;
use tracing::{debug, warn};

/// 限流检查结果
#[derive(Debug, Clone)]
pub struct RateLimitResult {
    /// 是否允许请求
    pub allowed: bool,
    /// 当前窗口内的请求计数
    pub count: u64,
    /// 剩余可用请求数
    pub remaining: u64,
    /// 限制的最大请求数
    pub limit: u64,
    /// 窗口重置时间（Unix 时间戳）
    pub reset_at: u64,
    /// 建议重试等待时间（秒，仅在拒绝时有效）
    pub retry_after: Option<u64>,
}

impl RateLimitResult {
    /// 放行结果，用于限流关闭或内部故障
    fn pass_through(rule: &RateLimitRule, now: u64) -> Self {
        Self {
            allowed: true,
            count: 0,
            remaining: rule.max_requests,
            limit: rule.max_requests,
            reset_at: now + rule.window_secs,
            retry_after: None,
        }
    }
}

struct WindowCounter {
    window_start: u64,
    count: u64,
}

/// 固定窗口限流器
///
/// 每个键独立计窗；被拒绝的请求不消耗配额。
pub struct FixedWindowRateLimiter {
    rule: RateLimitRule,
    windows: RwLock<HashMap<String, WindowCounter>>,
}

impl FixedWindowRateLimiter {
    pub fn new(rule: RateLimitRule) -> Self {
        Self {
            rule,
            windows: RwLock::new(HashMap::new()),
        }
    }

    /// 检查是否允许请求
    ///
    /// # 参数
    /// - `identifier`: 客户端标识符（提交的邮箱或来源地址）
    pub fn check(&self, identifier: &str) -> RateLimitResult {
        self.check_at(identifier, unix_now())
    }

    pub fn check_at(&self, identifier: &str, now: u64) -> RateLimitResult {
        // 计算窗口起始时间
        let window_start = now - (now % self.rule.window_secs);
        let reset_at = window_start + self.rule.window_secs;
        let limit = self.rule.max_requests + self.rule.burst_size;

        let mut windows = match self.windows.write() {
            Ok(guard) => guard,
            Err(e) => {
                warn!(
                    error = %e,
                    identifier = %identifier,
                    "Rate limiter state poisoned, allowing request (fail-open)"
                );
                return RateLimitResult::pass_through(&self.rule, now);
            }
        };

        let entry = windows
            .entry(identifier.to_string())
            .or_insert(WindowCounter {
                window_start,
                count: 0,
            });

        // 进入新窗口时重新计数
        if entry.window_start != window_start {
            entry.window_start = window_start;
            entry.count = 0;
        }

        let allowed = entry.count < limit;
        if allowed {
            entry.count += 1;
        }
        let count = entry.count;

        debug!(
            identifier = %identifier,
            count,
            allowed,
            max_requests = self.rule.max_requests,
            "Rate limit check result"
        );

        RateLimitResult {
            allowed,
            count,
            remaining: self.rule.max_requests.saturating_sub(count),
            limit: self.rule.max_requests,
            reset_at,
            retry_after: if allowed { None } else { Some(reset_at - now) },
        }
    }
}

/// 认证入口的限流器集合
///
/// 登录和密码重置按提交的邮箱限流，全局规则按来源地址限流。
pub struct RateLimiters {
    enabled: bool,
    login: FixedWindowRateLimiter,
    password_reset: FixedWindowRateLimiter,
    global: FixedWindowRateLimiter,
}

impl RateLimiters {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            enabled: config.enabled,
            login: FixedWindowRateLimiter::new(config.login),
            password_reset: FixedWindowRateLimiter::new(config.password_reset),
            global: FixedWindowRateLimiter::new(config.global),
        }
    }

    pub fn check_login(&self, email: &str) -> RateLimitResult {
        if !self.enabled {
            return RateLimitResult::pass_through(&self.login.rule, unix_now());
        }
        self.login.check(email)
    }

    pub fn check_password_reset(&self, email: &str) -> RateLimitResult {
        if !self.enabled {
            return RateLimitResult::pass_through(&self.password_reset.rule, unix_now());
        }
        self.password_reset.check(email)
    }

    pub fn check_global(&self, client_addr: &str) -> RateLimitResult {
        if !self.enabled {
            return RateLimitResult::pass_through(&self.global.rule, unix_now());
        }
        self.global.check(client_addr)
    }
}

fn unix_now() -> u64 {
    Utc::now().timestamp().max(0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn login_rule() -> RateLimitRule {
        RateLimitRule {
            max_requests: 5,
            window_secs: 300,
            burst_size: 0,
        }
    }

    const NOW: u64 = 1_700_000_100;

    #[test]
    fn test_allows_up_to_limit() {
        let limiter = FixedWindowRateLimiter::new(login_rule());

        for i in 1..=5 {
            let result = limiter.check_at("alice@example.com", NOW);
            assert!(result.allowed);
            assert_eq!(result.count, i);
            assert_eq!(result.remaining, 5 - i);
        }
    }

    #[test]
    fn test_rejects_beyond_limit_with_retry_after() {
        let limiter = FixedWindowRateLimiter::new(login_rule());
        for _ in 0..5 {
            limiter.check_at("alice@example.com", NOW);
        }

        let result = limiter.check_at("alice@example.com", NOW);
        assert!(!result.allowed);
        assert_eq!(result.remaining, 0);
        // 被拒绝的请求不消耗配额
        assert_eq!(result.count, 5);
        let retry_after = result.retry_after.unwrap();
        assert!(retry_after > 0 && retry_after <= 300);
    }

    #[test]
    fn test_burst_size_extends_limit() {
        let rule = RateLimitRule {
            max_requests: 5,
            window_secs: 300,
            burst_size: 2,
        };
        let limiter = FixedWindowRateLimiter::new(rule);

        for _ in 0..7 {
            assert!(limiter.check_at("alice@example.com", NOW).allowed);
        }
        assert!(!limiter.check_at("alice@example.com", NOW).allowed);
    }

    #[test]
    fn test_new_window_resets_count() {
        let limiter = FixedWindowRateLimiter::new(login_rule());
        for _ in 0..5 {
            limiter.check_at("alice@example.com", NOW);
        }
        assert!(!limiter.check_at("alice@example.com", NOW).allowed);

        let next_window = NOW + 300;
        let result = limiter.check_at("alice@example.com", next_window);
        assert!(result.allowed);
        assert_eq!(result.count, 1);
    }

    #[test]
    fn test_keys_are_independent() {
        let limiter = FixedWindowRateLimiter::new(login_rule());
        for _ in 0..5 {
            limiter.check_at("alice@example.com", NOW);
        }

        assert!(!limiter.check_at("alice@example.com", NOW).allowed);
        assert!(limiter.check_at("bob@example.com", NOW).allowed);
    }

    #[test]
    fn test_disabled_config_passes_through() {
        let config = RateLimitConfig {
            enabled: false,
            ..RateLimitConfig::default()
        };
        let limiters = RateLimiters::new(config);

        for _ in 0..100 {
            assert!(limiters.check_login("alice@example.com").allowed);
        }
    }

    #[test]
    fn test_default_rules_windows() {
        let limiters = RateLimiters::new(RateLimitConfig::default());

        // 登录 5 次/5 分钟
        for _ in 0..5 {
            assert!(limiters.check_login("alice@example.com").allowed);
        }
        assert!(!limiters.check_login("alice@example.com").allowed);

        // 密码重置 3 次/10 分钟
        for _ in 0..3 {
            assert!(limiters.check_password_reset("alice@example.com").allowed);
        }
        assert!(!limiters.check_password_reset("alice@example.com").allowed);

        // 全局 300 次/15 分钟
        for _ in 0..300 {
            assert!(limiters.check_global("10.0.0.1").allowed);
        }
        assert!(!limiters.check_global("10.0.0.1").allowed);
    }
}
