//! 业务指标记录

use metrics::counter;

// ============================================================================
// 认证 Metrics
// ============================================================================

/// 记录登录尝试
pub fn record_login_attempt(success: bool, has_2fa: bool) {
    let labels = [
        ("success", success.to_string()),
        ("has_2fa", has_2fa.to_string()),
    ];

    counter!("aegis_login_attempts_total", &labels).increment(1);

    if success {
        counter!("aegis_login_success_total", &labels).increment(1);
    } else {
        counter!("aegis_login_failure_total", &labels).increment(1);
    }
}

/// 记录 2FA 验证
pub fn record_2fa_verification(success: bool) {
    let labels = [("success", success.to_string())];
    counter!("aegis_2fa_verifications_total", &labels).increment(1);
}

/// 记录 2FA 启用
pub fn record_2fa_enabled() {
    counter!("aegis_2fa_enabled_total").increment(1);
}

/// 记录账户锁定
pub fn record_account_locked(reason: &str) {
    let labels = [("reason", reason.to_string())];
    counter!("aegis_account_locked_total", &labels).increment(1);
}

// ============================================================================
// 会话 Metrics
// ============================================================================

/// 记录会话创建
pub fn record_session_created() {
    counter!("aegis_sessions_created_total").increment(1);
}

/// 记录刷新令牌旋转
pub fn record_session_rotated() {
    counter!("aegis_sessions_rotated_total").increment(1);
}

/// 记录会话撤销
pub fn record_session_revoked(reason: &str) {
    let labels = [("reason", reason.to_string())];
    counter!("aegis_sessions_revoked_total", &labels).increment(1);
}

// ============================================================================
// 密码重置与注册 Metrics
// ============================================================================

/// 记录密码重置请求
pub fn record_password_reset_requested() {
    counter!("aegis_password_reset_requested_total").increment(1);
}

/// 记录密码重置完成
pub fn record_password_reset_completed(success: bool) {
    let labels = [("success", success.to_string())];
    counter!("aegis_password_reset_completed_total", &labels).increment(1);
}

/// 记录账户注册
pub fn record_account_registered() {
    counter!("aegis_accounts_registered_total").increment(1);
}
