//! 配置加载和脱敏测试

use super::*;
use secrecy::ExposeSecret;

const MINIMAL_TOML: &str = r#"
    app_name = "aegis"
    app_env = "development"

    [jwt]
    access_secret = "test-access-secret"
    refresh_secret = "test-refresh-secret"

    [email]
    smtp_host = "smtp.example.com"
    smtp_port = 587
    username = "mailer@example.com"
    password = "smtp-password"
    from_email = "noreply@example.com"
    from_name = "Aegis"
"#;

fn load_minimal() -> AppConfig {
    Figment::new()
        .merge(Toml::string(MINIMAL_TOML))
        .extract()
        .unwrap()
}

#[test]
fn test_minimal_config_applies_defaults() {
    let config = load_minimal();

    assert_eq!(config.app_name, "aegis");
    assert!(config.is_development());
    assert!(!config.is_production());

    assert_eq!(config.jwt.access_expires_in, 1800);
    assert_eq!(config.jwt.refresh_expires_in, 604_800);

    assert_eq!(config.lockout.max_failed_attempts, 5);
    assert_eq!(config.lockout.lock_duration_minutes, 15);

    assert_eq!(config.totp.issuer, "Aegis");
    assert_eq!(config.password_reset.token_expires_minutes, 10);

    assert_eq!(config.telemetry.log_level, "info");

    assert!(config.email.use_tls);
    assert_eq!(config.email.timeout_secs, 30);

    assert_eq!(config.seed_admin.username, "admin");
    assert_eq!(config.seed_admin.email, "admin@aegis.local");
}

#[test]
fn test_rate_limit_defaults() {
    let config = load_minimal();

    assert!(config.rate_limit.enabled);
    assert_eq!(config.rate_limit.login.max_requests, 5);
    assert_eq!(config.rate_limit.login.window_secs, 300);
    assert_eq!(config.rate_limit.password_reset.max_requests, 3);
    assert_eq!(config.rate_limit.password_reset.window_secs, 600);
    assert_eq!(config.rate_limit.global.max_requests, 300);
    assert_eq!(config.rate_limit.global.window_secs, 900);
    assert_eq!(config.rate_limit.login.burst_size, 0);
}

#[test]
fn test_partial_section_overrides_keep_defaults() {
    let toml = format!(
        "{MINIMAL_TOML}\n[lockout]\nmax_failed_attempts = 3\n\n[rate_limit.login]\nmax_requests = 10\nwindow_secs = 60\n"
    );
    let config: AppConfig = Figment::new()
        .merge(Toml::string(&toml))
        .extract()
        .unwrap();

    assert_eq!(config.lockout.max_failed_attempts, 3);
    // 未覆盖的字段保持默认值
    assert_eq!(config.lockout.lock_duration_minutes, 15);
    assert_eq!(config.rate_limit.login.max_requests, 10);
    assert_eq!(config.rate_limit.password_reset.max_requests, 3);
}

#[test]
fn test_secrets_are_redacted_in_debug_output() {
    let config = load_minimal();

    let debug_output = format!("{config:?}");
    assert!(!debug_output.contains("test-access-secret"));
    assert!(!debug_output.contains("test-refresh-secret"));
    assert!(!debug_output.contains("smtp-password"));
    assert!(debug_output.contains("REDACTED"));
}

#[test]
fn test_secrets_accessible_via_expose() {
    let config = load_minimal();

    assert_eq!(config.jwt.access_secret.expose_secret(), "test-access-secret");
    assert_eq!(config.jwt.refresh_secret.expose_secret(), "test-refresh-secret");
    assert_eq!(config.email.password.expose_secret(), "smtp-password");
}

#[test]
fn test_validate_rejects_inverted_expiries() {
    let toml = MINIMAL_TOML.replace(
        "refresh_secret = \"test-refresh-secret\"",
        "refresh_secret = \"test-refresh-secret\"\naccess_expires_in = 3600\nrefresh_expires_in = 60",
    );
    let config: AppConfig = Figment::new()
        .merge(Toml::string(&toml))
        .extract()
        .unwrap();

    let err = config.validate().unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn test_validate_rejects_zero_failed_attempts() {
    let toml = format!("{MINIMAL_TOML}\n[lockout]\nmax_failed_attempts = 0\n");
    let config: AppConfig = Figment::new()
        .merge(Toml::string(&toml))
        .extract()
        .unwrap();

    assert!(config.validate().is_err());
}
