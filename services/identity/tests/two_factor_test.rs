//! TOTP 注册与二次验证登录测试

use std::sync::Arc;

use aegis_auth_core::TokenService;
use aegis_common::AccountId;
use aegis_config::LockoutConfig;
use aegis_errors::AppError;
use aegis_identity::application::{AccountService, AuthService, NewAccount, TwoFactorService};
use aegis_identity::domain::repositories::AccountRepository;
use aegis_identity::domain::services::{LockoutPolicy, TotpService};
use aegis_identity::infrastructure::persistence::InMemoryAccountStore;
use chrono::Utc;
use totp_rs::{Algorithm, Secret, TOTP};

const PASSWORD: &str = "Password123";

struct Fixture {
    store: Arc<InMemoryAccountStore>,
    auth: AuthService,
    two_factor: TwoFactorService,
    account_id: AccountId,
}

async fn setup() -> Fixture {
    let store = Arc::new(InMemoryAccountStore::new());
    let auth = AuthService::new(
        store.clone(),
        TokenService::new("access-secret", "refresh-secret", 1800, 604_800),
        LockoutPolicy::new(LockoutConfig::default()),
        TotpService::new("Aegis".to_string()),
    );
    let two_factor = TwoFactorService::new(store.clone(), TotpService::new("Aegis".to_string()));

    let view = AccountService::new(store.clone())
        .register(NewAccount {
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password: PASSWORD.to_string(),
        })
        .await
        .expect("registration failed");

    Fixture {
        store,
        auth,
        two_factor,
        account_id: view.id,
    }
}

/// 用注册返回的密钥算出当前时刻的动态码，模拟认证器应用
fn current_code(secret: &str) -> String {
    let bytes = Secret::Encoded(secret.to_string())
        .to_bytes()
        .expect("secret not valid base32");
    let totp = TOTP::new(Algorithm::SHA1, 6, 1, 30, bytes).expect("TOTP construction failed");
    totp.generate(Utc::now().timestamp() as u64)
}

fn wrong_code(correct: &str) -> String {
    if correct == "000000" {
        "111111".to_string()
    } else {
        "000000".to_string()
    }
}

#[tokio::test]
async fn test_enroll_returns_secret_and_uri() {
    let fx = setup().await;

    let enrollment = fx
        .two_factor
        .enroll(&fx.account_id)
        .await
        .expect("enroll failed");

    // 20 字节随机密钥的 base32 编码是 32 个字符
    assert_eq!(enrollment.secret.len(), 32);
    assert!(enrollment.otpauth_url.starts_with("otpauth://totp/"));
    assert!(enrollment.otpauth_url.contains("alice%40example.com"));
    assert!(enrollment.otpauth_url.contains(&format!("secret={}", enrollment.secret)));
    assert!(enrollment.otpauth_url.contains("issuer=Aegis"));

    // 注册只是预备，未确认前不要求动态码
    let account = fx.store.find_by_id(&fx.account_id).await.unwrap().unwrap();
    assert_eq!(account.totp_secret.as_deref(), Some(enrollment.secret.as_str()));
    assert!(!account.totp_enabled);

    fx.auth
        .login("alice@example.com", PASSWORD, None)
        .await
        .expect("login before confirmation should not require a code");
}

#[tokio::test]
async fn test_confirm_enables_two_factor() {
    let fx = setup().await;

    let enrollment = fx.two_factor.enroll(&fx.account_id).await.unwrap();
    fx.two_factor
        .confirm_enrollment(&fx.account_id, &current_code(&enrollment.secret))
        .await
        .expect("confirmation failed");

    let account = fx.store.find_by_id(&fx.account_id).await.unwrap().unwrap();
    assert!(account.totp_enabled);
}

#[tokio::test]
async fn test_confirm_with_wrong_code_keeps_disabled() {
    let fx = setup().await;

    let enrollment = fx.two_factor.enroll(&fx.account_id).await.unwrap();
    let err = fx
        .two_factor
        .confirm_enrollment(&fx.account_id, &wrong_code(&current_code(&enrollment.secret)))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidCode(_)));

    // 失败不改变状态，密钥保留可重试
    let account = fx.store.find_by_id(&fx.account_id).await.unwrap().unwrap();
    assert!(!account.totp_enabled);
    assert_eq!(account.totp_secret.as_deref(), Some(enrollment.secret.as_str()));
}

#[tokio::test]
async fn test_confirm_without_enrollment_is_rejected() {
    let fx = setup().await;

    let err = fx
        .two_factor
        .confirm_enrollment(&fx.account_id, "123456")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotProvisioned(_)));
}

#[tokio::test]
async fn test_login_with_two_factor_enabled() {
    let fx = setup().await;

    let enrollment = fx.two_factor.enroll(&fx.account_id).await.unwrap();
    fx.two_factor
        .confirm_enrollment(&fx.account_id, &current_code(&enrollment.secret))
        .await
        .unwrap();

    // 1. 不带动态码被拒，提示需要二次验证
    let err = fx
        .auth
        .login("alice@example.com", PASSWORD, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    // 2. 错误动态码被拒，且不推进失败计数
    let code = current_code(&enrollment.secret);
    let err = fx
        .auth
        .login("alice@example.com", PASSWORD, Some(&wrong_code(&code)))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidCode(_)));

    let account = fx.store.find_by_id(&fx.account_id).await.unwrap().unwrap();
    assert_eq!(account.failed_login_attempts, 0);

    // 3. 正确动态码放行
    let pair = fx
        .auth
        .login("alice@example.com", PASSWORD, Some(&current_code(&enrollment.secret)))
        .await
        .expect("login with code failed");
    assert!(!pair.access_token.is_empty());
}

#[tokio::test]
async fn test_wrong_password_checked_before_code() {
    let fx = setup().await;

    let enrollment = fx.two_factor.enroll(&fx.account_id).await.unwrap();
    fx.two_factor
        .confirm_enrollment(&fx.account_id, &current_code(&enrollment.secret))
        .await
        .unwrap();

    // 密码错误时即使动态码正确也推进失败计数
    let err = fx
        .auth
        .login(
            "alice@example.com",
            "WrongPass1",
            Some(&current_code(&enrollment.secret)),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidCredentials));

    let account = fx.store.find_by_id(&fx.account_id).await.unwrap().unwrap();
    assert_eq!(account.failed_login_attempts, 1);
}

#[tokio::test]
async fn test_re_enrollment_replaces_secret_and_demotes() {
    let fx = setup().await;

    let first = fx.two_factor.enroll(&fx.account_id).await.unwrap();
    fx.two_factor
        .confirm_enrollment(&fx.account_id, &current_code(&first.secret))
        .await
        .unwrap();

    // 重新注册替换密钥并退回未启用状态
    let second = fx.two_factor.enroll(&fx.account_id).await.unwrap();
    assert_ne!(first.secret, second.secret);

    let account = fx.store.find_by_id(&fx.account_id).await.unwrap().unwrap();
    assert!(!account.totp_enabled);
    assert_eq!(account.totp_secret.as_deref(), Some(second.secret.as_str()));

    // 未确认前登录不再要求动态码
    fx.auth
        .login("alice@example.com", PASSWORD, None)
        .await
        .expect("login after re-enrollment failed");

    // 旧密钥的动态码确认不了新注册
    let err = fx
        .two_factor
        .confirm_enrollment(&fx.account_id, &current_code(&first.secret))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidCode(_)));
}

#[tokio::test]
async fn test_enabled_account_without_secret_is_rejected() {
    let fx = setup().await;

    // 构造一条损坏的记录：标记已启用但密钥缺失
    let mut account = fx.store.find_by_id(&fx.account_id).await.unwrap().unwrap();
    account.totp_enabled = true;
    account.totp_secret = None;
    fx.store.update(&account).await.unwrap();

    let err = fx
        .auth
        .login("alice@example.com", PASSWORD, Some("123456"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotProvisioned(_)));
}

#[tokio::test]
async fn test_enroll_unknown_account_is_not_found() {
    let fx = setup().await;

    let err = fx.two_factor.enroll(&AccountId::new()).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}
