//! 应用层

mod account_service;
mod auth_service;
mod dto;
mod password_reset_service;
mod two_factor_service;

pub use account_service::AccountService;
pub use auth_service::AuthService;
pub use dto::{AccountUpdate, AccountView, LogoutStatus, NewAccount, TokenPair, TotpEnrollment};
pub use password_reset_service::PasswordResetService;
pub use two_factor_service::TwoFactorService;
