//! 领域服务

mod lockout;
mod password;
mod totp;

pub use lockout::LockoutPolicy;
pub use password::PasswordService;
pub use totp::TotpService;
