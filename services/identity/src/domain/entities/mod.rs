//! 领域实体

mod account;

pub use account::{Account, MAX_REFRESH_TOKENS, Role};
