//! 仓储接口

mod account_repository;

pub use account_repository::AccountRepository;
