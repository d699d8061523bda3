//! 基础设施层

pub mod metrics;
pub mod persistence;
pub mod rate_limit;
