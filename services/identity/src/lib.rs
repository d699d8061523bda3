//! Aegis Identity Service Library
//!
//! 模块化架构：
//! - `domain`: 领域层（账户实体、值对象、仓储接口、领域服务）
//! - `application`: 应用层（认证、双因素、密码重置、账户管理）
//! - `infrastructure`: 基础设施层（内存存储、限流器、业务指标）

pub mod application;
pub mod domain;
pub mod infrastructure;
