//! aegis-telemetry - 可观测性库
//!
//! 提供 tracing 订阅器和 Prometheus recorder 的初始化。
//! 认证相关的审计日志由各服务通过 `tracing` 结构化字段输出。

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// 构造日志过滤器
///
/// `RUST_LOG` 环境变量优先；否则使用配置的级别，
/// 并压低 SMTP 传输层的调试输出 (可能包含邮件元数据)。
pub fn build_env_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{log_level},lettre=warn")))
}

/// 初始化 tracing (开发环境，人类可读格式)
pub fn init_tracing(log_level: &str) {
    tracing_subscriber::registry()
        .with(build_env_filter(log_level))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// 初始化 JSON 格式的 tracing (生产环境)
pub fn init_tracing_json(log_level: &str) {
    tracing_subscriber::registry()
        .with(build_env_filter(log_level))
        .with(tracing_subscriber::fmt::layer().json())
        .init();
}

/// 初始化 Prometheus metrics
pub fn init_metrics() -> metrics_exporter_prometheus::PrometheusHandle {
    let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    builder
        .install_recorder()
        .expect("Failed to install Prometheus recorder")
}
