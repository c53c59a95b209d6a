//! # Observability
//!
//! 可观测性模块：Tracing + Prometheus 指标。
//!
//! ## 功能
//!
//! - Tracing 初始化 (JSON/Pretty/Compact 格式)
//! - Prometheus 指标导出 (默认关闭)
//! - `drone_bridge_*` 指标说明注册
//! - 轮询周期指标收集与统计
//!
//! ## 使用示例
//!
//! ```ignore
//! use observability::{init_with_config, ObservabilityConfig};
//!
//! init_with_config(ObservabilityConfig {
//!     metrics_port: Some(9000),
//!     ..Default::default()
//! })?;
//!
//! // 每个轮询周期记录一次
//! let report = bridge.poll(now);
//! observability::record_cycle_metrics(&report);
//! ```

pub mod metrics;

use ::metrics::{describe_counter, describe_gauge, describe_histogram, Unit};
use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

// Re-exports
pub use crate::metrics::{
    record_cycle_metrics, record_discovery_finished, record_target_pose, BridgeMetricsAggregator,
    MetricsSummary, RunningStats, StatsSummary,
};

/// 可观测性配置
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// 日志格式
    pub log_format: LogFormat,
    /// Prometheus 端口 (None = 禁用)
    pub metrics_port: Option<u16>,
    /// 默认日志级别 (RUST_LOG 优先)
    pub default_log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Compact,
            metrics_port: None,
            default_log_level: "info".to_string(),
        }
    }
}

/// 日志格式
#[derive(Debug, Clone, Copy, Default)]
pub enum LogFormat {
    /// JSON 结构化日志
    Json,
    /// 人类可读格式
    Pretty,
    /// 紧凑单行格式
    #[default]
    Compact,
}

/// 初始化 Tracing，按需开启 Prometheus 导出
pub fn init_with_config(config: ObservabilityConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_log_level));

    let fmt_layer = match config.log_format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        LogFormat::Pretty => fmt::layer().pretty().boxed(),
        LogFormat::Compact => fmt::layer().compact().boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    if let Some(port) = config.metrics_port {
        init_metrics_only(port)?;
    }

    tracing::info!(
        log_format = ?config.log_format,
        metrics_port = ?config.metrics_port,
        "Observability initialized"
    );

    Ok(())
}

/// 仅初始化 Prometheus 指标（不初始化 Tracing）
///
/// 安装全局 recorder 后注册桥接指标说明。
pub fn init_metrics_only(port: u16) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .with_context(|| format!("Failed to install Prometheus recorder on port {}", port))?;

    describe_metrics();

    tracing::info!(port = port, "Prometheus metrics endpoint initialized");
    Ok(())
}

/// 为 `drone_bridge_*` 指标注册 HELP 文本与单位
///
/// 未安装 recorder 时为空操作。
pub fn describe_metrics() {
    // ingestion
    describe_counter!(
        "drone_bridge_datagrams_received_total",
        Unit::Count,
        "UDP datagrams read from the listener"
    );
    describe_counter!(
        "drone_bridge_datagrams_truncated_total",
        Unit::Count,
        "Datagrams cut to the maximum payload size"
    );
    describe_histogram!(
        "drone_bridge_datagram_bytes",
        Unit::Bytes,
        "Size of each received datagram"
    );
    describe_counter!(
        "drone_bridge_discovery_rebinds_total",
        Unit::Count,
        "Listener rebinds performed by port discovery"
    );
    describe_gauge!(
        "drone_bridge_listen_port",
        "UDP port the listener is bound to"
    );

    // reconciler
    describe_counter!(
        "drone_bridge_samples_applied_total",
        Unit::Count,
        "Samples applied to the target, by kind"
    );
    describe_counter!(
        "drone_bridge_parse_failures_total",
        Unit::Count,
        "Payloads rejected by the parser, by stage"
    );
    describe_counter!(
        "drone_bridge_pending_overwrites_total",
        Unit::Count,
        "Deferred positions replaced before being drained"
    );

    // poll cycle
    describe_counter!(
        "drone_bridge_poll_cycles_total",
        Unit::Count,
        "Poll cycles executed"
    );
    describe_histogram!(
        "drone_bridge_datagrams_per_cycle",
        Unit::Count,
        "Datagrams drained in one poll cycle"
    );
    describe_counter!(
        "drone_bridge_cycle_discards_total",
        Unit::Count,
        "Datagrams discarded during poll cycles"
    );
    describe_counter!(
        "drone_bridge_discovery_finished_total",
        Unit::Count,
        "Port discovery completions, by reason"
    );
    describe_gauge!(
        "drone_bridge_target_location_cm",
        "Current target location in the consumer frame, by axis"
    );
    describe_gauge!(
        "drone_bridge_target_rotation_deg",
        "Current target rotation in degrees, by axis"
    );
}
