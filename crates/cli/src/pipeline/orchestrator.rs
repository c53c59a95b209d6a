//! Host loop orchestrator - drives the bridge at the consumer cadence.
//!
//! Each tick polls the bridge once, records metrics and feeds the
//! resulting target pose to a `PoseFollower`.

use std::future::Future;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use contracts::{BridgeConfig, Vector3};
use observability::record_cycle_metrics;
use reconciler::{PoseFollower, TelemetryBridge};
use tokio::time::MissedTickBehavior;
use tracing::{info, trace, warn};

use super::RunStats;

/// 目标位置变化超过该距离 (cm) 才以 info 级别记录
const LOG_MOVE_THRESHOLD_CM: f64 = 1.0;

/// Host loop configuration
#[derive(Debug, Clone)]
pub struct HostLoopConfig {
    /// The validated bridge configuration
    pub bridge: BridgeConfig,

    /// Maximum number of ticks (None = unlimited)
    pub max_ticks: Option<u64>,

    /// Run timeout (None = no timeout)
    pub timeout: Option<Duration>,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Main host loop
pub struct HostLoop {
    config: HostLoopConfig,
    bridge: TelemetryBridge,
    follower: PoseFollower,
    started: Instant,
}

impl HostLoop {
    /// Bind the listener and prepare the loop
    ///
    /// 端口在返回前已绑定 (或已开始端口发现)。
    pub fn start(config: HostLoopConfig) -> Result<Self> {
        // Initialize Metrics (optional)
        if let Some(port) = config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        let bridge = TelemetryBridge::start(&config.bridge, 0.0).with_context(|| {
            format!(
                "Failed to start telemetry bridge on port {}",
                config.bridge.listener.port
            )
        })?;
        let follower = PoseFollower::new(config.bridge.consumer.clone(), bridge.target());

        Ok(Self {
            config,
            bridge,
            follower,
            started: Instant::now(),
        })
    }

    /// Port currently listened on
    pub fn local_port(&self) -> Option<u16> {
        self.bridge.local_port()
    }

    /// Run until shutdown, max ticks or timeout
    pub async fn run<F>(mut self, shutdown: F) -> Result<RunStats>
    where
        F: Future<Output = ()>,
    {
        let tick_hz = self.config.bridge.consumer.tick_hz;
        let period = Duration::from_secs_f64(1.0 / tick_hz);
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        info!(
            port = ?self.bridge.local_port(),
            tick_hz,
            max_ticks = ?self.config.max_ticks,
            "Host loop running"
        );

        let mut stats = RunStats::default();
        let mut last_logged: Option<Vector3> = None;
        let mut last_now = 0.0;

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = &mut shutdown => {
                    warn!("Received shutdown signal, stopping bridge...");
                    break;
                }
            }

            let now = self.started.elapsed().as_secs_f64();
            let report = self.bridge.poll(now);
            stats.ticks += 1;

            record_cycle_metrics(&report);
            stats.metrics.update(&report);

            let current = self.follower.tick(&report.target, now - last_now);
            last_now = now;

            // 只记录有意义的移动
            let target = report.target.location;
            let moved = last_logged.map_or(true, |p| (target - p).size() > LOG_MOVE_THRESHOLD_CM);
            if self.bridge.reconciler().has_data() && moved {
                info!(
                    x = format!("{:.1}", target.x),
                    y = format!("{:.1}", target.y),
                    z = format!("{:.1}", target.z),
                    yaw = format!("{:.1}", report.target.rotation.yaw),
                    "New target location"
                );
                last_logged = Some(target);
            }

            trace!(
                tick = stats.ticks,
                datagrams = report.datagrams,
                current_x = current.location.x,
                current_y = current.location.y,
                current_z = current.location.z,
                "Host tick"
            );

            if let Some(max) = self.config.max_ticks {
                if stats.ticks >= max {
                    info!(ticks = stats.ticks, "Reached max ticks limit");
                    break;
                }
            }

            if let Some(timeout) = self.config.timeout {
                if self.started.elapsed() >= timeout {
                    warn!(timeout_secs = timeout.as_secs(), "Host loop timed out");
                    break;
                }
            }
        }

        // Shutdown
        info!("Shutting down bridge...");
        stats.final_port = self.bridge.local_port();
        stats.target = self.bridge.target();
        stats.current = self.follower.current();
        stats.ingestion = self.bridge.transport().metrics().snapshot();
        stats.reconciler = self.bridge.reconciler().stats();
        self.bridge.shutdown();
        stats.duration = self.started.elapsed();

        info!(
            duration_secs = stats.duration.as_secs_f64(),
            ticks = stats.ticks,
            datagrams = stats.ingestion.datagrams_received,
            "Bridge shutdown complete"
        );

        Ok(stats)
    }
}
