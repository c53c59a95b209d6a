//! `run` command implementation.

use anyhow::{Context, Result};
use contracts::BridgeConfig;
use std::time::Duration;
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::pipeline::{HostLoop, HostLoopConfig};

/// Execute the `run` command
pub async fn run_bridge(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        info!("Configuration file not found, using defaults");
    }

    // Load and parse configuration
    let mut config = config_loader::ConfigLoader::load_or_default(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    // Apply CLI overrides
    apply_overrides(&mut config, args);
    config_loader::ConfigLoader::validate(&config)
        .context("Configuration invalid after CLI overrides")?;

    info!(
        port = config.listener.port,
        discovery = config.discovery.enabled,
        max_update_hz = config.reconciler.max_update_hz,
        scale = config.reconciler.scale,
        tick_hz = config.consumer.tick_hz,
        "Configuration loaded"
    );

    let host_config = HostLoopConfig {
        bridge: config,
        max_ticks: (args.max_ticks != 0).then_some(args.max_ticks),
        timeout: (args.timeout != 0).then(|| Duration::from_secs(args.timeout)),
        metrics_port: (args.metrics_port != 0).then_some(args.metrics_port),
    };

    let host = HostLoop::start(host_config)?;

    info!("Starting host loop...");
    let stats = host
        .run(shutdown_signal())
        .await
        .context("Host loop failed")?;

    info!(
        ticks = stats.ticks,
        datagrams = stats.ingestion.datagrams_received,
        duration_secs = stats.duration.as_secs_f64(),
        "Drone Bridge finished"
    );

    // Print detailed statistics
    stats.print_summary();

    Ok(())
}

fn apply_overrides(config: &mut BridgeConfig, args: &RunArgs) {
    if let Some(port) = args.port {
        info!(port, "Overriding listen port from CLI");
        config.listener.port = port;
    }
    if args.discover {
        info!("Enabling port discovery from CLI");
        config.discovery.enabled = true;
    }
    if let Some(hz) = args.max_update_hz {
        info!(max_update_hz = hz, "Overriding max update rate from CLI");
        config.reconciler.max_update_hz = hz;
    }
    if let Some(scale) = args.scale {
        info!(scale, "Overriding scale from CLI");
        config.reconciler.scale = scale;
    }
}

/// Ctrl+C / SIGTERM
///
/// 信号处理安装失败时只记录警告，该分支永不完成。
pub(crate) async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
