//! `emit` command implementation.

use anyhow::{Context, Result};
use ingestion::{MockTelemetryConfig, MockTelemetrySource};
use std::time::Duration;
use tracing::{info, warn};

use super::run::shutdown_signal;
use crate::cli::EmitArgs;

/// Execute the `emit` command
pub async fn run_emit(args: &EmitArgs) -> Result<()> {
    if !(args.rate.is_finite() && args.rate > 0.0) {
        anyhow::bail!("--rate must be a positive number, got {}", args.rate);
    }
    if !(args.duration.is_finite() && args.duration >= 0.0) {
        anyhow::bail!("--duration must be >= 0, got {}", args.duration);
    }

    let source = MockTelemetrySource::new(MockTelemetryConfig {
        target: args.target,
        frequency_hz: args.rate,
        radius_m: args.radius,
        altitude_m: args.altitude,
        ..Default::default()
    });

    info!(
        target_addr = %args.target,
        rate_hz = args.rate,
        duration_secs = args.duration,
        "Emitting synthetic telemetry"
    );

    let handle = source
        .start()
        .await
        .context("Failed to start telemetry source")?;

    let limit = async {
        if args.duration > 0.0 {
            tokio::time::sleep(Duration::from_secs_f64(args.duration)).await;
        } else {
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        _ = limit => {}
        _ = shutdown_signal() => {
            warn!("Received shutdown signal, stopping emitter...");
        }
    }

    source.stop();
    let sent = handle.await.context("Telemetry source task failed")?;

    info!(sent, "Emitter finished");
    println!("Sent {} datagrams to {}", sent, args.target);

    Ok(())
}
