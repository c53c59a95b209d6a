//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::BridgeConfig;
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    port: u16,
    discovery: bool,
    max_update_hz: f64,
    scale: f64,
    tick_hz: f64,
    facing: String,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    // Check file exists
    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    // Try to load and validate
    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => {
            let warnings = collect_warnings(&config);

            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    port: config.listener.port,
                    discovery: config.discovery.enabled,
                    max_update_hz: config.reconciler.max_update_hz,
                    scale: config.reconciler.scale,
                    tick_hz: config.consumer.tick_hz,
                    facing: format!("{:?}", config.consumer.facing),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &BridgeConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.reconciler.max_update_hz == 0.0 {
        warnings.push(
            "reconciler.max_update_hz is 0 - every datagram is fully applied".to_string(),
        );
    } else if config.reconciler.max_update_hz > config.consumer.tick_hz {
        warnings.push(format!(
            "reconciler.max_update_hz ({}) exceeds consumer.tick_hz ({}) - deferred samples drain at tick rate",
            config.reconciler.max_update_hz, config.consumer.tick_hz
        ));
    }

    let discovery = &config.discovery;
    if discovery.enabled {
        let ports = f64::from(discovery.port_end.saturating_sub(discovery.port_start)) + 1.0;
        let full_scan_s = ports * discovery.dwell_s;
        if full_scan_s > discovery.timeout_s {
            warnings.push(format!(
                "discovery.timeout_s ({}) ends the scan after ~{} of {} ports",
                discovery.timeout_s,
                (discovery.timeout_s / discovery.dwell_s).floor(),
                ports
            ));
        }
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Port: {}", summary.port);
            println!("  Discovery: {}", summary.discovery);
            println!("  Max update rate: {} Hz", summary.max_update_hz);
            println!("  Scale: {}", summary.scale);
            println!("  Tick rate: {} Hz", summary.tick_hz);
            println!("  Facing: {}", summary.facing);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
