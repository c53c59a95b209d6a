//! `info` command implementation.

use anyhow::{Context, Result};
use config_loader::ConfigLoader;
use contracts::{BridgeConfig, MAX_DATAGRAM_SIZE};
use tracing::info;

use crate::cli::InfoArgs;

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    let config = ConfigLoader::load_or_default(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let json = ConfigLoader::to_json(&config).context("Failed to serialize config info")?;
        println!("{}", json);
    } else if args.toml {
        let toml = ConfigLoader::to_toml(&config).context("Failed to serialize config info")?;
        println!("{}", toml);
    } else {
        let source = if args.config.exists() {
            args.config.display().to_string()
        } else {
            "(defaults)".to_string()
        };
        print_config_info(&config, &source);
    }

    Ok(())
}

fn print_config_info(config: &BridgeConfig, source: &str) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                 Drone Bridge Configuration                   ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");
    println!("Source: {}\n", source);

    // Listener
    let listener = &config.listener;
    println!("📡 Listener");
    println!("   ├─ Port: {}", listener.port);
    println!("   ├─ Receive buffer: {} bytes", listener.receive_buffer_size);
    println!("   ├─ Max datagrams per poll: {}", listener.max_datagrams_per_poll);
    println!("   └─ Max datagram size: {} bytes", MAX_DATAGRAM_SIZE);

    // Discovery
    let discovery = &config.discovery;
    println!("\n🔍 Port Discovery");
    if discovery.enabled {
        println!(
            "   ├─ Range: {}..={}",
            discovery.port_start, discovery.port_end
        );
        println!("   ├─ Dwell: {}s", discovery.dwell_s);
        println!("   └─ Timeout: {}s", discovery.timeout_s);
    } else {
        println!("   └─ Disabled");
    }

    // Reconciler
    let reconciler = &config.reconciler;
    println!("\n⚙️  Reconciler");
    match reconciler.min_update_interval() {
        Some(interval) => println!(
            "   ├─ Max update rate: {} Hz ({:.1} ms)",
            reconciler.max_update_hz,
            interval * 1000.0
        ),
        None => println!("   ├─ Max update rate: unlimited"),
    }
    println!("   ├─ Scale: {}", reconciler.scale);
    let placement = reconciler.initial_placement;
    println!(
        "   └─ Initial placement: ({}, {}, {})",
        placement.x, placement.y, placement.z
    );

    // Consumer
    let consumer = &config.consumer;
    println!("\n🎯 Consumer");
    println!("   ├─ Tick rate: {} Hz", consumer.tick_hz);
    println!("   ├─ Smooth speed: {}", consumer.smooth_speed);
    println!("   ├─ Facing: {:?}", consumer.facing);
    println!("   └─ Face speed: {}", consumer.face_speed);

    println!();
}
