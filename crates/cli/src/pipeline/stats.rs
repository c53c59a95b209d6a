//! Host loop statistics.

use std::time::Duration;

use contracts::TargetPose;
use ingestion::MetricsSnapshot;
use observability::BridgeMetricsAggregator;
use reconciler::ReconcilerStats;

/// Statistics from a host loop run
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    /// Total host ticks executed
    pub ticks: u64,

    /// Total duration of the run
    pub duration: Duration,

    /// Port listened on at shutdown
    pub final_port: Option<u16>,

    /// Last target pose produced by the bridge
    pub target: TargetPose,

    /// Last smoothed pose of the follower
    pub current: TargetPose,

    /// Listener counters
    pub ingestion: MetricsSnapshot,

    /// Reconciler counters
    pub reconciler: ReconcilerStats,

    /// Per-cycle metrics aggregator
    pub metrics: BridgeMetricsAggregator,
}

impl RunStats {
    /// Achieved host tick rate
    pub fn tick_rate(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.ticks as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                   Drone Bridge Statistics                    ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Ticks: {} ({:.1} Hz)", self.ticks, self.tick_rate());
        match self.final_port {
            Some(port) => println!("   └─ Port: {}", port),
            None => println!("   └─ Port: (unbound)"),
        }

        println!("\n📡 Transport");
        println!("   ├─ Datagrams: {}", self.ingestion.datagrams_received);
        println!("   ├─ Bytes: {}", self.ingestion.bytes_received);
        println!("   ├─ Truncated: {}", self.ingestion.datagrams_truncated);
        println!("   ├─ Receive errors: {}", self.ingestion.recv_errors);
        println!("   ├─ Capped polls: {}", self.ingestion.capped_polls);
        println!("   └─ Rebinds: {}", self.ingestion.rebinds);

        println!("\n🔄 Reconciler");
        println!("   ├─ Full updates: {}", self.reconciler.full_applied);
        println!("   ├─ Orientation-only: {}", self.reconciler.orientation_applied);
        println!("   ├─ Drained: {}", self.reconciler.drained);
        println!("   ├─ Pending overwrites: {}", self.reconciler.pending_overwrites);
        println!("   └─ Parse failures: {}", self.reconciler.parse_failures);

        let location = self.target.location;
        let rotation = self.target.rotation;
        println!("\n🎯 Final Target");
        println!(
            "   ├─ Location (cm): ({:.1}, {:.1}, {:.1})",
            location.x, location.y, location.z
        );
        println!(
            "   ├─ Rotation (deg): pitch={:.1} yaw={:.1} roll={:.1}",
            rotation.pitch, rotation.yaw, rotation.roll
        );
        let smoothed = self.current.location;
        println!(
            "   └─ Smoothed location (cm): ({:.1}, {:.1}, {:.1})",
            smoothed.x, smoothed.y, smoothed.z
        );

        println!("\n{}", self.metrics.summary());
    }
}
