//! Host loop orchestration module.

mod orchestrator;
mod stats;

pub use orchestrator::{HostLoop, HostLoopConfig};
pub use stats::RunStats;
