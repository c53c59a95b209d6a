//! # Contracts
//!
//! Frozen interface contracts shared by every crate of the telemetry bridge.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Frames and units
//! - Source frame: North-East-Down, meters, quaternion in (x, y, z, w) order
//! - Consumer frame: Forward-Right-Up, centimeters, rotation in degrees
//!
//! ## Time Model
//! - Host arrival time (seconds, f64) gates rate limiting and discovery
//! - The payload `timestamp` is advisory and never used for ordering

mod command;
mod config;
mod error;
mod pose;
mod report;

pub use command::*;
pub use config::*;
pub use error::*;
pub use pose::*;
pub use report::*;
