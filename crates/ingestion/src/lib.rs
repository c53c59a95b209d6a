//! # Ingestion
//!
//! Telemetry ingestion module.
//!
//! Responsibilities:
//! - Own the non-blocking UDP receive socket (`UdpListener`)
//! - Parse the line-oriented telemetry payload into `PoseSample`
//! - Cycle the listen port through a range when it is unknown (`PortDiscovery`)
//! - Synthetic telemetry for tests and demos (`MockTelemetrySource`)
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::{DatagramTransport, UdpListener, parse};
//!
//! let mut listener = UdpListener::new(config.listener.clone());
//! listener.bind(config.listener.port)?;
//!
//! // once per host frame
//! for datagram in listener.poll() {
//!     match parse(&datagram) {
//!         Ok(sample) => { /* hand to the reconciler */ }
//!         Err(e) => tracing::debug!(error = %e, "datagram discarded"),
//!     }
//! }
//! ```
//!
//! ## Mock Testing
//!
//! ```ignore
//! use ingestion::MockTelemetrySource;
//!
//! let source = MockTelemetrySource::to("127.0.0.1:8888".parse()?, 30.0);
//! let handle = source.start().await?;
//! ```

mod counters;
mod discovery;
mod error;
mod listener;
mod mock;
mod parser;

// Re-exports
pub use contracts::{BoundReason, PoseSample};
pub use discovery::{DiscoveryState, PortDiscovery};
pub use error::{IngestionError, ParseError, Result};
pub use listener::{DatagramTransport, UdpListener};
pub use counters::{IngestionMetrics, MetricsSnapshot};
pub use mock::{MemoryTransport, MockTelemetryConfig, MockTelemetrySource};
pub use parser::{format_payload, parse, parse_orientation_only};
