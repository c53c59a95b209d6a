//! Ingestion 计数器
//!
//! 进程内原子计数，用于运行结束时的统计摘要；
//! Prometheus 指标由 `metrics` 宏单独上报。

use std::sync::atomic::{AtomicU64, Ordering};

/// Ingestion metrics
#[derive(Debug, Default)]
pub struct IngestionMetrics {
    /// Total datagrams received
    pub datagrams_received: AtomicU64,

    /// Total payload bytes received (after truncation)
    pub bytes_received: AtomicU64,

    /// Datagrams cut down to the size cap
    pub datagrams_truncated: AtomicU64,

    /// Transient receive errors
    pub recv_errors: AtomicU64,

    /// Socket rebinds (port discovery)
    pub rebinds: AtomicU64,

    /// Polls that stopped at `max_datagrams_per_poll`
    pub capped_polls: AtomicU64,
}

impl IngestionMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Record datagram received
    pub fn record_received(&self, bytes: usize, truncated: bool) {
        self.datagrams_received.fetch_add(1, Ordering::Relaxed);
        self.bytes_received
            .fetch_add(bytes as u64, Ordering::Relaxed);
        if truncated {
            self.datagrams_truncated.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record transient receive error
    pub fn record_recv_error(&self) {
        self.recv_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record rebind
    pub fn record_rebind(&self) {
        self.rebinds.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a poll cut short by the per-poll cap
    pub fn record_capped_poll(&self) {
        self.capped_polls.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            datagrams_received: self.datagrams_received.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            datagrams_truncated: self.datagrams_truncated.load(Ordering::Relaxed),
            recv_errors: self.recv_errors.load(Ordering::Relaxed),
            rebinds: self.rebinds.load(Ordering::Relaxed),
            capped_polls: self.capped_polls.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub datagrams_received: u64,
    pub bytes_received: u64,
    pub datagrams_truncated: u64,
    pub recv_errors: u64,
    pub rebinds: u64,
    pub capped_polls: u64,
}
