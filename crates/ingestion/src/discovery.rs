//! Port Discovery
//!
//! 监听端口未知时，按固定驻留时间在端口范围内轮换，直到收到数据报
//! 或范围/超时耗尽。状态显式建模：
//!
//! ```text
//! Idle ──start──▶ Scanning ──data seen──────▶ Bound(DataSeen)
//!                    │  ▲
//!                    │  └─ dwell elapsed: rebind next candidate
//!                    ├──── timeout ─────────▶ Bound(TimedOut)
//!                    └──── range end ───────▶ Bound(RangeExhausted)
//! ```

use contracts::{BoundReason, DiscoveryConfig};
use tracing::{debug, info, warn};

use crate::listener::DatagramTransport;

/// 发现状态
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DiscoveryState {
    /// 未启动
    Idle,
    /// 扫描中
    Scanning {
        /// 下一个候选端口 (u32 防止 65535 溢出)
        next_candidate: u32,
        /// 当前绑定的端口
        current: Option<u16>,
        /// 扫描开始时间 (秒)
        started_at: f64,
        /// 上次换端口的时间 (秒)
        last_advance: f64,
    },
    /// 终态：端口已固定
    Bound {
        /// 最终端口 (所有绑定均失败时为 None)
        port: Option<u16>,
        /// 冻结原因
        reason: BoundReason,
    },
}

/// 端口发现状态机
#[derive(Debug)]
pub struct PortDiscovery {
    config: DiscoveryConfig,
    state: DiscoveryState,
    /// 最近一次绑定成功的端口
    last_good: Option<u16>,
    rebinds: u64,
}

impl PortDiscovery {
    /// 创建 (Idle)
    pub fn new(config: DiscoveryConfig) -> Self {
        Self {
            config,
            state: DiscoveryState::Idle,
            last_good: None,
            rebinds: 0,
        }
    }

    /// 开始扫描
    ///
    /// `current` 为启动时已绑定的端口，首个驻留周期内保持不变。
    pub fn start(&mut self, now: f64, current: Option<u16>) {
        info!(
            port_start = self.config.port_start,
            port_end = self.config.port_end,
            dwell_s = self.config.dwell_s,
            timeout_s = self.config.timeout_s,
            "port discovery started"
        );

        self.last_good = current;
        self.state = DiscoveryState::Scanning {
            next_candidate: u32::from(self.config.port_start),
            current,
            started_at: now,
            last_advance: now,
        };
    }

    /// 每个 poll 周期调用一次，必须在排空 socket 之前
    ///
    /// 本次调用进入终态时返回 `Some(reason)`。
    pub fn service<T>(&mut self, transport: &mut T, now: f64) -> Option<BoundReason>
    where
        T: DatagramTransport + ?Sized,
    {
        let DiscoveryState::Scanning {
            next_candidate,
            started_at,
            last_advance,
            ..
        } = self.state
        else {
            return None;
        };

        if transport.has_received() {
            return Some(self.freeze(transport, BoundReason::DataSeen));
        }

        if now - started_at > self.config.timeout_s {
            warn!(
                elapsed_s = now - started_at,
                port = ?transport.local_port(),
                "port discovery timed out, keeping last bound port"
            );
            return Some(self.freeze(transport, BoundReason::TimedOut));
        }

        if now - last_advance < self.config.dwell_s {
            return None;
        }

        let mut candidate = next_candidate;
        while candidate <= u32::from(self.config.port_end) {
            // 范围不超过 port_end (u16)，转换必然成功
            let port = candidate as u16;
            candidate += 1;

            match transport.rebind(port) {
                Ok(()) => {
                    self.rebinds += 1;
                    self.last_good = transport.local_port();
                    metrics::counter!("drone_bridge_discovery_rebinds_total").increment(1);
                    debug!(port, "discovery candidate bound");

                    self.state = DiscoveryState::Scanning {
                        next_candidate: candidate,
                        current: self.last_good,
                        started_at,
                        last_advance: now,
                    };
                    return None;
                }
                Err(e) => {
                    debug!(port, error = %e, "discovery candidate unavailable, skipping");
                }
            }
        }

        Some(self.freeze(transport, BoundReason::RangeExhausted))
    }

    fn freeze<T>(&mut self, transport: &mut T, reason: BoundReason) -> BoundReason
    where
        T: DatagramTransport + ?Sized,
    {
        // 失败的 rebind 会关闭 socket，需要恢复最后可用的端口
        if transport.local_port().is_none() {
            if let Some(port) = self.last_good {
                if let Err(e) = transport.rebind(port) {
                    warn!(port, error = %e, "failed to restore last good port");
                }
            }
        }

        let port = transport.local_port();
        match reason {
            BoundReason::DataSeen => {
                info!(?port, rebinds = self.rebinds, "port discovery locked on data")
            }
            BoundReason::TimedOut | BoundReason::RangeExhausted => {
                warn!(
                    ?port,
                    ?reason,
                    rebinds = self.rebinds,
                    "port discovery finished without data"
                )
            }
        }

        self.state = DiscoveryState::Bound { port, reason };
        reason
    }

    /// 当前状态
    pub fn state(&self) -> &DiscoveryState {
        &self.state
    }

    /// 是否仍在扫描
    pub fn is_scanning(&self) -> bool {
        matches!(self.state, DiscoveryState::Scanning { .. })
    }

    /// 终态端口
    pub fn bound_port(&self) -> Option<u16> {
        match self.state {
            DiscoveryState::Bound { port, .. } => port,
            _ => None,
        }
    }

    /// 扫描期间的 rebind 次数
    pub fn rebinds(&self) -> u64 {
        self.rebinds
    }
}
