//! TelemetryBridge - 单线程轮询周期
//!
//! 每个周期：先服务端口发现，再排空 socket 交给 Reconciler，
//! 最后释放待处理槽并给出本周期的目标位姿。

use contracts::{BridgeConfig, CycleReport, TargetPose};
use ingestion::{DatagramTransport, PortDiscovery, UdpListener};
use tracing::{info, instrument, trace, warn};

use crate::engine::{Outcome, Reconciler};
use crate::error::BridgeError;

/// 遥测桥
pub struct TelemetryBridge<T = UdpListener> {
    transport: T,
    reconciler: Reconciler,
    discovery: Option<PortDiscovery>,
    cycles: u64,
}

impl TelemetryBridge<UdpListener> {
    /// 使用 UDP 监听器启动
    pub fn start(config: &BridgeConfig, now: f64) -> Result<Self, BridgeError> {
        Self::start_with(UdpListener::new(config.listener.clone()), config, now)
    }
}

impl<T: DatagramTransport> TelemetryBridge<T> {
    /// 使用指定传输启动
    ///
    /// 未启用端口发现且固定端口绑定失败时返回 `NoPortAvailable`；
    /// 启用时绑定失败只记录警告，由端口发现接管。
    pub fn start_with(mut transport: T, config: &BridgeConfig, now: f64) -> Result<Self, BridgeError> {
        let port = config.listener.port;

        let discovery = match (transport.bind(port), config.discovery.enabled) {
            (Ok(()), false) => None,
            (Err(source), false) => {
                return Err(BridgeError::NoPortAvailable { port, source });
            }
            (bound, true) => {
                if let Err(e) = bound {
                    warn!(port, error = %e, "initial port unavailable, relying on discovery");
                }
                let mut discovery = PortDiscovery::new(config.discovery.clone());
                discovery.start(now, transport.local_port());
                Some(discovery)
            }
        };

        info!(
            port = ?transport.local_port(),
            discovery = config.discovery.enabled,
            max_update_hz = config.reconciler.max_update_hz,
            scale = config.reconciler.scale,
            "telemetry bridge started"
        );

        Ok(Self {
            transport,
            reconciler: Reconciler::new(config.reconciler.clone()),
            discovery,
            cycles: 0,
        })
    }

    /// 执行一个轮询周期
    #[instrument(level = "trace", name = "bridge_poll", skip(self))]
    pub fn poll(&mut self, now: f64) -> CycleReport {
        let mut report = CycleReport {
            now,
            ..Default::default()
        };
        self.cycles += 1;

        if let Some(discovery) = self.discovery.as_mut() {
            report.discovery = discovery.service(&mut self.transport, now);
        }

        for raw in self.transport.poll() {
            report.datagrams += 1;
            match self.reconciler.on_datagram(raw, now) {
                Outcome::Applied | Outcome::Drained => report.applied += 1,
                Outcome::OrientationOnly => report.orientation_only += 1,
                Outcome::Discarded(_) => report.discarded += 1,
            }
        }

        match self.reconciler.drain_pending(now) {
            Some(Outcome::Drained) => report.drained = true,
            Some(Outcome::Discarded(_)) => report.discarded += 1,
            _ => {}
        }

        report.target = self.reconciler.target();
        trace!(
            datagrams = report.datagrams,
            applied = report.applied,
            orientation_only = report.orientation_only,
            drained = report.drained,
            "poll cycle complete"
        );
        report
    }

    /// 当前目标位姿
    pub fn target(&self) -> TargetPose {
        self.reconciler.target()
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    pub fn discovery(&self) -> Option<&PortDiscovery> {
        self.discovery.as_ref()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// 当前监听端口
    pub fn local_port(&self) -> Option<u16> {
        self.transport.local_port()
    }

    /// 已执行的周期数
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// 关闭传输；可重复调用
    pub fn shutdown(&mut self) {
        self.transport.close();
    }
}
