//! Transport Listener
//!
//! 非阻塞 UDP 接收端：每个 poll 周期把当前排队的数据报一次性取完。

use std::io::ErrorKind;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket};
use std::sync::Arc;

use bytes::Bytes;
use contracts::{ListenerConfig, MAX_DATAGRAM_SIZE};
use socket2::{Domain, Protocol, Socket, Type};
use tracing::{debug, info, trace, warn};

use crate::error::{IngestionError, Result};
use crate::counters::IngestionMetrics;

/// 数据报传输抽象
///
/// Port Discovery 与 Reconciler 只依赖这个 trait，测试中可替换为内存实现。
pub trait DatagramTransport {
    /// 绑定端口；已绑定时返回 `AlreadyBound`
    fn bind(&mut self, port: u16) -> Result<()>;

    /// 先关闭已有 socket 再绑定新端口
    fn rebind(&mut self, port: u16) -> Result<()> {
        self.close();
        self.bind(port)
    }

    /// 释放 socket；重复调用无副作用
    fn close(&mut self);

    /// 取出当前排队的数据报，按到达顺序
    ///
    /// 实现可设单次上限，超出部分留在队列中由下一次调用取出。
    fn poll(&mut self) -> Vec<Bytes>;

    /// 当前绑定端口
    fn local_port(&self) -> Option<u16>;

    /// 自上次 (重新) 绑定以来是否收到过数据报
    fn has_received(&self) -> bool;
}

/// UDP 监听器
pub struct UdpListener {
    config: ListenerConfig,
    socket: Option<UdpSocket>,
    port: Option<u16>,
    received_since_bind: bool,
    recv_buf: Box<[u8]>,
    metrics: Arc<IngestionMetrics>,
}

impl UdpListener {
    /// 创建未绑定的监听器
    pub fn new(config: ListenerConfig) -> Self {
        Self::with_metrics(config, Arc::new(IngestionMetrics::new()))
    }

    /// 使用共享的 metrics 实例创建
    pub fn with_metrics(config: ListenerConfig, metrics: Arc<IngestionMetrics>) -> Self {
        Self {
            config,
            socket: None,
            port: None,
            received_since_bind: false,
            // 多留 1 字节用于检测超长数据报
            recv_buf: vec![0u8; MAX_DATAGRAM_SIZE + 1].into_boxed_slice(),
            metrics,
        }
    }

    /// 获取 metrics
    pub fn metrics(&self) -> Arc<IngestionMetrics> {
        self.metrics.clone()
    }

    /// 是否已绑定
    pub fn is_bound(&self) -> bool {
        self.socket.is_some()
    }

    fn open_socket(&self, port: u16) -> std::io::Result<UdpSocket> {
        let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
        socket.set_reuse_address(true)?;
        socket.set_nonblocking(true)?;

        if let Err(e) = socket.set_recv_buffer_size(self.config.receive_buffer_size) {
            warn!(
                port,
                requested = self.config.receive_buffer_size,
                error = %e,
                "failed to set udp receive buffer size"
            );
        }

        let addr = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port));
        socket.bind(&addr.into())?;

        Ok(socket.into())
    }
}

impl DatagramTransport for UdpListener {
    fn bind(&mut self, port: u16) -> Result<()> {
        if let Some(bound) = self.port {
            return Err(IngestionError::AlreadyBound { port: bound });
        }

        let socket = self
            .open_socket(port)
            .map_err(|source| IngestionError::Bind { port, source })?;
        let local_port = socket.local_addr()?.port();

        info!(requested = port, port = local_port, "udp listener bound");
        metrics::gauge!("drone_bridge_listen_port").set(local_port as f64);

        self.socket = Some(socket);
        self.port = Some(local_port);
        self.received_since_bind = false;
        Ok(())
    }

    fn rebind(&mut self, port: u16) -> Result<()> {
        self.close();
        self.bind(port)?;
        self.metrics.record_rebind();
        Ok(())
    }

    fn close(&mut self) {
        if let Some(socket) = self.socket.take() {
            debug!(port = ?self.port, "udp listener closed");
            drop(socket);
        }
        self.port = None;
        self.received_since_bind = false;
    }

    fn poll(&mut self) -> Vec<Bytes> {
        let Some(socket) = self.socket.as_ref() else {
            return Vec::new();
        };

        let mut datagrams = Vec::new();
        while datagrams.len() < self.config.max_datagrams_per_poll {
            match socket.recv_from(&mut self.recv_buf) {
                Ok((0, _)) => continue,
                Ok((len, from)) => {
                    let truncated = len > MAX_DATAGRAM_SIZE;
                    let len = len.min(MAX_DATAGRAM_SIZE);
                    if truncated {
                        debug!(%from, "datagram truncated to {} bytes", MAX_DATAGRAM_SIZE);
                        metrics::counter!("drone_bridge_datagrams_truncated_total").increment(1);
                    }

                    self.metrics.record_received(len, truncated);
                    metrics::counter!("drone_bridge_datagrams_received_total").increment(1);
                    metrics::histogram!("drone_bridge_datagram_bytes").record(len as f64);
                    trace!(%from, bytes = len, "datagram received");

                    datagrams.push(Bytes::copy_from_slice(&self.recv_buf[..len]));
                }
                Err(ref e) if e.kind() == ErrorKind::WouldBlock => break,
                // ICMP port unreachable 等瞬时错误
                Err(ref e)
                    if matches!(e.kind(), ErrorKind::ConnectionReset | ErrorKind::Interrupted) =>
                {
                    self.metrics.record_recv_error();
                    continue;
                }
                Err(e) => {
                    self.metrics.record_recv_error();
                    warn!(port = ?self.port, error = %e, "udp receive failed");
                    break;
                }
            }
        }

        // 上限只是单周期的安全边界，剩余数据报留给下一周期
        if datagrams.len() >= self.config.max_datagrams_per_poll {
            self.metrics.record_capped_poll();
            debug!(
                port = ?self.port,
                cap = self.config.max_datagrams_per_poll,
                "poll cap reached, remaining datagrams deferred to next cycle"
            );
        }

        if !datagrams.is_empty() {
            self.received_since_bind = true;
        }
        datagrams
    }

    fn local_port(&self) -> Option<u16> {
        self.port
    }

    fn has_received(&self) -> bool {
        self.received_since_bind
    }
}

impl Drop for UdpListener {
    fn drop(&mut self) {
        self.close();
    }
}
