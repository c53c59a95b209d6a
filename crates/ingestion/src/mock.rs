//! Mock 遥测源与内存传输
//!
//! 用于无真实无人机环境的测试。

use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use bytes::Bytes;
use contracts::{PoseSample, Quaternion, Vector3};
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::error::{IngestionError, Result};
use crate::listener::DatagramTransport;
use crate::parser::format_payload;

/// 内存数据报传输
///
/// 行为与 UDP 一致：只有发往当前绑定端口的数据报会被投递。
#[derive(Debug, Default)]
pub struct MemoryTransport {
    port: Option<u16>,
    blocked: HashSet<u16>,
    inbox: Vec<Bytes>,
    received: bool,
    history: Vec<u16>,
    next_ephemeral: u16,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self {
            next_ephemeral: 49152,
            ..Default::default()
        }
    }

    /// 令端口绑定失败
    pub fn block_port(&mut self, port: u16) {
        self.blocked.insert(port);
    }

    /// 向端口发送数据报，未绑定到该端口时丢弃并返回 false
    pub fn send(&mut self, port: u16, payload: Bytes) -> bool {
        if self.port == Some(port) {
            self.inbox.push(payload);
            true
        } else {
            false
        }
    }

    /// 发往当前绑定端口
    pub fn send_bound(&mut self, payload: Bytes) -> bool {
        match self.port {
            Some(port) => self.send(port, payload),
            None => false,
        }
    }

    /// 成功绑定过的端口序列
    pub fn bind_history(&self) -> &[u16] {
        &self.history
    }
}

impl DatagramTransport for MemoryTransport {
    fn bind(&mut self, port: u16) -> Result<()> {
        if let Some(bound) = self.port {
            return Err(IngestionError::AlreadyBound { port: bound });
        }
        if self.blocked.contains(&port) {
            return Err(IngestionError::Bind {
                port,
                source: std::io::Error::from(std::io::ErrorKind::AddrInUse),
            });
        }

        let port = if port == 0 {
            self.next_ephemeral = self.next_ephemeral.wrapping_add(1).max(49152);
            self.next_ephemeral
        } else {
            port
        };

        self.port = Some(port);
        self.received = false;
        self.history.push(port);
        Ok(())
    }

    fn close(&mut self) {
        self.port = None;
        self.received = false;
        self.inbox.clear();
    }

    fn poll(&mut self) -> Vec<Bytes> {
        let datagrams = std::mem::take(&mut self.inbox);
        if !datagrams.is_empty() {
            self.received = true;
        }
        datagrams
    }

    fn local_port(&self) -> Option<u16> {
        self.port
    }

    fn has_received(&self) -> bool {
        self.received
    }
}

/// Mock 遥测源配置
#[derive(Debug, Clone)]
pub struct MockTelemetryConfig {
    /// 目标地址
    pub target: SocketAddr,

    /// 发送频率 (Hz)
    pub frequency_hz: f64,

    /// 圆周半径 (米)
    pub radius_m: f64,

    /// 角速度 (rad/s)
    pub angular_speed: f64,

    /// 飞行高度 (米, 向上为正)
    pub altitude_m: f64,

    /// 发送数量上限
    pub max_samples: Option<u64>,
}

impl Default for MockTelemetryConfig {
    fn default() -> Self {
        Self {
            target: SocketAddr::from(([127, 0, 0, 1], 8888)),
            frequency_hz: 30.0,
            radius_m: 5.0,
            angular_speed: 0.5,
            altitude_m: 2.0,
            max_samples: None,
        }
    }
}

/// Mock 遥测源
///
/// 沿水平圆周轨迹生成位姿，按发送端的文本格式经 UDP 发出。
pub struct MockTelemetrySource {
    config: MockTelemetryConfig,
    running: Arc<AtomicBool>,
    sent: Arc<AtomicU64>,
}

impl MockTelemetrySource {
    /// 创建新的 Mock 遥测源
    pub fn new(config: MockTelemetryConfig) -> Self {
        Self {
            config,
            running: Arc::new(AtomicBool::new(false)),
            sent: Arc::new(AtomicU64::new(0)),
        }
    }

    /// 发往指定地址的默认轨迹
    pub fn to(target: SocketAddr, frequency_hz: f64) -> Self {
        Self::new(MockTelemetryConfig {
            target,
            frequency_hz,
            ..Default::default()
        })
    }

    /// t 秒时的轨迹样本 (NED)
    pub fn sample_at(config: &MockTelemetryConfig, t: f64) -> PoseSample {
        let angle = config.angular_speed * t;
        let (sin, cos) = angle.sin_cos();
        let r = config.radius_m;
        let w = config.angular_speed;

        let position = Vector3::new(r * cos, r * sin, -config.altitude_m);
        let velocity = Vector3::new(-r * w * sin, r * w * cos, 0.0);

        // 机头朝向切线方向，绕 Down 轴旋转
        let yaw = angle + std::f64::consts::FRAC_PI_2;
        let (half_sin, half_cos) = (yaw / 2.0).sin_cos();
        let orientation = Quaternion::new(0.0, 0.0, half_sin, half_cos);

        PoseSample::new((t * 1e6) as u64, position, orientation)
            .with_velocity(velocity)
            .with_angular_velocity(Vector3::new(0.0, 0.0, w))
    }

    /// 启动发送任务
    ///
    /// 发送 socket 在返回前绑定，绑定失败直接返回错误。
    /// 任务结束时返回已发送数量。
    pub async fn start(&self) -> Result<JoinHandle<u64>> {
        let socket = UdpSocket::bind(SocketAddr::from(([0, 0, 0, 0], 0)))
            .await
            .map_err(|source| IngestionError::Bind { port: 0, source })?;

        let config = self.config.clone();
        let running = self.running.clone();
        let sent = self.sent.clone();

        running.store(true, Ordering::SeqCst);

        Ok(tokio::spawn(async move {
            let period = Duration::from_secs_f64(1.0 / config.frequency_hz.max(f64::EPSILON));
            let mut ticker = tokio::time::interval(period);
            let start_time = std::time::Instant::now();

            debug!(
                addr = %config.target,
                frequency_hz = config.frequency_hz,
                "mock telemetry source started"
            );

            while running.load(Ordering::Relaxed) {
                ticker.tick().await;

                let t = start_time.elapsed().as_secs_f64();
                let payload = format_payload(&Self::sample_at(&config, t));

                match socket.send_to(payload.as_bytes(), config.target).await {
                    Ok(bytes) => {
                        let count = sent.fetch_add(1, Ordering::Relaxed) + 1;
                        trace!(count, bytes, t, "mock telemetry sent");

                        if config.max_samples.is_some_and(|max| count >= max) {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(addr = %config.target, error = %e, "mock telemetry send failed");
                    }
                }
            }

            running.store(false, Ordering::SeqCst);
            let total = sent.load(Ordering::Relaxed);
            debug!(total, "mock telemetry source stopped");
            total
        }))
    }

    /// 停止 Mock 源
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// 检查是否正在运行
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// 已发送数量
    pub fn sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn test_memory_transport_drops_unbound_sends() {
        let mut transport = MemoryTransport::new();
        assert!(!transport.send(7000, Bytes::from_static(b"x")));

        transport.bind(7000).unwrap();
        assert!(!transport.send(7001, Bytes::from_static(b"x")));
        assert!(transport.send(7000, Bytes::from_static(b"y")));
        assert!(!transport.has_received());

        assert_eq!(transport.poll(), vec![Bytes::from_static(b"y")]);
        assert!(transport.has_received());
        assert!(transport.poll().is_empty());
    }

    #[test]
    fn test_memory_transport_ephemeral_port() {
        let mut transport = MemoryTransport::new();
        transport.bind(0).unwrap();
        assert!(transport.local_port().unwrap() > 49152);
    }

    #[test]
    fn test_trajectory_is_circular() {
        let config = MockTelemetryConfig::default();
        for t in [0.0, 1.0, 2.5, 7.0] {
            let sample = MockTelemetrySource::sample_at(&config, t);
            let horizontal = Vector3::new(sample.position.x, sample.position.y, 0.0);
            assert!((horizontal.size() - config.radius_m).abs() < 1e-9);
            assert_eq!(sample.position.z, -config.altitude_m);
            assert!((sample.orientation.norm() - 1.0).abs() < 1e-9);
        }
    }

    #[tokio::test]
    async fn test_mock_source_sends_parseable_payloads() {
        let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let target = receiver.local_addr().unwrap();

        let source = MockTelemetrySource::new(MockTelemetryConfig {
            target,
            frequency_hz: 200.0,
            max_samples: Some(3),
            ..Default::default()
        });
        let handle = source.start().await.unwrap();

        let mut buf = vec![0u8; 4096];
        for _ in 0..3 {
            let (len, _) = tokio::time::timeout(Duration::from_secs(2), receiver.recv_from(&mut buf))
                .await
                .unwrap()
                .unwrap();
            let sample = parse(&buf[..len]).unwrap();
            assert!(sample.velocity.is_some());
        }

        assert_eq!(handle.await.unwrap(), 3);
        assert!(!source.is_running());
        assert_eq!(source.sent(), 3);
    }
}
