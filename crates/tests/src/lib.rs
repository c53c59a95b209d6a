//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 真实 loopback UDP 上的 e2e 测试
//! - 配置文件到桥接的贯通测试

#[cfg(test)]
mod contract_tests {
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{BridgeConfig, CommandMode, CommandPacket, COMMAND_PACKET_SIZE};

    #[test]
    fn test_default_config_survives_toml() {
        let config = BridgeConfig::default();
        let toml = ConfigLoader::to_toml(&config).unwrap();
        let parsed = ConfigLoader::load_from_str(&toml, ConfigFormat::Toml).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_command_packet_layout() {
        let packet = CommandPacket {
            timestamp: 1.5,
            x: 1.0,
            y: -2.0,
            z: 3.0,
            mode: CommandMode::Moving,
        };
        let bytes = packet.encode();
        assert_eq!(bytes.len(), COMMAND_PACKET_SIZE);
        assert_eq!(&bytes[0..8], &1.5f64.to_le_bytes());
        assert_eq!(&bytes[20..24], &1i32.to_le_bytes());
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::net::{SocketAddr, UdpSocket};
    use std::time::Duration;

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{
        BoundReason, BridgeConfig, CommandMode, CommandPacket, CycleReport, PoseSample,
        Quaternion, Vector3,
    };
    use ingestion::{format_payload, MockTelemetryConfig, MockTelemetrySource};
    use observability::BridgeMetricsAggregator;
    use reconciler::TelemetryBridge;

    const SCENARIO: &str =
        "timestamp: 1000\nposition:\n- 10.0\n- 0.0\n- -2.0\nq:\n- 0.0\n- 0.0\n- 0.0\n- 1.0\n";

    fn bridge_config(max_update_hz: f64) -> BridgeConfig {
        let mut config = BridgeConfig::default();
        config.listener.port = 0;
        config.reconciler.max_update_hz = max_update_hz;
        config
    }

    fn sender() -> UdpSocket {
        UdpSocket::bind("127.0.0.1:0").unwrap()
    }

    fn send(socket: &UdpSocket, port: u16, payload: &[u8]) {
        socket.send_to(payload, ("127.0.0.1", port)).unwrap();
    }

    fn payload(position: [f64; 3]) -> String {
        format_payload(&PoseSample::new(
            0,
            Vector3::from_array(position),
            Quaternion::IDENTITY,
        ))
    }

    /// 同一 `now` 下反复轮询，直到 loopback 数据报到达
    async fn poll_until_data(bridge: &mut TelemetryBridge, now: f64) -> CycleReport {
        for _ in 0..200 {
            let report = bridge.poll(now);
            if report.datagrams > 0 {
                return report;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("no datagram arrived within 1s");
    }

    /// End-to-end test: text payload over UDP -> TelemetryBridge
    ///
    /// 首个样本锁定参考点，目标位置为初始位置。
    #[tokio::test]
    async fn test_e2e_scenario_over_udp() {
        let mut bridge = TelemetryBridge::start(&bridge_config(60.0), 0.0).unwrap();
        let port = bridge.local_port().unwrap();

        send(&sender(), port, SCENARIO.as_bytes());
        let report = poll_until_data(&mut bridge, 0.0).await;

        assert_eq!(report.applied, 1);
        assert_eq!(
            bridge.reconciler().reference(),
            Some(Vector3::new(10.0, 0.0, -2.0))
        );
        assert_eq!(report.target.location, Vector3::ZERO);
        assert!(report.target.rotation.pitch.abs() < 1e-9);
        assert!(report.target.rotation.roll.abs() < 1e-9);
    }

    /// 限频：50ms 内的样本只更新旋转，过了间隔后由待处理槽补齐位置
    #[tokio::test]
    async fn test_rate_limit_over_udp() {
        let mut bridge = TelemetryBridge::start(&bridge_config(10.0), 0.0).unwrap();
        let port = bridge.local_port().unwrap();
        let socket = sender();

        send(&socket, port, payload([0.0, 0.0, 0.0]).as_bytes());
        poll_until_data(&mut bridge, 0.0).await;

        send(&socket, port, payload([1.0, 0.0, 0.0]).as_bytes());
        let report = poll_until_data(&mut bridge, 0.05).await;
        assert_eq!(report.orientation_only, 1);
        assert_eq!(report.target.location, Vector3::ZERO);
        assert!(bridge.reconciler().pending().is_occupied());

        let report = bridge.poll(0.15);
        assert!(report.drained);
        assert!(report
            .target
            .location
            .equals(Vector3::new(100.0, 0.0, 0.0), 1e-9));
    }

    /// 垃圾数据不会中断接收
    #[tokio::test]
    async fn test_malformed_datagrams_are_discarded() {
        let mut bridge = TelemetryBridge::start(&bridge_config(0.0), 0.0).unwrap();
        let port = bridge.local_port().unwrap();
        let socket = sender();

        // 二进制指令包不是遥测载荷
        let command = CommandPacket {
            timestamp: 0.0,
            x: 0.0,
            y: 0.0,
            z: 0.0,
            mode: CommandMode::Idle,
        };
        send(&socket, port, &command.encode());
        send(&socket, port, b"position:\n- 1.0\n");
        send(&socket, port, SCENARIO.as_bytes());

        let mut aggregator = BridgeMetricsAggregator::new();
        let mut now = 0.0;
        while aggregator.total_datagrams < 3 && now < 1.0 {
            let report = poll_until_data(&mut bridge, now).await;
            aggregator.update(&report);
            now += 0.01;
        }

        assert_eq!(aggregator.total_datagrams, 3);
        assert_eq!(aggregator.total_discarded, 2);
        assert_eq!(aggregator.total_applied, 1);
        assert_eq!(bridge.reconciler().stats().parse_failures, 2);
        assert!(bridge.reconciler().has_data());
    }

    /// MockTelemetrySource -> UdpListener -> Reconciler
    #[tokio::test]
    async fn test_mock_source_drives_bridge() {
        let mut bridge = TelemetryBridge::start(&bridge_config(0.0), 0.0).unwrap();
        let port = bridge.local_port().unwrap();

        let source = MockTelemetrySource::new(MockTelemetryConfig {
            target: SocketAddr::from(([127, 0, 0, 1], port)),
            frequency_hz: 200.0,
            max_samples: Some(20),
            ..Default::default()
        });
        let handle = source.start().await.unwrap();
        let sent = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("mock source timed out")
            .unwrap();
        assert_eq!(sent, 20);

        let mut received = 0;
        for _ in 0..100 {
            received += bridge.poll(0.0).datagrams;
            if received >= 20 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        assert_eq!(received, 20);
        assert_eq!(bridge.reconciler().stats().full_applied, 20);
        assert_eq!(bridge.transport().metrics().snapshot().datagrams_received, 20);

        // 恒定高度：z 偏移为 0
        let reference = bridge.reconciler().reference().unwrap();
        assert!((reference.z + MockTelemetryConfig::default().altitude_m).abs() < 1e-9);
        assert!(bridge.target().location.z.abs() < 1e-6);
    }

    /// 端口发现：驻留后换到空闲端口，收到数据后冻结
    #[tokio::test]
    async fn test_discovery_over_udp() {
        // 探测一个空闲端口作为唯一候选
        let candidate = {
            let socket = UdpSocket::bind("0.0.0.0:0").unwrap();
            socket.local_addr().unwrap().port()
        };

        let mut config = bridge_config(60.0);
        config.discovery.enabled = true;
        config.discovery.port_start = candidate;
        config.discovery.port_end = candidate;
        config.discovery.dwell_s = 0.05;
        config.discovery.timeout_s = 5.0;

        let mut bridge = TelemetryBridge::start(&config, 0.0).unwrap();
        assert!(bridge.discovery().unwrap().is_scanning());

        bridge.poll(0.05);
        assert_eq!(bridge.local_port(), Some(candidate));
        assert_eq!(bridge.transport().metrics().snapshot().rebinds, 1);

        send(&sender(), candidate, SCENARIO.as_bytes());
        let report = poll_until_data(&mut bridge, 0.06).await;
        assert_eq!(report.applied, 1);

        let report = bridge.poll(0.07);
        assert_eq!(report.discovery, Some(BoundReason::DataSeen));
        assert_eq!(bridge.local_port(), Some(candidate));
        assert_eq!(bridge.discovery().map(|d| d.bound_port()), Some(Some(candidate)));
    }

    /// 固定端口被占用且未启用发现时为启动失败
    #[tokio::test]
    async fn test_fixed_port_in_use_fails_startup() {
        let blocker = UdpSocket::bind("0.0.0.0:0").unwrap();
        let port = blocker.local_addr().unwrap().port();

        let mut config = bridge_config(60.0);
        config.listener.port = port;

        // 同一进程内 SO_REUSEADDR 可能允许重复绑定 UDP，两种结果都需合法
        match TelemetryBridge::start(&config, 0.0) {
            Err(reconciler::BridgeError::NoPortAvailable { port: p, .. }) => assert_eq!(p, port),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(bridge) => assert_eq!(bridge.local_port(), Some(port)),
        }
    }

    /// 配置文件 -> 桥接
    #[tokio::test]
    async fn test_config_text_to_bridge() {
        let config = ConfigLoader::load_from_str(
            r#"
[listener]
port = 0

[reconciler]
max_update_hz = 0.0
scale = 2.0
initial_placement = { x = 100.0, y = 0.0, z = 50.0 }
"#,
            ConfigFormat::Toml,
        )
        .unwrap();

        let mut bridge = TelemetryBridge::start(&config, 0.0).unwrap();
        let port = bridge.local_port().unwrap();
        let socket = sender();

        send(&socket, port, payload([0.0, 0.0, 0.0]).as_bytes());
        poll_until_data(&mut bridge, 0.0).await;
        send(&socket, port, payload([1.0, 1.0, -1.0]).as_bytes());
        let report = poll_until_data(&mut bridge, 0.1).await;

        // (1, 1, -1) m → (100, 100, 100) cm → ×2 → + placement
        assert!(report
            .target
            .location
            .equals(Vector3::new(300.0, 200.0, 250.0), 1e-9));
    }
}
