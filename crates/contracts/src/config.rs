//! BridgeConfig - Config Loader 输出
//!
//! 宿主提供给核心的全部配置：监听端口、端口发现、限频、坐标缩放、初始位置。

use serde::{Deserialize, Serialize};

use crate::Vector3;

/// 最大 UDP 载荷 (IPv4)
pub const MAX_DATAGRAM_SIZE: usize = 65507;

/// 完整的桥接配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// 监听配置
    #[serde(default)]
    pub listener: ListenerConfig,

    /// 端口发现配置
    #[serde(default)]
    pub discovery: DiscoveryConfig,

    /// 限频与坐标配置
    #[serde(default)]
    pub reconciler: ReconcilerConfig,

    /// 宿主端平滑配置
    #[serde(default)]
    pub consumer: ConsumerConfig,
}

/// Transport Listener configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListenerConfig {
    /// UDP listen port (0 = ephemeral)
    #[serde(default = "default_listen_port")]
    pub port: u16,

    /// Requested kernel receive buffer in bytes
    #[serde(default = "default_receive_buffer_size")]
    pub receive_buffer_size: usize,

    /// Upper bound on datagrams drained by a single poll
    #[serde(default = "default_max_datagrams_per_poll")]
    pub max_datagrams_per_poll: usize,
}

fn default_listen_port() -> u16 {
    8888
}

fn default_receive_buffer_size() -> usize {
    2 * 1024 * 1024
}

fn default_max_datagrams_per_poll() -> usize {
    4096
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            port: default_listen_port(),
            receive_buffer_size: default_receive_buffer_size(),
            max_datagrams_per_poll: default_max_datagrams_per_poll(),
        }
    }
}

/// Port discovery configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Scan the port range instead of trusting `listener.port`
    #[serde(default)]
    pub enabled: bool,

    /// First candidate port (inclusive)
    #[serde(default = "default_port_start")]
    pub port_start: u16,

    /// Last candidate port (inclusive)
    #[serde(default = "default_port_end")]
    pub port_end: u16,

    /// Time spent on each candidate before advancing (seconds)
    #[serde(default = "default_dwell_s")]
    pub dwell_s: f64,

    /// Whole-scan timeout (seconds)
    #[serde(default = "default_timeout_s")]
    pub timeout_s: f64,
}

fn default_port_start() -> u16 {
    7000
}

fn default_port_end() -> u16 {
    9000
}

fn default_dwell_s() -> f64 {
    0.5
}

fn default_timeout_s() -> f64 {
    10.0
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port_start: default_port_start(),
            port_end: default_port_end(),
            dwell_s: default_dwell_s(),
            timeout_s: default_timeout_s(),
        }
    }
}

/// Rate-decoupled reconciler configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconcilerConfig {
    /// Maximum full-update frequency in Hz (0 = unlimited)
    #[serde(default = "default_max_update_hz")]
    pub max_update_hz: f64,

    /// Uniform scale applied after the meters→centimeters conversion
    #[serde(default = "default_scale")]
    pub scale: f64,

    /// Consumer placement that the reference position maps onto
    #[serde(default)]
    pub initial_placement: Vector3,
}

fn default_max_update_hz() -> f64 {
    60.0
}

fn default_scale() -> f64 {
    1.0
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            max_update_hz: default_max_update_hz(),
            scale: default_scale(),
            initial_placement: Vector3::ZERO,
        }
    }
}

impl ReconcilerConfig {
    /// Minimum interval between full updates, `None` when unlimited
    pub fn min_update_interval(&self) -> Option<f64> {
        (self.max_update_hz > 0.0).then(|| 1.0 / self.max_update_hz)
    }
}

/// 宿主端朝向模式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacingMode {
    /// Chase the rotation reported by telemetry
    #[default]
    Telemetry,
    /// Face the direction of motion (yaw only)
    Direction,
}

/// Host-side smoothing configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumerConfig {
    /// Poll cadence in Hz
    #[serde(default = "default_tick_hz")]
    pub tick_hz: f64,

    /// Location interpolation speed (0 = snap)
    #[serde(default = "default_smooth_speed")]
    pub smooth_speed: f64,

    /// Facing mode
    #[serde(default)]
    pub facing: FacingMode,

    /// Rotation interpolation speed (0 = snap)
    #[serde(default = "default_face_speed")]
    pub face_speed: f64,
}

fn default_tick_hz() -> f64 {
    60.0
}

fn default_smooth_speed() -> f64 {
    5.0
}

fn default_face_speed() -> f64 {
    10.0
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            tick_hz: default_tick_hz(),
            smooth_speed: default_smooth_speed(),
            facing: FacingMode::default(),
            face_speed: default_face_speed(),
        }
    }
}
