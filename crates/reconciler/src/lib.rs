//! # Reconciler
//!
//! 遥测位姿协调模块。
//!
//! 负责：
//! - NED → 消费端坐标转换
//! - 限频解耦：位置按最小间隔更新，旋转始终实时
//! - 单槽待处理缓冲 (最新覆盖)
//! - 轮询周期编排 (`TelemetryBridge`)
//! - 消费端平滑 (`PoseFollower`)
//!
//! ## 使用示例
//!
//! ```ignore
//! use reconciler::{PoseFollower, TelemetryBridge};
//!
//! let mut bridge = TelemetryBridge::start(&config, 0.0)?;
//! let mut follower = PoseFollower::new(config.consumer.clone(), bridge.target());
//!
//! // 每帧
//! let report = bridge.poll(now);
//! let pose = follower.tick(&report.target, dt);
//! ```

mod bridge;
mod engine;
mod error;
mod slot;
mod smoothing;
mod transform;

// Re-exports
pub use bridge::TelemetryBridge;
pub use engine::{Outcome, Reconciler, ReconcilerStats};
pub use error::BridgeError;
pub use slot::PendingSlot;
pub use smoothing::{interp_rotation_to, interp_vector_to, rotation_from_direction, PoseFollower};
pub use transform::{
    normalize_axis, quaternion_to_consumer_rotation, to_consumer_frame, RotationMode,
    METERS_TO_CENTIMETERS,
};

// Re-export contracts types
pub use contracts::{CycleReport, ReconcilerConfig, Rotation, TargetPose};
