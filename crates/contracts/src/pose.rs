//! PoseSample / TargetPose - 位姿数据结构
//!
//! Payload Parser 输出 `PoseSample`，Reconciler 输出 `TargetPose`。

use std::ops::{Add, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

/// 3D 向量
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    /// 零向量
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn from_array(values: [f64; 3]) -> Self {
        Self::new(values[0], values[1], values[2])
    }

    pub fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    pub fn size_squared(self) -> f64 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    pub fn size(self) -> f64 {
        self.size_squared().sqrt()
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Component-wise comparison within `tolerance`
    pub fn equals(self, other: Self, tolerance: f64) -> bool {
        (self.x - other.x).abs() <= tolerance
            && (self.y - other.y).abs() <= tolerance
            && (self.z - other.z).abs() <= tolerance
    }
}

impl Add for Vector3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vector3 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vector3 {
    type Output = Self;

    fn mul(self, k: f64) -> Self {
        Self::new(self.x * k, self.y * k, self.z * k)
    }
}

impl Neg for Vector3 {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

/// 四元数，分量顺序 (x, y, z, w)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Quaternion {
    /// 单位四元数
    pub const IDENTITY: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    pub const fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }

    /// Build from wire order `[x, y, z, w]`
    pub fn from_array(values: [f64; 4]) -> Self {
        Self::new(values[0], values[1], values[2], values[3])
    }

    pub fn to_array(self) -> [f64; 4] {
        [self.x, self.y, self.z, self.w]
    }

    pub fn norm(self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w).sqrt()
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite() && self.w.is_finite()
    }

    /// 归一化；模长为零或非有限时返回 None
    pub fn normalized(self) -> Option<Self> {
        let norm = self.norm();
        if !norm.is_finite() || norm <= f64::EPSILON {
            return None;
        }
        Some(Self::new(
            self.x / norm,
            self.y / norm,
            self.z / norm,
            self.w / norm,
        ))
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// 位姿样本
///
/// 由一个数据报解析得到，构造后不可变，经 Transform 消费后即丢弃。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseSample {
    /// 源时钟时间戳 (仅供参考，不用于排序或去重)
    pub timestamp: u64,

    /// 位置 (NED, 米)
    pub position: Vector3,

    /// 姿态四元数 (NED)
    pub orientation: Quaternion,

    /// 速度 (NED, 米/秒)
    #[serde(default)]
    pub velocity: Option<Vector3>,

    /// 角速度 (rad/s)
    #[serde(default)]
    pub angular_velocity: Option<Vector3>,
}

impl PoseSample {
    pub fn new(timestamp: u64, position: Vector3, orientation: Quaternion) -> Self {
        Self {
            timestamp,
            position,
            orientation,
            velocity: None,
            angular_velocity: None,
        }
    }

    pub fn with_velocity(mut self, velocity: Vector3) -> Self {
        self.velocity = Some(velocity);
        self
    }

    pub fn with_angular_velocity(mut self, angular_velocity: Vector3) -> Self {
        self.angular_velocity = Some(angular_velocity);
        self
    }

    /// Velocity, or the zero vector when the payload carried none
    pub fn velocity_or_zero(&self) -> Vector3 {
        self.velocity.unwrap_or_default()
    }

    /// Angular velocity, or the zero vector when the payload carried none
    pub fn angular_velocity_or_zero(&self) -> Vector3 {
        self.angular_velocity.unwrap_or_default()
    }
}

/// 消费端旋转 (pitch, yaw, roll) 单位：度
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rotation {
    pub pitch: f64,
    pub yaw: f64,
    pub roll: f64,
}

impl Rotation {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(pitch: f64, yaw: f64, roll: f64) -> Self {
        Self { pitch, yaw, roll }
    }

    /// Keep only the heading component
    pub fn yaw_only(self) -> Self {
        Self::new(0.0, self.yaw, 0.0)
    }

    pub fn is_finite(self) -> bool {
        self.pitch.is_finite() && self.yaw.is_finite() && self.roll.is_finite()
    }
}

/// 目标位姿
///
/// Reconciler 维护的唯一"最新期望位姿"，原地覆盖，不排队、不保留历史。
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetPose {
    /// 位置 (消费端坐标系, 厘米)
    pub location: Vector3,

    /// 旋转 (消费端坐标系, 度)
    pub rotation: Rotation,
}

impl TargetPose {
    /// Startup default: the host's initial placement with a zero rotation
    pub fn at(location: Vector3) -> Self {
        Self {
            location,
            rotation: Rotation::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_arithmetic() {
        let a = Vector3::new(1.0, 2.0, 3.0);
        let b = Vector3::new(0.5, -1.0, 2.0);

        assert_eq!(a + b, Vector3::new(1.5, 1.0, 5.0));
        assert_eq!(a - b, Vector3::new(0.5, 3.0, 1.0));
        assert_eq!(a * 2.0, Vector3::new(2.0, 4.0, 6.0));
        assert_eq!(-a, Vector3::new(-1.0, -2.0, -3.0));
        assert!((a.size_squared() - 14.0).abs() < 1e-12);
    }

    #[test]
    fn test_vector_equals_tolerance() {
        let a = Vector3::new(100.0, 0.0, 0.0);
        assert!(a.equals(Vector3::new(100.5, 0.2, -0.9), 1.0));
        assert!(!a.equals(Vector3::new(101.5, 0.0, 0.0), 1.0));
    }

    #[test]
    fn test_quaternion_wire_order() {
        let q = Quaternion::from_array([0.1, 0.2, 0.3, 0.9]);
        assert_eq!(q.w, 0.9);
        assert_eq!(q.to_array(), [0.1, 0.2, 0.3, 0.9]);
        assert!((Quaternion::IDENTITY.norm() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_quaternion_normalized() {
        let q = Quaternion::new(0.0, 0.0, 0.0, 2.0).normalized().unwrap();
        assert_eq!(q, Quaternion::IDENTITY);
        assert!(Quaternion::new(0.0, 0.0, 0.0, 0.0).normalized().is_none());
        assert!(Quaternion::new(f64::NAN, 0.0, 0.0, 1.0).normalized().is_none());
    }

    #[test]
    fn test_optional_velocities_default_to_zero() {
        let sample = PoseSample::new(7, Vector3::ZERO, Quaternion::IDENTITY);
        assert_eq!(sample.velocity_or_zero(), Vector3::ZERO);

        let sample = sample.with_velocity(Vector3::new(1.0, 0.0, 0.0));
        assert_eq!(sample.velocity_or_zero().x, 1.0);
        assert_eq!(sample.angular_velocity, None);
    }

    #[test]
    fn test_target_pose_startup_default() {
        let pose = TargetPose::at(Vector3::new(10.0, 20.0, 30.0));
        assert_eq!(pose.location, Vector3::new(10.0, 20.0, 30.0));
        assert_eq!(pose.rotation, Rotation::ZERO);
    }
}
