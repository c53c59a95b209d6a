//! Coordinate Transform
//!
//! NED (北-东-地, 米) → 消费端 Forward-Right-Up (厘米)。
//! 纯函数，无内部状态。

use std::f64::consts::PI;

use contracts::{Quaternion, Rotation, Vector3};
use nalgebra::{UnitQuaternion, Vector3 as NaVector3};

/// 米 → 厘米
pub const METERS_TO_CENTIMETERS: f64 = 100.0;

/// 旋转输出模式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RotationMode {
    /// pitch / yaw / roll 全部保留
    #[default]
    Full,
    /// 仅保留 yaw
    YawOnly,
}

/// 相对位置 (NED, 米) 转消费端坐标
///
/// x = north·100, y = east·100, z = −down·100，再整体乘以 `scale`。
pub fn to_consumer_frame(relative: Vector3, scale: f64) -> Vector3 {
    Vector3::new(
        relative.x * METERS_TO_CENTIMETERS,
        relative.y * METERS_TO_CENTIMETERS,
        -relative.z * METERS_TO_CENTIMETERS,
    ) * scale
}

/// 绕 forward/north 轴 180° 的翻转
fn down_to_up_flip() -> UnitQuaternion<f64> {
    UnitQuaternion::from_axis_angle(&NaVector3::x_axis(), PI)
}

/// 四元数 (NED) 转消费端旋转 (度)
///
/// 先左乘绕 forward 轴 180° 的翻转 (Down → Up)，并在机体侧施加同一翻转，
/// 使水平姿态对应零 pitch / roll。结果为 Forward-Left-Up 右手系欧拉角，
/// 再换算到 Forward-Right-Up：yaw 朝右为正，pitch 抬头为正。
pub fn quaternion_to_consumer_rotation(q: Quaternion, mode: RotationMode) -> Rotation {
    let Some(q) = q.normalized() else {
        return Rotation::ZERO;
    };

    let source = UnitQuaternion::from_quaternion(nalgebra::Quaternion::new(q.w, q.x, q.y, q.z));
    let flip = down_to_up_flip();
    let up_frame = flip * source * flip.inverse();

    let (roll, pitch, yaw) = up_frame.euler_angles();
    let rotation = Rotation::new(
        normalize_axis(-pitch.to_degrees()),
        normalize_axis(-yaw.to_degrees()),
        normalize_axis(roll.to_degrees()),
    );

    match mode {
        RotationMode::Full => rotation,
        RotationMode::YawOnly => rotation.yaw_only(),
    }
}

/// 角度归一化到 (-180, 180]
pub fn normalize_axis(degrees: f64) -> f64 {
    let wrapped = degrees % 360.0;
    if wrapped > 180.0 {
        wrapped - 360.0
    } else if wrapped <= -180.0 {
        wrapped + 360.0
    } else {
        wrapped
    }
}
