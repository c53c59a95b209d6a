//! 消费端平滑
//!
//! 宿主每帧调用 `PoseFollower::tick`，以指数方式追赶 Reconciler 的目标位姿。

use contracts::{ConsumerConfig, FacingMode, Rotation, TargetPose, Vector3};

use crate::transform::normalize_axis;

/// 小于该距离平方时直接到达
const SNAP_DISTANCE_SQUARED: f64 = 1e-8;

/// 朝向运动方向所需的最小单帧位移平方 (cm²)
const MIN_FACING_MOVE_SQUARED: f64 = 1.0;

/// 向量插值
///
/// 每帧前进 `clamp(dt·speed, 0, 1)` 比例的剩余距离；`speed <= 0` 直接到达。
pub fn interp_vector_to(current: Vector3, target: Vector3, dt: f64, speed: f64) -> Vector3 {
    if speed <= 0.0 {
        return target;
    }

    let dist = target - current;
    if dist.size_squared() < SNAP_DISTANCE_SQUARED {
        return target;
    }

    current + dist * (dt * speed).clamp(0.0, 1.0)
}

/// 旋转插值，逐轴走最短路径
pub fn interp_rotation_to(current: Rotation, target: Rotation, dt: f64, speed: f64) -> Rotation {
    if speed <= 0.0 {
        return target;
    }

    let delta = Rotation::new(
        normalize_axis(target.pitch - current.pitch),
        normalize_axis(target.yaw - current.yaw),
        normalize_axis(target.roll - current.roll),
    );
    if delta.pitch.abs() < 1e-6 && delta.yaw.abs() < 1e-6 && delta.roll.abs() < 1e-6 {
        return target;
    }

    let alpha = (dt * speed).clamp(0.0, 1.0);
    Rotation::new(
        normalize_axis(current.pitch + delta.pitch * alpha),
        normalize_axis(current.yaw + delta.yaw * alpha),
        normalize_axis(current.roll + delta.roll * alpha),
    )
}

/// 以方向向量的 X 轴构造旋转 (roll 为 0)
pub fn rotation_from_direction(direction: Vector3) -> Rotation {
    let yaw = direction.y.atan2(direction.x).to_degrees();
    let horizontal = (direction.x * direction.x + direction.y * direction.y).sqrt();
    let pitch = direction.z.atan2(horizontal).to_degrees();
    Rotation::new(pitch, yaw, 0.0)
}

/// 目标位姿追随器
#[derive(Debug, Clone)]
pub struct PoseFollower {
    config: ConsumerConfig,
    current: TargetPose,
}

impl PoseFollower {
    pub fn new(config: ConsumerConfig, initial: TargetPose) -> Self {
        Self {
            config,
            current: initial,
        }
    }

    /// 推进一帧，返回新的当前位姿
    pub fn tick(&mut self, target: &TargetPose, dt: f64) -> TargetPose {
        let previous = self.current.location;
        let location = interp_vector_to(previous, target.location, dt, self.config.smooth_speed);

        let rotation = match self.config.facing {
            FacingMode::Telemetry => {
                interp_rotation_to(self.current.rotation, target.rotation, dt, self.config.face_speed)
            }
            FacingMode::Direction => {
                let moved = location - previous;
                if moved.size_squared() > MIN_FACING_MOVE_SQUARED {
                    let facing = rotation_from_direction(moved);
                    interp_rotation_to(self.current.rotation, facing, dt, self.config.face_speed)
                        .yaw_only()
                } else {
                    self.current.rotation
                }
            }
        };

        self.current = TargetPose { location, rotation };
        self.current
    }

    pub fn current(&self) -> TargetPose {
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn follower(facing: FacingMode) -> PoseFollower {
        PoseFollower::new(
            ConsumerConfig {
                tick_hz: 60.0,
                smooth_speed: 5.0,
                facing,
                face_speed: 10.0,
            },
            TargetPose::at(Vector3::ZERO),
        )
    }

    #[test]
    fn test_interp_vector_partial_step() {
        let out = interp_vector_to(Vector3::ZERO, Vector3::new(100.0, 0.0, 0.0), 0.1, 5.0);
        assert!(out.equals(Vector3::new(50.0, 0.0, 0.0), 1e-9));
    }

    #[test]
    fn test_interp_vector_never_overshoots() {
        let target = Vector3::new(10.0, -10.0, 5.0);
        let out = interp_vector_to(Vector3::ZERO, target, 1.0, 50.0);
        assert_eq!(out, target);
    }

    #[test]
    fn test_zero_speed_snaps() {
        let target = Vector3::new(1.0, 2.0, 3.0);
        assert_eq!(interp_vector_to(Vector3::ZERO, target, 0.016, 0.0), target);

        let rot = Rotation::new(10.0, 20.0, 30.0);
        assert_eq!(interp_rotation_to(Rotation::ZERO, rot, 0.016, 0.0), rot);
    }

    #[test]
    fn test_rotation_takes_shortest_path() {
        let current = Rotation::new(0.0, 170.0, 0.0);
        let target = Rotation::new(0.0, -170.0, 0.0);
        let out = interp_rotation_to(current, target, 0.05, 10.0);
        // 经过 180 而不是回绕 340°
        assert!((out.yaw - 180.0).abs() < 1e-9, "got {}", out.yaw);
    }

    #[test]
    fn test_rotation_from_direction() {
        let rot = rotation_from_direction(Vector3::new(0.0, 10.0, 0.0));
        assert!((rot.yaw - 90.0).abs() < 1e-9);
        assert_eq!(rot.roll, 0.0);

        let climb = rotation_from_direction(Vector3::new(1.0, 0.0, 1.0));
        assert!((climb.pitch - 45.0).abs() < 1e-9);
    }

    #[test]
    fn test_follower_converges() {
        let mut follower = follower(FacingMode::Telemetry);
        let target = TargetPose {
            location: Vector3::new(500.0, 0.0, 100.0),
            rotation: Rotation::new(0.0, 45.0, 0.0),
        };

        for _ in 0..600 {
            follower.tick(&target, 1.0 / 60.0);
        }

        let current = follower.current();
        assert!(current.location.equals(target.location, 1e-3));
        assert!((current.rotation.yaw - 45.0).abs() < 1e-3);
    }

    #[test]
    fn test_direction_facing_is_yaw_only() {
        let mut follower = follower(FacingMode::Direction);
        let target = TargetPose {
            location: Vector3::new(0.0, 1000.0, 500.0),
            rotation: Rotation::new(0.0, -90.0, 0.0),
        };

        for _ in 0..120 {
            follower.tick(&target, 1.0 / 60.0);
        }

        let rotation = follower.current().rotation;
        assert_eq!(rotation.pitch, 0.0);
        assert_eq!(rotation.roll, 0.0);
        // 朝向运动方向 (+Y)，忽略遥测旋转
        assert!(rotation.yaw > 45.0, "got {}", rotation.yaw);
    }

    #[test]
    fn test_direction_facing_holds_when_still() {
        let mut follower = follower(FacingMode::Direction);
        let target = TargetPose {
            location: Vector3::new(0.5, 0.0, 0.0),
            rotation: Rotation::new(0.0, 90.0, 0.0),
        };
        follower.tick(&target, 1.0 / 60.0);
        assert_eq!(follower.current().rotation, Rotation::ZERO);
    }
}
