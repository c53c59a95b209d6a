//! Rate-Decoupled Reconciler
//!
//! 决定每个到达的数据报是立即完整应用 (位置 + 旋转)，还是进入待处理槽
//! (只立即更新旋转，位置推迟到最小更新间隔之后)。

use bytes::Bytes;
use contracts::{PoseSample, ReconcilerConfig, TargetPose, Vector3};
use ingestion::{parse, parse_orientation_only, ParseError};
use tracing::{debug, trace};

use crate::slot::PendingSlot;
use crate::transform::{quaternion_to_consumer_rotation, to_consumer_frame, RotationMode};

/// 单个数据报的处理结果
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// 位置与旋转均已更新
    Applied,
    /// 限频窗口内：仅更新旋转，数据报进入待处理槽
    OrientationOnly,
    /// 待处理槽中的数据报被完整应用
    Drained,
    /// 解析失败，状态未变
    Discarded(ParseError),
}

/// Reconciler 统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcilerStats {
    pub full_applied: u64,
    pub orientation_applied: u64,
    pub drained: u64,
    pub parse_failures: u64,
    pub pending_overwrites: u64,
}

/// 限频解耦的位姿协调器
#[derive(Debug)]
pub struct Reconciler {
    config: ReconcilerConfig,
    /// 首个样本的位置，只写一次
    reference: Option<Vector3>,
    target: TargetPose,
    pending: PendingSlot,
    last_accepted: Option<f64>,
    stats: ReconcilerStats,
}

impl Reconciler {
    /// 创建；首个样本到达前目标位姿为初始放置点、零旋转
    pub fn new(config: ReconcilerConfig) -> Self {
        let target = TargetPose::at(config.initial_placement);
        Self {
            config,
            reference: None,
            target,
            pending: PendingSlot::new(),
            last_accepted: None,
            stats: ReconcilerStats::default(),
        }
    }

    /// 处理一个到达的数据报
    ///
    /// `now` 为宿主到达时间 (秒)；载荷内的 timestamp 不参与限频。
    pub fn on_datagram(&mut self, raw: Bytes, now: f64) -> Outcome {
        if self.reference.is_none() {
            // 首个样本永远完整处理，不受限频影响
            return match parse(&raw) {
                Ok(sample) => {
                    self.reference = Some(sample.position);
                    debug!(reference = ?sample.position, "reference position latched");
                    self.apply_full(sample, now);
                    self.stats.full_applied += 1;
                    metrics::counter!("drone_bridge_samples_applied_total", "kind" => "full")
                        .increment(1);
                    Outcome::Applied
                }
                Err(e) => self.discard(e, "full"),
            };
        }

        if self.is_throttled(now) {
            return match parse_orientation_only(&raw) {
                Ok(q) => {
                    if self.pending.replace(raw).is_some() {
                        self.stats.pending_overwrites += 1;
                        metrics::counter!("drone_bridge_pending_overwrites_total").increment(1);
                    }
                    self.target.rotation = quaternion_to_consumer_rotation(q, RotationMode::Full);
                    self.stats.orientation_applied += 1;
                    metrics::counter!("drone_bridge_samples_applied_total", "kind" => "orientation")
                        .increment(1);
                    trace!(rotation = ?self.target.rotation, "orientation updated, position deferred");
                    Outcome::OrientationOnly
                }
                Err(e) => self.discard(e, "orientation"),
            };
        }

        match parse(&raw) {
            Ok(sample) => {
                self.apply_full(sample, now);
                self.stats.full_applied += 1;
                metrics::counter!("drone_bridge_samples_applied_total", "kind" => "full")
                    .increment(1);
                Outcome::Applied
            }
            Err(e) => self.discard(e, "full"),
        }
    }

    /// 释放待处理槽
    ///
    /// 每个周期调用一次；槽非空且已过最小更新间隔时完整应用。
    /// 解析失败时槽同样被清空。
    pub fn drain_pending(&mut self, now: f64) -> Option<Outcome> {
        if !self.pending.is_occupied() || self.is_throttled(now) {
            return None;
        }

        let raw = self.pending.take()?;
        let outcome = match parse(&raw) {
            Ok(sample) => {
                self.apply_full(sample, now);
                self.stats.drained += 1;
                metrics::counter!("drone_bridge_samples_applied_total", "kind" => "drained")
                    .increment(1);
                Outcome::Drained
            }
            Err(e) => self.discard(e, "full"),
        };
        Some(outcome)
    }

    fn is_throttled(&self, now: f64) -> bool {
        match (self.config.min_update_interval(), self.last_accepted) {
            (Some(interval), Some(last)) => now - last < interval,
            _ => false,
        }
    }

    fn apply_full(&mut self, sample: PoseSample, now: f64) {
        let reference = self.reference.unwrap_or(sample.position);
        let offset = to_consumer_frame(sample.position - reference, self.config.scale);

        self.target = TargetPose {
            location: self.config.initial_placement + offset,
            rotation: quaternion_to_consumer_rotation(sample.orientation, RotationMode::Full),
        };
        self.last_accepted = Some(now);
        self.pending.clear();

        trace!(
            location = ?self.target.location,
            rotation = ?self.target.rotation,
            now,
            "target pose updated"
        );
    }

    fn discard(&mut self, error: ParseError, stage: &'static str) -> Outcome {
        self.stats.parse_failures += 1;
        metrics::counter!("drone_bridge_parse_failures_total", "stage" => stage).increment(1);
        debug!(stage, error = %error, "datagram discarded");
        Outcome::Discarded(error)
    }

    /// 当前目标位姿
    pub fn target(&self) -> TargetPose {
        self.target
    }

    /// 参考位置 (NED, 米)
    pub fn reference(&self) -> Option<Vector3> {
        self.reference
    }

    /// 是否收到过有效样本
    pub fn has_data(&self) -> bool {
        self.reference.is_some()
    }

    pub fn pending(&self) -> &PendingSlot {
        &self.pending
    }

    pub fn last_accepted(&self) -> Option<f64> {
        self.last_accepted
    }

    pub fn stats(&self) -> ReconcilerStats {
        self.stats
    }

    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }
}
