//! CycleReport - 轮询周期输出
//!
//! TelemetryBridge 每个 poll 周期产生一个，供宿主与 observability 使用。

use serde::{Deserialize, Serialize};

use crate::TargetPose;

/// 端口发现冻结原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundReason {
    /// 当前端口收到了数据报
    DataSeen,
    /// 扫描总时长超过 timeout
    TimedOut,
    /// 候选端口超出范围
    RangeExhausted,
}

/// 单个 poll 周期的结果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CycleReport {
    /// 宿主时间 (秒)
    pub now: f64,
    /// 本周期排空的数据报数
    pub datagrams: usize,
    /// 完整应用数
    pub applied: usize,
    /// 仅更新旋转数
    pub orientation_only: usize,
    /// 解析失败数
    pub discarded: usize,
    /// 待处理槽是否在本周期被释放
    pub drained: bool,
    /// 端口发现在本周期结束
    pub discovery: Option<BoundReason>,
    /// 本周期结束时的目标位姿
    pub target: TargetPose,
}
