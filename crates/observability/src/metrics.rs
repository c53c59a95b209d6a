//! Telemetry Bridge 指标收集模块
//!
//! 基于 CycleReport 收集和统计轮询周期的运行指标。

use contracts::{BoundReason, CycleReport, TargetPose};
use metrics::{counter, gauge, histogram};

/// 从 CycleReport 记录指标
///
/// 每个 poll 周期调用一次。
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_cycle_metrics;
///
/// let report = bridge.poll(now);
/// record_cycle_metrics(&report);
/// ```
pub fn record_cycle_metrics(report: &CycleReport) {
    counter!("drone_bridge_poll_cycles_total").increment(1);
    histogram!("drone_bridge_datagrams_per_cycle").record(report.datagrams as f64);

    if report.discarded > 0 {
        counter!("drone_bridge_cycle_discards_total").increment(report.discarded as u64);
    }

    if let Some(reason) = report.discovery {
        record_discovery_finished(reason);
    }

    record_target_pose(&report.target);
}

/// 记录目标位姿
pub fn record_target_pose(target: &TargetPose) {
    gauge!("drone_bridge_target_location_cm", "axis" => "x").set(target.location.x);
    gauge!("drone_bridge_target_location_cm", "axis" => "y").set(target.location.y);
    gauge!("drone_bridge_target_location_cm", "axis" => "z").set(target.location.z);

    gauge!("drone_bridge_target_rotation_deg", "axis" => "pitch").set(target.rotation.pitch);
    gauge!("drone_bridge_target_rotation_deg", "axis" => "yaw").set(target.rotation.yaw);
    gauge!("drone_bridge_target_rotation_deg", "axis" => "roll").set(target.rotation.roll);
}

/// 记录端口发现结束
pub fn record_discovery_finished(reason: BoundReason) {
    counter!(
        "drone_bridge_discovery_finished_total",
        "reason" => reason_label(reason)
    )
    .increment(1);
}

fn reason_label(reason: BoundReason) -> &'static str {
    match reason {
        BoundReason::DataSeen => "data_seen",
        BoundReason::TimedOut => "timed_out",
        BoundReason::RangeExhausted => "range_exhausted",
    }
}

/// 轮询指标聚合器
///
/// 在内存中聚合指标，便于统计和输出摘要。
#[derive(Debug, Clone, Default)]
pub struct BridgeMetricsAggregator {
    /// 总周期数
    pub total_cycles: u64,

    /// 数据报总数
    pub total_datagrams: u64,

    /// 完整应用数 (含待处理槽释放)
    pub total_applied: u64,

    /// 仅旋转更新数
    pub total_orientation_only: u64,

    /// 解析失败数
    pub total_discarded: u64,

    /// 端口发现结果
    pub discovery: Option<BoundReason>,

    /// 收到首个数据报的时间 (秒)
    pub first_data_at: Option<f64>,

    /// 相邻有数据周期的间隔统计 (毫秒)
    pub interarrival_stats: RunningStats,

    /// 每周期数据报数统计
    pub batch_stats: RunningStats,

    last_data_at: Option<f64>,
}

impl BridgeMetricsAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    /// 更新聚合统计
    pub fn update(&mut self, report: &CycleReport) {
        self.total_cycles += 1;
        self.total_datagrams += report.datagrams as u64;
        self.total_applied += report.applied as u64 + u64::from(report.drained);
        self.total_orientation_only += report.orientation_only as u64;
        self.total_discarded += report.discarded as u64;

        if report.discovery.is_some() {
            self.discovery = report.discovery;
        }

        if report.datagrams > 0 {
            self.batch_stats.push(report.datagrams as f64);
            self.first_data_at.get_or_insert(report.now);

            if let Some(last) = self.last_data_at {
                self.interarrival_stats.push((report.now - last) * 1000.0);
            }
            self.last_data_at = Some(report.now);
        }
    }

    /// 生成摘要报告
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_cycles: self.total_cycles,
            total_datagrams: self.total_datagrams,
            total_applied: self.total_applied,
            total_orientation_only: self.total_orientation_only,
            total_discarded: self.total_discarded,
            discard_rate: if self.total_datagrams > 0 {
                self.total_discarded as f64 / self.total_datagrams as f64 * 100.0
            } else {
                0.0
            },
            discovery: self.discovery,
            first_data_at: self.first_data_at,
            interarrival_ms: StatsSummary::from(&self.interarrival_stats),
            datagrams_per_batch: StatsSummary::from(&self.batch_stats),
        }
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 指标摘要
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_cycles: u64,
    pub total_datagrams: u64,
    pub total_applied: u64,
    pub total_orientation_only: u64,
    pub total_discarded: u64,
    pub discard_rate: f64,
    pub discovery: Option<BoundReason>,
    pub first_data_at: Option<f64>,
    pub interarrival_ms: StatsSummary,
    pub datagrams_per_batch: StatsSummary,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Telemetry Bridge Summary ===")?;
        writeln!(f, "Poll cycles: {}", self.total_cycles)?;
        writeln!(f, "Datagrams: {}", self.total_datagrams)?;
        writeln!(f, "Full updates: {}", self.total_applied)?;
        writeln!(f, "Orientation-only updates: {}", self.total_orientation_only)?;
        writeln!(
            f,
            "Parse failures: {} ({:.2}%)",
            self.total_discarded, self.discard_rate
        )?;

        match self.first_data_at {
            Some(t) => writeln!(f, "First data at: {t:.3}s")?,
            None => writeln!(f, "First data at: never")?,
        }
        if let Some(reason) = self.discovery {
            writeln!(f, "Port discovery: {}", reason_label(reason))?;
        }

        writeln!(f, "Inter-arrival (ms): {}", self.interarrival_ms)?;
        writeln!(f, "Datagrams per batch: {}", self.datagrams_per_batch)?;

        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    /// 样本数量
    pub fn count(&self) -> u64 {
        self.count
    }

    /// 均值
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// 标准差
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// 最小值
    pub fn min(&self) -> f64 {
        self.min
    }

    /// 最大值
    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::Vector3;

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();

        for value in [1.0, 2.0, 3.0, 4.0, 5.0] {
            stats.push(value);
        }

        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 3.0).abs() < 1e-10);
        assert!((stats.min() - 1.0).abs() < 1e-10);
        assert!((stats.max() - 5.0).abs() < 1e-10);
        assert!((stats.variance() - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_aggregator_update() {
        let mut aggregator = BridgeMetricsAggregator::new();

        aggregator.update(&CycleReport {
            now: 0.0,
            ..Default::default()
        });
        aggregator.update(&CycleReport {
            now: 0.1,
            datagrams: 3,
            applied: 1,
            orientation_only: 1,
            discarded: 1,
            discovery: Some(BoundReason::DataSeen),
            ..Default::default()
        });
        aggregator.update(&CycleReport {
            now: 0.15,
            datagrams: 1,
            drained: true,
            orientation_only: 1,
            target: TargetPose::at(Vector3::new(1.0, 2.0, 3.0)),
            ..Default::default()
        });

        assert_eq!(aggregator.total_cycles, 3);
        assert_eq!(aggregator.total_datagrams, 4);
        assert_eq!(aggregator.total_applied, 2);
        assert_eq!(aggregator.total_orientation_only, 2);
        assert_eq!(aggregator.total_discarded, 1);
        assert_eq!(aggregator.first_data_at, Some(0.1));
        assert_eq!(aggregator.discovery, Some(BoundReason::DataSeen));
        assert_eq!(aggregator.interarrival_stats.count(), 1);
        assert!((aggregator.interarrival_stats.mean() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_summary_display() {
        let summary = MetricsSummary {
            total_cycles: 100,
            total_datagrams: 40,
            total_applied: 30,
            total_orientation_only: 8,
            total_discarded: 2,
            discard_rate: 5.0,
            discovery: Some(BoundReason::TimedOut),
            first_data_at: Some(1.25),
            interarrival_ms: StatsSummary {
                count: 39,
                min: 20.0,
                max: 80.0,
                mean: 50.0,
                std_dev: 15.0,
            },
            datagrams_per_batch: StatsSummary::default(),
        };

        let output = format!("{}", summary);
        assert!(output.contains("Poll cycles: 100"));
        assert!(output.contains("5.00%"));
        assert!(output.contains("Port discovery: timed_out"));
        assert!(output.contains("Datagrams per batch: N/A"));
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        // 未安装 recorder 时宏调用为空操作
        record_cycle_metrics(&CycleReport {
            discovery: Some(BoundReason::RangeExhausted),
            discarded: 2,
            ..Default::default()
        });
    }
}
