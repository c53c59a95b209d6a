//! Payload Parser
//!
//! 遥测载荷是按行组织的类 YAML 文本，字段归属由出现顺序决定：
//!
//! ```text
//! timestamp: 1000
//! position:
//! - 10.0
//! - 0.0
//! - -2.0
//! q:
//! - 0.0
//! - 0.0
//! - 0.0
//! - 1.0
//! velocity:
//! - ...
//! ```
//!
//! 前 3 个列表项归 position；position 填满后，`q:` 之后的 4 项归四元数；
//! 之后 `velocity:` / `angular_velocity:` 依次可选。
//! 列表项不按键名归属，只按当前打开的块归属。

use std::fmt::Write as _;

use contracts::{PoseSample, Quaternion, Vector3};
use tracing::trace;

use crate::error::ParseError;

/// 行状态机
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    SeekingPosition,
    SeekingQuaternion,
    SeekingVelocity,
    SeekingAngularVelocity,
    Done,
}

/// 单行分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Line<'a> {
    /// `- value`
    Item(&'a str),
    /// `key: value` 或 `key:`
    Key(&'a str, &'a str),
    Other,
}

fn classify(line: &str) -> Line<'_> {
    let line = line.trim();

    if let Some(rest) = line.strip_prefix('-') {
        if rest.is_empty() || rest.starts_with(char::is_whitespace) {
            return Line::Item(rest.trim());
        }
    }

    match line.split_once(':') {
        Some((key, value)) => Line::Key(key.trim(), value.trim()),
        None => Line::Other,
    }
}

/// 固定长度的数值块累加器
#[derive(Debug)]
struct Block<const N: usize> {
    values: [f64; N],
    len: usize,
}

impl<const N: usize> Default for Block<N> {
    fn default() -> Self {
        Self {
            values: [0.0; N],
            len: 0,
        }
    }
}

impl<const N: usize> Block<N> {
    fn push(&mut self, value: f64) {
        if self.len < N {
            self.values[self.len] = value;
            self.len += 1;
        }
    }

    fn is_full(&self) -> bool {
        self.len == N
    }
}

fn parse_number(text: &str) -> Option<f64> {
    text.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn required_number(text: &str, line: usize) -> Result<f64, ParseError> {
    parse_number(text).ok_or_else(|| ParseError::InvalidNumber {
        line,
        value: text.to_string(),
    })
}

fn decode_text(bytes: &[u8]) -> Result<std::borrow::Cow<'_, str>, ParseError> {
    let text = String::from_utf8_lossy(bytes);
    if text.trim().is_empty() {
        return Err(ParseError::Empty);
    }
    Ok(text)
}

fn unit_quaternion(block: &Block<4>) -> Result<Quaternion, ParseError> {
    Quaternion::from_array(block.values)
        .normalized()
        .ok_or(ParseError::DegenerateQuaternion)
}

/// 解析完整位姿样本
///
/// 要求恰好凑齐 3 个位置分量与 4 个四元数分量；velocity / angular_velocity
/// 缺失或残缺时为 `None`。多余的列表项被忽略。
pub fn parse(bytes: &[u8]) -> Result<PoseSample, ParseError> {
    let text = decode_text(bytes)?;

    let mut stage = Stage::SeekingPosition;
    let mut timestamp = 0u64;
    let mut position = Block::<3>::default();
    let mut quaternion = Block::<4>::default();
    let mut velocity = Block::<3>::default();
    let mut angular_velocity = Block::<3>::default();
    let mut velocity_ok = false;
    let mut angular_ok = false;

    // 当前块的标记是否已出现 (position 不需要标记)
    let mut block_open = false;

    for (index, raw_line) in text.lines().enumerate() {
        let line_no = index + 1;

        match classify(raw_line) {
            Line::Key(key, value) => {
                match (key, stage) {
                    ("timestamp", _) => {
                        timestamp = value.parse().unwrap_or(0);
                    }
                    ("q", Stage::SeekingQuaternion)
                    | ("velocity", Stage::SeekingVelocity)
                    | ("angular_velocity", Stage::SeekingAngularVelocity) => {
                        block_open = true;
                    }
                    (_, Stage::SeekingVelocity | Stage::SeekingAngularVelocity) if block_open => {
                        // 可选块被其他键打断，视为残缺
                        trace!(line = line_no, key, "optional block interrupted");
                        stage = Stage::Done;
                    }
                    _ => {}
                }
            }
            Line::Item(item) => match stage {
                Stage::SeekingPosition => {
                    position.push(required_number(item, line_no)?);
                    if position.is_full() {
                        stage = Stage::SeekingQuaternion;
                        block_open = false;
                    }
                }
                Stage::SeekingQuaternion if block_open => {
                    quaternion.push(required_number(item, line_no)?);
                    if quaternion.is_full() {
                        stage = Stage::SeekingVelocity;
                        block_open = false;
                    }
                }
                Stage::SeekingVelocity if block_open => match parse_number(item) {
                    Some(value) => {
                        velocity.push(value);
                        if velocity.is_full() {
                            velocity_ok = true;
                            stage = Stage::SeekingAngularVelocity;
                            block_open = false;
                        }
                    }
                    None => stage = Stage::Done,
                },
                Stage::SeekingAngularVelocity if block_open => match parse_number(item) {
                    Some(value) => {
                        angular_velocity.push(value);
                        if angular_velocity.is_full() {
                            angular_ok = true;
                            stage = Stage::Done;
                        }
                    }
                    None => stage = Stage::Done,
                },
                _ => {}
            },
            Line::Other => {}
        }

        if stage == Stage::Done {
            break;
        }
    }

    if !position.is_full() {
        return Err(ParseError::MissingPosition {
            found: position.len,
        });
    }
    if !quaternion.is_full() {
        return Err(ParseError::MissingQuaternion {
            found: quaternion.len,
        });
    }

    let mut sample = PoseSample::new(
        timestamp,
        Vector3::from_array(position.values),
        unit_quaternion(&quaternion)?,
    );
    if velocity_ok {
        sample = sample.with_velocity(Vector3::from_array(velocity.values));
    }
    if angular_ok {
        sample = sample.with_angular_velocity(Vector3::from_array(angular_velocity.values));
    }

    Ok(sample)
}

/// 仅提取姿态
///
/// 只寻找 `q:` 及其后的 4 个列表项，忽略其余内容。限频期间使用。
pub fn parse_orientation_only(bytes: &[u8]) -> Result<Quaternion, ParseError> {
    let text = decode_text(bytes)?;

    let mut quaternion = Block::<4>::default();
    let mut in_block = false;

    for (index, raw_line) in text.lines().enumerate() {
        match classify(raw_line) {
            Line::Key("q", _) if !in_block => in_block = true,
            Line::Key(..) if in_block => break,
            Line::Item(item) if in_block => {
                quaternion.push(required_number(item, index + 1)?);
                if quaternion.is_full() {
                    return unit_quaternion(&quaternion);
                }
            }
            _ => {}
        }
    }

    Err(ParseError::MissingQuaternion {
        found: quaternion.len,
    })
}

/// 按发送端的字段顺序渲染载荷文本
///
/// 缺省的 velocity / angular_velocity 以零向量写出；方差、帧号等字段为固定值。
pub fn format_payload(sample: &PoseSample) -> String {
    let mut out = String::with_capacity(512);

    let _ = writeln!(out, "timestamp: {}", sample.timestamp);
    let _ = writeln!(out, "timestamp_sample: {}", sample.timestamp);
    let _ = writeln!(out, "pose_frame: 1");
    write_list(&mut out, "position", &sample.position.to_array());
    write_list(&mut out, "q", &sample.orientation.to_array());
    let _ = writeln!(out, "velocity_frame: 1");
    write_list(&mut out, "velocity", &sample.velocity_or_zero().to_array());
    write_list(
        &mut out,
        "angular_velocity",
        &sample.angular_velocity_or_zero().to_array(),
    );
    write_list(&mut out, "position_variance", &[0.0; 3]);
    write_list(&mut out, "velocity_variance", &[0.0; 3]);
    let _ = writeln!(out, "reset_counter: 0");
    let _ = writeln!(out, "quality: 0");

    out
}

fn write_list(out: &mut String, key: &str, values: &[f64]) {
    let _ = writeln!(out, "{key}:");
    for value in values {
        // `{:?}` 保留 f64 的小数点 (1.0 而非 1)
        let _ = writeln!(out, "- {value:?}");
    }
}
