//! Ingestion 错误类型

use thiserror::Error;

/// Ingestion 错误
#[derive(Debug, Error)]
pub enum IngestionError {
    /// 端口绑定失败 (非致命，调用方可换端口重试)
    #[error("failed to bind udp port {port}: {source}")]
    Bind {
        /// 端口
        port: u16,
        /// 底层错误
        #[source]
        source: std::io::Error,
    },

    /// Socket 已绑定
    #[error("listener is already bound to port {port}")]
    AlreadyBound {
        /// 当前端口
        port: u16,
    },

    /// Socket 未绑定
    #[error("listener is not bound")]
    NotBound,

    /// IO 错误
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 载荷解析错误
///
/// 数据报被丢弃，不修改任何状态。
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// 空载荷
    #[error("payload is empty")]
    Empty,

    /// 位置分量不足 3 个
    #[error("expected 3 position values, found {found}")]
    MissingPosition {
        /// 实际数量
        found: usize,
    },

    /// 四元数分量不足 4 个
    #[error("expected 4 quaternion values, found {found}")]
    MissingQuaternion {
        /// 实际数量
        found: usize,
    },

    /// 必填块中的列表项不是有限数值
    #[error("invalid number {value:?} on line {line}")]
    InvalidNumber {
        /// 行号 (从 1 开始)
        line: usize,
        /// 原始文本
        value: String,
    },

    /// 四元数模长为零，无法归一化
    #[error("quaternion has zero length")]
    DegenerateQuaternion,
}

/// Ingestion Result 类型别名
pub type Result<T> = std::result::Result<T, IngestionError>;
