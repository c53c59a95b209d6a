//! Reconciler 错误类型

use ingestion::IngestionError;
use thiserror::Error;

/// 启动期错误
///
/// 运行期 (poll) 的失败只记录日志与计数，从不返回给宿主。
#[derive(Debug, Error)]
pub enum BridgeError {
    /// 未启用端口发现且固定端口不可用
    #[error("no port available: fixed listen port {port} could not be bound and discovery is disabled")]
    NoPortAvailable {
        /// 配置的端口
        port: u16,
        /// 绑定失败原因
        #[source]
        source: IngestionError,
    },

    /// 其他 ingestion 错误
    #[error(transparent)]
    Ingestion(#[from] IngestionError),
}
