//! Pending Sample Slot
//!
//! 单槽信箱：至多缓存一个原始数据报，新到达的总是覆盖旧的。

use bytes::Bytes;

/// 待处理数据报槽
#[derive(Debug, Default)]
pub struct PendingSlot {
    value: Option<Bytes>,
}

impl PendingSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入新数据报，返回被覆盖的旧值
    pub fn replace(&mut self, raw: Bytes) -> Option<Bytes> {
        self.value.replace(raw)
    }

    /// 取出并清空
    pub fn take(&mut self) -> Option<Bytes> {
        self.value.take()
    }

    pub fn peek(&self) -> Option<&Bytes> {
        self.value.as_ref()
    }

    pub fn clear(&mut self) {
        self.value = None;
    }

    pub fn is_occupied(&self) -> bool {
        self.value.is_some()
    }
}
