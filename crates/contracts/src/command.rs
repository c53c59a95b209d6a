//! CommandPacket - 出站指令/遥测镜像包
//!
//! 固定布局、无填充、小端：
//!
//! ```text
//! ┌───────────────┬──────┬──────┬──────┬──────────┐
//! │ timestamp f64 │ x f32│ y f32│ z f32│ mode i32 │
//! └───────────────┴──────┴──────┴──────┴──────────┘
//!   8 bytes         4      4      4      4          = 24
//! ```

use bytes::{Buf, BufMut, BytesMut};
use serde::{Deserialize, Serialize};

use crate::ContractError;

/// Encoded size of a [`CommandPacket`]
pub const COMMAND_PACKET_SIZE: usize = 24;

/// 飞行模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandMode {
    /// 0 = 待机
    Idle,
    /// 1 = 飞行
    Moving,
    /// Any other value seen on the wire
    Other(i32),
}

impl CommandMode {
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            0 => Self::Idle,
            1 => Self::Moving,
            other => Self::Other(other),
        }
    }

    pub fn as_raw(self) -> i32 {
        match self {
            Self::Idle => 0,
            Self::Moving => 1,
            Self::Other(raw) => raw,
        }
    }
}

/// 指令包
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CommandPacket {
    /// Unix 时间戳 (秒)
    pub timestamp: f64,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub mode: CommandMode,
}

impl CommandPacket {
    /// Encode into the 24-byte little-endian wire layout
    pub fn encode(&self) -> [u8; COMMAND_PACKET_SIZE] {
        let mut buf = BytesMut::with_capacity(COMMAND_PACKET_SIZE);
        buf.put_f64_le(self.timestamp);
        buf.put_f32_le(self.x);
        buf.put_f32_le(self.y);
        buf.put_f32_le(self.z);
        buf.put_i32_le(self.mode.as_raw());

        let mut out = [0u8; COMMAND_PACKET_SIZE];
        out.copy_from_slice(&buf);
        out
    }

    /// Decode a datagram; any size other than 24 bytes is rejected
    pub fn decode(mut data: &[u8]) -> Result<Self, ContractError> {
        if data.len() != COMMAND_PACKET_SIZE {
            return Err(ContractError::CommandDecode {
                expected: COMMAND_PACKET_SIZE,
                actual: data.len(),
            });
        }

        Ok(Self {
            timestamp: data.get_f64_le(),
            x: data.get_f32_le(),
            y: data.get_f32_le(),
            z: data.get_f32_le(),
            mode: CommandMode::from_raw(data.get_i32_le()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_layout_is_packed_little_endian() {
        let packet = CommandPacket {
            timestamp: 1.5,
            x: 2.0,
            y: -3.0,
            z: 0.25,
            mode: CommandMode::Moving,
        };

        let bytes = packet.encode();
        assert_eq!(&bytes[0..8], &1.5f64.to_le_bytes());
        assert_eq!(&bytes[8..12], &2.0f32.to_le_bytes());
        assert_eq!(&bytes[12..16], &(-3.0f32).to_le_bytes());
        assert_eq!(&bytes[16..20], &0.25f32.to_le_bytes());
        assert_eq!(&bytes[20..24], &1i32.to_le_bytes());
    }

    #[test]
    fn test_decode_packet_from_sender_layout() {
        let mut raw = Vec::new();
        raw.extend_from_slice(&1_700_000_000.0f64.to_le_bytes());
        raw.extend_from_slice(&500.0f32.to_le_bytes());
        raw.extend_from_slice(&0.0f32.to_le_bytes());
        raw.extend_from_slice(&200.0f32.to_le_bytes());
        raw.extend_from_slice(&0i32.to_le_bytes());

        let packet = CommandPacket::decode(&raw).unwrap();
        assert_eq!(packet.timestamp, 1_700_000_000.0);
        assert_eq!(packet.x, 500.0);
        assert_eq!(packet.z, 200.0);
        assert_eq!(packet.mode, CommandMode::Idle);
    }

    #[test]
    fn test_decode_rejects_wrong_size() {
        let err = CommandPacket::decode(&[0u8; 23]).unwrap_err();
        assert!(matches!(
            err,
            ContractError::CommandDecode {
                expected: 24,
                actual: 23
            }
        ));
        assert!(CommandPacket::decode(&[0u8; 25]).is_err());
    }

    #[test]
    fn test_unknown_mode_is_preserved() {
        assert_eq!(CommandMode::from_raw(7), CommandMode::Other(7));
        assert_eq!(CommandMode::Other(7).as_raw(), 7);
    }
}
