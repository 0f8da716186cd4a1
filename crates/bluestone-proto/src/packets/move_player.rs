//! MovePlayer (0x13) — both directions.

use bytes::{Buf, BufMut};

use crate::codec::{ensure, ProtoDecode, ProtoEncode};
use crate::error::ProtoError;
use crate::types::{VarUInt64, Vec3};

/// How the client should apply the position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MoveMode {
    Normal = 0,
    Reset = 1,
    Teleport = 2,
    Rotation = 3,
}

impl MoveMode {
    fn from_u8(v: u8) -> Result<Self, ProtoError> {
        match v {
            0 => Ok(Self::Normal),
            1 => Ok(Self::Reset),
            2 => Ok(Self::Teleport),
            3 => Ok(Self::Rotation),
            other => Err(ProtoError::InvalidData(format!("unknown move mode {other}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MovePlayer {
    pub entity_runtime_id: u64,
    /// Eye position (feet + 1.62).
    pub position: Vec3,
    pub pitch: f32,
    pub yaw: f32,
    pub head_yaw: f32,
    pub mode: MoveMode,
    pub on_ground: bool,
    pub riding_runtime_id: u64,
    /// Present only when `mode == Teleport`.
    pub teleport_cause: Option<(i32, i32)>,
}

impl MovePlayer {
    pub fn normal(entity_runtime_id: u64, position: Vec3, pitch: f32, yaw: f32) -> Self {
        Self {
            entity_runtime_id,
            position,
            pitch,
            yaw,
            head_yaw: yaw,
            mode: MoveMode::Normal,
            on_ground: true,
            riding_runtime_id: 0,
            teleport_cause: None,
        }
    }
}

impl ProtoEncode for MovePlayer {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        VarUInt64(self.entity_runtime_id).proto_encode(buf);
        self.position.proto_encode(buf);
        buf.put_f32_le(self.pitch);
        buf.put_f32_le(self.yaw);
        buf.put_f32_le(self.head_yaw);
        buf.put_u8(self.mode as u8);
        buf.put_u8(self.on_ground as u8);
        VarUInt64(self.riding_runtime_id).proto_encode(buf);
        if self.mode == MoveMode::Teleport {
            let (cause, source) = self.teleport_cause.unwrap_or((0, 0));
            buf.put_i32_le(cause);
            buf.put_i32_le(source);
        }
    }
}

impl ProtoDecode for MovePlayer {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        let entity_runtime_id = VarUInt64::proto_decode(buf)?.0;
        let position = Vec3::proto_decode(buf)?;
        ensure(buf, 14)?;
        let pitch = buf.get_f32_le();
        let yaw = buf.get_f32_le();
        let head_yaw = buf.get_f32_le();
        let mode = MoveMode::from_u8(buf.get_u8())?;
        let on_ground = buf.get_u8() != 0;
        let riding_runtime_id = VarUInt64::proto_decode(buf)?.0;
        let teleport_cause = if mode == MoveMode::Teleport {
            ensure(buf, 8)?;
            Some((buf.get_i32_le(), buf.get_i32_le()))
        } else {
            None
        };
        Ok(Self {
            entity_runtime_id,
            position,
            pitch,
            yaw,
            head_yaw,
            mode,
            on_ground,
            riding_runtime_id,
            teleport_cause,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn roundtrip_normal() {
        let pkt = MovePlayer::normal(2, Vec3::new(1.0, 2.0, 3.0), 10.0, 20.0);
        let mut buf = BytesMut::new();
        pkt.proto_encode(&mut buf);
        assert_eq!(MovePlayer::proto_decode(&mut buf.freeze()).unwrap(), pkt);
    }

    #[test]
    fn roundtrip_teleport_extras() {
        let pkt = MovePlayer {
            mode: MoveMode::Teleport,
            teleport_cause: Some((1, 0)),
            ..MovePlayer::normal(2, Vec3::ZERO, 0.0, 0.0)
        };
        let mut buf = BytesMut::new();
        pkt.proto_encode(&mut buf);
        let decoded = MovePlayer::proto_decode(&mut buf.freeze()).unwrap();
        assert_eq!(decoded.teleport_cause, Some((1, 0)));
        assert_eq!(decoded, pkt);
    }

    #[test]
    fn bad_mode_rejected() {
        let pkt = MovePlayer::normal(1, Vec3::ZERO, 0.0, 0.0);
        let mut buf = BytesMut::new();
        pkt.proto_encode(&mut buf);
        let mut raw = buf.to_vec();
        // Mode byte sits after id(1) + pos(12) + angles(12).
        raw[25] = 9;
        assert!(MovePlayer::proto_decode(&mut bytes::Bytes::from(raw)).is_err());
    }
}
