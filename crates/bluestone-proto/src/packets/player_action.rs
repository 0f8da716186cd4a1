//! PlayerAction (0x24) — Client → Server.

use bytes::{Buf, BufMut};

use crate::codec::{ProtoDecode, ProtoEncode};
use crate::error::ProtoError;
use crate::types::{BlockPos, VarInt, VarUInt64};

/// The action sub-codes a client can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum PlayerActionType {
    StartBreak = 0,
    AbortBreak = 1,
    StopBreak = 2,
    GetUpdatedBlock = 3,
    DropItem = 4,
    StartSleeping = 5,
    StopSleeping = 6,
    Respawn = 7,
    Jump = 8,
    StartSprint = 9,
    StopSprint = 10,
    StartSneak = 11,
    StopSneak = 12,
    DimensionChangeRequest = 13,
    DimensionChangeAck = 14,
    StartGlide = 15,
    StopGlide = 16,
    BuildDenied = 17,
    ContinueBreak = 18,
    SetEnchantmentSeed = 20,
}

impl PlayerActionType {
    fn from_i32(v: i32) -> Result<Self, ProtoError> {
        match v {
            0 => Ok(Self::StartBreak),
            1 => Ok(Self::AbortBreak),
            2 => Ok(Self::StopBreak),
            3 => Ok(Self::GetUpdatedBlock),
            4 => Ok(Self::DropItem),
            5 => Ok(Self::StartSleeping),
            6 => Ok(Self::StopSleeping),
            7 => Ok(Self::Respawn),
            8 => Ok(Self::Jump),
            9 => Ok(Self::StartSprint),
            10 => Ok(Self::StopSprint),
            11 => Ok(Self::StartSneak),
            12 => Ok(Self::StopSneak),
            13 => Ok(Self::DimensionChangeRequest),
            14 => Ok(Self::DimensionChangeAck),
            15 => Ok(Self::StartGlide),
            16 => Ok(Self::StopGlide),
            17 => Ok(Self::BuildDenied),
            18 => Ok(Self::ContinueBreak),
            20 => Ok(Self::SetEnchantmentSeed),
            other => Err(ProtoError::InvalidData(format!(
                "unknown player action {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerAction {
    pub entity_runtime_id: u64,
    pub action: PlayerActionType,
    pub position: BlockPos,
    pub face: i32,
}

impl ProtoEncode for PlayerAction {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        VarUInt64(self.entity_runtime_id).proto_encode(buf);
        VarInt(self.action as i32).proto_encode(buf);
        self.position.proto_encode(buf);
        VarInt(self.face).proto_encode(buf);
    }
}

impl ProtoDecode for PlayerAction {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        let entity_runtime_id = VarUInt64::proto_decode(buf)?.0;
        let action = PlayerActionType::from_i32(VarInt::proto_decode(buf)?.0)?;
        let position = BlockPos::proto_decode(buf)?;
        let face = VarInt::proto_decode(buf)?.0;
        Ok(Self {
            entity_runtime_id,
            action,
            position,
            face,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn roundtrip_break() {
        let pkt = PlayerAction {
            entity_runtime_id: 2,
            action: PlayerActionType::StartBreak,
            position: BlockPos::new(1, 64, -1),
            face: 1,
        };
        let mut buf = BytesMut::new();
        pkt.proto_encode(&mut buf);
        assert_eq!(PlayerAction::proto_decode(&mut buf.freeze()).unwrap(), pkt);
    }

    #[test]
    fn roundtrip_jump() {
        let pkt = PlayerAction {
            entity_runtime_id: 2,
            action: PlayerActionType::Jump,
            position: BlockPos::ZERO,
            face: -1,
        };
        let mut buf = BytesMut::new();
        pkt.proto_encode(&mut buf);
        assert_eq!(PlayerAction::proto_decode(&mut buf.freeze()).unwrap(), pkt);
    }

    #[test]
    fn unknown_action_rejected() {
        let mut buf = BytesMut::new();
        VarUInt64(2).proto_encode(&mut buf);
        VarInt(19).proto_encode(&mut buf); // unassigned sub-code
        BlockPos::ZERO.proto_encode(&mut buf);
        VarInt(0).proto_encode(&mut buf);
        assert!(PlayerAction::proto_decode(&mut buf.freeze()).is_err());
    }
}
