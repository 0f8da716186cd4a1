//! UpdateBlock (0x15) — Server → Client.

use bytes::{Buf, BufMut};

use crate::codec::{ProtoDecode, ProtoEncode};
use crate::error::ProtoError;
use crate::types::{BlockPos, VarUInt32};

/// Update flag sent with most block changes (priority + network).
pub const FLAG_ALL_PRIORITY: u32 = 0b1011;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateBlock {
    pub position: BlockPos,
    pub block_id: u32,
    pub block_metadata: u32,
    pub flags: u32,
}

impl UpdateBlock {
    pub fn new(position: BlockPos, block_id: u32, block_metadata: u32) -> Self {
        Self {
            position,
            block_id,
            block_metadata,
            flags: FLAG_ALL_PRIORITY,
        }
    }
}

impl ProtoEncode for UpdateBlock {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        self.position.proto_encode(buf);
        VarUInt32(self.block_id).proto_encode(buf);
        // Flags share one varint with the metadata nibble.
        VarUInt32((self.flags << 4) | (self.block_metadata & 0x0F)).proto_encode(buf);
    }
}

impl ProtoDecode for UpdateBlock {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        let position = BlockPos::proto_decode(buf)?;
        let block_id = VarUInt32::proto_decode(buf)?.0;
        let packed = VarUInt32::proto_decode(buf)?.0;
        Ok(Self {
            position,
            block_id,
            block_metadata: packed & 0x0F,
            flags: packed >> 4,
        })
    }
}
