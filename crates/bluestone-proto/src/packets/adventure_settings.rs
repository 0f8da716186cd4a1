//! AdventureSettings (0x37) — Server → Client.

use bytes::{Buf, BufMut};

use crate::codec::{ensure, ProtoDecode, ProtoEncode};
use crate::error::ProtoError;
use crate::types::VarUInt32;

/// World-interaction flags and permission levels for one player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AdventureSettings {
    pub flags: u32,
    pub command_permission: u32,
    pub flags2: u32,
    pub player_permission: u32,
    pub custom_flags: u32,
    pub user_id: u64,
}

impl ProtoEncode for AdventureSettings {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        VarUInt32(self.flags).proto_encode(buf);
        VarUInt32(self.command_permission).proto_encode(buf);
        VarUInt32(self.flags2).proto_encode(buf);
        VarUInt32(self.player_permission).proto_encode(buf);
        VarUInt32(self.custom_flags).proto_encode(buf);
        buf.put_u64_le(self.user_id);
    }
}

impl ProtoDecode for AdventureSettings {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        let flags = VarUInt32::proto_decode(buf)?.0;
        let command_permission = VarUInt32::proto_decode(buf)?.0;
        let flags2 = VarUInt32::proto_decode(buf)?.0;
        let player_permission = VarUInt32::proto_decode(buf)?.0;
        let custom_flags = VarUInt32::proto_decode(buf)?.0;
        ensure(buf, 8)?;
        let user_id = buf.get_u64_le();
        Ok(Self {
            flags,
            command_permission,
            flags2,
            player_permission,
            custom_flags,
            user_id,
        })
    }
}
