//! CommandRequest (0x4D) — Client → Server.

use bytes::{Buf, BufMut};

use crate::codec::{ensure, read_string, write_string, ProtoDecode, ProtoEncode};
use crate::error::ProtoError;
use crate::types::{Uuid, VarLong, VarUInt32};

/// Origin types that carry a trailing unique entity id.
const ORIGIN_DEV_CONSOLE: u32 = 3;
const ORIGIN_TEST: u32 = 5;

/// Where a command came from, as reported by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOrigin {
    pub origin_type: u32,
    pub uuid: Uuid,
    pub request_id: String,
    /// Only present for DevConsole/Test origins.
    pub player_unique_id: Option<i64>,
}

impl CommandOrigin {
    pub fn player(uuid: Uuid) -> Self {
        Self {
            origin_type: 0,
            uuid,
            request_id: String::new(),
            player_unique_id: None,
        }
    }
}

impl ProtoEncode for CommandOrigin {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        VarUInt32(self.origin_type).proto_encode(buf);
        self.uuid.proto_encode(buf);
        write_string(buf, &self.request_id);
        if matches!(self.origin_type, ORIGIN_DEV_CONSOLE | ORIGIN_TEST) {
            VarLong(self.player_unique_id.unwrap_or(0)).proto_encode(buf);
        }
    }
}

impl ProtoDecode for CommandOrigin {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        let origin_type = VarUInt32::proto_decode(buf)?.0;
        let uuid = Uuid::proto_decode(buf)?;
        let request_id = read_string(buf)?;
        let player_unique_id = if matches!(origin_type, ORIGIN_DEV_CONSOLE | ORIGIN_TEST) {
            Some(VarLong::proto_decode(buf)?.0)
        } else {
            None
        };
        Ok(Self {
            origin_type,
            uuid,
            request_id,
            player_unique_id,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    /// Full command line, leading slash included.
    pub command: String,
    pub origin: CommandOrigin,
    pub internal: bool,
}

impl ProtoEncode for CommandRequest {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        write_string(buf, &self.command);
        self.origin.proto_encode(buf);
        buf.put_u8(self.internal as u8);
    }
}

impl ProtoDecode for CommandRequest {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        let command = read_string(buf)?;
        let origin = CommandOrigin::proto_decode(buf)?;
        ensure(buf, 1)?;
        let internal = buf.get_u8() != 0;
        Ok(Self {
            command,
            origin,
            internal,
        })
    }
}
