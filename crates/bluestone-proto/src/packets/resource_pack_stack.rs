//! ResourcePackStack (0x07) — Server → Client.

use bytes::{Buf, BufMut};

use crate::codec::{ensure, read_string, write_string, ProtoDecode, ProtoEncode};
use crate::error::ProtoError;
use crate::types::VarUInt32;

/// One stack entry: pack id and version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackStackEntry {
    pub id: String,
    pub version: String,
}

/// The final pack ordering applied by the client.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResourcePackStack {
    pub must_accept: bool,
    pub behavior_packs: Vec<PackStackEntry>,
    pub resource_packs: Vec<PackStackEntry>,
}

fn write_stack(buf: &mut impl BufMut, packs: &[PackStackEntry]) {
    VarUInt32(packs.len() as u32).proto_encode(buf);
    for pack in packs {
        write_string(buf, &pack.id);
        write_string(buf, &pack.version);
    }
}

fn read_stack(buf: &mut impl Buf) -> Result<Vec<PackStackEntry>, ProtoError> {
    let count = VarUInt32::proto_decode(buf)?.0 as usize;
    let mut packs = Vec::with_capacity(count.min(32));
    for _ in 0..count {
        packs.push(PackStackEntry {
            id: read_string(buf)?,
            version: read_string(buf)?,
        });
    }
    Ok(packs)
}

impl ProtoEncode for ResourcePackStack {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(self.must_accept as u8);
        write_stack(buf, &self.behavior_packs);
        write_stack(buf, &self.resource_packs);
    }
}

impl ProtoDecode for ResourcePackStack {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        ensure(buf, 1)?;
        let must_accept = buf.get_u8() != 0;
        let behavior_packs = read_stack(buf)?;
        let resource_packs = read_stack(buf)?;
        Ok(Self {
            must_accept,
            behavior_packs,
            resource_packs,
        })
    }
}
