//! Item stack wire format (1.2-era slot encoding).

use bytes::{Buf, BufMut, Bytes};

use crate::codec::{ensure, read_string, write_string, ProtoDecode, ProtoEncode};
use crate::error::ProtoError;
use crate::types::{VarInt, VarUInt32};

/// An inventory slot. `id == 0` means the slot is empty and no further
/// fields follow on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemStack {
    pub id: i32,
    pub count: u8,
    pub metadata: u16,
    /// Raw NBT in network form; opaque to the protocol layer.
    pub nbt: Bytes,
    pub can_place_on: Vec<String>,
    pub can_destroy: Vec<String>,
}

impl ItemStack {
    /// The empty slot (air).
    pub fn empty() -> Self {
        Self {
            id: 0,
            count: 0,
            metadata: 0,
            nbt: Bytes::new(),
            can_place_on: Vec::new(),
            can_destroy: Vec::new(),
        }
    }

    pub fn new(id: i32, count: u8) -> Self {
        Self {
            id,
            count,
            metadata: 0,
            nbt: Bytes::new(),
            can_place_on: Vec::new(),
            can_destroy: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.id == 0 || self.count == 0
    }
}

/// Wire form:
/// `VarInt(id)` (0 ends the record), then
/// `VarInt(metadata << 8 | count)`, `u16_le` NBT length + bytes,
/// `VarInt` count + strings for can-place-on, same for can-destroy.
impl ProtoEncode for ItemStack {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        VarInt(self.id).proto_encode(buf);
        if self.id == 0 {
            return;
        }
        let aux = ((self.metadata as i32) << 8) | self.count as i32;
        VarInt(aux).proto_encode(buf);
        buf.put_u16_le(self.nbt.len() as u16);
        buf.put_slice(&self.nbt);
        VarInt(self.can_place_on.len() as i32).proto_encode(buf);
        for s in &self.can_place_on {
            write_string(buf, s);
        }
        VarInt(self.can_destroy.len() as i32).proto_encode(buf);
        for s in &self.can_destroy {
            write_string(buf, s);
        }
    }
}

impl ProtoDecode for ItemStack {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        let id = VarInt::proto_decode(buf)?.0;
        if id == 0 {
            return Ok(Self::empty());
        }
        let aux = VarInt::proto_decode(buf)?.0;
        let count = (aux & 0xFF) as u8;
        let metadata = (aux >> 8) as u16;

        ensure(buf, 2)?;
        let nbt_len = buf.get_u16_le() as usize;
        ensure(buf, nbt_len)?;
        let nbt = buf.copy_to_bytes(nbt_len);

        let place_count = VarInt::proto_decode(buf)?.0.max(0) as usize;
        let mut can_place_on = Vec::with_capacity(place_count.min(64));
        for _ in 0..place_count {
            can_place_on.push(read_string(buf)?);
        }
        let destroy_count = VarInt::proto_decode(buf)?.0.max(0) as usize;
        let mut can_destroy = Vec::with_capacity(destroy_count.min(64));
        for _ in 0..destroy_count {
            can_destroy.push(read_string(buf)?);
        }

        Ok(Self {
            id,
            count,
            metadata,
            nbt,
            can_place_on,
            can_destroy,
        })
    }
}

/// A VarUInt32-counted list of item stacks (inventory contents).
pub fn write_item_list(buf: &mut impl BufMut, items: &[ItemStack]) {
    VarUInt32(items.len() as u32).proto_encode(buf);
    for item in items {
        item.proto_encode(buf);
    }
}

pub fn read_item_list(buf: &mut impl Buf) -> Result<Vec<ItemStack>, ProtoError> {
    let count = VarUInt32::proto_decode(buf)?.0 as usize;
    let mut items = Vec::with_capacity(count.min(256));
    for _ in 0..count {
        items.push(ItemStack::proto_decode(buf)?);
    }
    Ok(items)
}
