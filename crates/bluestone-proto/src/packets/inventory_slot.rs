//! InventorySlot (0x32) — Server → Client.

use bytes::{Buf, BufMut};

use crate::codec::{ProtoDecode, ProtoEncode};
use crate::error::ProtoError;
use crate::item::ItemStack;
use crate::types::VarUInt32;

/// Replaces a single slot in one window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventorySlot {
    pub window_id: u32,
    pub slot: u32,
    pub item: ItemStack,
}

impl ProtoEncode for InventorySlot {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        VarUInt32(self.window_id).proto_encode(buf);
        VarUInt32(self.slot).proto_encode(buf);
        self.item.proto_encode(buf);
    }
}

impl ProtoDecode for InventorySlot {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        let window_id = VarUInt32::proto_decode(buf)?.0;
        let slot = VarUInt32::proto_decode(buf)?.0;
        let item = ItemStack::proto_decode(buf)?;
        Ok(Self {
            window_id,
            slot,
            item,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn roundtrip() {
        let pkt = InventorySlot {
            window_id: 0,
            slot: 3,
            item: ItemStack::new(5, 12),
        };
        let mut buf = BytesMut::new();
        pkt.proto_encode(&mut buf);
        assert_eq!(InventorySlot::proto_decode(&mut buf.freeze()).unwrap(), pkt);
    }
}
