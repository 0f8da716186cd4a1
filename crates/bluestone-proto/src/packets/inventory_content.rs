//! InventoryContent (0x31) — Server → Client.

use bytes::{Buf, BufMut};

use crate::codec::{ProtoDecode, ProtoEncode};
use crate::error::ProtoError;
use crate::item::{read_item_list, write_item_list, ItemStack};
use crate::types::VarUInt32;

/// Well-known window ids.
pub mod window {
    pub const INVENTORY: u32 = 0;
    pub const OFFHAND: u32 = 119;
    pub const ARMOR: u32 = 120;
    pub const CREATIVE: u32 = 121;
    pub const HOTBAR: u32 = 122;
}

/// Replaces the full contents of one window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryContent {
    pub window_id: u32,
    pub items: Vec<ItemStack>,
}

impl InventoryContent {
    /// An all-empty window of the given size.
    pub fn empty(window_id: u32, slots: usize) -> Self {
        Self {
            window_id,
            items: vec![ItemStack::empty(); slots],
        }
    }
}

impl ProtoEncode for InventoryContent {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        VarUInt32(self.window_id).proto_encode(buf);
        write_item_list(buf, &self.items);
    }
}

impl ProtoDecode for InventoryContent {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        let window_id = VarUInt32::proto_decode(buf)?.0;
        let items = read_item_list(buf)?;
        Ok(Self { window_id, items })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn roundtrip_main_inventory() {
        let pkt = InventoryContent::empty(window::INVENTORY, 36);
        let mut buf = BytesMut::new();
        pkt.proto_encode(&mut buf);
        let decoded = InventoryContent::proto_decode(&mut buf.freeze()).unwrap();
        assert_eq!(decoded.items.len(), 36);
        assert_eq!(decoded, pkt);
    }

    #[test]
    fn roundtrip_with_items() {
        let mut pkt = InventoryContent::empty(window::ARMOR, 4);
        pkt.items[0] = ItemStack::new(310, 1);
        let mut buf = BytesMut::new();
        pkt.proto_encode(&mut buf);
        assert_eq!(
            InventoryContent::proto_decode(&mut buf.freeze()).unwrap(),
            pkt
        );
    }
}
