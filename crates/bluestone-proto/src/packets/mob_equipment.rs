//! MobEquipment (0x1F) — Server → Client.

use bytes::{Buf, BufMut};

use crate::codec::{ensure, ProtoDecode, ProtoEncode};
use crate::error::ProtoError;
use crate::item::ItemStack;
use crate::types::VarUInt64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MobEquipment {
    pub entity_runtime_id: u64,
    pub item: ItemStack,
    pub inventory_slot: u8,
    pub hotbar_slot: u8,
    pub window_id: u8,
}

impl ProtoEncode for MobEquipment {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        VarUInt64(self.entity_runtime_id).proto_encode(buf);
        self.item.proto_encode(buf);
        buf.put_u8(self.inventory_slot);
        buf.put_u8(self.hotbar_slot);
        buf.put_u8(self.window_id);
    }
}

impl ProtoDecode for MobEquipment {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        let entity_runtime_id = VarUInt64::proto_decode(buf)?.0;
        let item = ItemStack::proto_decode(buf)?;
        ensure(buf, 3)?;
        Ok(Self {
            entity_runtime_id,
            item,
            inventory_slot: buf.get_u8(),
            hotbar_slot: buf.get_u8(),
            window_id: buf.get_u8(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn roundtrip_empty_hand() {
        let pkt = MobEquipment {
            entity_runtime_id: 1,
            item: ItemStack::empty(),
            inventory_slot: 0,
            hotbar_slot: 0,
            window_id: 0,
        };
        let mut buf = BytesMut::new();
        pkt.proto_encode(&mut buf);
        assert_eq!(MobEquipment::proto_decode(&mut buf.freeze()).unwrap(), pkt);
    }
}
