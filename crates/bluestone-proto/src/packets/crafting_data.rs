//! CraftingData (0x34) — Server → Client.
//!
//! The recipe table is supplied by the world as a pre-encoded blob and
//! passed through untouched.

use bytes::{Buf, BufMut, Bytes};

use crate::codec::{ProtoDecode, ProtoEncode};
use crate::error::ProtoError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CraftingData {
    pub recipe_data: Bytes,
}

impl ProtoEncode for CraftingData {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_slice(&self.recipe_data);
    }
}

impl ProtoDecode for CraftingData {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        Ok(Self {
            recipe_data: buf.copy_to_bytes(buf.remaining()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn passthrough_roundtrip() {
        let pkt = CraftingData {
            recipe_data: Bytes::from_static(&[0x00, 0x01, 0xFF, 0x42]),
        };
        let mut buf = BytesMut::new();
        pkt.proto_encode(&mut buf);
        assert_eq!(CraftingData::proto_decode(&mut buf.freeze()).unwrap(), pkt);
    }
}
