//! ChunkRadiusUpdated (0x46) — Server → Client.

use bytes::{Buf, BufMut};

use crate::codec::{ProtoDecode, ProtoEncode};
use crate::error::ProtoError;
use crate::types::VarInt;

/// The view distance the server accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkRadiusUpdated {
    pub radius: i32,
}

impl ProtoEncode for ChunkRadiusUpdated {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        VarInt(self.radius).proto_encode(buf);
    }
}

impl ProtoDecode for ChunkRadiusUpdated {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        Ok(Self {
            radius: VarInt::proto_decode(buf)?.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn roundtrip() {
        let pkt = ChunkRadiusUpdated { radius: 8 };
        let mut buf = BytesMut::new();
        pkt.proto_encode(&mut buf);
        assert_eq!(
            ChunkRadiusUpdated::proto_decode(&mut buf.freeze()).unwrap(),
            pkt
        );
    }
}
