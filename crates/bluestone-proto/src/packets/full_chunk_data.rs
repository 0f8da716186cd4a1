//! FullChunkData (0x3A) — Server → Client.

use bytes::{Buf, BufMut, Bytes};

use crate::codec::{read_bytes, write_bytes, ProtoDecode, ProtoEncode};
use crate::error::ProtoError;
use crate::types::{ChunkPos, VarInt};

/// One serialized chunk column. The payload layout (sub-chunks, biomes,
/// block entities) belongs to the world, not the protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FullChunkData {
    pub position: ChunkPos,
    pub data: Bytes,
}

impl ProtoEncode for FullChunkData {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        VarInt(self.position.x).proto_encode(buf);
        VarInt(self.position.z).proto_encode(buf);
        write_bytes(buf, &self.data);
    }
}

impl ProtoDecode for FullChunkData {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        let x = VarInt::proto_decode(buf)?.0;
        let z = VarInt::proto_decode(buf)?.0;
        let data = read_bytes(buf)?;
        Ok(Self {
            position: ChunkPos::new(x, z),
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn roundtrip() {
        let pkt = FullChunkData {
            position: ChunkPos::new(-3, 7),
            data: Bytes::from_static(&[1, 2, 3, 4, 5]),
        };
        let mut buf = BytesMut::new();
        pkt.proto_encode(&mut buf);
        assert_eq!(FullChunkData::proto_decode(&mut buf.freeze()).unwrap(), pkt);
    }

    #[test]
    fn empty_payload_roundtrip() {
        let pkt = FullChunkData {
            position: ChunkPos::new(0, 0),
            data: Bytes::new(),
        };
        let mut buf = BytesMut::new();
        pkt.proto_encode(&mut buf);
        assert_eq!(FullChunkData::proto_decode(&mut buf.freeze()).unwrap(), pkt);
    }
}
