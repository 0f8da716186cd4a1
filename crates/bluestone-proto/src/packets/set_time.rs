//! SetTime (0x0A) — Server → Client.

use bytes::{Buf, BufMut};

use crate::codec::{ProtoDecode, ProtoEncode};
use crate::error::ProtoError;
use crate::types::VarInt;

/// World time in ticks (one day is 24000).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetTime {
    pub time: i32,
}

impl ProtoEncode for SetTime {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        VarInt(self.time).proto_encode(buf);
    }
}

impl ProtoDecode for SetTime {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        Ok(Self {
            time: VarInt::proto_decode(buf)?.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn roundtrip() {
        let pkt = SetTime { time: 6000 };
        let mut buf = BytesMut::new();
        pkt.proto_encode(&mut buf);
        assert_eq!(SetTime::proto_decode(&mut buf.freeze()).unwrap(), pkt);
    }
}
