//! ResourcePackClientResponse (0x08) — Client → Server.

use bytes::{Buf, BufMut};

use crate::codec::{ensure, read_string, write_string, ProtoDecode, ProtoEncode};
use crate::error::ProtoError;

/// The client's verdict on the offered packs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ResourcePackStatus {
    Refused = 1,
    SendPacks = 2,
    HaveAllPacks = 3,
    Completed = 4,
}

impl ResourcePackStatus {
    fn from_u8(v: u8) -> Result<Self, ProtoError> {
        match v {
            1 => Ok(Self::Refused),
            2 => Ok(Self::SendPacks),
            3 => Ok(Self::HaveAllPacks),
            4 => Ok(Self::Completed),
            other => Err(ProtoError::InvalidData(format!(
                "unknown resource pack status {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcePackClientResponse {
    pub status: ResourcePackStatus,
    pub pack_ids: Vec<String>,
}

impl ResourcePackClientResponse {
    pub fn completed() -> Self {
        Self {
            status: ResourcePackStatus::Completed,
            pack_ids: Vec::new(),
        }
    }
}

impl ProtoEncode for ResourcePackClientResponse {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(self.status as u8);
        buf.put_u16_le(self.pack_ids.len() as u16);
        for id in &self.pack_ids {
            write_string(buf, id);
        }
    }
}

impl ProtoDecode for ResourcePackClientResponse {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        ensure(buf, 3)?;
        let status = ResourcePackStatus::from_u8(buf.get_u8())?;
        let count = buf.get_u16_le() as usize;
        let mut pack_ids = Vec::with_capacity(count.min(32));
        for _ in 0..count {
            pack_ids.push(read_string(buf)?);
        }
        Ok(Self { status, pack_ids })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn completed_roundtrip() {
        let pkt = ResourcePackClientResponse::completed();
        let mut buf = BytesMut::new();
        pkt.proto_encode(&mut buf);
        assert_eq!(&buf[..], &[0x04, 0x00, 0x00]);
        assert_eq!(
            ResourcePackClientResponse::proto_decode(&mut buf.freeze()).unwrap(),
            pkt
        );
    }

    #[test]
    fn send_packs_with_ids_roundtrip() {
        let pkt = ResourcePackClientResponse {
            status: ResourcePackStatus::SendPacks,
            pack_ids: vec!["pack-a".into(), "pack-b".into()],
        };
        let mut buf = BytesMut::new();
        pkt.proto_encode(&mut buf);
        assert_eq!(
            ResourcePackClientResponse::proto_decode(&mut buf.freeze()).unwrap(),
            pkt
        );
    }

    #[test]
    fn status_zero_rejected() {
        let data = bytes::Bytes::from_static(&[0x00, 0x00, 0x00]);
        assert!(ResourcePackClientResponse::proto_decode(&mut data.clone()).is_err());
    }
}
