//! ResourcePacksInfo (0x06) — Server → Client.

use bytes::{Buf, BufMut};

use crate::codec::{ensure, read_string, write_string, ProtoDecode, ProtoEncode};
use crate::error::ProtoError;

/// One advertised pack: id, version, and byte size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackInfo {
    pub id: String,
    pub version: String,
    pub size: u64,
}

/// Opens resource-pack negotiation. This server ships no packs, but the
/// layout supports advertising them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResourcePacksInfo {
    pub must_accept: bool,
    pub behavior_packs: Vec<PackInfo>,
    pub resource_packs: Vec<PackInfo>,
}

fn write_pack_list(buf: &mut impl BufMut, packs: &[PackInfo]) {
    buf.put_u16_le(packs.len() as u16);
    for pack in packs {
        write_string(buf, &pack.id);
        write_string(buf, &pack.version);
        buf.put_u64_le(pack.size);
    }
}

fn read_pack_list(buf: &mut impl Buf) -> Result<Vec<PackInfo>, ProtoError> {
    ensure(buf, 2)?;
    let count = buf.get_u16_le() as usize;
    let mut packs = Vec::with_capacity(count.min(32));
    for _ in 0..count {
        let id = read_string(buf)?;
        let version = read_string(buf)?;
        ensure(buf, 8)?;
        let size = buf.get_u64_le();
        packs.push(PackInfo { id, version, size });
    }
    Ok(packs)
}

impl ProtoEncode for ResourcePacksInfo {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(self.must_accept as u8);
        write_pack_list(buf, &self.behavior_packs);
        write_pack_list(buf, &self.resource_packs);
    }
}

impl ProtoDecode for ResourcePacksInfo {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        ensure(buf, 1)?;
        let must_accept = buf.get_u8() != 0;
        let behavior_packs = read_pack_list(buf)?;
        let resource_packs = read_pack_list(buf)?;
        Ok(Self {
            must_accept,
            behavior_packs,
            resource_packs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn empty_info_roundtrip() {
        let pkt = ResourcePacksInfo::default();
        let mut buf = BytesMut::new();
        pkt.proto_encode(&mut buf);
        assert_eq!(&buf[..], &[0x00, 0x00, 0x00, 0x00, 0x00]);
        assert_eq!(
            ResourcePacksInfo::proto_decode(&mut buf.freeze()).unwrap(),
            pkt
        );
    }

    #[test]
    fn advertised_pack_roundtrip() {
        let pkt = ResourcePacksInfo {
            must_accept: true,
            behavior_packs: vec![],
            resource_packs: vec![PackInfo {
                id: "df5c-11".into(),
                version: "1.0.0".into(),
                size: 1024,
            }],
        };
        let mut buf = BytesMut::new();
        pkt.proto_encode(&mut buf);
        assert_eq!(
            ResourcePacksInfo::proto_decode(&mut buf.freeze()).unwrap(),
            pkt
        );
    }
}
