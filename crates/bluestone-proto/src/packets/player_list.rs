//! PlayerList (0x3F) — Server → Client.

use bytes::{Buf, BufMut, Bytes};

use crate::codec::{
    ensure, read_bytes, read_string, write_bytes, write_string, ProtoDecode, ProtoEncode,
};
use crate::error::ProtoError;
use crate::types::{Uuid, VarLong, VarUInt32};

/// One roster entry as sent with an Add list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerListEntry {
    pub uuid: Uuid,
    pub entity_unique_id: i64,
    pub user_name: String,
    pub skin_id: String,
    pub skin_data: Bytes,
    pub cape_data: Bytes,
    pub geometry_name: String,
    pub geometry_data: Bytes,
    pub xuid: String,
}

impl PlayerListEntry {
    /// An entry with the default skin blobs left empty.
    pub fn bare(uuid: Uuid, entity_unique_id: i64, user_name: impl Into<String>) -> Self {
        Self {
            uuid,
            entity_unique_id,
            user_name: user_name.into(),
            skin_id: "Standard_Custom".into(),
            skin_data: Bytes::new(),
            cape_data: Bytes::new(),
            geometry_name: "geometry.humanoid".into(),
            geometry_data: Bytes::new(),
            xuid: String::new(),
        }
    }
}

/// Adds or removes roster entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerList {
    Add(Vec<PlayerListEntry>),
    Remove(Vec<Uuid>),
}

impl ProtoEncode for PlayerList {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        match self {
            Self::Add(entries) => {
                buf.put_u8(0);
                VarUInt32(entries.len() as u32).proto_encode(buf);
                for entry in entries {
                    entry.uuid.proto_encode(buf);
                    VarLong(entry.entity_unique_id).proto_encode(buf);
                    write_string(buf, &entry.user_name);
                    write_string(buf, &entry.skin_id);
                    write_bytes(buf, &entry.skin_data);
                    write_bytes(buf, &entry.cape_data);
                    write_string(buf, &entry.geometry_name);
                    write_bytes(buf, &entry.geometry_data);
                    write_string(buf, &entry.xuid);
                }
            }
            Self::Remove(uuids) => {
                buf.put_u8(1);
                VarUInt32(uuids.len() as u32).proto_encode(buf);
                for uuid in uuids {
                    uuid.proto_encode(buf);
                }
            }
        }
    }
}

impl ProtoDecode for PlayerList {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        ensure(buf, 1)?;
        let list_type = buf.get_u8();
        let count = VarUInt32::proto_decode(buf)?.0 as usize;
        match list_type {
            0 => {
                let mut entries = Vec::with_capacity(count.min(64));
                for _ in 0..count {
                    entries.push(PlayerListEntry {
                        uuid: Uuid::proto_decode(buf)?,
                        entity_unique_id: VarLong::proto_decode(buf)?.0,
                        user_name: read_string(buf)?,
                        skin_id: read_string(buf)?,
                        skin_data: read_bytes(buf)?,
                        cape_data: read_bytes(buf)?,
                        geometry_name: read_string(buf)?,
                        geometry_data: read_bytes(buf)?,
                        xuid: read_string(buf)?,
                    });
                }
                Ok(Self::Add(entries))
            }
            1 => {
                let mut uuids = Vec::with_capacity(count.min(64));
                for _ in 0..count {
                    uuids.push(Uuid::proto_decode(buf)?);
                }
                Ok(Self::Remove(uuids))
            }
            other => Err(ProtoError::InvalidData(format!(
                "unknown player list type {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn add_roundtrip() {
        let pkt = PlayerList::Add(vec![PlayerListEntry::bare(Uuid::new(1, 2), 5, "Steve")]);
        let mut buf = BytesMut::new();
        pkt.proto_encode(&mut buf);
        assert_eq!(PlayerList::proto_decode(&mut buf.freeze()).unwrap(), pkt);
    }

    #[test]
    fn remove_roundtrip() {
        let pkt = PlayerList::Remove(vec![Uuid::new(1, 2), Uuid::new(3, 4)]);
        let mut buf = BytesMut::new();
        pkt.proto_encode(&mut buf);
        assert_eq!(PlayerList::proto_decode(&mut buf.freeze()).unwrap(), pkt);
    }

    #[test]
    fn bad_list_type_rejected() {
        let data = bytes::Bytes::from_static(&[9, 0]);
        assert!(PlayerList::proto_decode(&mut data.clone()).is_err());
    }
}
