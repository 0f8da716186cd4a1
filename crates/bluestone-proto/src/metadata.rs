//! Entity metadata map: VarUInt32 count of (key, type, value) entries.

use bytes::{Buf, BufMut};

use crate::codec::{ensure, read_string, write_string, ProtoDecode, ProtoEncode};
use crate::error::ProtoError;
use crate::item::ItemStack;
use crate::types::{BlockPos, VarInt, VarLong, VarUInt32, Vec3};

/// Well-known metadata keys.
pub mod key {
    pub const FLAGS: u32 = 0;
    pub const HEALTH: u32 = 1;
    pub const NAMETAG: u32 = 4;
    pub const AIR: u32 = 7;
}

/// A typed metadata value. The discriminant is the wire type id.
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    Byte(i8),
    Short(i16),
    Int(i32),
    Float(f32),
    String(String),
    Slot(ItemStack),
    IntVector3(BlockPos),
    Long(i64),
    FloatVector3(Vec3),
}

impl MetadataValue {
    fn type_id(&self) -> u32 {
        match self {
            Self::Byte(_) => 0,
            Self::Short(_) => 1,
            Self::Int(_) => 2,
            Self::Float(_) => 3,
            Self::String(_) => 4,
            Self::Slot(_) => 5,
            Self::IntVector3(_) => 6,
            Self::Long(_) => 7,
            Self::FloatVector3(_) => 8,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetadataEntry {
    pub key: u32,
    pub value: MetadataValue,
}

impl ProtoEncode for MetadataEntry {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        VarUInt32(self.key).proto_encode(buf);
        VarUInt32(self.value.type_id()).proto_encode(buf);
        match &self.value {
            MetadataValue::Byte(v) => buf.put_i8(*v),
            MetadataValue::Short(v) => buf.put_i16_le(*v),
            MetadataValue::Int(v) => VarInt(*v).proto_encode(buf),
            MetadataValue::Float(v) => buf.put_f32_le(*v),
            MetadataValue::String(v) => write_string(buf, v),
            MetadataValue::Slot(v) => v.proto_encode(buf),
            MetadataValue::IntVector3(v) => v.proto_encode(buf),
            MetadataValue::Long(v) => VarLong(*v).proto_encode(buf),
            MetadataValue::FloatVector3(v) => v.proto_encode(buf),
        }
    }
}

impl ProtoDecode for MetadataEntry {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        let key = VarUInt32::proto_decode(buf)?.0;
        let type_id = VarUInt32::proto_decode(buf)?.0;
        let value = match type_id {
            0 => {
                ensure(buf, 1)?;
                MetadataValue::Byte(buf.get_i8())
            }
            1 => {
                ensure(buf, 2)?;
                MetadataValue::Short(buf.get_i16_le())
            }
            2 => MetadataValue::Int(VarInt::proto_decode(buf)?.0),
            3 => {
                ensure(buf, 4)?;
                MetadataValue::Float(buf.get_f32_le())
            }
            4 => MetadataValue::String(read_string(buf)?),
            5 => MetadataValue::Slot(ItemStack::proto_decode(buf)?),
            6 => MetadataValue::IntVector3(BlockPos::proto_decode(buf)?),
            7 => MetadataValue::Long(VarLong::proto_decode(buf)?.0),
            8 => MetadataValue::FloatVector3(Vec3::proto_decode(buf)?),
            other => {
                return Err(ProtoError::InvalidData(format!(
                    "unknown metadata type {other}"
                )))
            }
        };
        Ok(Self { key, value })
    }
}

pub fn write_metadata(buf: &mut impl BufMut, entries: &[MetadataEntry]) {
    VarUInt32(entries.len() as u32).proto_encode(buf);
    for entry in entries {
        entry.proto_encode(buf);
    }
}

pub fn read_metadata(buf: &mut impl Buf) -> Result<Vec<MetadataEntry>, ProtoError> {
    let count = VarUInt32::proto_decode(buf)?.0 as usize;
    let mut entries = Vec::with_capacity(count.min(64));
    for _ in 0..count {
        entries.push(MetadataEntry::proto_decode(buf)?);
    }
    Ok(entries)
}

/// The baseline metadata every spawned entity carries.
pub fn default_metadata(name: &str) -> Vec<MetadataEntry> {
    vec![
        MetadataEntry {
            key: key::FLAGS,
            value: MetadataValue::Long(0),
        },
        MetadataEntry {
            key: key::NAMETAG,
            value: MetadataValue::String(name.to_owned()),
        },
        MetadataEntry {
            key: key::AIR,
            value: MetadataValue::Short(300),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn entry_roundtrip_each_type() {
        let entries = vec![
            MetadataEntry {
                key: 0,
                value: MetadataValue::Byte(-3),
            },
            MetadataEntry {
                key: 1,
                value: MetadataValue::Short(300),
            },
            MetadataEntry {
                key: 2,
                value: MetadataValue::Int(-70000),
            },
            MetadataEntry {
                key: 3,
                value: MetadataValue::Float(1.5),
            },
            MetadataEntry {
                key: 4,
                value: MetadataValue::String("Steve".into()),
            },
            MetadataEntry {
                key: 5,
                value: MetadataValue::Slot(ItemStack::new(1, 4)),
            },
            MetadataEntry {
                key: 6,
                value: MetadataValue::IntVector3(BlockPos::new(1, 2, 3)),
            },
            MetadataEntry {
                key: 7,
                value: MetadataValue::Long(i64::MIN),
            },
            MetadataEntry {
                key: 8,
                value: MetadataValue::FloatVector3(Vec3::new(0.5, -0.5, 2.0)),
            },
        ];
        let mut buf = BytesMut::new();
        write_metadata(&mut buf, &entries);
        assert_eq!(read_metadata(&mut buf.freeze()).unwrap(), entries);
    }

    #[test]
    fn unknown_type_rejected() {
        let mut buf = BytesMut::new();
        VarUInt32(1).proto_encode(&mut buf); // count
        VarUInt32(0).proto_encode(&mut buf); // key
        VarUInt32(99).proto_encode(&mut buf); // bogus type
        assert!(read_metadata(&mut buf.freeze()).is_err());
    }

    #[test]
    fn default_metadata_has_nametag() {
        let md = default_metadata("Alex");
        assert!(md
            .iter()
            .any(|e| e.value == MetadataValue::String("Alex".into())));
    }
}
