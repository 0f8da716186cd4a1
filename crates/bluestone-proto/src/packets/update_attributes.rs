//! UpdateAttributes (0x1D) — Server → Client.

use bytes::{Buf, BufMut};

use crate::codec::{ensure, read_string, write_string, ProtoDecode, ProtoEncode};
use crate::error::ProtoError;
use crate::types::{VarUInt32, VarUInt64};

/// One player attribute: bounds, live value, and default.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub min: f32,
    pub max: f32,
    pub current: f32,
    pub default: f32,
    pub name: String,
}

impl Attribute {
    pub fn ranged(name: &str, min: f32, max: f32, value: f32) -> Self {
        Self {
            min,
            max,
            current: value,
            default: max,
            name: name.to_owned(),
        }
    }

    /// The baseline attribute set sent during the spawn prelude.
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::ranged("minecraft:health", 0.0, 20.0, 20.0),
            Self::ranged("minecraft:movement", 0.0, 0.5, 0.1),
            Self::ranged("minecraft:player.hunger", 0.0, 20.0, 20.0),
            Self::ranged("minecraft:player.level", 0.0, 24791.0, 0.0),
            Self::ranged("minecraft:player.experience", 0.0, 1.0, 0.0),
        ]
    }
}

impl ProtoEncode for Attribute {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_f32_le(self.min);
        buf.put_f32_le(self.max);
        buf.put_f32_le(self.current);
        buf.put_f32_le(self.default);
        write_string(buf, &self.name);
    }
}

impl ProtoDecode for Attribute {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        ensure(buf, 16)?;
        let min = buf.get_f32_le();
        let max = buf.get_f32_le();
        let current = buf.get_f32_le();
        let default = buf.get_f32_le();
        let name = read_string(buf)?;
        Ok(Self {
            min,
            max,
            current,
            default,
            name,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateAttributes {
    pub entity_runtime_id: u64,
    pub attributes: Vec<Attribute>,
}

impl ProtoEncode for UpdateAttributes {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        VarUInt64(self.entity_runtime_id).proto_encode(buf);
        VarUInt32(self.attributes.len() as u32).proto_encode(buf);
        for attr in &self.attributes {
            attr.proto_encode(buf);
        }
    }
}

impl ProtoDecode for UpdateAttributes {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        let entity_runtime_id = VarUInt64::proto_decode(buf)?.0;
        let count = VarUInt32::proto_decode(buf)?.0 as usize;
        let mut attributes = Vec::with_capacity(count.min(32));
        for _ in 0..count {
            attributes.push(Attribute::proto_decode(buf)?);
        }
        Ok(Self {
            entity_runtime_id,
            attributes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn roundtrip_defaults() {
        let pkt = UpdateAttributes {
            entity_runtime_id: 1,
            attributes: Attribute::defaults(),
        };
        let mut buf = BytesMut::new();
        pkt.proto_encode(&mut buf);
        assert_eq!(
            UpdateAttributes::proto_decode(&mut buf.freeze()).unwrap(),
            pkt
        );
    }

    #[test]
    fn empty_attribute_list() {
        let pkt = UpdateAttributes {
            entity_runtime_id: 9,
            attributes: Vec::new(),
        };
        let mut buf = BytesMut::new();
        pkt.proto_encode(&mut buf);
        assert_eq!(
            UpdateAttributes::proto_decode(&mut buf.freeze()).unwrap(),
            pkt
        );
    }
}
