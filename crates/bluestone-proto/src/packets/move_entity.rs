//! MoveEntity (0x12) — Server → Client.
//!
//! Entity rotations travel as single bytes in 360/256-degree steps; the
//! raw byte is kept in the struct so the packet re-encodes exactly.

use bytes::{Buf, BufMut};

use crate::codec::{ensure, ProtoDecode, ProtoEncode};
use crate::error::ProtoError;
use crate::types::{VarUInt64, Vec3};

/// Convert degrees to the byte rotation the wire carries.
pub fn rotation_to_byte(degrees: f32) -> u8 {
    (degrees.rem_euclid(360.0) / 360.0 * 256.0) as u8
}

/// Convert a wire byte rotation back to degrees.
pub fn byte_to_rotation(byte: u8) -> f32 {
    byte as f32 * 360.0 / 256.0
}

#[derive(Debug, Clone, PartialEq)]
pub struct MoveEntity {
    pub entity_runtime_id: u64,
    pub position: Vec3,
    pub pitch: u8,
    pub head_yaw: u8,
    pub yaw: u8,
    pub on_ground: bool,
    pub teleported: bool,
}

impl MoveEntity {
    pub fn new(
        entity_runtime_id: u64,
        position: Vec3,
        pitch: f32,
        head_yaw: f32,
        yaw: f32,
    ) -> Self {
        Self {
            entity_runtime_id,
            position,
            pitch: rotation_to_byte(pitch),
            head_yaw: rotation_to_byte(head_yaw),
            yaw: rotation_to_byte(yaw),
            on_ground: true,
            teleported: false,
        }
    }
}

impl ProtoEncode for MoveEntity {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        VarUInt64(self.entity_runtime_id).proto_encode(buf);
        self.position.proto_encode(buf);
        buf.put_u8(self.pitch);
        buf.put_u8(self.head_yaw);
        buf.put_u8(self.yaw);
        buf.put_u8(self.on_ground as u8);
        buf.put_u8(self.teleported as u8);
    }
}

impl ProtoDecode for MoveEntity {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        let entity_runtime_id = VarUInt64::proto_decode(buf)?.0;
        let position = Vec3::proto_decode(buf)?;
        ensure(buf, 5)?;
        Ok(Self {
            entity_runtime_id,
            position,
            pitch: buf.get_u8(),
            head_yaw: buf.get_u8(),
            yaw: buf.get_u8(),
            on_ground: buf.get_u8() != 0,
            teleported: buf.get_u8() != 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn roundtrip() {
        let pkt = MoveEntity::new(7, Vec3::new(1.0, 2.0, 3.0), 0.0, 90.0, 180.0);
        let mut buf = BytesMut::new();
        pkt.proto_encode(&mut buf);
        assert_eq!(MoveEntity::proto_decode(&mut buf.freeze()).unwrap(), pkt);
    }

    #[test]
    fn rotation_quantization() {
        assert_eq!(rotation_to_byte(0.0), 0);
        assert_eq!(rotation_to_byte(90.0), 64);
        assert_eq!(rotation_to_byte(180.0), 128);
        assert_eq!(rotation_to_byte(-90.0), 192);
        assert!((byte_to_rotation(64) - 90.0).abs() < f32::EPSILON);
    }
}
