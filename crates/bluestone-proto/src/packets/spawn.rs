//! AddPlayer (0x0C) and AddEntity (0x0D) — Server → Client.

use bytes::{Buf, BufMut};

use crate::codec::{ensure, read_string, write_string, ProtoDecode, ProtoEncode};
use crate::error::ProtoError;
use crate::item::ItemStack;
use crate::metadata::{read_metadata, write_metadata, MetadataEntry};
use crate::types::{Uuid, VarLong, VarUInt32, VarUInt64, Vec3};

/// Spawns another player for this client.
#[derive(Debug, Clone, PartialEq)]
pub struct AddPlayer {
    pub uuid: Uuid,
    pub user_name: String,
    pub entity_unique_id: i64,
    pub entity_runtime_id: u64,
    pub position: Vec3,
    pub motion: Vec3,
    pub pitch: f32,
    pub head_yaw: f32,
    pub yaw: f32,
    pub held_item: ItemStack,
    pub metadata: Vec<MetadataEntry>,
}

impl ProtoEncode for AddPlayer {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        self.uuid.proto_encode(buf);
        write_string(buf, &self.user_name);
        VarLong(self.entity_unique_id).proto_encode(buf);
        VarUInt64(self.entity_runtime_id).proto_encode(buf);
        self.position.proto_encode(buf);
        self.motion.proto_encode(buf);
        buf.put_f32_le(self.pitch);
        buf.put_f32_le(self.head_yaw);
        buf.put_f32_le(self.yaw);
        self.held_item.proto_encode(buf);
        write_metadata(buf, &self.metadata);
    }
}

impl ProtoDecode for AddPlayer {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        let uuid = Uuid::proto_decode(buf)?;
        let user_name = read_string(buf)?;
        let entity_unique_id = VarLong::proto_decode(buf)?.0;
        let entity_runtime_id = VarUInt64::proto_decode(buf)?.0;
        let position = Vec3::proto_decode(buf)?;
        let motion = Vec3::proto_decode(buf)?;
        ensure(buf, 12)?;
        let pitch = buf.get_f32_le();
        let head_yaw = buf.get_f32_le();
        let yaw = buf.get_f32_le();
        let held_item = ItemStack::proto_decode(buf)?;
        let metadata = read_metadata(buf)?;
        Ok(Self {
            uuid,
            user_name,
            entity_unique_id,
            entity_runtime_id,
            position,
            motion,
            pitch,
            head_yaw,
            yaw,
            held_item,
            metadata,
        })
    }
}

/// One attribute as carried by AddEntity: name plus min/current/max.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityAttribute {
    pub name: String,
    pub min: f32,
    pub current: f32,
    pub max: f32,
}

impl ProtoEncode for EntityAttribute {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        write_string(buf, &self.name);
        buf.put_f32_le(self.min);
        buf.put_f32_le(self.current);
        buf.put_f32_le(self.max);
    }
}

impl ProtoDecode for EntityAttribute {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        let name = read_string(buf)?;
        ensure(buf, 12)?;
        Ok(Self {
            name,
            min: buf.get_f32_le(),
            current: buf.get_f32_le(),
            max: buf.get_f32_le(),
        })
    }
}

/// Spawns a non-player entity.
#[derive(Debug, Clone, PartialEq)]
pub struct AddEntity {
    pub entity_unique_id: i64,
    pub entity_runtime_id: u64,
    pub entity_type: u32,
    pub position: Vec3,
    pub motion: Vec3,
    pub pitch: f32,
    pub yaw: f32,
    pub attributes: Vec<EntityAttribute>,
    pub metadata: Vec<MetadataEntry>,
}

impl ProtoEncode for AddEntity {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        VarLong(self.entity_unique_id).proto_encode(buf);
        VarUInt64(self.entity_runtime_id).proto_encode(buf);
        VarUInt32(self.entity_type).proto_encode(buf);
        self.position.proto_encode(buf);
        self.motion.proto_encode(buf);
        buf.put_f32_le(self.pitch);
        buf.put_f32_le(self.yaw);
        VarUInt32(self.attributes.len() as u32).proto_encode(buf);
        for attr in &self.attributes {
            attr.proto_encode(buf);
        }
        write_metadata(buf, &self.metadata);
    }
}

impl ProtoDecode for AddEntity {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        let entity_unique_id = VarLong::proto_decode(buf)?.0;
        let entity_runtime_id = VarUInt64::proto_decode(buf)?.0;
        let entity_type = VarUInt32::proto_decode(buf)?.0;
        let position = Vec3::proto_decode(buf)?;
        let motion = Vec3::proto_decode(buf)?;
        ensure(buf, 8)?;
        let pitch = buf.get_f32_le();
        let yaw = buf.get_f32_le();
        let attr_count = VarUInt32::proto_decode(buf)?.0 as usize;
        let mut attributes = Vec::with_capacity(attr_count.min(16));
        for _ in 0..attr_count {
            attributes.push(EntityAttribute::proto_decode(buf)?);
        }
        let metadata = read_metadata(buf)?;
        Ok(Self {
            entity_unique_id,
            entity_runtime_id,
            entity_type,
            position,
            motion,
            pitch,
            yaw,
            attributes,
            metadata,
        })
    }
}
