//! StartGame (0x0B) — Server → Client.
//!
//! World parameters and the joining player's entity ids, sent once after
//! resource-pack negotiation completes.

use bytes::{Buf, BufMut};

use crate::codec::{ensure, read_string, write_string, ProtoDecode, ProtoEncode};
use crate::error::ProtoError;
use crate::types::{BlockPos, VarInt, VarLong, VarUInt32, VarUInt64, Vec3};

/// A typed game-rule value. The wire type ids are bool=1, int=2, float=3.
#[derive(Debug, Clone, PartialEq)]
pub enum GameRuleValue {
    Bool(bool),
    Int(u32),
    Float(f32),
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameRule {
    pub name: String,
    pub value: GameRuleValue,
}

impl ProtoEncode for GameRule {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        write_string(buf, &self.name);
        match &self.value {
            GameRuleValue::Bool(v) => {
                VarUInt32(1).proto_encode(buf);
                buf.put_u8(*v as u8);
            }
            GameRuleValue::Int(v) => {
                VarUInt32(2).proto_encode(buf);
                VarUInt32(*v).proto_encode(buf);
            }
            GameRuleValue::Float(v) => {
                VarUInt32(3).proto_encode(buf);
                buf.put_f32_le(*v);
            }
        }
    }
}

impl ProtoDecode for GameRule {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        let name = read_string(buf)?;
        let type_id = VarUInt32::proto_decode(buf)?.0;
        let value = match type_id {
            1 => {
                ensure(buf, 1)?;
                GameRuleValue::Bool(buf.get_u8() != 0)
            }
            2 => GameRuleValue::Int(VarUInt32::proto_decode(buf)?.0),
            3 => {
                ensure(buf, 4)?;
                GameRuleValue::Float(buf.get_f32_le())
            }
            other => {
                return Err(ProtoError::InvalidData(format!(
                    "unknown game rule type {other}"
                )))
            }
        };
        Ok(Self { name, value })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StartGame {
    pub entity_unique_id: i64,
    pub entity_runtime_id: u64,
    pub player_game_mode: i32,
    pub position: Vec3,
    pub pitch: f32,
    pub yaw: f32,
    pub seed: i32,
    pub dimension: i32,
    pub generator: i32,
    pub world_game_mode: i32,
    pub difficulty: i32,
    pub spawn: BlockPos,
    pub achievements_disabled: bool,
    pub day_cycle_stop_time: i32,
    pub edu_mode: bool,
    pub rain_level: f32,
    pub lightning_level: f32,
    pub is_multiplayer: bool,
    pub broadcast_to_lan: bool,
    pub broadcast_to_xbl: bool,
    pub commands_enabled: bool,
    pub texture_packs_required: bool,
    pub game_rules: Vec<GameRule>,
    pub bonus_chest: bool,
    pub start_with_map: bool,
    pub trust_players: bool,
    pub default_permission: i32,
    pub xbl_broadcast_mode: i32,
    pub level_id: String,
    pub world_name: String,
    pub premium_world_template_id: String,
    pub is_trial: bool,
    pub current_tick: u64,
    pub enchantment_seed: i32,
}

impl ProtoEncode for StartGame {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        VarLong(self.entity_unique_id).proto_encode(buf);
        VarUInt64(self.entity_runtime_id).proto_encode(buf);
        VarInt(self.player_game_mode).proto_encode(buf);
        self.position.proto_encode(buf);
        buf.put_f32_le(self.pitch);
        buf.put_f32_le(self.yaw);
        VarInt(self.seed).proto_encode(buf);
        VarInt(self.dimension).proto_encode(buf);
        VarInt(self.generator).proto_encode(buf);
        VarInt(self.world_game_mode).proto_encode(buf);
        VarInt(self.difficulty).proto_encode(buf);
        self.spawn.proto_encode(buf);
        buf.put_u8(self.achievements_disabled as u8);
        VarInt(self.day_cycle_stop_time).proto_encode(buf);
        buf.put_u8(self.edu_mode as u8);
        buf.put_f32_le(self.rain_level);
        buf.put_f32_le(self.lightning_level);
        buf.put_u8(self.is_multiplayer as u8);
        buf.put_u8(self.broadcast_to_lan as u8);
        buf.put_u8(self.broadcast_to_xbl as u8);
        buf.put_u8(self.commands_enabled as u8);
        buf.put_u8(self.texture_packs_required as u8);
        VarUInt32(self.game_rules.len() as u32).proto_encode(buf);
        for rule in &self.game_rules {
            rule.proto_encode(buf);
        }
        buf.put_u8(self.bonus_chest as u8);
        buf.put_u8(self.start_with_map as u8);
        buf.put_u8(self.trust_players as u8);
        VarInt(self.default_permission).proto_encode(buf);
        VarInt(self.xbl_broadcast_mode).proto_encode(buf);
        write_string(buf, &self.level_id);
        write_string(buf, &self.world_name);
        write_string(buf, &self.premium_world_template_id);
        buf.put_u8(self.is_trial as u8);
        buf.put_u64_le(self.current_tick);
        VarInt(self.enchantment_seed).proto_encode(buf);
    }
}

impl ProtoDecode for StartGame {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        let entity_unique_id = VarLong::proto_decode(buf)?.0;
        let entity_runtime_id = VarUInt64::proto_decode(buf)?.0;
        let player_game_mode = VarInt::proto_decode(buf)?.0;
        let position = Vec3::proto_decode(buf)?;
        ensure(buf, 8)?;
        let pitch = buf.get_f32_le();
        let yaw = buf.get_f32_le();
        let seed = VarInt::proto_decode(buf)?.0;
        let dimension = VarInt::proto_decode(buf)?.0;
        let generator = VarInt::proto_decode(buf)?.0;
        let world_game_mode = VarInt::proto_decode(buf)?.0;
        let difficulty = VarInt::proto_decode(buf)?.0;
        let spawn = BlockPos::proto_decode(buf)?;
        ensure(buf, 1)?;
        let achievements_disabled = buf.get_u8() != 0;
        let day_cycle_stop_time = VarInt::proto_decode(buf)?.0;
        ensure(buf, 9)?;
        let edu_mode = buf.get_u8() != 0;
        let rain_level = buf.get_f32_le();
        let lightning_level = buf.get_f32_le();
        ensure(buf, 5)?;
        let is_multiplayer = buf.get_u8() != 0;
        let broadcast_to_lan = buf.get_u8() != 0;
        let broadcast_to_xbl = buf.get_u8() != 0;
        let commands_enabled = buf.get_u8() != 0;
        let texture_packs_required = buf.get_u8() != 0;
        let rule_count = VarUInt32::proto_decode(buf)?.0 as usize;
        let mut game_rules = Vec::with_capacity(rule_count.min(32));
        for _ in 0..rule_count {
            game_rules.push(GameRule::proto_decode(buf)?);
        }
        ensure(buf, 3)?;
        let bonus_chest = buf.get_u8() != 0;
        let start_with_map = buf.get_u8() != 0;
        let trust_players = buf.get_u8() != 0;
        let default_permission = VarInt::proto_decode(buf)?.0;
        let xbl_broadcast_mode = VarInt::proto_decode(buf)?.0;
        let level_id = read_string(buf)?;
        let world_name = read_string(buf)?;
        let premium_world_template_id = read_string(buf)?;
        ensure(buf, 9)?;
        let is_trial = buf.get_u8() != 0;
        let current_tick = buf.get_u64_le();
        let enchantment_seed = VarInt::proto_decode(buf)?.0;

        Ok(Self {
            entity_unique_id,
            entity_runtime_id,
            player_game_mode,
            position,
            pitch,
            yaw,
            seed,
            dimension,
            generator,
            world_game_mode,
            difficulty,
            spawn,
            achievements_disabled,
            day_cycle_stop_time,
            edu_mode,
            rain_level,
            lightning_level,
            is_multiplayer,
            broadcast_to_lan,
            broadcast_to_xbl,
            commands_enabled,
            texture_packs_required,
            game_rules,
            bonus_chest,
            start_with_map,
            trust_players,
            default_permission,
            xbl_broadcast_mode,
            level_id,
            world_name,
            premium_world_template_id,
            is_trial,
            current_tick,
            enchantment_seed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    fn sample() -> StartGame {
        StartGame {
            entity_unique_id: 1,
            entity_runtime_id: 1,
            player_game_mode: 0,
            position: Vec3::new(0.5, 65.0, 0.5),
            pitch: 0.0,
            yaw: 180.0,
            seed: 12345,
            dimension: 0,
            generator: 2,
            world_game_mode: 0,
            difficulty: 1,
            spawn: BlockPos::new(0, 64, 0),
            achievements_disabled: true,
            day_cycle_stop_time: -1,
            edu_mode: false,
            rain_level: 0.0,
            lightning_level: 0.0,
            is_multiplayer: true,
            broadcast_to_lan: true,
            broadcast_to_xbl: false,
            commands_enabled: true,
            texture_packs_required: false,
            game_rules: vec![
                GameRule {
                    name: "doDaylightCycle".into(),
                    value: GameRuleValue::Bool(true),
                },
                GameRule {
                    name: "randomTickSpeed".into(),
                    value: GameRuleValue::Int(3),
                },
            ],
            bonus_chest: false,
            start_with_map: false,
            trust_players: true,
            default_permission: 1,
            xbl_broadcast_mode: 0,
            level_id: "bluestone".into(),
            world_name: "world".into(),
            premium_world_template_id: String::new(),
            is_trial: false,
            current_tick: 0,
            enchantment_seed: 42,
        }
    }

    #[test]
    fn roundtrip() {
        let pkt = sample();
        let mut buf = BytesMut::new();
        pkt.proto_encode(&mut buf);
        assert_eq!(StartGame::proto_decode(&mut buf.freeze()).unwrap(), pkt);
    }

    #[test]
    fn roundtrip_is_bit_exact() {
        let pkt = sample();
        let mut buf = BytesMut::new();
        pkt.proto_encode(&mut buf);
        let bytes = buf.freeze();
        let decoded = StartGame::proto_decode(&mut bytes.clone()).unwrap();
        let mut reencoded = BytesMut::new();
        decoded.proto_encode(&mut reencoded);
        assert_eq!(reencoded.freeze(), bytes);
    }

    #[test]
    fn game_rule_float_roundtrip() {
        let rule = GameRule {
            name: "fallDamageScale".into(),
            value: GameRuleValue::Float(0.5),
        };
        let mut buf = BytesMut::new();
        rule.proto_encode(&mut buf);
        assert_eq!(GameRule::proto_decode(&mut buf.freeze()).unwrap(), rule);
    }
}
