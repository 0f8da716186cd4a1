//! Typed game packets for Bedrock protocol 160 (game version 1.2.7).

pub mod adventure_settings;
pub mod available_commands;
pub mod chunk_radius_updated;
pub mod command_request;
pub mod crafting_data;
pub mod disconnect;
pub mod full_chunk_data;
pub mod inventory_content;
pub mod inventory_slot;
pub mod login;
pub mod mob_equipment;
pub mod move_entity;
pub mod move_player;
pub mod play_status;
pub mod player_action;
pub mod player_list;
pub mod remove_entity;
pub mod request_chunk_radius;
pub mod resource_pack_client_response;
pub mod resource_pack_stack;
pub mod resource_packs_info;
pub mod set_time;
pub mod spawn;
pub mod start_game;
pub mod text;
pub mod update_attributes;
pub mod update_block;

pub use adventure_settings::AdventureSettings;
pub use available_commands::{AvailableCommands, CommandData, CommandEnum, CommandParameter};
pub use chunk_radius_updated::ChunkRadiusUpdated;
pub use command_request::{CommandOrigin, CommandRequest};
pub use crafting_data::CraftingData;
pub use disconnect::Disconnect;
pub use full_chunk_data::FullChunkData;
pub use inventory_content::InventoryContent;
pub use inventory_slot::InventorySlot;
pub use login::Login;
pub use mob_equipment::MobEquipment;
pub use move_entity::MoveEntity;
pub use move_player::{MoveMode, MovePlayer};
pub use play_status::{PlayStatus, PlayStatusType};
pub use player_action::{PlayerAction, PlayerActionType};
pub use player_list::{PlayerList, PlayerListEntry};
pub use remove_entity::RemoveEntity;
pub use request_chunk_radius::RequestChunkRadius;
pub use resource_pack_client_response::{ResourcePackClientResponse, ResourcePackStatus};
pub use resource_pack_stack::ResourcePackStack;
pub use resource_packs_info::ResourcePacksInfo;
pub use set_time::SetTime;
pub use spawn::{AddEntity, AddPlayer, EntityAttribute};
pub use start_game::{GameRule, GameRuleValue, StartGame};
pub use text::{Text, TextType};
pub use update_attributes::{Attribute, UpdateAttributes};
pub use update_block::UpdateBlock;

/// Bedrock network protocol version this crate speaks.
pub const PROTOCOL_VERSION: i32 = 160;

/// Matching game version string.
pub const GAME_VERSION: &str = "1.2.7";

/// Game packet ids (the VarUInt32 leading each batch record).
pub mod id {
    pub const LOGIN: u32 = 0x01;
    pub const PLAY_STATUS: u32 = 0x02;
    pub const DISCONNECT: u32 = 0x05;
    pub const RESOURCE_PACKS_INFO: u32 = 0x06;
    pub const RESOURCE_PACK_STACK: u32 = 0x07;
    pub const RESOURCE_PACK_CLIENT_RESPONSE: u32 = 0x08;
    pub const TEXT: u32 = 0x09;
    pub const SET_TIME: u32 = 0x0A;
    pub const START_GAME: u32 = 0x0B;
    pub const ADD_PLAYER: u32 = 0x0C;
    pub const ADD_ENTITY: u32 = 0x0D;
    pub const REMOVE_ENTITY: u32 = 0x0E;
    pub const MOVE_ENTITY: u32 = 0x12;
    pub const MOVE_PLAYER: u32 = 0x13;
    pub const UPDATE_BLOCK: u32 = 0x15;
    pub const UPDATE_ATTRIBUTES: u32 = 0x1D;
    pub const MOB_EQUIPMENT: u32 = 0x1F;
    pub const PLAYER_ACTION: u32 = 0x24;
    pub const INVENTORY_CONTENT: u32 = 0x31;
    pub const INVENTORY_SLOT: u32 = 0x32;
    pub const CRAFTING_DATA: u32 = 0x34;
    pub const ADVENTURE_SETTINGS: u32 = 0x37;
    pub const FULL_CHUNK_DATA: u32 = 0x3A;
    pub const PLAYER_LIST: u32 = 0x3F;
    pub const REQUEST_CHUNK_RADIUS: u32 = 0x45;
    pub const CHUNK_RADIUS_UPDATED: u32 = 0x46;
    pub const AVAILABLE_COMMANDS: u32 = 0x4C;
    pub const COMMAND_REQUEST: u32 = 0x4D;
}
