//! The world collaborator interface: decoded player intentions go down
//! as actions, world changes come back up as events, and a handful of
//! snapshot accessors feed the spawn prelude.

use bytes::Bytes;
use thiserror::Error;

use bluestone_proto::item::ItemStack;
use bluestone_proto::packets::AdventureSettings;
use bluestone_proto::types::{BlockPos, ChunkPos, Vec3};

#[derive(Debug, Error)]
#[error("world error: {0}")]
pub struct WorldError(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum GameMode {
    Survival = 0,
    Creative = 1,
    Adventure = 2,
}

impl GameMode {
    pub fn from_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "creative" => Self::Creative,
            "adventure" => Self::Adventure,
            _ => Self::Survival,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Difficulty {
    Peaceful = 0,
    Easy = 1,
    Normal = 2,
    Hard = 3,
}

impl Difficulty {
    pub fn from_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "peaceful" => Self::Peaceful,
            "easy" => Self::Easy,
            "hard" => Self::Hard,
            _ => Self::Normal,
        }
    }
}

/// A decoded user intention, submitted fire-and-forget. Confirmation
/// arrives as one or more events.
#[derive(Debug, Clone)]
pub enum Action {
    Login {
        entity_runtime_id: u64,
        name: String,
    },
    Logout {
        entity_runtime_id: u64,
    },
    Move {
        entity_runtime_id: u64,
        position: Vec3,
        pitch: f32,
        yaw: f32,
        head_yaw: f32,
        on_ground: bool,
    },
    BreakBlock {
        entity_runtime_id: u64,
        position: BlockPos,
    },
    PutItem {
        entity_runtime_id: u64,
        position: BlockPos,
        face: i32,
        item: ItemStack,
    },
    SendText {
        sender: String,
        message: String,
    },
    RunCommand {
        entity_runtime_id: u64,
        command: String,
    },
    RequestChunk {
        position: ChunkPos,
    },
}

/// One observable world change.
#[derive(Debug, Clone)]
pub enum Event {
    ChunkLoaded {
        position: ChunkPos,
        data: Bytes,
    },
    EntityMoved {
        entity_runtime_id: u64,
        position: Vec3,
        pitch: f32,
        yaw: f32,
        head_yaw: f32,
        on_ground: bool,
    },
    EntitySpawned {
        entity_runtime_id: u64,
        entity_type: u32,
        position: Vec3,
    },
    EntityRemoved {
        entity_runtime_id: u64,
    },
    BlockUpdated {
        position: BlockPos,
        block_id: u32,
        block_metadata: u32,
    },
    InventoryUpdated {
        entity_runtime_id: u64,
        slot: u32,
        item: ItemStack,
    },
    TextShown {
        sender: String,
        message: String,
    },
    PlayerLogged {
        entity_runtime_id: u64,
    },
    PlayerSpawned {
        entity_runtime_id: u64,
        position: Vec3,
    },
}

/// The world simulation as seen from the network layer. Every method is
/// cooperative: none may block. Events are drained with `poll_event`
/// until it returns `None`, once per tick.
pub trait World: Send {
    fn perform(&mut self, action: Action) -> Result<(), WorldError>;

    fn poll_event(&mut self) -> Option<Event>;

    // Snapshot accessors for the spawn prelude.
    fn seed(&self) -> i32;
    fn game_mode(&self) -> GameMode;
    fn difficulty(&self) -> Difficulty;
    fn rain_level(&self) -> f32;
    fn lightning_level(&self) -> f32;
    fn world_name(&self) -> String;
    fn time(&self) -> i32;
    fn adventure_settings(&self) -> AdventureSettings;
    fn recipe_blob(&self) -> Bytes;
    fn spawn_position(&self) -> Vec3;
}
