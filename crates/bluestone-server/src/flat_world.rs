//! A self-contained flat world: enough simulation for the network core
//! to be exercised end to end. Real world generation, inventories, and
//! command semantics live outside this crate.

use std::collections::{HashMap, VecDeque};

use bytes::{BufMut, Bytes, BytesMut};
use tracing::debug;

use bluestone_proto::packets::AdventureSettings;
use bluestone_proto::types::{BlockPos, Vec3};

use crate::world::{Action, Difficulty, Event, GameMode, World, WorldError};

/// Stone floor height of the flat terrain.
const FLOOR_HEIGHT: i32 = 4;

/// Eye offset above the feet.
const EYE_HEIGHT: f32 = 1.62;

pub struct FlatWorld {
    seed: i32,
    game_mode: GameMode,
    difficulty: Difficulty,
    world_name: String,
    time: i32,
    events: VecDeque<Event>,
    entities: HashMap<u64, (String, Vec3)>,
    /// Player-made block changes, overlaid on the flat terrain.
    block_overrides: HashMap<BlockPos, (u32, u32)>,
    chunk_payload: Bytes,
    /// Runtime ids for world-spawned entities, above the player range.
    next_mob_id: u64,
}

impl FlatWorld {
    pub fn new(
        seed: i32,
        game_mode: GameMode,
        difficulty: Difficulty,
        world_name: impl Into<String>,
    ) -> Self {
        Self {
            seed,
            game_mode,
            difficulty,
            world_name: world_name.into(),
            time: 0,
            events: VecDeque::new(),
            entities: HashMap::new(),
            block_overrides: HashMap::new(),
            chunk_payload: flat_chunk_payload(),
            next_mob_id: 0x1000,
        }
    }

    /// Number of entities currently tracked (tests use this).
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }
}

impl World for FlatWorld {
    fn perform(&mut self, action: Action) -> Result<(), WorldError> {
        match action {
            Action::Login {
                entity_runtime_id,
                name,
            } => {
                let position = self.spawn_position();
                self.entities.insert(entity_runtime_id, (name, position));
                self.events.push_back(Event::PlayerLogged { entity_runtime_id });
                self.events.push_back(Event::PlayerSpawned {
                    entity_runtime_id,
                    position,
                });
            }
            Action::Logout { entity_runtime_id } => {
                self.entities.remove(&entity_runtime_id);
                self.events
                    .push_back(Event::EntityRemoved { entity_runtime_id });
            }
            Action::Move {
                entity_runtime_id,
                position,
                pitch,
                yaw,
                head_yaw,
                on_ground,
            } => {
                let Some(entity) = self.entities.get_mut(&entity_runtime_id) else {
                    return Err(WorldError(format!(
                        "move for unknown entity {entity_runtime_id}"
                    )));
                };
                entity.1 = position;
                self.events.push_back(Event::EntityMoved {
                    entity_runtime_id,
                    position,
                    pitch,
                    yaw,
                    head_yaw,
                    on_ground,
                });
            }
            Action::BreakBlock { position, .. } => {
                if matches!(self.block_overrides.get(&position), Some((0, _))) {
                    return Err(WorldError(format!("no block to break at {position:?}")));
                }
                self.block_overrides.insert(position, (0, 0));
                self.events.push_back(Event::BlockUpdated {
                    position,
                    block_id: 0,
                    block_metadata: 0,
                });
            }
            Action::PutItem {
                entity_runtime_id,
                position,
                face,
                item,
            } => {
                let placed = offset_by_face(position, face);
                let block_id = item.id.max(0) as u32;
                self.block_overrides
                    .insert(placed, (block_id, item.metadata as u32));
                self.events.push_back(Event::BlockUpdated {
                    position: placed,
                    block_id,
                    block_metadata: item.metadata as u32,
                });
                self.events.push_back(Event::InventoryUpdated {
                    entity_runtime_id,
                    slot: 0,
                    item,
                });
            }
            Action::SendText { sender, message } => {
                self.events.push_back(Event::TextShown { sender, message });
            }
            Action::RunCommand {
                entity_runtime_id,
                command,
            } => {
                debug!("command from entity {entity_runtime_id}: {command}");
                match command.trim_start_matches('/').split_once(' ') {
                    Some(("say", rest)) => {
                        self.events.push_back(Event::TextShown {
                            sender: String::new(),
                            message: rest.to_owned(),
                        });
                    }
                    Some(("summon", _)) => {
                        let mob_id = self.next_mob_id;
                        self.next_mob_id += 1;
                        let position = self.spawn_position();
                        self.entities
                            .insert(mob_id, ("minecraft:chicken".into(), position));
                        self.events.push_back(Event::EntitySpawned {
                            entity_runtime_id: mob_id,
                            entity_type: 10, // chicken
                            position,
                        });
                    }
                    _ => {
                        self.events.push_back(Event::TextShown {
                            sender: String::new(),
                            message: format!("Unknown command: {command}"),
                        });
                    }
                }
            }
            Action::RequestChunk { position } => {
                self.events.push_back(Event::ChunkLoaded {
                    position,
                    data: self.chunk_payload.clone(),
                });
            }
        }
        Ok(())
    }

    fn poll_event(&mut self) -> Option<Event> {
        self.events.pop_front()
    }

    fn seed(&self) -> i32 {
        self.seed
    }

    fn game_mode(&self) -> GameMode {
        self.game_mode
    }

    fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    fn rain_level(&self) -> f32 {
        0.0
    }

    fn lightning_level(&self) -> f32 {
        0.0
    }

    fn world_name(&self) -> String {
        self.world_name.clone()
    }

    fn time(&self) -> i32 {
        self.time
    }

    fn adventure_settings(&self) -> AdventureSettings {
        AdventureSettings {
            flags: 0x20, // auto-jump
            command_permission: 0,
            flags2: 0xFFFF,
            player_permission: 1,
            custom_flags: 0,
            user_id: 0,
        }
    }

    fn recipe_blob(&self) -> Bytes {
        // Zero recipes, clean-recipes flag set.
        Bytes::from_static(&[0x00, 0x01])
    }

    fn spawn_position(&self) -> Vec3 {
        Vec3::new(0.5, FLOOR_HEIGHT as f32 + EYE_HEIGHT, 0.5)
    }
}

fn offset_by_face(pos: BlockPos, face: i32) -> BlockPos {
    match face {
        0 => BlockPos::new(pos.x, pos.y - 1, pos.z),
        1 => BlockPos::new(pos.x, pos.y + 1, pos.z),
        2 => BlockPos::new(pos.x, pos.y, pos.z - 1),
        3 => BlockPos::new(pos.x, pos.y, pos.z + 1),
        4 => BlockPos::new(pos.x - 1, pos.y, pos.z),
        _ => BlockPos::new(pos.x + 1, pos.y, pos.z),
    }
}

/// One serialized flat chunk column: a single sub-chunk of bedrock,
/// dirt and grass, then the per-column height and biome tables.
fn flat_chunk_payload() -> Bytes {
    let mut blocks = [0u8; 4096]; // sub-chunk block ids, x-z-y order
    for x in 0..16 {
        for z in 0..16 {
            let column = (x * 16 + z) * 16;
            blocks[column] = 7; // bedrock
            blocks[column + 1] = 3; // dirt
            blocks[column + 2] = 3;
            blocks[column + 3] = 2; // grass
        }
    }

    let mut buf = BytesMut::with_capacity(1 + 1 + 4096 + 2048 + 512 + 256 + 2);
    buf.put_u8(1); // sub-chunk count
    buf.put_u8(0); // sub-chunk storage version
    buf.put_slice(&blocks);
    buf.put_slice(&[0u8; 2048]); // block data nibbles
    for _ in 0..256 {
        buf.put_u16_le(FLOOR_HEIGHT as u16); // height map
    }
    buf.put_slice(&[1u8; 256]); // biome ids (plains)
    buf.put_u8(0); // border block count
    buf.put_u8(0); // block entity count
    buf.freeze()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bluestone_proto::item::ItemStack;
    use bluestone_proto::types::ChunkPos;

    fn world() -> FlatWorld {
        FlatWorld::new(12345, GameMode::Survival, Difficulty::Normal, "world")
    }

    #[test]
    fn login_tracks_entity_and_emits_event() {
        let mut w = world();
        w.perform(Action::Login {
            entity_runtime_id: 1,
            name: "Steve".into(),
        })
        .unwrap();
        assert_eq!(w.entity_count(), 1);
        assert!(matches!(
            w.poll_event(),
            Some(Event::PlayerLogged {
                entity_runtime_id: 1
            })
        ));
        assert!(matches!(
            w.poll_event(),
            Some(Event::PlayerSpawned {
                entity_runtime_id: 1,
                ..
            })
        ));
        assert!(w.poll_event().is_none());
    }

    #[test]
    fn summon_spawns_a_mob() {
        let mut w = world();
        w.perform(Action::RunCommand {
            entity_runtime_id: 1,
            command: "/summon chicken".into(),
        })
        .unwrap();
        match w.poll_event() {
            Some(Event::EntitySpawned {
                entity_runtime_id,
                entity_type,
                ..
            }) => {
                assert!(entity_runtime_id >= 0x1000);
                assert_eq!(entity_type, 10);
            }
            other => panic!("expected EntitySpawned, got {other:?}"),
        }
        assert_eq!(w.entity_count(), 1);
    }

    #[test]
    fn move_echoes_entity_moved() {
        let mut w = world();
        w.perform(Action::Login {
            entity_runtime_id: 1,
            name: "Steve".into(),
        })
        .unwrap();
        while w.poll_event().is_some() {}

        w.perform(Action::Move {
            entity_runtime_id: 1,
            position: Vec3::new(1.0, 2.0, 3.0),
            pitch: 0.0,
            yaw: 0.0,
            head_yaw: 0.0,
            on_ground: true,
        })
        .unwrap();
        match w.poll_event() {
            Some(Event::EntityMoved { position, .. }) => {
                assert_eq!(position, Vec3::new(1.0, 2.0, 3.0));
            }
            other => panic!("expected EntityMoved, got {other:?}"),
        }
    }

    #[test]
    fn move_of_unknown_entity_fails() {
        let mut w = world();
        assert!(w
            .perform(Action::Move {
                entity_runtime_id: 99,
                position: Vec3::ZERO,
                pitch: 0.0,
                yaw: 0.0,
                head_yaw: 0.0,
                on_ground: true,
            })
            .is_err());
    }

    #[test]
    fn chunk_request_loads_chunk() {
        let mut w = world();
        w.perform(Action::RequestChunk {
            position: ChunkPos::new(2, -3),
        })
        .unwrap();
        match w.poll_event() {
            Some(Event::ChunkLoaded { position, data }) => {
                assert_eq!(position, ChunkPos::new(2, -3));
                assert!(!data.is_empty());
            }
            other => panic!("expected ChunkLoaded, got {other:?}"),
        }
    }

    #[test]
    fn break_block_updates_to_air() {
        let mut w = world();
        w.perform(Action::BreakBlock {
            entity_runtime_id: 1,
            position: BlockPos::new(1, 3, 1),
        })
        .unwrap();
        match w.poll_event() {
            Some(Event::BlockUpdated { block_id, .. }) => assert_eq!(block_id, 0),
            other => panic!("expected BlockUpdated, got {other:?}"),
        }
    }

    #[test]
    fn put_item_places_adjacent() {
        let mut w = world();
        w.perform(Action::PutItem {
            entity_runtime_id: 1,
            position: BlockPos::new(0, 3, 0),
            face: 1,
            item: ItemStack::new(5, 1),
        })
        .unwrap();
        match w.poll_event() {
            Some(Event::BlockUpdated {
                position, block_id, ..
            }) => {
                assert_eq!(position, BlockPos::new(0, 4, 0));
                assert_eq!(block_id, 5);
            }
            other => panic!("expected BlockUpdated, got {other:?}"),
        }
        assert!(matches!(w.poll_event(), Some(Event::InventoryUpdated { .. })));
    }

    #[test]
    fn say_command_echoes_text() {
        let mut w = world();
        w.perform(Action::RunCommand {
            entity_runtime_id: 1,
            command: "/say hello there".into(),
        })
        .unwrap();
        match w.poll_event() {
            Some(Event::TextShown { message, .. }) => assert_eq!(message, "hello there"),
            other => panic!("expected TextShown, got {other:?}"),
        }
    }

    #[test]
    fn unknown_command_reports_error_text() {
        let mut w = world();
        w.perform(Action::RunCommand {
            entity_runtime_id: 1,
            command: "/frobnicate".into(),
        })
        .unwrap();
        match w.poll_event() {
            Some(Event::TextShown { message, .. }) => {
                assert!(message.starts_with("Unknown command"));
            }
            other => panic!("expected TextShown, got {other:?}"),
        }
    }
}
