//! The spawn prelude and chunk streaming: everything between resource
//! negotiation and the player standing in the world.

use std::net::SocketAddr;

use bytes::Bytes;
use tracing::{debug, info};

use bluestone_proto::codec::ProtoDecode;
use bluestone_proto::item::ItemStack;
use bluestone_proto::metadata::default_metadata;
use bluestone_proto::packets::inventory_content::window;
use bluestone_proto::packets::{
    id, AddPlayer, Attribute, AvailableCommands, ChunkRadiusUpdated, CraftingData,
    InventoryContent, InventorySlot, MobEquipment, PlayStatus, PlayStatusType, PlayerList,
    PlayerListEntry, RequestChunkRadius, SetTime, StartGame, UpdateAttributes,
};
use bluestone_proto::types::{BlockPos, ChunkPos, Vec3};

use super::{ConnectionHandler, PlayerState};
use crate::world::{Action, World};

/// View distances the server will honor.
const MIN_CHUNK_RADIUS: i32 = 1;
const MAX_CHUNK_RADIUS: i32 = 32;

impl<W: World> ConnectionHandler<W> {
    /// Everything the client needs before it can ask for chunks, queued
    /// in protocol order as one reliable run.
    pub(super) fn send_spawn_prelude(&mut self, addr: SocketAddr) {
        let Some(conn) = self.connections.get(&addr) else {
            return;
        };
        let entity_unique_id = conn.entity_unique_id;
        let entity_runtime_id = conn.entity_runtime_id;
        let position = conn.position;
        let name = conn.name.clone();
        let uuid = conn.uuid;

        let world_name = self.world.world_name();
        let time = self.world.time();
        let game_mode = self.world.game_mode() as i32;

        let start_game = StartGame {
            entity_unique_id,
            entity_runtime_id,
            player_game_mode: game_mode,
            position,
            pitch: 0.0,
            yaw: 0.0,
            seed: self.world.seed(),
            dimension: 0,
            generator: 2,
            world_game_mode: game_mode,
            difficulty: self.world.difficulty() as i32,
            spawn: BlockPos::new(
                position.x.floor() as i32,
                position.y.floor() as i32,
                position.z.floor() as i32,
            ),
            achievements_disabled: true,
            day_cycle_stop_time: -1,
            edu_mode: false,
            rain_level: self.world.rain_level(),
            lightning_level: self.world.lightning_level(),
            is_multiplayer: true,
            broadcast_to_lan: true,
            broadcast_to_xbl: false,
            commands_enabled: true,
            texture_packs_required: false,
            game_rules: Vec::new(),
            bonus_chest: false,
            start_with_map: false,
            trust_players: true,
            default_permission: 1,
            xbl_broadcast_mode: 0,
            level_id: world_name.clone(),
            world_name,
            premium_world_template_id: String::new(),
            is_trial: false,
            current_tick: time.max(0) as u64,
            enchantment_seed: self.world.seed(),
        };

        // Roster: the joining player first, then everyone already here.
        let mut entries = vec![PlayerListEntry::bare(uuid, entity_unique_id, name.clone())];
        for other in self.connections.values() {
            if other.state == PlayerState::Spawned {
                entries.push(PlayerListEntry::bare(
                    other.uuid,
                    other.entity_unique_id,
                    other.name.clone(),
                ));
            }
        }

        let adventure_settings = self.world.adventure_settings();
        let recipe_data = self.world.recipe_blob();

        self.queue_packet(addr, id::START_GAME, &start_game);
        self.queue_packet(addr, id::SET_TIME, &SetTime { time });
        self.queue_packet(
            addr,
            id::UPDATE_ATTRIBUTES,
            &UpdateAttributes {
                entity_runtime_id,
                attributes: Attribute::defaults(),
            },
        );
        self.queue_packet(addr, id::AVAILABLE_COMMANDS, &AvailableCommands::defaults());
        self.queue_packet(addr, id::ADVENTURE_SETTINGS, &adventure_settings);
        self.queue_packet(
            addr,
            id::INVENTORY_CONTENT,
            &InventoryContent::empty(window::INVENTORY, 36),
        );
        self.queue_packet(
            addr,
            id::INVENTORY_CONTENT,
            &InventoryContent::empty(window::ARMOR, 4),
        );
        self.queue_packet(
            addr,
            id::MOB_EQUIPMENT,
            &MobEquipment {
                entity_runtime_id,
                item: ItemStack::empty(),
                inventory_slot: 0,
                hotbar_slot: 0,
                window_id: 0,
            },
        );
        self.queue_packet(
            addr,
            id::INVENTORY_SLOT,
            &InventorySlot {
                window_id: window::INVENTORY,
                slot: 0,
                item: ItemStack::empty(),
            },
        );
        self.queue_packet(addr, id::CRAFTING_DATA, &CraftingData { recipe_data });
        self.queue_packet(addr, id::PLAYER_LIST, &PlayerList::Add(entries));
    }

    /// View-distance negotiation, then one chunk request per column in
    /// range. The columns stream back as ChunkLoaded events.
    pub(super) fn handle_chunk_radius(&mut self, addr: SocketAddr, body: Bytes) {
        let Some(conn) = self.connections.get(&addr) else {
            return;
        };
        let request = match RequestChunkRadius::proto_decode(&mut body.clone()) {
            Ok(request) => request,
            Err(e) => {
                debug!("undecodable chunk radius request from {addr}: {e}");
                return;
            }
        };
        let radius = request.radius.clamp(MIN_CHUNK_RADIUS, MAX_CHUNK_RADIUS);

        if conn.state != PlayerState::AwaitingChunkRadius {
            // Renegotiation after spawn only adjusts the accepted value.
            debug!(
                "chunk radius {radius} from {addr} in state {:?}",
                conn.state
            );
            self.queue_packet(addr, id::CHUNK_RADIUS_UPDATED, &ChunkRadiusUpdated { radius });
            return;
        }

        let center = ChunkPos::new(
            (conn.position.x.floor() as i32) >> 4,
            (conn.position.z.floor() as i32) >> 4,
        );
        let mut columns = Vec::with_capacity(((2 * radius + 1) * (2 * radius + 1)) as usize);
        for dx in -radius..=radius {
            for dz in -radius..=radius {
                columns.push(ChunkPos::new(center.x + dx, center.z + dz));
            }
        }
        columns.sort_by_key(|c| c.distance(&center));

        let Some(conn) = self.connections.get_mut(&addr) else {
            return;
        };
        conn.chunk_radius = radius;
        conn.pending_chunks = columns.iter().copied().collect();

        self.queue_packet(addr, id::CHUNK_RADIUS_UPDATED, &ChunkRadiusUpdated { radius });
        for column in columns {
            self.perform_checked(Some(addr), Action::RequestChunk { position: column });
        }
    }

    /// Every requested chunk has been sent: mark the player spawned and
    /// introduce them to the rest of the server.
    pub(super) async fn finish_spawn(&mut self, addr: SocketAddr) {
        self.send_packet_now(
            addr,
            id::PLAY_STATUS,
            &PlayStatus {
                status: PlayStatusType::PlayerSpawn,
            },
        )
        .await;

        let Some(conn) = self.connections.get_mut(&addr) else {
            return;
        };
        conn.state = PlayerState::Spawned;
        let name = conn.name.clone();
        let uuid = conn.uuid;
        let entity_unique_id = conn.entity_unique_id;
        let entity_runtime_id = conn.entity_runtime_id;
        let position = conn.position;
        info!("{name} spawned at {position} (view distance {})", conn.chunk_radius);

        // Announce the newcomer to everyone else.
        let add_packet = AddPlayer {
            uuid,
            user_name: name.clone(),
            entity_unique_id,
            entity_runtime_id,
            position,
            motion: Vec3::ZERO,
            pitch: 0.0,
            head_yaw: 0.0,
            yaw: 0.0,
            held_item: ItemStack::empty(),
            metadata: default_metadata(&name),
        };
        let list_packet = PlayerList::Add(vec![PlayerListEntry::bare(
            uuid,
            entity_unique_id,
            name.clone(),
        )]);
        for other in self.spawned_addrs() {
            if other != addr {
                self.queue_packet(other, id::PLAYER_LIST, &list_packet);
                self.queue_packet(other, id::ADD_PLAYER, &add_packet);
            }
        }

        // And everyone already here to the newcomer.
        let others: Vec<AddPlayer> = self
            .connections
            .values()
            .filter(|c| c.state == PlayerState::Spawned && c.entity_runtime_id != entity_runtime_id)
            .map(|c| AddPlayer {
                uuid: c.uuid,
                user_name: c.name.clone(),
                entity_unique_id: c.entity_unique_id,
                entity_runtime_id: c.entity_runtime_id,
                position: c.position,
                motion: Vec3::ZERO,
                pitch: 0.0,
                head_yaw: 0.0,
                yaw: 0.0,
                held_item: ItemStack::empty(),
                metadata: default_metadata(&c.name),
            })
            .collect();
        for other in others {
            self.queue_packet(addr, id::ADD_PLAYER, &other);
        }
    }
}
