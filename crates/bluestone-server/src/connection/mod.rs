//! Per-client game protocol state: login, resource-pack negotiation,
//! spawn, and in-game packet relay on top of the RakNet transport.

mod login;
mod play;
mod spawn;

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, warn};

use bluestone_proto::batch::{decode_batch, encode_record, split_record, BatchConfig};
use bluestone_proto::codec::ProtoEncode;
use bluestone_proto::packets::{id, Text};
use bluestone_proto::types::{ChunkPos, Uuid, Vec3};
use bluestone_raknet::{RakNetEvent, ServerHandle};

use crate::config::ServerConfig;
use crate::queue::{send_batch, BatchQueue, Delivery};
use crate::world::{Action, World};

/// Where a client is in the join flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    AwaitingLogin,
    AwaitingResourceResponse { stack_sent: bool },
    AwaitingChunkRadius,
    Spawned,
    Disconnected,
}

/// Per-client connection state.
pub struct PlayerConnection {
    pub state: PlayerState,
    pub name: String,
    pub uuid: Uuid,
    pub entity_unique_id: i64,
    pub entity_runtime_id: u64,
    pub position: Vec3,
    pub chunk_radius: i32,
    /// Chunks requested from the world but not yet sent to the client.
    pub pending_chunks: HashSet<ChunkPos>,
}

/// Dispatches transport events to per-client state machines and pumps
/// world events back out as game packets.
pub struct ConnectionHandler<W: World> {
    connections: HashMap<SocketAddr, PlayerConnection>,
    server_handle: ServerHandle,
    world: W,
    config: Arc<ServerConfig>,
    queue: BatchQueue,
    batch_config: BatchConfig,
    next_entity_id: u64,
}

impl<W: World> ConnectionHandler<W> {
    pub fn new(server_handle: ServerHandle, world: W, config: Arc<ServerConfig>) -> Self {
        let batch_config = BatchConfig {
            compress_threshold: config.batch_compress_threshold,
        };
        Self {
            connections: HashMap::new(),
            server_handle,
            world,
            config,
            queue: BatchQueue::new(),
            batch_config,
            next_entity_id: 1,
        }
    }

    /// Players that have finished the join flow.
    pub fn online_count(&self) -> usize {
        self.connections
            .values()
            .filter(|c| c.state == PlayerState::Spawned)
            .count()
    }

    /// Process one transport event, then everything it caused.
    pub async fn handle_event(&mut self, event: RakNetEvent) {
        match event {
            RakNetEvent::SessionConnected { addr, guid } => {
                self.handle_session_connected(addr, guid);
            }
            RakNetEvent::SessionDisconnected { addr } => {
                self.handle_session_disconnected(addr).await;
            }
            RakNetEvent::Packet { addr, payload } => {
                self.handle_packet(addr, payload).await;
            }
        }
        self.queue.flush(&self.server_handle, &self.batch_config).await;
        self.pump_world_events().await;
        self.queue.flush(&self.server_handle, &self.batch_config).await;
    }

    /// Periodic work: drain world events and flush outbound batches.
    pub async fn game_tick(&mut self) {
        self.pump_world_events().await;
        self.queue.flush(&self.server_handle, &self.batch_config).await;
    }

    // -------------------------------------------------------------------
    // Inbound dispatch
    // -------------------------------------------------------------------

    async fn handle_packet(&mut self, addr: SocketAddr, payload: Bytes) {
        if !self.connections.contains_key(&addr) {
            debug!("game payload from untracked address {addr}");
            return;
        }

        let records = match decode_batch(&payload) {
            Ok(records) => records,
            Err(e) => {
                debug!("bad batch from {addr}: {e}");
                return;
            }
        };

        for record in records {
            let (packet_id, body) = match split_record(record) {
                Ok(parts) => parts,
                Err(e) => {
                    debug!("bad record from {addr}: {e}");
                    continue;
                }
            };
            self.dispatch_game_packet(addr, packet_id, body).await;
        }
    }

    /// The tag-to-handler table. Decode failures and packets that do not
    /// fit the session state are logged and dropped; neither is fatal.
    async fn dispatch_game_packet(&mut self, addr: SocketAddr, packet_id: u32, body: Bytes) {
        match packet_id {
            id::LOGIN => self.handle_login(addr, body).await,
            id::RESOURCE_PACK_CLIENT_RESPONSE => {
                self.handle_resource_pack_response(addr, body).await
            }
            id::REQUEST_CHUNK_RADIUS => self.handle_chunk_radius(addr, body),
            id::MOVE_PLAYER => self.handle_move_player(addr, body),
            id::PLAYER_ACTION => self.handle_player_action(addr, body),
            id::TEXT => self.handle_text(addr, body),
            id::COMMAND_REQUEST => self.handle_command_request(addr, body),
            other => {
                debug!("unhandled game packet 0x{other:02X} from {addr}");
            }
        }
    }

    // -------------------------------------------------------------------
    // Outbound helpers
    // -------------------------------------------------------------------

    /// Queue a packet for the next flush, reliable ordered.
    pub(crate) fn queue_packet(&mut self, addr: SocketAddr, packet_id: u32, packet: &impl ProtoEncode) {
        self.queue_packet_with(addr, Delivery::DEFAULT, packet_id, packet);
    }

    pub(crate) fn queue_packet_with(
        &mut self,
        addr: SocketAddr,
        delivery: Delivery,
        packet_id: u32,
        packet: &impl ProtoEncode,
    ) {
        self.queue.push(addr, delivery, encode_record(packet_id, packet));
    }

    /// Encode and submit one packet as its own batch, bypassing the
    /// queue. Used where batch boundaries matter (login replies) or the
    /// payload is large (chunk columns).
    pub(crate) async fn send_packet_now(
        &self,
        addr: SocketAddr,
        packet_id: u32,
        packet: &impl ProtoEncode,
    ) {
        let record = encode_record(packet_id, packet);
        send_batch(
            &self.server_handle,
            addr,
            std::slice::from_ref(&record),
            Delivery::DEFAULT,
            &self.batch_config,
        )
        .await;
    }

    /// Queue a packet to every spawned player.
    pub(crate) fn broadcast(&mut self, delivery: Delivery, packet_id: u32, packet: &impl ProtoEncode) {
        let record = encode_record(packet_id, packet);
        for addr in self.spawned_addrs() {
            self.queue.push(addr, delivery, record.clone());
        }
    }

    pub(crate) fn spawned_addrs(&self) -> Vec<SocketAddr> {
        self.connections
            .iter()
            .filter(|(_, c)| c.state == PlayerState::Spawned)
            .map(|(&addr, _)| addr)
            .collect()
    }

    pub(crate) fn find_addr_by_runtime_id(&self, runtime_id: u64) -> Option<SocketAddr> {
        self.connections
            .iter()
            .find(|(_, c)| c.entity_runtime_id == runtime_id)
            .map(|(&addr, _)| addr)
    }

    pub(crate) fn allocate_entity_id(&mut self) -> u64 {
        let id = self.next_entity_id;
        self.next_entity_id += 1;
        id
    }

    /// Submit an action; a collaborator failure becomes a system chat
    /// message to the originating client rather than a crash.
    pub(crate) fn perform_checked(&mut self, origin: Option<SocketAddr>, action: Action) {
        if let Err(e) = self.world.perform(action) {
            warn!("world rejected action: {e}");
            if let Some(addr) = origin {
                self.queue_packet(addr, id::TEXT, &Text::system(format!("{e}")));
            }
        }
    }
}

// Packet construction shared by the sub-modules lives in `spawn` and
// `play`; tests drive the whole state machine through `handle_event`.
