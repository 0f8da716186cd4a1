//! In-game traffic: inbound packets become world actions, world events
//! become outbound packets.

use std::net::SocketAddr;

use bytes::Bytes;
use tracing::{debug, trace};

use bluestone_proto::codec::ProtoDecode;
use bluestone_proto::item::ItemStack;
use bluestone_proto::metadata::default_metadata;
use bluestone_proto::packets::inventory_content::window;
use bluestone_proto::packets::{
    id, AddEntity, CommandRequest, EntityAttribute, FullChunkData, InventorySlot, MoveEntity,
    MovePlayer, PlayerAction, PlayerActionType, RemoveEntity, Text, TextType, UpdateBlock,
};
use bluestone_proto::packets::move_entity::rotation_to_byte;
use bluestone_proto::types::Vec3;

use super::{ConnectionHandler, PlayerState};
use crate::queue::Delivery;
use crate::world::{Action, Event, World};

impl<W: World> ConnectionHandler<W> {
    // -------------------------------------------------------------------
    // Inbound
    // -------------------------------------------------------------------

    fn spawned_runtime_id(&self, addr: SocketAddr, what: &str) -> Option<u64> {
        match self.connections.get(&addr) {
            Some(conn) if conn.state == PlayerState::Spawned => Some(conn.entity_runtime_id),
            Some(conn) => {
                debug!("{what} from {addr} in state {:?}, dropped", conn.state);
                None
            }
            None => None,
        }
    }

    pub(super) fn handle_move_player(&mut self, addr: SocketAddr, body: Bytes) {
        let Some(entity_runtime_id) = self.spawned_runtime_id(addr, "MOVE_PLAYER") else {
            return;
        };
        let packet = match MovePlayer::proto_decode(&mut body.clone()) {
            Ok(packet) => packet,
            Err(e) => {
                debug!("undecodable MOVE_PLAYER from {addr}: {e}");
                return;
            }
        };
        if let Some(conn) = self.connections.get_mut(&addr) {
            conn.position = packet.position;
        }
        self.perform_checked(
            Some(addr),
            Action::Move {
                entity_runtime_id,
                position: packet.position,
                pitch: packet.pitch,
                yaw: packet.yaw,
                head_yaw: packet.head_yaw,
                on_ground: packet.on_ground,
            },
        );
    }

    pub(super) fn handle_player_action(&mut self, addr: SocketAddr, body: Bytes) {
        let Some(entity_runtime_id) = self.spawned_runtime_id(addr, "PLAYER_ACTION") else {
            return;
        };
        let packet = match PlayerAction::proto_decode(&mut body.clone()) {
            Ok(packet) => packet,
            Err(e) => {
                debug!("undecodable PLAYER_ACTION from {addr}: {e}");
                return;
            }
        };
        match packet.action {
            PlayerActionType::StopBreak => {
                self.perform_checked(
                    Some(addr),
                    Action::BreakBlock {
                        entity_runtime_id,
                        position: packet.position,
                    },
                );
            }
            PlayerActionType::DropItem => {
                // The held item leaves the hotbar and enters the world.
                self.perform_checked(
                    Some(addr),
                    Action::PutItem {
                        entity_runtime_id,
                        position: packet.position,
                        face: packet.face,
                        item: ItemStack::empty(),
                    },
                );
            }
            other => {
                trace!("player action {other:?} from {addr}");
            }
        }
    }

    pub(super) fn handle_text(&mut self, addr: SocketAddr, body: Bytes) {
        if self.spawned_runtime_id(addr, "TEXT").is_none() {
            return;
        }
        let packet = match Text::proto_decode(&mut body.clone()) {
            Ok(packet) => packet,
            Err(e) => {
                debug!("undecodable TEXT from {addr}: {e}");
                return;
            }
        };
        if !matches!(packet.text_type, TextType::Chat | TextType::Raw) {
            debug!("unexpected text type {:?} from {addr}", packet.text_type);
            return;
        }
        let sender = self
            .connections
            .get(&addr)
            .map(|c| c.name.clone())
            .unwrap_or_default();
        self.perform_checked(
            Some(addr),
            Action::SendText {
                sender,
                message: packet.message,
            },
        );
    }

    pub(super) fn handle_command_request(&mut self, addr: SocketAddr, body: Bytes) {
        let Some(entity_runtime_id) = self.spawned_runtime_id(addr, "COMMAND_REQUEST") else {
            return;
        };
        let packet = match CommandRequest::proto_decode(&mut body.clone()) {
            Ok(packet) => packet,
            Err(e) => {
                debug!("undecodable COMMAND_REQUEST from {addr}: {e}");
                return;
            }
        };
        self.perform_checked(
            Some(addr),
            Action::RunCommand {
                entity_runtime_id,
                command: packet.command,
            },
        );
    }

    // -------------------------------------------------------------------
    // Outbound: world events
    // -------------------------------------------------------------------

    pub(super) async fn pump_world_events(&mut self) {
        while let Some(event) = self.world.poll_event() {
            self.apply_world_event(event).await;
        }
    }

    async fn apply_world_event(&mut self, event: Event) {
        match event {
            Event::ChunkLoaded { position, data } => {
                let mut recipients = Vec::new();
                for (&addr, conn) in self.connections.iter_mut() {
                    if conn.pending_chunks.remove(&position) {
                        let finished = conn.pending_chunks.is_empty()
                            && conn.state == PlayerState::AwaitingChunkRadius;
                        recipients.push((addr, finished));
                    }
                }
                let packet = FullChunkData { position, data };
                for (addr, finished) in recipients {
                    self.send_packet_now(addr, id::FULL_CHUNK_DATA, &packet).await;
                    if finished {
                        self.finish_spawn(addr).await;
                    }
                }
            }
            Event::EntityMoved {
                entity_runtime_id,
                position,
                pitch,
                yaw,
                head_yaw,
                on_ground,
            } => {
                let packet = MoveEntity {
                    entity_runtime_id,
                    position,
                    pitch: rotation_to_byte(pitch),
                    head_yaw: rotation_to_byte(head_yaw),
                    yaw: rotation_to_byte(yaw),
                    on_ground,
                    teleported: false,
                };
                self.broadcast(Delivery::LOOSE, id::MOVE_ENTITY, &packet);
            }
            Event::EntitySpawned {
                entity_runtime_id,
                entity_type,
                position,
            } => {
                let packet = AddEntity {
                    entity_unique_id: entity_runtime_id as i64,
                    entity_runtime_id,
                    entity_type,
                    position,
                    motion: Vec3::ZERO,
                    pitch: 0.0,
                    yaw: 0.0,
                    attributes: vec![EntityAttribute {
                        name: "minecraft:health".into(),
                        min: 0.0,
                        current: 20.0,
                        max: 20.0,
                    }],
                    metadata: default_metadata(""),
                };
                self.broadcast(Delivery::DEFAULT, id::ADD_ENTITY, &packet);
            }
            Event::EntityRemoved { entity_runtime_id } => {
                self.broadcast(
                    Delivery::DEFAULT,
                    id::REMOVE_ENTITY,
                    &RemoveEntity {
                        entity_unique_id: entity_runtime_id as i64,
                    },
                );
            }
            Event::BlockUpdated {
                position,
                block_id,
                block_metadata,
            } => {
                self.broadcast(
                    Delivery::DEFAULT,
                    id::UPDATE_BLOCK,
                    &UpdateBlock::new(position, block_id, block_metadata),
                );
            }
            Event::InventoryUpdated {
                entity_runtime_id,
                slot,
                item,
            } => {
                if let Some(addr) = self.find_addr_by_runtime_id(entity_runtime_id) {
                    self.queue_packet(
                        addr,
                        id::INVENTORY_SLOT,
                        &InventorySlot {
                            window_id: window::INVENTORY,
                            slot,
                            item,
                        },
                    );
                }
            }
            Event::TextShown { sender, message } => {
                let packet = if sender.is_empty() {
                    Text::raw(message)
                } else {
                    Text::chat(sender, message)
                };
                self.broadcast(Delivery::DEFAULT, id::TEXT, &packet);
            }
            Event::PlayerLogged { entity_runtime_id } => {
                debug!("world confirmed login of entity {entity_runtime_id}");
            }
            Event::PlayerSpawned {
                entity_runtime_id,
                position,
            } => {
                debug!("world spawned entity {entity_runtime_id} at {position}");
            }
        }
    }
}
