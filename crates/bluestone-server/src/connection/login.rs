//! Session lifecycle and the login / resource-pack half of the join flow.

use std::collections::HashSet;
use std::net::SocketAddr;

use bytes::Bytes;
use tracing::{debug, info};

use bluestone_proto::codec::ProtoDecode;
use bluestone_proto::packets::{
    id, Disconnect, Login, PlayStatus, PlayStatusType, PlayerList, ResourcePackClientResponse,
    ResourcePackStack, ResourcePackStatus, ResourcePacksInfo, PROTOCOL_VERSION,
};
use bluestone_proto::types::Uuid;

use super::{ConnectionHandler, PlayerConnection, PlayerState};
use crate::queue::Delivery;
use crate::world::{Action, World};

impl<W: World> ConnectionHandler<W> {
    pub(super) fn handle_session_connected(&mut self, addr: SocketAddr, guid: i64) {
        info!("session {addr} connected (guid={guid})");
        let position = self.world.spawn_position();
        self.connections.insert(
            addr,
            PlayerConnection {
                state: PlayerState::AwaitingLogin,
                name: String::new(),
                uuid: Uuid::ZERO,
                entity_unique_id: 0,
                entity_runtime_id: 0,
                position,
                chunk_radius: 0,
                pending_chunks: HashSet::new(),
            },
        );
    }

    pub(super) async fn handle_session_disconnected(&mut self, addr: SocketAddr) {
        if let Some(conn) = self.connections.get_mut(&addr) {
            conn.state = PlayerState::Disconnected;
        }
        let Some(conn) = self.connections.remove(&addr) else {
            return;
        };
        self.queue.forget(addr);

        if conn.entity_runtime_id != 0 {
            info!("{} left the game", conn.name);
            self.perform_checked(
                None,
                Action::Logout {
                    entity_runtime_id: conn.entity_runtime_id,
                },
            );
            self.broadcast(
                Delivery::DEFAULT,
                id::PLAYER_LIST,
                &PlayerList::Remove(vec![conn.uuid]),
            );
        }
    }

    pub(super) async fn handle_login(&mut self, addr: SocketAddr, body: Bytes) {
        let Some(conn) = self.connections.get(&addr) else {
            return;
        };
        if conn.state != PlayerState::AwaitingLogin {
            debug!("LOGIN from {addr} in state {:?}, dropped", conn.state);
            return;
        }

        let login = match Login::proto_decode(&mut body.clone()) {
            Ok(login) => login,
            Err(e) => {
                debug!("undecodable LOGIN from {addr}: {e}");
                return;
            }
        };

        if login.protocol_version != PROTOCOL_VERSION {
            let status = if login.protocol_version < PROTOCOL_VERSION {
                PlayStatusType::LoginFailedClient
            } else {
                PlayStatusType::LoginFailedServer
            };
            info!(
                "refusing {addr}: protocol {} (server speaks {PROTOCOL_VERSION})",
                login.protocol_version
            );
            self.send_packet_now(addr, id::PLAY_STATUS, &PlayStatus { status })
                .await;
            return;
        }

        let ident = match login.identity() {
            Ok(ident) => ident,
            Err(e) => {
                debug!("rejecting LOGIN from {addr}: {e}");
                return;
            }
        };

        if self.online_count() >= self.config.max_players as usize {
            info!("refusing {}: server is full", ident.display_name);
            self.send_packet_now(
                addr,
                id::DISCONNECT,
                &Disconnect::with_message("Server is full"),
            )
            .await;
            return;
        }

        let runtime_id = self.allocate_entity_id();
        let Some(conn) = self.connections.get_mut(&addr) else {
            return;
        };
        conn.name = ident.display_name.clone();
        conn.uuid = Uuid::new(runtime_id, runtime_id);
        conn.entity_runtime_id = runtime_id;
        conn.entity_unique_id = runtime_id as i64;
        conn.state = PlayerState::AwaitingResourceResponse { stack_sent: false };
        info!(
            "{} ({}) logged in from {addr} (entity {runtime_id})",
            ident.display_name, ident.identity
        );

        self.perform_checked(
            Some(addr),
            Action::Login {
                entity_runtime_id: runtime_id,
                name: ident.display_name,
            },
        );

        self.send_packet_now(
            addr,
            id::PLAY_STATUS,
            &PlayStatus {
                status: PlayStatusType::LoginSuccess,
            },
        )
        .await;
        self.send_packet_now(addr, id::RESOURCE_PACKS_INFO, &ResourcePacksInfo::default())
            .await;
    }

    pub(super) async fn handle_resource_pack_response(&mut self, addr: SocketAddr, body: Bytes) {
        let Some(conn) = self.connections.get(&addr) else {
            return;
        };
        let PlayerState::AwaitingResourceResponse { stack_sent } = conn.state else {
            debug!(
                "RESOURCE_PACK_CLIENT_RESPONSE from {addr} in state {:?}, dropped",
                conn.state
            );
            return;
        };

        let response = match ResourcePackClientResponse::proto_decode(&mut body.clone()) {
            Ok(response) => response,
            Err(e) => {
                debug!("undecodable pack response from {addr}: {e}");
                return;
            }
        };

        match response.status {
            ResourcePackStatus::Refused => {
                info!("{addr} refused resource packs");
                self.queue_packet(
                    addr,
                    id::DISCONNECT,
                    &Disconnect::with_message("Resource packs are required"),
                );
            }
            ResourcePackStatus::SendPacks => {
                debug!("{addr} requested pack data, but no packs are hosted");
            }
            ResourcePackStatus::Completed | ResourcePackStatus::HaveAllPacks if !stack_sent => {
                if let Some(conn) = self.connections.get_mut(&addr) {
                    conn.state = PlayerState::AwaitingResourceResponse { stack_sent: true };
                }
                self.send_packet_now(addr, id::RESOURCE_PACK_STACK, &ResourcePackStack::default())
                    .await;
            }
            ResourcePackStatus::Completed => {
                if let Some(conn) = self.connections.get_mut(&addr) {
                    conn.state = PlayerState::AwaitingChunkRadius;
                }
                self.send_spawn_prelude(addr);
            }
            ResourcePackStatus::HaveAllPacks => {
                debug!("{addr} repeated HaveAllPacks after stack was sent");
            }
        }
    }
}
