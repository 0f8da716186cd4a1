//! The UDP endpoint: demultiplexes datagrams to sessions, answers
//! discovery pings, drives the handshake, and runs the shared tick loop.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use bytes::{Bytes, BytesMut};
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, trace, warn};

use crate::address::RakNetAddress;
use crate::constants::*;
use crate::error::RakNetError;
use crate::packet::frame::{AckNack, FrameSet, Reliability};
use crate::packet::offline::{self, OfflinePacket, ServerDescriptor};
use crate::packet::online::{self, OnlinePacket, NUM_SYSTEM_ADDRESSES};
use crate::session::{RakNetSession, SessionState, SessionTimings};

/// Events surfaced to the layer above the transport.
#[derive(Debug)]
pub enum RakNetEvent {
    /// A remote finished the full handshake (NewIncomingConnection seen).
    SessionConnected { addr: SocketAddr, guid: i64 },
    /// A session ended: disconnect notification, timeout, or overflow.
    SessionDisconnected { addr: SocketAddr },
    /// One reassembled, ordered game payload (the 0xFE marker stripped).
    Packet { addr: SocketAddr, payload: Bytes },
}

/// Commands submitted to the endpoint from other tasks.
#[derive(Debug)]
pub enum ServerCommand {
    Send {
        addr: SocketAddr,
        payload: Bytes,
        reliability: Reliability,
        channel: u8,
    },
}

/// Cloneable handle for queueing outbound payloads onto the endpoint.
#[derive(Clone)]
pub struct ServerHandle {
    command_tx: mpsc::Sender<ServerCommand>,
}

impl ServerHandle {
    /// A handle paired with the receiving end of its command channel.
    /// The endpoint uses this internally; consumers use it to observe
    /// outbound traffic without a socket.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<ServerCommand>) {
        let (command_tx, command_rx) = mpsc::channel(capacity);
        (Self { command_tx }, command_rx)
    }

    /// Queue a payload for a connected session.
    pub async fn send_to(
        &self,
        addr: SocketAddr,
        payload: Bytes,
        reliability: Reliability,
        channel: u8,
    ) {
        let _ = self
            .command_tx
            .send(ServerCommand::Send {
                addr,
                payload,
                reliability,
                channel,
            })
            .await;
    }
}

/// Endpoint configuration, derived from the server configuration.
pub struct RakNetConfig {
    pub address: SocketAddr,
    pub server_guid: i64,
    pub descriptor: ServerDescriptor,
    pub max_connections: usize,
    pub timings: SessionTimings,
    /// Truncate logged datagram hex to this many characters.
    pub max_log_length: Option<usize>,
}

/// The endpoint itself: owns the socket and every session.
pub struct RakNetServer {
    socket: Arc<UdpSocket>,
    sessions: HashMap<SocketAddr, RakNetSession>,
    config: RakNetConfig,
    event_tx: mpsc::Sender<RakNetEvent>,
    command_rx: mpsc::Receiver<ServerCommand>,
}

impl RakNetServer {
    /// Bind the socket. Returns the server, the event stream for the
    /// consumer, and a handle for submitting outbound payloads.
    pub async fn bind(
        config: RakNetConfig,
    ) -> Result<(Self, mpsc::Receiver<RakNetEvent>, ServerHandle), RakNetError> {
        let socket = UdpSocket::bind(config.address).await?;
        let (event_tx, event_rx) = mpsc::channel(256);
        let (handle, command_rx) = ServerHandle::channel(256);

        info!("listening on {}", socket.local_addr()?);

        Ok((
            Self {
                socket: Arc::new(socket),
                sessions: HashMap::new(),
                config,
                event_tx,
                command_rx,
            },
            event_rx,
            handle,
        ))
    }

    /// The local address the socket actually bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, RakNetError> {
        Ok(self.socket.local_addr()?)
    }

    /// Replace the advertised descriptor (e.g. on player-count change).
    pub fn update_descriptor(&mut self, descriptor: ServerDescriptor) {
        self.config.descriptor = descriptor;
    }

    /// Run until the shutdown signal flips. Only unrecoverable socket
    /// errors escape; every per-datagram failure is contained here.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        let mut recv_buf = vec![0u8; RECV_BUF_SIZE];
        let mut tick = tokio::time::interval(SERVER_TICK_INTERVAL);

        loop {
            tokio::select! {
                result = self.socket.recv_from(&mut recv_buf) => {
                    match result {
                        Ok((len, addr)) => {
                            self.log_datagram(&recv_buf[..len], addr);
                            if let Err(e) = self.handle_datagram(&recv_buf[..len], addr).await {
                                debug!("dropping datagram from {addr}: {e}");
                            }
                        }
                        Err(e) => warn!("UDP recv error: {e}"),
                    }
                }
                Some(cmd) = self.command_rx.recv() => {
                    let ServerCommand::Send { addr, payload, reliability, channel } = cmd;
                    self.queue_send(addr, payload, reliability, channel);
                }
                _ = tick.tick() => {
                    self.tick().await;
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("endpoint shutting down");
                        self.shutdown().await;
                        break;
                    }
                }
            }
        }
    }

    fn log_datagram(&self, data: &[u8], addr: SocketAddr) {
        if !tracing::enabled!(tracing::Level::TRACE) {
            return;
        }
        let mut hex = data
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect::<String>();
        if let Some(limit) = self.config.max_log_length {
            hex.truncate(limit);
        }
        trace!("{addr} [{}] {hex}", data.len());
    }

    fn queue_send(
        &mut self,
        addr: SocketAddr,
        payload: Bytes,
        reliability: Reliability,
        channel: u8,
    ) {
        if let Some(session) = self.sessions.get_mut(&addr) {
            session.enqueue(payload, reliability, channel);
        } else {
            debug!("send to unknown session {addr} discarded");
        }
    }

    // -------------------------------------------------------------------
    // Datagram dispatch
    // -------------------------------------------------------------------

    async fn handle_datagram(&mut self, data: &[u8], addr: SocketAddr) -> Result<(), RakNetError> {
        let Some(&packet_id) = data.first() else {
            return Ok(());
        };

        match packet_id {
            offline::id::UNCONNECTED_PING | offline::id::UNCONNECTED_PING_OPEN => {
                self.handle_unconnected_ping(data, addr).await
            }
            offline::id::OPEN_CONNECTION_REQUEST_1 => self.handle_open_request_1(data, addr).await,
            offline::id::OPEN_CONNECTION_REQUEST_2 => self.handle_open_request_2(data, addr).await,
            0x80..=0x8D => self.handle_frameset(data, addr).await,
            AckNack::ACK_ID => self.handle_ack(data, addr),
            AckNack::NACK_ID => self.handle_nack(data, addr),
            _ => {
                debug!("unknown packet 0x{packet_id:02X} from {addr}");
                Ok(())
            }
        }
    }

    async fn handle_unconnected_ping(
        &self,
        data: &[u8],
        addr: SocketAddr,
    ) -> Result<(), RakNetError> {
        if let OfflinePacket::UnconnectedPing { send_timestamp, .. } =
            OfflinePacket::decode(data, data.len())?
        {
            let pong = OfflinePacket::UnconnectedPong {
                send_timestamp,
                server_guid: self.config.server_guid,
                server_id: self.config.descriptor.to_string(),
            };
            let mut buf = BytesMut::with_capacity(128);
            pong.encode(&mut buf);
            self.socket.send_to(&buf, addr).await?;
        }
        Ok(())
    }

    async fn handle_open_request_1(
        &mut self,
        data: &[u8],
        addr: SocketAddr,
    ) -> Result<(), RakNetError> {
        if let OfflinePacket::OpenConnectionRequest1 {
            protocol_version,
            mtu_size,
        } = OfflinePacket::decode(data, data.len())?
        {
            if protocol_version != RAKNET_PROTOCOL_VERSION {
                debug!("OCR1 from {addr}: protocol {protocol_version}, expected {RAKNET_PROTOCOL_VERSION}");
            }
            let mtu = mtu_size.clamp(MIN_MTU, MAX_MTU);

            let reply = OfflinePacket::OpenConnectionReply1 {
                server_guid: self.config.server_guid,
                use_security: false,
                mtu_size: mtu,
            };
            let mut buf = BytesMut::with_capacity(32);
            reply.encode(&mut buf);
            self.socket.send_to(&buf, addr).await?;
        }
        Ok(())
    }

    async fn handle_open_request_2(
        &mut self,
        data: &[u8],
        addr: SocketAddr,
    ) -> Result<(), RakNetError> {
        if let OfflinePacket::OpenConnectionRequest2 {
            mtu_size,
            client_guid,
            ..
        } = OfflinePacket::decode(data, data.len())?
        {
            if !self.sessions.contains_key(&addr) && self.sessions.len() >= self.config.max_connections
            {
                debug!("OCR2 from {addr}: connection limit reached");
                return Ok(());
            }

            let mtu = mtu_size.clamp(MIN_MTU, MAX_MTU);
            let timings = self.config.timings;
            let session = self
                .sessions
                .entry(addr)
                .or_insert_with(|| RakNetSession::new(addr, mtu, client_guid, timings));
            session.mtu = mtu.min(session.mtu);
            session.client_guid = client_guid;
            session.state = SessionState::Handshake2;
            session.last_activity = Instant::now();

            debug!("OCR2 from {addr}: guid={client_guid} mtu={}", session.mtu);

            let reply = OfflinePacket::OpenConnectionReply2 {
                server_guid: self.config.server_guid,
                client_address: RakNetAddress::from(addr),
                mtu_size: session.mtu,
                encryption_enabled: false,
            };
            let mut buf = BytesMut::with_capacity(64);
            reply.encode(&mut buf);
            self.socket.send_to(&buf, addr).await?;
        }
        Ok(())
    }

    async fn handle_frameset(&mut self, data: &[u8], addr: SocketAddr) -> Result<(), RakNetError> {
        let Some(session) = self.sessions.get_mut(&addr) else {
            info!("frame set from unknown session {addr}");
            return Ok(());
        };

        session.last_activity = Instant::now();
        let frameset = FrameSet::decode(data)?;
        let payloads = session.process_incoming_frameset(frameset);

        for payload in payloads {
            let Some(&inner_id) = payload.first() else {
                continue;
            };
            match inner_id {
                online::id::CONNECTION_REQUEST => {
                    self.handle_connection_request(&payload, addr)?;
                }
                online::id::NEW_INCOMING_CONNECTION => {
                    self.handle_new_incoming_connection(&payload, addr).await?;
                }
                online::id::CONNECTED_PING => {
                    self.handle_connected_ping(&payload, addr)?;
                }
                online::id::CONNECTED_PONG => {
                    // Keepalive reply; activity already refreshed above.
                }
                online::id::DISCONNECTION_NOTIFICATION => {
                    info!("{addr} sent disconnect notification");
                    self.sessions.remove(&addr);
                    let _ = self
                        .event_tx
                        .send(RakNetEvent::SessionDisconnected { addr })
                        .await;
                    return Ok(());
                }
                online::id::GAME_PACKET => {
                    let _ = self
                        .event_tx
                        .send(RakNetEvent::Packet {
                            addr,
                            payload: payload.slice(1..),
                        })
                        .await;
                }
                _ => {
                    debug!("unknown online packet 0x{inner_id:02X} from {addr}");
                }
            }
        }
        Ok(())
    }

    fn handle_connection_request(
        &mut self,
        data: &[u8],
        addr: SocketAddr,
    ) -> Result<(), RakNetError> {
        if let OnlinePacket::ConnectionRequest {
            client_guid,
            timestamp,
            ..
        } = OnlinePacket::decode(data)?
        {
            let Some(session) = self.sessions.get_mut(&addr) else {
                return Ok(());
            };
            session.client_guid = client_guid;
            session.state = SessionState::Connected;

            debug!("connection request from {addr}, guid={client_guid}");

            let mut system_addresses = [RakNetAddress::EMPTY_V4; NUM_SYSTEM_ADDRESSES];
            system_addresses[0] = RakNetAddress::from(addr);

            let accepted = OnlinePacket::ConnectionRequestAccepted {
                client_address: RakNetAddress::from(addr),
                system_index: 0,
                system_addresses,
                request_timestamp: timestamp,
                accept_timestamp: current_timestamp(),
            };
            let mut payload = BytesMut::with_capacity(192);
            accepted.encode(&mut payload);
            session.enqueue(payload.freeze(), Reliability::ReliableOrdered, 0);
        }
        Ok(())
    }

    async fn handle_new_incoming_connection(
        &mut self,
        data: &[u8],
        addr: SocketAddr,
    ) -> Result<(), RakNetError> {
        let OnlinePacket::NewIncomingConnection { .. } = OnlinePacket::decode(data)? else {
            return Ok(());
        };
        if let Some(session) = self.sessions.get_mut(&addr) {
            session.state = SessionState::Connected;
            let guid = session.client_guid;
            info!("session {addr} fully connected (guid={guid})");
            let _ = self
                .event_tx
                .send(RakNetEvent::SessionConnected { addr, guid })
                .await;
        }
        Ok(())
    }

    fn handle_connected_ping(&mut self, data: &[u8], addr: SocketAddr) -> Result<(), RakNetError> {
        if let OnlinePacket::ConnectedPing { timestamp } = OnlinePacket::decode(data)? {
            let pong = OnlinePacket::ConnectedPong {
                ping_timestamp: timestamp,
                pong_timestamp: current_timestamp(),
            };
            let mut payload = BytesMut::with_capacity(24);
            pong.encode(&mut payload);
            if let Some(session) = self.sessions.get_mut(&addr) {
                session.enqueue(payload.freeze(), Reliability::Unreliable, 0);
            }
        }
        Ok(())
    }

    fn handle_ack(&mut self, data: &[u8], addr: SocketAddr) -> Result<(), RakNetError> {
        let ack = AckNack::decode(data)?;
        match self.sessions.get_mut(&addr) {
            Some(session) => {
                session.last_activity = Instant::now();
                session.handle_ack(&ack);
            }
            None => info!("ACK from unknown session {addr}"),
        }
        Ok(())
    }

    fn handle_nack(&mut self, data: &[u8], addr: SocketAddr) -> Result<(), RakNetError> {
        let nack = AckNack::decode(data)?;
        match self.sessions.get_mut(&addr) {
            Some(session) => {
                session.last_activity = Instant::now();
                session.handle_nack(&nack);
            }
            None => info!("NACK from unknown session {addr}"),
        }
        Ok(())
    }

    // -------------------------------------------------------------------
    // Tick
    // -------------------------------------------------------------------

    /// Per-tick work, in stable order: flush ACK/NACK, retransmit due
    /// frames, flush send queues, keepalive, expire idle sessions.
    async fn tick(&mut self) {
        let now = Instant::now();
        let mut to_remove = Vec::new();
        let mut to_send: Vec<(SocketAddr, Bytes)> = Vec::new();

        for (addr, session) in &mut self.sessions {
            if let Some(ack) = session.take_ack_datagram() {
                to_send.push((*addr, ack));
            }
            if let Some(nack) = session.take_nack_datagram() {
                to_send.push((*addr, nack));
            }

            session.check_retransmit(now);
            for dg in session.flush_send_queue() {
                to_send.push((*addr, dg));
            }

            if session.is_overflowed() {
                warn!("session {addr} retransmit queue overflow, closing");
                to_remove.push(*addr);
                continue;
            }

            if session.state == SessionState::Connected && session.should_ping(now) {
                let ping = OnlinePacket::ConnectedPing {
                    timestamp: current_timestamp(),
                };
                let mut payload = BytesMut::with_capacity(16);
                ping.encode(&mut payload);
                session.enqueue(payload.freeze(), Reliability::Unreliable, 0);
                session.last_ping_sent = now;
            }

            session.cleanup_splits();

            if session.is_timed_out(now) {
                to_remove.push(*addr);
            }
        }

        for (addr, data) in to_send {
            let _ = self.socket.send_to(&data, addr).await;
        }

        for addr in to_remove {
            let was_connected = self
                .sessions
                .remove(&addr)
                .map(|s| s.state == SessionState::Connected)
                .unwrap_or(false);
            if was_connected {
                info!("session {addr} closed");
                let _ = self
                    .event_tx
                    .send(RakNetEvent::SessionDisconnected { addr })
                    .await;
            }
        }
    }

    /// Notify every connected session, run one final flush, and clear.
    async fn shutdown(&mut self) {
        for (addr, session) in &mut self.sessions {
            if session.state != SessionState::Connected {
                continue;
            }
            session.state = SessionState::Closing;
            let mut payload = BytesMut::with_capacity(4);
            OnlinePacket::DisconnectionNotification.encode(&mut payload);
            session.enqueue(payload.freeze(), Reliability::ReliableOrdered, 0);
            for dg in session.flush_send_queue() {
                let _ = self.socket.send_to(&dg, *addr).await;
            }
        }
        self.sessions.clear();
    }
}

/// Milliseconds since the Unix epoch, used for RakNet timestamps.
fn current_timestamp() -> i64 {
    use std::time::SystemTime;
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::RAKNET_MAGIC;
    use bytes::BufMut;
    use std::time::Duration;

    fn test_config(addr: SocketAddr) -> RakNetConfig {
        RakNetConfig {
            address: addr,
            server_guid: 472877960873915065,
            descriptor: ServerDescriptor {
                motd: "Bluestone".into(),
                protocol_version: 160,
                game_version: "1.2.7".into(),
                online_players: 0,
                max_players: 20,
                server_guid: 472877960873915065,
                world_name: "world".into(),
                game_mode: "Survival".into(),
            },
            max_connections: 20,
            timings: SessionTimings::default(),
            max_log_length: None,
        }
    }

    #[tokio::test]
    async fn discovery_ping_pong() {
        let (mut server, _events, _handle) =
            RakNetServer::bind(test_config("127.0.0.1:0".parse().unwrap()))
                .await
                .unwrap();
        let server_addr = server.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(async move {
            server.run(shutdown_rx).await;
        });

        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let mut ping = BytesMut::new();
        ping.put_u8(offline::id::UNCONNECTED_PING);
        ping.put_i64(8721);
        ping.put_slice(&RAKNET_MAGIC);
        ping.put_i64(1);
        client.send_to(&ping, server_addr).await.unwrap();

        let mut buf = vec![0u8; 512];
        let (len, from) = tokio::time::timeout(
            Duration::from_secs(5),
            client.recv_from(&mut buf),
        )
        .await
        .expect("pong not received")
        .unwrap();
        assert_eq!(from, server_addr);

        let data = &buf[..len];
        assert_eq!(data[0], offline::id::UNCONNECTED_PONG);
        // Echoed timestamp.
        assert_eq!(&data[1..9], &8721i64.to_be_bytes());
        // Guid.
        assert_eq!(&data[9..17], &472877960873915065i64.to_be_bytes());
        // Magic, then length-prefixed descriptor string.
        assert_eq!(&data[17..33], &RAKNET_MAGIC);
        let str_len = u16::from_be_bytes([data[33], data[34]]) as usize;
        let server_id = std::str::from_utf8(&data[35..35 + str_len]).unwrap();
        assert!(server_id.starts_with("MCPE;Bluestone;160;1.2.7;"));

        shutdown_tx.send(true).unwrap();
        let _ = task.await;
    }

    #[tokio::test]
    async fn open_connection_handshake_replies() {
        let (mut server, _events, _handle) =
            RakNetServer::bind(test_config("127.0.0.1:0".parse().unwrap()))
                .await
                .unwrap();
        let server_addr = server.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(async move {
            server.run(shutdown_rx).await;
        });

        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();

        // OCR1, padded to probe an MTU of 600.
        let mut ocr1 = BytesMut::new();
        ocr1.put_u8(offline::id::OPEN_CONNECTION_REQUEST_1);
        ocr1.put_slice(&RAKNET_MAGIC);
        ocr1.put_u8(RAKNET_PROTOCOL_VERSION);
        ocr1.resize(600, 0);
        client.send_to(&ocr1, server_addr).await.unwrap();

        let mut buf = vec![0u8; 512];
        let (len, _) = tokio::time::timeout(Duration::from_secs(5), client.recv_from(&mut buf))
            .await
            .expect("reply1 not received")
            .unwrap();
        assert_eq!(buf[0], offline::id::OPEN_CONNECTION_REPLY_1);
        // MTU echo is the trailing u16.
        assert_eq!(&buf[len - 2..len], &600u16.to_be_bytes());

        // OCR2 with the negotiated MTU.
        let mut ocr2 = BytesMut::new();
        ocr2.put_u8(offline::id::OPEN_CONNECTION_REQUEST_2);
        ocr2.put_slice(&RAKNET_MAGIC);
        RakNetAddress::from(server_addr).encode(&mut ocr2);
        ocr2.put_u16(600);
        ocr2.put_i64(7777);
        client.send_to(&ocr2, server_addr).await.unwrap();

        let (len, _) = tokio::time::timeout(Duration::from_secs(5), client.recv_from(&mut buf))
            .await
            .expect("reply2 not received")
            .unwrap();
        assert_eq!(buf[0], offline::id::OPEN_CONNECTION_REPLY_2);
        assert!(len > 25);

        shutdown_tx.send(true).unwrap();
        let _ = task.await;
    }
}
