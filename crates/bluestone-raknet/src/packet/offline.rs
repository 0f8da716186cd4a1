//! Unconnected (offline) packets: discovery ping/pong and the two-step
//! open-connection handshake that negotiates the session MTU.

use std::fmt;

use bytes::{Buf, BufMut, BytesMut};

use crate::address::RakNetAddress;
use crate::codec::{read_magic, write_magic, write_string};
use crate::error::RakNetError;

/// Packet ids for offline packets.
pub mod id {
    pub const UNCONNECTED_PING: u8 = 0x01;
    pub const UNCONNECTED_PING_OPEN: u8 = 0x02;
    pub const OPEN_CONNECTION_REQUEST_1: u8 = 0x05;
    pub const OPEN_CONNECTION_REPLY_1: u8 = 0x06;
    pub const OPEN_CONNECTION_REQUEST_2: u8 = 0x07;
    pub const OPEN_CONNECTION_REPLY_2: u8 = 0x08;
    pub const UNCONNECTED_PONG: u8 = 0x1C;
}

#[derive(Debug)]
pub enum OfflinePacket {
    UnconnectedPing {
        send_timestamp: i64,
        client_guid: i64,
    },
    UnconnectedPong {
        send_timestamp: i64,
        server_guid: i64,
        server_id: String,
    },
    OpenConnectionRequest1 {
        protocol_version: u8,
        mtu_size: u16,
    },
    OpenConnectionReply1 {
        server_guid: i64,
        use_security: bool,
        mtu_size: u16,
    },
    OpenConnectionRequest2 {
        server_address: RakNetAddress,
        mtu_size: u16,
        client_guid: i64,
    },
    OpenConnectionReply2 {
        server_guid: i64,
        client_address: RakNetAddress,
        mtu_size: u16,
        encryption_enabled: bool,
    },
}

impl OfflinePacket {
    /// Decode an offline packet. `datagram_len` is the full UDP payload
    /// length; OpenConnectionRequest1 derives its MTU probe from it.
    pub fn decode(data: &[u8], datagram_len: usize) -> Result<Self, RakNetError> {
        if data.is_empty() {
            return Err(RakNetError::DatagramTooShort {
                expected: 1,
                actual: 0,
            });
        }
        let mut buf = std::io::Cursor::new(data);
        let packet_id = buf.get_u8();

        match packet_id {
            id::UNCONNECTED_PING | id::UNCONNECTED_PING_OPEN => {
                if buf.remaining() < 8 {
                    return Err(RakNetError::DatagramTooShort {
                        expected: 8,
                        actual: buf.remaining(),
                    });
                }
                let send_timestamp = buf.get_i64();
                read_magic(&mut buf)?;
                let client_guid = if buf.remaining() >= 8 { buf.get_i64() } else { 0 };
                Ok(Self::UnconnectedPing {
                    send_timestamp,
                    client_guid,
                })
            }
            id::OPEN_CONNECTION_REQUEST_1 => {
                read_magic(&mut buf)?;
                if buf.remaining() < 1 {
                    return Err(RakNetError::DatagramTooShort {
                        expected: 1,
                        actual: 0,
                    });
                }
                let protocol_version = buf.get_u8();
                Ok(Self::OpenConnectionRequest1 {
                    protocol_version,
                    mtu_size: datagram_len as u16,
                })
            }
            id::OPEN_CONNECTION_REQUEST_2 => {
                read_magic(&mut buf)?;
                let server_address = RakNetAddress::decode(&mut buf)?;
                if buf.remaining() < 10 {
                    return Err(RakNetError::DatagramTooShort {
                        expected: 10,
                        actual: buf.remaining(),
                    });
                }
                let mtu_size = buf.get_u16();
                let client_guid = buf.get_i64();
                Ok(Self::OpenConnectionRequest2 {
                    server_address,
                    mtu_size,
                    client_guid,
                })
            }
            _ => Err(RakNetError::UnknownPacketId(packet_id)),
        }
    }

    pub fn encode(&self, buf: &mut BytesMut) {
        match self {
            Self::UnconnectedPong {
                send_timestamp,
                server_guid,
                server_id,
            } => {
                buf.put_u8(id::UNCONNECTED_PONG);
                buf.put_i64(*send_timestamp);
                buf.put_i64(*server_guid);
                write_magic(buf);
                write_string(buf, server_id);
            }
            Self::OpenConnectionReply1 {
                server_guid,
                use_security,
                mtu_size,
            } => {
                buf.put_u8(id::OPEN_CONNECTION_REPLY_1);
                write_magic(buf);
                buf.put_i64(*server_guid);
                buf.put_u8(*use_security as u8);
                buf.put_u16(*mtu_size);
            }
            Self::OpenConnectionReply2 {
                server_guid,
                client_address,
                mtu_size,
                encryption_enabled,
            } => {
                buf.put_u8(id::OPEN_CONNECTION_REPLY_2);
                write_magic(buf);
                buf.put_i64(*server_guid);
                client_address.encode(buf);
                buf.put_u16(*mtu_size);
                buf.put_u8(*encryption_enabled as u8);
            }
            // Client-originated packets; the server never encodes these.
            Self::UnconnectedPing { .. }
            | Self::OpenConnectionRequest1 { .. }
            | Self::OpenConnectionRequest2 { .. } => {
                unreachable!("server does not encode client offline packets")
            }
        }
    }
}

/// The fields advertised in an UnconnectedPong: rendered as
/// `MCPE;<motd>;<protocol>;<version>;<players>;<max>;<guid>;<world>;<mode>;`.
#[derive(Debug, Clone)]
pub struct ServerDescriptor {
    pub motd: String,
    pub protocol_version: u32,
    pub game_version: String,
    pub online_players: u32,
    pub max_players: u32,
    pub server_guid: i64,
    pub world_name: String,
    /// Title-case game mode name, e.g. `Survival`.
    pub game_mode: String,
}

impl fmt::Display for ServerDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MCPE;{};{};{};{};{};{};{};{};",
            self.motd,
            self.protocol_version,
            self.game_version,
            self.online_players,
            self.max_players,
            self.server_guid,
            self.world_name,
            self.game_mode,
        )
    }
}
