//! Connected (online) packets carried inside frames: keepalive pings,
//! the connection request exchange, and disconnect notification.

use bytes::{Buf, BufMut, BytesMut};

use crate::address::RakNetAddress;
use crate::error::RakNetError;

/// Packet ids for online packets.
pub mod id {
    pub const CONNECTED_PING: u8 = 0x00;
    pub const CONNECTED_PONG: u8 = 0x03;
    pub const CONNECTION_REQUEST: u8 = 0x09;
    pub const CONNECTION_REQUEST_ACCEPTED: u8 = 0x10;
    pub const NEW_INCOMING_CONNECTION: u8 = 0x13;
    pub const DISCONNECTION_NOTIFICATION: u8 = 0x15;
    /// Game-layer payload marker; everything after it belongs to the
    /// Bedrock batch codec.
    pub const GAME_PACKET: u8 = 0xFE;
}

/// Number of system address records in the connection exchange.
pub const NUM_SYSTEM_ADDRESSES: usize = 20;

#[derive(Debug)]
pub enum OnlinePacket {
    ConnectedPing {
        timestamp: i64,
    },
    ConnectedPong {
        ping_timestamp: i64,
        pong_timestamp: i64,
    },
    ConnectionRequest {
        client_guid: i64,
        timestamp: i64,
        use_security: bool,
    },
    ConnectionRequestAccepted {
        client_address: RakNetAddress,
        system_index: u16,
        system_addresses: [RakNetAddress; NUM_SYSTEM_ADDRESSES],
        request_timestamp: i64,
        accept_timestamp: i64,
    },
    NewIncomingConnection {
        server_address: RakNetAddress,
        request_timestamp: i64,
        accept_timestamp: i64,
    },
    DisconnectionNotification,
}

impl OnlinePacket {
    pub fn decode(data: &[u8]) -> Result<Self, RakNetError> {
        if data.is_empty() {
            return Err(RakNetError::DatagramTooShort {
                expected: 1,
                actual: 0,
            });
        }
        let mut buf = std::io::Cursor::new(data);
        let packet_id = buf.get_u8();

        match packet_id {
            id::CONNECTED_PING => {
                if buf.remaining() < 8 {
                    return Err(RakNetError::DatagramTooShort {
                        expected: 8,
                        actual: buf.remaining(),
                    });
                }
                let timestamp = buf.get_i64();
                Ok(Self::ConnectedPing { timestamp })
            }
            id::CONNECTED_PONG => {
                if buf.remaining() < 16 {
                    return Err(RakNetError::DatagramTooShort {
                        expected: 16,
                        actual: buf.remaining(),
                    });
                }
                let ping_timestamp = buf.get_i64();
                let pong_timestamp = buf.get_i64();
                Ok(Self::ConnectedPong {
                    ping_timestamp,
                    pong_timestamp,
                })
            }
            id::CONNECTION_REQUEST => {
                if buf.remaining() < 16 {
                    return Err(RakNetError::DatagramTooShort {
                        expected: 16,
                        actual: buf.remaining(),
                    });
                }
                let client_guid = buf.get_i64();
                let timestamp = buf.get_i64();
                let use_security = buf.remaining() > 0 && buf.get_u8() != 0;
                Ok(Self::ConnectionRequest {
                    client_guid,
                    timestamp,
                    use_security,
                })
            }
            id::NEW_INCOMING_CONNECTION => {
                let server_address = RakNetAddress::decode(&mut buf)?;
                // Skip the 20 echoed system addresses; only the trailing
                // timestamps matter to the server.
                for _ in 0..NUM_SYSTEM_ADDRESSES {
                    if buf.remaining() > 16 {
                        RakNetAddress::decode(&mut buf)?;
                    }
                }
                let request_timestamp = if buf.remaining() >= 8 { buf.get_i64() } else { 0 };
                let accept_timestamp = if buf.remaining() >= 8 { buf.get_i64() } else { 0 };
                Ok(Self::NewIncomingConnection {
                    server_address,
                    request_timestamp,
                    accept_timestamp,
                })
            }
            id::DISCONNECTION_NOTIFICATION => Ok(Self::DisconnectionNotification),
            _ => Err(RakNetError::UnknownPacketId(packet_id)),
        }
    }

    pub fn encode(&self, buf: &mut BytesMut) {
        match self {
            Self::ConnectedPing { timestamp } => {
                buf.put_u8(id::CONNECTED_PING);
                buf.put_i64(*timestamp);
            }
            Self::ConnectedPong {
                ping_timestamp,
                pong_timestamp,
            } => {
                buf.put_u8(id::CONNECTED_PONG);
                buf.put_i64(*ping_timestamp);
                buf.put_i64(*pong_timestamp);
            }
            Self::ConnectionRequestAccepted {
                client_address,
                system_index,
                system_addresses,
                request_timestamp,
                accept_timestamp,
            } => {
                buf.put_u8(id::CONNECTION_REQUEST_ACCEPTED);
                client_address.encode(buf);
                buf.put_u16(*system_index);
                for addr in system_addresses {
                    addr.encode(buf);
                }
                buf.put_i64(*request_timestamp);
                buf.put_i64(*accept_timestamp);
            }
            Self::DisconnectionNotification => {
                buf.put_u8(id::DISCONNECTION_NOTIFICATION);
            }
            Self::ConnectionRequest { .. } | Self::NewIncomingConnection { .. } => {
                unreachable!("server does not encode client online packets")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connected_ping_roundtrip() {
        let packet = OnlinePacket::ConnectedPing { timestamp: 42 };
        let mut buf = BytesMut::new();
        packet.encode(&mut buf);
        match OnlinePacket::decode(&buf).unwrap() {
            OnlinePacket::ConnectedPing { timestamp } => assert_eq!(timestamp, 42),
            other => panic!("expected ConnectedPing, got {other:?}"),
        }
    }

    #[test]
    fn connected_pong_roundtrip() {
        let packet = OnlinePacket::ConnectedPong {
            ping_timestamp: 10,
            pong_timestamp: 20,
        };
        let mut buf = BytesMut::new();
        packet.encode(&mut buf);
        match OnlinePacket::decode(&buf).unwrap() {
            OnlinePacket::ConnectedPong {
                ping_timestamp,
                pong_timestamp,
            } => {
                assert_eq!(ping_timestamp, 10);
                assert_eq!(pong_timestamp, 20);
            }
            other => panic!("expected ConnectedPong, got {other:?}"),
        }
    }

    #[test]
    fn connection_request_decode() {
        let mut buf = BytesMut::new();
        buf.put_u8(id::CONNECTION_REQUEST);
        buf.put_i64(12345); // client guid
        buf.put_i64(8721); // time since start
        buf.put_u8(0);
        match OnlinePacket::decode(&buf).unwrap() {
            OnlinePacket::ConnectionRequest {
                client_guid,
                timestamp,
                use_security,
            } => {
                assert_eq!(client_guid, 12345);
                assert_eq!(timestamp, 8721);
                assert!(!use_security);
            }
            other => panic!("expected ConnectionRequest, got {other:?}"),
        }
    }

    #[test]
    fn accepted_carries_twenty_addresses() {
        let packet = OnlinePacket::ConnectionRequestAccepted {
            client_address: RakNetAddress::EMPTY_V4,
            system_index: 0,
            system_addresses: [RakNetAddress::EMPTY_V4; NUM_SYSTEM_ADDRESSES],
            request_timestamp: 1,
            accept_timestamp: 2,
        };
        let mut buf = BytesMut::new();
        packet.encode(&mut buf);
        // id(1) + client addr(7) + index(2) + 20 * addr(7) + times(16)
        assert_eq!(buf.len(), 1 + 7 + 2 + 20 * 7 + 16);
    }

    #[test]
    fn disconnection_notification_is_one_byte() {
        let packet = OnlinePacket::DisconnectionNotification;
        let mut buf = BytesMut::new();
        packet.encode(&mut buf);
        assert_eq!(&buf[..], &[id::DISCONNECTION_NOTIFICATION]);
        assert!(matches!(
            OnlinePacket::decode(&buf).unwrap(),
            OnlinePacket::DisconnectionNotification
        ));
    }
}
