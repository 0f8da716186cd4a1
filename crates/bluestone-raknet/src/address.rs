use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, SocketAddrV4, SocketAddrV6};

use bytes::{Buf, BufMut};

use crate::codec::take;
use crate::error::RakNetError;

/// Address family tag RakNet writes ahead of IPv6 records.
const AF_INET6: u16 = 23;

/// A network address in RakNet wire form: 1 version byte, the IP bytes,
/// and a big-endian port. IPv4 octets travel bitwise-complemented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RakNetAddress(pub SocketAddr);

impl RakNetAddress {
    /// `0.0.0.0:0`, used to pad the system address arrays.
    pub const EMPTY_V4: Self = Self(SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0)));

    pub fn encode(&self, buf: &mut impl BufMut) {
        match self.0 {
            SocketAddr::V4(v4) => {
                buf.put_u8(4);
                // Complementing the whole word complements each octet.
                buf.put_u32(!u32::from(*v4.ip()));
                buf.put_u16(v4.port());
            }
            SocketAddr::V6(v6) => {
                buf.put_u8(6);
                buf.put_u16_le(AF_INET6);
                buf.put_u16(v6.port());
                buf.put_u32(v6.flowinfo());
                buf.put_slice(&v6.ip().octets());
                buf.put_u32(v6.scope_id());
            }
        }
    }

    pub fn decode(buf: &mut impl Buf) -> Result<Self, RakNetError> {
        let [version] = take::<1>(buf)?;
        match version {
            4 => Self::decode_v4(buf),
            6 => Self::decode_v6(buf),
            other => Err(RakNetError::InvalidAddressVersion(other)),
        }
    }

    fn decode_v4(buf: &mut impl Buf) -> Result<Self, RakNetError> {
        if buf.remaining() < 6 {
            return Err(RakNetError::DatagramTooShort {
                expected: 6,
                actual: buf.remaining(),
            });
        }
        let ip = Ipv4Addr::from(!buf.get_u32());
        let port = buf.get_u16();
        Ok(Self((ip, port).into()))
    }

    fn decode_v6(buf: &mut impl Buf) -> Result<Self, RakNetError> {
        if buf.remaining() < 26 {
            return Err(RakNetError::DatagramTooShort {
                expected: 26,
                actual: buf.remaining(),
            });
        }
        let _family = buf.get_u16_le();
        let port = buf.get_u16();
        let flowinfo = buf.get_u32();
        let mut octets = [0u8; 16];
        buf.copy_to_slice(&mut octets);
        let scope_id = buf.get_u32();
        let v6 = SocketAddrV6::new(Ipv6Addr::from(octets), port, flowinfo, scope_id);
        Ok(Self(v6.into()))
    }
}

impl From<SocketAddr> for RakNetAddress {
    fn from(addr: SocketAddr) -> Self {
        Self(addr)
    }
}

impl From<RakNetAddress> for SocketAddr {
    fn from(addr: RakNetAddress) -> Self {
        addr.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;
    use std::io::Cursor;

    #[test]
    fn ipv4_complemented_on_wire() {
        let addr = RakNetAddress(SocketAddr::new("192.168.1.9".parse().unwrap(), 19132));
        let mut buf = BytesMut::new();
        addr.encode(&mut buf);
        assert_eq!(buf.len(), 7);
        assert_eq!(&buf[1..5], &[!192, !168, !1, !9]);

        let mut cursor = Cursor::new(&buf[..]);
        assert_eq!(RakNetAddress::decode(&mut cursor).unwrap(), addr);
    }

    #[test]
    fn ipv6_roundtrip() {
        let addr = RakNetAddress(SocketAddr::new("::1".parse().unwrap(), 19132));
        let mut buf = BytesMut::new();
        addr.encode(&mut buf);
        assert_eq!(buf[0], 6);
        let mut cursor = Cursor::new(&buf[..]);
        assert_eq!(RakNetAddress::decode(&mut cursor).unwrap(), addr);
    }

    #[test]
    fn empty_v4_roundtrip() {
        let mut buf = BytesMut::new();
        RakNetAddress::EMPTY_V4.encode(&mut buf);
        // An all-zero address is all ones on the wire.
        assert_eq!(&buf[1..5], &[0xFF; 4]);
        let mut cursor = Cursor::new(&buf[..]);
        assert_eq!(
            RakNetAddress::decode(&mut cursor).unwrap(),
            RakNetAddress::EMPTY_V4
        );
    }

    #[test]
    fn bad_version_rejected() {
        let data = [9u8, 0, 0, 0, 0, 0, 0];
        let mut cursor = Cursor::new(&data[..]);
        assert!(matches!(
            RakNetAddress::decode(&mut cursor),
            Err(RakNetError::InvalidAddressVersion(9))
        ));
    }

    #[test]
    fn truncated_v4_rejected() {
        let data = [4u8, 0xFF, 0xFF];
        let mut cursor = Cursor::new(&data[..]);
        assert!(matches!(
            RakNetAddress::decode(&mut cursor),
            Err(RakNetError::DatagramTooShort { .. })
        ));
    }
}
