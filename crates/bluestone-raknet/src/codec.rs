//! Field-level helpers shared by the RakNet packet codecs.

use bytes::{Buf, BufMut};

use crate::constants::RAKNET_MAGIC;
use crate::error::RakNetError;

/// Pull a fixed number of bytes off the buffer, or report how short it
/// fell.
pub(crate) fn take<const N: usize>(buf: &mut impl Buf) -> Result<[u8; N], RakNetError> {
    if buf.remaining() < N {
        return Err(RakNetError::DatagramTooShort {
            expected: N,
            actual: buf.remaining(),
        });
    }
    let mut out = [0u8; N];
    buf.copy_to_slice(&mut out);
    Ok(out)
}

/// Read a 24-bit unsigned integer, little-endian. Callers check the
/// remaining length first.
pub fn read_u24_le(buf: &mut impl Buf) -> u32 {
    buf.get_uint_le(3) as u32
}

/// Write the low 24 bits of `val`, little-endian.
pub fn write_u24_le(buf: &mut impl BufMut, val: u32) {
    buf.put_uint_le(u64::from(val & 0x00FF_FFFF), 3);
}

/// Consume the 16-byte offline message id, rejecting anything else.
pub fn read_magic(buf: &mut impl Buf) -> Result<(), RakNetError> {
    match take::<16>(buf)? {
        RAKNET_MAGIC => Ok(()),
        _ => Err(RakNetError::InvalidMagic),
    }
}

/// Write the 16-byte offline message id.
pub fn write_magic(buf: &mut impl BufMut) {
    buf.put_slice(&RAKNET_MAGIC);
}

/// Read a UTF-8 string prefixed by a u16 BE length.
pub fn read_string(buf: &mut impl Buf) -> Result<String, RakNetError> {
    let len = u16::from_be_bytes(take::<2>(buf)?) as usize;
    if buf.remaining() < len {
        return Err(RakNetError::DatagramTooShort {
            expected: len,
            actual: buf.remaining(),
        });
    }
    let mut raw = vec![0u8; len];
    buf.copy_to_slice(&mut raw);
    String::from_utf8(raw).map_err(|_| RakNetError::InvalidUtf8)
}

/// Write a UTF-8 string prefixed by a u16 BE length.
pub fn write_string(buf: &mut impl BufMut, s: &str) {
    let raw = s.as_bytes();
    buf.put_u16(raw.len() as u16);
    buf.put_slice(raw);
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;
    use std::io::Cursor;

    #[test]
    fn u24_le_roundtrip() {
        for val in [0u32, 1, 255, 256, 0x01_0000, 0xFF_FFFF] {
            let mut buf = BytesMut::new();
            write_u24_le(&mut buf, val);
            assert_eq!(buf.len(), 3);
            let mut cursor = Cursor::new(&buf[..]);
            assert_eq!(read_u24_le(&mut cursor), val);
        }
    }

    #[test]
    fn u24_le_discards_high_byte() {
        let mut buf = BytesMut::new();
        write_u24_le(&mut buf, 0xAB_12_34_56);
        assert_eq!(buf.len(), 3);
        let mut cursor = Cursor::new(&buf[..]);
        assert_eq!(read_u24_le(&mut cursor), 0x12_34_56);
    }

    #[test]
    fn magic_roundtrip() {
        let mut buf = BytesMut::new();
        write_magic(&mut buf);
        let mut cursor = Cursor::new(&buf[..]);
        assert!(read_magic(&mut cursor).is_ok());
    }

    #[test]
    fn magic_rejects_corruption() {
        let mut bad = RAKNET_MAGIC;
        bad[3] ^= 0x10;
        let mut cursor = Cursor::new(&bad[..]);
        assert!(matches!(
            read_magic(&mut cursor),
            Err(RakNetError::InvalidMagic)
        ));
    }

    #[test]
    fn magic_rejects_truncation() {
        let mut cursor = Cursor::new(&RAKNET_MAGIC[..10]);
        assert!(matches!(
            read_magic(&mut cursor),
            Err(RakNetError::DatagramTooShort { .. })
        ));
    }

    #[test]
    fn string_roundtrip() {
        let mut buf = BytesMut::new();
        write_string(&mut buf, "MCPE;Bluestone");
        let mut cursor = Cursor::new(&buf[..]);
        assert_eq!(read_string(&mut cursor).unwrap(), "MCPE;Bluestone");
    }

    #[test]
    fn string_rejects_short_body() {
        let mut buf = BytesMut::new();
        buf.put_u16(10);
        buf.put_slice(b"abc");
        let mut cursor = Cursor::new(&buf[..]);
        assert!(matches!(
            read_string(&mut cursor),
            Err(RakNetError::DatagramTooShort { .. })
        ));
    }
}
