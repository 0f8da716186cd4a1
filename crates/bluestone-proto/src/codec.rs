//! Encoding/decoding traits and the string/blob helpers built on them.

use bytes::{Buf, BufMut, Bytes};

use crate::error::ProtoError;
use crate::types::VarUInt32;

/// Encode a value onto a buffer.
pub trait ProtoEncode {
    fn proto_encode(&self, buf: &mut impl BufMut);
}

/// Decode a value from a buffer.
pub trait ProtoDecode: Sized {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError>;
}

/// Write a Bedrock string (VarUInt32 length + UTF-8 bytes).
pub fn write_string(buf: &mut impl BufMut, s: &str) {
    VarUInt32(s.len() as u32).proto_encode(buf);
    buf.put_slice(s.as_bytes());
}

/// Read a Bedrock string (VarUInt32 length + UTF-8 bytes).
pub fn read_string(buf: &mut impl Buf) -> Result<String, ProtoError> {
    let len = VarUInt32::proto_decode(buf)?.0 as usize;
    if buf.remaining() < len {
        return Err(ProtoError::BufferTooShort {
            needed: len,
            remaining: buf.remaining(),
        });
    }
    let data = buf.copy_to_bytes(len);
    String::from_utf8(data.to_vec()).map_err(|_| ProtoError::InvalidUtf8)
}

/// Write a byte blob (VarUInt32 length + bytes).
pub fn write_bytes(buf: &mut impl BufMut, data: &[u8]) {
    VarUInt32(data.len() as u32).proto_encode(buf);
    buf.put_slice(data);
}

/// Read a byte blob (VarUInt32 length + bytes).
pub fn read_bytes(buf: &mut impl Buf) -> Result<Bytes, ProtoError> {
    let len = VarUInt32::proto_decode(buf)?.0 as usize;
    if buf.remaining() < len {
        return Err(ProtoError::BufferTooShort {
            needed: len,
            remaining: buf.remaining(),
        });
    }
    Ok(buf.copy_to_bytes(len))
}

/// Bounds-checked fixed-size read guard.
pub fn ensure(buf: &impl Buf, needed: usize) -> Result<(), ProtoError> {
    if buf.remaining() < needed {
        return Err(ProtoError::BufferTooShort {
            needed,
            remaining: buf.remaining(),
        });
    }
    Ok(())
}
