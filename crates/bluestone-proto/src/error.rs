//! Protocol-level errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtoError {
    #[error("buffer too short: need {needed} more bytes, have {remaining}")]
    BufferTooShort { needed: usize, remaining: usize },

    #[error("VarInt encoding error: {0}")]
    VarInt(#[from] crate::types::VarIntError),

    #[error("invalid UTF-8 string")]
    InvalidUtf8,

    #[error("decompression error: {0}")]
    Decompress(String),

    #[error("compression error: {0}")]
    Compress(String),

    #[error("unknown packet id: 0x{0:02X}")]
    UnknownPacketId(u32),

    #[error("JSON parse error: {0}")]
    JsonParse(String),

    #[error("invalid login data: {0}")]
    InvalidLogin(String),

    #[error("invalid data: {0}")]
    InvalidData(String),
}
