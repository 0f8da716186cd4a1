use thiserror::Error;

#[derive(Debug, Error)]
pub enum RakNetError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("datagram too short: expected at least {expected} bytes, got {actual}")]
    DatagramTooShort { expected: usize, actual: usize },

    #[error("invalid offline message id")]
    InvalidMagic,

    #[error("unknown packet id: 0x{0:02X}")]
    UnknownPacketId(u8),

    #[error("invalid address version: {0}")]
    InvalidAddressVersion(u8),

    #[error("invalid reliability id: {0}")]
    InvalidReliability(u8),

    #[error("split error: {0}")]
    Split(String),

    #[error("invalid UTF-8 in packet")]
    InvalidUtf8,
}
