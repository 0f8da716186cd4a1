//! Disconnect (0x05) — Server → Client.

use bytes::{Buf, BufMut};

use crate::codec::{ensure, read_string, write_string, ProtoDecode, ProtoEncode};
use crate::error::ProtoError;

/// Graceful shutdown notice. When `hide_screen` is set no message
/// follows on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disconnect {
    pub hide_screen: bool,
    pub message: String,
}

impl Disconnect {
    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            hide_screen: false,
            message: message.into(),
        }
    }

    pub fn silent() -> Self {
        Self {
            hide_screen: true,
            message: String::new(),
        }
    }
}

impl ProtoEncode for Disconnect {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(self.hide_screen as u8);
        if !self.hide_screen {
            write_string(buf, &self.message);
        }
    }
}

impl ProtoDecode for Disconnect {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        ensure(buf, 1)?;
        let hide_screen = buf.get_u8() != 0;
        let message = if hide_screen {
            String::new()
        } else {
            read_string(buf)?
        };
        Ok(Self {
            hide_screen,
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn roundtrip_with_message() {
        let pkt = Disconnect::with_message("Server closed");
        let mut buf = BytesMut::new();
        pkt.proto_encode(&mut buf);
        assert_eq!(Disconnect::proto_decode(&mut buf.freeze()).unwrap(), pkt);
    }

    #[test]
    fn silent_is_one_byte() {
        let mut buf = BytesMut::new();
        Disconnect::silent().proto_encode(&mut buf);
        assert_eq!(&buf[..], &[0x01]);
    }
}
