//! Text (0x09) — both directions.
//!
//! Chat, system and translated messages. Which fields appear depends on
//! the message type.

use bytes::{Buf, BufMut};

use crate::codec::{ensure, read_string, write_string, ProtoDecode, ProtoEncode};
use crate::error::ProtoError;
use crate::types::VarUInt32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TextType {
    Raw = 0,
    Chat = 1,
    Translation = 2,
    Popup = 3,
    JukeboxPopup = 4,
    Tip = 5,
    System = 6,
    Whisper = 7,
    Announcement = 8,
}

impl TextType {
    fn from_u8(v: u8) -> Result<Self, ProtoError> {
        match v {
            0 => Ok(Self::Raw),
            1 => Ok(Self::Chat),
            2 => Ok(Self::Translation),
            3 => Ok(Self::Popup),
            4 => Ok(Self::JukeboxPopup),
            5 => Ok(Self::Tip),
            6 => Ok(Self::System),
            7 => Ok(Self::Whisper),
            8 => Ok(Self::Announcement),
            other => Err(ProtoError::InvalidData(format!("unknown TextType {other}"))),
        }
    }

    fn has_source(self) -> bool {
        matches!(self, Self::Chat | Self::Whisper | Self::Announcement)
    }

    fn has_parameters(self) -> bool {
        matches!(self, Self::Translation | Self::Popup | Self::JukeboxPopup)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Text {
    pub text_type: TextType,
    pub needs_translation: bool,
    pub source_name: String,
    pub message: String,
    pub parameters: Vec<String>,
    pub xuid: String,
}

impl Text {
    pub fn raw(message: impl Into<String>) -> Self {
        Self {
            text_type: TextType::Raw,
            needs_translation: false,
            source_name: String::new(),
            message: message.into(),
            parameters: Vec::new(),
            xuid: String::new(),
        }
    }

    pub fn system(message: impl Into<String>) -> Self {
        Self {
            text_type: TextType::System,
            ..Self::raw(message)
        }
    }

    pub fn chat(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            text_type: TextType::Chat,
            source_name: source.into(),
            ..Self::raw(message)
        }
    }
}

impl ProtoEncode for Text {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(self.text_type as u8);
        buf.put_u8(self.needs_translation as u8);
        if self.text_type.has_source() {
            write_string(buf, &self.source_name);
        }
        write_string(buf, &self.message);
        if self.text_type.has_parameters() {
            VarUInt32(self.parameters.len() as u32).proto_encode(buf);
            for param in &self.parameters {
                write_string(buf, param);
            }
        }
        write_string(buf, &self.xuid);
    }
}

impl ProtoDecode for Text {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        ensure(buf, 2)?;
        let text_type = TextType::from_u8(buf.get_u8())?;
        let needs_translation = buf.get_u8() != 0;

        let source_name = if text_type.has_source() {
            read_string(buf)?
        } else {
            String::new()
        };
        let message = read_string(buf)?;
        let parameters = if text_type.has_parameters() {
            let count = VarUInt32::proto_decode(buf)?.0 as usize;
            let mut params = Vec::with_capacity(count.min(16));
            for _ in 0..count {
                params.push(read_string(buf)?);
            }
            params
        } else {
            Vec::new()
        };
        let xuid = read_string(buf)?;

        Ok(Self {
            text_type,
            needs_translation,
            source_name,
            message,
            parameters,
            xuid,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn roundtrip_raw() {
        let pkt = Text::raw("hello");
        let mut buf = BytesMut::new();
        pkt.proto_encode(&mut buf);
        assert_eq!(Text::proto_decode(&mut buf.freeze()).unwrap(), pkt);
    }

    #[test]
    fn roundtrip_chat_with_source() {
        let pkt = Text {
            xuid: "2535414".into(),
            ..Text::chat("Steve", "hi all")
        };
        let mut buf = BytesMut::new();
        pkt.proto_encode(&mut buf);
        let decoded = Text::proto_decode(&mut buf.freeze()).unwrap();
        assert_eq!(decoded.source_name, "Steve");
        assert_eq!(decoded, pkt);
    }

    #[test]
    fn roundtrip_translation_with_parameters() {
        let pkt = Text {
            text_type: TextType::Translation,
            needs_translation: true,
            source_name: String::new(),
            message: "chat.type.text".into(),
            parameters: vec!["Steve".into(), "hello".into()],
            xuid: String::new(),
        };
        let mut buf = BytesMut::new();
        pkt.proto_encode(&mut buf);
        assert_eq!(Text::proto_decode(&mut buf.freeze()).unwrap(), pkt);
    }

    #[test]
    fn unknown_type_rejected() {
        let data = bytes::Bytes::from_static(&[0x0B, 0x00]);
        assert!(Text::proto_decode(&mut data.clone()).is_err());
    }
}
