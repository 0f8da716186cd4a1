//! PlayStatus (0x02) — Server → Client.

use bytes::{Buf, BufMut};

use crate::codec::{ensure, ProtoDecode, ProtoEncode};
use crate::error::ProtoError;

/// The seven status codes a server can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum PlayStatusType {
    LoginSuccess = 0,
    LoginFailedClient = 1,
    LoginFailedServer = 2,
    PlayerSpawn = 3,
    LoginFailedInvalidTenant = 4,
    LoginFailedVanillaEdu = 5,
    LoginFailedEduVanilla = 6,
}

impl PlayStatusType {
    fn from_i32(v: i32) -> Result<Self, ProtoError> {
        match v {
            0 => Ok(Self::LoginSuccess),
            1 => Ok(Self::LoginFailedClient),
            2 => Ok(Self::LoginFailedServer),
            3 => Ok(Self::PlayerSpawn),
            4 => Ok(Self::LoginFailedInvalidTenant),
            5 => Ok(Self::LoginFailedVanillaEdu),
            6 => Ok(Self::LoginFailedEduVanilla),
            other => Err(ProtoError::InvalidData(format!(
                "unknown PlayStatus code {other}"
            ))),
        }
    }
}

/// Login result, or the marker that the player may spawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayStatus {
    pub status: PlayStatusType,
}

impl ProtoEncode for PlayStatus {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i32(self.status as i32);
    }
}

impl ProtoDecode for PlayStatus {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        ensure(buf, 4)?;
        Ok(Self {
            status: PlayStatusType::from_i32(buf.get_i32())?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn login_success_wire_form() {
        let mut buf = BytesMut::new();
        PlayStatus {
            status: PlayStatusType::LoginSuccess,
        }
        .proto_encode(&mut buf);
        assert_eq!(&buf[..], &[0, 0, 0, 0]);
    }

    #[test]
    fn roundtrip_all_codes() {
        for status in [
            PlayStatusType::LoginSuccess,
            PlayStatusType::LoginFailedClient,
            PlayStatusType::LoginFailedServer,
            PlayStatusType::PlayerSpawn,
            PlayStatusType::LoginFailedInvalidTenant,
            PlayStatusType::LoginFailedVanillaEdu,
            PlayStatusType::LoginFailedEduVanilla,
        ] {
            let pkt = PlayStatus { status };
            let mut buf = BytesMut::new();
            pkt.proto_encode(&mut buf);
            assert_eq!(PlayStatus::proto_decode(&mut buf.freeze()).unwrap(), pkt);
        }
    }

    #[test]
    fn unknown_code_rejected() {
        let data = bytes::Bytes::from_static(&[0, 0, 0, 9]);
        assert!(PlayStatus::proto_decode(&mut data.clone()).is_err());
    }
}
