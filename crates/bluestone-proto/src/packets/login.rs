//! Login (0x01) — Client → Server.
//!
//! Wire format:
//! ```text
//! i32_be:     protocol_version
//! VarUInt32:  body_length
//!   i32_le:   chain_length + chain JSON ({"chain": [...]})
//!   i32_le:   client_length + client blob
//! ```
//! The chain entries are opaque credential objects; only their shape is
//! validated here, never their signatures.

use bytes::{Buf, BufMut, Bytes};

use crate::codec::{ensure, ProtoDecode, ProtoEncode};
use crate::error::ProtoError;
use crate::types::VarUInt32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Login {
    pub protocol_version: i32,
    /// Raw chain JSON, exactly as received.
    pub chain: Bytes,
    /// Raw client blob (skin and device data), exactly as received.
    pub client_data: Bytes,
}

/// Identity fields pulled out of the first usable chain entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginIdentity {
    pub display_name: String,
    pub identity: String,
}

impl Login {
    /// Validate the chain shape and extract the player identity.
    /// Token contents beyond `extraData` stay opaque.
    pub fn identity(&self) -> Result<LoginIdentity, ProtoError> {
        let value: serde_json::Value = serde_json::from_slice(&self.chain)
            .map_err(|e| ProtoError::JsonParse(e.to_string()))?;
        let entries = value
            .get("chain")
            .and_then(|v| v.as_array())
            .ok_or_else(|| ProtoError::InvalidLogin("missing 'chain' array".into()))?;

        for entry in entries {
            let Some(extra) = entry.get("extraData") else {
                continue;
            };
            let display_name = extra
                .get("displayName")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_owned();
            let identity = extra
                .get("identity")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_owned();
            if display_name.is_empty() {
                continue;
            }
            return Ok(LoginIdentity {
                display_name,
                identity,
            });
        }
        Err(ProtoError::InvalidLogin(
            "no chain entry carries extraData.displayName".into(),
        ))
    }
}

impl ProtoEncode for Login {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i32(self.protocol_version);
        let body_len = 4 + self.chain.len() + 4 + self.client_data.len();
        VarUInt32(body_len as u32).proto_encode(buf);
        buf.put_i32_le(self.chain.len() as i32);
        buf.put_slice(&self.chain);
        buf.put_i32_le(self.client_data.len() as i32);
        buf.put_slice(&self.client_data);
    }
}

impl ProtoDecode for Login {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        ensure(buf, 4)?;
        let protocol_version = buf.get_i32();

        let body_len = VarUInt32::proto_decode(buf)?.0 as usize;
        ensure(buf, body_len)?;

        ensure(buf, 4)?;
        let chain_len = buf.get_i32_le().max(0) as usize;
        ensure(buf, chain_len)?;
        let chain = buf.copy_to_bytes(chain_len);

        ensure(buf, 4)?;
        let client_len = buf.get_i32_le().max(0) as usize;
        ensure(buf, client_len)?;
        let client_data = buf.copy_to_bytes(client_len);

        Ok(Self {
            protocol_version,
            chain,
            client_data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    fn sample_chain() -> &'static str {
        r#"{"chain":[{"extraData":{"XUID":"","identity":"af3a-77","displayName":"Steve"},"identityPublicKey":""}]}"#
    }

    fn sample_login() -> Login {
        Login {
            protocol_version: 160,
            chain: Bytes::from_static(sample_chain().as_bytes()),
            client_data: Bytes::from_static(b"{\"SkinId\":\"Standard_Custom\"}"),
        }
    }

    #[test]
    fn roundtrip_is_bit_exact() {
        let pkt = sample_login();
        let mut buf = BytesMut::new();
        pkt.proto_encode(&mut buf);
        let bytes = buf.freeze();
        let decoded = Login::proto_decode(&mut bytes.clone()).unwrap();
        assert_eq!(decoded, pkt);

        let mut reencoded = BytesMut::new();
        decoded.proto_encode(&mut reencoded);
        assert_eq!(reencoded.freeze(), bytes);
    }

    #[test]
    fn identity_extracted() {
        let ident = sample_login().identity().unwrap();
        assert_eq!(ident.display_name, "Steve");
        assert_eq!(ident.identity, "af3a-77");
    }

    #[test]
    fn chain_without_display_name_rejected() {
        let login = Login {
            protocol_version: 160,
            chain: Bytes::from_static(br#"{"chain":[{"identityPublicKey":""}]}"#),
            client_data: Bytes::new(),
        };
        assert!(login.identity().is_err());
    }

    #[test]
    fn malformed_chain_json_rejected() {
        let login = Login {
            protocol_version: 160,
            chain: Bytes::from_static(b"not json"),
            client_data: Bytes::new(),
        };
        assert!(login.identity().is_err());
    }

    #[test]
    fn truncated_login_rejected() {
        let data = bytes::Bytes::from_static(&[0, 0, 0, 160, 0x05, 0x01]);
        assert!(Login::proto_decode(&mut data.clone()).is_err());
    }
}
