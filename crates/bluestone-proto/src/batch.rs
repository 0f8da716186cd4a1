//! The batch envelope: a zlib stream of length-prefixed game packets,
//! carried behind the 0xFE marker in a RakNet frame.

use std::io::{Cursor, Read, Write};

use bytes::{Buf, BufMut, Bytes, BytesMut};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::codec::{ProtoDecode, ProtoEncode};
use crate::error::ProtoError;
use crate::types::VarUInt32;

/// Compression level used for batches at or above the threshold.
const COMPRESS_LEVEL: u32 = 7;

/// Batch codec settings.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Bodies shorter than this are stored (deflate level 0).
    pub compress_threshold: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            compress_threshold: 512,
        }
    }
}

/// Inflate a batch payload (0xFE already stripped) into its packets.
/// Each returned `Bytes` is one record: VarUInt32 packet id + fields.
/// Any deflate level is accepted.
pub fn decode_batch(data: &[u8]) -> Result<Vec<Bytes>, ProtoError> {
    let mut decoder = ZlibDecoder::new(data);
    let mut inflated = Vec::new();
    decoder
        .read_to_end(&mut inflated)
        .map_err(|e| ProtoError::Decompress(e.to_string()))?;
    let inflated = Bytes::from(inflated);

    let mut cursor = Cursor::new(&inflated[..]);
    let mut packets = Vec::new();
    while cursor.has_remaining() {
        let len = VarUInt32::proto_decode(&mut cursor)?.0 as usize;
        if cursor.remaining() < len {
            return Err(ProtoError::BufferTooShort {
                needed: len,
                remaining: cursor.remaining(),
            });
        }
        let start = cursor.position() as usize;
        packets.push(inflated.slice(start..start + len));
        cursor.set_position((start + len) as u64);
    }
    Ok(packets)
}

/// Deflate packets into one batch body. Small batches are stored rather
/// than compressed; the cutoff comes from configuration.
pub fn encode_batch(packets: &[Bytes], config: &BatchConfig) -> Result<Bytes, ProtoError> {
    let mut body = BytesMut::new();
    for packet in packets {
        VarUInt32(packet.len() as u32).proto_encode(&mut body);
        body.put_slice(packet);
    }

    let level = if body.len() < config.compress_threshold {
        Compression::none()
    } else {
        Compression::new(COMPRESS_LEVEL)
    };

    let mut encoder = ZlibEncoder::new(Vec::new(), level);
    encoder
        .write_all(&body)
        .map_err(|e| ProtoError::Compress(e.to_string()))?;
    let deflated = encoder
        .finish()
        .map_err(|e| ProtoError::Compress(e.to_string()))?;
    Ok(Bytes::from(deflated))
}

/// Encode one packet (id + fields) as a record ready for batching.
pub fn encode_record(packet_id: u32, packet: &impl ProtoEncode) -> Bytes {
    let mut buf = BytesMut::new();
    VarUInt32(packet_id).proto_encode(&mut buf);
    packet.proto_encode(&mut buf);
    buf.freeze()
}

/// Split a record into its packet id and body.
pub fn split_record(record: Bytes) -> Result<(u32, Bytes), ProtoError> {
    let mut cursor = Cursor::new(&record[..]);
    let id = VarUInt32::proto_decode(&mut cursor)?.0;
    let offset = cursor.position() as usize;
    Ok((id, record.slice(offset..)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: u32, data: &[u8]) -> Bytes {
        let mut buf = BytesMut::new();
        VarUInt32(id).proto_encode(&mut buf);
        buf.put_slice(data);
        buf.freeze()
    }

    #[test]
    fn single_packet_roundtrip() {
        let config = BatchConfig::default();
        let pkt = record(0x02, &[0, 0, 0, 0]);
        let batch = encode_batch(std::slice::from_ref(&pkt), &config).unwrap();
        let decoded = decode_batch(&batch).unwrap();
        assert_eq!(decoded, vec![pkt]);
    }

    #[test]
    fn multiple_packets_preserve_order() {
        let config = BatchConfig::default();
        let packets: Vec<Bytes> = (0u32..5)
            .map(|i| record(i, format!("data-{i}").as_bytes()))
            .collect();
        let batch = encode_batch(&packets, &config).unwrap();
        assert_eq!(decode_batch(&batch).unwrap(), packets);
    }

    #[test]
    fn small_batch_is_stored() {
        let config = BatchConfig::default();
        let pkt = record(0x09, b"tiny");
        let batch = encode_batch(std::slice::from_ref(&pkt), &config).unwrap();
        // Deflate level 0 emits stored blocks: the record bytes appear
        // verbatim inside the stream.
        let needle = b"tiny";
        assert!(batch.windows(needle.len()).any(|w| w == needle));
        assert_eq!(decode_batch(&batch).unwrap(), vec![pkt]);
    }

    #[test]
    fn large_batch_is_compressed() {
        let config = BatchConfig::default();
        let pkt = record(0x3A, &vec![0x42u8; 4096]);
        let batch = encode_batch(std::slice::from_ref(&pkt), &config).unwrap();
        assert!(batch.len() < 1024, "highly repetitive body must shrink");
        assert_eq!(decode_batch(&batch).unwrap(), vec![pkt]);
    }

    #[test]
    fn decoder_accepts_any_level() {
        let body = {
            let mut buf = BytesMut::new();
            let pkt = record(0x01, b"payload");
            VarUInt32(pkt.len() as u32).proto_encode(&mut buf);
            buf.put_slice(&pkt);
            buf
        };
        for level in [0u32, 1, 6, 9] {
            let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(level));
            encoder.write_all(&body).unwrap();
            let deflated = encoder.finish().unwrap();
            let decoded = decode_batch(&deflated).unwrap();
            assert_eq!(decoded.len(), 1);
        }
    }

    #[test]
    fn empty_batch() {
        let config = BatchConfig::default();
        let batch = encode_batch(&[], &config).unwrap();
        assert!(decode_batch(&batch).unwrap().is_empty());
    }

    #[test]
    fn truncated_record_rejected() {
        let mut body = BytesMut::new();
        VarUInt32(10).proto_encode(&mut body); // claims 10 bytes
        body.put_slice(b"abc"); // provides 3
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::none());
        encoder.write_all(&body).unwrap();
        let deflated = encoder.finish().unwrap();
        assert!(decode_batch(&deflated).is_err());
    }

    #[test]
    fn record_split() {
        let rec = encode_record(0x45, &crate::types::VarInt(8));
        let (id, body) = split_record(rec).unwrap();
        assert_eq!(id, 0x45);
        assert_eq!(&body[..], &[0x10]); // zigzag(8)
    }
}
