//! The frame envelope: reliability flags, ordering indices, and split
//! descriptors, packed back-to-back inside a numbered frame set.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::codec::{read_u24_le, write_u24_le};
use crate::error::RakNetError;

/// Reliability modes carried in bits 7..5 of the frame flags byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Reliability {
    Unreliable = 0,
    UnreliableSequenced = 1,
    Reliable = 2,
    ReliableOrdered = 3,
    ReliableSequenced = 4,
    UnreliableWithAckReceipt = 5,
    ReliableWithAckReceipt = 6,
    ReliableOrderedWithAckReceipt = 7,
}

impl Reliability {
    pub fn from_u8(v: u8) -> Result<Self, RakNetError> {
        match v {
            0 => Ok(Self::Unreliable),
            1 => Ok(Self::UnreliableSequenced),
            2 => Ok(Self::Reliable),
            3 => Ok(Self::ReliableOrdered),
            4 => Ok(Self::ReliableSequenced),
            5 => Ok(Self::UnreliableWithAckReceipt),
            6 => Ok(Self::ReliableWithAckReceipt),
            7 => Ok(Self::ReliableOrderedWithAckReceipt),
            _ => Err(RakNetError::InvalidReliability(v)),
        }
    }

    pub fn is_reliable(self) -> bool {
        matches!(
            self,
            Self::Reliable
                | Self::ReliableOrdered
                | Self::ReliableSequenced
                | Self::ReliableWithAckReceipt
                | Self::ReliableOrderedWithAckReceipt
        )
    }

    pub fn is_ordered(self) -> bool {
        matches!(
            self,
            Self::ReliableOrdered | Self::ReliableOrderedWithAckReceipt
        )
    }

    pub fn is_sequenced(self) -> bool {
        matches!(self, Self::UnreliableSequenced | Self::ReliableSequenced)
    }
}

/// Fragmentation header for split frames.
#[derive(Debug, Clone, Copy)]
pub struct SplitInfo {
    pub count: u32,
    pub id: u16,
    pub index: u32,
}

/// One frame inside a frame set.
#[derive(Debug, Clone)]
pub struct Frame {
    pub reliability: Reliability,
    pub reliable_index: Option<u32>,
    pub sequenced_index: Option<u32>,
    pub ordered_index: Option<u32>,
    pub order_channel: Option<u8>,
    pub split: Option<SplitInfo>,
    pub body: Bytes,
}

impl Frame {
    pub fn decode(buf: &mut impl Buf) -> Result<Self, RakNetError> {
        if buf.remaining() < 3 {
            return Err(RakNetError::DatagramTooShort {
                expected: 3,
                actual: buf.remaining(),
            });
        }

        let flags = buf.get_u8();
        let reliability = Reliability::from_u8((flags >> 5) & 0x07)?;
        let is_split = (flags >> 4) & 0x01 == 1;

        // Payload length is transmitted in bits.
        let body_length = (buf.get_u16() as usize).div_ceil(8);

        let mut header_len = 0usize;
        if reliability.is_reliable() {
            header_len += 3;
        }
        if reliability.is_sequenced() {
            header_len += 3;
        }
        if reliability.is_ordered() || reliability.is_sequenced() {
            header_len += 4;
        }
        if is_split {
            header_len += 10;
        }
        if buf.remaining() < header_len {
            return Err(RakNetError::DatagramTooShort {
                expected: header_len,
                actual: buf.remaining(),
            });
        }

        let reliable_index = reliability.is_reliable().then(|| read_u24_le(buf));
        let sequenced_index = reliability.is_sequenced().then(|| read_u24_le(buf));

        let (ordered_index, order_channel) =
            if reliability.is_ordered() || reliability.is_sequenced() {
                (Some(read_u24_le(buf)), Some(buf.get_u8()))
            } else {
                (None, None)
            };

        let split = if is_split {
            Some(SplitInfo {
                count: buf.get_u32(),
                id: buf.get_u16(),
                index: buf.get_u32(),
            })
        } else {
            None
        };

        if buf.remaining() < body_length {
            return Err(RakNetError::DatagramTooShort {
                expected: body_length,
                actual: buf.remaining(),
            });
        }
        let body = buf.copy_to_bytes(body_length);

        Ok(Self {
            reliability,
            reliable_index,
            sequenced_index,
            ordered_index,
            order_channel,
            split,
            body,
        })
    }

    pub fn encode(&self, buf: &mut BytesMut) {
        let mut flags = (self.reliability as u8) << 5;
        if self.split.is_some() {
            flags |= 1 << 4;
        }
        buf.put_u8(flags);
        buf.put_u16((self.body.len() * 8) as u16);

        if let Some(idx) = self.reliable_index {
            write_u24_le(buf, idx);
        }
        if let Some(idx) = self.sequenced_index {
            write_u24_le(buf, idx);
        }
        if let Some(idx) = self.ordered_index {
            write_u24_le(buf, idx);
            buf.put_u8(self.order_channel.unwrap_or(0));
        }
        if let Some(split) = &self.split {
            buf.put_u32(split.count);
            buf.put_u16(split.id);
            buf.put_u32(split.index);
        }
        buf.put_slice(&self.body);
    }

    /// Encoded size in bytes, for MTU packing.
    pub fn encoded_size(&self) -> usize {
        let mut size = 1 + 2 + self.body.len();
        if self.reliability.is_reliable() {
            size += 3;
        }
        if self.reliability.is_sequenced() {
            size += 3;
        }
        if self.reliability.is_ordered() || self.reliability.is_sequenced() {
            size += 4;
        }
        if self.split.is_some() {
            size += 10;
        }
        size
    }
}

/// A numbered set of frames, sent as one UDP datagram. The sequence
/// number is the ACK/NACK domain.
#[derive(Debug)]
pub struct FrameSet {
    pub sequence_number: u32,
    pub frames: Vec<Frame>,
}

impl FrameSet {
    /// Canonical frame-set id used for outgoing datagrams. 0x80 and 0x8C
    /// are accepted on decode; all three dispatch identically.
    pub const ID: u8 = 0x84;

    pub fn decode(data: &[u8]) -> Result<Self, RakNetError> {
        if data.len() < 4 {
            return Err(RakNetError::DatagramTooShort {
                expected: 4,
                actual: data.len(),
            });
        }
        let mut buf = std::io::Cursor::new(data);
        let _packet_id = buf.get_u8();
        let sequence_number = read_u24_le(&mut buf);

        let mut frames = Vec::new();
        while buf.remaining() > 0 {
            frames.push(Frame::decode(&mut buf)?);
        }

        Ok(Self {
            sequence_number,
            frames,
        })
    }

    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8(Self::ID);
        write_u24_le(buf, self.sequence_number);
        for frame in &self.frames {
            frame.encode(buf);
        }
    }
}

/// An ACK (0xC0) or NACK (0xA0) datagram.
#[derive(Debug)]
pub struct AckNack {
    pub is_ack: bool,
    pub records: Vec<AckRecord>,
}

/// One acknowledgement record: a single sequence number or an inclusive
/// range.
#[derive(Debug, Clone)]
pub enum AckRecord {
    Single(u32),
    Range { min: u32, max: u32 },
}

impl AckRecord {
    pub fn from_bounds(min: u32, max: u32) -> Self {
        if min == max {
            Self::Single(min)
        } else {
            Self::Range { min, max }
        }
    }
}

impl AckNack {
    pub const ACK_ID: u8 = 0xC0;
    pub const NACK_ID: u8 = 0xA0;

    pub fn decode(data: &[u8]) -> Result<Self, RakNetError> {
        if data.len() < 3 {
            return Err(RakNetError::DatagramTooShort {
                expected: 3,
                actual: data.len(),
            });
        }
        let mut buf = std::io::Cursor::new(data);
        let packet_id = buf.get_u8();
        let is_ack = packet_id == Self::ACK_ID;
        let record_count = buf.get_u16() as usize;

        let mut records = Vec::with_capacity(record_count.min(256));
        for _ in 0..record_count {
            if buf.remaining() < 4 {
                return Err(RakNetError::DatagramTooShort {
                    expected: 4,
                    actual: buf.remaining(),
                });
            }
            // Flag 1 = single, 0 = range.
            if buf.get_u8() == 1 {
                records.push(AckRecord::Single(read_u24_le(&mut buf)));
            } else {
                if buf.remaining() < 6 {
                    return Err(RakNetError::DatagramTooShort {
                        expected: 6,
                        actual: buf.remaining(),
                    });
                }
                let min = read_u24_le(&mut buf);
                let max = read_u24_le(&mut buf);
                records.push(AckRecord::Range { min, max });
            }
        }

        Ok(Self { is_ack, records })
    }

    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8(if self.is_ack {
            Self::ACK_ID
        } else {
            Self::NACK_ID
        });
        buf.put_u16(self.records.len() as u16);
        for record in &self.records {
            match record {
                AckRecord::Single(seq) => {
                    buf.put_u8(1);
                    write_u24_le(buf, *seq);
                }
                AckRecord::Range { min, max } => {
                    buf.put_u8(0);
                    write_u24_le(buf, *min);
                    write_u24_le(buf, *max);
                }
            }
        }
    }
}
