use std::collections::BTreeMap;

use bytes::Bytes;

use crate::constants::{MAX_ORDER_CHANNEL_BUFFER, NUM_ORDER_CHANNELS};

/// Per-channel ordering state for the 32 RakNet ordering channels.
/// Channels are independent: a stalled head on one channel never blocks
/// delivery on another.
pub struct OrderingChannels {
    channels: [OrderChannel; NUM_ORDER_CHANNELS],
}

#[derive(Default)]
struct OrderChannel {
    /// Next ordered index this channel will surface.
    expected_index: u32,
    /// Out-of-order frames waiting for their predecessors.
    buffer: BTreeMap<u32, Bytes>,
    /// High-water mark for sequenced delivery.
    highest_sequenced_index: Option<u32>,
}

impl OrderingChannels {
    pub fn new() -> Self {
        Self {
            channels: std::array::from_fn(|_| OrderChannel::default()),
        }
    }

    /// Insert an ordered frame. Returns the payloads that become
    /// deliverable, in channel order: the frame itself if it is the
    /// expected head, followed by any buffered successors it unblocks.
    pub fn insert_ordered(&mut self, channel: u8, ordered_index: u32, body: Bytes) -> Vec<Bytes> {
        let ch = &mut self.channels[channel as usize % NUM_ORDER_CHANNELS];

        if ordered_index < ch.expected_index {
            return Vec::new(); // already surfaced
        }

        if ordered_index == ch.expected_index {
            let mut result = vec![body];
            ch.expected_index += 1;
            while let Some(next) = ch.buffer.remove(&ch.expected_index) {
                result.push(next);
                ch.expected_index += 1;
            }
            result
        } else {
            if ch.buffer.len() < MAX_ORDER_CHANNEL_BUFFER {
                ch.buffer.insert(ordered_index, body);
            }
            Vec::new()
        }
    }

    /// Insert a sequenced frame. Frames at or below the channel's
    /// high-water mark are dropped silently.
    pub fn insert_sequenced(
        &mut self,
        channel: u8,
        sequenced_index: u32,
        body: Bytes,
    ) -> Option<Bytes> {
        let ch = &mut self.channels[channel as usize % NUM_ORDER_CHANNELS];
        match ch.highest_sequenced_index {
            Some(highest) if sequenced_index <= highest => None,
            _ => {
                ch.highest_sequenced_index = Some(sequenced_index);
                Some(body)
            }
        }
    }
}

impl Default for OrderingChannels {
    fn default() -> Self {
        Self::new()
    }
}
