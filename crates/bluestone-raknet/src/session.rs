//! Per-remote reliable-ordered transport state: send/receive windows,
//! ACK/NACK bookkeeping, retransmission, reassembly, and channel ordering.

use std::collections::{HashMap, HashSet, VecDeque};
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use bytes::{BufMut, Bytes, BytesMut};

use crate::codec::write_u24_le;
use crate::constants::*;
use crate::fragmentation::SplitAssembler;
use crate::ordering::OrderingChannels;
use crate::packet::frame::{AckNack, Frame, FrameSet, Reliability, SplitInfo};
use crate::reliability::{compress_ack_records, expand_ack_records};

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// OpenConnectionRequest1 seen, Reply1 sent.
    Handshake1,
    /// OpenConnectionRequest2 seen, Reply2 sent; MTU is final.
    Handshake2,
    /// ConnectionRequest accepted; frames flow both ways.
    Connected,
    /// Drain in progress; the endpoint removes the session next tick.
    Closing,
}

/// A transmitted frame set kept for retransmission until ACKed.
struct ResendEntry {
    frames: Vec<Frame>,
    sent_at: Instant,
}

/// Timing knobs injected by the endpoint from configuration.
#[derive(Debug, Clone, Copy)]
pub struct SessionTimings {
    pub retransmit_interval: Duration,
    pub inactivity_timeout: Duration,
}

impl Default for SessionTimings {
    fn default() -> Self {
        Self {
            retransmit_interval: DEFAULT_RETRANSMIT_INTERVAL,
            inactivity_timeout: DEFAULT_SESSION_TIMEOUT,
        }
    }
}

/// Per-remote RakNet session.
pub struct RakNetSession {
    pub addr: SocketAddr,
    pub state: SessionState,
    pub mtu: u16,
    pub client_guid: i64,
    pub last_activity: Instant,
    pub last_ping_sent: Instant,
    timings: SessionTimings,

    // Send side.
    send_sequence_number: u32,
    send_reliable_index: u32,
    send_order_index: [u32; NUM_ORDER_CHANNELS],
    split_id_counter: u16,
    send_queue: VecDeque<Frame>,
    resend_queue: HashMap<u32, ResendEntry>,
    /// Set once the resend queue overflows; the endpoint closes us.
    overflowed: bool,

    // Receive side.
    expected_recv_seq: u32,
    received_reliable: HashSet<u32>,
    ack_queue: Vec<u32>,
    nack_queue: Vec<u32>,
    ordering: OrderingChannels,
    splits: SplitAssembler,
}

impl RakNetSession {
    pub fn new(addr: SocketAddr, mtu: u16, client_guid: i64, timings: SessionTimings) -> Self {
        let now = Instant::now();
        Self {
            addr,
            state: SessionState::Handshake1,
            mtu,
            client_guid,
            last_activity: now,
            last_ping_sent: now,
            timings,
            send_sequence_number: 0,
            send_reliable_index: 0,
            send_order_index: [0; NUM_ORDER_CHANNELS],
            split_id_counter: 0,
            send_queue: VecDeque::new(),
            resend_queue: HashMap::new(),
            overflowed: false,
            expected_recv_seq: 0,
            received_reliable: HashSet::new(),
            ack_queue: Vec::new(),
            nack_queue: Vec::new(),
            ordering: OrderingChannels::new(),
            splits: SplitAssembler::new(),
        }
    }

    // -------------------------------------------------------------------
    // Send path
    // -------------------------------------------------------------------

    /// Queue a payload, fragmenting it if it exceeds the MTU budget.
    /// All fragments of one payload share a single ordered index; the
    /// ordering layer sees the reassembled payload as one frame.
    pub fn enqueue(&mut self, body: Bytes, reliability: Reliability, channel: u8) {
        let max_body = self.mtu as usize - MAX_FRAME_OVERHEAD - 4;

        let (ordered_index, order_channel) = if reliability.is_ordered() {
            let ch = channel as usize % NUM_ORDER_CHANNELS;
            let idx = self.send_order_index[ch];
            self.send_order_index[ch] += 1;
            (Some(idx), Some(channel))
        } else {
            (None, None)
        };

        if body.len() > max_body {
            let split_id = self.split_id_counter;
            self.split_id_counter = self.split_id_counter.wrapping_add(1);
            let fragment_max = max_body - 10;
            let split_count = body.len().div_ceil(fragment_max) as u32;

            for i in 0..split_count {
                let start = i as usize * fragment_max;
                let end = ((i as usize + 1) * fragment_max).min(body.len());
                let frame = Frame {
                    reliability,
                    reliable_index: self.next_reliable_index(reliability),
                    sequenced_index: None,
                    ordered_index,
                    order_channel,
                    split: Some(SplitInfo {
                        count: split_count,
                        id: split_id,
                        index: i,
                    }),
                    body: body.slice(start..end),
                };
                self.send_queue.push_back(frame);
            }
        } else {
            let frame = Frame {
                reliability,
                reliable_index: self.next_reliable_index(reliability),
                sequenced_index: None,
                ordered_index,
                order_channel,
                split: None,
                body,
            };
            self.send_queue.push_back(frame);
        }
    }

    fn next_reliable_index(&mut self, reliability: Reliability) -> Option<u32> {
        if reliability.is_reliable() {
            let idx = self.send_reliable_index;
            self.send_reliable_index += 1;
            Some(idx)
        } else {
            None
        }
    }

    /// Pack queued frames into frame sets of at most one MTU each and
    /// return the encoded datagrams. Reliable frame sets are retained
    /// for retransmission until acknowledged.
    pub fn flush_send_queue(&mut self) -> Vec<Bytes> {
        let mut datagrams = Vec::new();

        while !self.send_queue.is_empty() {
            if self.resend_queue.len() >= MAX_RESEND_ENTRIES {
                self.overflowed = true;
                break;
            }

            let seq = self.send_sequence_number;
            self.send_sequence_number += 1;

            let mut buf = BytesMut::with_capacity(self.mtu as usize);
            buf.put_u8(FrameSet::ID);
            write_u24_le(&mut buf, seq);

            let mut frames_in_set = Vec::new();
            let mut any_reliable = false;

            while let Some(front) = self.send_queue.front() {
                if buf.len() + front.encoded_size() > self.mtu as usize {
                    break;
                }
                if let Some(frame) = self.send_queue.pop_front() {
                    frame.encode(&mut buf);
                    any_reliable |= frame.reliability.is_reliable();
                    frames_in_set.push(frame);
                }
            }

            if frames_in_set.is_empty() {
                break; // single frame larger than MTU cannot happen post-split
            }

            if any_reliable {
                self.resend_queue.insert(
                    seq,
                    ResendEntry {
                        frames: frames_in_set,
                        sent_at: Instant::now(),
                    },
                );
            }
            datagrams.push(buf.freeze());
        }

        datagrams
    }

    /// ACK received: stop tracking the acknowledged frame sets.
    pub fn handle_ack(&mut self, ack: &AckNack) {
        for seq in expand_ack_records(&ack.records) {
            self.resend_queue.remove(&seq);
        }
    }

    /// NACK received: requeue the frames of the named frame sets right
    /// away. They will go out under fresh sequence numbers.
    pub fn handle_nack(&mut self, nack: &AckNack) {
        for seq in expand_ack_records(&nack.records) {
            if let Some(entry) = self.resend_queue.remove(&seq) {
                for frame in entry.frames {
                    self.send_queue.push_back(frame);
                }
            }
        }
    }

    /// Requeue frames from frame sets whose ACK is overdue.
    pub fn check_retransmit(&mut self, now: Instant) {
        let interval = self.timings.retransmit_interval;
        let overdue: Vec<u32> = self
            .resend_queue
            .iter()
            .filter(|(_, e)| now.duration_since(e.sent_at) > interval)
            .map(|(&seq, _)| seq)
            .collect();

        for seq in overdue {
            if let Some(entry) = self.resend_queue.remove(&seq) {
                for frame in entry.frames {
                    self.send_queue.push_back(frame);
                }
            }
        }
    }

    /// Whether the resend queue overflowed; the endpoint must close the
    /// session rather than let its memory grow.
    pub fn is_overflowed(&self) -> bool {
        self.overflowed
    }

    // -------------------------------------------------------------------
    // Receive path
    // -------------------------------------------------------------------

    /// Process one incoming frame set and return the payloads that become
    /// deliverable, reassembled and in channel order.
    pub fn process_incoming_frameset(&mut self, frameset: FrameSet) -> Vec<Bytes> {
        let seq = frameset.sequence_number;
        self.ack_queue.push(seq);

        if seq < self.expected_recv_seq {
            // Stale or duplicate datagram: acknowledge it again (the first
            // ACK may have been lost) but drop the frames. Any genuinely
            // missing data returns under a fresh sequence number.
            return Vec::new();
        }
        if seq > self.expected_recv_seq {
            self.nack_queue.extend(self.expected_recv_seq..seq);
        }
        self.expected_recv_seq = seq + 1;

        let mut payloads = Vec::new();

        for frame in frameset.frames {
            // Exactly-once for reliable frames, keyed by reliable index.
            if let Some(idx) = frame.reliable_index {
                if !self.received_reliable.insert(idx) {
                    continue;
                }
            }

            let body = if let Some(ref split) = frame.split {
                match self.splits.insert(split, frame.body) {
                    Ok(Some(assembled)) => assembled,
                    Ok(None) => continue,
                    Err(e) => {
                        tracing::debug!(addr = %self.addr, "split dropped: {e}");
                        continue;
                    }
                }
            } else {
                frame.body
            };

            if frame.reliability.is_ordered() {
                if let (Some(ordered_idx), Some(channel)) =
                    (frame.ordered_index, frame.order_channel)
                {
                    payloads.extend(self.ordering.insert_ordered(channel, ordered_idx, body));
                } else {
                    payloads.push(body);
                }
            } else if frame.reliability.is_sequenced() {
                if let (Some(seq_idx), Some(channel)) = (frame.sequenced_index, frame.order_channel)
                {
                    if let Some(b) = self.ordering.insert_sequenced(channel, seq_idx, body) {
                        payloads.push(b);
                    }
                } else {
                    payloads.push(body);
                }
            } else {
                payloads.push(body);
            }
        }

        payloads
    }

    /// Drain the ACK queue into one encoded ACK datagram, if non-empty.
    pub fn take_ack_datagram(&mut self) -> Option<Bytes> {
        if self.ack_queue.is_empty() {
            return None;
        }
        let records = compress_ack_records(&mut self.ack_queue);
        self.ack_queue.clear();
        let mut buf = BytesMut::with_capacity(8 + records.len() * 7);
        AckNack {
            is_ack: true,
            records,
        }
        .encode(&mut buf);
        Some(buf.freeze())
    }

    /// Drain the NACK queue into one encoded NACK datagram, if non-empty.
    pub fn take_nack_datagram(&mut self) -> Option<Bytes> {
        if self.nack_queue.is_empty() {
            return None;
        }
        let records = compress_ack_records(&mut self.nack_queue);
        self.nack_queue.clear();
        let mut buf = BytesMut::with_capacity(8 + records.len() * 7);
        AckNack {
            is_ack: false,
            records,
        }
        .encode(&mut buf);
        Some(buf.freeze())
    }

    // -------------------------------------------------------------------
    // Housekeeping
    // -------------------------------------------------------------------

    pub fn is_timed_out(&self, now: Instant) -> bool {
        now.duration_since(self.last_activity) > self.timings.inactivity_timeout
    }

    pub fn should_ping(&self, now: Instant) -> bool {
        now.duration_since(self.last_ping_sent) > PING_INTERVAL
    }

    pub fn cleanup_splits(&mut self) {
        self.splits.cleanup(SPLIT_ASSEMBLY_TIMEOUT);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn test_addr() -> SocketAddr {
        "127.0.0.1:19132".parse().unwrap()
    }

    fn session(mtu: u16) -> RakNetSession {
        RakNetSession::new(test_addr(), mtu, 0, SessionTimings::default())
    }

    fn decode_acknack(data: &Bytes) -> AckNack {
        AckNack::decode(data).unwrap()
    }

    #[test]
    fn ack_nack_after_gap() {
        // Receiving sequences {0,1,2,5} must produce ACK {0..2, 5} and
        // NACK {3, 4}.
        let mut s = session(1400);
        for seq in [0u32, 1, 2, 5] {
            s.process_incoming_frameset(FrameSet {
                sequence_number: seq,
                frames: Vec::new(),
            });
        }

        let ack = decode_acknack(&s.take_ack_datagram().unwrap());
        assert!(ack.is_ack);
        assert_eq!(expand_ack_records(&ack.records), vec![0, 1, 2, 5]);

        let nack = decode_acknack(&s.take_nack_datagram().unwrap());
        assert!(!nack.is_ack);
        assert_eq!(expand_ack_records(&nack.records), vec![3, 4]);

        // Queues drained: nothing more to send this tick.
        assert!(s.take_ack_datagram().is_none());
        assert!(s.take_nack_datagram().is_none());
    }

    #[test]
    fn stale_sequence_is_acked_but_dropped() {
        let mut s = session(1400);
        let frame = Frame {
            reliability: Reliability::Unreliable,
            reliable_index: None,
            sequenced_index: None,
            ordered_index: None,
            order_channel: None,
            split: None,
            body: Bytes::from_static(b"late"),
        };
        s.process_incoming_frameset(FrameSet {
            sequence_number: 5,
            frames: Vec::new(),
        });
        let payloads = s.process_incoming_frameset(FrameSet {
            sequence_number: 2,
            frames: vec![frame],
        });
        assert!(payloads.is_empty());
        let ack = decode_acknack(&s.take_ack_datagram().unwrap());
        assert_eq!(expand_ack_records(&ack.records), vec![2, 5]);
    }

    #[test]
    fn duplicate_reliable_frame_delivered_once() {
        let mut receiver = session(1400);
        let frame = Frame {
            reliability: Reliability::Reliable,
            reliable_index: Some(7),
            sequenced_index: None,
            ordered_index: None,
            order_channel: None,
            split: None,
            body: Bytes::from_static(b"once"),
        };

        let first = receiver.process_incoming_frameset(FrameSet {
            sequence_number: 0,
            frames: vec![frame.clone()],
        });
        assert_eq!(first.len(), 1);

        // Same reliable index under a new sequence number: suppressed.
        let second = receiver.process_incoming_frameset(FrameSet {
            sequence_number: 1,
            frames: vec![frame],
        });
        assert!(second.is_empty());
    }

    #[test]
    fn fragment_roundtrip_at_various_mtus() {
        for mtu in [576u16, 1200, 1492] {
            let mut sender = session(mtu);
            let mut receiver = session(mtu);

            let payload: Bytes = (0..10_000u32).map(|i| i as u8).collect::<Vec<_>>().into();
            sender.enqueue(payload.clone(), Reliability::ReliableOrdered, 0);

            let datagrams = sender.flush_send_queue();
            assert!(datagrams.len() > 1, "payload must split at mtu {mtu}");
            for dg in &datagrams {
                assert!(dg.len() <= mtu as usize, "datagram over mtu {mtu}");
            }

            let mut delivered = Vec::new();
            for dg in datagrams {
                let fs = FrameSet::decode(&dg).unwrap();
                delivered.extend(receiver.process_incoming_frameset(fs));
            }
            assert_eq!(delivered.len(), 1);
            assert_eq!(delivered[0], payload);
        }
    }

    #[test]
    fn channel_independence_across_sessions() {
        let mut sender = session(1400);
        let mut receiver = session(1400);

        sender.enqueue(Bytes::from_static(b"a0"), Reliability::ReliableOrdered, 0);
        sender.enqueue(Bytes::from_static(b"b0"), Reliability::ReliableOrdered, 1);
        let datagrams = sender.flush_send_queue();
        assert_eq!(datagrams.len(), 1);

        let mut fs = FrameSet::decode(&datagrams[0]).unwrap();
        // Drop channel 0's head; channel 1 must still deliver.
        fs.frames.retain(|f| f.order_channel == Some(1));
        let delivered = receiver.process_incoming_frameset(fs);
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0], Bytes::from_static(b"b0"));
    }

    #[test]
    fn nack_triggers_requeue() {
        let mut sender = session(1400);
        sender.enqueue(Bytes::from_static(b"x"), Reliability::ReliableOrdered, 0);
        let first = sender.flush_send_queue();
        assert_eq!(first.len(), 1);
        let seq = FrameSet::decode(&first[0]).unwrap().sequence_number;

        sender.handle_nack(&AckNack {
            is_ack: false,
            records: vec![crate::packet::frame::AckRecord::Single(seq)],
        });
        let second = sender.flush_send_queue();
        assert_eq!(second.len(), 1);
        let resent = FrameSet::decode(&second[0]).unwrap();
        assert_eq!(resent.sequence_number, seq + 1);
        assert_eq!(resent.frames[0].body, Bytes::from_static(b"x"));
    }

    #[test]
    fn ack_stops_retransmission() {
        let mut sender = session(1400);
        sender.enqueue(Bytes::from_static(b"y"), Reliability::ReliableOrdered, 0);
        let first = sender.flush_send_queue();
        let seq = FrameSet::decode(&first[0]).unwrap().sequence_number;

        sender.handle_ack(&AckNack {
            is_ack: true,
            records: vec![crate::packet::frame::AckRecord::Single(seq)],
        });

        let far_future = Instant::now() + Duration::from_secs(60);
        sender.check_retransmit(far_future);
        assert!(sender.flush_send_queue().is_empty());
    }

    #[test]
    fn reliable_delivery_over_lossy_channel() {
        // N reliable-ordered payloads through drop rates of 10/30/50%
        // must all arrive, in order, within a bounded number of ticks.
        const N: usize = 50;
        for (seed, drop_rate) in [(1u64, 0.1f64), (2, 0.3), (3, 0.5)] {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut sender = session(1400);
            let mut receiver = session(1400);

            for i in 0..N {
                sender.enqueue(
                    Bytes::from(format!("payload-{i}")),
                    Reliability::ReliableOrdered,
                    0,
                );
            }

            let mut delivered: Vec<Bytes> = Vec::new();
            let base = Instant::now();
            let mut ticks = 0u32;

            while delivered.len() < N && ticks < 1000 {
                ticks += 1;
                // Every tick is "late enough" for the retransmit timer.
                let now = base + Duration::from_millis(250) * ticks;

                sender.check_retransmit(now);
                for dg in sender.flush_send_queue() {
                    if rng.gen_bool(drop_rate) {
                        continue; // lost in transit
                    }
                    let fs = FrameSet::decode(&dg).unwrap();
                    delivered.extend(receiver.process_incoming_frameset(fs));
                }

                // Receiver reports back; the reverse path is lossless.
                if let Some(ack) = receiver.take_ack_datagram() {
                    sender.handle_ack(&AckNack::decode(&ack).unwrap());
                }
                if let Some(nack) = receiver.take_nack_datagram() {
                    sender.handle_nack(&AckNack::decode(&nack).unwrap());
                }
            }

            assert_eq!(delivered.len(), N, "drop rate {drop_rate} seed {seed}");
            for (i, body) in delivered.iter().enumerate() {
                assert_eq!(&body[..], format!("payload-{i}").as_bytes());
            }
        }
    }

    #[test]
    fn resend_overflow_marks_session() {
        let mut sender = session(1400);
        for i in 0..(MAX_RESEND_ENTRIES + 10) {
            // One frame set each: payloads near the MTU budget.
            sender.enqueue(
                Bytes::from(vec![i as u8; 1300]),
                Reliability::ReliableOrdered,
                0,
            );
        }
        let _ = sender.flush_send_queue();
        assert!(sender.is_overflowed());
    }

    #[test]
    fn inactivity_timeout() {
        let s = session(1400);
        let now = Instant::now();
        assert!(!s.is_timed_out(now + Duration::from_secs(29)));
        assert!(s.is_timed_out(now + Duration::from_secs(31)));
    }
}
