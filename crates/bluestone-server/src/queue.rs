//! Outbound batch queue: accumulates encoded game packets per
//! destination and flushes them as compressed batches, grouping
//! consecutive packets that share a reliability descriptor so in-app
//! order survives batching.

use std::collections::HashMap;
use std::net::SocketAddr;

use bytes::{BufMut, Bytes, BytesMut};
use tracing::error;

use bluestone_proto::batch::{encode_batch, BatchConfig};
use bluestone_raknet::packet::online::id::GAME_PACKET;
use bluestone_raknet::{Reliability, ServerHandle};

/// Reliability descriptor for one queued packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    pub reliability: Reliability,
    pub channel: u8,
}

impl Delivery {
    /// The default for game traffic: reliable ordered on channel 0.
    pub const DEFAULT: Self = Self {
        reliability: Reliability::ReliableOrdered,
        channel: 0,
    };

    /// For disposable broadcasts such as movement deltas.
    pub const LOOSE: Self = Self {
        reliability: Reliability::Unreliable,
        channel: 0,
    };
}

pub struct BatchQueue {
    pending: HashMap<SocketAddr, Vec<(Delivery, Bytes)>>,
}

impl BatchQueue {
    pub fn new() -> Self {
        Self {
            pending: HashMap::new(),
        }
    }

    /// Queue one encoded record (packet id + fields) for a destination.
    pub fn push(&mut self, addr: SocketAddr, delivery: Delivery, record: Bytes) {
        self.pending.entry(addr).or_default().push((delivery, record));
    }

    /// Drop everything queued for a departed destination.
    pub fn forget(&mut self, addr: SocketAddr) {
        self.pending.remove(&addr);
    }

    /// Flush every destination: walk each queue in order, batch maximal
    /// runs of equal delivery, compress, and hand to the session layer.
    pub async fn flush(&mut self, handle: &ServerHandle, config: &BatchConfig) {
        for (addr, records) in self.pending.drain() {
            let mut run: Vec<Bytes> = Vec::new();
            let mut run_delivery: Option<Delivery> = None;

            for (delivery, record) in records {
                if let Some(current) = run_delivery {
                    if current != delivery {
                        send_batch(handle, addr, &run, current, config).await;
                        run.clear();
                    }
                }
                run_delivery = Some(delivery);
                run.push(record);
            }
            if let Some(delivery) = run_delivery {
                send_batch(handle, addr, &run, delivery, config).await;
            }
        }
    }
}

impl Default for BatchQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Compress one run of records and submit it, 0xFE-prefixed.
pub async fn send_batch(
    handle: &ServerHandle,
    addr: SocketAddr,
    records: &[Bytes],
    delivery: Delivery,
    config: &BatchConfig,
) {
    let body = match encode_batch(records, config) {
        Ok(body) => body,
        Err(e) => {
            error!("batch encode for {addr} failed: {e}");
            return;
        }
    };
    let mut payload = BytesMut::with_capacity(1 + body.len());
    payload.put_u8(GAME_PACKET);
    payload.put_slice(&body);
    handle
        .send_to(addr, payload.freeze(), delivery.reliability, delivery.channel)
        .await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use bluestone_raknet::ServerCommand;

    fn addr() -> SocketAddr {
        "127.0.0.1:50000".parse().unwrap()
    }

    #[tokio::test]
    async fn groups_consecutive_equal_reliability() {
        let (handle, mut rx) = ServerHandle::channel(16);
        let mut queue = BatchQueue::new();
        let config = BatchConfig::default();

        queue.push(addr(), Delivery::DEFAULT, Bytes::from_static(b"\x02aaaa"));
        queue.push(addr(), Delivery::DEFAULT, Bytes::from_static(b"\x06bb"));
        queue.push(addr(), Delivery::LOOSE, Bytes::from_static(b"\x12cc"));
        queue.push(addr(), Delivery::DEFAULT, Bytes::from_static(b"\x09dd"));
        queue.flush(&handle, &config).await;

        let mut sends = Vec::new();
        while let Ok(cmd) = rx.try_recv() {
            let ServerCommand::Send {
                payload,
                reliability,
                ..
            } = cmd;
            sends.push((payload, reliability));
        }
        // Three runs: [2 reliable], [1 unreliable], [1 reliable].
        assert_eq!(sends.len(), 3);
        assert_eq!(sends[0].1, Reliability::ReliableOrdered);
        assert_eq!(sends[1].1, Reliability::Unreliable);
        assert_eq!(sends[2].1, Reliability::ReliableOrdered);

        for (payload, _) in &sends {
            assert_eq!(payload[0], GAME_PACKET);
            assert!(bluestone_proto::batch::decode_batch(&payload[1..]).is_ok());
        }
    }

    #[tokio::test]
    async fn flush_clears_queue() {
        let (handle, mut rx) = ServerHandle::channel(16);
        let mut queue = BatchQueue::new();
        let config = BatchConfig::default();

        queue.push(addr(), Delivery::DEFAULT, Bytes::from_static(b"\x02xx"));
        queue.flush(&handle, &config).await;
        assert!(rx.try_recv().is_ok());

        queue.flush(&handle, &config).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn forget_drops_pending_records() {
        let (handle, mut rx) = ServerHandle::channel(16);
        let mut queue = BatchQueue::new();
        let config = BatchConfig::default();

        queue.push(addr(), Delivery::DEFAULT, Bytes::from_static(b"\x02xx"));
        queue.forget(addr());
        queue.flush(&handle, &config).await;
        assert!(rx.try_recv().is_err());
    }
}
