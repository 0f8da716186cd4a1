use std::collections::HashMap;
use std::time::{Duration, Instant};

use bytes::{Bytes, BytesMut};

use crate::constants::{MAX_SPLIT_COUNT, MAX_SPLIT_IDS};
use crate::packet::frame::SplitInfo;

/// Reassembles split frames. Bounded both per split (fragment count) and
/// across splits (concurrent split ids), so a hostile peer cannot grow
/// memory without limit.
pub struct SplitAssembler {
    pending: HashMap<u16, SplitBuffer>,
}

struct SplitBuffer {
    count: u32,
    fragments: HashMap<u32, Bytes>,
    created_at: Instant,
}

impl SplitAssembler {
    pub fn new() -> Self {
        Self {
            pending: HashMap::new(),
        }
    }

    /// Insert one fragment. Returns the reassembled payload once all
    /// `count` fragments are present, `None` while more are needed, or
    /// an error describing why the fragment was dropped.
    pub fn insert(&mut self, info: &SplitInfo, body: Bytes) -> Result<Option<Bytes>, String> {
        if info.count == 0 || info.count > MAX_SPLIT_COUNT {
            return Err(format!("split_count {} out of range", info.count));
        }
        if info.index >= info.count {
            return Err(format!(
                "split_index {} >= split_count {}",
                info.index, info.count
            ));
        }
        if !self.pending.contains_key(&info.id) && self.pending.len() >= MAX_SPLIT_IDS {
            return Err(format!(
                "too many concurrent splits ({MAX_SPLIT_IDS}), dropping split id {}",
                info.id
            ));
        }

        let buffer = self.pending.entry(info.id).or_insert_with(|| SplitBuffer {
            count: info.count,
            fragments: HashMap::new(),
            created_at: Instant::now(),
        });

        if buffer.count != info.count {
            // Inconsistent declaration; discard the whole assembly.
            self.pending.remove(&info.id);
            return Err(format!("split_count mismatch for split id {}", info.id));
        }

        buffer.fragments.insert(info.index, body);

        if buffer.fragments.len() as u32 != buffer.count {
            return Ok(None);
        }

        let Some(mut buffer) = self.pending.remove(&info.id) else {
            return Ok(None);
        };
        let mut result = BytesMut::new();
        for i in 0..buffer.count {
            match buffer.fragments.remove(&i) {
                Some(frag) => result.extend_from_slice(&frag),
                None => return Err(format!("missing fragment index {i}")),
            }
        }
        Ok(Some(result.freeze()))
    }

    /// Discard incomplete assemblies older than `timeout`.
    pub fn cleanup(&mut self, timeout: Duration) {
        let now = Instant::now();
        self.pending
            .retain(|_, buf| now.duration_since(buf.created_at) < timeout);
    }

    /// Number of splits currently reassembling.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

impl Default for SplitAssembler {
    fn default() -> Self {
        Self::new()
    }
}
