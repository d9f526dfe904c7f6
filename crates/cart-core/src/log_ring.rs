//! Fixed-capacity circular record of deadline-miss latencies.

/// Ring depth variants shipped by different hardware revisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum LogRevision {
    /// 4096-slot ring.
    #[default]
    Standard,
    /// 2048-slot ring.
    Compact,
}

impl LogRevision {
    /// Number of 32-bit slots.
    #[must_use]
    pub const fn capacity(self) -> usize {
        match self {
            Self::Standard => 4096,
            Self::Compact => 2048,
        }
    }
}

/// One appended record: the slot it landed in and its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct LogEntry {
    /// Ring slot the entry was written to.
    pub slot: usize,
    /// Measured access latency in clock cycles.
    pub latency: u32,
}

/// Append-only ring with a single writer and a polling reader.
///
/// The write index wraps at capacity without overflow detection; a reader
/// that falls a full ring behind loses the oldest entries.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct LogRing {
    slots: Box<[u32]>,
    index: usize,
}

impl Default for LogRing {
    fn default() -> Self {
        Self::new(LogRevision::default())
    }
}

impl LogRing {
    /// Allocates a zeroed ring for `revision`.
    #[must_use]
    pub fn new(revision: LogRevision) -> Self {
        Self::with_capacity(revision.capacity())
    }

    /// Allocates a zeroed ring with an explicit slot count (at least one).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: vec![0; capacity.max(1)].into_boxed_slice(),
            index: 0,
        }
    }

    /// Number of slots.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Slot the next append will write.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn write_index(&self) -> usize {
        self.index
    }

    /// Writes `value` at the current index and advances it modulo capacity.
    pub fn append(&mut self, value: u32) -> LogEntry {
        let slot = self.index;
        self.slots[slot] = value;
        self.index = (slot + 1) % self.slots.len();
        LogEntry {
            slot,
            latency: value,
        }
    }

    /// Read port: the word stored in `slot`, or `None` past the end.
    #[must_use]
    pub fn read(&self, slot: usize) -> Option<u32> {
        self.slots.get(slot).copied()
    }

    /// Entries appended since the reader last sampled `previous_index`.
    ///
    /// Assumes fewer than `capacity` appends happened in between; a reader
    /// that lapped the writer sees only the last lap.
    #[must_use]
    pub fn entries_since(&self, previous_index: usize) -> Vec<u32> {
        let start = previous_index % self.slots.len();
        if start <= self.index {
            self.slots[start..self.index].to_vec()
        } else {
            let mut entries = self.slots[start..].to_vec();
            entries.extend_from_slice(&self.slots[..self.index]);
            entries
        }
    }

    /// Zeroes every slot and rewinds the index.
    pub fn clear(&mut self) {
        self.slots.fill(0);
        self.index = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::{LogEntry, LogRevision, LogRing};
    use rstest::rstest;

    #[rstest]
    #[case(LogRevision::Standard, 4096)]
    #[case(LogRevision::Compact, 2048)]
    fn revision_selects_depth(#[case] revision: LogRevision, #[case] depth: usize) {
        let ring = LogRing::new(revision);
        assert_eq!(ring.capacity(), depth);
        assert_eq!(ring.write_index(), 0);
    }

    #[test]
    fn append_writes_then_advances() {
        let mut ring = LogRing::with_capacity(4);
        assert_eq!(ring.append(7), LogEntry { slot: 0, latency: 7 });
        assert_eq!(ring.append(9), LogEntry { slot: 1, latency: 9 });
        assert_eq!(ring.write_index(), 2);
        assert_eq!(ring.read(0), Some(7));
        assert_eq!(ring.read(1), Some(9));
        assert_eq!(ring.read(4), None);
    }

    #[test]
    fn index_wraps_and_overwrites_silently() {
        let mut ring = LogRing::with_capacity(3);
        for value in 1..=4 {
            ring.append(value);
        }
        assert_eq!(ring.write_index(), 1);
        assert_eq!(ring.read(0), Some(4));
        assert_eq!(ring.read(1), Some(2));
    }

    #[test]
    fn entries_since_handles_a_single_wrap() {
        let mut ring = LogRing::with_capacity(4);
        ring.append(1);
        ring.append(2);
        ring.append(3);
        let mark = ring.write_index();
        ring.append(4);
        ring.append(5);
        assert_eq!(ring.entries_since(mark), vec![4, 5]);
        assert_eq!(ring.entries_since(ring.write_index()), Vec::<u32>::new());
    }

    #[test]
    fn clear_rewinds() {
        let mut ring = LogRing::with_capacity(2);
        ring.append(11);
        ring.clear();
        assert_eq!(ring.write_index(), 0);
        assert_eq!(ring.read(0), Some(0));
    }
}
