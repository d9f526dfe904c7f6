//! Sources for the custom window.

/// Data source behind the custom window.
///
/// Reads are always serviced in a single cycle.
pub trait CustomSource: Send {
    /// Returns the word at a region-relative, word-aligned `offset`.
    fn read16(&mut self, offset: u32) -> u16;

    /// Stores a word at `offset`. Sources without storage drop the write.
    fn write16(&mut self, offset: u32, value: u16) {
        let _ = (offset, value);
    }
}

/// Deterministic test pattern: every word holds its own word index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PatternSource;

impl CustomSource for PatternSource {
    #[allow(clippy::cast_possible_truncation)]
    fn read16(&mut self, offset: u32) -> u16 {
        (offset >> 1) as u16
    }
}

/// Byte-addressed RAM emulating a battery-backed SRAM window.
///
/// Offsets wrap modulo the configured size; words are stored big-endian.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SramSource {
    bytes: Vec<u8>,
}

impl SramSource {
    /// Allocates a zeroed SRAM of `size` bytes (rounded up to a whole word).
    #[must_use]
    pub fn new(size: usize) -> Self {
        Self {
            bytes: vec![0; size.max(2).next_multiple_of(2)],
        }
    }

    /// Raw SRAM contents.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    fn index(&self, offset: u32) -> usize {
        (offset as usize & !1) % self.bytes.len()
    }
}

impl CustomSource for SramSource {
    fn read16(&mut self, offset: u32) -> u16 {
        let index = self.index(offset);
        u16::from_be_bytes([self.bytes[index], self.bytes[index + 1]])
    }

    fn write16(&mut self, offset: u32, value: u16) {
        let index = self.index(offset);
        self.bytes[index..index + 2].copy_from_slice(&value.to_be_bytes());
    }
}
