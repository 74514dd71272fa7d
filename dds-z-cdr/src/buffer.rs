//! Output buffer abstraction for the serializer.
//!
//! Serialization appends to any [`CdrBuffer`], so callers can write into a
//! plain `Vec<u8>` or into their own pooled/reusable buffer types without
//! an extra copy.

/// Growth granularity for reusable buffers. Allocating on 4KB boundaries
/// keeps reallocation rare for steadily growing payloads.
const ALIGN_4K: usize = 0xfff;

/// Byte sink the CDR serializer writes into.
pub trait CdrBuffer {
    fn extend_from_slice(&mut self, data: &[u8]);

    fn push(&mut self, byte: u8);

    /// Bytes written so far. The serializer derives alignment from this.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn reserve(&mut self, _additional: usize) {}

    /// Grow capacity to hold `needed_total` bytes, rounding allocations
    /// up to 4KB boundaries where the backing store supports it.
    fn reserve_4k(&mut self, needed_total: usize) {
        let current = self.len();
        if needed_total > current {
            self.reserve(needed_total - current);
        }
    }

    /// Reset to empty for reuse, keeping capacity.
    fn clear(&mut self);
}

impl CdrBuffer for Vec<u8> {
    #[inline(always)]
    fn extend_from_slice(&mut self, data: &[u8]) {
        Vec::extend_from_slice(self, data)
    }

    #[inline(always)]
    fn push(&mut self, byte: u8) {
        Vec::push(self, byte)
    }

    #[inline(always)]
    fn len(&self) -> usize {
        Vec::len(self)
    }

    #[inline(always)]
    fn reserve(&mut self, additional: usize) {
        Vec::reserve(self, additional)
    }

    #[inline]
    fn reserve_4k(&mut self, needed_total: usize) {
        if needed_total > self.capacity() {
            let rounded = (needed_total + ALIGN_4K) & !ALIGN_4K;
            self.reserve(rounded - self.len());
        }
    }

    #[inline(always)]
    fn clear(&mut self) {
        Vec::clear(self)
    }
}
