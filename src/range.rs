/// A circular slot range bounded exclusively below and inclusively above
/// (`(start, end]`). This is the set of slots a node owns: everything after
/// its predecessor's slot up to and including its own.
///
/// If `start >= end`, the range is considered wrapping and is equivalent to
/// covering two ranges: `(start..)` and `(..=end)`. With `start == end` the
/// range covers the whole ring, which is what a lone node owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotRange {
    pub start: u64,
    pub end: u64,
}

impl SlotRange {
    /// Creates a `SlotRange`.
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    /// Returns `true` if the range is wrapping, which is equivalent to covering
    /// the following two ranges: `(start..)` and `(..=end)`.
    pub fn is_wrapping(&self) -> bool {
        self.start >= self.end
    }

    /// Returns `true` if `slot` is contained in the range.
    pub fn contains(&self, slot: u64) -> bool {
        if self.is_wrapping() {
            slot > self.start || slot <= self.end
        } else {
            slot > self.start && slot <= self.end
        }
    }

    /// Number of slots covered on a ring of `total_slots`, or `None` if either
    /// bound lies outside the ring.
    pub fn size(&self, total_slots: u64) -> Option<u64> {
        if self.start >= total_slots || self.end >= total_slots {
            return None;
        }

        if self.is_wrapping() {
            Some(total_slots - self.start + self.end)
        } else {
            Some(self.end - self.start)
        }
    }
}
