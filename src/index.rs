//! Ordered search over the ascending sequence of occupied slots.

/// Result of [`locate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// The slot at this index equals the target.
    Exact(usize),
    /// Index of the first slot greater than the target, or `slots.len()` if
    /// the target exceeds every slot. Callers wrap `slots.len()` to 0.
    Successor(usize),
}

impl Position {
    #[inline]
    pub fn index(&self) -> usize {
        match *self {
            Position::Exact(index) | Position::Successor(index) => index,
        }
    }

    /// Returns the index of the node owning the target on a ring of `len`
    /// nodes, closing the ring past the last slot.
    #[inline]
    pub fn owner(&self, len: usize) -> usize {
        let index = self.index();
        if index == len {
            0
        } else {
            index
        }
    }
}

/// Searches the strictly ascending `slots` for `target`.
#[inline]
pub fn locate(slots: &[u64], target: u64) -> Position {
    match slots.binary_search(&target) {
        Ok(index) => Position::Exact(index),
        Err(index) => Position::Successor(index),
    }
}
