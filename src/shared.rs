use {
    crate::{Added, Error, NodeSummary, Removed, Ring, RingSnapshot, Sha256Hasher, SlotHasher},
    parking_lot::RwLock,
    std::sync::Arc,
};

/// Thread-safe handle to a `Ring`.
///
/// Mutations hold the write lock for their whole duration, so each one either
/// completes or leaves the ring untouched as observed by every reader. Reads
/// return owned values taken under the read lock.
#[derive(Debug)]
pub struct SharedRing<S: SlotHasher = Sha256Hasher> {
    inner: Arc<RwLock<Ring<S>>>,
}

impl<S: SlotHasher> Clone for SharedRing<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: SlotHasher> From<Ring<S>> for SharedRing<S> {
    fn from(ring: Ring<S>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(ring)),
        }
    }
}

impl<S: SlotHasher> SharedRing<S> {
    pub fn new(ring: Ring<S>) -> Self {
        ring.into()
    }

    pub fn add_node(
        &self,
        name: impl Into<String>,
        address: impl Into<String>,
    ) -> Result<Added, Error> {
        self.inner.write().add_node(name, address)
    }

    pub fn remove_node(&self, name: &str) -> Result<Removed, Error> {
        self.inner.write().remove_node(name)
    }

    /// Stores `value` and describes the node it landed on.
    pub fn assign_data(&self, value: impl Into<String>) -> Result<NodeSummary, Error> {
        self.inner
            .write()
            .assign_data(value)
            .map(|node| node.summary())
    }

    pub fn owner(&self, value: impl AsRef<[u8]>) -> Result<NodeSummary, Error> {
        self.inner.read().owner(value).map(|node| node.summary())
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Consistent copy of the ring.
    pub fn inspect(&self) -> RingSnapshot {
        self.inner.read().inspect()
    }

    pub fn verify(&self) -> Result<(), Error> {
        self.inner.read().verify()
    }
}
