// MIT License

// Copyright (c) 2016 Jerome Froelich

// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:

// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.

// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.

//! A slot-based consistent hashing ring that owns the data placed on it.
//!
//! The ring has a fixed number of slots. Every node sits on the slot its
//! address hashes to and owns the slots after its predecessor up to and
//! including its own. Data items are stored on the node owning their hash.
//! When a node joins, only the items of the node whose range it splits are
//! moved; when a node leaves, its items are merged into its successor.
//!
//! `Ring`'s API consists of four operations: `add_node`, `remove_node`,
//! `assign_data` and `inspect`. `SharedRing` wraps a ring for use from multiple
//! threads, serializing writers.
//!
//! ## Example
//!
//! ``` rust
//! use slotring::Ring;
//!
//! fn main() -> Result<(), slotring::Error> {
//!     let mut ring = Ring::new(50)?;
//!
//!     ring.add_node("A", "10.131.213.12")?;
//!     ring.add_node("B", "10.121.213.10")?;
//!     ring.add_node("C", "10.122.212.11")?;
//!
//!     let owner = ring.assign_data("foo")?.name().to_owned();
//!     assert_eq!(ring.owner("foo")?.name(), owner);
//!
//!     let removed = ring.remove_node(&owner)?;
//!     println!("{removed}");
//!
//!     assert_eq!(ring.len(), 2);
//!     assert_eq!(ring.inspect().item_count(), 1);
//!     Ok(())
//! }
//! ```

use {
    index::{locate, Position},
    range::SlotRange,
    std::{collections::HashSet, fmt, mem},
    tracing::{debug, trace},
};

pub mod config;
pub mod hash;
pub mod index;
mod node;
pub mod range;
pub mod rebalance;
mod shared;
mod snapshot;

pub use {
    config::RingConfig,
    hash::{Sha256Hasher, SipSlotHasher, SlotCount, SlotHasher},
    node::{DataItem, Node, NodeSummary},
    rebalance::Migration,
    shared::SharedRing,
    snapshot::RingSnapshot,
};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error("Slot {0} is already occupied")]
    DuplicateSlot(u64),

    #[error("Node name `{0}` is already in use")]
    DuplicateName(String),

    #[error("Node `{0}` not found")]
    NotFound(String),

    #[error("Ring has no nodes")]
    EmptyRing,

    #[error("Invalid total slot count: {0}")]
    InvalidSlotCount(u64),

    #[error("Slots are not strictly ascending at index {0}")]
    UnorderedSlots(usize),

    #[error("Slot {0} is outside the ring")]
    SlotOutOfRange(u64),

    #[error("`{0}` does not hash to its recorded slot")]
    HashMismatch(String),

    #[error("Item with hash {hash} is outside the range of node `{node}`")]
    MisplacedItem { node: String, hash: u64 },
}

/// Outcome of `Ring::add_node`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Added {
    /// Index the node was inserted at.
    pub index: usize,
    pub slot: u64,
    /// Items pulled from the displaced node. `None` for the first node.
    pub migration: Option<Migration>,
}

impl fmt::Display for Added {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Added the node to index {}", self.index)?;
        if let Some(migration) = &self.migration {
            write!(f, " | {migration}")?;
        }
        Ok(())
    }
}

/// Outcome of `Ring::remove_node`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Removed {
    pub name: String,
    /// Node that absorbed the removed node's items. `None` if the removed node
    /// was the last one.
    pub successor: Option<String>,
    /// Number of items merged into the successor.
    pub merged: usize,
    /// Items of the last node, handed back since no node is left to hold them.
    pub released: Vec<DataItem>,
}

impl fmt::Display for Removed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.successor {
            Some(successor) => write!(
                f,
                "Node has been removed and data has been moved to {successor}"
            ),
            None => write!(
                f,
                "Node has been removed and the ring is now empty ({} items released)",
                self.released.len()
            ),
        }
    }
}

/// Slot ring
///
/// `slots` and `nodes` are parallel: `slots[i]` is the slot of `nodes[i]`, and
/// `slots` is strictly ascending.
#[derive(Debug, Clone)]
pub struct Ring<S: SlotHasher = Sha256Hasher> {
    total_slots: SlotCount,
    hasher: S,
    slots: Vec<u64>,
    nodes: Vec<Node>,
}

impl Ring {
    /// Create a new `Ring` of `total_slots` slots using SHA-256.
    pub fn new(total_slots: u64) -> Result<Self, Error> {
        Self::with_hasher(total_slots, Sha256Hasher)
    }

    pub fn from_config(config: &RingConfig) -> Result<Self, Error> {
        Self::new(config.total_slots)
    }
}

impl<S: SlotHasher> Ring<S> {
    /// Creates an empty `Ring` which will use the given hasher.
    pub fn with_hasher(total_slots: u64, hasher: S) -> Result<Self, Error> {
        let total_slots = SlotCount::new(total_slots)?;

        Ok(Ring {
            total_slots,
            hasher,
            slots: Vec::new(),
            nodes: Vec::new(),
        })
    }

    /// Rebuilds a ring from a snapshot, rejecting any snapshot that breaks the
    /// ordering or ownership invariants under `hasher`.
    pub fn restore(snapshot: RingSnapshot, hasher: S) -> Result<Self, Error> {
        let mut ring = Self::with_hasher(snapshot.total_slots, hasher)?;
        ring.slots = snapshot.slots();
        ring.nodes = snapshot.nodes;
        ring.verify()?;

        Ok(ring)
    }

    /// Get the number of nodes in the ring.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the ring has no nodes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn total_slots(&self) -> u64 {
        self.total_slots.get()
    }

    /// Occupied slots, ascending.
    #[inline]
    pub fn slots(&self) -> &[u64] {
        &self.slots
    }

    /// Nodes in slot order.
    #[inline]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Hashes `input` and returns its slot on the ring.
    #[inline]
    pub fn slot_for(&self, input: impl AsRef<[u8]>) -> u64 {
        self.hasher.slot(input.as_ref(), self.total_slots)
    }

    /// Adds a node at the slot its address hashes to, moving into it the items
    /// of the displaced node that fall in its range.
    ///
    /// Fails without touching the ring if the name is taken or the slot is
    /// occupied.
    pub fn add_node(
        &mut self,
        name: impl Into<String>,
        address: impl Into<String>,
    ) -> Result<Added, Error> {
        let name = name.into();
        let address = address.into();

        if self.position_of(&name).is_some() {
            return Err(Error::DuplicateName(name));
        }

        let slot = self.slot_for(&address);

        let index = match locate(&self.slots, slot) {
            Position::Exact(_) => {
                debug!(%name, slot, "slot already occupied");
                return Err(Error::DuplicateSlot(slot));
            }
            Position::Successor(index) => index,
        };

        let mut node = Node::new(name, address, slot);

        let migration = rebalance::migrate(&mut self.nodes, index, &mut node);

        debug!(
            name = %node.name,
            slot,
            index,
            moved = migration.as_ref().map_or(0, |m| m.moved),
            "added node to ring"
        );

        self.slots.insert(index, slot);
        self.nodes.insert(index, node);

        Ok(Added {
            index,
            slot,
            migration,
        })
    }

    /// Removes the node called `name`, merging its items into its successor.
    ///
    /// Removing the last node empties the ring; its items are returned in
    /// `Removed::released`.
    pub fn remove_node(&mut self, name: &str) -> Result<Removed, Error> {
        let index = self
            .position_of(name)
            .ok_or_else(|| Error::NotFound(name.to_owned()))?;

        let successor = (index + 1) % self.nodes.len();

        if successor == index {
            self.slots.remove(index);
            let node = self.nodes.remove(index);

            debug!(name, released = node.data.len(), "removed last node from ring");

            return Ok(Removed {
                name: node.name,
                successor: None,
                merged: 0,
                released: node.data,
            });
        }

        let data = mem::take(&mut self.nodes[index].data);
        let merged = data.len();

        let successor = &mut self.nodes[successor];
        successor.data.extend(data);
        let successor = successor.name.clone();

        self.slots.remove(index);
        let node = self.nodes.remove(index);

        debug!(name, %successor, merged, "removed node from ring");

        Ok(Removed {
            name: node.name,
            successor: Some(successor),
            merged,
            released: Vec::new(),
        })
    }

    /// Stores `value` on the node owning its hash and returns that node.
    pub fn assign_data(&mut self, value: impl Into<String>) -> Result<NodeRef<'_, S>, Error> {
        if self.nodes.is_empty() {
            return Err(Error::EmptyRing);
        }

        let value = value.into();
        let hash = self.slot_for(&value);
        let index = locate(&self.slots, hash).owner(self.slots.len());

        trace!(%value, hash, node = %self.nodes[index].name, "assigned data");

        self.nodes[index].data.push(DataItem::new(value, hash));

        Ok(NodeRef { ring: &*self, index })
    }

    /// Returns the node that owns, or would own, `value`. Stores nothing.
    pub fn owner(&self, value: impl AsRef<[u8]>) -> Result<NodeRef<'_, S>, Error> {
        self.owner_of_slot(self.slot_for(value))
    }

    /// Returns the node owning `slot`, or an error if the ring is empty.
    pub fn owner_of_slot(&self, slot: u64) -> Result<NodeRef<'_, S>, Error> {
        if self.nodes.is_empty() {
            return Err(Error::EmptyRing);
        }

        let index = locate(&self.slots, slot).owner(self.slots.len());

        Ok(NodeRef { ring: self, index })
    }

    /// Searches the ring for the node called `name`.
    pub fn node(&self, name: &str) -> Result<NodeRef<'_, S>, Error> {
        self.position_of(name)
            .map(|index| NodeRef { ring: self, index })
            .ok_or_else(|| Error::NotFound(name.to_owned()))
    }

    /// Walks the ring in slot order, starting from the owner of `start` or
    /// from the first node.
    pub fn iter(&self, start: impl Into<Option<u64>>) -> Iter<'_, S> {
        let start_node = if let Some(start) = start.into() {
            self.owner_of_slot(start).ok()
        } else if self.nodes.is_empty() {
            None
        } else {
            Some(NodeRef {
                ring: self,
                index: 0,
            })
        };

        start_node.map(Iter::new).unwrap_or(Iter::empty())
    }

    /// Returns an owned copy of the ring state.
    pub fn inspect(&self) -> RingSnapshot {
        RingSnapshot {
            total_slots: self.total_slots.get(),
            nodes: self.nodes.clone(),
        }
    }

    /// Checks slot ordering, name uniqueness, recorded hashes, and that every
    /// item sits on the node owning its hash.
    pub fn verify(&self) -> Result<(), Error> {
        let mut names = HashSet::with_capacity(self.nodes.len());

        for (index, node) in self.nodes.iter().enumerate() {
            if node.slot >= self.total_slots.get() {
                return Err(Error::SlotOutOfRange(node.slot));
            }

            if index > 0 && self.slots[index - 1] >= self.slots[index] {
                return Err(Error::UnorderedSlots(index));
            }

            if self.slot_for(&node.address) != node.slot {
                return Err(Error::HashMismatch(node.address.clone()));
            }

            if !names.insert(node.name.as_str()) {
                return Err(Error::DuplicateName(node.name.clone()));
            }
        }

        for node in self.iter(None) {
            let range = node.range();

            for item in node.data() {
                if self.slot_for(item.value()) != item.hash() {
                    return Err(Error::HashMismatch(item.value().to_owned()));
                }

                if !range.contains(item.hash()) {
                    return Err(Error::MisplacedItem {
                        node: node.name().to_owned(),
                        hash: item.hash(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Names are unordered, so this is a linear scan.
    #[inline]
    fn position_of(&self, name: &str) -> Option<usize> {
        self.nodes.iter().position(|node| node.name == name)
    }

    /// Internal method for wrapping node index within the ring.
    #[inline]
    fn wrap_index(&self, index: usize) -> usize {
        index % self.nodes.len()
    }
}

/// Reference to a ring node. Acts as an iterator (using `prev()` and `next()`
/// methods), and provides the node's ownership range.
#[derive(Clone)]
pub struct NodeRef<'a, S: SlotHasher> {
    ring: &'a Ring<S>,
    index: usize,
}

impl<'a, S: SlotHasher> fmt::Debug for NodeRef<'a, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("index", &self.index)
            .field("name", &self.node().name)
            .finish_non_exhaustive()
    }
}

impl<'a, S: SlotHasher> NodeRef<'a, S> {
    /// Returns the node's index in slot order.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn name(&self) -> &'a str {
        &self.node().name
    }

    #[inline]
    pub fn address(&self) -> &'a str {
        &self.node().address
    }

    #[inline]
    pub fn slot(&self) -> u64 {
        self.node().slot
    }

    /// Returns the items held by the node.
    #[inline]
    pub fn data(&self) -> &'a [DataItem] {
        &self.node().data
    }

    pub fn summary(&self) -> NodeSummary {
        self.node().summary()
    }

    /// Returns the previous node on the ring. If the ring contains only one
    /// node, the returned reference will be for the same node.
    #[inline]
    pub fn prev(&self) -> Self {
        let ring = self.ring;

        Self {
            ring,
            index: ring.wrap_index(ring.len() + self.index - 1),
        }
    }

    /// Returns the next node on the ring. If the ring contains only one node,
    /// the returned reference will be for the same node.
    #[inline]
    pub fn next(&self) -> Self {
        let ring = self.ring;

        Self {
            ring,
            index: ring.wrap_index(self.index + 1),
        }
    }

    /// Returns the slots the node owns: after its predecessor's slot, up to
    /// and including its own.
    #[inline]
    pub fn range(&self) -> SlotRange {
        SlotRange::new(self.prev().slot(), self.slot())
    }

    #[inline]
    fn node(&self) -> &'a Node {
        &self.ring.nodes[self.index]
    }
}

pub struct Iter<'a, S: SlotHasher> {
    start: usize,
    next: Option<NodeRef<'a, S>>,
}

impl<'a, S: SlotHasher> Iter<'a, S> {
    pub fn new(node: NodeRef<'a, S>) -> Self {
        Self {
            start: node.index,
            next: Some(node),
        }
    }

    pub fn empty() -> Self {
        Self {
            start: 0,
            next: None,
        }
    }
}

impl<'a, S: SlotHasher> Iterator for Iter<'a, S> {
    type Item = NodeRef<'a, S>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take();

        if let Some(current) = &current {
            let next = current.next();

            if next.index != self.start {
                self.next = Some(next);
            }
        }

        current
    }
}
