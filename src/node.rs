use serde::{Deserialize, Serialize};

/// A value placed on the ring together with its slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DataItem {
    value: String,
    hash: u64,
}

impl DataItem {
    pub fn new(value: impl Into<String>, hash: u64) -> Self {
        DataItem {
            value: value.into(),
            hash,
        }
    }

    #[inline]
    pub fn value(&self) -> &str {
        &self.value
    }

    #[inline]
    pub fn hash(&self) -> u64 {
        self.hash
    }
}

/// A named participant on the ring. Owns the items whose hash falls between
/// its predecessor's slot (exclusive) and its own slot (inclusive).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub(crate) name: String,
    pub(crate) address: String,
    pub(crate) slot: u64,
    #[serde(default)]
    pub(crate) data: Vec<DataItem>,
}

impl Node {
    pub(crate) fn new(name: String, address: String, slot: u64) -> Self {
        Node {
            name,
            address,
            slot,
            data: Vec::new(),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn address(&self) -> &str {
        &self.address
    }

    #[inline]
    pub fn slot(&self) -> u64 {
        self.slot
    }

    #[inline]
    pub fn data(&self) -> &[DataItem] {
        &self.data
    }

    pub fn summary(&self) -> NodeSummary {
        NodeSummary {
            name: self.name.clone(),
            address: self.address.clone(),
            slot: self.slot,
            items: self.data.len(),
        }
    }
}

/// Owned description of a node, detached from the ring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSummary {
    pub name: String,
    pub address: String,
    pub slot: u64,
    pub items: usize,
}
