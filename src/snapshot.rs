use {
    crate::node::Node,
    serde::{Deserialize, Serialize},
};

/// Owned copy of the full ring state, in slot order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RingSnapshot {
    pub total_slots: u64,
    pub nodes: Vec<Node>,
}

impl RingSnapshot {
    /// Slots of all nodes, ascending.
    pub fn slots(&self) -> Vec<u64> {
        self.nodes.iter().map(Node::slot).collect()
    }

    /// Total number of items held across the ring.
    pub fn item_count(&self) -> usize {
        self.nodes.iter().map(|node| node.data().len()).sum()
    }

    pub fn node(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.name() == name)
    }
}
