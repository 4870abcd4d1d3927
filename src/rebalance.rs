//! Data migration when a node is inserted into the ring.
//!
//! A new node splits the range of the node currently occupying its insertion
//! index (the displaced node). Items of the displaced node whose hash falls in
//! the new node's range `(predecessor.slot, new.slot]` move; the rest stay.

use {
    crate::{
        node::{DataItem, Node},
        range::SlotRange,
    },
    std::{fmt, mem},
    tracing::trace,
};

/// Disjoint split of a node's items.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Partition {
    pub retained: Vec<DataItem>,
    pub moved: Vec<DataItem>,
}

/// Splits `items` by membership in `range`. Every item lands in exactly one
/// side.
pub fn partition(items: Vec<DataItem>, range: &SlotRange) -> Partition {
    let (moved, retained): (Vec<_>, Vec<_>) = items
        .into_iter()
        .partition(|item| range.contains(item.hash()));

    Partition { retained, moved }
}

/// Outcome of a migration into a newly inserted node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    /// Name of the displaced node the items came from.
    pub source: String,
    pub moved: usize,
    pub retained: usize,
}

impl fmt::Display for Migration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Moved {} of {} items from {}",
            self.moved,
            self.moved + self.retained,
            self.source
        )
    }
}

/// Pulls into `new_node` the items it will own once inserted at `position`.
///
/// `nodes` is the pre-insertion ordering. The displaced node is
/// `nodes[position % len]`; its predecessor bounds the new range from below.
/// The displaced node's items are only replaced once the partition is
/// complete. Returns `None` when `nodes` is empty, as there is nothing to
/// split.
pub fn migrate(nodes: &mut [Node], position: usize, new_node: &mut Node) -> Option<Migration> {
    if nodes.is_empty() {
        return None;
    }

    let len = nodes.len();
    let displaced = position % len;
    let predecessor = (displaced + len - 1) % len;
    let range = SlotRange::new(nodes[predecessor].slot, new_node.slot);

    let source = &mut nodes[displaced];
    let Partition { retained, moved } = partition(mem::take(&mut source.data), &range);

    trace!(
        source = %source.name,
        target = %new_node.name,
        ?range,
        moved = moved.len(),
        retained = retained.len(),
        "partitioned displaced node"
    );

    let migration = Migration {
        source: source.name.clone(),
        moved: moved.len(),
        retained: retained.len(),
    };

    source.data = retained;
    new_node.data.extend(moved);

    Some(migration)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(name: &str, slot: u64, hashes: &[u64]) -> Node {
        let mut node = Node::new(name.to_owned(), format!("10.0.0.{slot}"), slot);
        node.data = hashes
            .iter()
            .map(|hash| DataItem::new(format!("v{hash}"), *hash))
            .collect();
        node
    }

    fn hashes(items: &[DataItem]) -> Vec<u64> {
        let mut hashes = items.iter().map(DataItem::hash).collect::<Vec<_>>();
        hashes.sort();
        hashes
    }

    #[test]
    fn partition_is_exhaustive_and_disjoint() {
        let items = (0..50).map(|h| DataItem::new(h.to_string(), h)).collect::<Vec<_>>();
        let Partition { retained, moved } = partition(items, &SlotRange::new(10, 20));

        assert_eq!(hashes(&moved), (11..=20).collect::<Vec<_>>());
        assert_eq!(retained.len(), 40);
        assert!(retained.iter().all(|item| !(11..=20).contains(&item.hash())));
    }

    #[test]
    fn insert_between_neighbors() {
        let mut nodes = vec![node("E", 9, &[0, 45]), node("B", 20, &[10, 13, 15, 20])];
        let mut new = node("X", 13, &[]);

        let migration = migrate(&mut nodes, 1, &mut new).unwrap();

        assert_eq!(migration, Migration {
            source: "B".into(),
            moved: 2,
            retained: 2,
        });
        assert_eq!(hashes(&new.data), vec![10, 13]);
        assert_eq!(hashes(&nodes[1].data), vec![15, 20]);
        assert_eq!(hashes(&nodes[0].data), vec![0, 45]);
    }

    #[test]
    fn insert_at_front_takes_both_sides_of_the_wrap() {
        let mut nodes = vec![node("E", 9, &[0, 3, 6, 9, 42, 48]), node("A", 41, &[30])];
        let mut new = node("X", 3, &[]);

        migrate(&mut nodes, 0, &mut new);

        assert_eq!(hashes(&new.data), vec![0, 3, 42, 48]);
        assert_eq!(hashes(&nodes[0].data), vec![6, 9]);
        assert_eq!(hashes(&nodes[1].data), vec![30]);
    }

    #[test]
    fn insert_past_the_end() {
        let mut nodes = vec![node("E", 9, &[0, 42, 48]), node("A", 41, &[30])];
        let mut new = node("X", 43, &[]);

        let migration = migrate(&mut nodes, 2, &mut new).unwrap();

        assert_eq!(migration.source, "E");
        assert_eq!(hashes(&new.data), vec![42]);
        assert_eq!(hashes(&nodes[0].data), vec![0, 48]);
    }

    #[test]
    fn single_node_ring() {
        // New slot above the lone node: it takes (9, 30].
        let mut nodes = vec![node("E", 9, &[1, 9, 10, 30, 31])];
        let mut new = node("X", 30, &[]);
        migrate(&mut nodes, 1, &mut new);
        assert_eq!(hashes(&new.data), vec![10, 30]);
        assert_eq!(hashes(&nodes[0].data), vec![1, 9, 31]);

        // New slot below the lone node: it takes (9, total) and [0, 4].
        let mut nodes = vec![node("E", 9, &[1, 4, 5, 9, 10, 49])];
        let mut new = node("X", 4, &[]);
        migrate(&mut nodes, 0, &mut new);
        assert_eq!(hashes(&new.data), vec![1, 4, 10, 49]);
        assert_eq!(hashes(&nodes[0].data), vec![5, 9]);
    }

    #[test]
    fn empty_ring_has_nothing_to_migrate() {
        let mut nodes: Vec<Node> = Vec::new();
        let mut new = node("X", 13, &[]);

        assert_eq!(migrate(&mut nodes, 0, &mut new), None);
        assert_eq!(migrate(&mut nodes, 3, &mut new), None);
        assert!(new.data.is_empty());
    }

    #[test]
    fn display() {
        let migration = Migration {
            source: "C".into(),
            moved: 1,
            retained: 3,
        };
        assert_eq!(migration.to_string(), "Moved 1 of 4 items from C");
    }
}
