//! Partition identifiers and the membership map reported by the simulator.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::node::NodeId;

/// Thread partition identifier, rendered in hex the way the simulator prints it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartitionId(pub u32);

impl PartitionId {
    /// Reported for nodes that have not joined any partition yet.
    pub const UNASSIGNED: PartitionId = PartitionId(0);

    pub fn is_unassigned(&self) -> bool {
        *self == Self::UNASSIGNED
    }
}

impl From<u32> for PartitionId {
    fn from(id: u32) -> Self {
        PartitionId(id)
    }
}

impl std::fmt::Display for PartitionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:x}", self.0)
    }
}

// ── Membership ──────────────────────────────────────────────────────

/// Partition membership as reported by the simulator.
///
/// Keys are the distinct partitions currently present; values are the
/// nodes in each one. The map is passed through as-is: no invariants
/// beyond "distinct keys" are enforced here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Partitions(BTreeMap<PartitionId, Vec<NodeId>>);

impl Partitions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct partitions.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether any node is still reported under [`PartitionId::UNASSIGNED`].
    pub fn has_unassigned(&self) -> bool {
        self.contains(PartitionId::UNASSIGNED)
    }

    pub fn contains(&self, id: PartitionId) -> bool {
        self.0.contains_key(&id)
    }

    pub fn nodes(&self, id: PartitionId) -> Option<&[NodeId]> {
        self.0.get(&id).map(Vec::as_slice)
    }

    /// Partition a node belongs to, if it is listed anywhere.
    pub fn partition_of(&self, node: NodeId) -> Option<PartitionId> {
        self.0
            .iter()
            .find(|(_, nodes)| nodes.contains(&node))
            .map(|(id, _)| *id)
    }

    /// Add `node` to partition `id`, creating the partition if needed.
    pub fn insert(&mut self, id: PartitionId, node: NodeId) {
        self.0.entry(id).or_default().push(node);
    }

    pub fn iter(&self) -> impl Iterator<Item = (PartitionId, &[NodeId])> + '_ {
        self.0.iter().map(|(id, nodes)| (*id, nodes.as_slice()))
    }
}

impl FromIterator<(PartitionId, Vec<NodeId>)> for Partitions {
    fn from_iter<I: IntoIterator<Item = (PartitionId, Vec<NodeId>)>>(iter: I) -> Self {
        let mut out = Partitions::new();
        for (id, nodes) in iter {
            out.0.entry(id).or_default().extend(nodes);
        }
        out
    }
}

impl FromIterator<(PartitionId, NodeId)> for Partitions {
    fn from_iter<I: IntoIterator<Item = (PartitionId, NodeId)>>(iter: I) -> Self {
        let mut out = Partitions::new();
        for (id, node) in iter {
            out.insert(id, node);
        }
        out
    }
}

impl std::fmt::Display for Partitions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("{")?;
        for (i, (id, nodes)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{id}: {nodes:?}")?;
        }
        f.write_str("}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_distinct_partitions() {
        let pars: Partitions = [
            (PartitionId(0x1a2b), 1),
            (PartitionId(0x1a2b), 2),
            (PartitionId(0x3c4d), 3),
        ]
        .into_iter()
        .collect();

        assert_eq!(pars.len(), 2);
        assert_eq!(pars.nodes(PartitionId(0x1a2b)), Some(&[1, 2][..]));
        assert_eq!(pars.partition_of(3), Some(PartitionId(0x3c4d)));
        assert_eq!(pars.partition_of(9), None);
        assert!(!pars.has_unassigned());
    }

    #[test]
    fn detects_unassigned_partition() {
        let pars: Partitions = [(PartitionId(7), vec![1]), (PartitionId::UNASSIGNED, vec![2])]
            .into_iter()
            .collect();
        assert!(pars.has_unassigned());
        assert!(pars.contains(PartitionId(7)));
        assert!(!pars.contains(PartitionId(8)));
        assert!(PartitionId(0).is_unassigned());
    }

    #[test]
    fn merges_repeated_keys() {
        let pars: Partitions = [(PartitionId(5), vec![1]), (PartitionId(5), vec![2, 3])]
            .into_iter()
            .collect();
        assert_eq!(pars.len(), 1);
        assert_eq!(pars.nodes(PartitionId(5)), Some(&[1, 2, 3][..]));
    }

    #[test]
    fn display_renders_hex_ids() {
        let pars: Partitions = [(PartitionId(0xbeef), vec![1, 2])].into_iter().collect();
        assert_eq!(pars.to_string(), "{beef: [1, 2]}");
        assert_eq!(Partitions::new().to_string(), "{}");
    }
}
