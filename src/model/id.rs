//! Identity of tree nodes.
//!
//! Node ids are independent of names and numbers so that a node keeps its
//! identity across renames. Fresh ids come from a process-wide counter;
//! callers restoring a tree may hand in explicit ones.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global counter for generating unique node IDs
static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identity of a borehole, section, step or data file
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl NodeId {
    /// Allocate a fresh id
    pub fn next() -> Self {
        NodeId(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Use `id` if given, otherwise allocate a fresh one
    pub fn or_next(id: Option<NodeId>) -> Self {
        id.unwrap_or_else(Self::next)
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        let a = NodeId::next();
        let b = NodeId::next();
        assert_ne!(a, b);
    }

    #[test]
    fn test_or_next_keeps_explicit() {
        let id = NodeId(42);
        assert_eq!(NodeId::or_next(Some(id)), id);
        assert_ne!(NodeId::or_next(None), id);
    }
}
