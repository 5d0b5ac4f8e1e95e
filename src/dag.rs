//! The DAG contract this crate consumes, plus one in-memory implementation
//! for tests and doc examples.
//!
//! The DAG itself is owned externally (account/edge storage, commit,
//! rollback are out of scope here); the core depends only on [`DagView`],
//! never on a concrete graph type.

use std::collections::HashMap;

/// Read-only view of a DAG of accounts, as required by [`crate::enumerator::PathEnumerator`].
///
/// Implementations must present an acyclic graph; the enumerator's cycle
/// guard is a defense-in-depth measure, not a substitute for this contract.
pub trait DagView {
    /// Stable, taxonomy-keyable identifier for `node`.
    fn node_id(&self, node: &str) -> &str;

    /// True when `node` has no incoming edges (or is otherwise designated a
    /// source by the implementation).
    fn is_source(&self, node: &str) -> bool;

    /// Node ids with an edge directly into `node`.
    fn incoming(&self, node: &str) -> &[String];
}

/// A trivial adjacency-list `DagView` used by this crate's own tests and
/// doc examples. Not part of the contract a real DAG-owning collaborator
/// must satisfy beyond the trait.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDag {
    incoming: HashMap<String, Vec<String>>,
}

impl InMemoryDag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a directed edge `from -> to`.
    pub fn add_edge(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.incoming
            .entry(to.into())
            .or_default()
            .push(from.into());
        self
    }
}

impl DagView for InMemoryDag {
    fn node_id(&self, node: &str) -> &str {
        node
    }

    fn is_source(&self, node: &str) -> bool {
        self.incoming.get(node).is_none_or(|preds| preds.is_empty())
    }

    fn incoming(&self, node: &str) -> &[String] {
        self.incoming.get(node).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_with_no_edges_is_a_source() {
        let dag = InMemoryDag::new().add_edge("alice", "bob");
        assert!(dag.is_source("alice"));
        assert!(!dag.is_source("bob"));
    }

    #[test]
    fn incoming_lists_every_predecessor() {
        let dag = InMemoryDag::new()
            .add_edge("alice", "dave")
            .add_edge("bob", "dave");
        let mut preds = dag.incoming("dave").to_vec();
        preds.sort();
        assert_eq!(preds, vec!["alice".to_string(), "bob".to_string()]);
    }
}
