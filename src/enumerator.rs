//! Reverse-BFS path enumeration from a candidate transaction edge to DAG
//! sources, with per-path cycle prevention and content-hash deduplication.

use std::collections::{HashSet, VecDeque};

use crate::dag::DagView;
use crate::error::{EnumerationError, TaxonomyError};
use crate::taxonomy::AccountTaxonomy;

/// An ordered sequence of node ids from a DAG source to the sink of the
/// candidate transaction edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    pub nodes: Vec<String>,
    /// sha256 digest over the ordered node ids, used for deduplication.
    pub content_hash: String,
}

impl Path {
    fn from_nodes(nodes: Vec<String>) -> Self {
        let content_hash = sha256::digest(nodes.join("\u{1}"));
        Self { nodes, content_hash }
    }
}

pub struct PathEnumerator<'a, D: DagView> {
    dag: &'a D,
    max_paths: usize,
}

impl<'a, D: DagView> PathEnumerator<'a, D> {
    pub fn new(dag: &'a D, max_paths: usize) -> Self {
        Self { dag, max_paths }
    }

    /// Reverse-walks `incoming` edges from `sink_id` toward DAG sources,
    /// yielding every distinct source-to-sink path.
    ///
    /// A predecessor already present on the path under construction is
    /// skipped rather than yielded as an alternate branch (cycle
    /// prevention). Paths are deduplicated by content hash; exceeding
    /// `max_paths` distinct paths fails with `EnumerationExplosion`.
    pub fn enumerate(&self, sink_id: &str) -> Result<Vec<Path>, EnumerationError> {
        let mut found = Vec::new();
        let mut seen_hashes: HashSet<String> = HashSet::new();

        // Each queue entry holds a partial path in sink-to-current order;
        // the front is the sink, so reversing on completion yields
        // source-to-sink order as required.
        let mut queue: VecDeque<Vec<String>> = VecDeque::new();
        queue.push_back(vec![sink_id.to_string()]);

        while let Some(partial) = queue.pop_front() {
            let current = partial.last().expect("partial path is never empty");
            if self.dag.is_source(current) {
                let mut nodes = partial.clone();
                nodes.reverse();
                let path = Path::from_nodes(nodes);
                if seen_hashes.insert(path.content_hash.clone()) {
                    found.push(path);
                    if found.len() > self.max_paths {
                        return Err(EnumerationError::EnumerationExplosion {
                            max_paths: self.max_paths,
                            reached: found.len(),
                        });
                    }
                }
            }
            for predecessor in self.dag.incoming(current) {
                if partial.contains(predecessor) {
                    continue;
                }
                let mut extended = partial.clone();
                extended.push(predecessor.clone());
                queue.push_back(extended);
            }
        }

        Ok(found)
    }

    /// Converts `path` to the word classified by a frozen NFA, by
    /// delegating to the taxonomy.
    pub fn path_to_word(
        &self,
        path: &Path,
        taxonomy: &AccountTaxonomy,
        version: u64,
    ) -> Result<String, TaxonomyError> {
        taxonomy.path_to_string(&path.nodes, version)
    }

    /// Cheap, depth-bounded upper-bound estimate of the number of paths
    /// reachable from `sink_id`, ignoring deduplication. Not required for
    /// correctness; intended for operational heuristics (e.g. deciding
    /// whether to raise `max_paths` before calling `enumerate`).
    pub fn estimate_count(&self, sink_id: &str, depth_cap: usize) -> usize {
        let mut frontier = vec![sink_id.to_string()];
        let mut total = 0usize;
        for _ in 0..depth_cap {
            if frontier.is_empty() {
                break;
            }
            let mut next = Vec::new();
            for node in &frontier {
                if self.dag.is_source(node) {
                    total += 1;
                }
                next.extend(self.dag.incoming(node).iter().cloned());
            }
            frontier = next;
        }
        total + frontier.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dag::InMemoryDag;

    #[test]
    fn single_path_from_source_to_sink() {
        let dag = InMemoryDag::new().add_edge("alice", "bob");
        let enumerator = PathEnumerator::new(&dag, 100);
        let paths = enumerator.enumerate("bob").unwrap();
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].nodes, vec!["alice".to_string(), "bob".to_string()]);
    }

    #[test]
    fn diamond_dag_yields_two_distinct_paths() {
        let dag = InMemoryDag::new()
            .add_edge("alice", "mid1")
            .add_edge("alice", "mid2")
            .add_edge("mid1", "dave")
            .add_edge("mid2", "dave");
        let enumerator = PathEnumerator::new(&dag, 100);
        let paths = enumerator.enumerate("dave").unwrap();
        assert_eq!(paths.len(), 2);
    }

    #[test]
    fn shared_prefix_paths_deduplicate_by_content_hash() {
        let dag = InMemoryDag::new()
            .add_edge("alice", "bob")
            .add_edge("alice", "bob");
        let enumerator = PathEnumerator::new(&dag, 100);
        let paths = enumerator.enumerate("bob").unwrap();
        assert_eq!(paths.len(), 1);
    }

    #[test]
    fn exceeding_max_paths_raises_enumeration_explosion() {
        let dag = InMemoryDag::new()
            .add_edge("a1", "sink")
            .add_edge("a2", "sink")
            .add_edge("a3", "sink");
        let enumerator = PathEnumerator::new(&dag, 2);
        let err = enumerator.enumerate("sink").unwrap_err();
        assert!(matches!(
            err,
            EnumerationError::EnumerationExplosion { max_paths: 2, .. }
        ));
    }

    #[test]
    fn a_node_on_the_current_path_is_not_revisited() {
        // A malformed predecessor list pointing back at a node already
        // on the path under construction must not loop forever.
        let dag = InMemoryDag::new()
            .add_edge("alice", "bob")
            .add_edge("bob", "bob");
        let enumerator = PathEnumerator::new(&dag, 100);
        let paths = enumerator.enumerate("bob").unwrap();
        assert_eq!(paths.len(), 1);
    }
}
