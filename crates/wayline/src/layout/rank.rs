//! Column assignment for the batch layout.

use std::collections::{HashMap, VecDeque};

use indexmap::IndexMap;
use log::{debug, warn};

use wayline_core::{diagram::Node, identifier::Id};

use crate::graph::DiagramIndex;

/// Assigns every node its rank, the column it is drawn in.
///
/// Roots get rank 0. Every other node gets one more than the highest rank
/// among its predecessors, propagated with Kahn's algorithm as in-edges are
/// consumed. Nodes on a cycle are never released from the queue; they keep
/// whatever rank a released predecessor pushed them to, or 0.
///
/// The result lists nodes in snapshot order.
pub fn assign_ranks(index: &DiagramIndex<'_>) -> IndexMap<Id, usize> {
    let mut ranks: IndexMap<Id, usize> = index.nodes().map(|node| (node.id(), 0)).collect();
    let mut remaining: HashMap<Id, usize> = index
        .nodes()
        .map(|node| (node.id(), index.in_degree(node.id())))
        .collect();
    let mut queue: VecDeque<Id> = index.roots().map(Node::id).collect();
    let mut released = 0;

    while let Some(id) = queue.pop_front() {
        released += 1;
        let next_rank = ranks.get(&id).copied().unwrap_or_default() + 1;

        for target in index.successors(id) {
            if let Some(rank) = ranks.get_mut(&target) {
                *rank = (*rank).max(next_rank);
            }
            if let Some(degree) = remaining.get_mut(&target) {
                *degree = degree.saturating_sub(1);
                if *degree == 0 {
                    queue.push_back(target);
                }
            }
        }
    }

    if released < ranks.len() {
        warn!(
            unreleased = ranks.len() - released;
            "Layout input has a cycle, unreached nodes keep their partial rank"
        );
    }

    debug!(
        nodes = ranks.len(),
        columns = ranks.values().max().map_or(0, |max| max + 1);
        "Ranks assigned"
    );
    ranks
}


#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;
    use wayline_core::{
        diagram::{Edge, NodeKind},
        geometry::Point,
    };

    use super::*;

    // ===================
    // Strategies
    // ===================

    /// A DAG over `n` nodes: every edge runs from a lower to a higher index.
    fn dag_strategy() -> impl Strategy<Value = (usize, Vec<(usize, usize)>)> {
        (2usize..12).prop_flat_map(|n| {
            let edge = (0..n - 1).prop_flat_map(move |source| (Just(source), source + 1..n));
            (Just(n), prop::collection::vec(edge, 0..24))
        })
    }

    // ===================
    // Property Test Functions
    // ===================

    fn check_rank_increases_along_edges(
        n: usize,
        pairs: &[(usize, usize)],
    ) -> Result<(), TestCaseError> {
        let nodes: Vec<Node> = (0..n)
            .map(|i| Node::new(Id::generated("node", i), NodeKind::Entity, Point::default()))
            .collect();
        let edges: Vec<Edge> = pairs
            .iter()
            .enumerate()
            .map(|(i, (s, t))| {
                Edge::new(
                    Id::generated("edge", i),
                    Id::generated("node", *s),
                    Id::generated("node", *t),
                )
            })
            .collect();
        let index = DiagramIndex::new(&nodes, &edges);
        let ranks = assign_ranks(&index);

        for edge in &edges {
            prop_assert!(ranks[&edge.target()] > ranks[&edge.source()]);
        }
        Ok(())
    }

    // ===================
    // Proptest Wrappers
    // ===================

    proptest! {
        #[test]
        fn rank_increases_along_edges((n, pairs) in dag_strategy()) {
            check_rank_increases_along_edges(n, &pairs)?;
        }
    }
}
