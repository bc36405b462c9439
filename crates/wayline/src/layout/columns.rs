//! Vertical placement within layout columns.
//!
//! Nodes sharing a rank form a column. [`Columns`] tracks the vertical centre
//! of every node and moves it in a fixed sequence of steps: seeding,
//! barycenter balancing, branch spreading and minimum-gap enforcement.

use std::collections::BTreeMap;

use indexmap::{IndexMap, IndexSet};
use log::trace;

use wayline_core::{diagram::Node, identifier::Id};

use crate::graph::DiagramIndex;

/// Per-node vertical centres grouped into columns by rank.
///
/// Nodes are addressed internally by their position in the snapshot, so all
/// adjacency lookups are plain vector indexing.
#[derive(Debug, Clone)]
pub struct Columns {
    ids: IndexSet<Id>,
    ranks: Vec<usize>,
    /// Node positions per distinct rank, in ascending rank order.
    columns: Vec<Vec<usize>>,
    centers: Vec<f32>,
    predecessors: Vec<Vec<usize>>,
    successors: Vec<Vec<usize>>,
}

impl Columns {
    /// Groups the nodes of `index` by their rank. All centres start at 0.
    pub fn new(index: &DiagramIndex<'_>, ranks: &IndexMap<Id, usize>) -> Self {
        let ids: IndexSet<Id> = index.nodes().map(Node::id).collect();
        let node_ranks: Vec<usize> = ids
            .iter()
            .map(|id| ranks.get(id).copied().unwrap_or_default())
            .collect();

        let mut by_rank: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (node, rank) in node_ranks.iter().enumerate() {
            by_rank.entry(*rank).or_default().push(node);
        }

        let predecessors = ids
            .iter()
            .map(|id| {
                index
                    .predecessors(*id)
                    .filter_map(|other| ids.get_index_of(&other))
                    .collect()
            })
            .collect();
        let successors = ids
            .iter()
            .map(|id| {
                index
                    .successors(*id)
                    .filter_map(|other| ids.get_index_of(&other))
                    .collect()
            })
            .collect();

        Self {
            centers: vec![0.0; ids.len()],
            ids,
            ranks: node_ranks,
            columns: by_rank.into_values().collect(),
            predecessors,
            successors,
        }
    }

    /// Number of distinct ranks.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn rank(&self, id: Id) -> Option<usize> {
        self.ids.get_index_of(&id).map(|node| self.ranks[node])
    }

    /// Vertical centre of the node `id`.
    pub fn center_y(&self, id: Id) -> Option<f32> {
        self.ids.get_index_of(&id).map(|node| self.centers[node])
    }

    pub fn set_center_y(&mut self, id: Id, y: f32) {
        if let Some(node) = self.ids.get_index_of(&id) {
            self.centers[node] = y;
        }
    }

    /// Spaces each column `step` apart, ordered by node id.
    pub fn seed(&mut self, step: f32) {
        let ids = &self.ids;
        for column in &mut self.columns {
            column.sort_by(|a, b| ids[*a].cmp(&ids[*b]));
            for (slot, node) in column.iter().enumerate() {
                self.centers[*node] = slot as f32 * step;
            }
        }
    }

    /// Runs `passes` rounds of barycenter balancing.
    ///
    /// The forward sweep moves every node after the first column to the mean
    /// of its predecessors. The backward sweep, over every column but the
    /// last, moves each node halfway towards the mean of its successors.
    /// Each column is re-sorted and gap-enforced after its update. The pass
    /// count is fixed; there is no convergence check.
    pub fn balance(&mut self, passes: usize, min_gap: f32) {
        for pass in 0..passes {
            for column in self.columns.iter_mut().skip(1) {
                for node in column.iter() {
                    if let Some(mean) = mean_center(&self.predecessors[*node], &self.centers) {
                        self.centers[*node] = mean;
                    }
                }
                settle_column(column, &mut self.centers, min_gap);
            }

            for column in self.columns.iter_mut().rev().skip(1) {
                for node in column.iter() {
                    if let Some(mean) = mean_center(&self.successors[*node], &self.centers) {
                        self.centers[*node] = (self.centers[*node] + mean) / 2.0;
                    }
                }
                settle_column(column, &mut self.centers, min_gap);
            }
            trace!(pass; "Balancing pass done");
        }
    }

    /// Pulls the targets of every branching node towards a symmetric fan.
    ///
    /// For a node with at least two distinct successors, the successors are
    /// ordered by centre and the `i`-th is blended towards
    /// `source + (i - (n - 1) / 2) * gap` with weight `strength`.
    pub fn spread_branches(&mut self, gap: f32, strength: f32) {
        for source in 0..self.ids.len() {
            let mut targets: Vec<usize> = Vec::with_capacity(self.successors[source].len());
            for target in &self.successors[source] {
                if !targets.contains(target) {
                    targets.push(*target);
                }
            }
            if targets.len() < 2 {
                continue;
            }

            let centers = &mut self.centers;
            targets.sort_by(|a, b| centers[*a].total_cmp(&centers[*b]));
            let origin = centers[source];
            let start = -((targets.len() - 1) as f32 * gap) / 2.0;

            for (slot, target) in targets.iter().enumerate() {
                let preferred = origin + start + slot as f32 * gap;
                centers[*target] = centers[*target] * (1.0 - strength) + preferred * strength;
            }
            trace!(source:% = self.ids[source], targets = targets.len(); "Branch spread");
        }
    }

    /// Re-sorts every column after the first and pushes nodes down until
    /// neighbours are at least `min_gap` apart.
    pub fn enforce_gap(&mut self, min_gap: f32) {
        for column in self.columns.iter_mut().skip(1) {
            settle_column(column, &mut self.centers, min_gap);
        }
    }
}

fn mean_center(nodes: &[usize], centers: &[f32]) -> Option<f32> {
    if nodes.is_empty() {
        return None;
    }
    let sum: f32 = nodes.iter().map(|node| centers[*node]).sum();
    Some(sum / nodes.len() as f32)
}

fn settle_column(column: &mut [usize], centers: &mut [f32], min_gap: f32) {
    column.sort_by(|a, b| centers[*a].total_cmp(&centers[*b]));
    for slot in 1..column.len() {
        let floor = centers[column[slot - 1]] + min_gap;
        let center = &mut centers[column[slot]];
        *center = center.max(floor);
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;
    use wayline_core::{
        diagram::{Edge, NodeKind},
        geometry::Point,
    };

    use super::*;
    use crate::layout::rank::assign_ranks;

    fn snapshot(ids: &[&str], pairs: &[(&str, &str)]) -> (Vec<Node>, Vec<Edge>) {
        let nodes = ids
            .iter()
            .map(|id| Node::new(Id::new(id), NodeKind::Entity, Point::default()))
            .collect();
        let edges = pairs
            .iter()
            .enumerate()
            .map(|(i, (s, t))| Edge::new(Id::generated("edge", i), Id::new(s), Id::new(t)))
            .collect();
        (nodes, edges)
    }

    fn columns_for(nodes: &[Node], edges: &[Edge]) -> Columns {
        let index = DiagramIndex::new(nodes, edges);
        let ranks = assign_ranks(&index);
        Columns::new(&index, &ranks)
    }

    fn center(columns: &Columns, id: &str) -> f32 {
        columns.center_y(Id::new(id)).unwrap()
    }

    #[test]
    fn test_seed_orders_by_id() {
        let (nodes, edges) = snapshot(&["c", "a", "b"], &[]);
        let mut columns = columns_for(&nodes, &edges);
        columns.seed(170.0);

        assert_eq!(columns.column_count(), 1);
        assert_eq!(center(&columns, "a"), 0.0);
        assert_eq!(center(&columns, "b"), 170.0);
        assert_eq!(center(&columns, "c"), 340.0);
    }

    #[test]
    fn test_balance_centres_child_between_parents() {
        let (nodes, edges) = snapshot(&["a", "b", "c"], &[("a", "c"), ("b", "c")]);
        let mut columns = columns_for(&nodes, &edges);
        columns.seed(170.0);
        columns.balance(1, 150.0);

        // Forward: c = (0 + 170) / 2. Backward: a and b move halfway to c.
        assert_eq!(center(&columns, "c"), 85.0);
        assert_eq!(center(&columns, "a"), 42.5);
        assert_eq!(center(&columns, "b"), 192.5);
    }

    #[test]
    fn test_min_gap_enforced_in_column() {
        let (nodes, edges) = snapshot(&["root", "x", "y"], &[("root", "x"), ("root", "y")]);
        let mut columns = columns_for(&nodes, &edges);
        columns.seed(170.0);
        columns.balance(5, 150.0);

        let gap = (center(&columns, "y") - center(&columns, "x")).abs();
        assert!(gap >= 150.0 - 1e-3);
    }

    #[test]
    fn test_spread_branches_fans_out_symmetrically() {
        let (nodes, edges) = snapshot(
            &["hub", "t1", "t2", "t3"],
            &[("hub", "t1"), ("hub", "t2"), ("hub", "t3")],
        );
        let mut columns = columns_for(&nodes, &edges);
        for id in ["hub", "t1", "t2", "t3"] {
            columns.set_center_y(Id::new(id), 100.0);
        }

        columns.spread_branches(150.0, 0.35);

        let ys = [center(&columns, "t1"), center(&columns, "t2"), center(&columns, "t3")];
        assert!(ys[0] < ys[1] && ys[1] < ys[2]);
        assert_approx_eq!(f32, ys[1], 100.0);
        assert_approx_eq!(f32, ys[0] - 100.0, -(ys[2] - 100.0), epsilon = 1e-4);
        assert_approx_eq!(f32, ys[0], 100.0 - 150.0 * 0.35, epsilon = 1e-4);
    }

    #[test]
    fn test_spread_ignores_single_target_and_parallel_edges() {
        let (nodes, edges) = snapshot(&["a", "b"], &[("a", "b"), ("a", "b")]);
        let mut columns = columns_for(&nodes, &edges);
        columns.set_center_y(Id::new("b"), 40.0);

        columns.spread_branches(150.0, 0.9);
        assert_eq!(center(&columns, "b"), 40.0);
    }
}
