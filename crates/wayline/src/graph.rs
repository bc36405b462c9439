//! Per-turn index over a node/edge snapshot.
//!
//! Nodes do not know their edges, and edges refer to nodes only by id. The
//! [`DiagramIndex`] is rebuilt from the caller's snapshot for each call into
//! the engine, so it never holds on to anything the session might delete.
//!
//! Capabilities:
//! - Node lookup by id, preserving snapshot order
//! - Incoming and outgoing adjacency per node
//! - Root detection (nodes with no incoming edges)
//! - Dangling edges are set aside instead of failing the build

use std::collections::HashMap;

use indexmap::IndexMap;
use log::{debug, warn};

use wayline_core::{
    diagram::{Edge, Node},
    identifier::Id,
};

// =============================================================================
// Low-level primitive types
// =============================================================================

/// Position of an edge within [`DiagramIndex::edges`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct EdgeIndex(usize);

// =============================================================================
// Snapshot index
// =============================================================================

/// Read-only view of one snapshot with adjacency lists.
///
/// Only edges whose endpoints both exist are indexed. A node id that occurs
/// twice keeps its first record.
#[derive(Debug)]
pub struct DiagramIndex<'a> {
    nodes: IndexMap<Id, &'a Node>,
    edges: Vec<&'a Edge>,
    incoming: HashMap<Id, Vec<EdgeIndex>>,
    outgoing: HashMap<Id, Vec<EdgeIndex>>,
    dangling: Vec<Id>,
}

impl<'a> DiagramIndex<'a> {
    /// Builds the index for one snapshot.
    pub fn new(nodes: &'a [Node], edges: &'a [Edge]) -> Self {
        let mut index = Self {
            nodes: IndexMap::with_capacity(nodes.len()),
            edges: Vec::with_capacity(edges.len()),
            incoming: HashMap::new(),
            outgoing: HashMap::new(),
            dangling: Vec::new(),
        };

        for node in nodes {
            index.nodes.entry(node.id()).or_insert(node);
        }

        for edge in edges {
            index.add_edge(edge);
        }

        debug!(
            nodes = index.nodes.len(),
            edges = index.edges.len(),
            dangling = index.dangling.len();
            "Diagram index built"
        );
        index
    }

    fn add_edge(&mut self, edge: &'a Edge) {
        if !self.contains_node(edge.source()) || !self.contains_node(edge.target()) {
            warn!(
                edge:% = edge.id(),
                source:% = edge.source(),
                target:% = edge.target();
                "Skipping edge with dangling endpoint"
            );
            self.dangling.push(edge.id());
            return;
        }

        let idx = EdgeIndex(self.edges.len());
        self.edges.push(edge);
        self.outgoing.entry(edge.source()).or_default().push(idx);
        self.incoming.entry(edge.target()).or_default().push(idx);
    }

    /// Returns the node with the given id, if it exists.
    pub fn node(&self, id: Id) -> Option<&'a Node> {
        self.nodes.get(&id).copied()
    }

    /// Checks if a node with the given id exists in the snapshot.
    pub fn contains_node(&self, id: Id) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Returns all nodes in snapshot order.
    pub fn nodes(&self) -> impl Iterator<Item = &'a Node> + '_ {
        self.nodes.values().copied()
    }

    pub fn nodes_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the valid edges in snapshot order.
    pub fn edges(&self) -> impl Iterator<Item = &'a Edge> + '_ {
        self.edges.iter().copied()
    }

    /// Ids of edges that were skipped because an endpoint is missing.
    pub fn dangling_edges(&self) -> &[Id] {
        &self.dangling
    }

    /// Returns nodes with no incoming edges, in snapshot order.
    pub fn roots(&self) -> impl Iterator<Item = &'a Node> + '_ {
        self.nodes
            .iter()
            .filter(|(id, _)| !self.incoming.contains_key(*id))
            .map(|(_, node)| *node)
    }

    /// Number of valid edges ending at `id`.
    pub fn in_degree(&self, id: Id) -> usize {
        self.incoming.get(&id).map_or(0, Vec::len)
    }

    /// Edges leaving `id`, in snapshot order.
    pub fn outgoing_edges(&self, id: Id) -> impl Iterator<Item = &'a Edge> + '_ {
        self.outgoing
            .get(&id)
            .into_iter()
            .flatten()
            .map(|idx| self.edges[idx.0])
    }

    /// Ids of the direct successors of `id`, one per edge.
    pub fn successors(&self, id: Id) -> impl Iterator<Item = Id> + '_ {
        self.outgoing_edges(id).map(Edge::target)
    }

    /// Ids of the direct predecessors of `id`, one per edge.
    pub fn predecessors(&self, id: Id) -> impl Iterator<Item = Id> + '_ {
        self.incoming
            .get(&id)
            .into_iter()
            .flatten()
            .map(|idx| self.edges[idx.0].source())
    }
}
