//! Collision-avoiding node placement.
//!
//! [`PlacementResolver::resolve`] is the single search every editing
//! operation goes through before a new position is committed. The search is
//! bounded by a fixed number of attempts and always returns a position; when
//! the bound is exhausted the last candidate is returned as-is.
//!
//! The operations built on top of it (spawning, duplicating, pasting,
//! dragging, aligning and distributing) return new positions for the caller to
//! commit and never mutate the snapshot they are given.

use std::collections::{HashMap, HashSet};

use log::{debug, trace, warn};
use rand::Rng;

use wayline_core::{
    diagram::{BASE_Z_ORDER, Edge, LANE_HEIGHT, Node, NodeKind, PortIndex, Viewport, lane_index},
    geometry::{Bounds, Point, Size},
    identifier::Id,
};

use crate::{
    config::PlacementConfig,
    coords,
    shape::{self, CONTROL_CHIP_SIZE, DEFAULT_NODE_SIZE},
};

/// Top inset of a node inside its lane band.
const LANE_TOP_INSET: f32 = 20.0;

/// Bottom inset of a node's top edge inside its lane band.
const LANE_BOTTOM_INSET: f32 = 84.0;

/// A resolved position together with the lane it falls into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    id: Id,
    position: Point,
    lane: u32,
}

impl Placement {
    pub fn new(id: Id, position: Point) -> Self {
        Self {
            id,
            position,
            lane: lane_index(position.y()),
        }
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn lane(&self) -> u32 {
        self.lane
    }
}

/// Edge of the selection box that [`PlacementResolver::align_selection`] lines nodes up on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Center,
    Right,
    Top,
    Middle,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// Copied nodes and the edges running between them.
///
/// Each paste from the same clipboard is staggered further from the
/// originals.
#[derive(Debug, Clone, Default)]
pub struct Clipboard {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    paste_count: u32,
}

impl Clipboard {
    /// Copies the selected nodes and every edge whose both endpoints are selected.
    pub fn copy(nodes: &[Node], edges: &[Edge], selection: &[Id]) -> Self {
        let selected: HashSet<Id> = selection.iter().copied().collect();
        Self {
            nodes: nodes
                .iter()
                .filter(|node| selected.contains(&node.id()))
                .cloned()
                .collect(),
            edges: edges
                .iter()
                .filter(|edge| selected.contains(&edge.source()) && selected.contains(&edge.target()))
                .cloned()
                .collect(),
            paste_count: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn paste_count(&self) -> u32 {
        self.paste_count
    }
}

/// Finds free positions for nodes.
#[derive(Debug, Clone, Default)]
pub struct PlacementResolver {
    config: PlacementConfig,
}

impl PlacementResolver {
    pub fn new(config: PlacementConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PlacementConfig {
        &self.config
    }

    /// Returns a position near `candidate`'s own that overlaps no node in `existing`.
    ///
    /// A node in `existing` with the candidate's id is ignored. On each
    /// collision the candidate moves just past the colliding node's right
    /// edge; every `wrap_period`-th attempt instead returns to the original x
    /// one row lower.
    pub fn resolve(&self, candidate: &Node, existing: &[Node]) -> Point {
        let size = shape::effective_size(candidate);
        let origin = candidate.position();
        let mut resolved = origin;
        let padding = self.config.padding();
        let period = self.config.wrap_period();

        for attempt in 0..self.config.max_attempts() {
            let bounds = Bounds::new_from_top_left(resolved, size);
            let collision = existing.iter().find(|other| {
                other.id() != candidate.id() && bounds.overlaps(&shape::node_bounds(other), padding)
            });

            let Some(collision) = collision else {
                trace!(id:% = candidate.id(), attempt; "Placement resolved");
                return resolved;
            };

            let collision_bounds = shape::node_bounds(collision);
            resolved = Point::new(collision_bounds.max_x() + self.config.gap(), resolved.y());

            if attempt % period == period - 1 {
                resolved = Point::new(origin.x(), resolved.y() + self.config.row_step());
            }
        }

        warn!(
            id:% = candidate.id(),
            attempts = self.config.max_attempts();
            "Placement search exhausted, keeping last candidate"
        );
        resolved
    }

    /// Default top-left for a node spawned without an explicit position.
    ///
    /// The node is centred on the middle of the visible frame, offset by a
    /// random jitter so repeated spawns do not stack exactly.
    pub fn spawn_position<R: Rng + ?Sized>(
        &self,
        viewport: &Viewport,
        frame: Size,
        rng: &mut R,
    ) -> Point {
        let center = coords::to_world(
            Point::new(frame.width() / 2.0, frame.height() / 2.0),
            viewport,
        );
        let jitter = self.config.spawn_jitter();
        let offset = if jitter > 0.0 {
            Point::new(
                rng.random_range(-jitter..jitter),
                rng.random_range(-jitter..jitter),
            )
        } else {
            Point::default()
        };

        center
            .sub_point(Point::new(
                DEFAULT_NODE_SIZE.width() / 2.0,
                DEFAULT_NODE_SIZE.height() / 2.0,
            ))
            .add_point(offset)
    }

    /// Creates a node of `kind` at the first free spot near `position`.
    ///
    /// The node is stacked above every existing node. Control chips get
    /// their compact size.
    pub fn place_new_node(&self, id: Id, kind: NodeKind, position: Point, existing: &[Node]) -> Node {
        let mut node = Node::new(id, kind, position).with_z_order(next_z_order(existing));
        if kind == NodeKind::Control {
            node = node.with_size(CONTROL_CHIP_SIZE.width(), CONTROL_CHIP_SIZE.height());
        }

        let resolved = self.resolve(&node, existing);
        node.set_position(resolved);
        debug!(id:% = id, x = resolved.x(), y = resolved.y(); "Placed new node");
        node
    }

    /// Creates a node to the right of `source` and the edge connecting them.
    pub fn place_connected_node(
        &self,
        node_id: Id,
        edge_id: Id,
        kind: NodeKind,
        source: &Node,
        existing: &[Node],
    ) -> (Node, Edge) {
        let position = source
            .position()
            .add_point(Point::new(self.config.connected_offset(), 0.0));
        let node = self.place_new_node(node_id, kind, position, existing);
        let edge = Edge::new(edge_id, source.id(), node_id).with_ports(PortIndex::Right, PortIndex::Left);
        (node, edge)
    }

    /// Copies `source` under a new id, offset diagonally and resolved.
    pub fn duplicate_node(&self, new_id: Id, source: &Node, existing: &[Node]) -> Node {
        let offset = self.config.duplicate_offset();
        let mut node = source.clone();
        node.set_id(new_id);
        node.set_z_order(next_z_order(existing));
        node.set_position(source.position().add_point(Point::new(offset, offset)));
        if !source.label().is_empty() {
            node = node.with_label(format!("{} (Copy)", source.label()));
        }

        let resolved = self.resolve(&node, existing);
        node.set_position(resolved);
        node
    }

    /// Pastes the clipboard contents with fresh ids.
    ///
    /// Every paste moves further away from the originals. Each pasted node is
    /// resolved against the existing nodes and the nodes pasted before it.
    /// Copied edges are rewired to the pasted nodes.
    pub fn paste_nodes<F>(
        &self,
        clipboard: &mut Clipboard,
        existing: &[Node],
        mut next_id: F,
    ) -> (Vec<Node>, Vec<Edge>)
    where
        F: FnMut() -> Id,
    {
        if clipboard.is_empty() {
            return (Vec::new(), Vec::new());
        }

        clipboard.paste_count += 1;
        let offset = self.config.paste_stagger() * clipboard.paste_count as f32;
        let mut id_map = HashMap::with_capacity(clipboard.nodes.len());
        let mut placed: Vec<Node> = existing.to_vec();
        let mut pasted = Vec::with_capacity(clipboard.nodes.len());

        for original in &clipboard.nodes {
            let id = next_id();
            id_map.insert(original.id(), id);

            let mut node = original.clone();
            node.set_id(id);
            node.set_z_order(original.z_order() + 1);
            node.set_position(original.position().add_point(Point::new(offset, offset)));

            let resolved = self.resolve(&node, &placed);
            node.set_position(resolved);
            placed.push(node.clone());
            pasted.push(node);
        }

        let edges = clipboard
            .edges
            .iter()
            .filter_map(|edge| {
                let source = *id_map.get(&edge.source())?;
                let target = *id_map.get(&edge.target())?;
                Some(
                    Edge::new(next_id(), source, target)
                        .with_ports(edge.source_port(), edge.target_port())
                        .with_topology(edge.topology())
                        .with_label(edge.label()),
                )
            })
            .collect();

        debug!(count = pasted.len(), offset; "Pasted nodes");
        (pasted, edges)
    }

    /// Positions for the dragged nodes after the pointer moved from `start` to `current`.
    ///
    /// With a grid, the first dragged node snaps to the grid and the rest
    /// follow by the same delta.
    pub fn drag_positions(
        &self,
        initial: &[(Id, Point)],
        start: Point,
        current: Point,
        snap_to_grid: bool,
    ) -> Vec<Placement> {
        let mut delta = current.sub_point(start);
        let grid = self.config.grid_size();

        if snap_to_grid && grid > 0.0 {
            if let Some((_, primary)) = initial.first() {
                let moved = primary.add_point(delta);
                let snapped = Point::new(
                    (moved.x() / grid).round() * grid,
                    (moved.y() / grid).round() * grid,
                );
                delta = snapped.sub_point(*primary);
            }
        }

        initial
            .iter()
            .map(|(id, position)| Placement::new(*id, position.add_point(delta)))
            .collect()
    }

    /// Settles a dropped node against every other node.
    pub fn release_drag(&self, id: Id, nodes: &[Node]) -> Option<Placement> {
        let node = nodes.iter().find(|node| node.id() == id)?;
        Some(Placement::new(id, self.resolve(node, nodes)))
    }

    /// Lines up the selected nodes. Needs at least two selected nodes.
    pub fn align_selection(&self, nodes: &[Node], selection: &[Id], mode: Alignment) -> Vec<Placement> {
        let selected = selected_nodes(nodes, selection);
        if selected.len() < 2 {
            return Vec::new();
        }

        let boxes: Vec<_> = selected.iter().map(|node| shape::node_bounds(node)).collect();
        let count = boxes.len() as f32;
        let mut targets = Vec::with_capacity(boxes.len());

        for (node, bounds) in selected.iter().zip(&boxes) {
            let position = node.position();
            let target = match mode {
                Alignment::Left => {
                    let x = boxes.iter().map(|b| b.min_x()).fold(f32::INFINITY, f32::min);
                    position.with_x(x)
                }
                Alignment::Center => {
                    let cx = boxes.iter().map(|b| b.center().x()).sum::<f32>() / count;
                    position.with_x(cx - bounds.width() / 2.0)
                }
                Alignment::Right => {
                    let x = boxes.iter().map(|b| b.max_x()).fold(f32::NEG_INFINITY, f32::max);
                    position.with_x(x - bounds.width())
                }
                Alignment::Top => {
                    let y = boxes.iter().map(|b| b.min_y()).fold(f32::INFINITY, f32::min);
                    position.with_y(y)
                }
                Alignment::Middle => {
                    let cy = boxes.iter().map(|b| b.center().y()).sum::<f32>() / count;
                    position.with_y(cy - bounds.height() / 2.0)
                }
                Alignment::Bottom => {
                    let y = boxes.iter().map(|b| b.max_y()).fold(f32::NEG_INFINITY, f32::max);
                    position.with_y(y - bounds.height())
                }
            };
            targets.push((node.id(), target));
        }

        self.settle_moved_nodes(nodes, &targets)
    }

    /// Spaces the selected nodes' centres evenly along `axis`.
    ///
    /// Needs at least three nodes. The two outermost nodes keep their place.
    pub fn distribute_selection(&self, nodes: &[Node], selection: &[Id], axis: Axis) -> Vec<Placement> {
        let selected = selected_nodes(nodes, selection);
        if selected.len() < 3 {
            return Vec::new();
        }

        let along = |node: &Node| {
            let center = shape::node_bounds(node).center();
            match axis {
                Axis::Horizontal => center.x(),
                Axis::Vertical => center.y(),
            }
        };

        let mut ordered = selected;
        ordered.sort_by(|a, b| along(a).total_cmp(&along(b)));

        let last_index = ordered.len() - 1;
        let first = along(ordered[0]);
        let last = along(ordered[last_index]);
        let step = (last - first) / last_index as f32;

        let targets: Vec<_> = ordered
            .iter()
            .enumerate()
            .map(|(index, node)| {
                let position = node.position();
                if index == 0 || index == last_index {
                    return (node.id(), position);
                }
                let size = shape::effective_size(node);
                let center = first + step * index as f32;
                let target = match axis {
                    Axis::Horizontal => position.with_x(center - size.width() / 2.0),
                    Axis::Vertical => position.with_y(center - size.height() / 2.0),
                };
                (node.id(), target)
            })
            .collect();

        self.settle_moved_nodes(nodes, &targets)
    }

    /// Resolves a batch of moved nodes without creating new overlaps.
    ///
    /// Stationary nodes are placed first. Moved nodes follow in snapshot
    /// order, each resolved against everything placed before it.
    pub fn settle_moved_nodes(&self, nodes: &[Node], targets: &[(Id, Point)]) -> Vec<Placement> {
        if targets.is_empty() {
            return Vec::new();
        }

        let targets: HashMap<Id, Point> = targets.iter().copied().collect();
        let mut placed: Vec<Node> = nodes
            .iter()
            .filter(|node| !targets.contains_key(&node.id()))
            .cloned()
            .collect();
        let mut placements = Vec::with_capacity(targets.len());

        for node in nodes.iter().filter(|node| targets.contains_key(&node.id())) {
            let mut candidate = node.clone();
            if let Some(target) = targets.get(&node.id()) {
                candidate.set_position(*target);
            }
            let resolved = self.resolve(&candidate, &placed);
            candidate.set_position(resolved);
            placements.push(Placement::new(node.id(), resolved));
            placed.push(candidate);
        }

        debug!(moved = placements.len(); "Settled moved nodes");
        placements
    }
}

/// Z-order that puts a node above every node in `nodes`.
pub fn next_z_order(nodes: &[Node]) -> i32 {
    nodes
        .iter()
        .map(Node::z_order)
        .fold(BASE_Z_ORDER, i32::max)
        + 1
}

/// Z-order for bringing `id` to the front, or `None` when it is not in `nodes`.
pub fn bring_to_front(nodes: &[Node], id: Id) -> Option<i32> {
    nodes
        .iter()
        .any(|node| node.id() == id)
        .then(|| next_z_order(nodes))
}

/// Keeps a dropped node inside its swimlane band.
///
/// The lane is clamped to `lane_count` lanes. Anchor nodes are exempt.
/// Returns `None` when the node needs no adjustment.
pub fn clamp_to_lane(node: &Node, lane_count: usize) -> Option<Placement> {
    if node.kind() == NodeKind::Anchor {
        return None;
    }

    let position = node.position();
    let last_lane = lane_count.max(1) - 1;
    let lane = ((position.y().max(0.0) / LANE_HEIGHT).floor() as usize).min(last_lane) as f32;
    let top = lane * LANE_HEIGHT + LANE_TOP_INSET;
    let bottom = (lane + 1.0) * LANE_HEIGHT - LANE_BOTTOM_INSET;
    let y = position.y().clamp(top, bottom);

    if (y - position.y()).abs() <= 0.1 {
        return None;
    }
    Some(Placement::new(node.id(), position.with_y(y)))
}

fn selected_nodes<'a>(nodes: &'a [Node], selection: &[Id]) -> Vec<&'a Node> {
    let selected: HashSet<Id> = selection.iter().copied().collect();
    nodes.iter().filter(|node| selected.contains(&node.id())).collect()
}
