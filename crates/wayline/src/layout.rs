//! Batch layout of a whole diagram.
//!
//! The [`LayoutEngine`] places every node of a snapshot in one call:
//!
//! 1. Ranks are assigned with Kahn's algorithm ([`rank::assign_ranks`]).
//! 2. Each rank becomes a column, seeded top to bottom in id order.
//! 3. A fixed number of barycenter passes balance the columns.
//! 4. Targets of branching nodes are fanned out around their source.
//! 5. Columns are spaced horizontally by the preset's step.
//! 6. The result is scaled uniformly into the configured frame, centred.
//!
//! Edges are then routed with the same [`PathBuilder`] and labelled with the
//! same [`LabelPlacer`] the interactive editor uses, so a batch layout looks
//! exactly like one built by hand.
//!
//! The engine is deterministic: the same snapshot and configuration always
//! produce the same layout. It makes no attempt at crossing minimisation
//! beyond the barycenter heuristic.

pub mod columns;
pub mod rank;

use indexmap::IndexMap;
use log::{debug, info, trace};

use wayline_core::{
    diagram::{Edge, Node},
    geometry::{Bounds, Point},
    identifier::Id,
};

use crate::{
    config::{AppConfig, LabelConfig, LayoutConfig, LayoutPreset, RoutingConfig},
    export::Scene,
    graph::DiagramIndex,
    label::LabelPlacer,
    routing::{PathBuilder, RoutedEdge},
    shape,
};

pub use columns::Columns;
pub use rank::assign_ranks;

// =============================================================================
// Presets
// =============================================================================

/// Spacing and tuning constants of a [`LayoutPreset`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PresetParams {
    x_step: f32,
    seed_step: f32,
    min_gap: f32,
    branch_gap: f32,
    branch_strength: f32,
    label_offsets: &'static [f32],
}

impl PresetParams {
    pub fn new(preset: LayoutPreset) -> Self {
        match preset {
            LayoutPreset::Pipeline => Self {
                x_step: 300.0,
                seed_step: 170.0,
                min_gap: 150.0,
                branch_gap: 150.0,
                branch_strength: 0.35,
                label_offsets: &[-22.0, -34.0, 22.0, 34.0, -46.0, 46.0, 0.0],
            },
            LayoutPreset::Branch => Self {
                x_step: 290.0,
                seed_step: 190.0,
                min_gap: 165.0,
                branch_gap: 190.0,
                branch_strength: 0.9,
                label_offsets: &[-30.0, 30.0, -46.0, 46.0, -60.0, 60.0, 0.0],
            },
            LayoutPreset::Compact => Self {
                x_step: 250.0,
                seed_step: 145.0,
                min_gap: 130.0,
                branch_gap: 140.0,
                branch_strength: 0.25,
                label_offsets: &[-18.0, -28.0, 18.0, 28.0, -38.0, 38.0, 0.0],
            },
        }
    }

    /// Horizontal distance between column centres.
    pub fn x_step(&self) -> f32 {
        self.x_step
    }

    /// Vertical spacing used to seed each column.
    pub fn seed_step(&self) -> f32 {
        self.seed_step
    }

    /// Minimum distance between centres of neighbours in a column.
    pub fn min_gap(&self) -> f32 {
        self.min_gap
    }

    pub fn branch_gap(&self) -> f32 {
        self.branch_gap
    }

    /// Blend weight towards the branch fan, from 0 (ignore) to 1 (snap).
    pub fn branch_strength(&self) -> f32 {
        self.branch_strength
    }

    /// Vertical label offsets tried in order.
    pub fn label_offsets(&self) -> &'static [f32] {
        self.label_offsets
    }
}

impl From<LayoutPreset> for PresetParams {
    fn from(preset: LayoutPreset) -> Self {
        Self::new(preset)
    }
}

// =============================================================================
// Layout result
// =============================================================================

/// A laid-out diagram: repositioned nodes plus routed, labelled edges.
#[derive(Debug, Clone)]
pub struct DiagramLayout {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    routes: Vec<RoutedEdge>,
    ranks: IndexMap<Id, usize>,
    scale: f32,
}

impl DiagramLayout {
    /// Nodes with their new positions and sizes, in snapshot order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Edges whose endpoints both exist, in snapshot order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Routed edges in snapshot order. Dangling edges are absent.
    pub fn routes(&self) -> &[RoutedEdge] {
        &self.routes
    }

    pub fn rank(&self, id: Id) -> Option<usize> {
        self.ranks.get(&id).copied()
    }

    /// Uniform factor the raw layout was scaled by to fit the frame.
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Box around all nodes, or `None` for an empty diagram.
    pub fn bounds(&self) -> Option<Bounds> {
        self.nodes
            .iter()
            .map(shape::node_bounds)
            .reduce(|acc, bounds| acc.merge(&bounds))
    }

    /// Borrows the layout for rendering.
    pub fn scene(&self) -> Scene<'_> {
        Scene::new(&self.nodes, &self.edges, &self.routes)
    }

    pub fn into_parts(self) -> (Vec<Node>, Vec<Edge>, Vec<RoutedEdge>) {
        (self.nodes, self.edges, self.routes)
    }
}

// =============================================================================
// Engine
// =============================================================================

/// Deterministic layered layout for a whole snapshot.
#[derive(Debug, Clone, Default)]
pub struct LayoutEngine {
    layout: LayoutConfig,
    routing: RoutingConfig,
    labels: LabelConfig,
}

impl LayoutEngine {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            layout: config.layout().clone(),
            routing: config.routing().clone(),
            labels: config.labels().clone(),
        }
    }

    /// Replaces the configured preset.
    pub fn with_preset(mut self, preset: LayoutPreset) -> Self {
        self.layout = LayoutConfig::new(preset, self.layout.passes(), *self.layout.frame());
        self
    }

    pub fn preset(&self) -> LayoutPreset {
        self.layout.preset()
    }

    /// Lays out `nodes` and routes `edges` between them.
    ///
    /// A node id that occurs twice keeps its first record; edges with a
    /// missing endpoint get no route. Cyclic input still produces a layout,
    /// with unreached nodes in the first columns.
    pub fn layout(&self, nodes: &[Node], edges: &[Edge]) -> DiagramLayout {
        let params = PresetParams::new(self.layout.preset());
        info!(
            nodes = nodes.len(),
            edges = edges.len(),
            preset:? = self.layout.preset();
            "Running batch layout"
        );

        let index = DiagramIndex::new(nodes, edges);
        let ranks = rank::assign_ranks(&index);

        let mut columns = Columns::new(&index, &ranks);
        columns.seed(params.seed_step());
        columns.balance(self.layout.passes(), params.min_gap());
        columns.spread_branches(params.branch_gap(), params.branch_strength());
        columns.enforce_gap(params.min_gap());

        let mut placed: Vec<Node> = index
            .nodes()
            .map(|node| {
                let mut node = node.clone();
                let size = shape::effective_size(&node);
                let rank = ranks.get(&node.id()).copied().unwrap_or_default();
                let center = Point::new(
                    rank as f32 * params.x_step(),
                    columns.center_y(node.id()).unwrap_or_default(),
                );
                node.set_size(Some(size.width()), Some(size.height()));
                node.set_position(center.sub_point(Point::new(
                    size.width() / 2.0,
                    size.height() / 2.0,
                )));
                trace!(id:% = node.id(), rank, x = center.x(), y = center.y(); "Node placed in column");
                node
            })
            .collect();

        let scale = fit_into_frame(&mut placed, self.layout.frame().to_bounds());
        debug!(
            columns = columns.column_count(),
            passes = self.layout.passes(),
            scale;
            "Columns balanced and fitted"
        );

        let kept: Vec<Edge> = index.edges().cloned().collect();
        let routes = self.route(&placed, &kept, params.label_offsets());

        DiagramLayout {
            nodes: placed,
            edges: kept,
            routes,
            ranks,
            scale,
        }
    }

    fn route(&self, nodes: &[Node], edges: &[Edge], label_offsets: &[f32]) -> Vec<RoutedEdge> {
        let index = DiagramIndex::new(nodes, edges);
        let mut routes = PathBuilder::new(self.routing.clone()).route_edges(&index);

        let node_boxes: Vec<Bounds> = nodes.iter().map(shape::node_bounds).collect();
        LabelPlacer::new(self.labels.clone())
            .with_vertical_offsets(label_offsets)
            .label_routes(edges, &mut routes, &node_boxes);

        routes
    }
}

/// Scales and translates `nodes` uniformly so their joint box is centred in
/// `frame`. Sizes scale with positions. Returns the scale factor.
///
/// The raw box is taken to be at least 1×1.
pub fn fit_into_frame(nodes: &mut [Node], frame: Bounds) -> f32 {
    let Some(raw) = nodes
        .iter()
        .map(shape::node_bounds)
        .reduce(|acc, bounds| acc.merge(&bounds))
    else {
        return 1.0;
    };

    let raw_width = raw.width().max(1.0);
    let raw_height = raw.height().max(1.0);
    let scale = (frame.width() / raw_width).min(frame.height() / raw_height);

    let offset = Point::new(
        frame.min_x() + (frame.width() - raw_width * scale) / 2.0 - raw.min_x() * scale,
        frame.min_y() + (frame.height() - raw_height * scale) / 2.0 - raw.min_y() * scale,
    );

    for node in nodes.iter_mut() {
        let size = shape::effective_size(node).scale(scale);
        node.set_position(node.position().scale(scale).add_point(offset));
        node.set_size(Some(size.width()), Some(size.height()));
    }
    scale
}
