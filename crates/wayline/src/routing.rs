//! Edge path construction.
//!
//! [`PathBuilder`] turns an edge's two port anchors into drawable geometry: a
//! polyline or a cubic Bézier curve, the tangent angles at both ends for
//! arrowheads, and an anchor point for the edge label.
//!
//! Edges that connect the same pair of nodes, in either direction, form a
//! parallel group. Each member gets a [`ParallelSlot`] and is offset from the
//! naive path so the group fans out symmetrically.

use std::collections::HashMap;

use indexmap::IndexMap;
use log::{debug, trace, warn};
use serde::Serialize;

use wayline_core::{
    diagram::{Edge, PortIndex, Topology},
    geometry::{Bounds, Point},
    identifier::Id,
};

use crate::{config::RoutingConfig, graph::DiagramIndex, shape};

/// Points closer than this are treated as the same point.
const POINT_EPSILON: f32 = 1e-3;

/// Drawable geometry of an edge.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PathGeometry {
    /// Straight segments through the given points.
    Polyline { points: Vec<Point> },
    /// A single cubic Bézier curve.
    Cubic {
        start: Point,
        c1: Point,
        c2: Point,
        end: Point,
    },
}

impl PathGeometry {
    /// Samples the path as a polyline, with `segments` steps for curves.
    pub fn flatten(&self, segments: usize) -> Vec<Point> {
        match self {
            Self::Polyline { points } => points.clone(),
            Self::Cubic { start, c1, c2, end } => {
                let segments = segments.max(1);
                (0..=segments)
                    .map(|i| cubic_point(*start, *c1, *c2, *end, i as f32 / segments as f32))
                    .collect()
            }
        }
    }
}

/// Path geometry plus the data needed to decorate it.
///
/// Angles are in degrees, with 0° along +x and 90° along +y.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgePath {
    geometry: PathGeometry,
    start_angle: f32,
    end_angle: f32,
    label_anchor: Point,
}

impl EdgePath {
    pub fn geometry(&self) -> &PathGeometry {
        &self.geometry
    }

    /// Direction the path leaves its source in.
    pub fn start_angle(&self) -> f32 {
        self.start_angle
    }

    /// Direction the path arrives at its target in.
    pub fn end_angle(&self) -> f32 {
        self.end_angle
    }

    pub fn label_anchor(&self) -> Point {
        self.label_anchor
    }
}

/// Position of an edge within its parallel group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParallelSlot {
    index: usize,
    count: usize,
}

impl ParallelSlot {
    /// A slot for an edge with no parallel siblings.
    pub const SINGLE: ParallelSlot = ParallelSlot { index: 0, count: 1 };

    pub fn new(index: usize, count: usize) -> Self {
        Self {
            index,
            count: count.max(index + 1),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Offset from the naive path: `index * gap - (count - 1) * gap / 2`.
    pub fn offset(&self, gap: f32) -> f32 {
        self.index as f32 * gap - (self.count as f32 - 1.0) * gap / 2.0
    }
}

/// Assigns each edge its slot within the group of edges joining the same
/// unordered node pair. Slots follow the order of `edges`.
pub fn parallel_groups<'e>(edges: impl IntoIterator<Item = &'e Edge>) -> HashMap<Id, ParallelSlot> {
    let mut groups: IndexMap<(Id, Id), Vec<Id>> = IndexMap::new();
    for edge in edges {
        let (a, b) = (edge.source(), edge.target());
        let key = if a <= b { (a, b) } else { (b, a) };
        groups.entry(key).or_default().push(edge.id());
    }

    groups
        .values()
        .flat_map(|members| {
            let count = members.len();
            members
                .iter()
                .enumerate()
                .map(move |(index, id)| (*id, ParallelSlot::new(index, count)))
        })
        .collect()
}

/// One end of an edge: where it attaches and which way the port faces.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PortEnd {
    pub anchor: Point,
    pub port: PortIndex,
}

impl PortEnd {
    pub fn new(anchor: Point, port: PortIndex) -> Self {
        Self { anchor, port }
    }
}

/// An edge together with its computed path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutedEdge {
    id: Id,
    path: EdgePath,
    #[serde(skip_serializing_if = "Option::is_none")]
    label: Option<Bounds>,
}

impl RoutedEdge {
    pub fn new(id: Id, path: EdgePath) -> Self {
        Self {
            id,
            path,
            label: None,
        }
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn path(&self) -> &EdgePath {
        &self.path
    }

    /// The placed label box, if the edge has a label.
    pub fn label(&self) -> Option<Bounds> {
        self.label
    }

    pub fn set_label(&mut self, bounds: Bounds) {
        self.label = Some(bounds);
    }
}

/// Builds edge paths for all three topologies.
#[derive(Debug, Clone, Default)]
pub struct PathBuilder {
    config: RoutingConfig,
}

impl PathBuilder {
    pub fn new(config: RoutingConfig) -> Self {
        Self { config }
    }

    /// Builds the path between two port ends.
    pub fn build(
        &self,
        topology: Topology,
        source: PortEnd,
        target: PortEnd,
        slot: ParallelSlot,
    ) -> EdgePath {
        let offset = slot.offset(self.config.parallel_gap());
        match topology {
            Topology::Straight => straight(source.anchor, target.anchor),
            Topology::Bezier => self.bezier(source.anchor, target.anchor, offset),
            Topology::Orthogonal => self.orthogonal(source, target, offset),
        }
    }

    /// Builds the path of `edge` from the nodes in `index`.
    ///
    /// Returns `None` when either endpoint is missing from the snapshot.
    pub fn route_edge(
        &self,
        index: &DiagramIndex<'_>,
        edge: &Edge,
        slot: ParallelSlot,
    ) -> Option<EdgePath> {
        let (Some(source), Some(target)) = (index.node(edge.source()), index.node(edge.target()))
        else {
            warn!(edge:% = edge.id(); "Edge references a missing node, no path built");
            return None;
        };

        let path = self.build(
            edge.topology(),
            PortEnd::new(shape::port_anchor(source, edge.source_port()), edge.source_port()),
            PortEnd::new(shape::port_anchor(target, edge.target_port()), edge.target_port()),
            slot,
        );
        trace!(edge:% = edge.id(), path:?; "Edge routed");
        Some(path)
    }

    /// Routes every valid edge of `index`, in snapshot order.
    pub fn route_edges(&self, index: &DiagramIndex<'_>) -> Vec<RoutedEdge> {
        let slots = parallel_groups(index.edges());
        let routed: Vec<RoutedEdge> = index
            .edges()
            .filter_map(|edge| {
                let slot = slots.get(&edge.id()).copied().unwrap_or(ParallelSlot::SINGLE);
                self.route_edge(index, edge, slot)
                    .map(|path| RoutedEdge::new(edge.id(), path))
            })
            .collect();

        debug!(
            routed = routed.len(),
            skipped = index.dangling_edges().len();
            "Edges routed"
        );
        routed
    }

    fn bezier(&self, start: Point, end: Point, offset: f32) -> EdgePath {
        let delta = end.sub_point(start);
        let ratio = self.config.bezier_handle_ratio();

        let (c1, c2) = if delta.x().abs() >= delta.y().abs() {
            (
                Point::new(start.x() + delta.x() * ratio, start.y() + offset),
                Point::new(end.x() - delta.x() * ratio, end.y() + offset),
            )
        } else {
            (
                Point::new(start.x() + offset, start.y() + delta.y() * ratio),
                Point::new(end.x() + offset, end.y() - delta.y() * ratio),
            )
        };

        let chord = delta.direction_degrees();
        let start_angle = c1
            .sub_point(start)
            .direction_degrees()
            .or(chord)
            .unwrap_or(0.0);
        let end_angle = end
            .sub_point(c2)
            .direction_degrees()
            .or(chord)
            .unwrap_or(0.0);

        EdgePath {
            geometry: PathGeometry::Cubic { start, c1, c2, end },
            start_angle,
            end_angle,
            label_anchor: cubic_point(start, c1, c2, end, 0.5),
        }
    }

    fn orthogonal(&self, source: PortEnd, target: PortEnd, offset: f32) -> EdgePath {
        let exit_distance = self.config.orthogonal_exit();
        let exit = source
            .anchor
            .add_point(source.port.outward_normal().scale(exit_distance));
        let entry = target
            .anchor
            .add_point(target.port.outward_normal().scale(exit_distance));

        let mut points = vec![source.anchor, exit];
        match (source.port.is_horizontal(), target.port.is_horizontal()) {
            (true, true) => {
                let x = (exit.x() + entry.x()) / 2.0 + offset;
                points.push(Point::new(x, exit.y()));
                points.push(Point::new(x, entry.y()));
            }
            (false, false) => {
                let y = (exit.y() + entry.y()) / 2.0 + offset;
                points.push(Point::new(exit.x(), y));
                points.push(Point::new(entry.x(), y));
            }
            (true, false) => points.push(Point::new(entry.x(), exit.y())),
            (false, true) => points.push(Point::new(exit.x(), entry.y())),
        }
        points.push(entry);
        points.push(target.anchor);
        points.dedup_by(|b, a| a.distance(*b) <= POINT_EPSILON);

        polyline(merge_collinear(points))
    }
}

/// Drops every vertex that continues its incoming segment in the same
/// direction, so each straight run is a single segment.
fn merge_collinear(points: Vec<Point>) -> Vec<Point> {
    let mut merged: Vec<Point> = Vec::with_capacity(points.len());
    for point in points {
        let straight = matches!(
            merged.as_slice(),
            [.., a, b] if continues_straight(*a, *b, point)
        );
        if straight {
            merged.pop();
        }
        merged.push(point);
    }
    merged
}

fn continues_straight(a: Point, b: Point, c: Point) -> bool {
    let (ab, bc) = (b.sub_point(a), c.sub_point(b));
    let cross = ab.x() * bc.y() - ab.y() * bc.x();
    let dot = ab.x() * bc.x() + ab.y() * bc.y();
    dot > 0.0 && cross.abs() <= POINT_EPSILON * ab.hypot() * bc.hypot()
}

fn straight(start: Point, end: Point) -> EdgePath {
    polyline(vec![start, end])
}

/// Wraps a polyline, taking angles from the end segments and the label
/// anchor from the middle of the longest segment.
fn polyline(points: Vec<Point>) -> EdgePath {
    let first = points.first().copied().unwrap_or_default();

    let start_angle = match points.as_slice() {
        [a, b, ..] => b.sub_point(*a).direction_degrees().unwrap_or(0.0),
        _ => 0.0,
    };
    let end_angle = match points.as_slice() {
        [.., a, b] => b.sub_point(*a).direction_degrees().unwrap_or(0.0),
        _ => 0.0,
    };

    let label_anchor = points
        .windows(2)
        .map(|pair| (pair[0], pair[1]))
        .fold(None, |best: Option<(Point, Point)>, (a, b)| match best {
            Some((ba, bb)) if ba.distance(bb) >= a.distance(b) => best,
            _ => Some((a, b)),
        })
        .map_or(first, |(a, b)| a.midpoint(b));

    EdgePath {
        geometry: PathGeometry::Polyline { points },
        start_angle,
        end_angle,
        label_anchor,
    }
}

fn cubic_point(p0: Point, p1: Point, p2: Point, p3: Point, t: f32) -> Point {
    let u = 1.0 - t;
    p0.scale(u * u * u)
        .add_point(p1.scale(3.0 * u * u * t))
        .add_point(p2.scale(3.0 * u * t * t))
        .add_point(p3.scale(t * t * t))
}


#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::*;

    // ===================
    // Strategies
    // ===================

    fn group_strategy() -> impl Strategy<Value = (usize, f32)> {
        (1usize..12, 1.0f32..60.0)
    }

    // ===================
    // Property Test Functions
    // ===================

    /// Offsets within a group sum to zero and grow with the slot index.
    fn check_offsets_symmetric_and_increasing(count: usize, gap: f32) -> Result<(), TestCaseError> {
        let offsets: Vec<f32> = (0..count)
            .map(|index| ParallelSlot::new(index, count).offset(gap))
            .collect();

        for pair in offsets.windows(2) {
            prop_assert!(pair[1] > pair[0]);
        }
        for (i, offset) in offsets.iter().enumerate() {
            let mirror = offsets[count - 1 - i];
            prop_assert!((offset + mirror).abs() <= 1e-3 * gap * count as f32);
        }
        Ok(())
    }

    // ===================
    // Proptest Wrappers
    // ===================

    proptest! {
        #[test]
        fn offsets_symmetric_and_increasing((count, gap) in group_strategy()) {
            check_offsets_symmetric_and_increasing(count, gap)?;
        }
    }
}
