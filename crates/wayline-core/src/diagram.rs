//! Plain data records exchanged with the geometry engine.
//!
//! These are the node, edge, and viewport records a session hands to the
//! engine for one turn. The engine reads them and returns new positions and
//! paths; it never keeps them.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{geometry::Point, identifier::Id};

/// Height of one horizontal swimlane band in world units.
pub const LANE_HEIGHT: f32 = 300.0;

/// Smallest allowed zoom factor.
pub const MIN_ZOOM: f32 = 0.1;

/// Largest allowed zoom factor.
pub const MAX_ZOOM: f32 = 5.0;

/// Z-order floor used when bringing a node to the front.
pub const BASE_Z_ORDER: i32 = 10;

/// Returns the 1-based lane index for a node whose top edge is at `y`.
///
/// Negative positions belong to the first lane.
///
/// ```
/// # use wayline_core::diagram::lane_index;
/// assert_eq!(lane_index(-40.0), 1);
/// assert_eq!(lane_index(299.0), 1);
/// assert_eq!(lane_index(300.0), 2);
/// ```
pub fn lane_index(y: f32) -> u32 {
    // The float-to-int cast saturates, so non-finite input cannot panic.
    (y.max(0.0) / LANE_HEIGHT).floor() as u32 + 1
}

/// What a node stands for, as far as geometry is concerned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// A regular participant box.
    #[default]
    Entity,
    /// A compact control chip. Always drawn as a small rectangle with
    /// directional ports.
    Control,
    /// Free text annotation.
    Text,
    /// A connector handle. Auxiliary: excluded from content bounds.
    Anchor,
}

impl NodeKind {
    /// Auxiliary nodes do not count as diagram content.
    pub fn is_auxiliary(self) -> bool {
        matches!(self, Self::Anchor)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeShape {
    #[default]
    Rectangle,
    Circle,
    Diamond,
}

/// Error returned when an integer does not name one of the four ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("port index {0} is out of range, expected 0..=3")]
pub struct InvalidPortIndex(pub u8);

/// One of the four connection points on a node's boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum PortIndex {
    Top = 0,
    Right = 1,
    Bottom = 2,
    Left = 3,
}

impl PortIndex {
    /// All ports, in index order.
    pub const ALL: [PortIndex; 4] = [Self::Top, Self::Right, Self::Bottom, Self::Left];

    pub fn index(self) -> u8 {
        self as u8
    }

    /// Whether the port faces left or right.
    pub fn is_horizontal(self) -> bool {
        matches!(self, Self::Right | Self::Left)
    }

    /// Unit vector pointing away from the node through this port.
    pub fn outward_normal(self) -> Point {
        match self {
            Self::Top => Point::new(0.0, -1.0),
            Self::Right => Point::new(1.0, 0.0),
            Self::Bottom => Point::new(0.0, 1.0),
            Self::Left => Point::new(-1.0, 0.0),
        }
    }
}

impl TryFrom<u8> for PortIndex {
    type Error = InvalidPortIndex;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Top),
            1 => Ok(Self::Right),
            2 => Ok(Self::Bottom),
            3 => Ok(Self::Left),
            other => Err(InvalidPortIndex(other)),
        }
    }
}

impl From<PortIndex> for u8 {
    fn from(port: PortIndex) -> Self {
        port.index()
    }
}

impl fmt::Display for PortIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}

/// Which ends of a connection a port may serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortRole {
    SourceOnly,
    TargetOnly,
    Both,
}

impl PortRole {
    pub fn can_start(self) -> bool {
        matches!(self, Self::SourceOnly | Self::Both)
    }

    pub fn can_end(self) -> bool {
        matches!(self, Self::TargetOnly | Self::Both)
    }
}

/// Routing style of an edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topology {
    Straight,
    #[default]
    Bezier,
    Orthogonal,
}

/// A diagram node.
///
/// `position` is the top-left corner of the node's box. `lane` is derived from
/// the position and kept in sync by [`Node::set_position`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    id: Id,
    #[serde(default)]
    kind: NodeKind,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    label: String,
    #[serde(default)]
    shape: NodeShape,
    position: Point,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    width: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    height: Option<f32>,
    #[serde(default = "default_z_order")]
    z_order: i32,
    #[serde(default = "default_lane")]
    lane: u32,
    #[serde(default, skip_serializing_if = "is_false")]
    locked: bool,
}

fn default_z_order() -> i32 {
    BASE_Z_ORDER
}

fn default_lane() -> u32 {
    1
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl Node {
    pub fn new(id: Id, kind: NodeKind, position: Point) -> Self {
        Self {
            id,
            kind,
            label: String::new(),
            shape: NodeShape::default(),
            position,
            width: None,
            height: None,
            z_order: BASE_Z_ORDER,
            lane: lane_index(position.y()),
            locked: false,
        }
    }

    pub fn with_shape(mut self, shape: NodeShape) -> Self {
        self.shape = shape;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Sets an explicit size, overriding the kind/shape default.
    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn with_z_order(mut self, z_order: i32) -> Self {
        self.z_order = z_order;
        self
    }

    pub fn with_locked(mut self, locked: bool) -> Self {
        self.locked = locked;
        self
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn set_id(&mut self, id: Id) {
        self.id = id;
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn shape(&self) -> NodeShape {
        self.shape
    }

    pub fn set_shape(&mut self, shape: NodeShape) {
        self.shape = shape;
    }

    pub fn position(&self) -> Point {
        self.position
    }

    /// Moves the node and recomputes its lane.
    pub fn set_position(&mut self, position: Point) {
        self.position = position;
        self.lane = lane_index(position.y());
    }

    /// Explicit width, if one was set.
    pub fn width(&self) -> Option<f32> {
        self.width
    }

    /// Explicit height, if one was set.
    pub fn height(&self) -> Option<f32> {
        self.height
    }

    pub fn set_size(&mut self, width: Option<f32>, height: Option<f32>) {
        self.width = width;
        self.height = height;
    }

    pub fn z_order(&self) -> i32 {
        self.z_order
    }

    pub fn set_z_order(&mut self, z_order: i32) {
        self.z_order = z_order;
    }

    pub fn lane(&self) -> u32 {
        self.lane
    }

    /// Re-derives the lane from the current position.
    ///
    /// Needed after deserializing a record whose stored lane may be stale.
    pub fn refresh_lane(&mut self) {
        self.lane = lane_index(self.position.y());
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }
}

/// A directed connection between two node ports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    id: Id,
    source: Id,
    target: Id,
    source_port: PortIndex,
    target_port: PortIndex,
    #[serde(default)]
    topology: Topology,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    label: String,
}

impl Edge {
    pub fn new(id: Id, source: Id, target: Id) -> Self {
        Self {
            id,
            source,
            target,
            source_port: PortIndex::Right,
            target_port: PortIndex::Left,
            topology: Topology::default(),
            label: String::new(),
        }
    }

    pub fn with_ports(mut self, source_port: PortIndex, target_port: PortIndex) -> Self {
        self.source_port = source_port;
        self.target_port = target_port;
        self
    }

    pub fn with_topology(mut self, topology: Topology) -> Self {
        self.topology = topology;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn source(&self) -> Id {
        self.source
    }

    pub fn target(&self) -> Id {
        self.target
    }

    pub fn source_port(&self) -> PortIndex {
        self.source_port
    }

    pub fn target_port(&self) -> PortIndex {
        self.target_port
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

/// Camera over the world: screen = world * zoom + pan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawViewport")]
pub struct Viewport {
    pan: Point,
    zoom: f32,
}

/// Unchecked wire form of [`Viewport`]; zoom is clamped on conversion.
#[derive(Deserialize)]
struct RawViewport {
    #[serde(default)]
    pan: Point,
    #[serde(default = "default_zoom")]
    zoom: f32,
}

fn default_zoom() -> f32 {
    1.0
}

impl From<RawViewport> for Viewport {
    fn from(raw: RawViewport) -> Self {
        Self::new(raw.pan, raw.zoom)
    }
}

impl Viewport {
    /// Creates a viewport, clamping `zoom` into `[MIN_ZOOM, MAX_ZOOM]`.
    pub fn new(pan: Point, zoom: f32) -> Self {
        Self {
            pan,
            zoom: clamp_zoom(zoom),
        }
    }

    pub fn pan(&self) -> Point {
        self.pan
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn with_pan(self, pan: Point) -> Self {
        Self { pan, ..self }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            pan: Point::default(),
            zoom: 1.0,
        }
    }
}

/// Clamps a zoom factor into the supported range. NaN maps to 1.
pub fn clamp_zoom(zoom: f32) -> f32 {
    if zoom.is_nan() {
        return 1.0;
    }
    zoom.clamp(MIN_ZOOM, MAX_ZOOM)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lane_index_bands() {
        assert_eq!(lane_index(0.0), 1);
        assert_eq!(lane_index(-1000.0), 1);
        assert_eq!(lane_index(599.9), 2);
        assert_eq!(lane_index(600.0), 3);
    }

    #[test]
    fn test_set_position_recomputes_lane() {
        let mut node = Node::new(Id::new("a"), NodeKind::Entity, Point::new(0.0, 10.0));
        assert_eq!(node.lane(), 1);

        node.set_position(Point::new(0.0, 650.0));
        assert_eq!(node.lane(), 3);
    }

    #[test]
    fn test_port_index_try_from() {
        assert_eq!(PortIndex::try_from(2), Ok(PortIndex::Bottom));
        assert_eq!(PortIndex::try_from(4), Err(InvalidPortIndex(4)));
    }

    #[test]
    fn test_port_role_capabilities() {
        assert!(PortRole::SourceOnly.can_start());
        assert!(!PortRole::SourceOnly.can_end());
        assert!(PortRole::TargetOnly.can_end());
        assert!(!PortRole::TargetOnly.can_start());
        assert!(PortRole::Both.can_start() && PortRole::Both.can_end());
    }

    #[test]
    fn test_viewport_zoom_clamped() {
        assert_eq!(Viewport::new(Point::default(), 0.0).zoom(), MIN_ZOOM);
        assert_eq!(Viewport::new(Point::default(), 12.0).zoom(), MAX_ZOOM);
        assert_eq!(Viewport::new(Point::default(), f32::NAN).zoom(), 1.0);
    }

    #[test]
    fn test_viewport_deserialize_clamps_zoom() {
        let low: Viewport =
            serde_json::from_str(r#"{"pan": {"x": 10.0, "y": -5.0}, "zoom": 0.0}"#).unwrap();
        assert_eq!(low.zoom(), MIN_ZOOM);
        assert_eq!(low.pan(), Point::new(10.0, -5.0));

        let high: Viewport = serde_json::from_str(r#"{"zoom": 40.0}"#).unwrap();
        assert_eq!(high.zoom(), MAX_ZOOM);
        assert_eq!(high.pan(), Point::default());

        let plain: Viewport = serde_json::from_str("{}").unwrap();
        assert_eq!(plain, Viewport::default());
    }

    #[test]
    fn test_edge_json_shape() {
        let edge = Edge::new(Id::new("e1"), Id::new("a"), Id::new("b"))
            .with_topology(Topology::Orthogonal);
        let json = serde_json::to_value(&edge).unwrap();

        assert_eq!(json["source"], "a");
        assert_eq!(json["source_port"], 1);
        assert_eq!(json["target_port"], 3);
        assert_eq!(json["topology"], "orthogonal");
    }

    #[test]
    fn test_node_deserialize_defaults() {
        let node: Node =
            serde_json::from_str(r#"{"id": "n", "position": {"x": 5.0, "y": 320.0}}"#).unwrap();

        assert_eq!(node.kind(), NodeKind::Entity);
        assert_eq!(node.shape(), NodeShape::Rectangle);
        assert_eq!(node.z_order(), BASE_Z_ORDER);
        assert_eq!(node.width(), None);
        assert!(!node.is_locked());
    }

    #[test]
    fn test_port_index_rejects_out_of_range_json() {
        let result: Result<PortIndex, _> = serde_json::from_str("7");
        assert!(result.is_err());
    }
}
