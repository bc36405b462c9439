//! Per-node geometry: sizes, boxes, port anchors and port roles.

use wayline_core::{
    diagram::{Node, NodeKind, NodeShape, PortIndex, PortRole},
    geometry::{Bounds, Point, Size},
};

/// Default size of a generic rectangular node.
pub const DEFAULT_NODE_SIZE: Size = Size::new(180.0, 60.0);

/// Default size of a compact control chip.
pub const CONTROL_CHIP_SIZE: Size = Size::new(132.0, 36.0);

const CIRCLE_SIZE: Size = Size::new(80.0, 80.0);
const DIAMOND_SIZE: Size = Size::new(100.0, 100.0);

fn default_size(node: &Node) -> Size {
    if node.kind() == NodeKind::Control {
        return CONTROL_CHIP_SIZE;
    }
    match node.shape() {
        NodeShape::Circle => CIRCLE_SIZE,
        NodeShape::Diamond => DIAMOND_SIZE,
        NodeShape::Rectangle => DEFAULT_NODE_SIZE,
    }
}

fn usable(value: Option<f32>) -> Option<f32> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

/// Returns the node's explicit size where set, otherwise its default.
///
/// Each dimension falls back independently, and a non-positive or non-finite
/// explicit value counts as unset, so the result is always strictly positive.
pub fn effective_size(node: &Node) -> Size {
    let default = default_size(node);
    Size::new(
        usable(node.width()).unwrap_or(default.width()),
        usable(node.height()).unwrap_or(default.height()),
    )
}

/// Returns the node's box in world coordinates.
pub fn node_bounds(node: &Node) -> Bounds {
    Bounds::new_from_top_left(node.position(), effective_size(node))
}

/// Whether the node's ports sit on the box corners.
///
/// Diamonds place ports on corners, except control chips which always use
/// edge midpoints whatever their nominal shape.
fn uses_corner_ports(node: &Node) -> bool {
    node.shape() == NodeShape::Diamond && node.kind() != NodeKind::Control
}

/// Returns the anchor point of `port` on `node`.
///
/// Standard ports sit at the middle of the box edges: top, right, bottom,
/// left. Corner ports go clockwise from the top-right corner.
pub fn port_anchor(node: &Node, port: PortIndex) -> Point {
    let bounds = node_bounds(node);
    let center = bounds.center();

    if uses_corner_ports(node) {
        return match port {
            PortIndex::Top => Point::new(bounds.max_x(), bounds.min_y()),
            PortIndex::Right => bounds.max_point(),
            PortIndex::Bottom => Point::new(bounds.min_x(), bounds.max_y()),
            PortIndex::Left => bounds.min_point(),
        };
    }

    match port {
        PortIndex::Top => center.with_y(bounds.min_y()),
        PortIndex::Right => center.with_x(bounds.max_x()),
        PortIndex::Bottom => center.with_y(bounds.max_y()),
        PortIndex::Left => center.with_x(bounds.min_x()),
    }
}

/// Returns which connection ends `port` may serve on `node`.
///
/// Control chips are directional: flow enters on the left and leaves on the
/// right. Every other port serves both ends.
pub fn port_role(node: &Node, port: PortIndex) -> PortRole {
    match (node.kind(), port) {
        (NodeKind::Control, PortIndex::Left) => PortRole::TargetOnly,
        (NodeKind::Control, PortIndex::Right) => PortRole::SourceOnly,
        _ => PortRole::Both,
    }
}

/// Ports of `node` that may begin a connection.
pub fn source_ports(node: &Node) -> Vec<PortIndex> {
    PortIndex::ALL
        .into_iter()
        .filter(|port| port_role(node, *port).can_start())
        .collect()
}

/// Ports of `node` that may complete a connection.
pub fn target_ports(node: &Node) -> Vec<PortIndex> {
    PortIndex::ALL
        .into_iter()
        .filter(|port| port_role(node, *port).can_end())
        .collect()
}

#[cfg(test)]
mod tests {
    use wayline_core::identifier::Id;

    use super::*;

    fn node(kind: NodeKind, shape: NodeShape) -> Node {
        Node::new(Id::new("shape-test"), kind, Point::new(0.0, 0.0)).with_shape(shape)
    }

    #[test]
    fn test_default_sizes() {
        assert_eq!(
            effective_size(&node(NodeKind::Entity, NodeShape::Rectangle)),
            Size::new(180.0, 60.0)
        );
        assert_eq!(
            effective_size(&node(NodeKind::Entity, NodeShape::Circle)),
            Size::new(80.0, 80.0)
        );
        assert_eq!(
            effective_size(&node(NodeKind::Entity, NodeShape::Diamond)),
            Size::new(100.0, 100.0)
        );
        assert_eq!(
            effective_size(&node(NodeKind::Control, NodeShape::Diamond)),
            Size::new(132.0, 36.0)
        );
    }

    #[test]
    fn test_explicit_size_overrides_default() {
        let n = node(NodeKind::Entity, NodeShape::Rectangle).with_size(240.0, 90.0);
        assert_eq!(effective_size(&n), Size::new(240.0, 90.0));
    }

    #[test]
    fn test_invalid_explicit_size_falls_back() {
        let n = node(NodeKind::Entity, NodeShape::Rectangle).with_size(0.0, f32::NAN);
        assert_eq!(effective_size(&n), Size::new(180.0, 60.0));

        let n = node(NodeKind::Entity, NodeShape::Circle).with_size(-5.0, 30.0);
        assert_eq!(effective_size(&n), Size::new(80.0, 30.0));
    }

    #[test]
    fn test_rectangle_ports_on_edge_midpoints() {
        let n = node(NodeKind::Entity, NodeShape::Rectangle);
        assert_eq!(port_anchor(&n, PortIndex::Top), Point::new(90.0, 0.0));
        assert_eq!(port_anchor(&n, PortIndex::Right), Point::new(180.0, 30.0));
        assert_eq!(port_anchor(&n, PortIndex::Bottom), Point::new(90.0, 60.0));
        assert_eq!(port_anchor(&n, PortIndex::Left), Point::new(0.0, 30.0));
    }

    #[test]
    fn test_diamond_ports_on_corners() {
        let n = node(NodeKind::Entity, NodeShape::Diamond);
        assert_eq!(port_anchor(&n, PortIndex::Top), Point::new(100.0, 0.0));
        assert_eq!(port_anchor(&n, PortIndex::Right), Point::new(100.0, 100.0));
        assert_eq!(port_anchor(&n, PortIndex::Bottom), Point::new(0.0, 100.0));
        assert_eq!(port_anchor(&n, PortIndex::Left), Point::new(0.0, 0.0));
    }

    #[test]
    fn test_control_chip_ignores_diamond_shape() {
        let n = node(NodeKind::Control, NodeShape::Diamond);
        assert_eq!(port_anchor(&n, PortIndex::Right), Point::new(132.0, 18.0));
    }

    #[test]
    fn test_control_chip_roles() {
        let n = node(NodeKind::Control, NodeShape::Rectangle);
        assert!(!source_ports(&n).contains(&PortIndex::Left));
        assert!(source_ports(&n).contains(&PortIndex::Right));
        assert!(target_ports(&n).contains(&PortIndex::Left));
        assert!(!target_ports(&n).contains(&PortIndex::Right));
    }

    #[test]
    fn test_entity_ports_serve_both_ends() {
        let n = node(NodeKind::Entity, NodeShape::Rectangle);
        assert_eq!(source_ports(&n), PortIndex::ALL.to_vec());
        assert_eq!(target_ports(&n), PortIndex::ALL.to_vec());
    }
}
