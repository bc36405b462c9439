//! Port selection for connect gestures.
//!
//! A connection is made in two steps. The first step arms a
//! [`PendingConnection`] on a source-capable port. The second either completes
//! it on a target-capable port of another node or cancels it. The resolvers
//! here only decide what should happen; committing the edge is left to the
//! caller.

use log::trace;

use wayline_core::{
    diagram::{Node, PortIndex},
    geometry::Point,
    identifier::Id,
};

use crate::{graph::DiagramIndex, shape};

/// Returns the port in `candidates` whose anchor is closest to `point`.
///
/// Ties go to the earlier candidate. Returns `None` only for an empty
/// candidate list.
pub fn closest_port(node: &Node, point: Point, candidates: &[PortIndex]) -> Option<PortIndex> {
    candidates
        .iter()
        .copied()
        .map(|port| (port, shape::port_anchor(node, port).distance(point)))
        .fold(None, |best: Option<(PortIndex, f32)>, (port, distance)| match best {
            Some((_, best_distance)) if best_distance <= distance => best,
            _ => Some((port, distance)),
        })
        .map(|(port, _)| port)
}

/// The armed end of a connection that has not been completed yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingConnection {
    node: Id,
    port: PortIndex,
}

impl PendingConnection {
    pub fn new(node: Id, port: PortIndex) -> Self {
        Self { node, port }
    }

    pub fn node(&self) -> Id {
        self.node
    }

    pub fn port(&self) -> PortIndex {
        self.port
    }
}

/// An edge the caller should create.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectRequest {
    pub source: Id,
    pub source_port: PortIndex,
    pub target: Id,
    pub target_port: PortIndex,
}

/// What a connect gesture step resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connect {
    /// Keep (or start) waiting with this pending end.
    Pending(PendingConnection),
    /// Create this edge and clear the pending end.
    Complete(ConnectRequest),
    /// Clear the pending end without creating anything.
    Cancel,
}

/// What was under the pointer when a port drag was released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropTarget {
    Port { node: Id, port: PortIndex },
    Node(Id),
    Nothing,
}

fn complete(pending: PendingConnection, target: Id, target_port: PortIndex) -> Connect {
    Connect::Complete(ConnectRequest {
        source: pending.node,
        source_port: pending.port,
        target,
        target_port,
    })
}

/// Picks the target-capable port of `target` closest to the pending source port.
fn closest_target_port(
    index: &DiagramIndex<'_>,
    pending: PendingConnection,
    target: &Node,
) -> Option<PortIndex> {
    let source = index.node(pending.node)?;
    let anchor = shape::port_anchor(source, pending.port);
    closest_port(target, anchor, &shape::target_ports(target))
}

/// Outcome of a click that should have no effect: the pending end, if any,
/// stays armed.
fn ignore_click(pending: Option<PendingConnection>) -> Connect {
    pending.map_or(Connect::Cancel, Connect::Pending)
}

/// Resolves a click on a node body.
///
/// Without a pending connection the click arms the source-capable port
/// closest to `click`. Clicking the pending node again cancels. Clicking
/// another node completes on its target-capable port closest to the pending
/// port's anchor. Clicks on a locked node are ignored.
pub fn resolve_node_click(
    index: &DiagramIndex<'_>,
    pending: Option<PendingConnection>,
    node_id: Id,
    click: Point,
) -> Connect {
    let Some(node) = index.node(node_id) else {
        return Connect::Cancel;
    };
    if node.is_locked() {
        return ignore_click(pending);
    }

    let Some(pending) = pending else {
        return closest_port(node, click, &shape::source_ports(node))
            .map_or(Connect::Cancel, |port| {
                Connect::Pending(PendingConnection::new(node_id, port))
            });
    };

    if pending.node == node_id {
        return Connect::Cancel;
    }

    match closest_target_port(index, pending, node) {
        Some(port) => complete(pending, node_id, port),
        None => Connect::Cancel,
    }
}

/// Resolves a click on a specific port.
///
/// The port's role decides the outcome. On the pending node itself a
/// source-capable port re-arms and anything else cancels. On another node a
/// target-capable port completes and a source-only port re-arms there.
/// Clicks on a locked node are ignored, but a locked pending node cancels.
pub fn resolve_port_click(
    index: &DiagramIndex<'_>,
    pending: Option<PendingConnection>,
    node_id: Id,
    port: PortIndex,
) -> Connect {
    let Some(node) = index.node(node_id) else {
        return Connect::Cancel;
    };
    if node.is_locked() {
        return ignore_click(pending);
    }

    let role = shape::port_role(node, port);
    let rearm = Connect::Pending(PendingConnection::new(node_id, port));

    let Some(pending) = pending else {
        return if role.can_start() { rearm } else { Connect::Cancel };
    };

    if index.node(pending.node).is_none_or(Node::is_locked) {
        return Connect::Cancel;
    }

    if pending.node == node_id {
        return if role.can_start() { rearm } else { Connect::Cancel };
    }

    if role.can_end() {
        return complete(pending, node_id, port);
    }
    if role.can_start() {
        return rearm;
    }
    Connect::Cancel
}

/// Resolves the release of a port drag.
///
/// A target-capable port of another unlocked node completes on that port.
/// Otherwise a body hit on another unlocked node completes on its closest
/// target-capable port. Anything else cancels.
pub fn resolve_drop(index: &DiagramIndex<'_>, pending: PendingConnection, target: DropTarget) -> Connect {
    let unlocked_other = |id: Id| {
        index
            .node(id)
            .filter(|node| id != pending.node && !node.is_locked())
    };

    let body = match target {
        DropTarget::Port { node, port } => {
            if let Some(target_node) = unlocked_other(node) {
                if shape::port_role(target_node, port).can_end() {
                    trace!(node:% = node, port:% = port; "Drop on target port");
                    return complete(pending, node, port);
                }
            }
            node
        }
        DropTarget::Node(node) => node,
        DropTarget::Nothing => return Connect::Cancel,
    };

    let Some(target_node) = unlocked_other(body) else {
        return Connect::Cancel;
    };
    match closest_target_port(index, pending, target_node) {
        Some(port) => complete(pending, body, port),
        None => Connect::Cancel,
    }
}

#[cfg(test)]
mod tests {
    use wayline_core::diagram::{Edge, NodeKind};

    use super::*;

    fn entity(id: &str, x: f32, y: f32) -> Node {
        Node::new(Id::new(id), NodeKind::Entity, Point::new(x, y))
    }

    fn control(id: &str, x: f32, y: f32) -> Node {
        Node::new(Id::new(id), NodeKind::Control, Point::new(x, y))
    }

    const NO_EDGES: &[Edge] = &[];

    #[test]
    fn test_closest_port() {
        let node = entity("n", 0.0, 0.0);
        assert_eq!(
            closest_port(&node, Point::new(500.0, 30.0), &PortIndex::ALL),
            Some(PortIndex::Right)
        );
        assert_eq!(
            closest_port(&node, Point::new(90.0, -50.0), &PortIndex::ALL),
            Some(PortIndex::Top)
        );
        // Restricted candidate set wins over raw distance.
        assert_eq!(
            closest_port(&node, Point::new(500.0, 30.0), &[PortIndex::Top, PortIndex::Left]),
            Some(PortIndex::Top)
        );
        assert_eq!(closest_port(&node, Point::default(), &[]), None);
    }

    #[test]
    fn test_node_click_arms_then_completes() {
        let nodes = vec![entity("a", 0.0, 0.0), entity("b", 400.0, 0.0)];
        let index = DiagramIndex::new(&nodes, NO_EDGES);

        let armed = resolve_node_click(&index, None, Id::new("a"), Point::new(170.0, 30.0));
        let Connect::Pending(pending) = armed else {
            panic!("expected pending, got {armed:?}");
        };
        assert_eq!(pending.port(), PortIndex::Right);

        let done = resolve_node_click(&index, Some(pending), Id::new("b"), Point::new(500.0, 50.0));
        assert_eq!(
            done,
            Connect::Complete(ConnectRequest {
                source: Id::new("a"),
                source_port: PortIndex::Right,
                target: Id::new("b"),
                target_port: PortIndex::Left,
            })
        );
    }

    #[test]
    fn test_node_click_same_node_cancels() {
        let nodes = vec![entity("a", 0.0, 0.0)];
        let index = DiagramIndex::new(&nodes, NO_EDGES);
        let pending = PendingConnection::new(Id::new("a"), PortIndex::Right);

        assert_eq!(
            resolve_node_click(&index, Some(pending), Id::new("a"), Point::default()),
            Connect::Cancel
        );
    }

    #[test]
    fn test_node_click_respects_control_roles() {
        // Click right next to the chip's left side: the left port is
        // target-only, so the source port must be chosen elsewhere.
        let nodes = vec![control("gate", 0.0, 0.0)];
        let index = DiagramIndex::new(&nodes, NO_EDGES);

        let armed = resolve_node_click(&index, None, Id::new("gate"), Point::new(-10.0, 18.0));
        let Connect::Pending(pending) = armed else {
            panic!("expected pending, got {armed:?}");
        };
        assert_ne!(pending.port(), PortIndex::Left);
    }

    #[test]
    fn test_port_click_roles() {
        let nodes = vec![entity("a", 0.0, 0.0), control("gate", 400.0, 0.0)];
        let index = DiagramIndex::new(&nodes, NO_EDGES);
        let pending = PendingConnection::new(Id::new("a"), PortIndex::Right);

        // Target-capable port on another node completes.
        let done = resolve_port_click(&index, Some(pending), Id::new("gate"), PortIndex::Left);
        assert!(matches!(done, Connect::Complete(_)));

        // Source-only port on another node re-arms there.
        let rearmed = resolve_port_click(&index, Some(pending), Id::new("gate"), PortIndex::Right);
        assert_eq!(
            rearmed,
            Connect::Pending(PendingConnection::new(Id::new("gate"), PortIndex::Right))
        );

        // Target-only port cannot start a connection.
        assert_eq!(
            resolve_port_click(&index, None, Id::new("gate"), PortIndex::Left),
            Connect::Cancel
        );
    }

    #[test]
    fn test_port_click_on_pending_node() {
        let nodes = vec![control("gate", 0.0, 0.0)];
        let index = DiagramIndex::new(&nodes, NO_EDGES);
        let pending = PendingConnection::new(Id::new("gate"), PortIndex::Right);

        assert_eq!(
            resolve_port_click(&index, Some(pending), Id::new("gate"), PortIndex::Top),
            Connect::Pending(PendingConnection::new(Id::new("gate"), PortIndex::Top))
        );
        assert_eq!(
            resolve_port_click(&index, Some(pending), Id::new("gate"), PortIndex::Left),
            Connect::Cancel
        );
    }

    #[test]
    fn test_click_on_locked_node_keeps_pending() {
        let nodes = vec![
            entity("a", 0.0, 0.0),
            entity("locked", 400.0, 0.0).with_locked(true),
        ];
        let index = DiagramIndex::new(&nodes, NO_EDGES);
        let pending = PendingConnection::new(Id::new("a"), PortIndex::Right);

        assert_eq!(
            resolve_node_click(&index, Some(pending), Id::new("locked"), Point::new(450.0, 30.0)),
            Connect::Pending(pending)
        );
        assert_eq!(
            resolve_port_click(&index, Some(pending), Id::new("locked"), PortIndex::Left),
            Connect::Pending(pending)
        );

        // Nothing to keep without a pending end.
        assert_eq!(
            resolve_node_click(&index, None, Id::new("locked"), Point::new(450.0, 30.0)),
            Connect::Cancel
        );
        assert_eq!(
            resolve_port_click(&index, None, Id::new("locked"), PortIndex::Right),
            Connect::Cancel
        );
    }

    #[test]
    fn test_drop_resolution() {
        let nodes = vec![
            entity("a", 0.0, 0.0),
            entity("b", 400.0, 0.0),
            entity("locked", 0.0, 400.0).with_locked(true),
        ];
        let index = DiagramIndex::new(&nodes, NO_EDGES);
        let pending = PendingConnection::new(Id::new("a"), PortIndex::Right);

        let on_port = resolve_drop(
            &index,
            pending,
            DropTarget::Port {
                node: Id::new("b"),
                port: PortIndex::Top,
            },
        );
        assert!(matches!(
            on_port,
            Connect::Complete(ConnectRequest { target_port: PortIndex::Top, .. })
        ));

        let on_body = resolve_drop(&index, pending, DropTarget::Node(Id::new("b")));
        assert!(matches!(
            on_body,
            Connect::Complete(ConnectRequest { target_port: PortIndex::Left, .. })
        ));

        assert_eq!(resolve_drop(&index, pending, DropTarget::Nothing), Connect::Cancel);
        assert_eq!(
            resolve_drop(&index, pending, DropTarget::Node(Id::new("a"))),
            Connect::Cancel
        );
        assert_eq!(
            resolve_drop(&index, pending, DropTarget::Node(Id::new("locked"))),
            Connect::Cancel
        );
    }
}

#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;
    use wayline_core::diagram::{NodeKind, NodeShape};

    use super::*;

    // ===================
    // Strategies
    // ===================

    fn node_strategy() -> impl Strategy<Value = Node> {
        (
            -500.0f32..500.0,
            -500.0f32..500.0,
            prop_oneof![
                Just(NodeShape::Rectangle),
                Just(NodeShape::Circle),
                Just(NodeShape::Diamond)
            ],
        )
            .prop_map(|(x, y, shape)| {
                Node::new(Id::new("probe"), NodeKind::Entity, Point::new(x, y)).with_shape(shape)
            })
    }

    fn candidates_strategy() -> impl Strategy<Value = Vec<PortIndex>> {
        prop::sample::subsequence(PortIndex::ALL.to_vec(), 1..=4)
    }

    fn point_strategy() -> impl Strategy<Value = Point> {
        (-2000.0f32..2000.0, -2000.0f32..2000.0).prop_map(|(x, y)| Point::new(x, y))
    }

    // ===================
    // Property Test Functions
    // ===================

    fn check_closest_port_is_candidate(
        node: Node,
        point: Point,
        candidates: Vec<PortIndex>,
    ) -> Result<(), TestCaseError> {
        let port = closest_port(&node, point, &candidates);
        prop_assert!(port.is_some_and(|port| candidates.contains(&port)));
        Ok(())
    }

    // ===================
    // Proptest Wrappers
    // ===================

    proptest! {
        #[test]
        fn closest_port_is_candidate(
            node in node_strategy(),
            point in point_strategy(),
            candidates in candidates_strategy(),
        ) {
            check_closest_port_is_candidate(node, point, candidates)?;
        }
    }
}
