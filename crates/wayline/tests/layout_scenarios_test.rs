//! End-to-end geometry scenarios across the engine's components.

use float_cmp::assert_approx_eq;

use wayline::{
    coords,
    diagram::{Edge, Node, NodeKind, Viewport},
    geometry::Point,
    graph::DiagramIndex,
    identifier::Id,
    layout::{Columns, LayoutEngine, assign_ranks},
    placement::PlacementResolver,
    routing::{ParallelSlot, PathBuilder},
};

fn entity(id: &str, x: f32, y: f32) -> Node {
    Node::new(Id::new(id), NodeKind::Entity, Point::new(x, y))
}

fn edge(id: &str, source: &str, target: &str) -> Edge {
    Edge::new(Id::new(id), Id::new(source), Id::new(target))
}

#[test]
fn test_overlapping_node_moves_right_of_first() {
    let first = entity("first", 100.0, 100.0);
    let second = entity("second", 100.0, 100.0);

    let resolved = PlacementResolver::default().resolve(&second, std::slice::from_ref(&first));

    assert_eq!(resolved, Point::new(100.0 + 180.0 + 20.0, 100.0));
}

#[test]
fn test_zoom_about_pointer_keeps_world_point() {
    let viewport = Viewport::new(Point::new(0.0, 0.0), 1.0);
    let pointer = Point::new(100.0, 50.0);
    assert_eq!(coords::to_world(pointer, &viewport), Point::new(100.0, 50.0));

    let zoomed = coords::zoom_about(&viewport, 2.0, pointer);

    assert_eq!(zoomed.pan(), Point::new(-100.0, -50.0));
    let world = coords::to_world(pointer, &zoomed);
    assert_approx_eq!(f32, world.x(), 100.0);
    assert_approx_eq!(f32, world.y(), 50.0);
}

#[test]
fn test_chain_gets_increasing_ranks_and_x() {
    let nodes = vec![entity("a", 0.0, 0.0), entity("b", 0.0, 0.0), entity("c", 0.0, 0.0)];
    let edges = vec![edge("ab", "a", "b"), edge("bc", "b", "c")];

    let layout = LayoutEngine::default().layout(&nodes, &edges);

    let ranks: Vec<_> = ["a", "b", "c"]
        .iter()
        .map(|id| layout.rank(Id::new(id)).unwrap())
        .collect();
    assert_eq!(ranks, vec![0, 1, 2]);

    let xs: Vec<f32> = layout.nodes().iter().map(|node| node.position().x()).collect();
    assert!(xs[0] < xs[1] && xs[1] < xs[2]);
}

#[test]
fn test_branch_targets_fan_out_around_source() {
    let nodes = vec![
        entity("hub", 0.0, 0.0),
        entity("t1", 0.0, 0.0),
        entity("t2", 0.0, 0.0),
        entity("t3", 0.0, 0.0),
    ];
    let edges = vec![
        edge("e1", "hub", "t1"),
        edge("e2", "hub", "t2"),
        edge("e3", "hub", "t3"),
    ];
    let index = DiagramIndex::new(&nodes, &edges);
    let ranks = assign_ranks(&index);
    let mut columns = Columns::new(&index, &ranks);
    for node in &nodes {
        columns.set_center_y(node.id(), 0.0);
    }

    columns.spread_branches(150.0, 0.35);

    let ys: Vec<f32> = ["t1", "t2", "t3"]
        .iter()
        .map(|id| columns.center_y(Id::new(id)).unwrap())
        .collect();
    assert!(ys[0] < ys[1] && ys[1] < ys[2]);
    assert_approx_eq!(f32, ys[0], -ys[2], epsilon = 1e-4);
    assert_approx_eq!(f32, ys[1], 0.0, epsilon = 1e-4);
}

#[test]
fn test_dangling_edge_gets_no_path() {
    let nodes = vec![entity("b", 0.0, 0.0)];
    let dangling = edge("e", "ghost", "b");
    let index = DiagramIndex::new(&nodes, std::slice::from_ref(&dangling));

    let builder = PathBuilder::default();
    assert!(builder.route_edge(&index, &dangling, ParallelSlot::SINGLE).is_none());
    assert!(builder.route_edges(&index).is_empty());
}
