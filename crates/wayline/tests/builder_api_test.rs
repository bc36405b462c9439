//! Integration tests for the DiagramBuilder API
//!
//! These tests drive the public facade the way the CLI does.

use wayline::{
    DiagramBuilder, WaylineError,
    config::AppConfig,
    identifier::Id,
};

const PAYOUT: &str = r#"{
    "nodes": [
        {"id": "buyer", "label": "Buyer", "position": {"x": 0, "y": 0}},
        {"id": "wallet", "label": "Platform Wallet", "position": {"x": 0, "y": 0}},
        {"id": "splitter", "label": "Splitter", "position": {"x": 0, "y": 0}},
        {"id": "seller", "label": "Seller", "position": {"x": 0, "y": 0}},
        {"id": "revenue", "label": "Revenue", "position": {"x": 0, "y": 0}}
    ],
    "edges": [
        {"id": "e1", "source": "buyer", "target": "wallet", "label": "Payment"},
        {"id": "e2", "source": "wallet", "target": "splitter", "label": "To splitter"},
        {"id": "e3", "source": "splitter", "target": "seller", "label": "Seller share"},
        {"id": "e4", "source": "splitter", "target": "revenue", "label": "Platform fee"}
    ]
}"#;

#[test]
fn test_parse_sanitizes_input() {
    let source = r#"{
        "nodes": [
            {"id": "a", "position": {"x": 0, "y": 0}},
            {"id": "b"}
        ],
        "edges": [{"id": "e", "source": "a", "target": "b"}]
    }"#;

    let snapshot = DiagramBuilder::default().parse(source).unwrap();
    assert_eq!(snapshot.nodes().len(), 1);
    assert!(snapshot.edges().is_empty());
}

#[test]
fn test_parse_invalid_json_returns_error() {
    let result = DiagramBuilder::default().parse("{ not json");
    assert!(matches!(result, Err(WaylineError::Parse { .. })));
}

#[test]
fn test_parse_wrong_shape_returns_error() {
    let result = DiagramBuilder::default().parse(r#"{"nodes": []}"#);
    assert!(matches!(result, Err(WaylineError::Parse { .. })));
}

#[test]
fn test_layout_and_render() {
    let builder = DiagramBuilder::new(AppConfig::default());
    let snapshot = builder.parse(PAYOUT).unwrap();
    let layout = builder.layout(&snapshot);

    assert_eq!(layout.nodes().len(), 5);
    assert_eq!(layout.routes().len(), 4);
    assert!(layout.routes().iter().all(|route| route.label().is_some()));

    let svg = builder.render_svg(&layout).unwrap();
    assert!(svg.contains("<svg"), "Output should contain SVG tag");
    assert!(svg.contains("</svg>"), "Output should be complete SVG");
    assert!(svg.contains("Platform fee"));
}

#[test]
fn test_export_svg_writes_file() {
    let builder = DiagramBuilder::default();
    let layout = builder.layout(&builder.parse(PAYOUT).unwrap());
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("payout.svg");

    builder.export_svg(&layout, &path).unwrap();

    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.contains("<svg"));
    assert!(written.contains("Platform fee"));
}

#[test]
fn test_export_svg_to_missing_directory_fails() {
    let builder = DiagramBuilder::default();
    let layout = builder.layout(&builder.parse(PAYOUT).unwrap());
    let dir = tempfile::tempdir().unwrap();

    let result = builder.export_svg(&layout, dir.path().join("missing").join("payout.svg"));
    assert!(matches!(result, Err(WaylineError::Export(_))));
}

#[test]
fn test_layout_json_round_trips_as_snapshot() {
    let builder = DiagramBuilder::default();
    let layout = builder.layout(&builder.parse(PAYOUT).unwrap());

    let json = builder.to_json(&layout).unwrap();
    let reparsed = builder.parse(&json).unwrap();

    assert_eq!(reparsed.nodes(), layout.nodes());
    assert_eq!(reparsed.edges(), layout.edges());
}

#[test]
fn test_route_keeps_positions() {
    let builder = DiagramBuilder::default();
    let snapshot = builder.parse(PAYOUT).unwrap();

    let routes = builder.route(&snapshot);
    assert_eq!(routes.len(), 4);
    assert_eq!(routes[0].id(), Id::new("e1"));
}

#[test]
fn test_fit_after_layout() {
    let builder = DiagramBuilder::default();
    let layout = builder.layout(&builder.parse(PAYOUT).unwrap());

    let viewport = builder
        .viewport_controller()
        .fit_to_content(layout.nodes(), wayline::geometry::Size::new(1400.0, 700.0))
        .unwrap();
    assert!(viewport.zoom() > 0.0);
}
