//! SVG preview rendering.

use std::{collections::HashMap, fs::File, io::Write, path::PathBuf};

use log::{debug, error, info};
use svg::{Document, node::element as svg_element};

use wayline_core::{
    diagram::{Node, NodeKind, NodeShape},
    geometry::{Bounds, Point, Size},
    identifier::Id,
};

use super::{Error, Exporter, Scene};
use crate::{routing::PathGeometry, shape};

const FONT_FAMILY: &str = "Inter, Helvetica, Arial, sans-serif";
const INK: &str = "#1e293b";
const EDGE_INK: &str = "#475569";
const LABEL_BORDER: &str = "#cbd5e1";
const ANCHOR_RADIUS: f32 = 4.0;
const DEFAULT_MARGIN: f32 = 50.0;

/// SVG exporter writing to a file.
#[derive(Debug, Clone)]
pub struct Svg {
    file_name: PathBuf,
}

impl Svg {
    pub fn new(file_name: impl Into<PathBuf>) -> Self {
        Self {
            file_name: file_name.into(),
        }
    }

    /// Writes an SVG document to the configured file.
    pub fn write_document(&self, doc: &Document) -> Result<(), Error> {
        info!(file_name:? = self.file_name; "Creating SVG file");
        let file = match File::create(&self.file_name) {
            Ok(file) => file,
            Err(err) => {
                error!(file_name:? = self.file_name, err:err; "Failed to create SVG file");
                return Err(Error::Io(err));
            }
        };

        if let Err(err) = write!(&file, "{doc}") {
            error!(file_name:? = self.file_name, err:err; "Failed to write SVG content");
            return Err(Error::Io(err));
        }

        Ok(())
    }
}

impl Exporter for Svg {
    fn export_scene(&mut self, scene: &Scene<'_>) -> Result<(), Error> {
        let doc = render(scene, DEFAULT_MARGIN)?;
        debug!("SVG document rendered");
        self.write_document(&doc)
    }
}

/// Renders `scene` to an SVG string with the default margin.
pub fn render_to_string(scene: &Scene<'_>) -> Result<String, Error> {
    render(scene, DEFAULT_MARGIN).map(|doc| doc.to_string())
}

/// Renders `scene` to an SVG document sized to its content plus `margin`.
///
/// Edges are drawn first, then nodes in ascending z-order.
pub fn render(scene: &Scene<'_>, margin: f32) -> Result<Document, Error> {
    check_finite(scene)?;

    let content = content_bounds(scene);
    let content_size = content.to_size();
    let svg_size = Size::new(
        content_size.width() + margin * 2.0,
        content_size.height() + margin * 2.0,
    );

    let mut main_group = svg_element::Group::new().set(
        "transform",
        format!(
            "translate({}, {})",
            margin - content.min_x(),
            margin - content.min_y()
        ),
    );

    let labels: HashMap<Id, &str> = scene
        .edges()
        .iter()
        .map(|edge| (edge.id(), edge.label()))
        .collect();

    for route in scene.routes() {
        main_group = main_group.add(
            svg_element::Path::new()
                .set("d", path_data(route.path().geometry()))
                .set("fill", "none")
                .set("stroke", EDGE_INK)
                .set("stroke-width", 2)
                .set("marker-end", "url(#arrow-end)"),
        );

        if let (Some(bounds), Some(text)) = (route.label(), labels.get(&route.id())) {
            main_group = main_group.add(render_label(bounds, text));
        }
    }

    let mut nodes: Vec<&Node> = scene.nodes().iter().collect();
    nodes.sort_by_key(|node| node.z_order());
    for node in nodes {
        main_group = main_group.add(render_node(node));
    }

    debug!(
        width = svg_size.width(),
        height = svg_size.height(),
        nodes = scene.nodes().len(),
        edges = scene.routes().len();
        "SVG dimensions computed"
    );

    Ok(Document::new()
        .set(
            "viewBox",
            format!("0 0 {} {}", svg_size.width(), svg_size.height()),
        )
        .set("width", svg_size.width())
        .set("height", svg_size.height())
        .add(marker_definitions())
        .add(main_group))
}

fn check_finite(scene: &Scene<'_>) -> Result<(), Error> {
    let finite = |point: Point| point.x().is_finite() && point.y().is_finite();
    for node in scene.nodes() {
        let bounds = shape::node_bounds(node);
        if !finite(bounds.min_point()) || !finite(bounds.max_point()) {
            return Err(Error::Render(format!(
                "node {} has a non-finite box",
                node.id()
            )));
        }
    }
    Ok(())
}

fn content_bounds(scene: &Scene<'_>) -> Bounds {
    let nodes = scene.nodes().iter().map(shape::node_bounds);
    let labels = scene.routes().iter().filter_map(|route| route.label());
    nodes
        .chain(labels)
        .reduce(|acc, bounds| acc.merge(&bounds))
        .unwrap_or_default()
}

fn marker_definitions() -> svg_element::Definitions {
    svg_element::Definitions::new().add(
        svg_element::Marker::new()
            .set("id", "arrow-end")
            .set("viewBox", "0 0 10 10")
            .set("refX", 9)
            .set("refY", 5)
            .set("markerWidth", 6)
            .set("markerHeight", 6)
            .set("orient", "auto")
            .add(
                svg_element::Path::new()
                    .set("d", "M 0 0 L 10 5 L 0 10 z")
                    .set("fill", EDGE_INK),
            ),
    )
}

fn path_data(geometry: &PathGeometry) -> String {
    match geometry {
        PathGeometry::Polyline { points } => points
            .iter()
            .enumerate()
            .map(|(i, point)| {
                let command = if i == 0 { "M" } else { "L" };
                format!("{command} {} {}", point.x(), point.y())
            })
            .collect::<Vec<_>>()
            .join(" "),
        PathGeometry::Cubic { start, c1, c2, end } => format!(
            "M {} {} C {} {}, {} {}, {} {}",
            start.x(),
            start.y(),
            c1.x(),
            c1.y(),
            c2.x(),
            c2.y(),
            end.x(),
            end.y()
        ),
    }
}

fn render_label(bounds: Bounds, text: &str) -> svg_element::Group {
    let center = bounds.center();
    svg_element::Group::new()
        .add(
            svg_element::Rectangle::new()
                .set("x", bounds.min_x())
                .set("y", bounds.min_y())
                .set("width", bounds.width())
                .set("height", bounds.height())
                .set("rx", bounds.height() / 2.0)
                .set("fill", "white")
                .set("stroke", LABEL_BORDER),
        )
        .add(text_element(center, text, 12.0))
}

fn text_element(position: Point, content: &str, font_size: f32) -> svg_element::Text {
    svg_element::Text::new(content)
        .set("x", position.x())
        .set("y", position.y())
        .set("text-anchor", "middle")
        .set("dominant-baseline", "middle")
        .set("font-family", FONT_FAMILY)
        .set("font-size", font_size)
}

fn render_node(node: &Node) -> svg_element::Group {
    let bounds = shape::node_bounds(node);
    let center = bounds.center();
    let mut group = svg_element::Group::new().set("data-id", node.id().to_text());

    match (node.kind(), node.shape()) {
        (NodeKind::Anchor, _) => {
            return group.add(
                svg_element::Circle::new()
                    .set("cx", center.x())
                    .set("cy", center.y())
                    .set("r", ANCHOR_RADIUS)
                    .set("fill", EDGE_INK),
            );
        }
        (NodeKind::Text, _) => {}
        (NodeKind::Control, _) | (_, NodeShape::Rectangle) => {
            let radius = if node.kind() == NodeKind::Control {
                bounds.height() / 2.0
            } else {
                8.0
            };
            group = group.add(
                svg_element::Rectangle::new()
                    .set("x", bounds.min_x())
                    .set("y", bounds.min_y())
                    .set("width", bounds.width())
                    .set("height", bounds.height())
                    .set("rx", radius)
                    .set("fill", "white")
                    .set("stroke", INK)
                    .set("stroke-width", 1.5),
            );
        }
        (_, NodeShape::Circle) => {
            group = group.add(
                svg_element::Ellipse::new()
                    .set("cx", center.x())
                    .set("cy", center.y())
                    .set("rx", bounds.width() / 2.0)
                    .set("ry", bounds.height() / 2.0)
                    .set("fill", "white")
                    .set("stroke", INK)
                    .set("stroke-width", 1.5),
            );
        }
        (_, NodeShape::Diamond) => {
            let points = format!(
                "{},{} {},{} {},{} {},{}",
                center.x(),
                bounds.min_y(),
                bounds.max_x(),
                center.y(),
                center.x(),
                bounds.max_y(),
                bounds.min_x(),
                center.y()
            );
            group = group.add(
                svg_element::Polygon::new()
                    .set("points", points)
                    .set("fill", "white")
                    .set("stroke", INK)
                    .set("stroke-width", 1.5),
            );
        }
    }

    if !node.label().is_empty() {
        group = group.add(text_element(center, node.label(), 14.0));
    }
    group
}

#[cfg(test)]
mod tests {
    use wayline_core::diagram::Edge;

    use super::*;
    use crate::layout::LayoutEngine;

    fn sample() -> (Vec<Node>, Vec<Edge>) {
        let nodes = vec![
            Node::new(Id::new("a"), NodeKind::Entity, Point::default()).with_label("Buyer"),
            Node::new(Id::new("b"), NodeKind::Entity, Point::default())
                .with_shape(NodeShape::Diamond),
        ];
        let edges = vec![Edge::new(Id::new("ab"), Id::new("a"), Id::new("b")).with_label("Pays")];
        (nodes, edges)
    }

    #[test]
    fn test_render_contains_nodes_edges_and_labels() {
        let (nodes, edges) = sample();
        let layout = LayoutEngine::default().layout(&nodes, &edges);

        let svg = render_to_string(&layout.scene()).unwrap();

        assert!(svg.contains("<svg"));
        assert!(svg.contains("Buyer"));
        assert!(svg.contains("Pays"));
        assert!(svg.contains("<polygon"));
        assert!(svg.contains("marker-end=\"url(#arrow-end)\""));
        assert!(svg.contains(" C "));
    }

    #[test]
    fn test_render_empty_scene() {
        let svg = render(&Scene::new(&[], &[], &[]), 10.0).unwrap().to_string();
        assert!(svg.contains("viewBox=\"0 0 20 20\""));
    }

    #[test]
    fn test_non_finite_node_is_rejected() {
        let nodes = vec![Node::new(Id::new("nan"), NodeKind::Entity, Point::new(f32::NAN, 0.0))];
        let result = render(&Scene::new(&nodes, &[], &[]), 10.0);
        assert!(matches!(result, Err(Error::Render(_))));
    }

    #[test]
    fn test_polyline_path_data() {
        let geometry = PathGeometry::Polyline {
            points: vec![Point::new(0.0, 0.0), Point::new(10.0, 5.0)],
        };
        assert_eq!(path_data(&geometry), "M 0 0 L 10 5");
    }

    #[test]
    fn test_exporter_writes_file() {
        let (nodes, edges) = sample();
        let layout = LayoutEngine::default().layout(&nodes, &edges);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preview.svg");

        let mut exporter = Svg::new(&path);
        exporter.export_scene(&layout.scene()).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("<svg"));
    }
}
