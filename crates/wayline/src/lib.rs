//! Wayline - geometry and layout engine for flow diagram editors
//!
//! This library computes everything spatial about a diagram of nodes and
//! edges: collision-free placement, port selection, edge paths, label
//! positions, batch layout and camera fitting. It owns no state; every call
//! works on a snapshot handed in by the caller and returns new positions and
//! paths for the caller to commit.

pub mod config;
pub mod coords;
pub mod export;
pub mod graph;
pub mod interaction;
pub mod label;
pub mod layout;
pub mod placement;
pub mod ports;
pub mod routing;
pub mod sanitize;
pub mod shape;
pub mod text;
pub mod viewport;

mod error;

pub use wayline_core::{diagram, geometry, identifier};

pub use error::WaylineError;
pub use sanitize::Snapshot;

use std::path::PathBuf;

use log::{debug, info, trace};
use serde::de::Error as _;

use config::AppConfig;
use export::Exporter;
use graph::DiagramIndex;
use label::LabelPlacer;
use layout::{DiagramLayout, LayoutEngine};
use placement::PlacementResolver;
use routing::{PathBuilder, RoutedEdge};
use viewport::ViewportController;

/// Entry point tying sanitizing, layout, routing and export together.
///
/// # Examples
///
/// ```rust
/// use wayline::{DiagramBuilder, config::AppConfig};
///
/// let source = r#"{
///     "nodes": [
///         {"id": "buyer", "position": {"x": 0, "y": 0}},
///         {"id": "seller", "position": {"x": 0, "y": 0}}
///     ],
///     "edges": [{"id": "pay", "source": "buyer", "target": "seller"}]
/// }"#;
///
/// let builder = DiagramBuilder::new(AppConfig::default());
/// let snapshot = builder.parse(source).expect("Failed to parse");
/// let layout = builder.layout(&snapshot);
/// assert_eq!(layout.routes().len(), 1);
///
/// let svg = builder.render_svg(&layout).expect("Failed to render");
/// assert!(svg.contains("<svg"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct DiagramBuilder {
    config: AppConfig,
}

impl DiagramBuilder {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Parses and sanitizes a JSON snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`WaylineError::Parse`] if `source` is not JSON, or is not an
    /// object with `nodes` and `edges` arrays. Individual broken records are
    /// repaired or dropped, never reported.
    pub fn parse(&self, source: &str) -> Result<Snapshot, WaylineError> {
        info!(bytes = source.len(); "Parsing snapshot");
        let value: serde_json::Value = serde_json::from_str(source)
            .map_err(|err| WaylineError::new_parse_error(err, source))?;

        let snapshot = sanitize::sanitize_snapshot(&value).ok_or_else(|| {
            WaylineError::new_parse_error(
                serde_json::Error::custom("expected an object with `nodes` and `edges` arrays"),
                source,
            )
        })?;
        debug!(
            nodes = snapshot.nodes().len(),
            edges = snapshot.edges().len();
            "Snapshot parsed"
        );
        Ok(snapshot)
    }

    /// Runs the batch layout over `snapshot`.
    pub fn layout(&self, snapshot: &Snapshot) -> DiagramLayout {
        let layout = LayoutEngine::new(&self.config).layout(snapshot.nodes(), snapshot.edges());
        info!(
            nodes = layout.nodes().len(),
            routes = layout.routes().len(),
            scale = layout.scale();
            "Layout calculated"
        );
        layout
    }

    /// Routes and labels the edges of `snapshot` at the nodes' current
    /// positions, as the interactive editor does after every change.
    pub fn route(&self, snapshot: &Snapshot) -> Vec<RoutedEdge> {
        let index = DiagramIndex::new(snapshot.nodes(), snapshot.edges());
        let mut routes = PathBuilder::new(self.config.routing().clone()).route_edges(&index);

        let node_boxes: Vec<_> = snapshot.nodes().iter().map(shape::node_bounds).collect();
        LabelPlacer::new(self.config.labels().clone()).label_routes(
            snapshot.edges(),
            &mut routes,
            &node_boxes,
        );
        trace!(routes:?; "Edges routed");
        routes
    }

    /// Renders a laid-out diagram to an SVG string.
    ///
    /// # Errors
    ///
    /// Returns [`WaylineError::Export`] if the layout holds non-finite
    /// geometry.
    pub fn render_svg(&self, layout: &DiagramLayout) -> Result<String, WaylineError> {
        info!("Rendering SVG preview");
        let svg = export::svg::render_to_string(&layout.scene())?;
        debug!(bytes = svg.len(); "SVG rendered");
        Ok(svg)
    }

    /// Writes an SVG rendering of a laid-out diagram to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`WaylineError::Export`] if the layout holds non-finite
    /// geometry or the file cannot be written.
    pub fn export_svg(
        &self,
        layout: &DiagramLayout,
        path: impl Into<PathBuf>,
    ) -> Result<(), WaylineError> {
        let mut exporter = export::svg::Svg::new(path);
        exporter.export_scene(&layout.scene())?;
        info!("SVG exported successfully");
        Ok(())
    }

    /// Serializes a laid-out diagram as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`WaylineError::Export`] if serialization fails.
    pub fn to_json(&self, layout: &DiagramLayout) -> Result<String, WaylineError> {
        serde_json::to_string_pretty(&layout.scene())
            .map_err(|err| WaylineError::Export(Box::new(err)))
    }

    /// A placement resolver using this builder's configuration.
    pub fn placement_resolver(&self) -> PlacementResolver {
        PlacementResolver::new(self.config.placement().clone())
    }

    /// A viewport controller using this builder's configuration.
    pub fn viewport_controller(&self) -> ViewportController {
        ViewportController::new(self.config.viewport().clone())
    }
}
