//! Export of laid-out diagrams.
//!
//! Exporters never compute geometry. They draw exactly the node boxes, edge
//! paths and label boxes they are handed in a [`Scene`].
//!
//! # Available Backends
//!
//! - [`svg`] — SVG preview output via [`svg::Svg`]
//!
//! # Error Handling
//!
//! Export operations return [`Error`], which converts into
//! [`WaylineError::Export`](crate::WaylineError::Export) at the crate
//! boundary.

/// SVG export backend.
pub mod svg;

use serde::Serialize;
use thiserror::Error;

use wayline_core::diagram::{Edge, Node};

use crate::routing::RoutedEdge;

/// Everything an exporter draws, borrowed from its owner.
///
/// Serializes as `{"nodes": [...], "edges": [...], "routes": [...]}`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Scene<'a> {
    nodes: &'a [Node],
    edges: &'a [Edge],
    routes: &'a [RoutedEdge],
}

impl<'a> Scene<'a> {
    pub fn new(nodes: &'a [Node], edges: &'a [Edge], routes: &'a [RoutedEdge]) -> Self {
        Self {
            nodes,
            edges,
            routes,
        }
    }

    pub fn nodes(&self) -> &'a [Node] {
        self.nodes
    }

    /// Edge records, used for label text.
    pub fn edges(&self) -> &'a [Edge] {
        self.edges
    }

    pub fn routes(&self) -> &'a [RoutedEdge] {
        self.routes
    }
}

/// Abstraction for diagram export backends.
pub trait Exporter {
    /// Exports a scene to the backend's output.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Render`] if the scene cannot be drawn, or
    /// [`Error::Io`] if writing the output fails.
    fn export_scene(&mut self, scene: &Scene<'_>) -> Result<(), Error>;
}

/// Errors that can occur during diagram export.
#[derive(Debug, Error)]
pub enum Error {
    /// A rendering failure described by `message`.
    #[error("Render error: {0}")]
    Render(String),

    /// An I/O error encountered while writing output.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
