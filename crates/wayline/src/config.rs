//! Configuration types for the Wayline geometry and layout engine.
//!
//! Every tunable distance, count, and factor the engine uses lives here. All
//! types implement [`serde::Deserialize`], and every field falls back to its
//! default when missing, so a configuration file only needs to name the
//! values it changes.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining all sections.
//! - [`LayoutConfig`] - Batch layout preset, pass count and target frame.
//! - [`PlacementConfig`] - Collision-avoidance search and placement offsets.
//! - [`RoutingConfig`] - Edge path construction.
//! - [`LabelConfig`] - Edge label sizing and collision padding.
//! - [`ViewportConfig`] - Zoom limits, fitting and autoscroll.
//!
//! # Example
//!
//! ```
//! # use wayline::config::{AppConfig, LayoutPreset};
//! let config = AppConfig::default();
//! assert_eq!(config.layout().preset(), LayoutPreset::Pipeline);
//! assert_eq!(config.placement().max_attempts(), 80);
//! ```

use std::str::FromStr;

use serde::Deserialize;

use wayline_core::{
    diagram::{MAX_ZOOM, MIN_ZOOM},
    geometry::{Bounds, Point, Size},
};

use crate::WaylineError;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    layout: LayoutConfig,

    #[serde(default)]
    placement: PlacementConfig,

    #[serde(default)]
    routing: RoutingConfig,

    #[serde(default)]
    labels: LabelConfig,

    #[serde(default)]
    viewport: ViewportConfig,
}

impl AppConfig {
    pub fn new(
        layout: LayoutConfig,
        placement: PlacementConfig,
        routing: RoutingConfig,
        labels: LabelConfig,
        viewport: ViewportConfig,
    ) -> Self {
        Self {
            layout,
            placement,
            routing,
            labels,
            viewport,
        }
    }

    /// Returns the batch layout configuration.
    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    /// Returns the placement configuration.
    pub fn placement(&self) -> &PlacementConfig {
        &self.placement
    }

    /// Returns the routing configuration.
    pub fn routing(&self) -> &RoutingConfig {
        &self.routing
    }

    /// Returns the label configuration.
    pub fn labels(&self) -> &LabelConfig {
        &self.labels
    }

    /// Returns the viewport configuration.
    pub fn viewport(&self) -> &ViewportConfig {
        &self.viewport
    }

    /// Replaces the batch layout preset, keeping every other setting.
    pub fn with_preset(mut self, preset: LayoutPreset) -> Self {
        self.layout.preset = preset;
        self
    }
}

/// Named parameter sets for the batch layout.
///
/// A preset trades density for readability: `pipeline` keeps long chains
/// tight, `branch` fans out wide fan-outs, `compact` packs everything closer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutPreset {
    #[default]
    Pipeline,
    Branch,
    Compact,
}

impl FromStr for LayoutPreset {
    type Err = WaylineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pipeline" => Ok(Self::Pipeline),
            "branch" => Ok(Self::Branch),
            "compact" => Ok(Self::Compact),
            other => Err(WaylineError::Config(format!(
                "unknown layout preset `{other}`, expected pipeline, branch or compact"
            ))),
        }
    }
}

/// Batch layout settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    preset: LayoutPreset,

    /// Number of forward/backward balancing passes.
    passes: usize,

    /// Frame the finished layout is scaled into.
    frame: FrameConfig,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            preset: LayoutPreset::default(),
            passes: 5,
            frame: FrameConfig::default(),
        }
    }
}

impl LayoutConfig {
    pub fn new(preset: LayoutPreset, passes: usize, frame: FrameConfig) -> Self {
        Self {
            preset,
            passes,
            frame,
        }
    }

    pub fn preset(&self) -> LayoutPreset {
        self.preset
    }

    pub fn passes(&self) -> usize {
        self.passes
    }

    pub fn frame(&self) -> &FrameConfig {
        &self.frame
    }
}

/// Target rectangle of the batch layout, in world units.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    x: f32,
    y: f32,
    width: f32,
    height: f32,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            x: 90.0,
            y: 120.0,
            width: 1180.0,
            height: 330.0,
        }
    }
}

impl FrameConfig {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn to_bounds(self) -> Bounds {
        Bounds::new_from_top_left(Point::new(self.x, self.y), Size::new(self.width, self.height))
    }
}

/// Collision-avoidance search and interactive placement offsets.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    padding: f32,
    gap: f32,
    max_attempts: usize,
    row_step: f32,
    wrap_period: usize,
    grid_size: f32,
    paste_stagger: f32,
    duplicate_offset: f32,
    connected_offset: f32,
    spawn_jitter: f32,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            padding: 16.0,
            gap: 20.0,
            max_attempts: 80,
            row_step: 28.0,
            wrap_period: 4,
            grid_size: 20.0,
            paste_stagger: 32.0,
            duplicate_offset: 20.0,
            connected_offset: 250.0,
            spawn_jitter: 20.0,
        }
    }
}

impl PlacementConfig {
    /// Padding applied to the overlap test.
    pub fn padding(&self) -> f32 {
        self.padding
    }

    /// Horizontal gap left after a colliding node.
    pub fn gap(&self) -> f32 {
        self.gap
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Vertical advance when the search wraps back to the original x.
    pub fn row_step(&self) -> f32 {
        self.row_step
    }

    /// Every `wrap_period`-th attempt wraps to a new row.
    pub fn wrap_period(&self) -> usize {
        self.wrap_period.max(1)
    }

    pub fn grid_size(&self) -> f32 {
        self.grid_size
    }

    pub fn paste_stagger(&self) -> f32 {
        self.paste_stagger
    }

    pub fn duplicate_offset(&self) -> f32 {
        self.duplicate_offset
    }

    /// Horizontal distance of a node created from another node's port.
    pub fn connected_offset(&self) -> f32 {
        self.connected_offset
    }

    /// Half-width of the random offset applied to newly spawned nodes.
    pub fn spawn_jitter(&self) -> f32 {
        self.spawn_jitter
    }

    pub fn with_padding(mut self, padding: f32) -> Self {
        self.padding = padding;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }
}

/// Edge path construction.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Spacing between edges of one parallel group.
    parallel_gap: f32,

    /// Minimum run out of a port before an orthogonal path may turn.
    orthogonal_exit: f32,

    /// Bezier handle length as a fraction of the travel along the dominant axis.
    bezier_handle_ratio: f32,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            parallel_gap: 24.0,
            orthogonal_exit: 24.0,
            bezier_handle_ratio: 0.5,
        }
    }
}

impl RoutingConfig {
    pub fn parallel_gap(&self) -> f32 {
        self.parallel_gap
    }

    pub fn orthogonal_exit(&self) -> f32 {
        self.orthogonal_exit
    }

    pub fn bezier_handle_ratio(&self) -> f32 {
        self.bezier_handle_ratio
    }
}

/// Edge label sizing and collision padding.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LabelConfig {
    font_size: f32,
    height: f32,
    horizontal_padding: f32,
    node_padding: f32,
    label_padding: f32,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            font_size: 12.0,
            height: 18.0,
            horizontal_padding: 12.0,
            node_padding: 4.0,
            label_padding: 2.0,
        }
    }
}

impl LabelConfig {
    pub fn font_size(&self) -> f32 {
        self.font_size
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    /// Extra width added around the estimated text width.
    pub fn horizontal_padding(&self) -> f32 {
        self.horizontal_padding
    }

    /// Clearance kept between a label and any node box.
    pub fn node_padding(&self) -> f32 {
        self.node_padding
    }

    /// Clearance kept between two labels.
    pub fn label_padding(&self) -> f32 {
        self.label_padding
    }
}

/// Camera behaviour.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    min_zoom: f32,
    max_zoom: f32,
    fit_padding: f32,
    min_frame: f32,
    frame_margin: f32,
    wheel_zoom_in: f32,
    wheel_zoom_out: f32,
    autoscroll_threshold: f32,
    autoscroll_max_speed: f32,
    culling_margin: f32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
            fit_padding: 120.0,
            min_frame: 120.0,
            frame_margin: 24.0,
            wheel_zoom_in: 1.08,
            wheel_zoom_out: 0.92,
            autoscroll_threshold: 40.0,
            autoscroll_max_speed: 16.0,
            culling_margin: 220.0,
        }
    }
}

impl ViewportConfig {
    /// Lower zoom bound, never below [`MIN_ZOOM`].
    pub fn min_zoom(&self) -> f32 {
        self.min_zoom.clamp(MIN_ZOOM, MAX_ZOOM)
    }

    /// Upper zoom bound, never above [`MAX_ZOOM`] nor below the lower bound.
    pub fn max_zoom(&self) -> f32 {
        self.max_zoom.clamp(self.min_zoom(), MAX_ZOOM)
    }

    /// Padding added around content when fitting.
    pub fn fit_padding(&self) -> f32 {
        self.fit_padding
    }

    /// Smallest frame extent used when fitting.
    pub fn min_frame(&self) -> f32 {
        self.min_frame
    }

    /// Amount subtracted from the frame before fitting.
    pub fn frame_margin(&self) -> f32 {
        self.frame_margin
    }

    pub fn wheel_zoom_in(&self) -> f32 {
        self.wheel_zoom_in
    }

    pub fn wheel_zoom_out(&self) -> f32 {
        self.wheel_zoom_out
    }

    pub fn autoscroll_threshold(&self) -> f32 {
        self.autoscroll_threshold
    }

    pub fn autoscroll_max_speed(&self) -> f32 {
        self.autoscroll_max_speed
    }

    pub fn culling_margin(&self) -> f32 {
        self.culling_margin
    }
}
