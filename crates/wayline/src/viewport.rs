//! Camera operations: fitting, centring, wheel zoom, autoscroll and culling.
//!
//! Every operation takes the current [`Viewport`] by reference and returns a
//! new one; the caller decides whether to commit it. Frame sizes and pointer
//! positions are in screen pixels relative to the canvas' top-left corner.

use log::{debug, trace};

use wayline_core::{
    diagram::{Node, Viewport},
    geometry::{Bounds, Point, Size},
    identifier::Id,
};

use crate::{config::ViewportConfig, coords, shape};

/// Box around every non-auxiliary node, or `None` if there are none.
pub fn content_bounds(nodes: &[Node]) -> Option<Bounds> {
    nodes
        .iter()
        .filter(|node| !node.kind().is_auxiliary())
        .map(shape::node_bounds)
        .reduce(|acc, bounds| acc.merge(&bounds))
}

/// Viewport operations driven by [`ViewportConfig`].
#[derive(Debug, Clone, Default)]
pub struct ViewportController {
    config: ViewportConfig,
}

impl ViewportController {
    pub fn new(config: ViewportConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ViewportConfig {
        &self.config
    }

    fn clamp_zoom(&self, zoom: f32) -> f32 {
        if zoom.is_finite() {
            zoom.clamp(self.config.min_zoom(), self.config.max_zoom())
        } else {
            self.config.min_zoom()
        }
    }

    /// Zooms so the content, plus padding, fits the frame, and centres it.
    ///
    /// The zoom is computed against the frame shrunk by the configured
    /// margin (but never below the minimum frame), then clamped. Returns
    /// `None` when there is no content to fit.
    pub fn fit_to_content(&self, nodes: &[Node], frame: Size) -> Option<Viewport> {
        let content = content_bounds(nodes)?;
        let padding = self.config.fit_padding();
        let available = Size::new(
            (frame.width() - self.config.frame_margin()).max(self.config.min_frame()),
            (frame.height() - self.config.frame_margin()).max(self.config.min_frame()),
        );
        let padded = Size::new(
            (content.width() + padding * 2.0).max(1.0),
            (content.height() + padding * 2.0).max(1.0),
        );

        let zoom = self.clamp_zoom(
            (available.width() / padded.width()).min(available.height() / padded.height()),
        );
        let viewport = centered(content.center(), frame, zoom);
        debug!(zoom, pan:? = viewport.pan(); "Fitted viewport to content");
        Some(viewport)
    }

    /// Centres the content in the frame, keeping the current zoom.
    pub fn center_on_content(
        &self,
        nodes: &[Node],
        frame: Size,
        current: &Viewport,
    ) -> Option<Viewport> {
        let content = content_bounds(nodes)?;
        Some(centered(content.center(), frame, current.zoom()))
    }

    /// Zooms in or out one wheel step, keeping the world point under
    /// `pointer` fixed. A positive `delta_y` zooms out.
    pub fn wheel_zoom(&self, viewport: &Viewport, delta_y: f32, pointer: Point) -> Viewport {
        let factor = if delta_y > 0.0 {
            self.config.wheel_zoom_out()
        } else {
            self.config.wheel_zoom_in()
        };
        let zoom = self.clamp_zoom(viewport.zoom() * factor);
        trace!(from = viewport.zoom(), to = zoom; "Wheel zoom");
        coords::zoom_about(viewport, zoom, pointer)
    }

    /// Pans by a wheel or trackpad scroll delta.
    pub fn wheel_pan(&self, viewport: &Viewport, delta: Point) -> Viewport {
        viewport.with_pan(viewport.pan().sub_point(delta))
    }

    /// Pans the viewport when the pointer is near the frame border during a
    /// drag.
    ///
    /// Within the threshold distance of a border the content moves away from
    /// that border, at a speed proportional to how deep the pointer is in the
    /// band. Returns `None` when the pointer is clear of every border.
    pub fn autoscroll(&self, viewport: &Viewport, pointer: Point, frame: Size) -> Option<Viewport> {
        let threshold = self.config.autoscroll_threshold();
        if threshold <= 0.0 {
            return None;
        }
        let speed = self.config.autoscroll_max_speed();
        let axis = |position: f32, extent: f32| -> f32 {
            if position < threshold {
                speed * (threshold - position) / threshold
            } else if position > extent - threshold {
                -speed * (position - (extent - threshold)) / threshold
            } else {
                0.0
            }
        };

        let step = Point::new(
            axis(pointer.x(), frame.width()),
            axis(pointer.y(), frame.height()),
        );
        if step.is_zero() {
            return None;
        }
        trace!(dx = step.x(), dy = step.y(); "Autoscroll");
        Some(viewport.with_pan(viewport.pan().add_point(step)))
    }

    /// The visible world rectangle, inflated by the culling margin.
    pub fn visible_bounds(&self, viewport: &Viewport, frame: Size) -> Bounds {
        let top_left = coords::to_world(Point::default(), viewport);
        let bottom_right = coords::to_world(
            Point::new(frame.width().max(1.0), frame.height().max(1.0)),
            viewport,
        );
        Bounds::from_corners(top_left, bottom_right).inflate(self.config.culling_margin())
    }

    /// Ids of the nodes worth drawing, in snapshot order.
    ///
    /// A node is visible when its box touches the inflated visible
    /// rectangle. Ids in `pinned`, such as the selection or the node a
    /// pending connection starts from, are always visible.
    pub fn visible_nodes(
        &self,
        nodes: &[Node],
        viewport: &Viewport,
        frame: Size,
        pinned: &[Id],
    ) -> Vec<Id> {
        let area = self.visible_bounds(viewport, frame);
        let visible: Vec<Id> = nodes
            .iter()
            .filter(|node| {
                pinned.contains(&node.id())
                    || shape::node_bounds(node).intersects_inclusive(&area)
            })
            .map(Node::id)
            .collect();
        trace!(total = nodes.len(), visible = visible.len(); "Culled nodes");
        visible
    }
}

/// Viewport at `zoom` that puts world point `center` in the middle of `frame`.
fn centered(center: Point, frame: Size, zoom: f32) -> Viewport {
    let viewport = Viewport::new(Point::default(), zoom);
    let middle = Point::new(frame.width() / 2.0, frame.height() / 2.0);
    viewport.with_pan(middle.sub_point(center.scale(viewport.zoom())))
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;
    use wayline_core::diagram::{MAX_ZOOM, NodeKind};

    use super::*;

    const FRAME: Size = Size::new(1000.0, 600.0);

    fn entity(id: &str, x: f32, y: f32) -> Node {
        Node::new(Id::new(id), NodeKind::Entity, Point::new(x, y))
    }

    #[test]
    fn test_fit_single_node() {
        let controller = ViewportController::default();
        let nodes = vec![entity("a", 0.0, 0.0)];

        let viewport = controller.fit_to_content(&nodes, FRAME).unwrap();

        // Padded box is 420x300, available frame 976x576.
        assert_approx_eq!(f32, viewport.zoom(), 1.92, epsilon = 1e-4);
        assert_approx_eq!(f32, viewport.pan().x(), 500.0 - 90.0 * 1.92, epsilon = 1e-3);
        assert_approx_eq!(f32, viewport.pan().y(), 300.0 - 30.0 * 1.92, epsilon = 1e-3);
    }

    #[test]
    fn test_fit_ignores_auxiliary_nodes() {
        let controller = ViewportController::default();
        let nodes = vec![
            entity("a", 0.0, 0.0),
            Node::new(Id::new("handle"), NodeKind::Anchor, Point::new(5000.0, 5000.0)),
        ];
        let with_handle = controller.fit_to_content(&nodes, FRAME).unwrap();
        let without = controller.fit_to_content(&nodes[..1], FRAME).unwrap();
        assert_eq!(with_handle, without);
    }

    #[test]
    fn test_fit_clamps_zoom() {
        let controller = ViewportController::default();
        let nodes = vec![entity("tiny", 0.0, 0.0).with_size(0.5, 0.5)];
        let huge_frame = Size::new(100_000.0, 100_000.0);

        let viewport = controller.fit_to_content(&nodes, huge_frame).unwrap();
        assert_eq!(viewport.zoom(), MAX_ZOOM);
    }

    #[test]
    fn test_fit_empty_is_none() {
        let controller = ViewportController::default();
        assert!(controller.fit_to_content(&[], FRAME).is_none());
        assert!(controller
            .center_on_content(&[], FRAME, &Viewport::default())
            .is_none());
    }

    #[test]
    fn test_center_keeps_zoom() {
        let controller = ViewportController::default();
        let nodes = vec![entity("a", 0.0, 0.0)];
        let current = Viewport::new(Point::new(7.0, 7.0), 0.5);

        let viewport = controller.center_on_content(&nodes, FRAME, &current).unwrap();

        assert_eq!(viewport.zoom(), 0.5);
        assert_eq!(viewport.pan(), Point::new(455.0, 285.0));
    }

    #[test]
    fn test_wheel_zoom_direction_and_anchor() {
        let controller = ViewportController::default();
        let viewport = Viewport::default();
        let pointer = Point::new(200.0, 100.0);

        let zoomed_in = controller.wheel_zoom(&viewport, -1.0, pointer);
        let zoomed_out = controller.wheel_zoom(&viewport, 1.0, pointer);

        assert_approx_eq!(f32, zoomed_in.zoom(), 1.08);
        assert_approx_eq!(f32, zoomed_out.zoom(), 0.92);
        let world = coords::to_world(pointer, &zoomed_in);
        assert_approx_eq!(f32, world.x(), 200.0, epsilon = 1e-3);
        assert_approx_eq!(f32, world.y(), 100.0, epsilon = 1e-3);
    }

    #[test]
    fn test_wheel_pan() {
        let controller = ViewportController::default();
        let viewport = controller.wheel_pan(&Viewport::default(), Point::new(10.0, -5.0));
        assert_eq!(viewport.pan(), Point::new(-10.0, 5.0));
    }

    #[test]
    fn test_autoscroll_proportional_to_depth() {
        let controller = ViewportController::default();
        let viewport = Viewport::default();

        assert!(controller
            .autoscroll(&viewport, Point::new(500.0, 300.0), FRAME)
            .is_none());

        let left = controller
            .autoscroll(&viewport, Point::new(20.0, 300.0), FRAME)
            .unwrap();
        assert_eq!(left.pan(), Point::new(8.0, 0.0));

        let bottom_right = controller
            .autoscroll(&viewport, Point::new(1000.0, 600.0), FRAME)
            .unwrap();
        assert_eq!(bottom_right.pan(), Point::new(-16.0, -16.0));
    }

    #[test]
    fn test_visible_nodes_culls_far_nodes() {
        let controller = ViewportController::default();
        let nodes = vec![
            entity("inside", 100.0, 100.0),
            entity("margin", -300.0, 0.0),
            entity("far", 5000.0, 5000.0),
            entity("pinned", -9000.0, 0.0),
        ];

        let visible = controller.visible_nodes(
            &nodes,
            &Viewport::default(),
            FRAME,
            &[Id::new("pinned")],
        );

        assert_eq!(
            visible,
            vec![Id::new("inside"), Id::new("margin"), Id::new("pinned")]
        );
    }
}
