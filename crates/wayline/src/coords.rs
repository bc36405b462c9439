//! Mapping between screen and world coordinates.
//!
//! A [`Viewport`] stores `pan` and `zoom` such that
//! `screen = world * zoom + pan`. Every function here is the direct
//! consequence of that one equation.

use wayline_core::{diagram::Viewport, geometry::Point};

/// Converts a screen-space point to world space.
pub fn to_world(screen: Point, viewport: &Viewport) -> Point {
    screen.sub_point(viewport.pan()).scale(1.0 / viewport.zoom())
}

/// Converts a world-space point to screen space.
pub fn to_screen(world: Point, viewport: &Viewport) -> Point {
    world.scale(viewport.zoom()).add_point(viewport.pan())
}

/// Changes the zoom while keeping the world point under `anchor` fixed.
///
/// `anchor` is in screen coordinates. `zoom` is clamped by [`Viewport::new`].
pub fn zoom_about(viewport: &Viewport, zoom: f32, anchor: Point) -> Viewport {
    let world = to_world(anchor, viewport);
    let clamped = Viewport::new(viewport.pan(), zoom);
    let pan = anchor.sub_point(world.scale(clamped.zoom()));
    clamped.with_pan(pan)
}
