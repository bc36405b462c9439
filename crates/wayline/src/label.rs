//! Edge label placement.
//!
//! Labels are placed one at a time. Each label tries a ranked list of offsets
//! from its anchor and takes the first spot that is clear of every node box
//! and every label placed before it. When nothing is clear the label is
//! centred on its anchor anyway, so a label is never dropped.

use std::collections::HashMap;

use log::{debug, trace};

use wayline_core::{
    diagram::Edge,
    geometry::{Bounds, Point, Size},
    identifier::Id,
};

use crate::{config::LabelConfig, routing::RoutedEdge, text};

/// Extra clearance between ranked candidate rows and columns.
const CANDIDATE_SPACING: f32 = 6.0;

/// Ranked offsets around an anchor for a label of `size`.
///
/// Order: centre, above, below, right, left, the four diagonals, then twice
/// as far above and below.
pub fn ranked_offsets(size: Size) -> Vec<Point> {
    let dx = size.width() / 2.0 + CANDIDATE_SPACING * 2.0;
    let dy = size.height() + CANDIDATE_SPACING;
    vec![
        Point::new(0.0, 0.0),
        Point::new(0.0, -dy),
        Point::new(0.0, dy),
        Point::new(dx, 0.0),
        Point::new(-dx, 0.0),
        Point::new(dx, -dy),
        Point::new(-dx, -dy),
        Point::new(dx, dy),
        Point::new(-dx, dy),
        Point::new(0.0, -2.0 * dy),
        Point::new(0.0, 2.0 * dy),
    ]
}

/// Places labels without overlapping nodes or each other.
#[derive(Debug, Clone, Default)]
pub struct LabelPlacer {
    config: LabelConfig,
    placed: Vec<Bounds>,
    vertical_offsets: Option<Vec<f32>>,
}

impl LabelPlacer {
    pub fn new(config: LabelConfig) -> Self {
        Self {
            config,
            placed: Vec::new(),
            vertical_offsets: None,
        }
    }

    /// Replaces the ranked offsets with purely vertical ones, tried in order.
    pub fn with_vertical_offsets(mut self, offsets: &[f32]) -> Self {
        self.vertical_offsets = Some(offsets.to_vec());
        self
    }

    /// Label boxes accepted so far.
    pub fn placed(&self) -> &[Bounds] {
        &self.placed
    }

    fn candidates(&self, size: Size) -> Vec<Point> {
        match &self.vertical_offsets {
            Some(offsets) => offsets.iter().map(|dy| Point::new(0.0, *dy)).collect(),
            None => ranked_offsets(size),
        }
    }

    fn is_clear(&self, candidate: &Bounds, node_boxes: &[Bounds]) -> bool {
        node_boxes
            .iter()
            .all(|node| !candidate.overlaps(node, self.config.node_padding()))
            && self
                .placed
                .iter()
                .all(|label| !candidate.overlaps(label, self.config.label_padding()))
    }

    /// Places one label of `size` near `anchor`.
    ///
    /// An accepted position is remembered for later labels. The fallback
    /// position is returned without being remembered.
    pub fn place(&mut self, anchor: Point, size: Size, node_boxes: &[Bounds]) -> Bounds {
        for offset in self.candidates(size) {
            let candidate = Bounds::new_from_center(anchor.add_point(offset), size);
            if self.is_clear(&candidate, node_boxes) {
                trace!(x = offset.x(), y = offset.y(); "Label offset accepted");
                self.placed.push(candidate);
                return candidate;
            }
        }

        debug!(x = anchor.x(), y = anchor.y(); "No clear label spot, centring on anchor");
        Bounds::new_from_center(anchor, size)
    }

    /// Size of the label box for `text`.
    pub fn label_size(&self, text: &str) -> Size {
        text::label_size(
            text,
            self.config.font_size(),
            self.config.horizontal_padding(),
            self.config.height(),
        )
    }

    /// Places the labels of every routed edge whose edge has label text.
    pub fn label_routes(&mut self, edges: &[Edge], routes: &mut [RoutedEdge], node_boxes: &[Bounds]) {
        let labels: HashMap<Id, &str> = edges
            .iter()
            .filter(|edge| !edge.label().is_empty())
            .map(|edge| (edge.id(), edge.label()))
            .collect();

        for route in routes.iter_mut() {
            let Some(text) = labels.get(&route.id()) else {
                continue;
            };
            let size = self.label_size(text);
            let bounds = self.place(route.path().label_anchor(), size, node_boxes);
            route.set_label(bounds);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LABEL: Size = Size::new(40.0, 18.0);

    #[test]
    fn test_free_anchor_takes_centre() {
        let mut placer = LabelPlacer::default();
        let bounds = placer.place(Point::new(100.0, 100.0), LABEL, &[]);

        assert_eq!(bounds.center(), Point::new(100.0, 100.0));
        assert_eq!(placer.placed().len(), 1);
    }

    #[test]
    fn test_second_label_moves_above() {
        let mut placer = LabelPlacer::default();
        placer.place(Point::new(100.0, 100.0), LABEL, &[]);
        let second = placer.place(Point::new(100.0, 100.0), LABEL, &[]);

        assert_eq!(second.center(), Point::new(100.0, 76.0));
        assert!(!second.overlaps(&placer.placed()[0], 2.0));
    }

    #[test]
    fn test_avoids_node_box() {
        let mut placer = LabelPlacer::default();
        // Node covering the anchor and the slot above it.
        let node = Bounds::new_from_top_left(Point::new(60.0, 40.0), Size::new(80.0, 70.0));

        let bounds = placer.place(Point::new(100.0, 100.0), LABEL, &[node]);

        assert!(!bounds.overlaps(&node, 4.0));
        assert_eq!(bounds.center(), Point::new(100.0, 124.0));
    }

    #[test]
    fn test_fallback_is_not_recorded() {
        let mut placer = LabelPlacer::default();
        let wall = Bounds::new_from_center(Point::new(0.0, 0.0), Size::new(1000.0, 1000.0));

        let bounds = placer.place(Point::new(0.0, 0.0), LABEL, &[wall]);

        assert_eq!(bounds.center(), Point::new(0.0, 0.0));
        assert!(placer.placed().is_empty());
    }

    #[test]
    fn test_vertical_offsets_are_tried_in_order() {
        let mut placer = LabelPlacer::default().with_vertical_offsets(&[-22.0, -34.0, 22.0]);
        let first = placer.place(Point::new(0.0, 0.0), LABEL, &[]);
        let second = placer.place(Point::new(0.0, 0.0), LABEL, &[]);

        assert_eq!(first.center(), Point::new(0.0, -22.0));
        // -34 still overlaps the first label, so 22 wins.
        assert_eq!(second.center(), Point::new(0.0, 22.0));
    }
}
