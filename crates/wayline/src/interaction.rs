//! Pointer interaction state for one editing session.
//!
//! Dragging, marquee selection, panning and connecting are mutually
//! exclusive. They share a single [`GestureSlot`], so starting one gesture
//! replaces whatever was in flight.

use std::collections::HashSet;

use log::trace;

use wayline_core::{
    diagram::{Node, Viewport},
    geometry::{Bounds, Point},
    identifier::Id,
};

use crate::{ports::PendingConnection, shape};

/// A rubber-band selection rectangle, in world coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Marquee {
    start: Point,
    current: Point,
    base_selection: Vec<Id>,
}

impl Marquee {
    /// Starts a marquee at `start`.
    ///
    /// `base_selection` is kept selected regardless of what the rectangle
    /// covers; pass an empty list for a non-additive selection.
    pub fn new(start: Point, base_selection: Vec<Id>) -> Self {
        Self {
            start,
            current: start,
            base_selection,
        }
    }

    pub fn update(&mut self, current: Point) {
        self.current = current;
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::from_corners(self.start, self.current)
    }

    /// Base selection plus every non-auxiliary node whose box touches the rectangle.
    ///
    /// Order: base selection first, then hits in snapshot order, without duplicates.
    pub fn selection(&self, nodes: &[Node]) -> Vec<Id> {
        let area = self.bounds();
        let mut seen: HashSet<Id> = HashSet::new();

        let hits = nodes
            .iter()
            .filter(|node| !node.kind().is_auxiliary())
            .filter(|node| shape::node_bounds(node).intersects_inclusive(&area))
            .map(Node::id);

        self.base_selection
            .iter()
            .copied()
            .chain(hits)
            .filter(|id| seen.insert(*id))
            .collect()
    }
}

/// State captured when a node drag starts.
#[derive(Debug, Clone, PartialEq)]
pub struct DragState {
    pointer_start: Point,
    initial: Vec<(Id, Point)>,
}

impl DragState {
    /// The first entry is the primary node used for grid snapping.
    pub fn new(pointer_start: Point, initial: Vec<(Id, Point)>) -> Self {
        Self {
            pointer_start,
            initial,
        }
    }

    pub fn pointer_start(&self) -> Point {
        self.pointer_start
    }

    pub fn initial(&self) -> &[(Id, Point)] {
        &self.initial
    }

    pub fn ids(&self) -> impl Iterator<Item = Id> + '_ {
        self.initial.iter().map(|(id, _)| *id)
    }
}

/// State captured when a pan starts, in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanState {
    pointer_start: Point,
    base_pan: Point,
}

impl PanState {
    pub fn new(pointer_start: Point, viewport: &Viewport) -> Self {
        Self {
            pointer_start,
            base_pan: viewport.pan(),
        }
    }

    /// The viewport after the pointer moved to `pointer`.
    pub fn viewport_at(&self, viewport: &Viewport, pointer: Point) -> Viewport {
        let delta = pointer.sub_point(self.pointer_start);
        viewport.with_pan(self.base_pan.add_point(delta))
    }
}

/// The one gesture currently in flight.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Gesture {
    #[default]
    Idle,
    Panning(PanState),
    Marquee(Marquee),
    Dragging(DragState),
    /// `dragging` is true while the pointer is still held on the source port.
    Connecting {
        pending: PendingConnection,
        dragging: bool,
    },
}

impl Gesture {
    fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Panning(_) => "panning",
            Self::Marquee(_) => "marquee",
            Self::Dragging(_) => "dragging",
            Self::Connecting { .. } => "connecting",
        }
    }
}

/// Holds the session's current [`Gesture`].
#[derive(Debug, Clone, Default)]
pub struct GestureSlot {
    current: Gesture,
}

impl GestureSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> &Gesture {
        &self.current
    }

    pub fn current_mut(&mut self) -> &mut Gesture {
        &mut self.current
    }

    /// Starts `gesture`, returning the one it replaced.
    pub fn begin(&mut self, gesture: Gesture) -> Gesture {
        trace!(from = self.current.name(), to = gesture.name(); "Gesture replaced");
        std::mem::replace(&mut self.current, gesture)
    }

    /// Ends the current gesture, returning it.
    pub fn finish(&mut self) -> Gesture {
        std::mem::take(&mut self.current)
    }

    /// Handles an escape signal: cancels a pending connection or a marquee.
    ///
    /// Returns true if something was cancelled.
    pub fn cancel(&mut self) -> bool {
        match self.current {
            Gesture::Connecting { .. } | Gesture::Marquee(_) => {
                self.current = Gesture::Idle;
                true
            }
            _ => false,
        }
    }

    /// The pending connection, if a connect gesture is in flight.
    pub fn pending_connection(&self) -> Option<PendingConnection> {
        match &self.current {
            Gesture::Connecting { pending, .. } => Some(*pending),
            _ => None,
        }
    }
}

/// Keeps at most one pending pointer sample per frame.
///
/// Later samples overwrite earlier ones, so a burst of pointer moves costs one
/// recomputation.
#[derive(Debug, Clone)]
pub struct PointerCoalescer<T> {
    pending: Option<T>,
}

impl<T> Default for PointerCoalescer<T> {
    fn default() -> Self {
        Self { pending: None }
    }
}

impl<T> PointerCoalescer<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a sample. Returns true when a frame must be scheduled, that
    /// is when no sample was already waiting.
    pub fn push(&mut self, sample: T) -> bool {
        self.pending.replace(sample).is_none()
    }

    /// Takes the latest sample for this frame.
    pub fn take(&mut self) -> Option<T> {
        self.pending.take()
    }

    /// Drops any waiting sample, e.g. on pointer release.
    pub fn clear(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}
