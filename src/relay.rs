//! Drawing relay: pointer samples out, stroke segments in.
//!
//! The relay has two halves. Outbound, [`DrawingRelay`] tracks the local
//! pen and converts each pointer-drag sample into one [`StrokeSegment`]
//! whose start point is the previous sample, reconstructing a freehand
//! polyline as a sequence of short segments that are relayed and never
//! stored. Inbound, [`DrawingRelay::apply`] feeds stroke and clear events
//! to a [`DrawSurface`] in receipt order — no buffering, no
//! acknowledgment, and no ordering guarantee versus a racing clear.
//!
//! Whether local samples may be *transmitted* is gated by the client
//! (`send_stroke` checks the drawer flag); the relay itself is
//! receiver-agnostic and applies whatever arrives.

use crate::event::SketchPartyEvent;
use crate::protocol::StrokeSegment;

/// Minimum stroke width. Sizes at or below zero are clamped here.
const MIN_STROKE_SIZE: f64 = 1.0;

/// The seam to an actual drawing surface (canvas, pixmap, test recorder).
///
/// Implementations draw one segment at a time and clear the whole surface;
/// both operations are applied immediately in call order.
pub trait DrawSurface {
    /// Draw one line segment.
    fn stroke(&mut self, segment: &StrokeSegment);
    /// Clear the whole surface.
    fn clear(&mut self);
}

/// Tracks the local pen and relays the drawing stream.
#[derive(Debug, Clone)]
pub struct DrawingRelay {
    color: String,
    size: f64,
    /// Last sampled pointer position while the pen is down.
    last: Option<(f64, f64)>,
}

impl Default for DrawingRelay {
    fn default() -> Self {
        Self {
            color: "#000000".to_string(),
            size: 5.0,
            last: None,
        }
    }
}

impl DrawingRelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the pen color for subsequent segments.
    pub fn set_color(&mut self, color: impl Into<String>) {
        self.color = color.into();
    }

    /// Set the pen width for subsequent segments. Non-positive or NaN
    /// values are clamped to the minimum width.
    pub fn set_size(&mut self, size: f64) {
        self.size = if size >= MIN_STROKE_SIZE {
            size
        } else {
            MIN_STROKE_SIZE
        };
    }

    /// Current pen color.
    pub fn color(&self) -> &str {
        &self.color
    }

    /// Current pen width.
    pub fn size(&self) -> f64 {
        self.size
    }

    /// Put the pen down at a position. Anchors the next segment's start.
    pub fn begin_stroke(&mut self, x: f64, y: f64) {
        self.last = Some((x, y));
    }

    /// Record one pointer-drag sample.
    ///
    /// Returns the segment from the previous sample to this one, or `None`
    /// when the pen is up. The previous point advances to `(x, y)` so the
    /// next sample continues the polyline.
    pub fn sample(&mut self, x: f64, y: f64) -> Option<StrokeSegment> {
        let (prev_x, prev_y) = self.last?;
        self.last = Some((x, y));
        Some(StrokeSegment {
            prev_x,
            prev_y,
            curr_x: x,
            curr_y: y,
            color: self.color.clone(),
            size: self.size,
        })
    }

    /// Lift the pen. Subsequent samples yield nothing until the next
    /// [`begin_stroke`](Self::begin_stroke).
    pub fn end_stroke(&mut self) {
        self.last = None;
    }

    /// Apply one inbound event to the surface.
    ///
    /// Returns `true` when the event belonged to the drawing stream and was
    /// applied, `false` for every other event kind.
    pub fn apply(surface: &mut impl DrawSurface, event: &SketchPartyEvent) -> bool {
        match event {
            SketchPartyEvent::Stroke(segment) => {
                surface.stroke(segment);
                true
            }
            SketchPartyEvent::CanvasCleared => {
                surface.clear();
                true
            }
            _ => false,
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;

    /// Records every surface operation in order.
    #[derive(Default)]
    struct RecordingSurface {
        ops: Vec<String>,
    }

    impl DrawSurface for RecordingSurface {
        fn stroke(&mut self, segment: &StrokeSegment) {
            self.ops.push(format!(
                "stroke {},{} -> {},{} {} {}",
                segment.prev_x,
                segment.prev_y,
                segment.curr_x,
                segment.curr_y,
                segment.color,
                segment.size
            ));
        }

        fn clear(&mut self) {
            self.ops.push("clear".to_string());
        }
    }

    fn segment(prev_x: f64, prev_y: f64, curr_x: f64, curr_y: f64) -> StrokeSegment {
        StrokeSegment {
            prev_x,
            prev_y,
            curr_x,
            curr_y,
            color: "#000".to_string(),
            size: 5.0,
        }
    }

    #[test]
    fn samples_form_a_continuous_polyline() {
        let mut relay = DrawingRelay::new();
        relay.begin_stroke(0.0, 0.0);

        let first = relay.sample(10.0, 10.0).unwrap();
        assert_eq!((first.prev_x, first.prev_y), (0.0, 0.0));
        assert_eq!((first.curr_x, first.curr_y), (10.0, 10.0));

        // The previous sample becomes the next segment's start point.
        let second = relay.sample(20.0, 0.0).unwrap();
        assert_eq!((second.prev_x, second.prev_y), (10.0, 10.0));
        assert_eq!((second.curr_x, second.curr_y), (20.0, 0.0));
    }

    #[test]
    fn sample_without_pen_down_yields_nothing() {
        let mut relay = DrawingRelay::new();
        assert!(relay.sample(5.0, 5.0).is_none());

        relay.begin_stroke(0.0, 0.0);
        assert!(relay.sample(1.0, 1.0).is_some());

        relay.end_stroke();
        assert!(relay.sample(2.0, 2.0).is_none());
    }

    #[test]
    fn segments_carry_current_pen_settings() {
        let mut relay = DrawingRelay::new();
        relay.set_color("#ff0000");
        relay.set_size(12.0);
        relay.begin_stroke(0.0, 0.0);

        let seg = relay.sample(3.0, 4.0).unwrap();
        assert_eq!(seg.color, "#ff0000");
        assert_eq!(seg.size, 12.0);
    }

    #[test]
    fn size_is_clamped_to_a_positive_width() {
        let mut relay = DrawingRelay::new();
        relay.set_size(0.0);
        assert_eq!(relay.size(), 1.0);
        relay.set_size(-3.0);
        assert_eq!(relay.size(), 1.0);
        relay.set_size(f64::NAN);
        assert_eq!(relay.size(), 1.0);
        relay.set_size(2.5);
        assert_eq!(relay.size(), 2.5);
    }

    #[test]
    fn inbound_stream_is_applied_in_receipt_order() {
        let segments = [segment(0.0, 0.0, 10.0, 10.0), segment(10.0, 10.0, 20.0, 0.0)];

        // Applied one relay at a time.
        let mut one_by_one = RecordingSurface::default();
        for seg in &segments {
            DrawingRelay::apply(&mut one_by_one, &SketchPartyEvent::Stroke(seg.clone()));
        }

        // Applied as one batch of the same events.
        let mut batched = RecordingSurface::default();
        let events: Vec<_> = segments
            .iter()
            .map(|s| SketchPartyEvent::Stroke(s.clone()))
            .collect();
        for event in &events {
            DrawingRelay::apply(&mut batched, event);
        }

        // Order-sensitive, batching-insensitive.
        assert_eq!(one_by_one.ops, batched.ops);
        assert_eq!(one_by_one.ops.len(), 2);
    }

    #[test]
    fn clear_is_applied_immediately() {
        let mut surface = RecordingSurface::default();
        DrawingRelay::apply(&mut surface, &SketchPartyEvent::Stroke(segment(0.0, 0.0, 1.0, 1.0)));
        DrawingRelay::apply(&mut surface, &SketchPartyEvent::CanvasCleared);
        DrawingRelay::apply(&mut surface, &SketchPartyEvent::Stroke(segment(1.0, 1.0, 2.0, 2.0)));

        // A late stroke after a clear still lands: whatever order frames
        // arrive is the resulting surface.
        assert_eq!(surface.ops[1], "clear");
        assert_eq!(surface.ops.len(), 3);
    }

    #[test]
    fn non_drawing_events_are_not_applied() {
        let mut surface = RecordingSurface::default();
        let applied = DrawingRelay::apply(&mut surface, &SketchPartyEvent::Connected);
        assert!(!applied);
        assert!(surface.ops.is_empty());
    }
}
