// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The quadrilateral editing state machine.
//
// idle → dragging(corner) on a successful grab, back to idle on release.
// Only the active drag mutates the overlay; moves while idle are ignored,
// which also covers interrupted drags — no listener bookkeeping can leak
// past the session object.

use tracing::debug;

use scanbridge_core::{BridgeConfig, QuadLocation, QuadPoint, Quadrilateral};

use crate::surface::{OverlaySurface, PointerEvent};

/// Corner-grab tolerance per axis, in backing-store pixels.
const GRAB_TOLERANCE: f64 = 10.0;

/// Corner marker radius, in backing-store pixels.
const MARKER_RADIUS: f64 = 5.0;

/// Visual/interaction tuning for one editor session.
#[derive(Debug, Clone, Copy)]
pub struct EditorStyle {
    pub grab_tolerance: f64,
    pub marker_radius: f64,
}

impl Default for EditorStyle {
    fn default() -> Self {
        Self {
            grab_tolerance: GRAB_TOLERANCE,
            marker_radius: MARKER_RADIUS,
        }
    }
}

impl From<&BridgeConfig> for EditorStyle {
    fn from(config: &BridgeConfig) -> Self {
        Self {
            grab_tolerance: config.grab_tolerance,
            marker_radius: config.marker_radius,
        }
    }
}

/// Callback channel receiving the full updated quadrilateral on every drag
/// tick.
pub type QuadSink = Box<dyn FnMut(Quadrilateral) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DragState {
    Idle,
    Dragging { corner: usize },
}

/// One editing session over one overlay surface.
///
/// Construction renders the initial quadrilateral immediately. Emissions
/// happen on move ticks only — neither the initial render nor the release
/// emits.
pub struct EditorSession<S: OverlaySurface> {
    surface: S,
    location: QuadLocation,
    drag: DragState,
    style: EditorStyle,
    on_change: QuadSink,
}

impl<S: OverlaySurface> EditorSession<S> {
    pub fn new(surface: S, initial: QuadLocation, on_change: QuadSink) -> Self {
        Self::styled(surface, initial, on_change, EditorStyle::default())
    }

    pub fn styled(
        surface: S,
        initial: QuadLocation,
        on_change: QuadSink,
        style: EditorStyle,
    ) -> Self {
        let mut session = Self {
            surface,
            location: initial,
            drag: DragState::Idle,
            style,
            on_change,
        };
        session.render();
        session
    }

    /// Current working quadrilateral.
    pub fn quad(&self) -> Quadrilateral {
        Quadrilateral::from_location(self.location)
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.drag, DragState::Dragging { .. })
    }

    /// Borrow the overlay surface (hosts use this to tear the overlay down).
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Pointer/touch press: try to grab a corner.
    ///
    /// Corners are scanned in index order; the first one within the grab
    /// tolerance on BOTH axes wins — there is no distance minimization. No
    /// qualifying corner leaves the session idle.
    pub fn pointer_down(&mut self, event: &PointerEvent) {
        let (x, y) = self.to_backing(event);
        for (index, corner) in self.location.points.iter().enumerate() {
            if (corner.x as f64 - x).abs() < self.style.grab_tolerance
                && (corner.y as f64 - y).abs() < self.style.grab_tolerance
            {
                debug!(corner = index, "corner grabbed");
                self.drag = DragState::Dragging { corner: index };
                return;
            }
        }
    }

    /// Pointer/touch move: drag the grabbed corner.
    ///
    /// Ignored while idle. While dragging, the corner is recomputed from
    /// the inverse-scaled pointer position, the overlay is redrawn, and the
    /// full updated quadrilateral is emitted — on every tick, unthrottled.
    pub fn pointer_move(&mut self, event: &PointerEvent) {
        let DragState::Dragging { corner } = self.drag else {
            return;
        };

        let (x, y) = self.to_backing(event);
        self.location.points[corner] = QuadPoint::new(x.round() as i32, y.round() as i32);
        self.render();
        (self.on_change)(Quadrilateral::from_location(self.location));
    }

    /// Pointer/touch release: back to idle. No emission beyond the last
    /// drag tick.
    pub fn pointer_up(&mut self) {
        if self.is_dragging() {
            debug!("corner released");
        }
        self.drag = DragState::Idle;
    }

    /// Display-to-backing-store scale per axis. Degenerate surfaces fall
    /// back to 1:1 so input is never divided by zero.
    fn scale(&self) -> (f64, f64) {
        let scale_x = if self.surface.width() == 0 {
            1.0
        } else {
            self.surface.client_width() / self.surface.width() as f64
        };
        let scale_y = if self.surface.height() == 0 {
            1.0
        } else {
            self.surface.client_height() / self.surface.height() as f64
        };
        (
            if scale_x > 0.0 { scale_x } else { 1.0 },
            if scale_y > 0.0 { scale_y } else { 1.0 },
        )
    }

    fn to_backing(&self, event: &PointerEvent) -> (f64, f64) {
        let (scale_x, scale_y) = self.scale();
        (event.client_x / scale_x, event.client_y / scale_y)
    }

    /// Clear the overlay, mark each corner, stroke the closed polygon
    /// 0→1→2→3→0.
    fn render(&mut self) {
        self.surface.clear();
        for corner in &self.location.points {
            self.surface
                .draw_marker(corner.x, corner.y, self.style.marker_radius);
        }
        let corners = [
            (self.location.points[0].x, self.location.points[0].y),
            (self.location.points[1].x, self.location.points[1].y),
            (self.location.points[2].x, self.location.points[2].y),
            (self.location.points[3].x, self.location.points[3].y),
        ];
        self.surface.stroke_polygon(&corners);
    }
}

// -- Tests --------------------------------------------------------------------
