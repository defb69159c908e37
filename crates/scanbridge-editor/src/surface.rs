// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Drawing-surface abstraction for the editing overlay.
//
// The host mounts an overlay sized and positioned to exactly cover the base
// image surface and implements this trait over it (a browser host wraps a
// 2D canvas context). The overlay may be displayed at a different size than
// its backing store; the editor inverse-scales input accordingly.

/// Overlay surface the editor draws on.
///
/// Backing-store dimensions are the engine's pixel space; client dimensions
/// are the displayed size. All drawing coordinates are backing-store pixels.
pub trait OverlaySurface {
    /// Backing-store width in pixels.
    fn width(&self) -> u32;
    /// Backing-store height in pixels.
    fn height(&self) -> u32;
    /// Displayed width.
    fn client_width(&self) -> f64;
    /// Displayed height.
    fn client_height(&self) -> f64;

    /// Clear the whole overlay.
    fn clear(&mut self);
    /// Draw a circle marker centred on a corner.
    fn draw_marker(&mut self, x: i32, y: i32, radius: f64);
    /// Stroke the closed polygon through the corners in index order.
    fn stroke_polygon(&mut self, corners: &[(i32, i32); 4]);
}

/// A pointer or touch position in display coordinates, relative to the
/// overlay's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub client_x: f64,
    pub client_y: f64,
}

impl PointerEvent {
    pub fn new(client_x: f64, client_y: f64) -> Self {
        Self { client_x, client_y }
    }
}
