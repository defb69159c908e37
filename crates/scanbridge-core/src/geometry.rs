// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Quadrilateral geometry and the exchange encoding shared with the engine.

use serde::{Deserialize, Serialize};

/// One corner of a detected document boundary, in backing-store pixels.
///
/// Serializes exactly as `{"x":int,"y":int}` — the field names are a wire
/// contract with the engine's rectify call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuadPoint {
    pub x: i32,
    pub y: i32,
}

impl QuadPoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// The exchange encoding of a quadrilateral: `{"points":[{x,y} × 4]}`.
///
/// This exact shape is consumed both by the engine's rectify operation and
/// by the editor's redraw/callback cycle. Ordering is index-significant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuadLocation {
    pub points: [QuadPoint; 4],
}

impl QuadLocation {
    pub fn new(points: [QuadPoint; 4]) -> Self {
        Self { points }
    }
}

/// A 4-point polygon describing a detected document boundary.
///
/// `points` is the flattened `[x0,y0,x1,y1,x2,y2,x3,y3]` view; `location`
/// carries the same corners in the exchange encoding so the value can be
/// round-tripped to the engine for rectification. The two always agree.
///
/// Point ordering follows the engine's own convention — no winding or
/// starting-corner rule is validated by this layer.
///
/// A quadrilateral is immutable once handed to rectify; each editor drag
/// tick produces a new instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quadrilateral {
    /// Flattened corner coordinates, always length 8.
    pub points: [i32; 8],
    /// Exchange-format encoding of the same corners.
    pub location: QuadLocation,
}

impl Quadrilateral {
    /// Build a quadrilateral from its exchange encoding, deriving the
    /// flattened coordinate array.
    pub fn from_location(location: QuadLocation) -> Self {
        let mut points = [0i32; 8];
        for (i, p) in location.points.iter().enumerate() {
            points[i * 2] = p.x;
            points[i * 2 + 1] = p.y;
        }
        Self { points, location }
    }

    /// Corner at `index` (0..4) as an (x, y) pair.
    pub fn corner(&self, index: usize) -> (i32, i32) {
        let p = self.location.points[index];
        (p.x, p.y)
    }
}

impl From<QuadLocation> for Quadrilateral {
    fn from(location: QuadLocation) -> Self {
        Self::from_location(location)
    }
}

// -- Tests --------------------------------------------------------------------
