// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Tolerant decoding of the engine's raw detection output.
//
// The engine returns either nothing, a single structured item, or an array
// of items. Decoding is best-effort and silently partial: malformed items
// are dropped (logged at debug), never surfaced as errors.

use serde_json::Value;
use tracing::debug;

use crate::geometry::{QuadLocation, QuadPoint, Quadrilateral};

/// Decode the engine's raw detection output into quadrilaterals.
///
/// Absent or `null` input yields an empty vector. An array yields one
/// quadrilateral per well-formed item, in input order. A single object
/// yields zero or one.
pub fn decode_quads(raw: Option<&Value>) -> Vec<Quadrilateral> {
    let Some(value) = raw else {
        return Vec::new();
    };

    match value {
        Value::Array(items) => items.iter().filter_map(decode_item).collect(),
        Value::Null => Vec::new(),
        item => decode_item(item).into_iter().collect(),
    }
}

/// Decode the first well-formed quadrilateral, if any.
pub fn decode_first(raw: Option<&Value>) -> Option<Quadrilateral> {
    decode_quads(raw).into_iter().next()
}

/// Decode one raw item.
///
/// The item must carry a `location` object; items without one are skipped.
/// Within `location.points`, up to 4 entries contribute integer `x`/`y`
/// coordinates. A missing or non-integer coordinate zero-fills its slot —
/// a deliberate departure from the upstream wrapper, whose index-advance
/// shifted every subsequent value into the wrong slot. Fewer than 4 points
/// leave the remaining slots at zero; entries past the fourth are ignored.
fn decode_item(item: &Value) -> Option<Quadrilateral> {
    let Some(location) = item.get("location") else {
        debug!("dropping detection item without location");
        return None;
    };

    let mut corners = [QuadPoint::default(); 4];
    if let Some(points) = location.get("points").and_then(Value::as_array) {
        for (slot, point) in points.iter().take(4).enumerate() {
            corners[slot] = QuadPoint::new(coordinate(point, "x"), coordinate(point, "y"));
        }
    }

    Some(Quadrilateral::from_location(QuadLocation::new(corners)))
}

/// Integer coordinate field, zero when absent or not an integer.
fn coordinate(point: &Value, field: &str) -> i32 {
    match point.get(field).and_then(Value::as_i64) {
        Some(v) => v as i32,
        None => {
            debug!(field, "point missing integer coordinate, zero-filling slot");
            0
        }
    }
}

// -- Tests --------------------------------------------------------------------
