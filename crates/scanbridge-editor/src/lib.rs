// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanbridge — Interactive quadrilateral editor.
//
// An editor session renders a document quadrilateral on an overlay surface,
// hit-tests pointer/touch input against its four corners, drags the grabbed
// corner, and streams the updated geometry through a callback channel on
// every move tick. Each session owns its surface, working point array, and
// drag state, so multiple editors coexist without interference.

pub mod editor;
pub mod surface;

pub use editor::{EditorSession, EditorStyle, QuadSink};
pub use surface::{OverlaySurface, PointerEvent};
