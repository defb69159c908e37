// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Post-processing colour filter modes.

use serde::{Deserialize, Serialize};

/// Colour mode applied by the engine when rectifying a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFilter {
    BlackAndWhite,
    Gray,
    Colorful,
}

impl ImageFilter {
    /// Engine-side colour-mode token.
    ///
    /// Opaque pass-through strings written into the engine's runtime
    /// settings document — not reinterpreted by this layer.
    pub fn engine_token(&self) -> &'static str {
        match self {
            Self::BlackAndWhite => "ICM_BINARY",
            Self::Gray => "ICM_GRAYSCALE",
            Self::Colorful => "ICM_COLOUR",
        }
    }
}
