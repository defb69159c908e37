// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bridge configuration.

use serde::{Deserialize, Serialize};

/// Persistent bridge settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// URL of the engine script module to import.
    pub module_url: String,
    /// License key forwarded to the engine after load (best-effort).
    pub license_key: Option<String>,
    /// Load the heavy wasm assets eagerly right after the module loads.
    pub eager_wasm_load: bool,
    /// Editor corner-grab tolerance in backing-store pixels (per axis).
    pub grab_tolerance: f64,
    /// Editor corner-marker radius in backing-store pixels.
    pub marker_radius: f64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            module_url: "./documentJsInterop.js".into(),
            license_key: None,
            eager_wasm_load: false,
            grab_tolerance: 10.0,
            marker_radius: 5.0,
        }
    }
}
