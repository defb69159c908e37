// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Scanbridge.

use thiserror::Error;

/// Top-level error type for all Scanbridge operations.
///
/// The rectify "no result" case is deliberately NOT an error — it is
/// represented as an absent result by the session layer. License and
/// wasm-asset failures are swallowed and logged at the boundary.
#[derive(Debug, Error)]
pub enum ScanBridgeError {
    // -- Module lifecycle --
    #[error("module load failed: {0}")]
    ModuleLoad(String),

    #[error("engine unavailable: {0}")]
    EngineUnavailable(String),

    // -- Engine calls --
    #[error("engine call failed: {0}")]
    EngineCall(String),

    #[error("runtime settings error: {0}")]
    Settings(String),

    // -- Session lifecycle --
    #[error("normalizer session already disposed")]
    SessionDisposed,

    // -- Exchange encoding --
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ScanBridgeError>;
