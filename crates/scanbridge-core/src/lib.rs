// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanbridge — Core geometry, result decoding, and error definitions shared
// across all crates.

pub mod config;
pub mod decode;
pub mod error;
pub mod filter;
pub mod geometry;

pub use config::BridgeConfig;
pub use error::ScanBridgeError;
pub use filter::ImageFilter;
pub use geometry::{QuadLocation, QuadPoint, Quadrilateral};
