// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanbridge — Engine boundary abstractions.
//
// This crate defines the call surface of the external document-normalization
// engine. The engine itself (edge detection, perspective rectification,
// filtering) is an opaque third-party capability; higher layers only invoke
// it and interpret its structured output. A browser host implements
// `DocumentEngine` over the real script module; the in-memory `StubEngine`
// stands in for desktop/CI builds and tests.

pub mod stub;
pub mod traits;

pub use stub::StubEngine;
pub use traits::DocumentEngine;
