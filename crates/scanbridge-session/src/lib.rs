// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanbridge — Session lifecycles over the engine boundary.
//
// `BridgeSession` owns the lazily-loaded engine module (one per host
// context); `NormalizerSession` owns one engine object instance (one per
// scanning workflow). Many normalizer sessions may share one bridge
// session's module.

pub mod bridge;
pub mod normalizer;

pub use bridge::{BridgeSession, ModuleLoader};
pub use normalizer::{NormalizerSession, QuadObserver};
