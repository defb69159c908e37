// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Host-agnostic trait definition for the external engine capability.
//
// One implementation of `DocumentEngine` represents one loaded engine
// module. The surface and instance types are opaque to this layer: a
// browser host uses canvas/object references, the stub uses plain values.

use std::future::Future;

use scanbridge_core::QuadLocation;
use scanbridge_core::error::Result;
use serde_json::Value;

/// The call surface of one loaded document-normalization engine module.
///
/// All calls may suspend awaiting the engine. Callers must not run engine
/// calls concurrently against the same instance — the engine object is not
/// documented safe for concurrent use.
#[allow(async_fn_in_trait)]
pub trait DocumentEngine: Send + Sync {
    /// Opaque image surface understood by the engine.
    type Surface: Clone + Send + Sync;
    /// Opaque handle to one instantiated engine object.
    type Instance: Send;

    /// One-time engine bootstrap after the module is imported.
    ///
    /// Runs on the bridge session's detached loader task, so the future
    /// must be `Send`.
    fn init(&self) -> impl Future<Output = Result<()>> + Send;

    /// Forward the license credential to the engine.
    async fn set_license(&self, key: &str) -> Result<()>;

    /// Download and initialize the engine's compiled numerical kernel.
    /// Must complete before any detect or normalize call.
    async fn load_wasm_assets(&self) -> Result<()>;

    /// Allocate one engine object instance.
    async fn create_instance(&self) -> Result<Self::Instance>;

    /// Run edge detection. Returns the engine's raw structured output, or
    /// `None` when the engine produced nothing.
    async fn detect_quad(
        &self,
        instance: &Self::Instance,
        surface: &Self::Surface,
    ) -> Result<Option<Value>>;

    /// Perspective-rectify `surface` against one quadrilateral. Returns the
    /// rectified surface, or `None` when the engine reports no image.
    async fn normalize(
        &self,
        instance: &Self::Instance,
        surface: &Self::Surface,
        quad: &QuadLocation,
    ) -> Result<Option<Self::Surface>>;

    /// Fetch the engine's runtime settings document.
    async fn get_runtime_settings(&self, instance: &Self::Instance) -> Result<Value>;

    /// Replace the engine's runtime settings document.
    async fn set_runtime_settings(&self, instance: &Self::Instance, settings: Value) -> Result<()>;

    /// Release one instance handle.
    ///
    /// Synchronous so the session's `Drop` fallback can run it. Releasing
    /// the same handle twice is the caller's bug; sessions guard against it.
    fn release_instance(&self, instance: &mut Self::Instance);
}
