// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory stub engine for desktop/CI builds and tests.
//
// Mirrors the observable behaviour of the real script-hosted engine:
// scripted detect output, a runtime-settings document in the engine's own
// shape, and failure-injection toggles for every lifecycle step.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use serde_json::{Value, json};
use tracing::debug;
use uuid::Uuid;

use scanbridge_core::QuadLocation;
use scanbridge_core::error::{Result, ScanBridgeError};

use crate::traits::DocumentEngine;

/// Opaque in-memory image surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StubSurface {
    pub id: Uuid,
}

impl StubSurface {
    pub fn new() -> Self {
        Self { id: Uuid::new_v4() }
    }
}

impl Default for StubSurface {
    fn default() -> Self {
        Self::new()
    }
}

/// Opaque in-memory engine object handle.
#[derive(Debug)]
pub struct StubInstance {
    id: Uuid,
    released: bool,
}

impl StubInstance {
    pub fn id(&self) -> Uuid {
        self.id
    }
}

/// Engine runtime-settings document in the shape the real engine uses.
fn default_settings() -> Value {
    json!({
        "ImageParameterArray": [
            { "BinarizationModes": [ { "ThresholdCompensation": 0 } ] }
        ],
        "NormalizerParameterArray": [
            { "ColourMode": "ICM_COLOUR" }
        ]
    })
}

/// In-memory `DocumentEngine` implementation.
///
/// Tests script the detect output and flip failure toggles; the engine
/// records licenses, created/released instances, and the last quadrilateral
/// sent to normalize so sessions can be checked end to end.
#[derive(Debug)]
pub struct StubEngine {
    detect_output: Mutex<Option<Value>>,
    settings: Mutex<Value>,
    license: Mutex<Option<String>>,
    last_normalized_quad: Mutex<Option<QuadLocation>>,
    released: Mutex<Vec<Uuid>>,
    init_calls: AtomicUsize,
    created_instances: AtomicUsize,
    wasm_loaded: AtomicBool,
    fail_license: AtomicBool,
    fail_wasm: AtomicBool,
    fail_create: AtomicBool,
    fail_detect: AtomicBool,
    rectify_yields_image: AtomicBool,
}

impl StubEngine {
    pub fn new() -> Self {
        Self {
            detect_output: Mutex::new(None),
            settings: Mutex::new(default_settings()),
            license: Mutex::new(None),
            last_normalized_quad: Mutex::new(None),
            released: Mutex::new(Vec::new()),
            init_calls: AtomicUsize::new(0),
            created_instances: AtomicUsize::new(0),
            wasm_loaded: AtomicBool::new(false),
            fail_license: AtomicBool::new(false),
            fail_wasm: AtomicBool::new(false),
            fail_create: AtomicBool::new(false),
            fail_detect: AtomicBool::new(false),
            rectify_yields_image: AtomicBool::new(true),
        }
    }

    // -- Test scripting -------------------------------------------------------

    /// Script the raw value returned by the next detect calls.
    pub fn script_detect_output(&self, raw: Value) {
        *self.detect_output.lock().expect("detect output lock poisoned") = Some(raw);
    }

    pub fn fail_license(&self, fail: bool) {
        self.fail_license.store(fail, Ordering::SeqCst);
    }

    pub fn fail_wasm(&self, fail: bool) {
        self.fail_wasm.store(fail, Ordering::SeqCst);
    }

    pub fn fail_create(&self, fail: bool) {
        self.fail_create.store(fail, Ordering::SeqCst);
    }

    pub fn fail_detect(&self, fail: bool) {
        self.fail_detect.store(fail, Ordering::SeqCst);
    }

    /// When false, normalize reports "no image".
    pub fn rectify_yields_image(&self, yields: bool) {
        self.rectify_yields_image.store(yields, Ordering::SeqCst);
    }

    // -- Test observation -----------------------------------------------------

    pub fn init_calls(&self) -> usize {
        self.init_calls.load(Ordering::SeqCst)
    }

    pub fn license(&self) -> Option<String> {
        self.license.lock().expect("license lock poisoned").clone()
    }

    pub fn wasm_loaded(&self) -> bool {
        self.wasm_loaded.load(Ordering::SeqCst)
    }

    pub fn created_instances(&self) -> usize {
        self.created_instances.load(Ordering::SeqCst)
    }

    pub fn released_instances(&self) -> Vec<Uuid> {
        self.released.lock().expect("released lock poisoned").clone()
    }

    pub fn settings(&self) -> Value {
        self.settings.lock().expect("settings lock poisoned").clone()
    }

    pub fn last_normalized_quad(&self) -> Option<QuadLocation> {
        self.last_normalized_quad
            .lock()
            .expect("normalize lock poisoned")
            .clone()
    }

    fn check_live(instance: &StubInstance) -> Result<()> {
        if instance.released {
            return Err(ScanBridgeError::EngineCall(
                "instance already released".into(),
            ));
        }
        Ok(())
    }
}

impl Default for StubEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentEngine for StubEngine {
    type Surface = StubSurface;
    type Instance = StubInstance;

    async fn init(&self) -> Result<()> {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn set_license(&self, key: &str) -> Result<()> {
        if self.fail_license.load(Ordering::SeqCst) {
            return Err(ScanBridgeError::EngineCall("license rejected".into()));
        }
        *self.license.lock().expect("license lock poisoned") = Some(key.to_owned());
        Ok(())
    }

    async fn load_wasm_assets(&self) -> Result<()> {
        if self.fail_wasm.load(Ordering::SeqCst) {
            return Err(ScanBridgeError::EngineCall("wasm fetch failed".into()));
        }
        self.wasm_loaded.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn create_instance(&self) -> Result<StubInstance> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(ScanBridgeError::EngineCall(
                "createInstance returned null".into(),
            ));
        }
        self.created_instances.fetch_add(1, Ordering::SeqCst);
        Ok(StubInstance {
            id: Uuid::new_v4(),
            released: false,
        })
    }

    async fn detect_quad(
        &self,
        instance: &StubInstance,
        _surface: &StubSurface,
    ) -> Result<Option<Value>> {
        Self::check_live(instance)?;
        if self.fail_detect.load(Ordering::SeqCst) {
            return Err(ScanBridgeError::EngineCall("detect failed".into()));
        }
        Ok(self
            .detect_output
            .lock()
            .expect("detect output lock poisoned")
            .clone())
    }

    async fn normalize(
        &self,
        instance: &StubInstance,
        _surface: &StubSurface,
        quad: &QuadLocation,
    ) -> Result<Option<StubSurface>> {
        Self::check_live(instance)?;
        *self
            .last_normalized_quad
            .lock()
            .expect("normalize lock poisoned") = Some(*quad);

        if self.rectify_yields_image.load(Ordering::SeqCst) {
            Ok(Some(StubSurface::new()))
        } else {
            Ok(None)
        }
    }

    async fn get_runtime_settings(&self, instance: &StubInstance) -> Result<Value> {
        Self::check_live(instance)?;
        Ok(self.settings.lock().expect("settings lock poisoned").clone())
    }

    async fn set_runtime_settings(&self, instance: &StubInstance, settings: Value) -> Result<()> {
        Self::check_live(instance)?;
        *self.settings.lock().expect("settings lock poisoned") = settings;
        Ok(())
    }

    fn release_instance(&self, instance: &mut StubInstance) {
        if instance.released {
            debug!(id = %instance.id, "double release of stub instance");
            return;
        }
        instance.released = true;
        self.released
            .lock()
            .expect("released lock poisoned")
            .push(instance.id);
    }
}

// -- Tests --------------------------------------------------------------------
