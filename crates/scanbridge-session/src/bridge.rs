// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bridge session — lifecycle of the engine script module.
//
// The module is imported lazily through a memoized async initializer:
// the first caller starts the import, every other caller (concurrent or
// sequential) observes the same completed module or the same failure. The
// import runs on a detached task — a caller that stops awaiting merely
// abandons interest, the module still loads for later callers. Teardown
// releases the handle only if it was actually created — dispose never
// forces the lazy initializer.

use std::future::Future;
use std::sync::{Arc, OnceLock};

use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use scanbridge_core::BridgeConfig;
use scanbridge_core::error::{Result, ScanBridgeError};
use scanbridge_engine::DocumentEngine;

use crate::normalizer::NormalizerSession;

/// Fetch-and-execute of the engine script module resource.
///
/// The host supplies the loader (a browser host imports the script module;
/// tests construct a stub engine). `import` runs on a detached task and is
/// invoked at most once per bridge session, even when the first caller
/// stops awaiting mid-load. The returned future must be `Send` for that
/// reason.
pub trait ModuleLoader: Send + Sync + 'static {
    type Engine: DocumentEngine + 'static;

    fn import(&self) -> impl Future<Output = Result<Self::Engine>> + Send;
}

/// Memoized outcome of the module initializer. Failures are stored as the
/// message only, so every later observer gets an equivalent typed error.
type LoadOutcome<E> = std::result::Result<Arc<E>, String>;

/// One per host context. Owns the engine module handle.
pub struct BridgeSession<L: ModuleLoader> {
    loader: Arc<L>,
    /// Receiver for the loader task's published outcome; empty until the
    /// first load starts.
    module: OnceLock<watch::Receiver<Option<LoadOutcome<L::Engine>>>>,
}

impl<L: ModuleLoader> BridgeSession<L> {
    /// Create a session. Nothing is loaded until the first operation.
    pub fn new(loader: L) -> Self {
        Self {
            loader: Arc::new(loader),
            module: OnceLock::new(),
        }
    }

    /// Load the engine module.
    ///
    /// The first caller spawns the import and the engine's one-time `init`
    /// on a detached task; every caller — concurrent or sequential —
    /// suspends on the same in-flight initialization and resolves to the
    /// same outcome. Both success and failure are memoized: a failed load
    /// fails every subsequent call with [`ScanBridgeError::ModuleLoad`].
    /// A caller that stops awaiting does not cancel the load.
    #[instrument(skip_all)]
    pub async fn load(&self) -> Result<Arc<L::Engine>> {
        let rx = self.module.get_or_init(|| self.spawn_loader());

        let mut rx = rx.clone();
        let slot = rx.wait_for(|slot| slot.is_some()).await.map_err(|_| {
            ScanBridgeError::ModuleLoad("module loader task exited without an outcome".into())
        })?;

        match &*slot {
            Some(Ok(engine)) => Ok(Arc::clone(engine)),
            Some(Err(msg)) => Err(ScanBridgeError::ModuleLoad(msg.clone())),
            None => Err(ScanBridgeError::ModuleLoad("loader published no outcome".into())),
        }
    }

    /// Spawn the detached loader task and hand back its outcome channel.
    fn spawn_loader(&self) -> watch::Receiver<Option<LoadOutcome<L::Engine>>> {
        let (tx, rx) = watch::channel(None);
        let loader = Arc::clone(&self.loader);

        tokio::spawn(async move {
            let outcome = match loader.import().await {
                Ok(engine) => match engine.init().await {
                    Ok(()) => {
                        info!("engine module loaded");
                        Ok(Arc::new(engine))
                    }
                    Err(err) => {
                        warn!(error = %err, "engine bootstrap failed");
                        Err(err.to_string())
                    }
                },
                Err(err) => {
                    warn!(error = %err, "module import failed");
                    Err(err.to_string())
                }
            };
            // All receivers gone means the session was disposed mid-load;
            // the outcome is dropped with the channel.
            let _ = tx.send(Some(outcome));
        });

        rx
    }

    /// Forward the license credential to the engine.
    ///
    /// Module-load failures propagate; an engine-side rejection is logged
    /// and swallowed — optional setup keeps going on a best-effort basis.
    #[instrument(skip_all)]
    pub async fn set_license(&self, key: &str) -> Result<()> {
        let engine = self.load().await?;
        if let Err(err) = engine.set_license(key).await {
            warn!(error = %err, "engine rejected license, continuing");
        }
        Ok(())
    }

    /// Trigger download/initialization of the engine's wasm kernel.
    ///
    /// Same policy as [`set_license`](Self::set_license): load failures
    /// propagate, engine-side failures are logged and swallowed.
    #[instrument(skip_all)]
    pub async fn load_wasm_assets(&self) -> Result<()> {
        let engine = self.load().await?;
        if let Err(err) = engine.load_wasm_assets().await {
            warn!(error = %err, "wasm asset load failed, continuing");
        }
        Ok(())
    }

    /// Load the module and apply the configured setup steps.
    pub async fn bootstrap(&self, config: &BridgeConfig) -> Result<()> {
        self.load().await?;
        if let Some(key) = &config.license_key {
            self.set_license(key).await?;
        }
        if config.eager_wasm_load {
            self.load_wasm_assets().await?;
        }
        Ok(())
    }

    /// Allocate one engine object instance wrapped in a
    /// [`NormalizerSession`].
    ///
    /// Fails with [`ScanBridgeError::EngineUnavailable`] when the engine
    /// cannot produce an instance.
    #[instrument(skip_all)]
    pub async fn create_normalizer(&self) -> Result<NormalizerSession<L::Engine>> {
        let engine = self.load().await?;
        let instance = engine
            .create_instance()
            .await
            .map_err(|err| ScanBridgeError::EngineUnavailable(err.to_string()))?;
        debug!("normalizer session created");
        Ok(NormalizerSession::new(engine, instance))
    }

    /// Release the module handle.
    ///
    /// A no-op when the module was never loaded (teardown does not force
    /// the lazy initializer) and on every call after the first. Disposing
    /// mid-load lets the detached loader finish and drop the module with
    /// the channel.
    pub fn dispose(&mut self) {
        match self.module.take() {
            Some(_rx) => debug!("module handle released"),
            None => debug!("module never loaded, nothing to release"),
        }
    }
}

// -- Tests --------------------------------------------------------------------
