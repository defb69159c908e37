// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Normalizer session — one engine object instance per scanning workflow.
//
// The session proxies detect/rectify/filter calls, decodes raw detection
// output, and fans editor change ticks out to the registered observer.
// It owns exactly one cross-boundary instance handle and releases it
// exactly once; `Drop` is a defensive fallback only.

use std::fmt;
use std::sync::{Arc, Mutex};

use tracing::{debug, instrument, warn};

use scanbridge_core::decode;
use scanbridge_core::error::{Result, ScanBridgeError};
use scanbridge_core::{ImageFilter, Quadrilateral};
use scanbridge_editor::{EditorSession, EditorStyle, OverlaySurface};
use scanbridge_engine::DocumentEngine;

/// Receiver of quadrilateral updates from the interactive editor.
///
/// At most one observer is active per session; registering a new one drops
/// the previous observer silently.
pub trait QuadObserver: Send {
    fn on_quad_changed(&self, quad: &Quadrilateral);
}

type ObserverSlot = Arc<Mutex<Option<Box<dyn QuadObserver>>>>;

/// Stateful handle wrapping one instantiated engine object.
pub struct NormalizerSession<E: DocumentEngine> {
    engine: Arc<E>,
    /// `None` once disposed.
    instance: Option<E::Instance>,
    observer: ObserverSlot,
}

impl<E: DocumentEngine> fmt::Debug for NormalizerSession<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NormalizerSession")
            .field("disposed", &self.instance.is_none())
            .finish_non_exhaustive()
    }
}

impl<E: DocumentEngine> NormalizerSession<E> {
    pub(crate) fn new(engine: Arc<E>, instance: E::Instance) -> Self {
        Self {
            engine,
            instance: Some(instance),
            observer: Arc::new(Mutex::new(None)),
        }
    }

    fn instance(&self) -> Result<&E::Instance> {
        self.instance.as_ref().ok_or(ScanBridgeError::SessionDisposed)
    }

    /// Detect document edges on an image surface.
    ///
    /// Raw engine output is decoded tolerantly: malformed items are dropped,
    /// an unusable result yields an empty vector. Engine transport failures
    /// propagate.
    #[instrument(skip_all)]
    pub async fn detect_edges(&self, surface: &E::Surface) -> Result<Vec<Quadrilateral>> {
        let instance = self.instance()?;
        let raw = self.engine.detect_quad(instance, surface).await?;
        let quads = decode::decode_quads(raw.as_ref());
        debug!(count = quads.len(), "edges detected");
        Ok(quads)
    }

    /// Convenience variant returning the first detected quadrilateral.
    pub async fn detect_single_edge(&self, surface: &E::Surface) -> Result<Option<Quadrilateral>> {
        let instance = self.instance()?;
        let raw = self.engine.detect_quad(instance, surface).await?;
        Ok(decode::decode_first(raw.as_ref()))
    }

    /// Rectify `surface` against one quadrilateral.
    ///
    /// `Ok(None)` is the engine's "no resulting image" outcome — the caller
    /// decides the next step; it is not an error.
    #[instrument(skip_all)]
    pub async fn rectify(
        &self,
        surface: &E::Surface,
        quad: &Quadrilateral,
    ) -> Result<Option<E::Surface>> {
        let instance = self.instance()?;
        let rectified = self.engine.normalize(instance, surface, &quad.location).await?;
        if rectified.is_none() {
            debug!("engine reported no rectified image");
        }
        Ok(rectified)
    }

    /// Set the post-processing colour mode.
    ///
    /// Read-modify-write against the engine's runtime settings document —
    /// not transactional; concurrent filter changes race and the last write
    /// wins.
    #[instrument(skip(self))]
    pub async fn apply_filter(&self, filter: ImageFilter) -> Result<()> {
        let instance = self.instance()?;
        let mut settings = self.engine.get_runtime_settings(instance).await?;

        let threshold = settings
            .pointer_mut("/ImageParameterArray/0/BinarizationModes/0/ThresholdCompensation")
            .ok_or_else(|| ScanBridgeError::Settings("missing binarization parameters".into()))?;
        *threshold = serde_json::json!(10);

        let mode = settings
            .pointer_mut("/NormalizerParameterArray/0/ColourMode")
            .ok_or_else(|| ScanBridgeError::Settings("missing normalizer parameters".into()))?;
        *mode = serde_json::Value::String(filter.engine_token().to_owned());

        self.engine.set_runtime_settings(instance, settings).await
    }

    /// Register the quadrilateral observer, replacing any previous one.
    pub fn register_observer(&self, observer: Box<dyn QuadObserver>) {
        let mut slot = self.observer.lock().expect("observer slot poisoned");
        *slot = Some(observer);
    }

    /// Launch an interactive editing session over `surface` with the
    /// default style.
    ///
    /// Every drag tick of the returned editor is forwarded to this
    /// session's observer (if one is registered at that moment). The editor
    /// owns its own working copy; this session's state is untouched.
    pub fn start_interactive_edit<S: OverlaySurface>(
        &self,
        surface: S,
        initial: &Quadrilateral,
    ) -> EditorSession<S> {
        self.start_interactive_edit_styled(surface, initial, EditorStyle::default())
    }

    /// Variant of [`start_interactive_edit`](Self::start_interactive_edit)
    /// taking an explicit [`EditorStyle`], e.g. one derived from
    /// `BridgeConfig`.
    pub fn start_interactive_edit_styled<S: OverlaySurface>(
        &self,
        surface: S,
        initial: &Quadrilateral,
        style: EditorStyle,
    ) -> EditorSession<S> {
        let slot = Arc::clone(&self.observer);
        EditorSession::styled(
            surface,
            initial.location,
            Box::new(move |quad: Quadrilateral| {
                // The slot is emptied while the observer runs so the
                // callback may call `register_observer` without
                // deadlocking; a replacement registered mid-callback wins.
                let observer = slot.lock().expect("observer slot poisoned").take();
                if let Some(observer) = observer {
                    observer.on_quad_changed(&quad);
                    let mut guard = slot.lock().expect("observer slot poisoned");
                    if guard.is_none() {
                        *guard = Some(observer);
                    }
                }
            }),
            style,
        )
    }

    /// Release the engine instance handle.
    ///
    /// Idempotent: the handle is released exactly once, later calls are
    /// no-ops. Operations after dispose fail with
    /// [`ScanBridgeError::SessionDisposed`].
    pub fn dispose(&mut self) {
        if let Some(mut instance) = self.instance.take() {
            self.engine.release_instance(&mut instance);
            debug!("engine instance released");
        }
    }
}

impl<E: DocumentEngine> Drop for NormalizerSession<E> {
    fn drop(&mut self) {
        if let Some(mut instance) = self.instance.take() {
            warn!("normalizer session dropped without dispose, releasing engine instance");
            self.engine.release_instance(&mut instance);
        }
    }
}

// -- Tests --------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use scanbridge_core::{QuadLocation, QuadPoint};
    use scanbridge_engine::StubEngine;
    use scanbridge_engine::stub::StubSurface;
    use serde_json::json;

    async fn session_with(engine: Arc<StubEngine>) -> NormalizerSession<StubEngine> {
        let instance = engine.create_instance().await.expect("create instance");
        NormalizerSession::new(engine, instance)
    }

    fn sample_quad() -> Quadrilateral {
        Quadrilateral::from_location(QuadLocation::new([
            QuadPoint::new(10, 10),
            QuadPoint::new(100, 10),
            QuadPoint::new(100, 100),
            QuadPoint::new(10, 100),
        ]))
    }

    /// Observer double that appends every update to a shared log.
    struct RecordingObserver(Arc<Mutex<Vec<Quadrilateral>>>);

    impl QuadObserver for RecordingObserver {
        fn on_quad_changed(&self, quad: &Quadrilateral) {
            self.0.lock().expect("log lock").push(quad.clone());
        }
    }

    /// Minimal 1:1 overlay double; drawing calls are discarded.
    struct FixedSurface {
        size: u32,
    }

    impl OverlaySurface for FixedSurface {
        fn width(&self) -> u32 {
            self.size
        }
        fn height(&self) -> u32 {
            self.size
        }
        fn client_width(&self) -> f64 {
            self.size as f64
        }
        fn client_height(&self) -> f64 {
            self.size as f64
        }
        fn clear(&mut self) {}
        fn draw_marker(&mut self, _x: i32, _y: i32, _radius: f64) {}
        fn stroke_polygon(&mut self, _corners: &[(i32, i32); 4]) {}
    }

    #[tokio::test]
    async fn detect_decodes_raw_engine_output() {
        let engine = Arc::new(StubEngine::new());
        engine.script_detect_output(json!([
            {"location": {"points": [
                {"x": 1, "y": 2}, {"x": 3, "y": 4}, {"x": 5, "y": 6}, {"x": 7, "y": 8}
            ]}},
            {"noise": true},
        ]));

        let session = session_with(Arc::clone(&engine)).await;
        let quads = session
            .detect_edges(&StubSurface::new())
            .await
            .expect("detect");
        assert_eq!(quads.len(), 1);
        assert_eq!(quads[0].points, [1, 2, 3, 4, 5, 6, 7, 8]);

        let first = session
            .detect_single_edge(&StubSurface::new())
            .await
            .expect("detect single");
        assert_eq!(first.expect("one quad").points[7], 8);
    }

    #[tokio::test]
    async fn detect_with_no_engine_output_is_empty() {
        let engine = Arc::new(StubEngine::new());
        let session = session_with(engine).await;

        let quads = session
            .detect_edges(&StubSurface::new())
            .await
            .expect("detect");
        assert!(quads.is_empty());
        assert!(
            session
                .detect_single_edge(&StubSurface::new())
                .await
                .expect("detect single")
                .is_none()
        );
    }

    #[tokio::test]
    async fn rectify_passes_exchange_encoding_and_handles_no_result() {
        let engine = Arc::new(StubEngine::new());
        let session = session_with(Arc::clone(&engine)).await;
        let quad = sample_quad();

        let rectified = session
            .rectify(&StubSurface::new(), &quad)
            .await
            .expect("rectify");
        assert!(rectified.is_some());
        assert_eq!(engine.last_normalized_quad().expect("quad sent"), quad.location);

        engine.rectify_yields_image(false);
        let absent = session
            .rectify(&StubSurface::new(), &quad)
            .await
            .expect("no-result is not an error");
        assert!(absent.is_none());
    }

    #[tokio::test]
    async fn apply_filter_rewrites_settings_document() {
        let engine = Arc::new(StubEngine::new());
        let session = session_with(Arc::clone(&engine)).await;

        session
            .apply_filter(ImageFilter::BlackAndWhite)
            .await
            .expect("apply filter");

        let settings = engine.settings();
        assert_eq!(
            settings["NormalizerParameterArray"][0]["ColourMode"],
            "ICM_BINARY"
        );
        assert_eq!(
            settings["ImageParameterArray"][0]["BinarizationModes"][0]["ThresholdCompensation"],
            10
        );
    }

    #[tokio::test]
    async fn apply_filter_rejects_unexpected_settings_shape() {
        let engine = Arc::new(StubEngine::new());
        let session = session_with(Arc::clone(&engine)).await;

        let instance = engine.create_instance().await.expect("create");
        engine
            .set_runtime_settings(&instance, json!({}))
            .await
            .expect("replace settings");

        let err = session
            .apply_filter(ImageFilter::Gray)
            .await
            .expect_err("shape mismatch must surface");
        assert!(matches!(err, ScanBridgeError::Settings(_)));
    }

    #[tokio::test]
    async fn dispose_releases_exactly_once() {
        let engine = Arc::new(StubEngine::new());
        let mut session = session_with(Arc::clone(&engine)).await;

        session.dispose();
        session.dispose();
        assert_eq!(engine.released_instances().len(), 1);

        let err = session
            .detect_edges(&StubSurface::new())
            .await
            .expect_err("disposed session must refuse calls");
        assert!(matches!(err, ScanBridgeError::SessionDisposed));
    }

    #[tokio::test]
    async fn drop_releases_as_fallback() {
        let engine = Arc::new(StubEngine::new());
        {
            let _session = session_with(Arc::clone(&engine)).await;
        }
        assert_eq!(engine.released_instances().len(), 1);
    }

    #[tokio::test]
    async fn drop_after_dispose_does_not_double_release() {
        let engine = Arc::new(StubEngine::new());
        {
            let mut session = session_with(Arc::clone(&engine)).await;
            session.dispose();
        }
        assert_eq!(engine.released_instances().len(), 1);
    }

    #[tokio::test]
    async fn editor_ticks_reach_the_registered_observer() {
        use scanbridge_editor::PointerEvent;

        let engine = Arc::new(StubEngine::new());
        let session = session_with(engine).await;

        let log = Arc::new(Mutex::new(Vec::new()));
        session.register_observer(Box::new(RecordingObserver(Arc::clone(&log))));

        let surface = FixedSurface { size: 400 };
        let mut editor = session.start_interactive_edit(surface, &sample_quad());

        editor.pointer_down(&PointerEvent::new(98.0, 12.0));
        editor.pointer_move(&PointerEvent::new(120.0, 30.0));
        editor.pointer_move(&PointerEvent::new(130.0, 40.0));
        editor.pointer_up();

        let log = log.lock().expect("log lock");
        assert_eq!(log.len(), 2);
        assert_eq!(log[1].corner(1), (130, 40));
        // Every emission carries the full quadrilateral, not a diff.
        assert_eq!(log[1].corner(0), (10, 10));
    }

    #[tokio::test]
    async fn replacing_the_observer_drops_the_previous_one() {
        use scanbridge_editor::PointerEvent;

        let engine = Arc::new(StubEngine::new());
        let session = session_with(engine).await;

        let first = Arc::new(Mutex::new(Vec::new()));
        let second = Arc::new(Mutex::new(Vec::new()));
        session.register_observer(Box::new(RecordingObserver(Arc::clone(&first))));
        session.register_observer(Box::new(RecordingObserver(Arc::clone(&second))));

        let surface = FixedSurface { size: 400 };
        let mut editor = session.start_interactive_edit(surface, &sample_quad());
        editor.pointer_down(&PointerEvent::new(12.0, 12.0));
        editor.pointer_move(&PointerEvent::new(20.0, 20.0));

        assert!(first.lock().expect("lock").is_empty());
        assert_eq!(second.lock().expect("lock").len(), 1);
    }

    #[tokio::test]
    async fn configured_style_reaches_the_observer_wired_editor() {
        use scanbridge_core::BridgeConfig;
        use scanbridge_editor::PointerEvent;

        let engine = Arc::new(StubEngine::new());
        let session = session_with(engine).await;

        let log = Arc::new(Mutex::new(Vec::new()));
        session.register_observer(Box::new(RecordingObserver(Arc::clone(&log))));

        let config = BridgeConfig {
            grab_tolerance: 30.0,
            ..BridgeConfig::default()
        };
        let surface = FixedSurface { size: 400 };
        let mut editor =
            session.start_interactive_edit_styled(surface, &sample_quad(), EditorStyle::from(&config));

        // 25px off corner 1 — outside the default 10px tolerance, inside
        // the configured one.
        editor.pointer_down(&PointerEvent::new(125.0, 10.0));
        editor.pointer_move(&PointerEvent::new(140.0, 20.0));

        let log = log.lock().expect("log lock");
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].corner(1), (140, 20));
    }

    /// Observer that swaps in a replacement from inside its own callback.
    struct SelfReplacingObserver {
        session: Arc<NormalizerSession<StubEngine>>,
        seen: Arc<Mutex<Vec<Quadrilateral>>>,
        replacement: Arc<Mutex<Vec<Quadrilateral>>>,
    }

    impl QuadObserver for SelfReplacingObserver {
        fn on_quad_changed(&self, quad: &Quadrilateral) {
            self.seen.lock().expect("log lock").push(quad.clone());
            self.session
                .register_observer(Box::new(RecordingObserver(Arc::clone(&self.replacement))));
        }
    }

    #[tokio::test]
    async fn observer_may_re_register_from_inside_its_callback() {
        use scanbridge_editor::PointerEvent;

        let engine = Arc::new(StubEngine::new());
        let session = Arc::new(session_with(engine).await);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let replacement = Arc::new(Mutex::new(Vec::new()));
        session.register_observer(Box::new(SelfReplacingObserver {
            session: Arc::clone(&session),
            seen: Arc::clone(&seen),
            replacement: Arc::clone(&replacement),
        }));

        let surface = FixedSurface { size: 400 };
        let mut editor = session.start_interactive_edit(surface, &sample_quad());
        editor.pointer_down(&PointerEvent::new(12.0, 12.0));
        editor.pointer_move(&PointerEvent::new(20.0, 20.0));
        editor.pointer_move(&PointerEvent::new(25.0, 25.0));

        // First tick hits the original observer; the replacement it
        // registered takes over from the next tick on.
        assert_eq!(seen.lock().expect("lock").len(), 1);
        assert_eq!(replacement.lock().expect("lock").len(), 1);
    }
}
