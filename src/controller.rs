//! View state controller.
//!
//! [`ViewController`] owns the [`DisplayState`], the scene composer and the
//! load worker. Health changes bump a generation counter and dispatch a
//! model load; outcomes tagged with an older generation are dropped, so
//! only the most recent request can ever reach the scene.

use std::sync::Arc;
use std::time::Duration;

use web_time::Instant;

use crate::camera::CameraRig;
use crate::engine::command::ViewCommand;
use crate::error::NephroError;
use crate::loader::{AssetCatalog, AssetLoader, LoadOutcome, LoadRequest, LoadWorker};
use crate::options::{DisplayOptions, Options};
use crate::presentation::{self, PanelContent};
use crate::scene::{FallbackBuilder, LightingRig, SceneComposer};
use crate::state::DisplayState;

/// Display state, organ slot and background loading for one viewport.
///
/// Fully CPU-side: the renderer only reads from it.
pub struct ViewController {
    state: DisplayState,
    generation: u64,
    composer: SceneComposer,
    catalog: AssetCatalog,
    fallback: FallbackBuilder,
    worker: LoadWorker,
    viewport: (u32, u32),
    rotation_step: f32,
}

impl ViewController {
    /// Mount the view: default state (healthy, rotating, loading) and the
    /// healthy model load already dispatched.
    ///
    /// # Errors
    ///
    /// Returns [`NephroError::ThreadSpawn`] if the load worker cannot be
    /// started.
    pub fn new(
        options: &Options,
        loader: Arc<dyn AssetLoader>,
        viewport: (u32, u32),
    ) -> Result<Self, NephroError> {
        let worker = LoadWorker::new(loader).map_err(NephroError::ThreadSpawn)?;
        let composer = SceneComposer::new(
            CameraRig::new(&options.camera, viewport.0, viewport.1),
            LightingRig::from_options(&options.lighting),
            &options.display,
        );

        let mut view = Self {
            state: DisplayState::default(),
            generation: 0,
            composer,
            catalog: AssetCatalog::new(&options.assets),
            fallback: FallbackBuilder::new(&options.display),
            worker,
            viewport,
            rotation_step: options.display.rotation_step,
        };
        let healthy = view.state.healthy;
        view.begin_load(healthy);
        Ok(view)
    }

    /// Current display flags.
    #[must_use]
    pub fn state(&self) -> DisplayState {
        self.state
    }

    /// Generation of the most recent load request.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The scene composer (organ slot, camera, lights).
    #[must_use]
    pub fn composer(&self) -> &SceneComposer {
        &self.composer
    }

    /// Mutable scene composer.
    pub fn composer_mut(&mut self) -> &mut SceneComposer {
        &mut self.composer
    }

    /// Current viewport size in physical pixels.
    #[must_use]
    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    /// Descriptive panel for the current health state.
    #[must_use]
    pub fn panel(&self) -> &'static PanelContent {
        presentation::panel_for(self.state.healthy)
    }

    /// Apply a command that does not need the GPU. Returns whether display
    /// state changed.
    pub fn execute(&mut self, command: ViewCommand) -> bool {
        match command {
            ViewCommand::ShowHealthy => self.select_health(true),
            ViewCommand::ShowPathological => self.select_health(false),
            ViewCommand::ToggleRotation => {
                let _ = self.toggle_rotation();
                true
            }
            ViewCommand::RotateCamera { delta } => {
                self.composer.camera_mut().rotate(delta);
                false
            }
            ViewCommand::Zoom { delta } => {
                self.composer.camera_mut().zoom(delta);
                false
            }
        }
    }

    /// Switch the displayed kidney. Selecting the variant that is already
    /// shown (or already loading) does nothing. Returns whether a reload
    /// started.
    pub fn select_health(&mut self, healthy: bool) -> bool {
        let current = self.state.loading
            || self
                .composer
                .organ()
                .is_some_and(|organ| organ.healthy() == healthy);
        if healthy == self.state.healthy && current {
            return false;
        }
        self.begin_load(healthy);
        true
    }

    /// Flip the turntable flag. Returns the new value.
    pub fn toggle_rotation(&mut self) -> bool {
        self.state.rotating = !self.state.rotating;
        log::info!(
            "rotation {}",
            if self.state.rotating { "on" } else { "off" }
        );
        self.state.rotating
    }

    /// Turn the organ by one fixed step if rotation is on.
    pub fn advance_rotation(&mut self) {
        if !self.state.rotating {
            return;
        }
        let step = self.rotation_step;
        if let Some(organ) = self.composer.organ_mut() {
            organ.rotate_y(step);
        }
    }

    /// Apply edited display options: rotation step, colors and material
    /// parameters take effect on the attached organ and on later fallbacks.
    pub fn set_display(&mut self, display: &DisplayOptions) {
        self.rotation_step = display.rotation_step;
        self.fallback = FallbackBuilder::new(display);
        self.composer.set_palette(display);
    }

    /// Track a new viewport size. Zero dimensions are ignored. Returns
    /// whether the size was applied.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 {
            return false;
        }
        self.viewport = (width, height);
        self.composer.camera_mut().resize(width, height);
        true
    }

    /// Apply every finished load. Returns whether an outcome reached the
    /// scene.
    pub fn poll_loads(&mut self) -> bool {
        let mut applied = false;
        while let Some(outcome) = self.worker.try_recv() {
            applied |= self.apply_outcome(outcome);
        }
        applied
    }

    /// Attach a load outcome if it belongs to the current generation.
    /// Failures show the procedural stand-in. Returns whether the outcome
    /// was applied.
    pub fn apply_outcome(&mut self, outcome: LoadOutcome) -> bool {
        if outcome.generation != self.generation {
            log::debug!(
                "discarding stale load of {} (generation {}, current {})",
                outcome.url,
                outcome.generation,
                self.generation
            );
            return false;
        }

        let node = match outcome.result {
            Ok(node) => {
                log::info!("loaded {}", outcome.url);
                node
            }
            Err(e) => {
                log::warn!("{e}; showing procedural stand-in");
                self.fallback.build(outcome.healthy)
            }
        };
        let _ = self.composer.display(node, outcome.healthy);
        self.state.loading = false;
        true
    }

    /// Poll until the current load settles or `timeout` elapses. Returns
    /// whether loading finished.
    pub fn wait_for_load(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            let _ = self.poll_loads();
            if !self.state.loading {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    /// Stop the load worker and detach the organ. Idempotent.
    pub fn shutdown(&mut self) {
        self.worker.shutdown();
        let _ = self.composer.dispose_current();
    }

    fn begin_load(&mut self, healthy: bool) {
        self.state.healthy = healthy;
        self.state.loading = true;
        self.generation += 1;
        let _ = self.composer.dispose_current();

        let url = self.catalog.url_for(healthy);
        log::info!(
            "showing {} kidney (generation {})",
            self.state.variant_label(),
            self.generation
        );

        let submitted = self.catalog.format().and_then(|_| {
            self.worker.submit(LoadRequest {
                generation: self.generation,
                healthy,
                url: url.clone(),
            })
        });
        if let Err(e) = submitted {
            log::warn!("{url}: {e}; showing procedural stand-in");
            let node = self.fallback.build(healthy);
            let _ = self.composer.display(node, healthy);
            self.state.loading = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{mpsc, Mutex};

    use glam::{Mat4, Vec3};

    use super::*;
    use crate::loader::LoadError;
    use crate::scene::composer::RELEASE_QUEUE_LIMIT;
    use crate::scene::mesh_gen::uv_sphere;
    use crate::scene::{Material, Mesh, MeshRole, SceneNode, Transform};

    const SETTLE: Duration = Duration::from_secs(5);

    /// Serves fixed scenes by URL; everything else is missing.
    #[derive(Default)]
    struct ScriptedLoader {
        scenes: HashMap<String, SceneNode>,
        calls: AtomicUsize,
    }

    impl ScriptedLoader {
        fn with(mut self, url: &str, node: SceneNode) -> Self {
            let _ = self.scenes.insert(url.to_owned(), node);
            self
        }
    }

    impl AssetLoader for ScriptedLoader {
        fn load(&self, url: &str) -> Result<SceneNode, LoadError> {
            let _ = self.calls.fetch_add(1, Ordering::SeqCst);
            self.scenes
                .get(url)
                .cloned()
                .ok_or_else(|| LoadError::NotFound(url.to_owned()))
        }
    }

    /// Panics on the healthy model, serves the polycystic one.
    struct PanickingLoader;

    impl AssetLoader for PanickingLoader {
        fn load(&self, url: &str) -> Result<SceneNode, LoadError> {
            if url.ends_with("human_kidney.glb") {
                panic!("corrupt accessor in {url}");
            }
            Ok(asset())
        }
    }

    /// Serves [`asset`] for every URL, but holds polycystic loads until the
    /// test releases them, so two loads can be made to overlap.
    struct GatedLoader {
        started: Mutex<mpsc::Sender<String>>,
        release: Mutex<mpsc::Receiver<()>>,
        calls: AtomicUsize,
    }

    impl AssetLoader for GatedLoader {
        fn load(&self, url: &str) -> Result<SceneNode, LoadError> {
            let _ = self.calls.fetch_add(1, Ordering::SeqCst);
            if url.contains("polycystic") {
                let _ = self.started.lock().unwrap().send(url.to_owned());
                let _ = self
                    .release
                    .lock()
                    .unwrap()
                    .recv_timeout(Duration::from_secs(5));
            }
            Ok(asset())
        }
    }

    /// Two colorful body meshes far from the origin.
    fn asset() -> SceneNode {
        let sphere = Arc::new(uv_sphere(16, 8));
        let mut root = SceneNode::new("kidney")
            .transformed(Transform::from_translation(Vec3::new(30.0, 4.0, -2.0)));
        for (i, color) in [[0.1, 0.9, 0.1], [0.2, 0.2, 1.0]].into_iter().enumerate() {
            let mut mesh = Mesh::body(Arc::clone(&sphere));
            mesh.material = Material::flat(color, 5.0, 0.0);
            root.add_child(
                SceneNode::with_mesh(format!("lobe{i}"), mesh).transformed(
                    Transform::from_scale_translation(
                        Vec3::splat(10.0),
                        Vec3::new(i as f32 * 8.0, 0.0, 0.0),
                    ),
                ),
            );
        }
        root
    }

    fn options() -> Options {
        Options::default()
    }

    fn mount(loader: ScriptedLoader) -> (ViewController, Arc<ScriptedLoader>) {
        let loader = Arc::new(loader);
        let view = ViewController::new(&options(), loader.clone(), (800, 600))
            .unwrap();
        (view, loader)
    }

    fn body_colors(view: &ViewController) -> Vec<[f32; 3]> {
        let mut colors = Vec::new();
        view.composer()
            .organ()
            .unwrap()
            .root()
            .visit_meshes(Mat4::IDENTITY, &mut |mesh: &Mesh, _: Mat4| {
                if mesh.role == MeshRole::Body {
                    colors.push(mesh.material.color);
                }
            });
        colors
    }

    #[test]
    fn mount_with_missing_model_shows_healthy_fallback() {
        let (mut view, loader) = mount(ScriptedLoader::default());
        assert_eq!(view.state(), DisplayState::default());

        assert!(view.wait_for_load(SETTLE));
        let state = view.state();
        assert!(state.healthy && state.rotating && !state.loading);

        let organ = view.composer().organ().unwrap();
        assert_eq!(organ.root().count_role(MeshRole::Cyst), 0);
        assert_eq!(body_colors(&view), vec![DisplayOptions::default().healthy_color]);
        assert_eq!(loader.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn pathological_load_recolors_every_leaf() {
        let (mut view, _loader) = mount(
            ScriptedLoader::default()
                .with("assets/models/human_kidney.glb", asset())
                .with("assets/models/polycystic_kidney.glb", asset()),
        );
        assert!(view.wait_for_load(SETTLE));
        let first = view.composer().organ().unwrap().id();
        assert_eq!(
            body_colors(&view),
            vec![DisplayOptions::default().healthy_color; 2]
        );

        assert!(view.select_health(false));
        assert!(view.state().loading);
        assert!(!view.state().healthy);
        assert!(view.wait_for_load(SETTLE));

        assert!(!view.state().loading);
        let dark = DisplayOptions::default().pathological_color;
        assert_eq!(body_colors(&view), vec![dark; 2]);
        assert!(view.composer_mut().take_released().contains(&first));

        // loaded assets are normalized too
        let aabb = view.composer().organ().unwrap().bounds().unwrap();
        assert!((aabb.max_extent() - 2.0).abs() < 1e-3);
        assert!(aabb.center().length() < 1e-3);
    }

    #[test]
    fn pathological_fallback_has_three_cysts() {
        let (mut view, _loader) = mount(ScriptedLoader::default());
        assert!(view.wait_for_load(SETTLE));
        assert!(view.execute(ViewCommand::ShowPathological));
        assert!(view.wait_for_load(SETTLE));
        let organ = view.composer().organ().unwrap();
        assert_eq!(organ.root().count_role(MeshRole::Cyst), 3);
        assert!(!organ.healthy());
    }

    #[test]
    fn reselecting_current_variant_is_a_noop() {
        let (mut view, loader) = mount(ScriptedLoader::default());
        // still loading the healthy model
        assert!(!view.select_health(true));
        assert!(view.wait_for_load(SETTLE));
        let generation = view.generation();
        assert!(!view.select_health(true));
        assert_eq!(view.generation(), generation);
        assert_eq!(loader.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn stale_outcome_is_discarded() {
        let (mut view, _loader) = mount(ScriptedLoader::default());
        assert!(view.wait_for_load(SETTLE));
        let stale_generation = view.generation();

        assert!(view.select_health(false));
        let applied = view.apply_outcome(LoadOutcome {
            generation: stale_generation,
            healthy: true,
            url: "assets/models/human_kidney.glb".into(),
            result: Ok(asset()),
        });
        assert!(!applied);
        assert!(view.state().loading);
        assert!(view.composer().organ().is_none());

        assert!(view.wait_for_load(SETTLE));
        assert!(!view.composer().organ().unwrap().healthy());
    }

    #[test]
    fn loader_panic_falls_back_and_later_loads_still_run() {
        let mut view = ViewController::new(
            &options(),
            Arc::new(PanickingLoader),
            (800, 600),
        )
        .unwrap();
        assert!(view.wait_for_load(SETTLE));
        let organ = view.composer().organ().unwrap();
        assert!(organ.healthy());
        assert_eq!(organ.root().count_role(MeshRole::Indentation), 1);

        assert!(view.select_health(false));
        assert!(view.wait_for_load(SETTLE));
        let organ = view.composer().organ().unwrap();
        assert!(!organ.healthy());
        // the real asset, not the stand-in
        assert_eq!(organ.root().count_role(MeshRole::Indentation), 0);
    }

    #[test]
    fn stopped_worker_falls_back_synchronously() {
        let (mut view, loader) = mount(ScriptedLoader::default());
        assert!(view.wait_for_load(SETTLE));
        view.shutdown();

        assert!(view.select_health(false));
        assert!(!view.state().loading);
        let organ = view.composer().organ().unwrap();
        assert!(!organ.healthy());
        assert_eq!(organ.root().count_role(MeshRole::Cyst), 3);
        assert_eq!(loader.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn overlapping_loads_apply_only_the_latest() {
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let loader = Arc::new(GatedLoader {
            started: Mutex::new(started_tx),
            release: Mutex::new(release_rx),
            calls: AtomicUsize::new(0),
        });
        let mut view =
            ViewController::new(&options(), loader.clone(), (800, 600)).unwrap();
        assert!(view.wait_for_load(SETTLE));

        // pathological load is in flight when healthy is selected again
        assert!(view.select_health(false));
        let url = started_rx.recv_timeout(SETTLE).unwrap();
        assert!(url.ends_with("polycystic_kidney.glb"));
        assert!(view.select_health(true));
        let latest = view.generation();
        release_tx.send(()).unwrap();

        let deadline = Instant::now() + SETTLE;
        while view.state().loading {
            let _ = view.poll_loads();
            if let Some(organ) = view.composer().organ() {
                assert!(organ.healthy(), "superseded load reached the scene");
            }
            assert!(Instant::now() < deadline, "load never settled");
            std::thread::sleep(Duration::from_millis(1));
        }

        assert_eq!(view.generation(), latest);
        assert!(view.state().healthy);
        assert!(view.composer().organ().unwrap().healthy());
        assert_eq!(
            body_colors(&view),
            vec![DisplayOptions::default().healthy_color; 2]
        );
        assert_eq!(loader.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn toggle_cycles_keep_a_single_organ() {
        let (mut view, _loader) = mount(
            ScriptedLoader::default()
                .with("assets/models/polycystic_kidney.glb", asset()),
        );
        assert!(view.wait_for_load(SETTLE));
        for _ in 0..10 {
            assert!(view.select_health(false));
            assert!(view.wait_for_load(SETTLE));
            assert!(view.select_health(true));
            assert!(view.wait_for_load(SETTLE));
        }
        assert!(view.composer().organ().is_some());
        assert_eq!(view.composer().disposed_count(), 20);
        assert_eq!(
            view.composer_mut().take_released().len(),
            RELEASE_QUEUE_LIMIT
        );
        assert_eq!(view.composer().pending_release_count(), 0);
    }

    #[test]
    fn unsupported_extension_skips_the_loader() {
        let mut opts = options();
        opts.assets.extension = "obj".into();
        let loader = Arc::new(ScriptedLoader::default());
        let mut view =
            ViewController::new(&opts, loader.clone(), (640, 480)).unwrap();

        // fallback attached synchronously
        assert!(!view.state().loading);
        assert!(view.composer().organ().is_some());
        assert!(view.select_health(false));
        assert!(!view.state().loading);
        assert_eq!(view.composer().organ().unwrap().root().count_role(MeshRole::Cyst), 3);

        view.shutdown();
        assert_eq!(loader.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn resize_sets_aspect_and_viewport_exactly() {
        let (mut view, _loader) = mount(ScriptedLoader::default());
        assert!(view.resize(1280, 720));
        assert_eq!(view.viewport(), (1280, 720));
        assert_eq!(view.composer().camera().camera.aspect, 1280.0 / 720.0);

        assert!(!view.resize(0, 720));
        assert_eq!(view.viewport(), (1280, 720));
    }

    #[test]
    fn rotation_only_advances_when_enabled() {
        let (mut view, _loader) = mount(ScriptedLoader::default());
        assert!(view.wait_for_load(SETTLE));
        let step = options().display.rotation_step;

        view.advance_rotation();
        let yaw = view.composer().organ().unwrap().yaw();
        assert!((yaw - step).abs() < 1e-6);

        assert!(!view.toggle_rotation());
        view.advance_rotation();
        assert_eq!(view.composer().organ().unwrap().yaw(), yaw);
    }

    #[test]
    fn display_edits_reach_the_attached_organ() {
        let (mut view, _loader) = mount(ScriptedLoader::default());
        assert!(view.wait_for_load(SETTLE));
        let id = view.composer().organ().unwrap().id();

        let display = DisplayOptions {
            healthy_color: [0.1, 0.9, 0.1],
            rotation_step: 0.02,
            ..DisplayOptions::default()
        };
        view.set_display(&display);

        let organ = view.composer().organ().unwrap();
        assert_eq!(organ.id(), id);
        organ.root().visit_meshes(Mat4::IDENTITY, &mut |mesh: &Mesh, _: Mat4| {
            if mesh.role == MeshRole::Body {
                assert_eq!(mesh.material.color, [0.1, 0.9, 0.1]);
            }
        });

        view.advance_rotation();
        let yaw = view.composer().organ().unwrap().yaw();
        assert!((yaw - 0.02).abs() < 1e-6);
    }

    #[test]
    fn panel_follows_health() {
        let (mut view, _loader) = mount(ScriptedLoader::default());
        assert_eq!(view.panel(), presentation::panel_for(true));
        let _ = view.select_health(false);
        assert_eq!(view.panel(), presentation::panel_for(false));
    }

    #[test]
    fn shutdown_detaches_and_is_idempotent() {
        let (mut view, _loader) = mount(ScriptedLoader::default());
        assert!(view.wait_for_load(SETTLE));
        view.shutdown();
        view.shutdown();
        assert!(view.composer().organ().is_none());
    }
}
