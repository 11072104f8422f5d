//! The wgpu-backed viewer engine.
//!
//! [`KidneyEngine`] owns the GPU context, the camera and lighting bindings
//! and the organ renderer, and drives a [`ViewController`] through the
//! [`FrameLoop`]. It is windowing-agnostic: anything that can produce a
//! [`wgpu::SurfaceTarget`] can host it.

/// The viewer's interactive vocabulary.
pub mod command;
mod input;
mod render;

use std::sync::Arc;

use self::command::ViewCommand;
use crate::controller::ViewController;
use crate::error::NephroError;
use crate::gpu::camera::CameraBinding;
use crate::gpu::lighting::Lighting;
use crate::gpu::render_context::RenderContext;
use crate::input::InputProcessor;
use crate::loader::{AssetLoader, GltfLoader};
use crate::options::{DisplayOptions, Options};
use crate::presentation::PanelContent;
use crate::render_loop::FrameLoop;
use crate::renderer::OrganRenderer;
use crate::state::DisplayState;
use crate::util::frame_timing::FrameTiming;

/// Renders the kidney comparison into a window surface.
///
/// ```ignore
/// let mut engine = pollster::block_on(KidneyEngine::new(
///     window.clone(),
///     (width, height),
///     Options::default(),
/// ))?;
/// engine.execute(ViewCommand::ShowPathological);
/// engine.update();
/// engine.render()?;
/// ```
pub struct KidneyEngine {
    context: RenderContext,
    camera: CameraBinding,
    lighting: Lighting,
    organ_renderer: OrganRenderer,
    view: ViewController,
    frame_loop: FrameLoop,
    input: InputProcessor,
    options: Options,
    clear_color: wgpu::Color,
    /// Smoothed frame rate.
    pub frame_timing: FrameTiming,
    torn_down: bool,
}

impl KidneyEngine {
    /// Create the engine with the glTF loader and start loading the
    /// healthy model.
    ///
    /// # Errors
    ///
    /// Returns [`NephroError::Gpu`] if no usable GPU surface/device can be
    /// created and [`NephroError::ThreadSpawn`] if the load worker fails to
    /// start.
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        size: (u32, u32),
        options: Options,
    ) -> Result<Self, NephroError> {
        Self::with_loader(window, size, options, Arc::new(GltfLoader::new()))
            .await
    }

    /// Create the engine with a custom asset loader.
    ///
    /// # Errors
    ///
    /// Same as [`new`](Self::new).
    pub async fn with_loader(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        size: (u32, u32),
        options: Options,
        loader: Arc<dyn AssetLoader>,
    ) -> Result<Self, NephroError> {
        let context = RenderContext::new(window, size).await?;
        let view = ViewController::new(&options, loader, context.size())?;

        let camera =
            CameraBinding::new(&context, &view.composer().camera().camera);
        let lighting = Lighting::new(&context, view.composer().lighting());
        let organ_renderer =
            OrganRenderer::new(&context, &camera.layout, &lighting.layout);

        let clear_color = clear_color(&options.display);

        Ok(Self {
            context,
            camera,
            lighting,
            organ_renderer,
            view,
            frame_loop: FrameLoop::new(),
            input: InputProcessor::with_key_bindings(options.keybindings.clone()),
            options,
            clear_color,
            frame_timing: FrameTiming::new(),
            torn_down: false,
        })
    }

    /// Current display flags.
    #[must_use]
    pub fn state(&self) -> DisplayState {
        self.view.state()
    }

    /// Descriptive panel for the current health state.
    #[must_use]
    pub fn panel(&self) -> &'static PanelContent {
        self.view.panel()
    }

    /// The view controller (organ slot, camera, load state).
    #[must_use]
    pub fn view(&self) -> &ViewController {
        &self.view
    }

    /// Current options.
    #[must_use]
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Replace the options. Display settings apply to the attached organ
    /// at once; camera, lighting and asset settings are read at startup
    /// only.
    pub fn set_options(&mut self, options: Options) {
        self.view.set_display(&options.display);
        self.clear_color = clear_color(&options.display);
        self.options = options;
    }

    /// Set one option field from a panel edit. Invalid edits are logged
    /// and ignored. Returns whether the options changed.
    pub fn set_option(
        &mut self,
        section: &str,
        field: &str,
        value: serde_json::Value,
    ) -> bool {
        match self.options.with_field(section, field, value) {
            Ok(options) if options != self.options => {
                self.set_options(options);
                true
            }
            Ok(_) => false,
            Err(e) => {
                log::warn!("rejected option edit: {e}");
                false
            }
        }
    }

    /// Apply a command from any source (keys, mouse, panel). Returns
    /// whether display state changed.
    pub fn execute(&mut self, command: ViewCommand) -> bool {
        log::debug!("execute {command:?}");
        self.view.execute(command)
    }

    /// Reconfigure the surface, depth buffer and camera aspect for a new
    /// window size. Zero dimensions are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if self.view.resize(width, height) {
            self.context.resize(width, height);
        }
    }

    /// Tear down in order: stop the frame loop, join the load worker,
    /// release organ GPU buffers. The surface and device go with `self`.
    /// Idempotent; also runs on drop.
    pub fn shutdown(&mut self) {
        if self.torn_down {
            return;
        }
        self.frame_loop.cancel();
        self.view.shutdown();
        self.organ_renderer.release();
        self.torn_down = true;
        log::info!(
            "viewer shut down after {} frames",
            self.frame_loop.frames()
        );
    }
}

fn clear_color(display: &DisplayOptions) -> wgpu::Color {
    let [r, g, b] = display.background;
    wgpu::Color {
        r: f64::from(r),
        g: f64::from(g),
        b: f64::from(b),
        a: 1.0,
    }
}

impl Drop for KidneyEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}
