//! Standalone window backed by winit.
//!
//! When the `gui` feature is enabled, a wry webview panel with the
//! description text and the view controls overlays the right edge of the
//! window.
//!
//! ```no_run
//! # use nephroview::Viewer;
//! Viewer::builder()
//!     .with_title("Kidney comparison")
//!     .build()
//!     .run()
//!     .unwrap();
//! ```

use std::sync::Arc;
#[cfg(feature = "gui")]
use std::time::Instant;

use winit::{
    application::ApplicationHandler,
    event::{ElementState, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use crate::{
    error::NephroError, loader::AssetLoader, options::Options,
    render_loop::Reschedule, InputEvent, KidneyEngine, MouseButton,
};

// ── Builder ──────────────────────────────────────────────────────────────

/// Fluent builder for [`Viewer`].
pub struct ViewerBuilder {
    options: Option<Options>,
    title: Option<String>,
    loader: Option<Arc<dyn AssetLoader>>,
}

impl ViewerBuilder {
    /// Builder with default options, the glTF loader and a title that
    /// follows the panel.
    fn new() -> Self {
        Self {
            options: None,
            title: None,
            loader: None,
        }
    }

    /// Override the default options.
    #[must_use]
    pub fn with_options(mut self, options: Options) -> Self {
        self.options = Some(options);
        self
    }

    /// Use a fixed window title instead of the panel title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Load models through a custom loader.
    #[must_use]
    pub fn with_loader(mut self, loader: Arc<dyn AssetLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Consume the builder and produce a [`Viewer`].
    #[must_use]
    pub fn build(self) -> Viewer {
        Viewer {
            options: self.options.unwrap_or_default(),
            title: self.title,
            loader: self.loader,
        }
    }
}

// ── Viewer ───────────────────────────────────────────────────────────────

/// A standalone window comparing the healthy and polycystic kidney.
///
/// Construct via [`Viewer::builder`], then call [`run`](Self::run) to
/// enter the event loop.
pub struct Viewer {
    options: Options,
    title: Option<String>,
    loader: Option<Arc<dyn AssetLoader>>,
}

impl Viewer {
    /// Start a new builder.
    #[must_use]
    pub fn builder() -> ViewerBuilder {
        ViewerBuilder::new()
    }

    /// Open the window and run the event loop. Blocks until the window is
    /// closed.
    ///
    /// # Errors
    ///
    /// Returns [`NephroError::Viewer`] if the event loop cannot be created
    /// or exits abnormally.
    pub fn run(self) -> Result<(), NephroError> {
        let event_loop = EventLoop::new()
            .map_err(|e| NephroError::Viewer(e.to_string()))?;
        event_loop.set_control_flow(ControlFlow::Wait);

        let mut app = ViewerApp {
            window: None,
            engine: None,
            options: Some(self.options),
            loader: self.loader,
            fixed_title: self.title,
            shown_title: String::new(),
            #[cfg(feature = "gui")]
            panel: crate::gui::panel::PanelController::new(),
        };

        event_loop
            .run_app(&mut app)
            .map_err(|e| NephroError::Viewer(e.to_string()))
    }
}

// ── Winit app ────────────────────────────────────────────────────────────

/// Internal winit application handler.
struct ViewerApp {
    window: Option<Arc<Window>>,
    engine: Option<KidneyEngine>,
    /// Taken when the engine is created.
    options: Option<Options>,
    loader: Option<Arc<dyn AssetLoader>>,
    fixed_title: Option<String>,
    shown_title: String,
    #[cfg(feature = "gui")]
    panel: crate::gui::panel::PanelController,
}

/// The wgpu surface always covers the full window; the panel overlays it.
fn viewport_size(inner: winit::dpi::PhysicalSize<u32>) -> (u32, u32) {
    (inner.width, inner.height)
}

impl ViewerApp {
    /// Title for the current state: the fixed one if set, otherwise the
    /// panel title with a loading marker.
    fn desired_title(&self, engine: &KidneyEngine) -> String {
        if let Some(title) = &self.fixed_title {
            return title.clone();
        }
        let title = engine.panel().title;
        if engine.state().loading {
            format!("{title} (loading…)")
        } else {
            title.to_owned()
        }
    }

    /// Reflect engine state in the window title and the panel.
    fn sync_chrome(&mut self) {
        let Some(engine) = &self.engine else {
            return;
        };
        let title = self.desired_title(engine);
        if title != self.shown_title {
            if let Some(window) = &self.window {
                window.set_title(&title);
            }
            self.shown_title = title;
        }
        #[cfg(feature = "gui")]
        self.panel.sync(engine);
    }

    fn request_redraw(&self) {
        if let Some(w) = &self.window {
            w.request_redraw();
        }
    }

    /// Shut the engine down in order and leave the event loop.
    fn teardown(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(mut engine) = self.engine.take() {
            engine.shutdown();
        }
        event_loop.exit();
    }

    fn redraw(&mut self) {
        #[cfg(feature = "gui")]
        if let Some(engine) = &mut self.engine {
            let _ = self.panel.drain_and_apply(engine);
        }

        let Some(engine) = &mut self.engine else {
            return;
        };
        let _ = engine.update();
        let reschedule = match engine.render() {
            Ok(reschedule) => reschedule,
            Err(wgpu::SurfaceError::Outdated | wgpu::SurfaceError::Lost) => {
                if let Some(w) = &self.window {
                    let (vp_w, vp_h) = viewport_size(w.inner_size());
                    engine.resize(vp_w, vp_h);
                }
                Reschedule::Next
            }
            Err(e) => {
                log::error!("render error: {e:?}");
                Reschedule::Next
            }
        };

        #[cfg(feature = "gui")]
        if let Some(engine) = &self.engine {
            self.panel.push_stats_if_due(Instant::now(), engine);
        }
        self.sync_chrome();

        if reschedule == Reschedule::Next {
            self.request_redraw();
        }
    }
}

impl ApplicationHandler for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let Some(options) = self.options.take() else {
            return;
        };

        let attrs = Window::default_attributes()
            .with_title(self.fixed_title.as_deref().unwrap_or("nephroview"))
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 800));

        let window = match event_loop.create_window(attrs) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                log::error!("Failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        let inner = window.inner_size();
        let size = viewport_size(inner);
        let engine_result = match self.loader.take() {
            Some(loader) => pollster::block_on(KidneyEngine::with_loader(
                window.clone(),
                size,
                options,
                loader,
            )),
            None => pollster::block_on(KidneyEngine::new(
                window.clone(),
                size,
                options,
            )),
        };

        let engine = match engine_result {
            Ok(e) => e,
            Err(e) => {
                log::error!("Failed to initialize engine: {e}");
                event_loop.exit();
                return;
            }
        };

        #[cfg(feature = "gui")]
        self.panel
            .init_webview(window.as_ref(), inner.width, inner.height, &engine);

        window.request_redraw();
        self.window = Some(window);
        self.engine = Some(engine);
        self.sync_chrome();
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _id: WindowId,
        event: WindowEvent,
    ) {
        if matches!(event, WindowEvent::CloseRequested) {
            self.teardown(event_loop);
            return;
        }

        // Guard: both window and engine must be initialised.
        if self.window.is_none() || self.engine.is_none() {
            return;
        }

        match event {
            WindowEvent::Resized(event_size) => {
                let (vp_w, vp_h) = viewport_size(event_size);
                if let Some(engine) = &mut self.engine {
                    engine.resize(vp_w, vp_h);
                }
                #[cfg(feature = "gui")]
                if let Some(window) = &self.window {
                    self.panel.apply_layout(window);
                }
                self.request_redraw();
            }

            WindowEvent::RedrawRequested => self.redraw(),

            WindowEvent::MouseInput { button, state, .. } => {
                let pressed = state == ElementState::Pressed;
                if let Some(engine) = &mut self.engine {
                    let _ = engine.handle_input(InputEvent::MouseButton {
                        button: MouseButton::from(button),
                        pressed,
                    });
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                if let Some(engine) = &mut self.engine {
                    let _ = engine.handle_input(InputEvent::CursorMoved {
                        x: position.x as f32,
                        y: position.y as f32,
                    });
                }
            }

            WindowEvent::CursorLeft { .. } => {
                if let Some(engine) = &mut self.engine {
                    let _ = engine.handle_input(InputEvent::CursorLeft);
                }
            }

            WindowEvent::MouseWheel { delta, .. } => {
                let scroll_delta = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 * 0.01,
                };
                if let Some(engine) = &mut self.engine {
                    let _ = engine.handle_input(InputEvent::Scroll {
                        delta: scroll_delta,
                    });
                }
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if event.state != ElementState::Pressed || event.repeat {
                    return;
                }
                use winit::keyboard::PhysicalKey;
                let PhysicalKey::Code(code) = event.physical_key else {
                    return;
                };
                let key_str = format!("{code:?}");
                if let Some(engine) = &mut self.engine {
                    if engine.handle_key(&key_str) {
                        self.sync_chrome();
                    }
                }
            }

            _ => (),
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(mut engine) = self.engine.take() {
            engine.shutdown();
        }
    }
}
