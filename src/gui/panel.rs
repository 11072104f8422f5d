//! GUI panel controller: owns the wry webview and what was last pushed to
//! it, so `ViewerApp` holds one field instead of several
//! `#[cfg(feature = "gui")]` ones.

use std::sync::mpsc;
use std::time::{Duration, Instant};

use winit::window::Window;

use super::webview::{self, UiAction};
use crate::state::DisplayState;
use crate::KidneyEngine;

/// How often the FPS readout is refreshed.
const STATS_INTERVAL: Duration = Duration::from_millis(250);

/// Owns the webview panel and its sync state.
pub(crate) struct PanelController {
    webview: Option<wry::WebView>,
    action_rx: Option<mpsc::Receiver<UiAction>>,
    last_stats_push: Instant,
    /// State last pushed; `None` forces a full push.
    pushed: Option<DisplayState>,
}

impl PanelController {
    /// Controller with no webview yet.
    pub(crate) fn new() -> Self {
        Self {
            webview: None,
            action_rx: None,
            last_stats_push: Instant::now(),
            pushed: None,
        }
    }

    /// Create the webview and push the options schema to it. On failure
    /// the viewer continues without the panel; keys still work.
    pub(crate) fn init_webview(
        &mut self,
        window: &Window,
        width: u32,
        height: u32,
        engine: &KidneyEngine,
    ) {
        if let Err(e) = super::init_platform() {
            log::error!("Failed to initialize GTK: {e}");
            return;
        }
        match webview::create_webview(window, width, height) {
            Ok((wv, rx)) => {
                webview::push_schema(&wv, engine.options());
                self.webview = Some(wv);
                self.action_rx = Some(rx);
                self.pushed = None;
            }
            Err(e) => {
                log::error!("Failed to create webview: {e}");
            }
        }
    }

    /// Keep the panel glued to the right edge.
    pub(crate) fn apply_layout(&self, window: &Window) {
        let Some(ref wv) = self.webview else {
            return;
        };
        let inner = window.inner_size();
        let _ =
            wv.set_bounds(webview::panel_bounds(inner.width, inner.height));
    }

    /// Pump the toolkit and apply every button press and option edit to
    /// the engine. Returns whether anything changed.
    pub(crate) fn drain_and_apply(&mut self, engine: &mut KidneyEngine) -> bool {
        super::pump_platform_events();
        let Some(ref rx) = self.action_rx else {
            return false;
        };
        let mut changed = false;
        while let Ok(action) = rx.try_recv() {
            changed |= match action {
                UiAction::Command(command) => engine.execute(command),
                UiAction::SetOption {
                    section,
                    field,
                    value,
                } => engine.set_option(&section, &field, value),
            };
        }
        changed
    }

    /// Push state and panel HTML if the display state moved since the
    /// last push. The panel text only changes with `healthy`.
    pub(crate) fn sync(&mut self, engine: &KidneyEngine) {
        let Some(ref wv) = self.webview else {
            return;
        };
        let state = engine.state();
        if self.pushed == Some(state) {
            return;
        }
        if self.pushed.map(|p| p.healthy) != Some(state.healthy) {
            webview::push_panel(wv, &engine.panel().to_html());
        }
        webview::push_state(wv, &state);
        self.pushed = Some(state);
    }

    /// Push the FPS readout at ~4 Hz.
    pub(crate) fn push_stats_if_due(
        &mut self,
        now: Instant,
        engine: &KidneyEngine,
    ) {
        let Some(ref wv) = self.webview else {
            return;
        };
        if now.duration_since(self.last_stats_push) >= STATS_INTERVAL {
            webview::push_fps(wv, engine.frame_timing.fps());
            self.last_stats_push = now;
        }
    }
}
