//! Wry webview child of the winit window.
//!
//! The page is a static HTML shell: three buttons plus an empty panel
//! container. The native side fills the container with
//! [`PanelContent::to_html`](crate::presentation::PanelContent::to_html)
//! output and pushes display state; button clicks come back over IPC as
//! `{"action": "<tag>"}` messages. The display section of the options
//! schema is rendered as sliders whose edits come back as `set_option`
//! messages.

use std::sync::mpsc;

use wry::{dpi, Rect, WebView, WebViewBuilder};

use crate::engine::command::ViewCommand;
use crate::options::Options;
use crate::state::DisplayState;

/// Width of the panel in physical pixels.
pub(crate) const PANEL_WIDTH: u32 = 380;

/// Messages sent from the panel page to the native side.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum UiAction {
    /// A button press.
    Command(ViewCommand),
    /// Set a single option field: `options[section][field] = value`.
    SetOption {
        section: String,
        field: String,
        value: serde_json::Value,
    },
}

/// Create the wry webview as a child of the given window.
///
/// Returns `(webview, action_rx)`; the receiver yields the button presses
/// and option edits the panel sends.
pub(crate) fn create_webview<W: wry::raw_window_handle::HasWindowHandle>(
    window: &W,
    window_width: u32,
    window_height: u32,
) -> Result<(WebView, mpsc::Receiver<UiAction>), wry::Error> {
    let (tx, rx) = mpsc::channel();

    let webview = WebViewBuilder::new()
        .with_bounds(panel_bounds(window_width, window_height))
        .with_html(PAGE_HTML)
        .with_initialization_script(BRIDGE_JS)
        .with_ipc_handler(move |req| {
            match parse_action(req.body()) {
                Some(action) => {
                    let _ = tx.send(action);
                }
                None => log::debug!("ignored panel message {}", req.body()),
            }
        })
        .build_as_child(window)?;

    Ok((webview, rx))
}

/// Compute the [`Rect`] for the panel at the right edge of the window.
#[must_use]
pub(crate) fn panel_bounds(window_width: u32, window_height: u32) -> Rect {
    let x = window_width.saturating_sub(PANEL_WIDTH);
    Rect {
        position: dpi::Position::Physical(dpi::PhysicalPosition::new(
            x as i32, 0,
        )),
        size: dpi::Size::Physical(dpi::PhysicalSize::new(
            PANEL_WIDTH.min(window_width),
            window_height,
        )),
    }
}

/// Push the display flags so the page can highlight the active button.
pub(crate) fn push_state(webview: &WebView, state: &DisplayState) {
    let json = serde_json::to_string(state).unwrap_or_default();
    let _ = webview.evaluate_script(&format!(
        "window.__nephro_push_state({json})"
    ));
}

/// Replace the description panel body.
pub(crate) fn push_panel(webview: &WebView, html: &str) {
    let Ok(literal) = serde_json::to_string(html) else {
        return;
    };
    let _ = webview.evaluate_script(&format!(
        "window.__nephro_push_panel({literal})"
    ));
}

/// Push the options schema and current values so the page can build its
/// sliders. Call once after creation.
pub(crate) fn push_schema(webview: &WebView, options: &Options) {
    let Ok(schema) = serde_json::to_string(&Options::json_schema()) else {
        return;
    };
    let _ = webview.evaluate_script(&format!(
        "window.__nephro_push_schema({schema})"
    ));
    push_options(webview, options);
}

/// Push current option values to the sliders.
pub(crate) fn push_options(webview: &WebView, options: &Options) {
    let Ok(json) = serde_json::to_string(options) else {
        return;
    };
    let _ = webview.evaluate_script(&format!(
        "window.__nephro_push_options({json})"
    ));
}

/// Update the frame-rate readout.
pub(crate) fn push_fps(webview: &WebView, fps: f32) {
    let _ = webview
        .evaluate_script(&format!("window.__nephro_push_fps({fps:.0})"));
}

/// Parse an IPC message body. Unknown or malformed messages yield `None`.
fn parse_action(body: &str) -> Option<UiAction> {
    let msg = serde_json::from_str::<serde_json::Value>(body).ok()?;
    match msg.get("action")?.as_str()? {
        "set_option" => {
            let section = msg.get("section")?.as_str()?.to_owned();
            let field = msg.get("field")?.as_str()?.to_owned();
            let value = msg.get("value")?.clone();
            Some(UiAction::SetOption {
                section,
                field,
                value,
            })
        }
        tag => ViewCommand::from_action(tag).map(UiAction::Command),
    }
}

// ── Page ─────────────────────────────────────────────────────────────────

/// Functions the native side calls. Defined before page load so pushes
/// that race the document body are buffered and replayed.
const BRIDGE_JS: &str = r#"
(function() {
    var pending = { state: null, panel: null, schema: null, options: null };

    function renderSettings(root) {
        var props = pending.schema.properties.display.properties;
        var values = pending.options.display;
        root.innerHTML = '';
        Object.keys(props).forEach(function(field) {
            var p = props[field];
            if (p.type !== 'number' || p.minimum === undefined) { return; }
            var label = document.createElement('label');
            label.textContent = p.title || field;
            var input = document.createElement('input');
            input.type = 'range';
            input.min = p.minimum;
            input.max = p.maximum;
            input.step = p.step || 'any';
            input.value = values[field];
            input.addEventListener('input', function() {
                window.ipc.postMessage(JSON.stringify({
                    action: 'set_option', section: 'display',
                    field: field, value: Number(input.value)
                }));
            });
            label.appendChild(input);
            root.appendChild(label);
        });
    }

    function apply() {
        var panel = document.getElementById('panel');
        if (!panel) { return; }
        if (pending.panel !== null) { panel.innerHTML = pending.panel; }
        var settings = document.getElementById('settings');
        if (settings && pending.schema !== null && pending.options !== null) {
            renderSettings(settings);
        }
        if (pending.state !== null) {
            var s = pending.state;
            document.getElementById('btn-healthy')
                .classList.toggle('active', s.healthy);
            document.getElementById('btn-pathological')
                .classList.toggle('active', !s.healthy);
            document.getElementById('btn-rotation').textContent =
                s.rotating ? 'Pause rotation' : 'Resume rotation';
            document.getElementById('loading').hidden = !s.loading;
        }
    }

    window.__nephro_push_state = function(state) {
        pending.state = state;
        apply();
    };
    window.__nephro_push_panel = function(html) {
        pending.panel = html;
        apply();
    };
    window.__nephro_push_schema = function(schema) {
        pending.schema = schema;
        apply();
    };
    window.__nephro_push_options = function(options) {
        pending.options = options;
        apply();
    };
    window.__nephro_push_fps = function(fps) {
        var el = document.getElementById('fps');
        if (el) { el.textContent = fps + ' fps'; }
    };
    window.__nephro_send = function(action) {
        window.ipc.postMessage(JSON.stringify({ action: action }));
    };
    document.addEventListener('DOMContentLoaded', apply);
})();
"#;

const PAGE_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<style>
  body { font-family: sans-serif; margin: 0; padding: 12px;
         background: #f7f8fa; color: #222; font-size: 14px; }
  .controls { display: flex; gap: 6px; margin-bottom: 12px; }
  button { flex: 1; padding: 6px; border: 1px solid #bbb;
           border-radius: 4px; background: #fff; cursor: pointer; }
  button.active { background: #c44; color: #fff; border-color: #a33; }
  .callout { border-left: 4px solid #69c; padding: 4px 8px;
             margin: 8px 0; background: #eef4fb; }
  .callout.warning { border-color: #d80; background: #fdf3e3; }
  #settings label { display: block; margin: 6px 0; font-size: 12px; }
  #settings input { width: 100%; }
  #status { display: flex; justify-content: space-between;
            color: #777; font-size: 12px; }
</style>
</head>
<body>
  <div class="controls">
    <button id="btn-healthy" onclick="__nephro_send('show_healthy')">Healthy</button>
    <button id="btn-pathological" onclick="__nephro_send('show_pathological')">Pathological</button>
    <button id="btn-rotation" onclick="__nephro_send('toggle_rotation')">Pause rotation</button>
  </div>
  <div id="status"><span id="loading">Loading model…</span><span id="fps"></span></div>
  <div id="panel"></div>
  <div id="settings"></div>
</body>
</html>
"#;
