//! Native-side GUI layer: a wry webview showing the description panel and
//! the three view controls.
//!
//! The webview is created as a child of the winit window and talks to the
//! engine through a minimal JSON IPC bridge.

/// Owns the webview and keeps it in sync with the engine.
pub(crate) mod panel;
/// Wry webview creation, IPC parsing, and push helpers.
pub(crate) mod webview;

/// Prepare the platform toolkit wry needs. On Linux that is GTK.
pub(crate) fn init_platform() -> Result<(), String> {
    #[cfg(target_os = "linux")]
    gtk::init().map_err(|e| e.to_string())?;
    Ok(())
}

/// Run pending toolkit events so the webview repaints and delivers IPC
/// while winit owns the event loop.
pub(crate) fn pump_platform_events() {
    #[cfg(target_os = "linux")]
    while gtk::events_pending() {
        let _ = gtk::main_iteration_do(false);
    }
}
