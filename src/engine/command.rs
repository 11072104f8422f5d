//! The viewer's complete interactive vocabulary.
//!
//! Every user-facing operation, whether triggered by a key press, a mouse
//! gesture or a panel button, is represented as a `ViewCommand`.
//! Consumers construct commands and pass them to
//! [`KidneyEngine::execute`](super::KidneyEngine::execute) (or
//! [`ViewController::execute`](crate::controller::ViewController::execute)
//! when running headless).

use glam::Vec2;

/// A discrete or parameterized operation the viewer can perform.
///
/// ```ignore
/// engine.execute(ViewCommand::ShowPathological);
/// engine.execute(ViewCommand::Zoom { delta: 1.0 });
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewCommand {
    // ── Organ ───────────────────────────────────────────────────────
    /// Switch to the healthy kidney.
    ShowHealthy,

    /// Switch to the polycystic kidney.
    ShowPathological,

    /// Start or stop the turntable rotation.
    ToggleRotation,

    // ── Camera ──────────────────────────────────────────────────────
    /// Orbit the camera by `delta` pixels of mouse movement.
    RotateCamera {
        /// Horizontal and vertical drag delta.
        delta: Vec2,
    },

    /// Zoom the camera (positive = zoom in, negative = zoom out).
    Zoom {
        /// Scroll amount.
        delta: f32,
    },
}

impl ViewCommand {
    /// Parse a panel action name (`show_healthy`, `show_pathological`,
    /// `toggle_rotation`).
    #[must_use]
    pub fn from_action(action: &str) -> Option<Self> {
        match action {
            "show_healthy" => Some(Self::ShowHealthy),
            "show_pathological" => Some(Self::ShowPathological),
            "toggle_rotation" => Some(Self::ToggleRotation),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panel_actions_map_to_commands() {
        assert_eq!(
            ViewCommand::from_action("show_healthy"),
            Some(ViewCommand::ShowHealthy)
        );
        assert_eq!(
            ViewCommand::from_action("show_pathological"),
            Some(ViewCommand::ShowPathological)
        );
        assert_eq!(
            ViewCommand::from_action("toggle_rotation"),
            Some(ViewCommand::ToggleRotation)
        );
        assert_eq!(ViewCommand::from_action("explode"), None);
    }
}
