//! User-facing display state.

use serde::Serialize;

/// The three display flags: which kidney is shown, whether it spins, and
/// whether a model load is in flight.
///
/// `healthy` and `rotating` are orthogonal; only a `healthy` change
/// triggers a reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DisplayState {
    /// `true` for the healthy kidney, `false` for the polycystic one.
    pub healthy: bool,
    /// Whether the organ turns a fixed step every frame.
    pub rotating: bool,
    /// Whether a (re)load is still pending.
    pub loading: bool,
}

impl Default for DisplayState {
    fn default() -> Self {
        Self {
            healthy: true,
            rotating: true,
            loading: true,
        }
    }
}

impl DisplayState {
    /// Short label for the current health variant, used in logs and the
    /// window title.
    #[must_use]
    pub fn variant_label(&self) -> &'static str {
        if self.healthy {
            "healthy"
        } else {
            "polycystic"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_mount_state() {
        let state = DisplayState::default();
        assert!(state.healthy);
        assert!(state.rotating);
        assert!(state.loading);
    }

    #[test]
    fn serializes_flags_for_panel() {
        let json = serde_json::to_value(DisplayState::default()).unwrap();
        assert_eq!(json["healthy"], true);
        assert_eq!(json["rotating"], true);
        assert_eq!(json["loading"], true);
    }
}
