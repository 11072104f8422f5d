//! Converts raw platform events into view commands.
//!
//! The `InputProcessor` owns the transient pointer state (cursor position,
//! drag tracking) and the key-binding map. It sits between raw window
//! events and [`KidneyEngine::execute`](crate::KidneyEngine::execute).

use std::collections::HashMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::event::{InputEvent, MouseButton};
use crate::engine::command::ViewCommand;

/// Maps physical key strings to [`ViewCommand`] variants.
///
/// Key strings use the `winit::keyboard::KeyCode` debug format:
/// `"KeyH"`, `"Space"`, `"Escape"`, etc.
///
/// Only discrete commands can be key-bound; camera motion comes from the
/// mouse.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct KeyBindings {
    /// Forward map: key string → command tag.
    bindings: HashMap<String, KeyCommandTag>,
}

/// Serializable tag for the key-bindable subset of [`ViewCommand`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyCommandTag {
    /// Switch to the healthy kidney.
    ShowHealthy,
    /// Switch to the polycystic kidney.
    ShowPathological,
    /// Start or stop the turntable rotation.
    ToggleRotation,
}

impl KeyCommandTag {
    fn to_command(self) -> ViewCommand {
        match self {
            Self::ShowHealthy => ViewCommand::ShowHealthy,
            Self::ShowPathological => ViewCommand::ShowPathological,
            Self::ToggleRotation => ViewCommand::ToggleRotation,
        }
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        let bindings = HashMap::from([
            ("KeyH".into(), KeyCommandTag::ShowHealthy),
            ("KeyP".into(), KeyCommandTag::ShowPathological),
            ("KeyR".into(), KeyCommandTag::ToggleRotation),
        ]);
        Self { bindings }
    }
}

impl KeyBindings {
    /// Look up the command for a physical key string.
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<ViewCommand> {
        self.bindings.get(key).map(|tag| tag.to_command())
    }

    /// Bind `key` to `tag`, returning the tag it replaces.
    pub fn bind(
        &mut self,
        key: impl Into<String>,
        tag: KeyCommandTag,
    ) -> Option<KeyCommandTag> {
        self.bindings.insert(key.into(), tag)
    }
}

/// Converts raw window events into [`ViewCommand`]s.
///
/// A left-button drag orbits the camera; the wheel zooms.
///
/// ```ignore
/// if let Some(cmd) = input.handle_event(event) {
///     engine.execute(cmd);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct InputProcessor {
    cursor: Option<Vec2>,
    dragging: bool,
    key_bindings: KeyBindings,
}

impl Default for InputProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl InputProcessor {
    /// Create a new processor with default key bindings.
    #[must_use]
    pub fn new() -> Self {
        Self::with_key_bindings(KeyBindings::default())
    }

    /// Create a processor with custom key bindings.
    #[must_use]
    pub fn with_key_bindings(key_bindings: KeyBindings) -> Self {
        Self {
            cursor: None,
            dragging: false,
            key_bindings,
        }
    }

    /// Whether a left-button drag is in progress.
    #[must_use]
    pub fn dragging(&self) -> bool {
        self.dragging
    }

    /// Read-only access to the key bindings.
    #[must_use]
    pub fn key_bindings(&self) -> &KeyBindings {
        &self.key_bindings
    }

    /// Look up a key press and return the corresponding command, if bound.
    #[must_use]
    pub fn handle_key_press(&self, key: &str) -> Option<ViewCommand> {
        self.key_bindings.lookup(key)
    }

    /// Process a raw input event and return zero or one commands.
    pub fn handle_event(&mut self, event: InputEvent) -> Option<ViewCommand> {
        match event {
            InputEvent::CursorMoved { x, y } => {
                let pos = Vec2::new(x, y);
                let previous = self.cursor.replace(pos);
                match previous {
                    Some(prev) if self.dragging => {
                        let delta = pos - prev;
                        (delta != Vec2::ZERO)
                            .then_some(ViewCommand::RotateCamera { delta })
                    }
                    _ => None,
                }
            }
            InputEvent::MouseButton {
                button: MouseButton::Left,
                pressed,
            } => {
                self.dragging = pressed;
                None
            }
            InputEvent::MouseButton { .. } => None,
            InputEvent::Scroll { delta } => {
                (delta != 0.0).then_some(ViewCommand::Zoom { delta })
            }
            InputEvent::CursorLeft => {
                self.dragging = false;
                self.cursor = None;
                None
            }
        }
    }
}
