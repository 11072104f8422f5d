//! Centralized viewer options with TOML preset support.
//!
//! All tweakable settings (camera, lighting, organ colors, asset location,
//! keybindings) are consolidated here. Options serialize to/from TOML so a
//! preset file can be passed to the binary. The `display` section is also
//! described by a JSON Schema the GUI panel turns into live sliders; the
//! other sections are fixed for the lifetime of a viewer.

mod assets;
mod camera;
mod display;
mod lighting;

use std::path::Path;

pub use assets::AssetOptions;
pub use camera::CameraOptions;
pub use display::DisplayOptions;
pub use lighting::LightingOptions;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::NephroError;
use crate::input::KeyBindings;

/// Top-level options container. All sub-structs use `#[serde(default)]` so
/// partial TOML files (e.g. only overriding `[display]`) work correctly.
#[derive(
    Debug, Clone, Serialize, Deserialize, PartialEq, Default, JsonSchema,
)]
#[serde(default)]
pub struct Options {
    /// Camera projection and orbit parameters.
    #[schemars(skip)]
    pub camera: CameraOptions,
    /// Ambient and directional light parameters.
    #[schemars(skip)]
    pub lighting: LightingOptions,
    /// Organ colors, materials and rotation speed.
    pub display: DisplayOptions,
    /// Where the kidney models live.
    #[schemars(skip)]
    pub assets: AssetOptions,
    /// Keyboard binding options.
    #[schemars(skip)]
    pub keybindings: KeyBindings,
}

impl Options {
    /// Copy with `options[section][field] = value`, the way the panel
    /// edits a single slider.
    ///
    /// # Errors
    ///
    /// Returns [`NephroError::OptionsParse`] if `section` does not exist
    /// or `value` has the wrong type for `field`.
    pub fn with_field(
        &self,
        section: &str,
        field: &str,
        value: serde_json::Value,
    ) -> Result<Self, NephroError> {
        let mut root = serde_json::to_value(self)
            .map_err(|e| NephroError::OptionsParse(e.to_string()))?;
        let Some(serde_json::Value::Object(fields)) = root.get_mut(section)
        else {
            return Err(NephroError::OptionsParse(format!(
                "unknown options section {section:?}"
            )));
        };
        let _ = fields.insert(field.to_owned(), value);
        serde_json::from_value(root)
            .map_err(|e| NephroError::OptionsParse(format!("{section}.{field}: {e}")))
    }

    /// Generate JSON Schema describing the UI-exposed options.
    #[must_use]
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(Options)
    }

    /// Load options from a TOML file. Missing fields use defaults.
    ///
    /// # Errors
    ///
    /// Returns [`NephroError::Io`] if the file cannot be read and
    /// [`NephroError::OptionsParse`] if it is not valid options TOML.
    pub fn load(path: &Path) -> Result<Self, NephroError> {
        let content = std::fs::read_to_string(path).map_err(NephroError::Io)?;
        Self::from_toml(&content)
    }

    /// Parse options from a TOML string. Missing fields use defaults.
    ///
    /// # Errors
    ///
    /// Returns [`NephroError::OptionsParse`] on malformed TOML.
    pub fn from_toml(content: &str) -> Result<Self, NephroError> {
        toml::from_str(content)
            .map_err(|e| NephroError::OptionsParse(e.to_string()))
    }

    /// Save options to a TOML file (pretty-printed).
    ///
    /// # Errors
    ///
    /// Returns [`NephroError`] if serialization or writing fails.
    pub fn save(&self, path: &Path) -> Result<(), NephroError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| NephroError::OptionsParse(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(NephroError::Io)?;
        }
        std::fs::write(path, content).map_err(NephroError::Io)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::command::ViewCommand;

    #[test]
    fn default_round_trips_through_toml() {
        let opts = Options::default();
        let toml_str = toml::to_string_pretty(&opts).unwrap();
        let parsed: Options = toml::from_str(&toml_str).unwrap();
        assert_eq!(opts, parsed);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let toml_str = r#"
[display]
rotation_step = 0.01

[assets]
extension = "gltf"
"#;
        let opts = Options::from_toml(toml_str).unwrap();
        assert_eq!(opts.display.rotation_step, 0.01);
        assert_eq!(opts.assets.extension, "gltf");
        // Everything else should be default
        assert_eq!(opts.assets.root, AssetOptions::default().root);
        assert_eq!(opts.camera, CameraOptions::default());
        assert_eq!(
            opts.display.healthy_color,
            DisplayOptions::default().healthy_color
        );
    }

    #[test]
    fn malformed_toml_is_an_options_error() {
        let err = Options::from_toml("[display\nrotation_step = ").unwrap_err();
        assert!(matches!(err, NephroError::OptionsParse(_)));
    }

    #[test]
    fn keybinding_lookup() {
        let opts = Options::default();
        assert_eq!(
            opts.keybindings.lookup("KeyH"),
            Some(ViewCommand::ShowHealthy)
        );
        assert_eq!(
            opts.keybindings.lookup("KeyP"),
            Some(ViewCommand::ShowPathological)
        );
        assert_eq!(
            opts.keybindings.lookup("KeyR"),
            Some(ViewCommand::ToggleRotation)
        );
        assert_eq!(opts.keybindings.lookup("KeyZ"), None);
    }

    #[test]
    fn save_then_load_preserves_values() {
        let dir = std::env::temp_dir()
            .join(format!("nephroview-options-{}", std::process::id()));
        let path = dir.join("preset.toml");
        let mut opts = Options::default();
        opts.display.rotation_step = 0.02;
        opts.assets.root = "/srv/models".into();
        opts.save(&path).unwrap();

        let loaded = Options::load(&path).unwrap();
        assert_eq!(loaded, opts);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn schema_exposes_only_live_display_fields() {
        let schema_value =
            serde_json::to_value(Options::json_schema()).unwrap();
        let props = schema_value["properties"].as_object().unwrap();

        assert!(props.contains_key("display"));
        for fixed in ["camera", "lighting", "assets", "keybindings"] {
            assert!(!props.contains_key(fixed), "{fixed} should be skipped");
        }

        let display = &props["display"]["properties"];
        let step = &display["rotation_step"];
        assert_eq!(step["maximum"], 0.05);
        assert_eq!(step["step"], 0.001);
        assert!(display.get("cyst_opacity").is_some());
        assert!(display.get("background").is_none());
    }

    #[test]
    fn with_field_edits_one_value() {
        let opts = Options::default();
        let edited = opts
            .with_field("display", "cyst_opacity", serde_json::json!(0.4))
            .unwrap();
        assert_eq!(edited.display.cyst_opacity, 0.4);
        assert_eq!(edited.camera, opts.camera);
        assert_eq!(edited.display.rotation_step, opts.display.rotation_step);
    }

    #[test]
    fn with_field_rejects_bad_input() {
        let opts = Options::default();
        assert!(matches!(
            opts.with_field("nowhere", "x", serde_json::json!(1)),
            Err(NephroError::OptionsParse(_))
        ));
        assert!(matches!(
            opts.with_field("display", "shininess", serde_json::json!("shiny")),
            Err(NephroError::OptionsParse(_))
        ));
    }
}
