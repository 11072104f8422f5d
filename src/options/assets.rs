use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
/// Location of the two kidney models.
pub struct AssetOptions {
    /// Directory or `http(s)://` base holding `human_kidney.<ext>` and
    /// `polycystic_kidney.<ext>`.
    pub root: String,
    /// Model file extension. Only `glb` and `gltf` are loaded; anything
    /// else shows the procedural stand-in directly.
    pub extension: String,
}

impl Default for AssetOptions {
    fn default() -> Self {
        Self {
            root: "assets/models".into(),
            extension: "glb".into(),
        }
    }
}
