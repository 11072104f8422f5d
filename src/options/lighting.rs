use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
/// Ambient fill and a single directional key light.
pub struct LightingOptions {
    /// Ambient light color (linear RGB).
    pub ambient_color: [f32; 3],
    /// Ambient light intensity.
    pub ambient_intensity: f32,
    /// Directional light color (linear RGB).
    pub directional_color: [f32; 3],
    /// Directional light intensity.
    pub directional_intensity: f32,
    /// Direction from the scene toward the key light.
    pub directional_dir: [f32; 3],
}

impl Default for LightingOptions {
    fn default() -> Self {
        Self {
            ambient_color: [1.0, 1.0, 1.0],
            ambient_intensity: 0.5,
            directional_color: [1.0, 1.0, 1.0],
            directional_intensity: 1.0,
            directional_dir: [1.0, 1.0, 1.0],
        }
    }
}
