use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::scene::Material;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Display", inline)]
#[serde(default)]
/// Organ appearance and turntable speed.
pub struct DisplayOptions {
    /// Radians added to the organ's Y rotation every frame while rotating.
    /// Applied per frame, not per second, so the apparent speed follows
    /// the display refresh rate.
    #[schemars(title = "Rotation Step", range(min = 0.0, max = 0.05), extend("step" = 0.001))]
    pub rotation_step: f32,
    /// Flat body color of the healthy kidney (linear RGB).
    #[schemars(skip)]
    pub healthy_color: [f32; 3],
    /// Flat body color of the polycystic kidney (linear RGB).
    #[schemars(skip)]
    pub pathological_color: [f32; 3],
    /// Color of the procedural cysts (linear RGB).
    #[schemars(skip)]
    pub cyst_color: [f32; 3],
    /// Opacity of the procedural cysts.
    #[schemars(title = "Cyst Opacity", range(min = 0.1, max = 1.0), extend("step" = 0.05))]
    pub cyst_opacity: f32,
    /// Specular exponent of the organ material.
    #[schemars(title = "Shininess", range(min = 1.0, max = 128.0), extend("step" = 1.0))]
    pub shininess: f32,
    /// Specular strength of the organ material.
    #[schemars(title = "Specular", range(min = 0.0, max = 1.0), extend("step" = 0.01))]
    pub specular: f32,
    /// Viewport clear color (linear RGB).
    #[schemars(skip)]
    pub background: [f32; 3],
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            rotation_step: 0.005,
            healthy_color: [0.8, 0.27, 0.27],
            pathological_color: [0.55, 0.1, 0.1],
            cyst_color: [1.0, 1.0, 0.8],
            cyst_opacity: 0.7,
            shininess: 30.0,
            specular: 0.27,
            background: [0.94, 0.95, 0.96],
        }
    }
}

impl DisplayOptions {
    /// Flat body material for the given health state.
    #[must_use]
    pub fn body_material(&self, healthy: bool) -> Material {
        let color = if healthy {
            self.healthy_color
        } else {
            self.pathological_color
        };
        Material::flat(color, self.shininess, self.specular)
    }

    /// Translucent cyst material.
    #[must_use]
    pub fn cyst_material(&self) -> Material {
        Material::flat(self.cyst_color, self.shininess, self.specular)
            .with_opacity(self.cyst_opacity)
    }
}
