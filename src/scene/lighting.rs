use glam::Vec3;

use crate::options::LightingOptions;

/// Uniform light reaching every surface regardless of orientation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientLight {
    /// Linear RGB color.
    pub color: [f32; 3],
    /// Scalar multiplier on `color`.
    pub intensity: f32,
}

/// Parallel light arriving from a fixed direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    /// Linear RGB color.
    pub color: [f32; 3],
    /// Scalar multiplier on `color`.
    pub intensity: f32,
    /// Unit vector pointing from the scene toward the light.
    pub direction: Vec3,
}

/// The two static lights of the scene. Built once from options and never
/// mutated afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightingRig {
    /// Fill light.
    pub ambient: AmbientLight,
    /// Key light.
    pub directional: DirectionalLight,
}

impl LightingRig {
    /// Build the rig from lighting options. A zero direction falls back to
    /// straight overhead.
    #[must_use]
    pub fn from_options(options: &LightingOptions) -> Self {
        Self {
            ambient: AmbientLight {
                color: options.ambient_color,
                intensity: options.ambient_intensity,
            },
            directional: DirectionalLight {
                color: options.directional_color,
                intensity: options.directional_intensity,
                direction: Vec3::from(options.directional_dir)
                    .try_normalize()
                    .unwrap_or(Vec3::Y),
            },
        }
    }
}

impl Default for LightingRig {
    fn default() -> Self {
        Self::from_options(&LightingOptions::default())
    }
}
