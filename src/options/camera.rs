use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
/// Camera projection and orbit parameters.
pub struct CameraOptions {
    /// Vertical field of view in degrees.
    pub fovy: f32,
    /// Near clipping plane distance.
    pub znear: f32,
    /// Far clipping plane distance.
    pub zfar: f32,
    /// Initial eye distance from the orbit target.
    pub distance: f32,
    /// Closest allowed eye distance.
    pub min_distance: f32,
    /// Farthest allowed eye distance.
    pub max_distance: f32,
    /// Rotation sensitivity multiplier.
    pub rotate_speed: f32,
    /// Zoom sensitivity multiplier.
    pub zoom_speed: f32,
    /// Fraction of the pending orbit motion applied per frame
    /// (1 = no damping).
    pub damping: f32,
}

impl Default for CameraOptions {
    fn default() -> Self {
        Self {
            fovy: 45.0,
            znear: 0.1,
            zfar: 100.0,
            distance: 4.0,
            min_distance: 1.5,
            max_distance: 20.0,
            rotate_speed: 1.0,
            zoom_speed: 0.1,
            damping: 0.05,
        }
    }
}
