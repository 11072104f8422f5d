use std::f32::consts::PI;

use glam::{Vec2, Vec3};

use crate::camera::core::Camera;
use crate::options::CameraOptions;

/// Keeps the eye slightly off the poles so `look_at` stays well defined.
const POLAR_EPSILON: f32 = 1e-3;
/// Radians of orbit per pixel of drag at `rotate_speed = 1`.
const RADIANS_PER_PIXEL: f32 = 2.0 * PI / 1000.0;

/// Damped orbit around a fixed target.
///
/// Drags and scrolls accumulate pending motion; each [`update`](Self::update)
/// applies a `damping` fraction of it and decays the rest, so the view keeps
/// gliding briefly after input stops.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitController {
    target: Vec3,
    /// Azimuth around +Y, measured from +Z.
    yaw: f32,
    /// Angle from +Y.
    polar: f32,
    distance: f32,
    yaw_delta: f32,
    polar_delta: f32,
    zoom_scale: f32,
    rotate_speed: f32,
    zoom_speed: f32,
    damping: f32,
    min_distance: f32,
    max_distance: f32,
}

impl OrbitController {
    /// Orbit starting on the +Z axis at the configured distance.
    #[must_use]
    pub fn new(options: &CameraOptions) -> Self {
        let min_distance = options.min_distance.max(f32::EPSILON);
        let max_distance = options.max_distance.max(min_distance);
        Self {
            target: Vec3::ZERO,
            yaw: 0.0,
            polar: PI / 2.0,
            distance: options.distance.clamp(min_distance, max_distance),
            yaw_delta: 0.0,
            polar_delta: 0.0,
            zoom_scale: 1.0,
            rotate_speed: options.rotate_speed,
            zoom_speed: options.zoom_speed,
            damping: options.damping.clamp(0.01, 1.0),
            min_distance,
            max_distance,
        }
    }

    /// Queue an orbit by a mouse drag of `delta` pixels.
    pub fn rotate(&mut self, delta: Vec2) {
        self.yaw_delta -= delta.x * RADIANS_PER_PIXEL * self.rotate_speed;
        self.polar_delta -= delta.y * RADIANS_PER_PIXEL * self.rotate_speed;
    }

    /// Queue a zoom; positive `delta` moves the eye closer.
    pub fn zoom(&mut self, delta: f32) {
        self.zoom_scale *= (1.0 - delta * self.zoom_speed).max(0.1);
    }

    /// Integrate one frame of pending motion and write the result into
    /// `camera`.
    pub fn update(&mut self, camera: &mut Camera) {
        self.yaw += self.yaw_delta * self.damping;
        self.polar = (self.polar + self.polar_delta * self.damping)
            .clamp(POLAR_EPSILON, PI - POLAR_EPSILON);
        self.yaw_delta *= 1.0 - self.damping;
        self.polar_delta *= 1.0 - self.damping;

        self.distance = (self.distance * self.zoom_scale)
            .clamp(self.min_distance, self.max_distance);
        self.zoom_scale = 1.0;

        camera.target = self.target;
        camera.eye = self.target + self.offset();
        camera.up = Vec3::Y;
    }

    /// Current eye distance from the target.
    #[must_use]
    pub fn distance(&self) -> f32 {
        self.distance
    }

    /// Whether queued orbit motion is still being applied.
    #[must_use]
    pub fn is_moving(&self) -> bool {
        self.yaw_delta.abs() > 1e-5 || self.polar_delta.abs() > 1e-5
    }

    fn offset(&self) -> Vec3 {
        let sin_polar = self.polar.sin();
        Vec3::new(
            self.distance * sin_polar * self.yaw.sin(),
            self.distance * self.polar.cos(),
            self.distance * sin_polar * self.yaw.cos(),
        )
    }
}

/// The scene camera paired with its orbit controller. Created once per
/// viewer and mutated by the frame loop and the resize handler.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraRig {
    /// Projection and view state.
    pub camera: Camera,
    /// Damped orbit driving `camera`.
    pub orbit: OrbitController,
}

impl CameraRig {
    /// Rig for a viewport of the given pixel size.
    #[must_use]
    pub fn new(options: &CameraOptions, width: u32, height: u32) -> Self {
        let aspect = if width > 0 && height > 0 {
            width as f32 / height as f32
        } else {
            1.0
        };
        let mut rig = Self {
            camera: Camera::from_options(options, aspect),
            orbit: OrbitController::new(options),
        };
        rig.orbit.update(&mut rig.camera);
        rig
    }

    /// Advance the orbit damping by one frame.
    pub fn update(&mut self) {
        self.orbit.update(&mut self.camera);
    }

    /// Set the aspect ratio to `width / height`. Zero sizes are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.camera.aspect = width as f32 / height as f32;
        }
    }

    /// Queue an orbit by a drag of `delta` pixels.
    pub fn rotate(&mut self, delta: Vec2) {
        self.orbit.rotate(delta);
    }

    /// Queue a zoom step.
    pub fn zoom(&mut self, delta: f32) {
        self.orbit.zoom(delta);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rig() -> CameraRig {
        CameraRig::new(&CameraOptions::default(), 800, 600)
    }

    #[test]
    fn starts_on_positive_z() {
        let rig = rig();
        let expected = Vec3::new(0.0, 0.0, CameraOptions::default().distance);
        assert!((rig.camera.eye - expected).length() < 1e-4);
        assert!((rig.camera.aspect - 800.0 / 600.0).abs() < 1e-6);
    }

    #[test]
    fn damped_rotation_glides_then_settles() {
        let mut rig = rig();
        rig.rotate(Vec2::new(100.0, 0.0));
        rig.update();
        let first = rig.camera.eye;
        assert!(rig.orbit.is_moving());
        rig.update();
        let second = rig.camera.eye;
        assert_ne!(first, second);

        for _ in 0..1000 {
            rig.update();
        }
        assert!(!rig.orbit.is_moving());
        // distance is preserved by a pure orbit
        assert!((rig.camera.eye.length() - rig.orbit.distance()).abs() < 1e-4);
    }

    #[test]
    fn zoom_is_clamped() {
        let options = CameraOptions::default();
        let mut rig = rig();
        for _ in 0..200 {
            rig.zoom(5.0);
            rig.update();
        }
        assert!((rig.orbit.distance() - options.min_distance).abs() < 1e-5);
        for _ in 0..200 {
            rig.zoom(-5.0);
            rig.update();
        }
        assert!((rig.orbit.distance() - options.max_distance).abs() < 1e-3);
    }

    #[test]
    fn polar_angle_never_flips() {
        let mut rig = rig();
        rig.rotate(Vec2::new(0.0, -100_000.0));
        for _ in 0..100 {
            rig.update();
        }
        // dragging up far enough parks the eye just above the -Y pole
        assert!(rig.camera.eye.y < 0.0);
        assert!(rig.camera.eye.x.abs() + rig.camera.eye.z.abs() > 0.0);
    }

    #[test]
    fn resize_sets_exact_aspect_and_ignores_zero() {
        let mut rig = rig();
        rig.resize(1920, 1080);
        assert_eq!(rig.camera.aspect, 1920.0 / 1080.0);
        rig.resize(0, 1080);
        assert_eq!(rig.camera.aspect, 1920.0 / 1080.0);
    }
}
