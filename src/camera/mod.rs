//! Camera system for the organ viewport.
//!
//! A perspective [`Camera`](core::Camera) driven by a damped
//! [`OrbitController`](controller::OrbitController), bundled as a
//! [`CameraRig`](controller::CameraRig).

/// Damped orbit controller and the camera rig.
pub mod controller;
/// Core camera struct and GPU uniform type.
pub mod core;

pub use controller::{CameraRig, OrbitController};
pub use self::core::{Camera, CameraUniform};
