//! Organ rendering.
//!
//! A single Blinn-Phong mesh renderer drawing the organ subtree in two
//! passes: opaque meshes first, then translucent ones (cysts) blended on
//! top.

/// Organ mesh renderer and its GPU-side types.
pub mod organ;
pub(crate) mod pipeline_util;

pub use organ::OrganRenderer;
