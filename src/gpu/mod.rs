//! GPU resource management.
//!
//! wgpu device/surface initialization, the depth attachment, and the
//! camera and lighting uniform bindings shared by the organ pipeline.

/// Camera uniform buffer and bind group.
pub mod camera;
/// Lighting uniform buffer and bind group.
pub mod lighting;
/// wgpu device, surface, and queue initialization.
pub mod render_context;
/// Depth attachment texture.
pub mod texture;
