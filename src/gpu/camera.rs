use wgpu::util::DeviceExt;

use super::render_context::RenderContext;
use crate::camera::{Camera, CameraUniform};

/// Camera uniform buffer and its bind group (group 0 of the organ
/// pipeline).
pub struct CameraBinding {
    uniform: CameraUniform,
    buffer: wgpu::Buffer,
    /// Layout shared with the pipeline.
    pub layout: wgpu::BindGroupLayout,
    /// Bind group pointing at the uniform buffer.
    pub bind_group: wgpu::BindGroup,
}

impl CameraBinding {
    /// Create the buffer and bind group, initialized from `camera`.
    #[must_use]
    pub fn new(context: &RenderContext, camera: &Camera) -> Self {
        let mut uniform = CameraUniform::new();
        uniform.update_view_proj(camera);

        let buffer = context
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Camera Buffer"),
                contents: bytemuck::cast_slice(&[uniform]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });

        let layout = uniform_layout(&context.device, "Camera Bind Group Layout");
        let bind_group = context
            .device
            .create_bind_group(&wgpu::BindGroupDescriptor {
                layout: &layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                }],
                label: Some("Camera Bind Group"),
            });

        Self {
            uniform,
            buffer,
            layout,
            bind_group,
        }
    }

    /// Upload the camera's current view-projection and eye position.
    pub fn update(&mut self, queue: &wgpu::Queue, camera: &Camera) {
        self.uniform.update_view_proj(camera);
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}

/// Layout with a single uniform buffer at binding 0, visible to both
/// stages.
pub(crate) fn uniform_layout(
    device: &wgpu::Device,
    label: &str,
) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
    })
}
