use wgpu::util::DeviceExt;

use super::camera::uniform_layout;
use super::render_context::RenderContext;
use crate::scene::LightingRig;

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
/// GPU lighting uniform: premultiplied light colors and the key light
/// direction.
pub struct LightingUniform {
    /// Ambient color times intensity (w unused).
    pub ambient: [f32; 4],
    /// Directional color times intensity (w unused).
    pub key_color: [f32; 4],
    /// Unit direction toward the directional light (w unused).
    pub key_direction: [f32; 4],
}

impl LightingUniform {
    /// Pack a lighting rig.
    #[must_use]
    pub fn from_rig(rig: &LightingRig) -> Self {
        let scaled = |color: [f32; 3], intensity: f32| {
            [
                color[0] * intensity,
                color[1] * intensity,
                color[2] * intensity,
                1.0,
            ]
        };
        Self {
            ambient: scaled(rig.ambient.color, rig.ambient.intensity),
            key_color: scaled(rig.directional.color, rig.directional.intensity),
            key_direction: rig.directional.direction.extend(0.0).to_array(),
        }
    }
}

/// Lighting uniform buffer and bind group (group 1 of the organ
/// pipeline). Written once; the rig never changes.
pub struct Lighting {
    /// Packed uniform as uploaded.
    pub uniform: LightingUniform,
    _buffer: wgpu::Buffer,
    /// Layout shared with the pipeline.
    pub layout: wgpu::BindGroupLayout,
    /// Bind group pointing at the uniform buffer.
    pub bind_group: wgpu::BindGroup,
}

impl Lighting {
    /// Upload the rig and create the bind group.
    #[must_use]
    pub fn new(context: &RenderContext, rig: &LightingRig) -> Self {
        let uniform = LightingUniform::from_rig(rig);
        let buffer = context
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Lighting Buffer"),
                contents: bytemuck::cast_slice(&[uniform]),
                usage: wgpu::BufferUsages::UNIFORM,
            });
        let layout = uniform_layout(&context.device, "Lighting Bind Group Layout");
        let bind_group = context
            .device
            .create_bind_group(&wgpu::BindGroupDescriptor {
                layout: &layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                }],
                label: Some("Lighting Bind Group"),
            });
        Self {
            uniform,
            _buffer: buffer,
            layout,
            bind_group,
        }
    }
}
