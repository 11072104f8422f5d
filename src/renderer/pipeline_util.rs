use crate::gpu::texture::DEPTH_FORMAT;

/// How a pipeline treats color and depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BlendMode {
    /// Replace color, write depth.
    Opaque,
    /// Alpha blend, test depth without writing it.
    Translucent,
}

/// Surface color target for the given blend mode.
pub(crate) fn color_target(
    format: wgpu::TextureFormat,
    mode: BlendMode,
) -> wgpu::ColorTargetState {
    wgpu::ColorTargetState {
        format,
        blend: Some(match mode {
            BlendMode::Opaque => wgpu::BlendState::REPLACE,
            BlendMode::Translucent => wgpu::BlendState::ALPHA_BLENDING,
        }),
        write_mask: wgpu::ColorWrites::ALL,
    }
}

/// Depth-stencil state for the given blend mode.
pub(crate) fn depth_stencil_state(mode: BlendMode) -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format: DEPTH_FORMAT,
        depth_write_enabled: mode == BlendMode::Opaque,
        depth_compare: wgpu::CompareFunction::Less,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    }
}

/// Create an indexed triangle-list pipeline with `vs_main` / `fs_main`
/// entry points, drawn double-sided.
pub(crate) fn create_mesh_pipeline(
    device: &wgpu::Device,
    label: &str,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    bind_group_layouts: &[&wgpu::BindGroupLayout],
    vertex_layout: wgpu::VertexBufferLayout<'static>,
    mode: BlendMode,
) -> wgpu::RenderPipeline {
    let pipeline_layout =
        device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&format!("{label} Layout")),
            bind_group_layouts,
            push_constant_ranges: &[],
        });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[vertex_layout],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(color_target(format, mode))],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: None,
            ..Default::default()
        },
        depth_stencil: Some(depth_stencil_state(mode)),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translucent_pass_keeps_depth_read_only() {
        assert!(depth_stencil_state(BlendMode::Opaque).depth_write_enabled);
        assert!(!depth_stencil_state(BlendMode::Translucent).depth_write_enabled);
        let target = color_target(
            wgpu::TextureFormat::Bgra8UnormSrgb,
            BlendMode::Translucent,
        );
        assert_eq!(target.blend, Some(wgpu::BlendState::ALPHA_BLENDING));
    }
}
