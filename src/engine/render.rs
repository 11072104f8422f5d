use super::KidneyEngine;
use crate::render_loop::Reschedule;

impl KidneyEngine {
    /// Apply finished loads and bring organ GPU buffers in line with the
    /// scene. Returns whether a load outcome was applied.
    pub fn update(&mut self) -> bool {
        let applied = self.view.poll_loads();
        self.organ_renderer
            .sync(&self.context, self.view.composer_mut());
        applied
    }

    /// Run one frame of the loop: orbit damping, organ rotation, draw.
    ///
    /// # Errors
    ///
    /// Returns [`wgpu::SurfaceError`] if the next swapchain texture cannot
    /// be acquired; the caller should reconfigure on `Lost`/`Outdated`.
    pub fn render(&mut self) -> Result<Reschedule, wgpu::SurfaceError> {
        let Self {
            context,
            camera,
            lighting,
            organ_renderer,
            view,
            frame_loop,
            clear_color,
            frame_timing,
            ..
        } = self;

        frame_loop.tick(view, |view| {
            let composer = view.composer();
            camera.update(&context.queue, &composer.camera().camera);
            if let Some(organ) = composer.organ() {
                organ_renderer.update_transforms(&context.queue, organ);
            }

            let frame = context.get_next_frame()?;
            let target = frame
                .texture
                .create_view(&wgpu::TextureViewDescriptor::default());
            let mut encoder = context.create_encoder();
            {
                let mut rp =
                    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                        label: Some("organ render pass"),
                        color_attachments: &[Some(
                            wgpu::RenderPassColorAttachment {
                                view: &target,
                                resolve_target: None,
                                ops: wgpu::Operations {
                                    load: wgpu::LoadOp::Clear(*clear_color),
                                    store: wgpu::StoreOp::Store,
                                },
                                depth_slice: None,
                            },
                        )],
                        depth_stencil_attachment: Some(
                            wgpu::RenderPassDepthStencilAttachment {
                                view: &context.depth.view,
                                depth_ops: Some(wgpu::Operations {
                                    load: wgpu::LoadOp::Clear(1.0),
                                    store: wgpu::StoreOp::Store,
                                }),
                                stencil_ops: None,
                            },
                        ),
                        ..Default::default()
                    });
                organ_renderer.draw(
                    &mut rp,
                    &camera.bind_group,
                    &lighting.bind_group,
                );
            }
            context.submit(encoder);
            frame.present();
            frame_timing.end_frame();
            Ok(())
        })
    }
}
