//! GPU buffers and draw calls for the attached organ.
//!
//! Geometry shared through an `Arc` (the fallback reuses one sphere for
//! every part) is uploaded once per organ. Each mesh leaf gets its own
//! uniform buffer with model matrix and material; transforms are rewritten
//! every frame because the pivot turns.

use std::collections::HashMap;
use std::sync::Arc;

use glam::Mat4;
use wgpu::util::DeviceExt;

use super::pipeline_util::{self, BlendMode};
use crate::gpu::camera::uniform_layout;
use crate::gpu::render_context::RenderContext;
use crate::scene::{Geometry, Material, Mesh, OrganId, OrganNode, SceneComposer};

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
/// Interleaved vertex: position then normal.
pub struct OrganVertex {
    /// Local-space position.
    pub position: [f32; 3],
    /// Local-space unit normal.
    pub normal: [f32; 3],
}

impl OrganVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

    /// Vertex buffer layout matching `VertexInput` in the shader.
    #[must_use]
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }

    /// Interleave a geometry's positions and normals. Missing normals
    /// default to +Y.
    #[must_use]
    pub fn interleave(geometry: &Geometry) -> Vec<Self> {
        geometry
            .positions
            .iter()
            .enumerate()
            .map(|(i, p)| Self {
                position: p.to_array(),
                normal: geometry
                    .normals
                    .get(i)
                    .map_or([0.0, 1.0, 0.0], |n| n.to_array()),
            })
            .collect()
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
/// Per-mesh uniform: transforms and flat material.
pub struct MeshUniform {
    /// Local-to-world matrix.
    pub model: [[f32; 4]; 4],
    /// Inverse-transpose of `model` for normals.
    pub normal_matrix: [[f32; 4]; 4],
    /// RGB color and opacity.
    pub color: [f32; 4],
    /// Specular exponent.
    pub shininess: f32,
    /// Specular strength.
    pub specular: f32,
    /// Padding for GPU alignment.
    pub(crate) _pad: [f32; 2],
}

impl MeshUniform {
    /// Pack a world matrix and material.
    #[must_use]
    pub fn new(world: Mat4, material: &Material) -> Self {
        let normal_matrix = if world.determinant().abs() > f32::EPSILON {
            world.inverse().transpose()
        } else {
            world
        };
        let [r, g, b] = material.color;
        Self {
            model: world.to_cols_array_2d(),
            normal_matrix: normal_matrix.to_cols_array_2d(),
            color: [r, g, b, material.opacity],
            shininess: material.shininess.max(1.0),
            specular: material.specular,
            _pad: [0.0; 2],
        }
    }
}

/// Mesh indices grouped by draw pass. Invisible meshes are in neither.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrawLists {
    /// Fully opaque meshes, drawn first with depth writes.
    pub opaque: Vec<usize>,
    /// Partially transparent meshes, blended afterwards.
    pub translucent: Vec<usize>,
}

impl DrawLists {
    /// Partition meshes by their material.
    #[must_use]
    pub fn partition<'a>(materials: impl IntoIterator<Item = &'a Material>) -> Self {
        let mut lists = Self::default();
        for (i, material) in materials.into_iter().enumerate() {
            if !material.is_visible() {
                continue;
            }
            if material.is_translucent() {
                lists.translucent.push(i);
            } else {
                lists.opaque.push(i);
            }
        }
        lists
    }
}

struct GeometryBuffers {
    vertex: wgpu::Buffer,
    index: wgpu::Buffer,
    index_count: u32,
}

struct GpuMesh {
    geometry: usize,
    material: Material,
    uniform: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

/// Draws the organ attached to a [`SceneComposer`].
pub struct OrganRenderer {
    opaque_pipeline: wgpu::RenderPipeline,
    translucent_pipeline: wgpu::RenderPipeline,
    mesh_layout: wgpu::BindGroupLayout,
    geometries: Vec<GeometryBuffers>,
    meshes: Vec<GpuMesh>,
    draw_lists: DrawLists,
    organ: Option<OrganId>,
}

impl OrganRenderer {
    /// Build both pipelines against the camera and lighting layouts.
    #[must_use]
    pub fn new(
        context: &RenderContext,
        camera_layout: &wgpu::BindGroupLayout,
        lighting_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let shader = context
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("Organ Shader"),
                source: wgpu::ShaderSource::Wgsl(
                    include_str!("../../assets/shaders/organ.wgsl").into(),
                ),
            });
        let mesh_layout = uniform_layout(&context.device, "Organ Mesh Layout");
        let layouts = [camera_layout, lighting_layout, &mesh_layout];

        let pipeline = |label: &str, mode: BlendMode| {
            pipeline_util::create_mesh_pipeline(
                &context.device,
                label,
                &shader,
                context.format(),
                &layouts,
                OrganVertex::layout(),
                mode,
            )
        };
        let opaque_pipeline = pipeline("Organ Opaque", BlendMode::Opaque);
        let translucent_pipeline =
            pipeline("Organ Translucent", BlendMode::Translucent);

        Self {
            opaque_pipeline,
            translucent_pipeline,
            mesh_layout,
            geometries: Vec::new(),
            meshes: Vec::new(),
            draw_lists: DrawLists::default(),
            organ: None,
        }
    }

    /// Id of the organ whose buffers are resident.
    #[must_use]
    pub fn resident(&self) -> Option<OrganId> {
        self.organ
    }

    /// Bring GPU state in line with the composer: release buffers of
    /// disposed organs and upload a newly attached organ. Transforms are
    /// written per frame by [`update_transforms`](Self::update_transforms).
    pub fn sync(&mut self, context: &RenderContext, composer: &mut SceneComposer) {
        for id in composer.take_released() {
            if self.organ == Some(id) {
                self.release();
            }
        }

        let Some(organ) = composer.organ() else {
            self.release();
            return;
        };
        if self.organ != Some(organ.id()) {
            self.release();
            self.upload(context, organ);
        } else {
            self.refresh_materials(organ);
        }
    }

    /// Pick up in-place material edits. Opacity can move a mesh between
    /// the opaque and translucent passes, so the draw lists are rebuilt
    /// when any material changed.
    fn refresh_materials(&mut self, organ: &OrganNode) {
        let mut index = 0;
        let mut changed = false;
        organ
            .root()
            .visit_meshes(Mat4::IDENTITY, &mut |mesh: &Mesh, _: Mat4| {
                if let Some(gpu) = self.meshes.get_mut(index) {
                    if gpu.material != mesh.material {
                        gpu.material = mesh.material;
                        changed = true;
                    }
                }
                index += 1;
            });
        if changed {
            self.draw_lists =
                DrawLists::partition(self.meshes.iter().map(|m| &m.material));
        }
    }

    /// Record draw calls: opaque meshes, then translucent ones.
    pub fn draw(
        &self,
        render_pass: &mut wgpu::RenderPass<'_>,
        camera_bind_group: &wgpu::BindGroup,
        lighting_bind_group: &wgpu::BindGroup,
    ) {
        if self.meshes.is_empty() {
            return;
        }
        render_pass.set_bind_group(0, camera_bind_group, &[]);
        render_pass.set_bind_group(1, lighting_bind_group, &[]);

        for (pipeline, list) in [
            (&self.opaque_pipeline, &self.draw_lists.opaque),
            (&self.translucent_pipeline, &self.draw_lists.translucent),
        ] {
            if list.is_empty() {
                continue;
            }
            render_pass.set_pipeline(pipeline);
            for &i in list {
                let mesh = &self.meshes[i];
                let geometry = &self.geometries[mesh.geometry];
                render_pass.set_bind_group(2, &mesh.bind_group, &[]);
                render_pass.set_vertex_buffer(0, geometry.vertex.slice(..));
                render_pass.set_index_buffer(
                    geometry.index.slice(..),
                    wgpu::IndexFormat::Uint32,
                );
                render_pass.draw_indexed(0..geometry.index_count, 0, 0..1);
            }
        }
    }

    /// Destroy every resident buffer. Safe to call when nothing is
    /// resident.
    pub fn release(&mut self) {
        let Some(id) = self.organ.take() else {
            return;
        };
        for mesh in self.meshes.drain(..) {
            mesh.uniform.destroy();
        }
        for geometry in self.geometries.drain(..) {
            geometry.vertex.destroy();
            geometry.index.destroy();
        }
        self.draw_lists = DrawLists::default();
        log::debug!("released GPU buffers of organ {}", id.0);
    }

    fn upload(&mut self, context: &RenderContext, organ: &OrganNode) {
        let device = &context.device;
        let mut shared: HashMap<*const Geometry, usize> = HashMap::new();

        organ
            .root()
            .visit_meshes(Mat4::IDENTITY, &mut |mesh: &Mesh, world: Mat4| {
                let key = Arc::as_ptr(&mesh.geometry);
                let geometry = match shared.get(&key) {
                    Some(&index) => index,
                    None => {
                        let index = self.geometries.len();
                        self.geometries
                            .push(upload_geometry(device, &mesh.geometry));
                        let _ = shared.insert(key, index);
                        index
                    }
                };

                let uniform = device.create_buffer_init(
                    &wgpu::util::BufferInitDescriptor {
                        label: Some("Organ Mesh Uniform"),
                        contents: bytemuck::cast_slice(&[MeshUniform::new(
                            world,
                            &mesh.material,
                        )]),
                        usage: wgpu::BufferUsages::UNIFORM
                            | wgpu::BufferUsages::COPY_DST,
                    },
                );
                let bind_group =
                    device.create_bind_group(&wgpu::BindGroupDescriptor {
                        label: Some("Organ Mesh Bind Group"),
                        layout: &self.mesh_layout,
                        entries: &[wgpu::BindGroupEntry {
                            binding: 0,
                            resource: uniform.as_entire_binding(),
                        }],
                    });
                self.meshes.push(GpuMesh {
                    geometry,
                    material: mesh.material,
                    uniform,
                    bind_group,
                });
            });

        self.draw_lists =
            DrawLists::partition(self.meshes.iter().map(|m| &m.material));
        self.organ = Some(organ.id());
        log::debug!(
            "uploaded organ {}: {} meshes, {} geometries",
            organ.id().0,
            self.meshes.len(),
            self.geometries.len()
        );
    }

    /// Rewrite every mesh uniform from the organ's current world
    /// matrices. Meshes are matched by traversal order.
    pub fn update_transforms(&self, queue: &wgpu::Queue, organ: &OrganNode) {
        let mut index = 0;
        organ
            .root()
            .visit_meshes(Mat4::IDENTITY, &mut |mesh: &Mesh, world: Mat4| {
                if let Some(gpu) = self.meshes.get(index) {
                    queue.write_buffer(
                        &gpu.uniform,
                        0,
                        bytemuck::cast_slice(&[MeshUniform::new(
                            world,
                            &mesh.material,
                        )]),
                    );
                }
                index += 1;
            });
    }
}

fn upload_geometry(device: &wgpu::Device, geometry: &Geometry) -> GeometryBuffers {
    let vertices = OrganVertex::interleave(geometry);
    let vertex = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Organ Vertex Buffer"),
        contents: bytemuck::cast_slice(&vertices),
        usage: wgpu::BufferUsages::VERTEX,
    });
    let index = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Organ Index Buffer"),
        contents: bytemuck::cast_slice(&geometry.indices),
        usage: wgpu::BufferUsages::INDEX,
    });
    GeometryBuffers {
        vertex,
        index,
        index_count: geometry.indices.len() as u32,
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;

    #[test]
    fn uniform_sizes_match_shader() {
        assert_eq!(size_of::<OrganVertex>(), 24);
        assert_eq!(size_of::<MeshUniform>(), 160);
    }

    #[test]
    fn normal_matrix_undoes_nonuniform_scale() {
        let world = Mat4::from_scale(Vec3::new(2.0, 1.0, 1.0));
        let u = MeshUniform::new(world, &Material::default());
        let n = Mat4::from_cols_array_2d(&u.normal_matrix);
        let normal = n.transform_vector3(Vec3::X);
        assert!((normal - Vec3::new(0.5, 0.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn degenerate_world_keeps_finite_normals() {
        let u = MeshUniform::new(Mat4::ZERO, &Material::default());
        assert!(u.normal_matrix.iter().flatten().all(|v| v.is_finite()));
    }

    #[test]
    fn partition_skips_invisible_and_splits_translucent() {
        let opaque = Material::default();
        let cyst = Material::default().with_opacity(0.7);
        let hidden = Material::default().with_opacity(0.0);
        let lists = DrawLists::partition([&opaque, &hidden, &cyst, &cyst]);
        assert_eq!(lists.opaque, vec![0]);
        assert_eq!(lists.translucent, vec![2, 3]);
    }

    #[test]
    fn interleave_pairs_positions_with_normals() {
        let geometry = Geometry {
            positions: vec![Vec3::X, Vec3::Y],
            normals: vec![Vec3::Z],
            indices: vec![],
        };
        let v = OrganVertex::interleave(&geometry);
        assert_eq!(v[0].normal, [0.0, 0.0, 1.0]);
        assert_eq!(v[1].normal, [0.0, 1.0, 0.0]);
        assert_eq!(v[1].position, [0.0, 1.0, 0.0]);
    }
}
