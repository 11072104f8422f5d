//! Scene graph for the displayed organ.
//!
//! A [`SceneNode`] tree with local [`Transform`]s and optional [`Mesh`]
//! leaves. Both loaded glTF assets and the procedural fallback are
//! expressed as node trees, so the composer treats them identically.

/// Axis-aligned bounding boxes.
pub mod bounds;
/// Owns the camera rig, lighting rig and the single organ slot.
pub mod composer;
/// Procedural stand-in organ used when a model fails to load.
pub mod fallback;
/// Ambient + directional light rig.
pub mod lighting;
/// Procedural geometry (spheres, smooth normals).
pub mod mesh_gen;

use std::sync::Arc;

use glam::{Mat4, Quat, Vec3};

pub use bounds::Aabb;
pub use composer::{OrganId, OrganNode, SceneComposer};
pub use fallback::FallbackBuilder;
pub use lighting::LightingRig;

/// Local translation / rotation / scale of a node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Translation applied after rotation and scale.
    pub translation: Vec3,
    /// Rotation applied after scale.
    pub rotation: Quat,
    /// Per-axis scale.
    pub scale: Vec3,
}

impl Transform {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    /// Translation-only transform.
    #[must_use]
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    /// Scale-then-translate transform.
    #[must_use]
    pub fn from_scale_translation(scale: Vec3, translation: Vec3) -> Self {
        Self {
            translation,
            rotation: Quat::IDENTITY,
            scale,
        }
    }

    /// Local matrix (`T * R * S`).
    #[must_use]
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            self.scale,
            self.rotation,
            self.translation,
        )
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Triangle geometry in local space.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Geometry {
    /// Vertex positions.
    pub positions: Vec<Vec3>,
    /// Per-vertex normals (same length as `positions`).
    pub normals: Vec<Vec3>,
    /// Triangle list indices into `positions`.
    pub indices: Vec<u32>,
}

impl Geometry {
    /// Number of triangles.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Whether there is nothing to draw.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty() || self.indices.is_empty()
    }
}

/// Flat Blinn-Phong surface parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    /// Linear RGB base color.
    pub color: [f32; 3],
    /// 0 = invisible, 1 = opaque.
    pub opacity: f32,
    /// Specular exponent.
    pub shininess: f32,
    /// Specular strength.
    pub specular: f32,
}

impl Material {
    /// Opaque material with the given color and specular response.
    #[must_use]
    pub fn flat(color: [f32; 3], shininess: f32, specular: f32) -> Self {
        Self {
            color,
            opacity: 1.0,
            shininess,
            specular,
        }
    }

    /// Copy with a different opacity.
    #[must_use]
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }

    /// Whether the material draws anything at all.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.opacity > 0.0
    }

    /// Whether blending is needed.
    #[must_use]
    pub fn is_translucent(&self) -> bool {
        self.opacity < 1.0
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::flat([0.8, 0.8, 0.8], 30.0, 0.25)
    }
}

/// What a mesh leaf represents. Loaded assets consist only of `Body`
/// meshes; the procedural fallback also produces the other roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeshRole {
    /// Organ tissue; recolored by health state.
    Body,
    /// Invisible indentation cue on the fallback body.
    Indentation,
    /// A cyst on the pathological fallback.
    Cyst,
}

/// A drawable leaf: shared geometry plus its own material.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    /// Geometry, shared between meshes built from the same primitive.
    pub geometry: Arc<Geometry>,
    /// Surface material.
    pub material: Material,
    /// Semantic role of the leaf.
    pub role: MeshRole,
}

impl Mesh {
    /// Body mesh with the default material.
    #[must_use]
    pub fn body(geometry: Arc<Geometry>) -> Self {
        Self {
            geometry,
            material: Material::default(),
            role: MeshRole::Body,
        }
    }
}

/// A node in the organ scene graph.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SceneNode {
    /// Debug name (glTF node name or a fixed label).
    pub name: String,
    /// Local transform relative to the parent.
    pub transform: Transform,
    /// Optional drawable attached to this node.
    pub mesh: Option<Mesh>,
    /// Child nodes.
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    /// Empty group node.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Leaf node holding a mesh.
    #[must_use]
    pub fn with_mesh(name: impl Into<String>, mesh: Mesh) -> Self {
        Self {
            name: name.into(),
            mesh: Some(mesh),
            ..Self::default()
        }
    }

    /// Builder-style transform override.
    #[must_use]
    pub fn transformed(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Append a child node.
    pub fn add_child(&mut self, child: SceneNode) {
        self.children.push(child);
    }

    /// Visit every mesh leaf with its world matrix, depth first, parents
    /// before children. `parent` is the matrix of this node's parent.
    pub fn visit_meshes(&self, parent: Mat4, f: &mut impl FnMut(&Mesh, Mat4)) {
        let world = parent * self.transform.matrix();
        if let Some(mesh) = &self.mesh {
            f(mesh, world);
        }
        for child in &self.children {
            child.visit_meshes(world, f);
        }
    }

    /// Visit every mesh leaf mutably, in the same order as
    /// [`visit_meshes`](Self::visit_meshes).
    pub fn visit_meshes_mut(&mut self, f: &mut impl FnMut(&mut Mesh)) {
        if let Some(mesh) = &mut self.mesh {
            f(mesh);
        }
        for child in &mut self.children {
            child.visit_meshes_mut(f);
        }
    }

    /// Total number of mesh leaves in the subtree.
    #[must_use]
    pub fn mesh_count(&self) -> usize {
        let mut count = 0;
        self.visit_meshes(Mat4::IDENTITY, &mut |_: &Mesh, _: Mat4| count += 1);
        count
    }

    /// Number of mesh leaves with the given role.
    #[must_use]
    pub fn count_role(&self, role: MeshRole) -> usize {
        let mut count = 0;
        self.visit_meshes(Mat4::IDENTITY, &mut |mesh: &Mesh, _: Mat4| {
            if mesh.role == role {
                count += 1;
            }
        });
        count
    }

    /// World-space bounding box of every vertex in the subtree, with this
    /// node's parent at `parent`. `None` if the subtree has no vertices.
    #[must_use]
    pub fn bounds(&self, parent: Mat4) -> Option<Aabb> {
        let mut aabb = Aabb::EMPTY;
        self.visit_meshes(parent, &mut |mesh: &Mesh, world: Mat4| {
            for p in &mesh.geometry.positions {
                aabb.extend(world.transform_point3(*p));
            }
        });
        (!aabb.is_empty()).then_some(aabb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_quad() -> Arc<Geometry> {
        Arc::new(Geometry {
            positions: vec![
                Vec3::new(-1.0, -1.0, 0.0),
                Vec3::new(1.0, -1.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(-1.0, 1.0, 0.0),
            ],
            normals: vec![Vec3::Z; 4],
            indices: vec![0, 1, 2, 0, 2, 3],
        })
    }

    #[test]
    fn bounds_follow_nested_transforms() {
        let mut root = SceneNode::new("root").transformed(
            Transform::from_scale_translation(Vec3::splat(2.0), Vec3::X),
        );
        root.add_child(
            SceneNode::with_mesh("quad", Mesh::body(unit_quad()))
                .transformed(Transform::from_translation(Vec3::Y)),
        );

        let aabb = root.bounds(Mat4::IDENTITY).unwrap();
        // child spans y in [0, 2], scaled by 2 then shifted +1 on x
        assert!((aabb.min - Vec3::new(-1.0, 0.0, 0.0)).length() < 1e-5);
        assert!((aabb.max - Vec3::new(3.0, 4.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn empty_tree_has_no_bounds() {
        let root = SceneNode::new("empty");
        assert!(root.bounds(Mat4::IDENTITY).is_none());
        assert_eq!(root.mesh_count(), 0);
    }

    #[test]
    fn visit_mut_reaches_every_leaf() {
        let mut root = SceneNode::with_mesh("a", Mesh::body(unit_quad()));
        root.add_child(SceneNode::with_mesh("b", Mesh::body(unit_quad())));
        root.visit_meshes_mut(&mut |m: &mut Mesh| {
            m.material.color = [1.0, 0.0, 0.0];
        });

        let mut colors = Vec::new();
        root.visit_meshes(Mat4::IDENTITY, &mut |m: &Mesh, _: Mat4| {
            colors.push(m.material.color);
        });
        assert_eq!(colors, vec![[1.0, 0.0, 0.0]; 2]);
        assert_eq!(root.count_role(MeshRole::Body), 2);
    }

    #[test]
    fn opacity_is_clamped() {
        let m = Material::default().with_opacity(1.5);
        assert_eq!(m.opacity, 1.0);
        assert!(!m.is_translucent());
        assert!(!Material::default().with_opacity(0.0).is_visible());
    }
}
