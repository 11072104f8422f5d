use std::sync::Arc;

use glam::Vec3;
use rand::Rng;

use super::mesh_gen::{uv_sphere, SPHERE_HEIGHT_SEGMENTS, SPHERE_WIDTH_SEGMENTS};
use super::{Geometry, Material, Mesh, MeshRole, SceneNode, Transform};
use crate::options::DisplayOptions;

/// Number of cysts on the pathological stand-in.
pub const CYST_COUNT: usize = 3;

const BODY_SCALE: Vec3 = Vec3::new(1.0, 0.7, 0.5);
const INDENTATION_SCALE: f32 = 0.45;
const INDENTATION_OFFSET: Vec3 = Vec3::new(-0.6, 0.0, 0.0);
const CYST_X: (f32, f32) = (-0.4, 0.4);
const CYST_Y: (f32, f32) = (-0.2, 0.2);
const CYST_Z: (f32, f32) = (0.2, 0.4);
const CYST_SCALE: (f32, f32) = (0.2, 0.5);

/// Builds the procedural kidney shown when a model cannot be loaded: an
/// ellipsoid body with a hidden indentation sphere and, for the
/// pathological variant, a few translucent cysts.
#[derive(Debug, Clone)]
pub struct FallbackBuilder {
    sphere: Arc<Geometry>,
    healthy_body: Material,
    pathological_body: Material,
    cyst: Material,
}

impl FallbackBuilder {
    /// Builder using the palette from the display options.
    #[must_use]
    pub fn new(display: &DisplayOptions) -> Self {
        Self {
            sphere: Arc::new(uv_sphere(
                SPHERE_WIDTH_SEGMENTS,
                SPHERE_HEIGHT_SEGMENTS,
            )),
            healthy_body: display.body_material(true),
            pathological_body: display.body_material(false),
            cyst: display.cyst_material(),
        }
    }

    /// Build a stand-in with thread-local randomness for cyst placement.
    #[must_use]
    pub fn build(&self, healthy: bool) -> SceneNode {
        self.build_with_rng(healthy, &mut rand::rng())
    }

    /// Build a stand-in drawing cyst placement from `rng`.
    #[must_use]
    pub fn build_with_rng<R: Rng>(
        &self,
        healthy: bool,
        rng: &mut R,
    ) -> SceneNode {
        let mut group = SceneNode::new(if healthy {
            "fallback_healthy"
        } else {
            "fallback_polycystic"
        });

        let body_material = if healthy {
            self.healthy_body
        } else {
            self.pathological_body
        };
        group.add_child(
            SceneNode::with_mesh(
                "body",
                self.sphere_mesh(body_material, MeshRole::Body),
            )
            .transformed(Transform::from_scale_translation(
                BODY_SCALE,
                Vec3::ZERO,
            )),
        );

        group.add_child(
            SceneNode::with_mesh(
                "indentation",
                self.sphere_mesh(
                    body_material.with_opacity(0.0),
                    MeshRole::Indentation,
                ),
            )
            .transformed(Transform::from_scale_translation(
                Vec3::splat(INDENTATION_SCALE),
                INDENTATION_OFFSET,
            )),
        );

        if !healthy {
            for i in 0..CYST_COUNT {
                let position = Vec3::new(
                    rng.random_range(CYST_X.0..=CYST_X.1),
                    rng.random_range(CYST_Y.0..=CYST_Y.1),
                    rng.random_range(CYST_Z.0..=CYST_Z.1),
                );
                let scale = rng.random_range(CYST_SCALE.0..=CYST_SCALE.1);
                group.add_child(
                    SceneNode::with_mesh(
                        format!("cyst_{i}"),
                        self.sphere_mesh(self.cyst, MeshRole::Cyst),
                    )
                    .transformed(Transform::from_scale_translation(
                        Vec3::splat(scale),
                        position,
                    )),
                );
            }
        }

        group
    }

    fn sphere_mesh(&self, material: Material, role: MeshRole) -> Mesh {
        Mesh {
            geometry: Arc::clone(&self.sphere),
            material,
            role,
        }
    }
}

impl Default for FallbackBuilder {
    fn default() -> Self {
        Self::new(&DisplayOptions::default())
    }
}
