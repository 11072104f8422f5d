use glam::{Mat4, Quat, Vec3};

use super::{Aabb, LightingRig, Material, Mesh, MeshRole, SceneNode, Transform};
use crate::camera::CameraRig;
use crate::options::DisplayOptions;

/// Max extent of every organ after normalization.
pub const NORMALIZED_EXTENT: f32 = 2.0;

/// Identity of one attached organ, used to key its GPU buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OrganId(pub u64);

/// The organ currently in the scene: `pivot -> normalizer -> asset`.
///
/// The pivot carries the turntable rotation, the normalizer centers and
/// rescales the asset, and the asset subtree is left as loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct OrganNode {
    id: OrganId,
    healthy: bool,
    yaw: f32,
    pivot: SceneNode,
}

impl OrganNode {
    /// Identity of this organ.
    #[must_use]
    pub fn id(&self) -> OrganId {
        self.id
    }

    /// Health variant the organ was displayed as.
    #[must_use]
    pub fn healthy(&self) -> bool {
        self.healthy
    }

    /// Accumulated Y rotation of the pivot in radians.
    #[must_use]
    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    /// Rotate the pivot about +Y by `step` radians.
    pub fn rotate_y(&mut self, step: f32) {
        self.yaw += step;
        self.pivot.transform.rotation = Quat::from_rotation_y(self.yaw);
    }

    /// Root of the organ subtree (the pivot node).
    #[must_use]
    pub fn root(&self) -> &SceneNode {
        &self.pivot
    }

    /// World-space bounds of the organ, or `None` if it has no vertices.
    #[must_use]
    pub fn bounds(&self) -> Option<Aabb> {
        self.pivot.bounds(Mat4::IDENTITY)
    }
}

/// Scale/offset that maps `aabb` to a box of max extent
/// [`NORMALIZED_EXTENT`] centered at the origin. Empty or flat-zero boxes
/// get the identity.
#[must_use]
pub fn normalizing_transform(aabb: Option<Aabb>) -> Transform {
    let Some(aabb) = aabb else {
        return Transform::IDENTITY;
    };
    let extent = aabb.max_extent();
    if !extent.is_finite() || extent <= f32::EPSILON {
        return Transform::IDENTITY;
    }
    let scale = NORMALIZED_EXTENT / extent;
    Transform::from_scale_translation(
        Vec3::splat(scale),
        -aabb.center() * scale,
    )
}

/// Give every `Body` leaf the same flat material. Other roles are left
/// untouched.
pub fn recolor(node: &mut SceneNode, material: Material) {
    node.visit_meshes_mut(&mut |mesh: &mut Mesh| {
        if mesh.role == MeshRole::Body {
            mesh.material = material;
        }
    });
}

/// Most disposed organ ids kept for GPU release. A renderer holds at most
/// one organ resident and drops it whenever the attached organ changes, so
/// only the newest ids matter.
pub const RELEASE_QUEUE_LIMIT: usize = 4;

/// Owns the camera rig, the lighting rig and the single organ slot.
#[derive(Debug)]
pub struct SceneComposer {
    camera: CameraRig,
    lighting: LightingRig,
    organ: Option<OrganNode>,
    healthy_material: Material,
    pathological_material: Material,
    next_id: u64,
    pending_release: Vec<OrganId>,
    disposed_total: usize,
}

impl SceneComposer {
    /// Empty scene with the given rigs and body palette.
    #[must_use]
    pub fn new(
        camera: CameraRig,
        lighting: LightingRig,
        display: &DisplayOptions,
    ) -> Self {
        Self {
            camera,
            lighting,
            organ: None,
            healthy_material: display.body_material(true),
            pathological_material: display.body_material(false),
            next_id: 0,
            pending_release: Vec::new(),
            disposed_total: 0,
        }
    }

    /// Recolor, normalize and attach `node` as the organ, disposing any
    /// organ already attached.
    pub fn display(&mut self, mut node: SceneNode, healthy: bool) -> OrganId {
        recolor(&mut node, self.body_material(healthy));

        let normalizer = SceneNode {
            name: "normalizer".into(),
            transform: normalizing_transform(node.bounds(Mat4::IDENTITY)),
            mesh: None,
            children: vec![node],
        };
        let mut pivot = SceneNode::new("pivot");
        pivot.add_child(normalizer);
        self.replace(pivot, healthy)
    }

    /// Swap the organ slot: dispose the current organ, then attach `pivot`
    /// unchanged as the new one. [`display`](Self::display) is the usual
    /// caller; `pivot` is the node the frame loop turns.
    pub fn replace(&mut self, pivot: SceneNode, healthy: bool) -> OrganId {
        let _ = self.dispose_current();

        let id = OrganId(self.next_id);
        self.next_id += 1;
        log::debug!(
            "attached organ {} ({} meshes, healthy={healthy})",
            id.0,
            pivot.mesh_count()
        );
        self.organ = Some(OrganNode {
            id,
            healthy,
            yaw: 0.0,
            pivot,
        });
        id
    }

    /// Detach and dispose the current organ. Its id is queued for GPU
    /// release; the queue keeps only the newest
    /// [`RELEASE_QUEUE_LIMIT`] ids.
    pub fn dispose_current(&mut self) -> Option<OrganId> {
        let organ = self.organ.take()?;
        self.pending_release.push(organ.id);
        if self.pending_release.len() > RELEASE_QUEUE_LIMIT {
            let _ = self.pending_release.remove(0);
        }
        self.disposed_total += 1;
        Some(organ.id)
    }

    /// The attached organ, if any.
    #[must_use]
    pub fn organ(&self) -> Option<&OrganNode> {
        self.organ.as_ref()
    }

    /// Mutable access to the attached organ.
    pub fn organ_mut(&mut self) -> Option<&mut OrganNode> {
        self.organ.as_mut()
    }

    /// The camera rig.
    #[must_use]
    pub fn camera(&self) -> &CameraRig {
        &self.camera
    }

    /// Mutable camera rig.
    pub fn camera_mut(&mut self) -> &mut CameraRig {
        &mut self.camera
    }

    /// The lighting rig.
    #[must_use]
    pub fn lighting(&self) -> &LightingRig {
        &self.lighting
    }

    /// Adopt a new palette and restyle the attached organ in place: `Body`
    /// leaves get the body material, cysts the cyst material. Geometry and
    /// ids are unchanged, so no GPU re-upload is needed.
    pub fn set_palette(&mut self, display: &DisplayOptions) {
        self.healthy_material = display.body_material(true);
        self.pathological_material = display.body_material(false);
        let body = self.body_material(
            self.organ.as_ref().map_or(true, OrganNode::healthy),
        );
        let cyst = display.cyst_material();
        if let Some(organ) = &mut self.organ {
            organ.pivot.visit_meshes_mut(&mut |mesh: &mut Mesh| {
                match mesh.role {
                    MeshRole::Body => mesh.material = body,
                    MeshRole::Cyst => mesh.material = cyst,
                    MeshRole::Indentation => {}
                }
            });
        }
    }

    /// Body material used for the given health state.
    #[must_use]
    pub fn body_material(&self, healthy: bool) -> Material {
        if healthy {
            self.healthy_material
        } else {
            self.pathological_material
        }
    }

    /// Drain the ids of disposed organs whose GPU buffers should be
    /// released.
    pub fn take_released(&mut self) -> Vec<OrganId> {
        std::mem::take(&mut self.pending_release)
    }

    /// Number of disposed organs whose release has not been drained yet.
    #[must_use]
    pub fn pending_release_count(&self) -> usize {
        self.pending_release.len()
    }

    /// Total organs disposed over the composer's lifetime.
    #[must_use]
    pub fn disposed_count(&self) -> usize {
        self.disposed_total
    }
}
