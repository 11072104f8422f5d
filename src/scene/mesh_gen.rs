use std::f32::consts::{PI, TAU};

use glam::Vec3;

use super::Geometry;

/// Width segments of the shared organ sphere.
pub const SPHERE_WIDTH_SEGMENTS: u32 = 32;
/// Height segments of the shared organ sphere.
pub const SPHERE_HEIGHT_SEGMENTS: u32 = 16;

/// Unit-radius UV sphere centered at the origin.
///
/// Vertices are laid out ring by ring from the +Y pole to the -Y pole with
/// a duplicated seam column, so there are
/// `(width_segments + 1) * (height_segments + 1)` vertices. Degenerate
/// triangles at the poles are skipped.
#[must_use]
pub fn uv_sphere(width_segments: u32, height_segments: u32) -> Geometry {
    let width_segments = width_segments.max(3);
    let height_segments = height_segments.max(2);
    let ring = width_segments + 1;

    let mut positions =
        Vec::with_capacity((ring * (height_segments + 1)) as usize);
    for iy in 0..=height_segments {
        let v = iy as f32 / height_segments as f32;
        let theta = v * PI;
        for ix in 0..=width_segments {
            let u = ix as f32 / width_segments as f32;
            let phi = u * TAU;
            positions.push(Vec3::new(
                -phi.cos() * theta.sin(),
                theta.cos(),
                phi.sin() * theta.sin(),
            ));
        }
    }

    let mut indices = Vec::with_capacity(
        (width_segments * (height_segments - 1) * 6) as usize,
    );
    for iy in 0..height_segments {
        for ix in 0..width_segments {
            let a = iy * ring + ix + 1;
            let b = iy * ring + ix;
            let c = (iy + 1) * ring + ix;
            let d = (iy + 1) * ring + ix + 1;
            if iy != 0 {
                indices.extend_from_slice(&[a, b, d]);
            }
            if iy != height_segments - 1 {
                indices.extend_from_slice(&[b, c, d]);
            }
        }
    }

    // On a unit sphere the normal is the position.
    let normals = positions.clone();
    Geometry {
        positions,
        normals,
        indices,
    }
}

/// Area-weighted smooth vertex normals for an indexed triangle list.
///
/// Vertices not referenced by any triangle get +Y. Out-of-range indices
/// are ignored.
#[must_use]
pub fn smooth_normals(positions: &[Vec3], indices: &[u32]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; positions.len()];
    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let (Some(pa), Some(pb), Some(pc)) =
            (positions.get(a), positions.get(b), positions.get(c))
        else {
            continue;
        };
        // Unnormalized cross product weights by triangle area.
        let face = (*pb - *pa).cross(*pc - *pa);
        normals[a] += face;
        normals[b] += face;
        normals[c] += face;
    }
    normals
        .into_iter()
        .map(|n| n.try_normalize().unwrap_or(Vec3::Y))
        .collect()
}
