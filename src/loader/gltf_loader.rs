use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;

use glam::{Quat, Vec3};

use super::{AssetLoader, LoadError};
use crate::scene::mesh_gen::smooth_normals;
use crate::scene::{Geometry, Mesh, SceneNode, Transform};

/// Largest remote model accepted, in bytes.
#[cfg(feature = "remote")]
const MAX_REMOTE_BYTES: u64 = 64 * 1024 * 1024;

/// Loads `.glb` / `.gltf` files from disk, or from `http(s)://` URLs when
/// the `remote` feature is enabled.
///
/// The default scene (or the first one) becomes a node tree mirroring the
/// glTF hierarchy. Every triangle primitive becomes a `Body` mesh leaf;
/// missing normals are regenerated and non-indexed primitives get a
/// sequential index list.
#[derive(Debug, Clone, Copy, Default)]
pub struct GltfLoader;

impl GltfLoader {
    /// New loader.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Parse the document and load its buffers. Images are never read:
    /// materials are replaced on display, so an undecodable or missing
    /// texture must not cost the geometry.
    fn import(url: &str) -> Result<ImportedGltf, LoadError> {
        let (gltf, base) = if is_remote(url) {
            let bytes = fetch(url)?;
            let gltf = gltf::Gltf::from_slice(&bytes)
                .map_err(|e| map_gltf_error(url, e))?;
            (gltf, None)
        } else {
            let path = Path::new(url);
            if !path.exists() {
                return Err(LoadError::NotFound(url.to_owned()));
            }
            let gltf =
                gltf::Gltf::open(path).map_err(|e| map_gltf_error(url, e))?;
            (gltf, path.parent())
        };
        let gltf::Gltf { document, blob } = gltf;
        let buffers = gltf::import_buffers(&document, base, blob)
            .map_err(|e| map_buffer_error(url, e))?;
        Ok((document, buffers))
    }
}

type ImportedGltf = (gltf::Document, Vec<gltf::buffer::Data>);

impl AssetLoader for GltfLoader {
    fn load(&self, url: &str) -> Result<SceneNode, LoadError> {
        let (doc, buffers) = Self::import(url)?;

        let scene = doc
            .default_scene()
            .or_else(|| doc.scenes().next())
            .ok_or_else(|| LoadError::NoGeometry(url.to_owned()))?;

        let mut root = SceneNode::new(scene.name().unwrap_or("scene"));
        for node in scene.nodes() {
            root.add_child(convert_node(&node, &buffers));
        }

        let meshes = root.mesh_count();
        if meshes == 0 {
            return Err(LoadError::NoGeometry(url.to_owned()));
        }
        log::debug!("loaded {url}: {meshes} mesh primitives");
        Ok(root)
    }
}

fn is_remote(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

#[cfg(feature = "remote")]
fn fetch(url: &str) -> Result<Vec<u8>, LoadError> {
    let response = ureq::get(url).call().map_err(|e| match e {
        ureq::Error::StatusCode(404) => LoadError::NotFound(url.to_owned()),
        other => LoadError::Network(other.to_string()),
    })?;
    let mut body = response.into_body();
    body.with_config()
        .limit(MAX_REMOTE_BYTES)
        .read_to_vec()
        .map_err(|e| LoadError::Network(e.to_string()))
}

#[cfg(not(feature = "remote"))]
fn fetch(url: &str) -> Result<Vec<u8>, LoadError> {
    Err(LoadError::Network(format!(
        "{url}: remote models need the `remote` feature"
    )))
}

fn map_gltf_error(url: &str, error: gltf::Error) -> LoadError {
    match error {
        gltf::Error::Io(e) if e.kind() == ErrorKind::NotFound => {
            LoadError::NotFound(url.to_owned())
        }
        gltf::Error::Io(e) => LoadError::from(e),
        other => LoadError::Parse(format!("{url}: {other}")),
    }
}

/// The model file itself exists at this point, so a missing file here is
/// a missing external buffer: a broken asset, not a missing one.
fn map_buffer_error(url: &str, error: gltf::Error) -> LoadError {
    match error {
        gltf::Error::Io(e) if e.kind() != ErrorKind::NotFound => {
            LoadError::from(e)
        }
        other => LoadError::Parse(format!("{url}: {other}")),
    }
}

fn convert_node(node: &gltf::Node<'_>, buffers: &[gltf::buffer::Data]) -> SceneNode {
    let (translation, rotation, scale) = node.transform().decomposed();
    let mut out = SceneNode::new(node.name().unwrap_or_default()).transformed(
        Transform {
            translation: Vec3::from(translation),
            rotation: Quat::from_array(rotation),
            scale: Vec3::from(scale),
        },
    );

    if let Some(mesh) = node.mesh() {
        for (i, primitive) in mesh.primitives().enumerate() {
            if let Some(geometry) = read_primitive(&primitive, buffers) {
                let name = format!("{}#{i}", mesh.name().unwrap_or("mesh"));
                out.add_child(SceneNode::with_mesh(
                    name,
                    Mesh::body(Arc::new(geometry)),
                ));
            }
        }
    }

    for child in node.children() {
        out.add_child(convert_node(&child, buffers));
    }
    out
}

/// Triangle geometry of one primitive, or `None` for points/lines and
/// primitives without positions.
fn read_primitive(
    primitive: &gltf::Primitive<'_>,
    buffers: &[gltf::buffer::Data],
) -> Option<Geometry> {
    if primitive.mode() != gltf::mesh::Mode::Triangles {
        return None;
    }
    let reader =
        primitive.reader(|buffer| buffers.get(buffer.index()).map(|d| d.0.as_slice()));

    let positions: Vec<Vec3> = reader.read_positions()?.map(Vec3::from).collect();
    let indices: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..positions.len() as u32).collect(),
    };
    let normals: Vec<Vec3> = reader
        .read_normals()
        .map(|n| n.map(Vec3::from).collect::<Vec<_>>())
        .filter(|n| n.len() == positions.len())
        .unwrap_or_else(|| smooth_normals(&positions, &indices));

    let geometry = Geometry {
        positions,
        normals,
        indices,
    };
    (!geometry.is_empty()).then_some(geometry)
}

#[cfg(test)]
mod tests {
    use glam::Mat4;

    use super::*;

    /// One triangle in the XY plane: positions (f32 x 9) then u16 indices.
    fn triangle_bin() -> Vec<u8> {
        let mut bytes = Vec::new();
        for v in [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        for i in [0u16, 1, 2] {
            bytes.extend_from_slice(&i.to_le_bytes());
        }
        bytes
    }

    const TRIANGLE_GLTF: &str = r#"{
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [ { "nodes": [0] } ],
        "nodes": [ { "name": "kidney", "mesh": 0, "translation": [1.0, 0.0, 0.0] } ],
        "meshes": [ { "name": "tri", "primitives": [ { "attributes": { "POSITION": 0 }, "indices": 1 } ] } ],
        "buffers": [ { "uri": "tri.bin", "byteLength": 42 } ],
        "bufferViews": [
            { "buffer": 0, "byteOffset": 0, "byteLength": 36, "target": 34962 },
            { "buffer": 0, "byteOffset": 36, "byteLength": 6, "target": 34963 }
        ],
        "accessors": [
            { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
              "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] },
            { "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" }
        ]
    }"#;

    /// The triangle with an albedo texture gltf cannot decode, plus a
    /// second texture whose file does not exist.
    const TEXTURED_GLTF: &str = r#"{
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [ { "nodes": [0] } ],
        "nodes": [ { "name": "kidney", "mesh": 0 } ],
        "meshes": [ { "name": "tri", "primitives": [ { "attributes": { "POSITION": 0 }, "indices": 1, "material": 0 } ] } ],
        "materials": [ { "pbrMetallicRoughness": { "baseColorTexture": { "index": 0 } },
                         "normalTexture": { "index": 1 } } ],
        "textures": [ { "source": 0 }, { "source": 1 } ],
        "images": [ { "uri": "kidney_albedo.ktx2", "mimeType": "image/ktx2" },
                    { "uri": "kidney_normal.png" } ],
        "buffers": [ { "uri": "tri.bin", "byteLength": 42 } ],
        "bufferViews": [
            { "buffer": 0, "byteOffset": 0, "byteLength": 36, "target": 34962 },
            { "buffer": 0, "byteOffset": 36, "byteLength": 6, "target": 34963 }
        ],
        "accessors": [
            { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
              "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] },
            { "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" }
        ]
    }"#;

    const EMPTY_GLTF: &str = r#"{
        "asset": { "version": "2.0" },
        "scenes": [ { "nodes": [0] } ],
        "nodes": [ { "name": "empty" } ]
    }"#;

    fn temp_dir(tag: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir()
            .join(format!("nephroview-gltf-{tag}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn loads_triangle_with_generated_normals() {
        let dir = temp_dir("tri");
        std::fs::write(dir.join("tri.bin"), triangle_bin()).unwrap();
        let path = dir.join("kidney.gltf");
        std::fs::write(&path, TRIANGLE_GLTF).unwrap();

        let node = GltfLoader::new().load(path.to_str().unwrap()).unwrap();
        assert_eq!(node.mesh_count(), 1);

        let mut seen = 0;
        node.visit_meshes(Mat4::IDENTITY, &mut |mesh: &Mesh, world: Mat4| {
            seen += 1;
            assert_eq!(mesh.geometry.indices, vec![0, 1, 2]);
            for n in &mesh.geometry.normals {
                assert!((*n - Vec3::Z).length() < 1e-5);
            }
            // node translation carried through
            let p = world.transform_point3(mesh.geometry.positions[0]);
            assert!((p - Vec3::X).length() < 1e-6);
        });
        assert_eq!(seen, 1);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn textures_are_not_needed_for_geometry() {
        let dir = temp_dir("textured");
        std::fs::write(dir.join("tri.bin"), triangle_bin()).unwrap();
        std::fs::write(dir.join("kidney_albedo.ktx2"), b"KTX2 not really")
            .unwrap();
        let path = dir.join("kidney.gltf");
        std::fs::write(&path, TEXTURED_GLTF).unwrap();

        let node = GltfLoader::new().load(path.to_str().unwrap()).unwrap();
        assert_eq!(node.mesh_count(), 1);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_buffer_is_a_parse_error() {
        let dir = temp_dir("nobuffer");
        let path = dir.join("kidney.gltf");
        std::fs::write(&path, TRIANGLE_GLTF).unwrap();

        let err = GltfLoader::new().load(path.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, LoadError::Parse(_)));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn scene_without_meshes_is_no_geometry() {
        let dir = temp_dir("empty");
        let path = dir.join("empty.gltf");
        std::fs::write(&path, EMPTY_GLTF).unwrap();

        let err = GltfLoader::new().load(path.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, LoadError::NoGeometry(_)));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = GltfLoader::new()
            .load("/definitely/not/here/human_kidney.glb")
            .unwrap_err();
        assert!(matches!(err, LoadError::NotFound(_)));
    }

    #[test]
    fn garbage_is_a_parse_error() {
        let dir = temp_dir("garbage");
        let path = dir.join("broken.glb");
        std::fs::write(&path, b"this is not a model").unwrap();

        let err = GltfLoader::new().load(path.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, LoadError::Parse(_)));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[cfg(not(feature = "remote"))]
    #[test]
    fn remote_urls_need_the_feature() {
        let err = GltfLoader::new()
            .load("https://example.org/human_kidney.glb")
            .unwrap_err();
        assert!(matches!(err, LoadError::Network(_)));
    }
}
