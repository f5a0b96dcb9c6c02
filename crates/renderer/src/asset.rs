//! glTF / GLB model decoding into [`ModelData`].

use crate::mesh::{MeshData, Topology};
use crate::model::{Material, MaterialKind, ModelData, ModelPrimitive};
use crate::vertex::Vertex;
use glam::{Mat4, Vec4};
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Mesh compression extensions this decoder has no plugin for.
pub const UNSUPPORTED_COMPRESSION: &[&str] = &["KHR_draco_mesh_compression", "EXT_meshopt_compression"];

const READ_CHUNK: usize = 64 * 1024;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("could not read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode model: {0}")]
    Decode(#[from] gltf::Error),
    #[error("model requires {0}, but no decoder for it is available")]
    MissingDecoder(String),
    #[error("model contains no triangle geometry")]
    NoGeometry,
}

/// Read a file in chunks, reporting `(bytes_loaded, bytes_total)` after each chunk.
pub fn read_with_progress(path: &Path, mut progress: impl FnMut(u64, u64)) -> Result<Vec<u8>, AssetError> {
    let io_err = |source| AssetError::Io { path: path.to_path_buf(), source };
    let mut file = std::fs::File::open(path).map_err(io_err)?;
    let total = file.metadata().map(|m| m.len()).unwrap_or(0);

    let mut bytes = Vec::with_capacity(total as usize);
    let mut chunk = vec![0u8; READ_CHUNK];
    loop {
        let n = file.read(&mut chunk).map_err(io_err)?;
        if n == 0 {
            break;
        }
        bytes.extend_from_slice(&chunk[..n]);
        progress(bytes.len() as u64, total.max(bytes.len() as u64));
    }
    Ok(bytes)
}

/// Load a model from disk and normalize its materials.
///
/// External buffers of a `.gltf` resolve relative to the file's directory.
pub fn load_model(path: &Path, progress: impl FnMut(u64, u64)) -> Result<ModelData, AssetError> {
    let bytes = read_with_progress(path, progress)?;
    let mut model = decode_model(&bytes, path.parent())?;
    if model.name.is_none() {
        model.name = path.file_stem().map(|s| s.to_string_lossy().into_owned());
    }
    model.normalize_materials();
    log::info!(
        "Loaded model {:?}: {} primitives, {} triangles, {} materials",
        path,
        model.primitives.len(),
        model.triangle_count(),
        model.materials.len()
    );
    Ok(model)
}

/// Decode glTF JSON or GLB bytes. Materials are returned as authored (not yet normalized).
pub fn decode_model(bytes: &[u8], base: Option<&Path>) -> Result<ModelData, AssetError> {
    let gltf = match gltf::Gltf::from_slice(bytes) {
        Ok(gltf) => gltf,
        // The validator rejects documents that require unknown extensions, so look for
        // a compression extension by name before reporting a generic decode failure.
        Err(e) => {
            return Err(match mentioned_compression(bytes) {
                Some(ext) => AssetError::MissingDecoder(ext.to_string()),
                None => AssetError::Decode(e),
            })
        }
    };

    if let Some(ext) = gltf
        .document
        .extensions_required()
        .find(|ext| UNSUPPORTED_COMPRESSION.contains(ext))
    {
        return Err(AssetError::MissingDecoder(ext.to_string()));
    }

    let gltf::Gltf { document, blob } = gltf;
    let buffers = gltf::import_buffers(&document, base, blob)?;

    let mut materials: Vec<Material> = document.materials().map(|m| read_material(&m)).collect();
    let default_slot = materials.len();
    let mut uses_default = false;
    let mut primitives = Vec::new();

    let scene = document.default_scene().or_else(|| document.scenes().next());
    let mut stack: Vec<(gltf::Node, Mat4)> = match &scene {
        Some(scene) => scene.nodes().map(|n| (n, Mat4::IDENTITY)).collect(),
        None => document.nodes().map(|n| (n, Mat4::IDENTITY)).collect(),
    };

    while let Some((node, parent)) = stack.pop() {
        let world = parent * Mat4::from_cols_array_2d(&node.transform().matrix());
        if let Some(mesh) = node.mesh() {
            for primitive in mesh.primitives() {
                if primitive.mode() != gltf::mesh::Mode::Triangles {
                    log::debug!("Skipping non-triangle primitive in mesh {:?}", mesh.name());
                    continue;
                }
                let Some(data) = read_primitive(&primitive, &buffers) else {
                    continue;
                };
                let material = primitive.material().index().unwrap_or_else(|| {
                    uses_default = true;
                    default_slot
                });
                primitives.push(ModelPrimitive { mesh: data, material, transform: world });
            }
        }
        stack.extend(node.children().map(|child| (child, world)));
    }

    if primitives.is_empty() {
        return Err(AssetError::NoGeometry);
    }
    if uses_default {
        materials.push(Material::default());
    }

    Ok(ModelData {
        name: scene.as_ref().and_then(|s| s.name().map(str::to_owned)),
        primitives,
        materials,
    })
}

fn read_material(material: &gltf::Material) -> Material {
    let pbr = material.pbr_metallic_roughness();
    let color = Vec4::from(pbr.base_color_factor());
    Material {
        name: material.name().map(str::to_owned),
        kind: MaterialKind::Standard,
        color,
        texture: pbr.base_color_texture().map(|info| info.texture().index()),
        transparent: material.alpha_mode() == gltf::material::AlphaMode::Blend,
        opacity: color.w,
        double_sided: material.double_sided(),
    }
}

fn read_primitive(primitive: &gltf::Primitive, buffers: &[gltf::buffer::Data]) -> Option<MeshData> {
    let reader = primitive.reader(|b| buffers.get(b.index()).map(|d| d.0.as_slice()));
    let positions: Vec<[f32; 3]> = reader.read_positions()?.collect();
    let normals: Vec<[f32; 3]> = reader.read_normals().map(|n| n.collect()).unwrap_or_default();
    let uvs: Vec<[f32; 2]> = reader
        .read_tex_coords(0)
        .map(|t| t.into_f32().collect())
        .unwrap_or_default();
    let colors: Vec<[f32; 4]> = reader
        .read_colors(0)
        .map(|c| c.into_rgba_f32().collect())
        .unwrap_or_default();

    let vertices = positions
        .iter()
        .enumerate()
        .map(|(i, &position)| {
            Vertex::with_color(
                position,
                normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]),
                uvs.get(i).copied().unwrap_or([0.0, 0.0]),
                colors.get(i).copied().unwrap_or([1.0; 4]),
            )
        })
        .collect::<Vec<_>>();

    let indices: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..vertices.len() as u32).collect(),
    };
    if indices.iter().any(|&i| i as usize >= vertices.len()) {
        log::warn!("Primitive has out-of-range indices, skipping");
        return None;
    }

    Some(MeshData { vertices, indices, topology: Topology::Triangles })
}

fn mentioned_compression(bytes: &[u8]) -> Option<&'static str> {
    UNSUPPORTED_COMPRESSION
        .iter()
        .copied()
        .find(|ext| bytes.windows(ext.len()).any(|w| w == ext.as_bytes()))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use glam::Vec3;

    /// Minimal GLB: one triangle under a translated node, one material.
    pub(crate) fn triangle_glb(extra_json: &str) -> Vec<u8> {
        let mut bin = Vec::new();
        for p in [[0.0f32, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]] {
            for c in p {
                bin.extend_from_slice(&c.to_le_bytes());
            }
        }
        let json = format!(
            r#"{{"asset":{{"version":"2.0"}},{extra}"scene":0,"scenes":[{{"nodes":[0]}}],
            "nodes":[{{"mesh":0,"translation":[0,1,0]}}],
            "meshes":[{{"primitives":[{{"attributes":{{"POSITION":0}},"material":0}}]}}],
            "materials":[{{"name":"Material","pbrMetallicRoughness":{{"baseColorFactor":[1.0,0.5,0.2,1.0]}}}}],
            "accessors":[{{"bufferView":0,"componentType":5126,"count":3,"type":"VEC3","min":[0,0,0],"max":[1,1,0]}}],
            "bufferViews":[{{"buffer":0,"byteLength":36}}],
            "buffers":[{{"byteLength":36}}]}}"#,
            extra = extra_json
        );
        let mut json = json.into_bytes();
        while json.len() % 4 != 0 {
            json.push(b' ');
        }

        let total = 12 + 8 + json.len() + 8 + bin.len();
        let mut glb = Vec::with_capacity(total);
        glb.extend_from_slice(b"glTF");
        glb.extend_from_slice(&2u32.to_le_bytes());
        glb.extend_from_slice(&(total as u32).to_le_bytes());
        glb.extend_from_slice(&(json.len() as u32).to_le_bytes());
        glb.extend_from_slice(b"JSON");
        glb.extend_from_slice(&json);
        glb.extend_from_slice(&(bin.len() as u32).to_le_bytes());
        glb.extend_from_slice(b"BIN\0");
        glb.extend_from_slice(&bin);
        glb
    }

    #[test]
    fn decodes_triangle_with_node_transform() {
        let model = decode_model(&triangle_glb(""), None).unwrap();
        assert_eq!(model.primitives.len(), 1);
        assert_eq!(model.triangle_count(), 1);
        let (lo, hi) = model.bounds().unwrap();
        assert!((lo - Vec3::new(0.0, 1.0, 0.0)).length() < 1e-6);
        assert!((hi - Vec3::new(1.0, 2.0, 0.0)).length() < 1e-6);
        assert_eq!(model.materials[0].kind, MaterialKind::Standard);
    }

    #[test]
    fn load_model_normalizes_materials_once() {
        let path = std::env::temp_dir().join(format!("island-asset-{}.glb", std::process::id()));
        std::fs::write(&path, triangle_glb("")).unwrap();
        let mut last = (0, 0);
        let model = load_model(&path, |loaded, total| last = (loaded, total)).unwrap();
        std::fs::remove_file(&path).ok();

        let material = &model.materials[0];
        assert_eq!(material.kind, MaterialKind::Basic);
        assert!((material.color - Vec4::new(0.7, 0.35, 0.14, 1.0)).length() < 1e-6);
        assert_eq!(last.0, last.1);
        assert!(last.0 > 0);
    }

    #[test]
    fn draco_documents_report_missing_decoder() {
        let glb = triangle_glb(
            r#""extensionsUsed":["KHR_draco_mesh_compression"],"extensionsRequired":["KHR_draco_mesh_compression"],"#,
        );
        match decode_model(&glb, None) {
            Err(AssetError::MissingDecoder(ext)) => assert_eq!(ext, "KHR_draco_mesh_compression"),
            other => panic!("expected MissingDecoder, got {:?}", other.map(|m| m.primitives.len())),
        }
    }

    #[test]
    fn garbage_and_missing_files_are_errors() {
        assert!(matches!(decode_model(b"not a model", None), Err(AssetError::Decode(_))));
        let missing = Path::new("/definitely/not/here/house.gltf");
        assert!(matches!(load_model(missing, |_, _| {}), Err(AssetError::Io { .. })));
    }
}
