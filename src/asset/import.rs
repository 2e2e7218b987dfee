//! glTF 2.0 import into [`ModelData`].
//!
//! The default scene (or the first one) is walked depth-first; each
//! triangle primitive becomes a [`MeshData`] carrying its accumulated node
//! matrix. Non-triangle primitives are skipped.

use std::path::Path;

use glam::{Mat4, Vec3};

use super::{AssetError, MaterialData, MeshData, ModelData, TextureData, Vertex};
use crate::scene::bounds::Aabb;

/// Import a `.gltf` or `.glb` file, resolving external resources relative
/// to its directory.
///
/// # Errors
///
/// Returns [`AssetError::Gltf`] for malformed documents or missing
/// resources and [`AssetError::EmptyScene`] when nothing drawable remains.
pub fn import_file(path: &Path, name: &str) -> Result<ModelData, AssetError> {
    let (document, buffers, images) = gltf::import(path)?;

    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or(AssetError::EmptyScene)?;

    let mut meshes = Vec::new();
    for node in scene.nodes() {
        collect_node(&node, Mat4::IDENTITY, &buffers, &mut meshes);
    }
    if meshes.is_empty() {
        return Err(AssetError::EmptyScene);
    }

    let materials = document.materials().map(|m| read_material(&m)).collect();
    let textures = document
        .textures()
        .map(|t| images.get(t.source().index()).and_then(convert_image))
        .collect();

    let model = ModelData {
        name: name.to_owned(),
        meshes,
        materials,
        textures,
    };
    log::info!(
        "Imported {name}: {} meshes, {} triangles",
        model.meshes.len(),
        model.triangle_count()
    );
    Ok(model)
}

fn collect_node(
    node: &gltf::Node<'_>,
    parent: Mat4,
    buffers: &[gltf::buffer::Data],
    out: &mut Vec<MeshData>,
) {
    let transform =
        parent * Mat4::from_cols_array_2d(&node.transform().matrix());
    if let Some(mesh) = node.mesh() {
        for primitive in mesh.primitives() {
            if let Some(data) = read_primitive(&primitive, transform, buffers) {
                out.push(data);
            }
        }
    }
    for child in node.children() {
        collect_node(&child, transform, buffers, out);
    }
}

fn read_primitive(
    primitive: &gltf::Primitive<'_>,
    transform: Mat4,
    buffers: &[gltf::buffer::Data],
) -> Option<MeshData> {
    if primitive.mode() != gltf::mesh::Mode::Triangles {
        log::debug!("Skipping {:?} primitive", primitive.mode());
        return None;
    }
    let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));
    let positions: Vec<[f32; 3]> = reader.read_positions()?.collect();
    if positions.is_empty() {
        return None;
    }

    let indices: Vec<u32> = reader.read_indices().map_or_else(
        || (0..positions.len() as u32).collect(),
        |i| i.into_u32().collect(),
    );
    let normals: Option<Vec<[f32; 3]>> =
        reader.read_normals().map(Iterator::collect);
    let uvs: Option<Vec<[f32; 2]>> =
        reader.read_tex_coords(0).map(|t| t.into_f32().collect());

    let normals = normals
        .filter(|n| n.len() == positions.len())
        .unwrap_or_else(|| compute_normals(&positions, &indices));

    let vertices = positions
        .iter()
        .enumerate()
        .map(|(i, p)| Vertex {
            position: *p,
            normal: normals[i],
            uv: uvs.as_ref().and_then(|u| u.get(i)).copied().unwrap_or([0.0; 2]),
        })
        .collect();

    Some(MeshData {
        bounds: Aabb::from_points(positions.iter().map(|p| Vec3::from_array(*p))),
        vertices,
        indices,
        transform,
        material: primitive.material().index(),
    })
}

/// Area-weighted vertex normals from a triangle list.
pub(crate) fn compute_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut acc = vec![Vec3::ZERO; positions.len()];
    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        if a >= positions.len() || b >= positions.len() || c >= positions.len() {
            continue;
        }
        let pa = Vec3::from_array(positions[a]);
        let pb = Vec3::from_array(positions[b]);
        let pc = Vec3::from_array(positions[c]);
        let face = (pb - pa).cross(pc - pa);
        acc[a] += face;
        acc[b] += face;
        acc[c] += face;
    }
    acc.into_iter()
        .map(|n| n.normalize_or(Vec3::Y).to_array())
        .collect()
}

fn read_material(material: &gltf::Material<'_>) -> MaterialData {
    let pbr = material.pbr_metallic_roughness();
    let alpha_cutoff = match material.alpha_mode() {
        gltf::material::AlphaMode::Opaque => None,
        gltf::material::AlphaMode::Mask => {
            Some(material.alpha_cutoff().unwrap_or(0.5))
        }
        // Blended surfaces are drawn as cut-outs of their nearly
        // transparent texels.
        gltf::material::AlphaMode::Blend => Some(0.02),
    };
    MaterialData {
        base_color: pbr.base_color_factor(),
        base_color_texture: pbr.base_color_texture().map(|info| info.texture().index()),
        alpha_cutoff,
        double_sided: material.double_sided(),
    }
}

/// Convert decoded image data to RGBA8. Float formats are not supported.
fn convert_image(image: &gltf::image::Data) -> Option<TextureData> {
    use gltf::image::Format;

    let pixels = &image.pixels;
    let high_byte =
        |chunk: &[u8]| (u16::from_ne_bytes([chunk[0], chunk[1]]) >> 8) as u8;
    let rgba: Vec<u8> = match image.format {
        Format::R8G8B8A8 => pixels.clone(),
        Format::R8G8B8 => pixels
            .chunks_exact(3)
            .flat_map(|p| [p[0], p[1], p[2], 255])
            .collect(),
        Format::R8G8 => pixels
            .chunks_exact(2)
            .flat_map(|p| [p[0], p[0], p[0], p[1]])
            .collect(),
        Format::R8 => pixels.iter().flat_map(|&v| [v, v, v, 255]).collect(),
        Format::R16G16B16A16 => pixels
            .chunks_exact(8)
            .flat_map(|p| {
                [
                    high_byte(&p[0..2]),
                    high_byte(&p[2..4]),
                    high_byte(&p[4..6]),
                    high_byte(&p[6..8]),
                ]
            })
            .collect(),
        Format::R16G16B16 => pixels
            .chunks_exact(6)
            .flat_map(|p| {
                [high_byte(&p[0..2]), high_byte(&p[2..4]), high_byte(&p[4..6]), 255]
            })
            .collect(),
        other => {
            log::warn!("Unsupported texture format {other:?}; using white");
            return None;
        }
    };
    let expected = image.width as usize * image.height as usize * 4;
    (rgba.len() == expected).then_some(TextureData {
        width: image.width,
        height: image.height,
        rgba,
    })
}
