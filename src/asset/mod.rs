//! Model assets: fetching, caching, glTF import, and background loading.
//!
//! [`ModelData`] is the CPU-side result of an import: a flat list of
//! triangle meshes with their node transforms already baked, plus the
//! materials and RGBA8 textures they reference. It is immutable once built
//! and shared between the viewer (bounds, transforms) and the renderer
//! (GPU upload) through an `Arc`.

pub mod cache;
pub mod import;
pub mod loader;
pub mod source;

use std::fmt;

use glam::Mat4;

pub use self::cache::AssetCache;
pub use self::loader::{AssetLoader, LoadEvent, LoadTicket};
pub use self::source::AssetSource;
use crate::scene::bounds::Aabb;

/// Errors produced while fetching or parsing a model.
#[derive(Debug)]
pub enum AssetError {
    /// The server answered with a non-success status.
    Http {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },
    /// Transport-level failure (DNS, TLS, connection reset, ...).
    Fetch {
        /// Requested URL.
        url: String,
        /// Underlying error message.
        message: String,
    },
    /// Local file I/O failure.
    Io(std::io::Error),
    /// The glTF document or one of its buffers/images is invalid.
    Gltf(gltf::Error),
    /// The document parsed but contains no triangle geometry.
    EmptyScene,
    /// A referenced URI escapes the asset's directory or is not relative.
    UnsafeUri(String),
    /// No per-user cache directory is available for downloads.
    NoCacheDir,
    /// The loader thread has exited and can take no more requests.
    LoaderStopped,
}

impl fmt::Display for AssetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http { url, status } => {
                write!(f, "HTTP {status} while fetching {url}")
            }
            Self::Fetch { url, message } => {
                write!(f, "failed to fetch {url}: {message}")
            }
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Gltf(e) => write!(f, "invalid glTF: {e}"),
            Self::EmptyScene => write!(f, "the model contains no meshes"),
            Self::UnsafeUri(uri) => {
                write!(f, "refusing to resolve resource URI {uri:?}")
            }
            Self::NoCacheDir => {
                write!(f, "no cache directory available for downloads")
            }
            Self::LoaderStopped => write!(f, "the asset loader is not running"),
        }
    }
}

impl std::error::Error for AssetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Gltf(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for AssetError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<gltf::Error> for AssetError {
    fn from(e: gltf::Error) -> Self {
        Self::Gltf(e)
    }
}

/// Interleaved mesh vertex as uploaded to the GPU.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    /// Object-space position.
    pub position: [f32; 3],
    /// Object-space normal (unit length).
    pub normal: [f32; 3],
    /// First texture coordinate set.
    pub uv: [f32; 2],
}

/// One triangle list with its baked node transform.
#[derive(Debug, Clone)]
pub struct MeshData {
    /// Vertices.
    pub vertices: Vec<Vertex>,
    /// Triangle list indices into `vertices`.
    pub indices: Vec<u32>,
    /// Node transform relative to the asset root.
    pub transform: Mat4,
    /// Index into [`ModelData::materials`], `None` for the default material.
    pub material: Option<usize>,
    /// Bounds of `vertices` before `transform` is applied.
    pub bounds: Aabb,
}

/// Base-color material parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialData {
    /// Linear RGBA multiplier.
    pub base_color: [f32; 4],
    /// Index into [`ModelData::textures`].
    pub base_color_texture: Option<usize>,
    /// Fragments with alpha below this are discarded.
    pub alpha_cutoff: Option<f32>,
    /// Render both faces.
    pub double_sided: bool,
}

impl Default for MaterialData {
    fn default() -> Self {
        Self {
            base_color: [1.0; 4],
            base_color_texture: None,
            alpha_cutoff: None,
            double_sided: false,
        }
    }
}

/// Tightly packed RGBA8 image (sRGB encoded).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureData {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// `width * height * 4` bytes.
    pub rgba: Vec<u8>,
}

/// A fully imported model, ready for display.
#[derive(Debug, Clone)]
pub struct ModelData {
    /// Display name (usually the file name).
    pub name: String,
    /// Flattened meshes.
    pub meshes: Vec<MeshData>,
    /// Materials referenced by meshes.
    pub materials: Vec<MaterialData>,
    /// Textures referenced by materials; `None` where an image could not
    /// be converted.
    pub textures: Vec<Option<TextureData>>,
}

impl ModelData {
    /// Bounds of all meshes in asset-root space.
    #[must_use]
    pub fn bounds(&self) -> Aabb {
        self.meshes.iter().fold(Aabb::EMPTY, |acc, mesh| {
            acc.union(&mesh.bounds.transformed(mesh.transform))
        })
    }

    /// Total triangle count.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(|m| m.indices.len() / 3).sum()
    }

    /// Material for a mesh, falling back to the default material.
    #[must_use]
    pub fn material_for(&self, mesh: &MeshData) -> MaterialData {
        mesh.material
            .and_then(|i| self.materials.get(i))
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use glam::Vec3;

    use super::{MeshData, ModelData, Vertex};
    use crate::scene::bounds::Aabb;

    /// An axis-aligned box mesh spanning `min..max`, as a single mesh model.
    pub(crate) fn box_model(min: Vec3, max: Vec3) -> ModelData {
        let corners: Vec<Vertex> = (0..8)
            .map(|i| Vertex {
                position: [
                    if i & 1 == 0 { min.x } else { max.x },
                    if i & 2 == 0 { min.y } else { max.y },
                    if i & 4 == 0 { min.z } else { max.z },
                ],
                normal: [0.0, 1.0, 0.0],
                uv: [0.0, 0.0],
            })
            .collect();
        let indices = vec![0, 1, 3, 0, 3, 2, 4, 6, 7, 4, 7, 5];
        ModelData {
            name: "box".into(),
            meshes: vec![MeshData {
                bounds: Aabb::from_points(
                    corners.iter().map(|v| Vec3::from_array(v.position)),
                ),
                vertices: corners,
                indices,
                transform: glam::Mat4::IDENTITY,
                material: None,
            }],
            materials: Vec::new(),
            textures: Vec::new(),
        }
    }
}
