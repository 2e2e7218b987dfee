//! Model meshes: pipelines and per-model GPU resources.

use glam::Mat4;
use wgpu::util::DeviceExt;

use crate::asset::{MaterialData, ModelData, Vertex};
use crate::gpu::pipeline_helpers;
use crate::gpu::render_context::RenderContext;
use crate::gpu::texture::{RgbaTexture, DEPTH_FORMAT};
use crate::scene::ModelId;

/// Per-mesh uniform: world and normal matrices plus material factors.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DrawUniform {
    /// Mesh-to-world matrix.
    pub model: [[f32; 4]; 4],
    /// Inverse transpose of `model`.
    pub normal: [[f32; 4]; 4],
    /// Linear RGBA base color factor.
    pub base_color: [f32; 4],
    /// Alpha-test threshold; negative disables the test.
    pub alpha_cutoff: f32,
    _pad: [f32; 3],
}

impl DrawUniform {
    /// Uniform for a mesh placed by `world` with `material`.
    #[must_use]
    pub fn new(world: Mat4, material: &MaterialData) -> Self {
        Self {
            model: world.to_cols_array_2d(),
            normal: world.inverse().transpose().to_cols_array_2d(),
            base_color: material.base_color,
            alpha_cutoff: material.alpha_cutoff.unwrap_or(-1.0),
            _pad: [0.0; 3],
        }
    }
}

fn vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];
    wgpu::VertexBufferLayout {
        array_stride: size_of::<Vertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &ATTRIBUTES,
    }
}

/// Mesh pipelines and the layout of the per-draw bind group.
pub(crate) struct MeshPass {
    single_sided: wgpu::RenderPipeline,
    double_sided: wgpu::RenderPipeline,
    draw_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    white: RgbaTexture,
}

impl MeshPass {
    pub(crate) fn new(context: &RenderContext, frame_layout: &wgpu::BindGroupLayout) -> Self {
        let device = &context.device;
        let draw_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Mesh Draw Layout"),
            entries: &[
                pipeline_helpers::uniform_buffer(0),
                pipeline_helpers::texture_2d(1),
                pipeline_helpers::filtering_sampler(2),
            ],
        });
        let shader = device
            .create_shader_module(wgpu::include_wgsl!("../../assets/shaders/mesh.wgsl"));
        let layout =
            pipeline_helpers::pipeline_layout(device, "Mesh", &[frame_layout, &draw_layout]);

        let create = |label: &str, cull_mode: Option<wgpu::Face>| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    buffers: &[vertex_layout()],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: context.format(),
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode,
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        };

        Self {
            single_sided: create("Mesh Pipeline", Some(wgpu::Face::Back)),
            double_sided: create("Mesh Pipeline (double-sided)", None),
            draw_layout,
            sampler: pipeline_helpers::repeat_sampler(device, "Mesh Sampler"),
            white: RgbaTexture::white(device, &context.queue),
        }
    }

    /// Upload every mesh, material texture and draw uniform of `data`.
    pub(crate) fn upload(
        &self,
        context: &RenderContext,
        id: ModelId,
        data: &ModelData,
        world: Mat4,
    ) -> GpuModel {
        let device = &context.device;
        let textures: Vec<Option<RgbaTexture>> = data
            .textures
            .iter()
            .enumerate()
            .map(|(i, tex)| {
                tex.as_ref().map(|t| {
                    RgbaTexture::from_rgba(
                        device,
                        &context.queue,
                        &format!("Model Texture {i}"),
                        t.width,
                        t.height,
                        &t.rgba,
                    )
                })
            })
            .collect();

        let meshes = data
            .meshes
            .iter()
            .filter(|mesh| !mesh.indices.is_empty())
            .map(|mesh| {
                let material = data.material_for(mesh);
                let uniform = DrawUniform::new(world * mesh.transform, &material);
                let uniform_buffer =
                    pipeline_helpers::create_uniform_buffer(device, "Mesh Draw", &uniform);
                let texture = material
                    .base_color_texture
                    .and_then(|i| textures.get(i))
                    .and_then(Option::as_ref)
                    .unwrap_or(&self.white);
                let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("Mesh Draw Bind Group"),
                    layout: &self.draw_layout,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: uniform_buffer.as_entire_binding(),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::TextureView(&texture.view),
                        },
                        wgpu::BindGroupEntry {
                            binding: 2,
                            resource: wgpu::BindingResource::Sampler(&self.sampler),
                        },
                    ],
                });
                GpuMesh {
                    vertex_buffer: device.create_buffer_init(
                        &wgpu::util::BufferInitDescriptor {
                            label: Some("Mesh Vertices"),
                            contents: bytemuck::cast_slice(&mesh.vertices),
                            usage: wgpu::BufferUsages::VERTEX,
                        },
                    ),
                    index_buffer: device.create_buffer_init(
                        &wgpu::util::BufferInitDescriptor {
                            label: Some("Mesh Indices"),
                            contents: bytemuck::cast_slice(&mesh.indices),
                            usage: wgpu::BufferUsages::INDEX,
                        },
                    ),
                    index_count: mesh.indices.len() as u32,
                    uniform_buffer,
                    bind_group,
                    local: mesh.transform,
                    material,
                }
            })
            .collect();

        log::debug!("Uploaded model #{} ({})", id.0, data.name);
        GpuModel {
            id,
            meshes,
            textures: textures.into_iter().flatten().collect(),
        }
    }

    pub(crate) fn draw<'a>(
        &'a self,
        render_pass: &mut wgpu::RenderPass<'a>,
        frame_bind_group: &'a wgpu::BindGroup,
        model: &'a GpuModel,
    ) {
        render_pass.set_bind_group(0, frame_bind_group, &[]);
        for mesh in &model.meshes {
            let pipeline = if mesh.material.double_sided {
                &self.double_sided
            } else {
                &self.single_sided
            };
            render_pass.set_pipeline(pipeline);
            render_pass.set_bind_group(1, &mesh.bind_group, &[]);
            render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            render_pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            render_pass.draw_indexed(0..mesh.index_count, 0, 0..1);
        }
    }
}

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    local: Mat4,
    material: MaterialData,
}

/// GPU resources of one attached model.
pub(crate) struct GpuModel {
    pub(crate) id: ModelId,
    meshes: Vec<GpuMesh>,
    textures: Vec<RgbaTexture>,
}

impl GpuModel {
    /// Rewrite each mesh's draw uniform for a new model-to-world matrix.
    pub(crate) fn set_world(&self, queue: &wgpu::Queue, world: Mat4) {
        for mesh in &self.meshes {
            let uniform = DrawUniform::new(world * mesh.local, &mesh.material);
            queue.write_buffer(&mesh.uniform_buffer, 0, bytemuck::bytes_of(&uniform));
        }
    }

    /// Free buffers and textures immediately.
    pub(crate) fn destroy(&self) {
        for mesh in &self.meshes {
            mesh.vertex_buffer.destroy();
            mesh.index_buffer.destroy();
            mesh.uniform_buffer.destroy();
        }
        for texture in &self.textures {
            texture.destroy();
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use glam::{Vec3, Vec4};

    use super::*;

    #[test]
    fn draw_uniform_matches_shader_layout() {
        assert_eq!(size_of::<DrawUniform>(), 160);
        assert_eq!(size_of::<Vertex>(), 32);
    }

    #[test]
    fn normal_matrix_undoes_non_uniform_scale() {
        let world = Mat4::from_scale(Vec3::new(2.0, 1.0, 1.0));
        let uniform = DrawUniform::new(world, &MaterialData::default());
        let normal = Mat4::from_cols_array_2d(&uniform.normal);
        // A 45° normal in XY leans toward Y after stretching X.
        let n = (normal * Vec4::new(1.0, 1.0, 0.0, 0.0)).truncate();
        assert_relative_eq!(n.x, 0.5, epsilon = 1e-6);
        assert_relative_eq!(n.y, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn opaque_materials_disable_alpha_test() {
        let uniform = DrawUniform::new(Mat4::IDENTITY, &MaterialData::default());
        assert!(uniform.alpha_cutoff < 0.0);
        let masked = MaterialData {
            alpha_cutoff: Some(0.5),
            ..MaterialData::default()
        };
        assert_relative_eq!(DrawUniform::new(Mat4::IDENTITY, &masked).alpha_cutoff, 0.5);
    }
}
