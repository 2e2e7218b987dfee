//! Ground grid.

use glam::Vec3;

use crate::gpu::pipeline_helpers;
use crate::gpu::render_context::RenderContext;
use crate::gpu::texture::DEPTH_FORMAT;
use crate::options::DisplayOptions;

/// Line vertex with straight (non-premultiplied) alpha.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GridVertex {
    /// World position.
    pub position: [f32; 3],
    /// Linear RGBA.
    pub color: [f32; 4],
}

impl GridVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x4];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Line-list vertices for a square grid on the XZ plane centered at
/// `center`. The two lines through the center use `center_color`.
#[must_use]
pub fn grid_vertices(
    options: &DisplayOptions,
    center: Vec3,
) -> Vec<GridVertex> {
    let divisions = options.grid_divisions.max(1);
    let half = options.grid_size * 0.5;
    let step = options.grid_size / divisions as f32;
    let rgba = |c: [f32; 3]| {
        let [r, g, b] = super::srgb_to_linear(c);
        [r, g, b, options.grid_opacity]
    };
    let center_color = rgba(options.grid_center_color);
    let line_color = rgba(options.grid_color);

    let mut vertices = Vec::with_capacity((divisions as usize + 1) * 4);
    for i in 0..=divisions {
        let k = -half + i as f32 * step;
        let color = if 2 * i == divisions {
            center_color
        } else {
            line_color
        };
        for [a, b] in [
            [Vec3::new(-half, 0.0, k), Vec3::new(half, 0.0, k)],
            [Vec3::new(k, 0.0, -half), Vec3::new(k, 0.0, half)],
        ] {
            vertices.push(GridVertex {
                position: (center + a).to_array(),
                color,
            });
            vertices.push(GridVertex {
                position: (center + b).to_array(),
                color,
            });
        }
    }
    vertices
}

/// Translucent grid drawn after opaque geometry without writing depth.
pub(crate) struct GridPass {
    pipeline: wgpu::RenderPipeline,
    vertex_buffer: wgpu::Buffer,
    vertex_count: u32,
}

impl GridPass {
    pub(crate) fn new(
        context: &RenderContext,
        frame_layout: &wgpu::BindGroupLayout,
        options: &DisplayOptions,
    ) -> Self {
        use wgpu::util::DeviceExt;

        let device = &context.device;
        let shader = device
            .create_shader_module(wgpu::include_wgsl!("../../assets/shaders/grid.wgsl"));
        let layout = pipeline_helpers::pipeline_layout(device, "Grid", &[frame_layout]);
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Grid Pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[GridVertex::layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: context.format(),
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineList,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let vertices = grid_vertices(options, Vec3::ZERO);
        let vertex_buffer =
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Grid Vertices"),
                contents: bytemuck::cast_slice(&vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        Self {
            pipeline,
            vertex_buffer,
            vertex_count: vertices.len() as u32,
        }
    }

    pub(crate) fn draw<'a>(
        &'a self,
        render_pass: &mut wgpu::RenderPass<'a>,
        frame_bind_group: &'a wgpu::BindGroup,
    ) {
        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, frame_bind_group, &[]);
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.draw(0..self.vertex_count, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn ten_divisions_make_twenty_two_lines() {
        let vertices = grid_vertices(&DisplayOptions::default(), Vec3::ZERO);
        assert_eq!(vertices.len(), 11 * 2 * 2);
        for v in &vertices {
            assert_relative_eq!(v.color[3], 0.6);
            assert!(v.position[0].abs() <= 5.0 + 1e-6);
            assert!(v.position[2].abs() <= 5.0 + 1e-6);
        }
    }

    #[test]
    fn center_lines_use_center_color() {
        let options = DisplayOptions {
            grid_center_color: [1.0, 0.0, 0.0],
            grid_color: [0.0, 0.0, 1.0],
            ..DisplayOptions::default()
        };
        let vertices = grid_vertices(&options, Vec3::ZERO);
        let red = vertices.iter().filter(|v| v.color[0] > 0.5).count();
        // One line in each direction through the origin.
        assert_eq!(red, 4);
    }

    #[test]
    fn grid_follows_center() {
        let vertices = grid_vertices(&DisplayOptions::default(), Vec3::new(0.0, -0.8, 0.0));
        assert!(vertices.iter().all(|v| v.position[1] == -0.8));
    }
}
