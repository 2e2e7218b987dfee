//! wgpu passes that draw a [`Viewer`](crate::Viewer) frame.
//!
//! One render pass per frame: clear to the background color, draw the
//! camera frame (when the camera background is on), the model meshes, then
//! the translucent floor grid.

pub mod background;
pub mod grid;
pub mod mesh;

use glam::Vec3;

use self::background::BackgroundPass;
use self::grid::GridPass;
use self::mesh::{GpuModel, MeshPass};
use crate::camera::core::CameraUniform;
use crate::gpu::pipeline_helpers;
use crate::gpu::render_context::RenderContext;
use crate::gpu::texture::DepthTexture;
use crate::options::{LightingOptions, Options};
use crate::viewer::{BackgroundView, Viewer};

/// GPU lighting block: ambient color plus two directional lights.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    /// Ambient color times intensity.
    pub ambient: [f32; 4],
    /// Unit vector toward the key light.
    pub key_dir: [f32; 4],
    /// Key color times intensity.
    pub key_color: [f32; 4],
    /// Unit vector toward the fill light.
    pub fill_dir: [f32; 4],
    /// Fill color times intensity.
    pub fill_color: [f32; 4],
}

impl LightUniform {
    /// Build the lighting block from options. Light positions are taken as
    /// directions toward the origin.
    #[must_use]
    pub fn from_options(options: &LightingOptions) -> Self {
        let color = Vec3::from_array(srgb_to_linear(options.color));
        let dir = |p: [f32; 3]| Vec3::from_array(p).normalize_or(Vec3::Y).extend(0.0).to_array();
        let scaled = |k: f32| (color * k).extend(1.0).to_array();
        Self {
            ambient: scaled(options.ambient),
            key_dir: dir(options.key_position),
            key_color: scaled(options.key_intensity),
            fill_dir: dir(options.fill_position),
            fill_color: scaled(options.fill_intensity),
        }
    }
}

/// Decode an sRGB color to linear.
#[must_use]
pub fn srgb_to_linear(rgb: [f32; 3]) -> [f32; 3] {
    rgb.map(|c| {
        if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    })
}

/// Owns every pipeline and GPU resource needed to draw the viewer.
pub struct SceneRenderer {
    frame_layout: wgpu::BindGroupLayout,
    frame_bind_group: wgpu::BindGroup,
    camera_buffer: wgpu::Buffer,
    camera_uniform: CameraUniform,
    light_buffer: wgpu::Buffer,
    depth: DepthTexture,
    mesh_pass: MeshPass,
    grid_pass: GridPass,
    background_pass: BackgroundPass,
    model: Option<GpuModel>,
    clear_color: wgpu::Color,
    show_grid: bool,
}

impl SceneRenderer {
    /// Build pipelines for the context's surface format.
    #[must_use]
    pub fn new(context: &RenderContext, options: &Options) -> Self {
        let device = &context.device;
        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Frame Layout"),
            entries: &[
                pipeline_helpers::uniform_buffer(0),
                pipeline_helpers::uniform_buffer(1),
            ],
        });
        let camera_uniform = CameraUniform::new();
        let camera_buffer =
            pipeline_helpers::create_uniform_buffer(device, "Camera Uniform", &camera_uniform);
        let light_buffer = pipeline_helpers::create_uniform_buffer(
            device,
            "Light Uniform",
            &LightUniform::from_options(&options.lighting),
        );
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Frame Bind Group"),
            layout: &frame_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: camera_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: light_buffer.as_entire_binding(),
                },
            ],
        });
        let (width, height) = context.size();

        Self {
            mesh_pass: MeshPass::new(context, &frame_layout),
            grid_pass: GridPass::new(context, &frame_layout, &options.display),
            background_pass: BackgroundPass::new(context),
            depth: DepthTexture::new(device, width, height),
            frame_layout,
            frame_bind_group,
            camera_buffer,
            camera_uniform,
            light_buffer,
            model: None,
            clear_color: clear_color(options.display.background_color),
            show_grid: options.display.show_grid,
        }
    }

    /// Recreate size-dependent targets.
    pub fn resize(&mut self, context: &RenderContext) {
        let (width, height) = context.size();
        self.depth.texture.destroy();
        self.depth = DepthTexture::new(&context.device, width, height);
    }

    /// Apply new lighting and display options.
    pub fn apply_options(&mut self, context: &RenderContext, options: &Options) {
        context.queue.write_buffer(
            &self.light_buffer,
            0,
            bytemuck::bytes_of(&LightUniform::from_options(&options.lighting)),
        );
        self.grid_pass = GridPass::new(context, &self.frame_layout, &options.display);
        self.clear_color = clear_color(options.display.background_color);
        self.show_grid = options.display.show_grid;
    }

    /// Upload everything the next [`render`](Self::render) needs from the
    /// viewer's current state.
    pub fn prepare(&mut self, context: &RenderContext, viewer: &Viewer) {
        self.camera_uniform.update_view_proj(viewer.camera());
        context.queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::bytes_of(&self.camera_uniform),
        );

        self.sync_model(context, viewer);

        match viewer.background() {
            BackgroundView::Solid(color) => {
                self.clear_color = clear_color(color);
                self.background_pass.clear();
            }
            BackgroundView::Video(Some(frame)) => {
                self.background_pass.set_frame(context, frame);
            }
            BackgroundView::Video(None) => {}
        }
    }

    fn sync_model(&mut self, context: &RenderContext, viewer: &Viewer) {
        let (Some(model), Some(world)) = (viewer.model(), viewer.model_world_matrix()) else {
            if let Some(old) = self.model.take() {
                old.destroy();
            }
            return;
        };
        if self.model.as_ref().is_some_and(|m| m.id == model.id) {
            if let Some(gpu) = &self.model {
                gpu.set_world(&context.queue, world);
            }
            return;
        }
        if let Some(old) = self.model.take() {
            old.destroy();
        }
        self.model = Some(self.mesh_pass.upload(context, model.id, &model.data, world));
    }

    /// Record the scene pass into `encoder`, targeting `view`.
    pub fn render(&self, encoder: &mut wgpu::CommandEncoder, view: &wgpu::TextureView) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Scene Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(self.clear_color),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        if self.background_pass.has_frame() {
            self.background_pass.draw(&mut render_pass);
        }
        if let Some(model) = &self.model {
            self.mesh_pass
                .draw(&mut render_pass, &self.frame_bind_group, model);
        }
        if self.show_grid {
            self.grid_pass.draw(&mut render_pass, &self.frame_bind_group);
        }
    }
}

impl Drop for SceneRenderer {
    fn drop(&mut self) {
        if let Some(model) = self.model.take() {
            model.destroy();
        }
        self.background_pass.clear();
    }
}

fn clear_color(srgb: [f32; 3]) -> wgpu::Color {
    let [r, g, b] = srgb_to_linear(srgb);
    wgpu::Color {
        r: f64::from(r),
        g: f64::from(g),
        b: f64::from(b),
        a: 1.0,
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn light_uniform_matches_shader_layout() {
        assert_eq!(size_of::<LightUniform>(), 80);
    }

    #[test]
    fn lights_point_toward_their_positions() {
        let lights = LightUniform::from_options(&LightingOptions::default());
        let key = Vec3::new(lights.key_dir[0], lights.key_dir[1], lights.key_dir[2]);
        assert_relative_eq!(key.length(), 1.0, epsilon = 1e-6);
        assert!(key.y > 0.0);
        assert_relative_eq!(lights.ambient[0], 0.7, epsilon = 1e-6);
        assert_relative_eq!(lights.key_color[1], 0.8, epsilon = 1e-6);
        assert_relative_eq!(lights.fill_color[2], 0.5, epsilon = 1e-6);
    }

    #[test]
    fn srgb_endpoints_are_fixed() {
        let [black, white, _] = srgb_to_linear([0.0, 1.0, 0.0]);
        assert_relative_eq!(black, 0.0);
        assert_relative_eq!(white, 1.0, epsilon = 1e-6);
        let [mid, ..] = srgb_to_linear([0.5, 0.5, 0.5]);
        assert_relative_eq!(mid, 0.214, epsilon = 1e-3);
    }

    #[test]
    fn white_background_clears_to_white() {
        let c = clear_color([1.0, 1.0, 1.0]);
        assert_relative_eq!(c.r, 1.0, epsilon = 1e-6);
        assert_relative_eq!(c.a, 1.0);
    }
}
