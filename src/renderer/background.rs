//! Camera-frame background.

use crate::gpu::pipeline_helpers;
use crate::gpu::render_context::RenderContext;
use crate::gpu::texture::{RgbaTexture, DEPTH_FORMAT};
use crate::media::VideoFrame;

/// UV `(scale.x, scale.y, offset.x, offset.y)` that makes a
/// `frame_w`×`frame_h` image cover a `view_w`×`view_h` viewport, cropping
/// the longer axis symmetrically.
#[must_use]
pub fn cover_transform(frame_w: u32, frame_h: u32, view_w: u32, view_h: u32) -> [f32; 4] {
    if frame_w == 0 || frame_h == 0 || view_w == 0 || view_h == 0 {
        return [1.0, 1.0, 0.0, 0.0];
    }
    let frame_aspect = frame_w as f32 / frame_h as f32;
    let view_aspect = view_w as f32 / view_h as f32;
    if frame_aspect > view_aspect {
        let sx = view_aspect / frame_aspect;
        [sx, 1.0, (1.0 - sx) * 0.5, 0.0]
    } else {
        let sy = frame_aspect / view_aspect;
        [1.0, sy, 0.0, (1.0 - sy) * 0.5]
    }
}

/// Draws the latest camera frame behind the scene.
pub(crate) struct BackgroundPass {
    pipeline: wgpu::RenderPipeline,
    layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    cover_buffer: wgpu::Buffer,
    video: Option<VideoTexture>,
}

struct VideoTexture {
    texture: RgbaTexture,
    bind_group: wgpu::BindGroup,
    serial: u64,
}

impl BackgroundPass {
    pub(crate) fn new(context: &RenderContext) -> Self {
        let device = &context.device;
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Background Layout"),
            entries: &[
                pipeline_helpers::texture_2d(0),
                pipeline_helpers::filtering_sampler(1),
                pipeline_helpers::uniform_buffer(2),
            ],
        });
        let shader = device.create_shader_module(wgpu::include_wgsl!(
            "../../assets/shaders/background.wgsl"
        ));
        let pipeline = pipeline_helpers::create_screen_space_pipeline(
            device,
            "Background",
            &shader,
            context.format(),
            Some(DEPTH_FORMAT),
            &[&layout],
        );
        Self {
            pipeline,
            sampler: pipeline_helpers::linear_sampler(device, "Background Sampler"),
            cover_buffer: pipeline_helpers::create_uniform_buffer(
                device,
                "Background Cover",
                &[1.0_f32, 1.0, 0.0, 0.0],
            ),
            layout,
            video: None,
        }
    }

    /// Upload `frame` unless it is the one already shown, and refresh the
    /// cover transform for the current surface size.
    pub(crate) fn set_frame(&mut self, context: &RenderContext, frame: &VideoFrame) {
        let reuse = self
            .video
            .as_ref()
            .is_some_and(|v| v.texture.matches(frame.width, frame.height));
        if !reuse {
            self.clear();
            let texture = RgbaTexture::new(
                &context.device,
                "Camera Frame",
                frame.width,
                frame.height,
            );
            let bind_group =
                context.device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("Background Bind Group"),
                    layout: &self.layout,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: wgpu::BindingResource::TextureView(&texture.view),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::Sampler(&self.sampler),
                        },
                        wgpu::BindGroupEntry {
                            binding: 2,
                            resource: self.cover_buffer.as_entire_binding(),
                        },
                    ],
                });
            self.video = Some(VideoTexture {
                texture,
                bind_group,
                serial: 0,
            });
        }
        let Some(video) = self.video.as_mut() else {
            return;
        };
        if video.serial != frame.serial {
            video.texture.write(&context.queue, &frame.pixels);
            video.serial = frame.serial;
        }
        let (w, h) = context.size();
        let cover = cover_transform(frame.width, frame.height, w, h);
        context
            .queue
            .write_buffer(&self.cover_buffer, 0, bytemuck::cast_slice(&cover));
    }

    /// Release the frame texture.
    pub(crate) fn clear(&mut self) {
        if let Some(video) = self.video.take() {
            video.texture.destroy();
        }
    }

    /// Whether a frame is ready to draw.
    pub(crate) fn has_frame(&self) -> bool {
        self.video.is_some()
    }

    pub(crate) fn draw<'a>(&'a self, render_pass: &mut wgpu::RenderPass<'a>) {
        if let Some(video) = &self.video {
            render_pass.set_pipeline(&self.pipeline);
            render_pass.set_bind_group(0, &video.bind_group, &[]);
            render_pass.draw(0..3, 0..1);
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn wide_frame_crops_horizontally() {
        // 16:9 camera into a 1:1 viewport keeps the middle 9/16 of the width.
        let [sx, sy, ox, oy] = cover_transform(1600, 900, 500, 500);
        assert_relative_eq!(sx, 0.5625, epsilon = 1e-6);
        assert_relative_eq!(sy, 1.0);
        assert_relative_eq!(ox, 0.21875, epsilon = 1e-6);
        assert_relative_eq!(oy, 0.0);
    }

    #[test]
    fn tall_frame_crops_vertically() {
        let [sx, sy, ox, oy] = cover_transform(480, 640, 800, 600);
        assert_relative_eq!(sx, 1.0);
        assert_relative_eq!(sy, 0.5625, epsilon = 1e-6);
        assert_relative_eq!(ox, 0.0);
        assert_relative_eq!(oy, 0.21875, epsilon = 1e-6);
    }

    #[test]
    fn degenerate_sizes_use_identity() {
        assert_eq!(cover_transform(0, 10, 10, 10), [1.0, 1.0, 0.0, 0.0]);
    }
}
