//! egui integration: winit input in, wgpu paint out.

use winit::event::WindowEvent;
use winit::window::Window;

use crate::gpu::render_context::RenderContext;

/// Tessellated output of one UI pass, ready to paint.
pub(crate) struct EguiFrameOutput {
    clipped_primitives: Vec<egui::ClippedPrimitive>,
    textures_delta: egui::TexturesDelta,
    pixels_per_point: f32,
    screen_size_px: [u32; 2],
    /// The UI is under the pointer or dragging a widget.
    pub(crate) wants_pointer_input: bool,
    /// A text field has focus.
    pub(crate) wants_keyboard_input: bool,
}

/// Owns the egui context, its winit state, and the wgpu painter.
pub(crate) struct EguiHost {
    context: egui::Context,
    winit_state: egui_winit::State,
    renderer: egui_wgpu::Renderer,
}

impl EguiHost {
    pub(crate) fn new(window: &Window, render_context: &RenderContext) -> Self {
        let context = egui::Context::default();
        let winit_state = egui_winit::State::new(
            context.clone(),
            egui::ViewportId::ROOT,
            window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let renderer = egui_wgpu::Renderer::new(
            &render_context.device,
            render_context.format(),
            egui_wgpu::RendererOptions::default(),
        );
        Self {
            context,
            winit_state,
            renderer,
        }
    }

    /// The egui context, for loading textures outside a UI pass.
    pub(crate) fn context(&self) -> &egui::Context {
        &self.context
    }

    /// Feed a window event to egui. Returns `true` if egui consumed it.
    pub(crate) fn on_window_event(&mut self, window: &Window, event: &WindowEvent) -> bool {
        self.winit_state.on_window_event(window, event).consumed
    }

    /// Run one UI pass and tessellate the result.
    pub(crate) fn run_ui<F>(&mut self, window: &Window, run_ui: F) -> EguiFrameOutput
    where
        F: FnMut(&egui::Context),
    {
        let raw_input = self.winit_state.take_egui_input(window);
        let full_output = self.context.run(raw_input, run_ui);
        self.winit_state
            .handle_platform_output(window, full_output.platform_output);
        let pixels_per_point = self.context.pixels_per_point();
        let clipped_primitives = self
            .context
            .tessellate(full_output.shapes, pixels_per_point);
        let size = window.inner_size();

        EguiFrameOutput {
            clipped_primitives,
            textures_delta: full_output.textures_delta,
            pixels_per_point,
            screen_size_px: [size.width.max(1), size.height.max(1)],
            wants_pointer_input: self.context.wants_pointer_input(),
            wants_keyboard_input: self.context.wants_keyboard_input(),
        }
    }

    /// Upload textures and buffers, then draw the overlay on top of `view`.
    /// Returns the upload command buffers, which must be submitted before
    /// `encoder`.
    pub(crate) fn paint(
        &mut self,
        render_context: &RenderContext,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        output: &EguiFrameOutput,
    ) -> Vec<wgpu::CommandBuffer> {
        let device = &render_context.device;
        let queue = &render_context.queue;
        let screen = egui_wgpu::ScreenDescriptor {
            size_in_pixels: output.screen_size_px,
            pixels_per_point: output.pixels_per_point,
        };

        for (id, delta) in &output.textures_delta.set {
            self.renderer.update_texture(device, queue, *id, delta);
        }
        let uploads = self.renderer.update_buffers(
            device,
            queue,
            encoder,
            &output.clipped_primitives,
            &screen,
        );

        {
            let render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Overlay Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            let mut render_pass = render_pass.forget_lifetime();
            self.renderer
                .render(&mut render_pass, &output.clipped_primitives, &screen);
        }

        for id in &output.textures_delta.free {
            self.renderer.free_texture(id);
        }
        uploads
    }
}
