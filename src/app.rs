//! The showcase window: carousel, toolbar and viewport wired together.
//!
//! ```no_run
//! # use vitrine::{App, Catalog};
//! App::builder()
//!     .with_catalog(Catalog::builtin())
//!     .build()
//!     .and_then(App::run)
//!     .unwrap();
//! ```

use std::cell::Cell;
use std::rc::Rc;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Instant;

use winit::{
    application::ApplicationHandler,
    event::{ElementState, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use crate::asset::AssetSource;
use crate::gpu::render_context::RenderContext;
use crate::gui::egui_host::EguiHost;
use crate::gui::panel::{self, OverlayState, UiAction};
use crate::gui::thumbnails::ThumbnailCache;
use crate::renderer::SceneRenderer;
use crate::viewer::LoadOutcome;
use crate::{
    Carousel, Catalog, InputEvent, InputProcessor, MouseButton, Options,
    Viewer, ViewerCommand, VitrineError,
};

// ── Builder ──────────────────────────────────────────────────────────────

/// Fluent builder for [`App`].
pub struct AppBuilder {
    catalog: Option<Catalog>,
    options: Option<Options>,
    title: String,
    initial_model: Option<String>,
}

impl AppBuilder {
    fn new() -> Self {
        Self {
            catalog: None,
            options: None,
            title: "Vitrine".into(),
            initial_model: None,
        }
    }

    /// Models offered in the carousel (default: [`Catalog::builtin`]).
    #[must_use]
    pub fn with_catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Override the default options.
    #[must_use]
    pub fn with_options(mut self, options: Options) -> Self {
        self.options = Some(options);
        self
    }

    /// Set the window title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Show this path or URL instead of the first catalog entry.
    #[must_use]
    pub fn with_initial_model(mut self, location: impl Into<String>) -> Self {
        self.initial_model = Some(location.into());
        self
    }

    /// Create the viewer and its background threads.
    ///
    /// # Errors
    ///
    /// Returns [`VitrineError::ThreadSpawn`] if a worker thread cannot be
    /// started.
    pub fn build(self) -> Result<App, VitrineError> {
        let options = self.options.unwrap_or_default();
        let viewer = Viewer::new(options.clone())?;
        let thumbnails = ThumbnailCache::new().map_err(VitrineError::ThreadSpawn)?;

        let (select_tx, select_rx) = mpsc::channel::<AssetSource>();
        let mut carousel = Carousel::new(move |item, index| {
            log::debug!("Selected card {index}: {}", item.name);
            let _ = select_tx.send(item.source());
        });
        let catalog = self.catalog.unwrap_or_else(Catalog::builtin);
        carousel.set_items(&catalog.items);

        let mut app = App {
            title: self.title,
            window: None,
            gpu: None,
            input: InputProcessor::with_key_bindings(options.keybindings.clone()),
            viewer,
            carousel,
            select_rx,
            thumbnails,
            progress: Rc::new(Cell::new(0.0)),
            error: None,
            egui_wants_pointer: false,
            egui_wants_keyboard: false,
        };
        for card in app.carousel.cards() {
            if let Some(thumb) = &card.thumb {
                app.thumbnails.request(thumb);
            }
        }
        if let Some(location) = self.initial_model {
            // Drop the first card's load; the explicit model wins.
            while app.select_rx.try_recv().is_ok() {}
            app.start_load(AssetSource::from_location(&location));
        }
        Ok(app)
    }
}

// ── App ──────────────────────────────────────────────────────────────────

/// A window showing the carousel above an interactive viewport.
///
/// Construct via [`App::builder`], then call [`run`](Self::run).
pub struct App {
    title: String,
    window: Option<Arc<Window>>,
    gpu: Option<Gpu>,
    input: InputProcessor,
    viewer: Viewer,
    carousel: Carousel,
    select_rx: mpsc::Receiver<AssetSource>,
    thumbnails: ThumbnailCache,
    progress: Rc<Cell<f32>>,
    error: Option<String>,
    egui_wants_pointer: bool,
    egui_wants_keyboard: bool,
}

/// Everything that needs a live window.
struct Gpu {
    context: RenderContext,
    renderer: SceneRenderer,
    egui: EguiHost,
}

impl App {
    /// Start a new builder.
    #[must_use]
    pub fn builder() -> AppBuilder {
        AppBuilder::new()
    }

    /// Open the window and run the event loop. Blocks until the window is
    /// closed.
    ///
    /// # Errors
    ///
    /// Returns [`VitrineError::EventLoop`] if the event loop cannot be
    /// created or exits abnormally.
    pub fn run(mut self) -> Result<(), VitrineError> {
        let event_loop =
            EventLoop::new().map_err(|e| VitrineError::EventLoop(e.to_string()))?;
        event_loop.set_control_flow(ControlFlow::Poll);
        event_loop
            .run_app(&mut self)
            .map_err(|e| VitrineError::EventLoop(e.to_string()))
    }

    fn start_load(&mut self, source: AssetSource) {
        let progress = Rc::clone(&self.progress);
        progress.set(0.0);
        let _ = self.viewer.load(source, move |fraction| progress.set(fraction));
    }

    fn dispatch(&mut self, command: ViewerCommand) {
        match command {
            ViewerCommand::CarouselPrev => self.carousel.scroll_by(-1),
            ViewerCommand::CarouselNext => self.carousel.scroll_by(1),
            other => self.viewer.execute(other),
        }
    }

    fn apply(&mut self, action: UiAction) {
        match action {
            UiAction::Command(command) => self.dispatch(command),
            UiAction::Select(index) => {
                let _ = self.carousel.select(index);
            }
            UiAction::OpenFile => {
                let picked = rfd::FileDialog::new()
                    .add_filter("glTF", &["glb", "gltf"])
                    .pick_file();
                if let Some(path) = picked {
                    self.start_load(AssetSource::Path(path));
                }
            }
            UiAction::DismissError => self.error = None,
        }
    }

    /// Start any load the carousel asked for and collect finished ones.
    fn pump_loads(&mut self) {
        if let Some(source) = self.select_rx.try_iter().last() {
            self.start_load(source);
        }
        match self.viewer.poll_load() {
            Some(LoadOutcome::Loaded { name }) => log::info!("Showing {name}"),
            Some(LoadOutcome::Failed(e)) => {
                log::error!("Failed to load model: {e}");
                self.error = Some(e.to_string());
            }
            None => {}
        }
    }

    fn reconfigure(&mut self, width: u32, height: u32) {
        if let Some(gpu) = &mut self.gpu {
            gpu.context.resize(width, height);
            gpu.renderer.resize(&gpu.context);
        }
    }

    fn redraw(&mut self) {
        self.pump_loads();
        let _ = self.viewer.advance(Instant::now());

        let Some(window) = self.window.clone() else {
            return;
        };
        let actions = self.render_frame(&window);
        for action in actions {
            self.apply(action);
        }
        // Skipped frames must keep the loop going too.
        if self.viewer.is_running() {
            window.request_redraw();
        }
    }

    /// Draw the scene and overlay. Returns the overlay's actions, or nothing
    /// when the frame was skipped.
    fn render_frame(&mut self, window: &Arc<Window>) -> Vec<UiAction> {
        let Some(gpu) = self.gpu.as_mut() else {
            return Vec::new();
        };
        if self.thumbnails.poll(gpu.egui.context()) {
            log::trace!("Thumbnails updated");
        }

        let frame = match gpu.context.get_next_frame() {
            Ok(frame) => frame,
            Err(e) => {
                match surface_recovery(&e) {
                    SurfaceRecovery::Reconfigure => {
                        log::debug!("Surface {e:?}, reconfiguring");
                        let (width, height) = viewport_size(window.inner_size());
                        gpu.context.resize(width, height);
                        gpu.renderer.resize(&gpu.context);
                    }
                    SurfaceRecovery::SkipFrame => log::warn!("Skipping frame: {e:?}"),
                }
                return Vec::new();
            }
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        gpu.renderer.prepare(&gpu.context, &self.viewer);
        let mut encoder = gpu.context.create_encoder();
        gpu.renderer.render(&mut encoder, &view);

        let scroll_to = self.carousel.take_scroll_request();
        let state = OverlayState {
            carousel: &self.carousel,
            scroll_to,
            thumbnails: &self.thumbnails,
            auto_rotate: self.viewer.auto_rotate(),
            locked: self.viewer.is_locked(),
            camera_background: self.viewer.camera_background(),
            loading: self.viewer.is_loading().then(|| self.progress.get()),
            error: self.error.as_deref(),
        };
        let mut actions = Vec::new();
        let output = gpu.egui.run_ui(window, |ctx| {
            actions = panel::show(ctx, &state);
        });
        self.egui_wants_pointer = output.wants_pointer_input;
        self.egui_wants_keyboard = output.wants_keyboard_input;
        let uploads = gpu.egui.paint(&gpu.context, &mut encoder, &view, &output);

        gpu.context.submit_with(uploads, encoder);
        window.pre_present_notify();
        frame.present();
        actions
    }

    fn handle_input(&mut self, event: InputEvent) {
        if let Some(command) = self.input.handle_event(event) {
            self.dispatch(command);
        }
    }
}

/// What to do when the swapchain texture cannot be acquired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SurfaceRecovery {
    /// The surface no longer matches the window.
    Reconfigure,
    /// Transient; try again next frame.
    SkipFrame,
}

fn surface_recovery(error: &wgpu::SurfaceError) -> SurfaceRecovery {
    match error {
        wgpu::SurfaceError::Outdated | wgpu::SurfaceError::Lost => {
            SurfaceRecovery::Reconfigure
        }
        _ => SurfaceRecovery::SkipFrame,
    }
}

/// Surface size for a window size; never zero.
fn viewport_size(inner: winit::dpi::PhysicalSize<u32>) -> (u32, u32) {
    (inner.width.max(1), inner.height.max(1))
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let monitor = event_loop
            .primary_monitor()
            .or_else(|| event_loop.available_monitors().next());
        let attrs = if let Some(mon) = &monitor {
            let mon_size = mon.size();
            let scale = mon.scale_factor();
            #[allow(clippy::cast_possible_truncation)]
            let logical_w = (f64::from(mon_size.width) / scale * 0.75) as u32;
            #[allow(clippy::cast_possible_truncation)]
            let logical_h = (f64::from(mon_size.height) / scale * 0.75) as u32;
            Window::default_attributes()
                .with_title(&self.title)
                .with_inner_size(winit::dpi::LogicalSize::new(logical_w, logical_h))
        } else {
            Window::default_attributes().with_title(&self.title)
        };

        let window = match event_loop.create_window(attrs) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                log::error!("Failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        let (width, height) = viewport_size(window.inner_size());
        let context = match pollster::block_on(RenderContext::new(window.clone(), (width, height)))
        {
            Ok(context) => context,
            Err(e) => {
                log::error!("Failed to initialize GPU: {e}");
                event_loop.exit();
                return;
            }
        };
        let renderer = SceneRenderer::new(&context, self.viewer.options());
        let egui = EguiHost::new(&window, &context);

        let _ = self.viewer.resize(width, height);
        self.viewer.start();
        window.request_redraw();
        self.window = Some(window);
        self.gpu = Some(Gpu {
            context,
            renderer,
            egui,
        });
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _id: WindowId,
        event: WindowEvent,
    ) {
        if matches!(event, WindowEvent::CloseRequested) {
            self.viewer.stop();
            event_loop.exit();
            return;
        }

        let Some(window) = self.window.clone() else {
            return;
        };
        let consumed = self
            .gpu
            .as_mut()
            .is_some_and(|gpu| gpu.egui.on_window_event(&window, &event));

        match event {
            WindowEvent::Resized(size) => {
                let (width, height) = viewport_size(size);
                if self.viewer.resize(width, height) {
                    self.reconfigure(width, height);
                }
            }

            WindowEvent::RedrawRequested => self.redraw(),

            WindowEvent::MouseInput { button, state, .. } => {
                let pressed = state == ElementState::Pressed;
                if pressed && (consumed || self.egui_wants_pointer) {
                    return;
                }
                self.handle_input(InputEvent::MouseButton {
                    button: MouseButton::from(button),
                    pressed,
                });
            }

            WindowEvent::CursorMoved { position, .. } => {
                #[allow(clippy::cast_possible_truncation)]
                self.handle_input(InputEvent::CursorMoved {
                    x: position.x as f32,
                    y: position.y as f32,
                });
            }

            WindowEvent::MouseWheel { delta, .. } => {
                if consumed || self.egui_wants_pointer {
                    return;
                }
                #[allow(clippy::cast_possible_truncation)]
                let scroll_delta = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 * 0.01,
                };
                self.handle_input(InputEvent::Scroll {
                    delta: scroll_delta,
                });
            }

            WindowEvent::ModifiersChanged(modifiers) => {
                self.handle_input(InputEvent::ModifiersChanged {
                    shift: modifiers.state().shift_key(),
                });
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if event.state != ElementState::Pressed
                    || consumed
                    || self.egui_wants_keyboard
                    || self.error.is_some()
                {
                    return;
                }
                use winit::keyboard::PhysicalKey;
                let PhysicalKey::Code(code) = event.physical_key else {
                    return;
                };
                let key_str = format!("{code:?}");
                if let Some(command) = self.input.handle_key_press(&key_str) {
                    self.dispatch(command);
                }
            }

            _ => (),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_surfaces_are_reconfigured() {
        assert_eq!(
            surface_recovery(&wgpu::SurfaceError::Outdated),
            SurfaceRecovery::Reconfigure
        );
        assert_eq!(
            surface_recovery(&wgpu::SurfaceError::Lost),
            SurfaceRecovery::Reconfigure
        );
    }

    #[test]
    fn transient_surface_errors_skip_the_frame() {
        assert_eq!(
            surface_recovery(&wgpu::SurfaceError::Timeout),
            SurfaceRecovery::SkipFrame
        );
        assert_eq!(
            surface_recovery(&wgpu::SurfaceError::OutOfMemory),
            SurfaceRecovery::SkipFrame
        );
    }

    #[test]
    fn viewport_is_never_zero_sized() {
        assert_eq!(
            viewport_size(winit::dpi::PhysicalSize::new(0, 720)),
            (1, 720)
        );
        assert_eq!(
            viewport_size(winit::dpi::PhysicalSize::new(1280, 720)),
            (1280, 720)
        );
    }
}
