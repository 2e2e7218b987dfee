//! The viewer: camera, orbit controls, the displayed model, and the
//! per-frame update that ties them together.
//!
//! [`Viewer`] is GPU-free. It owns the state a frame is rendered from and
//! exposes the showcase operations (load, fit, zoom, auto-rotate, lock,
//! camera background). The application feeds it window events and frame
//! ticks and hands it to the scene renderer every frame.
//!
//! # Frame order
//!
//! [`Viewer::update`] advances, in order: the camera tween, auto-rotation,
//! the damped orbit controls, and the background stream.

/// Viewer command vocabulary.
pub mod command;
mod lock;
/// Per-frame update loop lifecycle.
pub mod render_loop;

use glam::{Mat4, Vec2, Vec3};

pub use self::command::ViewerCommand;
pub use self::render_loop::RenderLoop;
use crate::asset::{
    AssetCache, AssetError, AssetLoader, AssetSource, LoadEvent, LoadTicket,
    ModelData,
};
use crate::camera::controller::OrbitControls;
use crate::camera::core::Camera;
use crate::camera::tween::{CameraPose, CameraTween};
use crate::error::VitrineError;
use crate::media::{self, CaptureDevice, VideoFrame, VideoStream};
use crate::options::Options;
use crate::scene::{Attachment, Model, ModelId};
use crate::util::frame_timing::FrameTiming;

/// Direction of a zoom step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomDirection {
    /// Move toward the target.
    In,
    /// Move away from the target.
    Out,
}

impl ZoomDirection {
    /// Positive steps zoom in, anything else zooms out.
    #[must_use]
    pub fn from_step(step: i32) -> Self {
        if step > 0 {
            Self::In
        } else {
            Self::Out
        }
    }
}

/// Result of a finished load, as returned by [`Viewer::poll_load`].
#[derive(Debug)]
pub enum LoadOutcome {
    /// The model was attached and framed.
    Loaded {
        /// Display name of the new model.
        name: String,
    },
    /// The load failed; the previous model is still displayed.
    Failed(AssetError),
}

/// What to draw behind the model.
#[derive(Debug, Clone, Copy)]
pub enum BackgroundView<'a> {
    /// Flat sRGB color.
    Solid([f32; 3]),
    /// Camera passthrough; `None` until the first frame arrives.
    Video(Option<&'a VideoFrame>),
}

struct PendingLoad {
    ticket: LoadTicket,
    on_progress: Box<dyn FnMut(f32)>,
}

/// Camera stream plus its latest frame; released together.
struct CameraBackground {
    stream: Box<dyn VideoStream>,
    frame: Option<VideoFrame>,
}

/// Interactive model viewer state.
pub struct Viewer {
    options: Options,
    camera: Camera,
    controls: OrbitControls,
    tween: Option<CameraTween>,
    model: Option<Model>,
    next_model_id: u64,
    auto_rotate: bool,
    background: Option<CameraBackground>,
    capture: Box<dyn CaptureDevice>,
    loader: AssetLoader,
    pending: Option<PendingLoad>,
    last_size: Option<(u32, u32)>,
    render_loop: RenderLoop,
    frame_timing: FrameTiming,
}

impl Viewer {
    /// Create a viewer that caches downloads in the per-user cache
    /// directory (falling back to the system temp directory).
    ///
    /// # Errors
    ///
    /// Returns [`VitrineError::ThreadSpawn`] if the loader thread cannot
    /// be started.
    pub fn new(options: Options) -> Result<Self, VitrineError> {
        let cache = AssetCache::user_default().unwrap_or_else(|e| {
            log::warn!("{e}; caching downloads in the temp directory");
            AssetCache::new(std::env::temp_dir().join("vitrine"))
        });
        Self::with_cache(options, cache)
    }

    /// Create a viewer with an explicit download cache.
    ///
    /// # Errors
    ///
    /// Returns [`VitrineError::ThreadSpawn`] if the loader thread cannot
    /// be started.
    pub fn with_cache(
        options: Options,
        cache: AssetCache,
    ) -> Result<Self, VitrineError> {
        let loader = AssetLoader::new(cache).map_err(VitrineError::ThreadSpawn)?;
        let camera = Camera::from_options(&options.camera);
        let controls = OrbitControls::new(camera.target, options.controls.clone());
        let auto_rotate = options.behavior.auto_rotate;
        Ok(Self {
            options,
            camera,
            controls,
            tween: None,
            model: None,
            next_model_id: 0,
            auto_rotate,
            background: None,
            capture: media::default_device(),
            loader,
            pending: None,
            last_size: None,
            render_loop: RenderLoop::new(),
            frame_timing: FrameTiming::new(),
        })
    }

    /// Replace the capture device used by the camera background.
    #[must_use]
    pub fn with_capture_device(mut self, device: Box<dyn CaptureDevice>) -> Self {
        self.capture = device;
        self
    }

    // -- Loading --

    /// Start loading `source` in the background and return its ticket.
    ///
    /// `on_progress` receives fractions in `[0, 1]` from
    /// [`poll_load`](Self::poll_load) on the calling thread. A newer load
    /// supersedes this one if issued before it completes.
    pub fn load(
        &mut self,
        source: AssetSource,
        on_progress: impl FnMut(f32) + 'static,
    ) -> LoadTicket {
        log::info!("Loading {source}");
        let ticket = self.loader.submit(source);
        self.pending = Some(PendingLoad {
            ticket,
            on_progress: Box::new(on_progress),
        });
        ticket
    }

    /// Whether a load is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Drain loader events. Returns the outcome of the current load once it
    /// completes; events for superseded loads are discarded.
    pub fn poll_load(&mut self) -> Option<LoadOutcome> {
        while let Some(event) = self.loader.try_recv() {
            if let Some(outcome) = self.handle_load_event(event) {
                return Some(outcome);
            }
        }
        None
    }

    fn handle_load_event(&mut self, event: LoadEvent) -> Option<LoadOutcome> {
        let current = self.pending.as_ref().map(|p| p.ticket);
        match event {
            LoadEvent::Progress { ticket, fraction } => {
                if Some(ticket) == current {
                    if let Some(pending) = self.pending.as_mut() {
                        (pending.on_progress)(fraction.clamp(0.0, 1.0));
                    }
                }
                None
            }
            LoadEvent::Finished { ticket, result } => {
                if Some(ticket) != current {
                    log::debug!("Discarding superseded load #{}", ticket.0);
                    return None;
                }
                self.pending = None;
                match result {
                    Ok(data) => {
                        let name = data.name.clone();
                        self.attach_model(data);
                        Some(LoadOutcome::Loaded { name })
                    }
                    Err(e) => Some(LoadOutcome::Failed(e)),
                }
            }
        }
    }

    /// Display `data`, replacing the current model. The model is scaled so
    /// its largest dimension matches the configured size, centered at the
    /// origin, attached to the world, and framed.
    pub fn attach_model(&mut self, data: ModelData) {
        self.next_model_id += 1;
        let mut model = Model::new(ModelId(self.next_model_id), data);
        model.normalize(self.options.behavior.normalized_size);
        if let Some(old) = self.model.replace(model) {
            log::debug!("Released model {}", old.name);
        }
        self.fit_to_view();
    }

    // -- Viewport --

    /// Record a new surface size. Returns `false` (doing nothing) for a
    /// zero dimension or an unchanged size; otherwise updates the camera
    /// aspect and returns `true` so the caller reconfigures its surface.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 || self.last_size == Some((width, height)) {
            return false;
        }
        self.last_size = Some((width, height));
        self.camera.aspect = width as f32 / height as f32;
        true
    }

    fn viewport_height(&self) -> f32 {
        self.last_size.map_or(1.0, |(_, h)| h as f32)
    }

    // -- Camera moves --

    /// Frame the model: pull back so its bounding box fits the vertical
    /// field of view, slightly above and in front of its center. No-op
    /// without a model.
    pub fn fit_to_view(&mut self) {
        let Some(model) = &self.model else {
            return;
        };
        let bounds = model.world_bounds(self.camera.world_matrix());
        if bounds.is_empty() {
            return;
        }
        let center = bounds.center();
        let max_dim = bounds.max_dimension();
        let half_fov = self.camera.fovy.to_radians() * 0.5;
        let distance = (max_dim * 0.5) / half_fov.tan();

        let behavior = &self.options.behavior;
        let eye = center
            + Vec3::new(
                0.0,
                behavior.fit_height_factor * max_dim,
                behavior.fit_distance_margin * distance,
            );
        self.smooth_move_camera(eye, center);
    }

    /// Ease the camera to `eye`, looking at `target`. Replaces any tween in
    /// flight, starting from the current pose.
    pub fn smooth_move_camera(&mut self, eye: Vec3, target: Vec3) {
        let from = CameraPose {
            eye: self.camera.eye,
            target: self.controls.target,
        };
        let behavior = &self.options.behavior;
        self.controls.stop();
        self.tween = Some(CameraTween::new(
            from,
            CameraPose { eye, target },
            behavior.tween_duration,
            behavior.tween_easing,
        ));
    }

    /// Step the camera along its view direction, clamped to the orbit
    /// distance limits.
    pub fn zoom(&mut self, direction: ZoomDirection) {
        let behavior = &self.options.behavior;
        let factor = match direction {
            ZoomDirection::In => behavior.zoom_in_factor,
            ZoomDirection::Out => behavior.zoom_out_factor,
        };
        let target = self.controls.target;
        let offset = self.camera.eye - target;
        let distance = (offset.length() * factor)
            .clamp(self.controls.min_distance(), self.controls.max_distance());
        let eye = target + offset.normalize_or(Vec3::Z) * distance;
        self.smooth_move_camera(eye, target);
    }

    // -- Flags --

    /// Enable or disable spinning the model about its local Y axis.
    pub fn set_auto_rotate(&mut self, enabled: bool) {
        self.auto_rotate = enabled;
    }

    /// Whether auto-rotation is on.
    #[must_use]
    pub fn auto_rotate(&self) -> bool {
        self.auto_rotate
    }

    /// Keep the model fixed on screen while the camera orbits (`true`), or
    /// return it to the world (`false`). The model's world placement is
    /// unchanged at the moment of the switch. Without a model the lock is
    /// simply off.
    pub fn lock_current_to_screen(&mut self, enabled: bool) {
        let camera_world = self.camera.world_matrix();
        let Some(model) = self.model.as_mut() else {
            return;
        };
        let parent = if enabled {
            Attachment::Camera
        } else {
            Attachment::World
        };
        lock::reparent(model, parent, camera_world);
    }

    /// Whether the model is locked to the screen.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.model
            .as_ref()
            .is_some_and(|m| m.attachment == Attachment::Camera)
    }

    /// Show the device camera behind the model (`true`) or the solid
    /// background (`false`). Returns whether the camera background is on
    /// afterwards; a device that cannot be opened is logged and leaves it
    /// off.
    pub fn set_camera_background(&mut self, enabled: bool) -> bool {
        if !enabled {
            self.stop_background();
            return false;
        }
        if self.background.is_some() {
            return true;
        }
        match self.capture.open(&self.options.capture) {
            Ok(stream) => {
                log::info!("Camera background enabled");
                self.background = Some(CameraBackground {
                    stream,
                    frame: None,
                });
                true
            }
            Err(e) => {
                log::warn!("Camera background unavailable: {e}");
                false
            }
        }
    }

    /// Whether the camera background is on.
    #[must_use]
    pub fn camera_background(&self) -> bool {
        self.background.is_some()
    }

    fn stop_background(&mut self) {
        if let Some(mut bg) = self.background.take() {
            bg.stream.stop();
            log::info!("Camera background disabled");
        }
    }

    fn poll_background(&mut self) {
        let Some(bg) = self.background.as_mut() else {
            return;
        };
        match bg.stream.latest_frame() {
            Ok(Some(frame)) => bg.frame = Some(frame),
            Ok(None) => {}
            Err(e) => {
                log::warn!("{e}; reverting to solid background");
                self.stop_background();
            }
        }
    }

    // -- Frame --

    /// Advance animation state by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        if let Some(tween) = self.tween.as_mut() {
            let pose = tween.advance(dt);
            self.camera.eye = pose.eye;
            self.camera.target = pose.target;
            self.controls.target = pose.target;
            if tween.is_finished() {
                self.tween = None;
            }
        }

        if self.auto_rotate {
            let angle = self.options.behavior.auto_rotate_speed * dt;
            if let Some(model) = self.model.as_mut() {
                model.transform.rotate_local_y(angle);
            }
        }

        let _ = self.controls.update(&mut self.camera);
        self.poll_background();
    }

    /// Start the render loop.
    pub fn start(&mut self) {
        self.render_loop.start();
    }

    /// Stop the render loop. The viewer keeps its state and can be
    /// restarted.
    pub fn stop(&mut self) {
        self.render_loop.stop();
    }

    /// Whether the render loop is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.render_loop.is_running()
    }

    /// Tick the render loop at `now`. Returns `false` without touching any
    /// state while the loop is stopped.
    pub fn advance(&mut self, now: std::time::Instant) -> bool {
        let Some(dt) = self.render_loop.tick(now) else {
            return false;
        };
        self.frame_timing.record(now);
        self.update(dt);
        true
    }

    /// Smoothed frames per second.
    #[must_use]
    pub fn fps(&self) -> f32 {
        self.frame_timing.fps()
    }

    // -- Commands --

    /// Perform a command. Carousel commands are not viewer operations and
    /// are ignored here.
    pub fn execute(&mut self, command: ViewerCommand) {
        match command {
            ViewerCommand::RotateCamera { delta } => {
                self.tween = None;
                let height = self.viewport_height();
                self.controls.rotate(delta, height);
            }
            ViewerCommand::PanCamera { delta } => {
                self.tween = None;
                let height = self.viewport_height();
                self.controls.pan(delta, &self.camera, height);
            }
            ViewerCommand::Dolly { amount } => {
                self.tween = None;
                self.controls.dolly(amount);
            }
            ViewerCommand::FitToView => self.fit_to_view(),
            ViewerCommand::ZoomIn => self.zoom(ZoomDirection::In),
            ViewerCommand::ZoomOut => self.zoom(ZoomDirection::Out),
            ViewerCommand::ToggleAutoRotate => {
                self.set_auto_rotate(!self.auto_rotate);
            }
            ViewerCommand::ToggleLock => {
                self.lock_current_to_screen(!self.is_locked());
            }
            ViewerCommand::ToggleCameraBackground => {
                let _ = self.set_camera_background(!self.camera_background());
            }
            ViewerCommand::CarouselPrev | ViewerCommand::CarouselNext => {
                log::trace!("Ignoring carousel command {command:?}");
            }
        }
    }

    // -- Accessors --

    /// The camera.
    #[must_use]
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// The orbit controls.
    #[must_use]
    pub fn controls(&self) -> &OrbitControls {
        &self.controls
    }

    /// Mutable orbit controls.
    pub fn controls_mut(&mut self) -> &mut OrbitControls {
        &mut self.controls
    }

    /// The tween in flight, if any.
    #[must_use]
    pub fn camera_tween(&self) -> Option<&CameraTween> {
        self.tween.as_ref()
    }

    /// The displayed model.
    #[must_use]
    pub fn model(&self) -> Option<&Model> {
        self.model.as_ref()
    }

    /// Model-to-world matrix of the displayed model.
    #[must_use]
    pub fn model_world_matrix(&self) -> Option<Mat4> {
        self.model
            .as_ref()
            .map(|m| m.world_matrix(self.camera.world_matrix()))
    }

    /// Background to render this frame.
    #[must_use]
    pub fn background(&self) -> BackgroundView<'_> {
        match &self.background {
            Some(bg) => BackgroundView::Video(bg.frame.as_ref()),
            None => BackgroundView::Solid(self.options.display.background_color),
        }
    }

    /// Current options.
    #[must_use]
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Last surface size recorded by [`resize`](Self::resize).
    #[must_use]
    pub fn size(&self) -> Option<(u32, u32)> {
        self.last_size
    }

    /// Orbit by a screen-space drag, for callers without an
    /// [`InputProcessor`](crate::InputProcessor).
    pub fn rotate(&mut self, delta: Vec2) {
        self.execute(ViewerCommand::RotateCamera { delta });
    }
}

impl Drop for Viewer {
    fn drop(&mut self) {
        self.render_loop.stop();
        self.stop_background();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;
    use std::time::{Duration, Instant};

    use approx::assert_relative_eq;
    use glam::{Quat, Vec4};

    use super::*;
    use crate::asset::test_support::box_model;
    use crate::media::test_support::{frame, ScriptedCapture};
    use crate::media::MediaError;

    fn viewer() -> (Viewer, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let viewer =
            Viewer::with_cache(Options::default(), AssetCache::new(dir.path()))
                .unwrap();
        (viewer, dir)
    }

    fn viewer_with_box() -> (Viewer, tempfile::TempDir) {
        let (mut viewer, dir) = viewer();
        viewer.attach_model(box_model(Vec3::ZERO, Vec3::new(4.0, 2.0, 1.0)));
        viewer.update(1.0);
        (viewer, dir)
    }

    fn assert_vec3_eq(a: Vec3, b: Vec3) {
        assert_relative_eq!(a.x, b.x, epsilon = 1e-4);
        assert_relative_eq!(a.y, b.y, epsilon = 1e-4);
        assert_relative_eq!(a.z, b.z, epsilon = 1e-4);
    }

    #[test]
    fn attached_model_is_normalized_and_framed() {
        let (viewer, _dir) = viewer_with_box();
        let model = viewer.model().unwrap();
        let bounds = model.world_bounds(viewer.camera().world_matrix());
        assert_relative_eq!(bounds.max_dimension(), 1.6, epsilon = 1e-4);
        assert_vec3_eq(bounds.center(), Vec3::ZERO);

        // dist = 0.8 / tan(27.5°); eye = (0, 0.2 * 1.6, 1.35 * dist)
        let dist = 0.8 / 27.5_f32.to_radians().tan();
        assert_vec3_eq(viewer.camera().eye, Vec3::new(0.0, 0.32, 1.35 * dist));
        assert_vec3_eq(viewer.controls().target, Vec3::ZERO);
        assert!(viewer.camera_tween().is_none());
    }

    #[test]
    fn fit_without_model_is_noop() {
        let (mut viewer, _dir) = viewer();
        let eye = viewer.camera().eye;
        viewer.fit_to_view();
        assert!(viewer.camera_tween().is_none());
        assert_eq!(viewer.camera().eye, eye);
    }

    #[test]
    fn zoom_steps_scale_distance() {
        let (mut viewer, _dir) = viewer_with_box();
        let start = viewer.camera().distance();

        viewer.zoom(ZoomDirection::In);
        viewer.update(1.0);
        assert_relative_eq!(viewer.camera().distance(), start * 0.85, epsilon = 1e-3);

        viewer.zoom(ZoomDirection::Out);
        viewer.update(1.0);
        assert_relative_eq!(
            viewer.camera().distance(),
            start * 0.85 * 1.15,
            epsilon = 1e-3
        );
    }

    #[test]
    fn zoom_respects_distance_limits() {
        let (mut viewer, _dir) = viewer_with_box();
        for _ in 0..40 {
            viewer.zoom(ZoomDirection::In);
            viewer.update(1.0);
        }
        assert_relative_eq!(viewer.camera().distance(), 0.3, epsilon = 1e-3);
        assert_eq!(ZoomDirection::from_step(1), ZoomDirection::In);
        assert_eq!(ZoomDirection::from_step(-1), ZoomDirection::Out);
    }

    #[test]
    fn zoom_out_stops_at_max_distance() {
        let (mut viewer, _dir) = viewer_with_box();
        let max = viewer.options().controls.max_distance;
        for _ in 0..60 {
            viewer.zoom(ZoomDirection::from_step(-1));
            viewer.update(1.0);
        }
        assert_relative_eq!(viewer.camera().distance(), max, epsilon = 1e-3);
        assert_relative_eq!(max, 50.0);
    }

    #[test]
    fn new_tween_supersedes_old() {
        let (mut viewer, _dir) = viewer();
        let first = Vec3::new(3.0, 1.0, 3.0);
        let second = Vec3::new(0.0, 1.0, 3.0);
        let target = Vec3::new(0.0, 0.5, 0.0);

        viewer.smooth_move_camera(first, target);
        viewer.update(0.1);
        let mid = viewer.camera().eye;
        viewer.smooth_move_camera(second, target);
        assert_eq!(viewer.camera_tween().unwrap().destination().eye, second);

        // The replacement starts from where the first one left off.
        assert_vec3_eq(viewer.camera_tween().unwrap().sample().eye, mid);

        viewer.update(1.0);
        assert!(viewer.camera_tween().is_none());
        assert_vec3_eq(viewer.camera().eye, second);
    }

    #[test]
    fn resize_ignores_zero_and_unchanged_sizes() {
        let (mut viewer, _dir) = viewer();
        assert!(!viewer.resize(0, 600));
        assert!(!viewer.resize(800, 0));
        assert!(viewer.resize(800, 600));
        assert!(!viewer.resize(800, 600));
        assert_relative_eq!(viewer.camera().aspect, 800.0 / 600.0);
        assert!(viewer.resize(1024, 600));
        assert_eq!(viewer.size(), Some((1024, 600)));
    }

    #[test]
    fn auto_rotate_spins_about_local_y() {
        let (mut viewer, _dir) = viewer_with_box();
        viewer.set_auto_rotate(true);
        viewer.update(0.5);
        let rotation = viewer.model().unwrap().transform.rotation;
        assert!(rotation.abs_diff_eq(Quat::from_rotation_y(0.3), 1e-5));

        viewer.execute(ViewerCommand::ToggleAutoRotate);
        assert!(!viewer.auto_rotate());
        viewer.update(0.5);
        let after = viewer.model().unwrap().transform.rotation;
        assert!(after.abs_diff_eq(rotation, 1e-6));
    }

    #[test]
    fn lock_preserves_world_placement() {
        let (mut viewer, _dir) = viewer_with_box();
        let before = viewer.model_world_matrix().unwrap();
        viewer.lock_current_to_screen(true);
        assert!(viewer.is_locked());
        assert!(viewer.model_world_matrix().unwrap().abs_diff_eq(before, 1e-4));
        viewer.lock_current_to_screen(false);
        assert!(!viewer.is_locked());
        assert!(viewer.model_world_matrix().unwrap().abs_diff_eq(before, 1e-4));
    }

    #[test]
    fn locked_model_keeps_screen_position_while_orbiting() {
        let (mut viewer, _dir) = viewer_with_box();
        viewer.lock_current_to_screen(true);
        let view_space_center = |v: &Viewer| {
            let world = v.model_world_matrix().unwrap() * Vec4::W;
            (v.camera().build_view() * world).truncate()
        };
        let before = view_space_center(&viewer);

        let _ = viewer.resize(800, 600);
        viewer.rotate(Vec2::new(150.0, 40.0));
        for _ in 0..120 {
            viewer.update(1.0 / 60.0);
        }
        assert_vec3_eq(view_space_center(&viewer), before);
    }

    #[test]
    fn lock_without_model_stays_off() {
        let (mut viewer, _dir) = viewer();
        viewer.lock_current_to_screen(true);
        assert!(!viewer.is_locked());
    }

    #[test]
    fn new_model_resets_lock() {
        let (mut viewer, _dir) = viewer_with_box();
        viewer.lock_current_to_screen(true);
        let first_id = viewer.model().unwrap().id;
        viewer.attach_model(box_model(Vec3::ZERO, Vec3::ONE));
        assert!(!viewer.is_locked());
        assert_ne!(viewer.model().unwrap().id, first_id);
    }

    #[test]
    fn failed_load_keeps_previous_model() {
        let (mut viewer, dir) = viewer_with_box();
        let before = viewer.model().unwrap().id;
        let _ = viewer.load(
            AssetSource::Path(dir.path().join("missing.glb")),
            |_| {},
        );
        assert!(viewer.is_loading());

        let deadline = Instant::now() + Duration::from_secs(10);
        let outcome = loop {
            if let Some(outcome) = viewer.poll_load() {
                break outcome;
            }
            assert!(Instant::now() < deadline, "load never completed");
            std::thread::sleep(Duration::from_millis(10));
        };
        assert!(matches!(outcome, LoadOutcome::Failed(_)));
        assert!(!viewer.is_loading());
        assert_eq!(viewer.model().unwrap().id, before);
    }

    #[test]
    fn successful_load_reports_progress_and_attaches() {
        let (mut viewer, dir) = viewer();
        let path = dir.path().join("tri.gltf");
        std::fs::write(&path, crate::asset::import::tests::TRIANGLE_GLTF).unwrap();

        let progress = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&progress);
        let _ = viewer.load(AssetSource::Path(path), move |p| {
            sink.borrow_mut().push(p);
        });

        let deadline = Instant::now() + Duration::from_secs(10);
        let outcome = loop {
            if let Some(outcome) = viewer.poll_load() {
                break outcome;
            }
            assert!(Instant::now() < deadline, "load never completed");
            std::thread::sleep(Duration::from_millis(10));
        };
        match outcome {
            LoadOutcome::Loaded { name } => assert_eq!(name, "tri.gltf"),
            LoadOutcome::Failed(e) => panic!("load failed: {e}"),
        }
        assert_eq!(*progress.borrow(), vec![1.0]);
        assert!(viewer.model().is_some());
    }

    #[test]
    fn render_loop_gates_updates() {
        let (mut viewer, _dir) = viewer_with_box();
        viewer.set_auto_rotate(true);
        let t0 = Instant::now();
        assert!(!viewer.advance(t0));

        viewer.start();
        assert!(viewer.is_running());
        assert!(viewer.advance(t0));
        assert!(viewer.advance(t0 + Duration::from_millis(100)));
        let rotation = viewer.model().unwrap().transform.rotation;
        assert!(rotation.abs_diff_eq(Quat::from_rotation_y(0.06), 1e-5));

        viewer.stop();
        assert!(!viewer.advance(t0 + Duration::from_millis(200)));
    }

    fn scripted(
        script: Vec<Result<Option<VideoFrame>, MediaError>>,
    ) -> (Viewer, tempfile::TempDir, Rc<RefCell<u32>>) {
        let (viewer, dir) = viewer();
        let stopped = Rc::new(RefCell::new(0));
        let device = ScriptedCapture {
            script: Rc::new(RefCell::new(VecDeque::from(script))),
            stopped: Rc::clone(&stopped),
        };
        (viewer.with_capture_device(Box::new(device)), dir, stopped)
    }

    #[test]
    fn camera_background_shows_latest_frame() {
        let (mut viewer, _dir, stopped) =
            scripted(vec![Ok(None), Ok(Some(frame(1))), Ok(None)]);
        assert!(viewer.set_camera_background(true));
        viewer.update(0.0);
        assert!(matches!(viewer.background(), BackgroundView::Video(None)));
        viewer.update(0.0);
        viewer.update(0.0);
        match viewer.background() {
            BackgroundView::Video(Some(f)) => assert_eq!(f.serial, 1),
            other => panic!("unexpected background {other:?}"),
        }

        assert!(!viewer.set_camera_background(false));
        assert!(matches!(viewer.background(), BackgroundView::Solid(_)));
        assert_eq!(*stopped.borrow(), 1);
    }

    #[test]
    fn stream_failure_reverts_to_solid() {
        let (mut viewer, _dir, stopped) =
            scripted(vec![Err(MediaError::Stream("unplugged".into()))]);
        assert!(viewer.set_camera_background(true));
        viewer.update(0.0);
        assert!(!viewer.camera_background());
        assert!(matches!(viewer.background(), BackgroundView::Solid(_)));
        assert_eq!(*stopped.borrow(), 1);
    }

    #[test]
    fn unsupported_capture_leaves_background_solid() {
        let (viewer, _dir) = viewer();
        let mut viewer =
            viewer.with_capture_device(Box::new(crate::media::UnavailableCapture));
        assert!(!viewer.set_camera_background(true));
        viewer.execute(ViewerCommand::ToggleCameraBackground);
        assert!(!viewer.camera_background());
    }
}
