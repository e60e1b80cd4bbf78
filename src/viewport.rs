//! The per-session state object both hosts drive.
//!
//! A [`Viewport`] owns the camera and its orbit rig, the scene, the input
//! processor and the load status. Hosts call [`Viewport::prepare_frame`]
//! once per tick with the current display size, forward input, and push
//! [`Viewport::take_status_text`] to their label. Nothing here touches the
//! GPU, so the whole session is testable headless.

use std::sync::mpsc::{Receiver, TryRecvError};

use crate::bounds::BoundingBox;
use crate::camera::framing::MIN_FRAME_EXTENT;
use crate::camera::{frame_area, Camera, CameraController, OrbitControls};
use crate::input::{CameraCommand, InputEvent, InputProcessor, KeyAction};
use crate::loader::{LoadError, LoadEvent};
use crate::options::Options;
use crate::progress::{LoadProgress, LoadStatus, ProgressReporter};
use crate::scene::{light_rig, NodeId, Scene, SceneGraph, SceneNode};

/// Keeps the drawable's backing size in step with its display size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeTracker {
    backing: (u32, u32),
}

impl ResizeTracker {
    /// Tracker for a drawable whose backing store is `backing` pixels.
    #[must_use]
    pub fn new(backing: (u32, u32)) -> Self {
        Self { backing }
    }

    /// Current backing size.
    #[must_use]
    pub fn backing_size(&self) -> (u32, u32) {
        self.backing
    }

    /// If the display size differs from the backing size, adopt it and
    /// return the new aspect ratio. Zero-sized displays are ignored.
    pub fn check(&mut self, display_width: u32, display_height: u32) -> Option<f32> {
        if display_width == 0 || display_height == 0 {
            return None;
        }
        if self.backing == (display_width, display_height) {
            return None;
        }
        self.backing = (display_width, display_height);
        Some(display_width as f32 / display_height as f32)
    }
}

/// Camera, scene, input and load status for one model view.
pub struct Viewport<S: SceneGraph = Scene> {
    options: Options,
    scene: S,
    controller: CameraController,
    input: InputProcessor,
    reporter: ProgressReporter,
    resize: ResizeTracker,
    loads: Option<Receiver<LoadEvent>>,
    model: Option<NodeId>,
    model_bounds: Option<BoundingBox>,
    status_changed: bool,
}

impl<S: SceneGraph> Viewport<S> {
    /// Session over `scene` with the camera at its start-up pose and the
    /// light rig added. `backing_size` is the drawable's current size.
    #[must_use]
    pub fn new(options: Options, mut scene: S, backing_size: (u32, u32)) -> Self {
        for light in light_rig(&options.lighting) {
            scene.add_light(light);
        }
        if options.display.ground_plane {
            let _ = scene.add_node(SceneNode::ground_plane(options.display.ground_plane_size));
        }
        let controller = start_controller(&options, backing_size);
        Self {
            options,
            scene,
            controller,
            input: InputProcessor::new(),
            reporter: ProgressReporter::new(),
            resize: ResizeTracker::new(backing_size),
            loads: None,
            model: None,
            model_bounds: None,
            status_changed: false,
        }
    }

    /// Options the session was built with.
    #[must_use]
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// The scene.
    #[must_use]
    pub fn scene(&self) -> &S {
        &self.scene
    }

    /// The current camera.
    #[must_use]
    pub fn camera(&self) -> &Camera {
        &self.controller.camera
    }

    /// The orbit rig.
    #[must_use]
    pub fn orbit(&self) -> &OrbitControls {
        &self.controller.orbit
    }

    /// Current load status.
    #[must_use]
    pub fn status(&self) -> &LoadStatus {
        self.reporter.status()
    }

    /// Status text, if it changed since the last call.
    pub fn take_status_text(&mut self) -> Option<String> {
        if !self.status_changed {
            return None;
        }
        self.status_changed = false;
        Some(self.reporter.status().to_string())
    }

    /// Handle of the loaded model, once loaded.
    #[must_use]
    pub fn model(&self) -> Option<NodeId> {
        self.model
    }

    /// World-space bounds of the loaded model, once loaded.
    #[must_use]
    pub fn model_bounds(&self) -> Option<BoundingBox> {
        self.model_bounds
    }

    /// Drawable backing size.
    #[must_use]
    pub fn backing_size(&self) -> (u32, u32) {
        self.resize.backing_size()
    }

    /// Receive load events from `events` at the top of each frame.
    pub fn attach_load(&mut self, events: Receiver<LoadEvent>) {
        self.loads = Some(events);
    }

    /// Per-tick bookkeeping: resize check, camera aspect, pending load
    /// events. Returns the new backing size when the host must reconfigure
    /// its surface.
    pub fn prepare_frame(&mut self, display_size: (u32, u32)) -> Option<(u32, u32)> {
        let resized = self.resize.check(display_size.0, display_size.1).map(|aspect| {
            self.controller.resize(display_size.0, display_size.1);
            log::debug!(
                "resized to {}x{} (aspect {aspect:.3})",
                display_size.0,
                display_size.1
            );
            display_size
        });
        self.drain_load_events();
        resized
    }

    /// Handle every load event queued so far.
    pub fn drain_load_events(&mut self) {
        let Some(events) = self.loads.take() else {
            return;
        };
        loop {
            match events.try_recv() {
                Ok(event) => {
                    let finished = matches!(event, LoadEvent::Finished(_));
                    self.handle_load_event(event);
                    if finished {
                        return;
                    }
                }
                Err(TryRecvError::Empty) => {
                    self.loads = Some(events);
                    return;
                }
                Err(TryRecvError::Disconnected) => {
                    if !self.reporter.status().is_terminal() {
                        self.on_load_failed(&LoadError::Transfer(
                            "loader stopped before finishing".into(),
                        ));
                    }
                    return;
                }
            }
        }
    }

    /// Handle one load event.
    pub fn handle_load_event(&mut self, event: LoadEvent) {
        match event {
            LoadEvent::Progress(progress) => self.on_progress(progress),
            LoadEvent::Finished(Ok(root)) => self.on_model_loaded(root),
            LoadEvent::Finished(Err(err)) => self.on_load_failed(&err),
        }
    }

    /// Record a transfer progress tick.
    pub fn on_progress(&mut self, progress: LoadProgress) {
        let before = self.reporter.status().clone();
        if *self.reporter.report(progress) != before {
            self.status_changed = true;
        }
    }

    /// Add the model to the scene and frame the camera around it.
    pub fn on_model_loaded(&mut self, root: SceneNode) {
        let id = self.scene.add_node(root);
        self.model = Some(id);
        self.model_bounds = self.scene.bounding_box(id).filter(|b| !b.is_empty());
        match self.model_bounds {
            Some(bounds) => {
                log::info!(
                    "model bounds: center {:?}, size {:.3}",
                    bounds.center(),
                    bounds.size()
                );
                self.frame(&bounds);
            }
            None => log::warn!("loaded model has no vertices; camera left as is"),
        }
        let _ = self.reporter.finish();
        self.status_changed = true;
    }

    /// Show the failure. The scene and camera stay as they were.
    pub fn on_load_failed(&mut self, error: &LoadError) {
        log::error!("model load failed: {error}");
        let _ = self.reporter.fail(error);
        self.status_changed = true;
    }

    /// Feed a platform input event to the orbit rig.
    pub fn handle_input(&mut self, event: InputEvent) {
        match self.input.handle_event(event) {
            Some(CameraCommand::Rotate { delta }) => self.controller.rotate(delta),
            Some(CameraCommand::Pan { delta }) => self.controller.pan(delta),
            Some(CameraCommand::Zoom { delta }) => self.controller.zoom(delta),
            None => {}
        }
    }

    /// Run the action bound to `key` (a `KeyCode` name such as `"KeyF"`).
    /// Returns whether the key was bound.
    pub fn handle_key(&mut self, key: &str) -> bool {
        match self.options.keybindings.lookup(key) {
            Some(KeyAction::ReframeModel) => self.reframe(),
            Some(KeyAction::ResetCamera) => self.reset_camera(),
            None => return false,
        }
        true
    }

    /// Frame the loaded model again from the current viewing direction.
    pub fn reframe(&mut self) {
        if let Some(bounds) = self.model_bounds {
            self.frame(&bounds);
        }
    }

    /// Back to the start-up pose, then reframe the model if there is one.
    pub fn reset_camera(&mut self) {
        self.controller = start_controller(&self.options, self.resize.backing_size());
        self.reframe();
    }

    fn frame(&mut self, bounds: &BoundingBox) {
        let size = bounds.size();
        let framed = frame_area(
            size * self.options.camera.frame_margin,
            size,
            bounds.center(),
            &self.controller.camera,
        );
        let limit = size.max(MIN_FRAME_EXTENT) * self.options.camera.max_distance_factor;
        self.controller.apply_framing(framed, limit);
    }
}

fn start_controller(options: &Options, size: (u32, u32)) -> CameraController {
    let aspect = if size.0 > 0 && size.1 > 0 {
        size.0 as f32 / size.1 as f32
    } else {
        Camera::default().aspect
    };
    let camera = Camera::from_options(&options.camera, aspect);
    let orbit = OrbitControls::new(&camera, &options.camera);
    CameraController::new(camera, orbit, size.1.max(1) as f32)
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use glam::Vec3;

    use super::*;
    use crate::input::MouseButton;
    use crate::scene::{Light, Mesh};

    fn cube(center: Vec3, edge: f32) -> SceneNode {
        let h = edge * 0.5;
        let mesh = Mesh {
            positions: vec![
                (center - Vec3::splat(h)).to_array(),
                (center + Vec3::splat(h)).to_array(),
                (center + Vec3::new(h, -h, h)).to_array(),
            ],
            indices: vec![0, 1, 2],
            ..Mesh::default()
        };
        SceneNode {
            meshes: vec![mesh],
            ..SceneNode::default()
        }
    }

    fn viewport() -> Viewport {
        Viewport::new(Options::default(), Scene::new(), (800, 600))
    }

    #[test]
    fn resize_fires_once_per_mismatch() {
        let mut tracker = ResizeTracker::new((300, 150));
        assert_eq!(tracker.check(800, 400), Some(2.0));
        assert_eq!(tracker.check(800, 400), None);
        assert_eq!(tracker.check(0, 400), None);
        assert_eq!(tracker.backing_size(), (800, 400));
        assert_eq!(tracker.check(400, 400), Some(1.0));
    }

    #[test]
    fn prepare_frame_keeps_aspect_in_sync() {
        let mut vp = viewport();
        assert_eq!(vp.prepare_frame((800, 600)), None);
        assert_eq!(vp.prepare_frame((1920, 1080)), Some((1920, 1080)));
        assert!((vp.camera().aspect - 1920.0 / 1080.0).abs() < 1e-6);
        assert_eq!(vp.prepare_frame((1920, 1080)), None);
    }

    #[test]
    fn start_pose_comes_from_options() {
        let vp = viewport();
        let cam = vp.camera();
        assert!((cam.eye - Vec3::new(0.0, 10.0, 20.0)).length() < 1e-4);
        assert_eq!(cam.target, Vec3::new(0.0, 5.0, 0.0));
        assert_eq!(cam.fovy, 45.0);
        assert_eq!((cam.znear, cam.zfar), (0.1, 100.0));
        assert_eq!(vp.scene().lights().len(), 2);
        assert_eq!(vp.status(), &LoadStatus::Idle);
    }

    #[test]
    fn loaded_model_is_framed() {
        let mut vp = viewport();
        vp.on_model_loaded(cube(Vec3::new(3.0, 1.0, -2.0), 2.0));

        let bounds = vp.model_bounds().unwrap();
        let size = bounds.size();
        let cam = vp.camera();
        assert!((cam.target - bounds.center()).length() < 1e-4);
        assert!((cam.znear - size / 100.0).abs() < 1e-6);
        assert!((cam.zfar - size * 100.0).abs() < 1e-3);
        assert!((vp.orbit().max_distance - size * 10.0).abs() < 1e-4);
        assert_eq!(vp.status(), &LoadStatus::Ready);
        assert_eq!(vp.take_status_text().as_deref(), Some("Done loading 3D Model!"));
        assert_eq!(vp.take_status_text(), None);
    }

    #[test]
    fn point_sized_model_keeps_a_finite_camera() {
        let mut vp = viewport();
        let point = SceneNode {
            meshes: vec![Mesh {
                positions: vec![[1.0, 2.0, 3.0]; 3],
                indices: vec![0, 1, 2],
                ..Mesh::default()
            }],
            ..SceneNode::default()
        };
        vp.on_model_loaded(point);

        let cam = vp.camera();
        assert_eq!(cam.target, Vec3::new(1.0, 2.0, 3.0));
        assert!(cam.eye.distance(cam.target) > 0.0);
        assert!(vp.orbit().max_distance > 0.0);
        assert!(cam.has_valid_projection());
        assert!(cam.build_matrix().is_finite());

        vp.handle_input(InputEvent::Scroll { delta: -5.0 });
        assert!(vp.camera().build_matrix().is_finite());
    }

    #[test]
    fn failed_load_keeps_camera() {
        let mut vp = viewport();
        let before = *vp.camera();
        vp.on_load_failed(&LoadError::Transfer("HTTP 404 Not Found".into()));
        assert_eq!(*vp.camera(), before);
        assert!(vp.model().is_none());
        assert!(vp.take_status_text().unwrap().contains("404"));
    }

    #[test]
    fn load_events_are_drained_in_order() {
        let mut vp = viewport();
        let (tx, rx) = mpsc::channel();
        vp.attach_load(rx);
        tx.send(LoadEvent::Progress(LoadProgress::new(500_000, 1_000_000)))
            .unwrap();
        let _ = vp.prepare_frame((800, 600));
        assert_eq!(
            vp.take_status_text().as_deref(),
            Some("Loading 3D model: 0.50 of 1.00 (50%)")
        );

        tx.send(LoadEvent::Progress(LoadProgress::new(1_000_000, 1_000_000)))
            .unwrap();
        tx.send(LoadEvent::Finished(Ok(cube(Vec3::ZERO, 1.0)))).unwrap();
        let _ = vp.prepare_frame((800, 600));
        assert_eq!(vp.status(), &LoadStatus::Ready);
        assert!(vp.model().is_some());
    }

    #[test]
    fn dropped_loader_is_a_failure() {
        let mut vp = viewport();
        let (tx, rx) = mpsc::channel::<LoadEvent>();
        vp.attach_load(rx);
        drop(tx);
        vp.drain_load_events();
        assert!(matches!(vp.status(), LoadStatus::Failed(_)));
    }

    #[test]
    fn reframe_key_restores_framing_after_orbit() {
        let mut vp = viewport();
        vp.on_model_loaded(cube(Vec3::ZERO, 4.0));
        let framed = vp.camera().eye;
        vp.handle_input(InputEvent::MouseButton {
            button: MouseButton::Left,
            pressed: true,
        });
        vp.handle_input(InputEvent::CursorMoved { x: 100.0, y: 100.0 });
        vp.handle_input(InputEvent::CursorMoved { x: 100.0, y: 140.0 });
        vp.handle_input(InputEvent::MouseButton {
            button: MouseButton::Left,
            pressed: false,
        });
        assert!((vp.camera().eye - framed).length() > 1e-2);
        assert!(vp.handle_key("KeyF"));
        assert!((vp.camera().eye - framed).length() < 1e-2);
        assert!(!vp.handle_key("KeyQ"));
    }

    #[test]
    fn scroll_dollies_toward_target() {
        let mut vp = viewport();
        let before = vp.orbit().distance();
        vp.handle_input(InputEvent::Scroll { delta: 1.0 });
        assert!(vp.orbit().distance() < before);
    }

    #[derive(Default)]
    struct RecordingScene {
        nodes: Vec<SceneNode>,
        lights: Vec<Light>,
    }

    impl SceneGraph for RecordingScene {
        fn add_node(&mut self, node: SceneNode) -> NodeId {
            self.nodes.push(node);
            Scene::new().add_node(SceneNode::default())
        }

        fn add_light(&mut self, light: Light) {
            self.lights.push(light);
        }

        fn bounding_box(&self, _id: NodeId) -> Option<BoundingBox> {
            self.nodes.last().map(SceneNode::bounding_box)
        }
    }

    #[test]
    fn works_over_any_scene_graph() {
        let mut vp = Viewport::new(Options::default(), RecordingScene::default(), (640, 480));
        assert_eq!(vp.scene().lights.len(), 2);
        vp.on_model_loaded(cube(Vec3::new(0.0, 2.0, 0.0), 2.0));
        assert_eq!(vp.scene().nodes.len(), 1);
        assert!((vp.camera().target - Vec3::new(0.0, 2.0, 0.0)).length() < 1e-4);
    }
}
