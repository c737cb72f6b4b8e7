use std::time::Instant;

use glam::Vec3;
use skyisle_common::Viewport;
use skyisle_input::{KeyBindings, LockRequest, LockState, MovementFlags, PointerLock};
use skyisle_motion::{FrameClock, Kinematics, MotionParams};
use skyisle_scene::{FirstPersonCamera, Renderer, SceneDescription};

use crate::config::ExploreConfig;
use crate::error::ExploreError;
use crate::overlay::Overlay;
use crate::page::PageHost;

/// Hide the landing page, reveal the map container and start the view.
///
/// The returned view is ready for its first [`MapView::animate_frame`]; the
/// host keeps calling it once per display refresh for as long as the view
/// lives.
pub fn launch_map_view<H: PageHost>(
    host: &mut H,
    config: &ExploreConfig,
    now: Instant,
) -> Result<MapView<H::Renderer>, ExploreError> {
    host.hide_landing();
    let Some(renderer) = host.reveal_map_container() else {
        tracing::error!("map container not found");
        return Err(ExploreError::MissingMapContainer);
    };
    tracing::info!("launching map view");
    Ok(MapView::init(renderer, config, now))
}

/// First-person view of the floating island.
///
/// Owns the scene, the camera rig, the input flags and the movement state for
/// the lifetime of the view. Event handlers and the per-frame step are plain
/// methods; the host decides when to call them.
pub struct MapView<R: Renderer> {
    renderer: R,
    scene: SceneDescription,
    camera: FirstPersonCamera,
    controls: PointerLock,
    overlay: Overlay,
    bindings: KeyBindings,
    flags: MovementFlags,
    kinematics: Kinematics,
    params: MotionParams,
    clock: FrameClock,
}

impl<R: Renderer> MapView<R> {
    /// Build the camera, scene and control rig around a render target.
    pub fn init(renderer: R, config: &ExploreConfig, now: Instant) -> Self {
        let viewport = renderer.viewport();
        let camera = FirstPersonCamera::from_config(&config.camera, viewport);
        let scene = SceneDescription::floating_island();
        tracing::info!(
            width = viewport.width(),
            height = viewport.height(),
            meshes = scene.meshes.len(),
            "map view initialized"
        );
        Self {
            renderer,
            scene,
            camera,
            controls: PointerLock::new(),
            overlay: Overlay::default(),
            bindings: config.bindings.clone(),
            flags: MovementFlags::new(),
            kinematics: Kinematics::new(),
            params: config.movement.params,
            clock: FrameClock::new(now, config.movement.max_frame_duration()),
        }
    }

    /// Press a physical key. Returns true if it is a movement key.
    pub fn on_key_down(&mut self, code: &str) -> bool {
        self.set_key(code, true)
    }

    /// Release a physical key. Returns true if it is a movement key.
    pub fn on_key_up(&mut self, code: &str) -> bool {
        self.set_key(code, false)
    }

    fn set_key(&mut self, code: &str, held: bool) -> bool {
        match self.bindings.lookup(code) {
            Some(key) => {
                self.flags.set(key, held);
                tracing::trace!(code, ?key, held, "movement key");
                true
            }
            None => false,
        }
    }

    /// The window lost focus: key releases will not arrive, so drop them all.
    pub fn on_focus_lost(&mut self) {
        self.flags.release_all();
    }

    /// Mouse movement in pixels. Only turns the camera while locked.
    pub fn on_mouse_move(&mut self, dx: f32, dy: f32) -> bool {
        if !self.controls.is_locked() {
            return false;
        }
        self.camera.rotate(dx, dy);
        true
    }

    /// The overlay was clicked. Returns the lock request for the host to act
    /// on, or `None` if already locked.
    pub fn click_overlay(&mut self) -> Option<LockRequest> {
        self.controls.request_lock()
    }

    /// Ask the host to release the pointer (e.g. Escape was pressed).
    pub fn request_unlock(&mut self) -> Option<LockRequest> {
        self.controls.request_unlock()
    }

    pub fn on_pointer_locked(&mut self) {
        if self.controls.on_locked() {
            self.overlay.hide();
        }
    }

    pub fn on_pointer_unlocked(&mut self) {
        if self.controls.on_unlocked() {
            self.overlay.show();
        }
    }

    pub fn on_pointer_lock_failed(&mut self, reason: &str) {
        self.controls.on_lock_failed(reason);
    }

    /// Keep the projection and the render target in step with the window.
    pub fn on_window_resize(&mut self, viewport: Viewport) {
        self.camera.set_viewport(viewport);
        self.renderer.resize(viewport);
        tracing::debug!(
            width = viewport.width(),
            height = viewport.height(),
            aspect = self.camera.aspect,
            "map view resized"
        );
    }

    /// One animation tick: integrate movement since the previous tick, move
    /// the rig, render.
    pub fn animate_frame(&mut self, now: Instant) -> R::Output {
        let dt = self.clock.tick(now);
        let step = self.kinematics.step(&self.flags, &self.params, dt);
        self.camera.move_right(step.right);
        self.camera.move_forward(step.forward);
        self.renderer.render(&self.scene, &self.camera)
    }

    pub fn camera(&self) -> &FirstPersonCamera {
        &self.camera
    }

    pub fn scene(&self) -> &SceneDescription {
        &self.scene
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn flags(&self) -> &MovementFlags {
        &self.flags
    }

    pub fn velocity(&self) -> Vec3 {
        self.kinematics.velocity
    }

    pub fn direction(&self) -> Vec3 {
        self.kinematics.direction
    }

    pub fn lock_state(&self) -> LockState {
        self.controls.state()
    }

    pub fn overlay(&self) -> &Overlay {
        &self.overlay
    }

    pub fn frame_count(&self) -> u64 {
        self.clock.frames()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skyisle_input::MoveKey;
    use std::time::Duration;

    /// Records the camera position of every rendered frame.
    struct PositionRecorder {
        viewport: Viewport,
        frames: Vec<Vec3>,
    }

    impl PositionRecorder {
        fn new(width: u32, height: u32) -> Self {
            Self {
                viewport: Viewport::new(width, height),
                frames: Vec::new(),
            }
        }
    }

    impl Renderer for PositionRecorder {
        type Output = Vec3;

        fn viewport(&self) -> Viewport {
            self.viewport
        }

        fn resize(&mut self, viewport: Viewport) {
            self.viewport = viewport;
        }

        fn render(&mut self, _scene: &SceneDescription, camera: &FirstPersonCamera) -> Vec3 {
            self.frames.push(camera.position);
            camera.position
        }
    }

    #[derive(Default)]
    struct FakePage {
        button: bool,
        container: bool,
        landing_visible: bool,
        container_visible: bool,
    }

    impl FakePage {
        fn complete() -> Self {
            Self {
                button: true,
                container: true,
                landing_visible: true,
                container_visible: false,
            }
        }
    }

    impl PageHost for FakePage {
        type Renderer = PositionRecorder;

        fn has_explore_button(&self) -> bool {
            self.button
        }

        fn hide_landing(&mut self) {
            self.landing_visible = false;
        }

        fn reveal_map_container(&mut self) -> Option<PositionRecorder> {
            if !self.container {
                return None;
            }
            self.container_visible = true;
            Some(PositionRecorder::new(1600, 900))
        }
    }

    fn view() -> (MapView<PositionRecorder>, Instant) {
        let t0 = Instant::now();
        let view = MapView::init(PositionRecorder::new(800, 600), &ExploreConfig::default(), t0);
        (view, t0)
    }

    fn at(t0: Instant, frame: u32, fps: u32) -> Instant {
        t0 + Duration::from_secs_f64(f64::from(frame) / f64::from(fps))
    }

    #[test]
    fn launch_hides_landing_and_shows_container() {
        let mut page = FakePage::complete();
        crate::page::wire_explore_button(&page).unwrap();
        let view = launch_map_view(&mut page, &ExploreConfig::default(), Instant::now()).unwrap();
        assert!(!page.landing_visible);
        assert!(page.container_visible);
        assert_eq!(view.renderer().viewport(), Viewport::new(1600, 900));
        assert!((view.camera().aspect - 16.0 / 9.0).abs() < 1e-6);
        assert_eq!(view.camera().position, Vec3::new(0.0, 10.0, 0.0));
        assert_eq!(view.scene().meshes.len(), 2);
    }

    #[test]
    fn launch_without_container_fails() {
        let mut page = FakePage {
            button: true,
            landing_visible: true,
            ..FakePage::default()
        };
        let err = launch_map_view(&mut page, &ExploreConfig::default(), Instant::now())
            .err()
            .unwrap();
        assert_eq!(err, ExploreError::MissingMapContainer);
        assert!(!page.container_visible);
    }

    #[test]
    fn missing_explore_button_is_reported() {
        let page = FakePage::default();
        assert_eq!(
            crate::page::wire_explore_button(&page),
            Err(ExploreError::MissingExploreButton)
        );
    }

    #[test]
    fn key_press_sets_exactly_one_flag() {
        let cases = [
            ("KeyW", MoveKey::Forward),
            ("ArrowUp", MoveKey::Forward),
            ("KeyS", MoveKey::Backward),
            ("ArrowDown", MoveKey::Backward),
            ("KeyA", MoveKey::Left),
            ("ArrowLeft", MoveKey::Left),
            ("KeyD", MoveKey::Right),
            ("ArrowRight", MoveKey::Right),
        ];
        for (code, key) in cases {
            let (mut view, _) = view();
            assert!(view.on_key_down(code));
            for other in MoveKey::ALL {
                assert_eq!(view.flags().is_held(other), other == key, "{code}");
            }
            assert!(view.on_key_up(code));
            assert_eq!(*view.flags(), MovementFlags::default());
        }
    }

    #[test]
    fn unmapped_keys_have_no_effect() {
        let (mut view, _) = view();
        view.on_key_down("KeyW");
        let before = *view.flags();
        for code in ["Space", "KeyQ", "Escape", "ShiftLeft", "Enter"] {
            assert!(!view.on_key_down(code));
            assert!(!view.on_key_up(code));
        }
        assert_eq!(*view.flags(), before);
    }

    #[test]
    fn focus_loss_releases_keys() {
        let (mut view, _) = view();
        view.on_key_down("KeyW");
        view.on_key_down("KeyD");
        view.on_focus_lost();
        assert_eq!(*view.flags(), MovementFlags::default());
    }

    #[test]
    fn holding_forward_one_second_at_60fps() {
        let (mut view, t0) = view();
        view.on_key_down("KeyW");
        for frame in 1..=60 {
            view.animate_frame(at(t0, frame, 60));
        }

        let (a, k, dt, n) = (400.0_f64, 10.0_f64, 1.0_f64 / 60.0, 60.0_f64);
        let r = 1.0 - k * dt;
        let expected = (a / k) * (n * dt - r * (1.0 - r.powf(n)) / k);

        let pos = view.camera().position;
        assert!(
            (f64::from(-pos.z) - expected).abs() < 0.05,
            "z={} expected {}",
            pos.z,
            -expected
        );
        assert!(pos.x.abs() < 1e-4);
        assert_eq!(pos.y, 10.0);
        assert_eq!(view.renderer().frames.len(), 60);
        assert_eq!(view.frame_count(), 60);
    }

    #[test]
    fn velocity_decays_after_release() {
        let (mut view, t0) = view();
        view.on_key_down("KeyW");
        view.on_key_down("KeyA");
        for frame in 1..=30 {
            view.animate_frame(at(t0, frame, 60));
        }
        view.on_key_up("KeyW");
        view.on_key_up("KeyA");

        let mut prev = view.velocity().length();
        assert!(prev > 0.0);
        for frame in 31..=240 {
            view.animate_frame(at(t0, frame, 60));
            let speed = view.velocity().length();
            assert!(speed <= prev);
            prev = speed;
        }
        assert!(prev < 1e-3);
    }

    #[test]
    fn direction_is_unit_or_zero() {
        let (mut view, t0) = view();
        let codes = ["KeyW", "KeyS", "KeyA", "KeyD"];
        let mut frame = 0;
        for bits in 0u8..16 {
            for (i, code) in codes.iter().enumerate() {
                if bits & (1 << i) != 0 {
                    view.on_key_down(code);
                } else {
                    view.on_key_up(code);
                }
            }
            frame += 1;
            view.animate_frame(at(t0, frame, 60));
            let len = view.direction().length();
            assert!(len == 0.0 || (len - 1.0).abs() < 1e-6, "bits={bits:04b}");
        }
    }

    #[test]
    fn resize_updates_aspect_and_renderer() {
        let (mut view, _) = view();
        view.on_window_resize(Viewport::new(1024, 256));
        assert_eq!(view.camera().aspect, 4.0);
        assert_eq!(view.renderer().viewport(), Viewport::new(1024, 256));

        view.on_window_resize(Viewport::new(0, 0));
        assert_eq!(view.camera().aspect, 1.0);
        assert_eq!(view.renderer().viewport(), Viewport::new(1, 1));
    }

    #[test]
    fn overlay_follows_pointer_lock() {
        let (mut view, _) = view();
        assert!(view.overlay().is_visible());
        assert_eq!(view.lock_state(), LockState::Unlocked);

        assert_eq!(view.click_overlay(), Some(LockRequest::Lock));
        view.on_pointer_locked();
        assert_eq!(view.lock_state(), LockState::Locked);
        assert!(!view.overlay().is_visible());

        assert_eq!(view.click_overlay(), None);

        view.on_pointer_unlocked();
        assert_eq!(view.lock_state(), LockState::Unlocked);
        assert!(view.overlay().is_visible());
    }

    #[test]
    fn refused_lock_keeps_overlay() {
        let (mut view, _) = view();
        view.click_overlay();
        view.on_pointer_lock_failed("unsupported");
        assert!(view.overlay().is_visible());
        assert_eq!(view.lock_state(), LockState::Unlocked);
    }

    #[test]
    fn mouse_look_requires_lock() {
        let (mut view, _) = view();
        assert!(!view.on_mouse_move(100.0, 0.0));
        assert_eq!(view.camera().yaw, 0.0);

        view.click_overlay();
        view.on_pointer_locked();
        assert!(view.on_mouse_move(100.0, 50.0));
        assert!(view.camera().yaw < 0.0);
        assert!(view.camera().pitch < 0.0);

        assert_eq!(view.request_unlock(), Some(LockRequest::Unlock));
        view.on_pointer_unlocked();
        let yaw = view.camera().yaw;
        view.on_mouse_move(100.0, 0.0);
        assert_eq!(view.camera().yaw, yaw);
    }

    #[test]
    fn forward_follows_look_direction() {
        let (mut view, t0) = view();
        view.click_overlay();
        view.on_pointer_locked();
        // Quarter turn to the right: forward becomes +X.
        let quarter = std::f32::consts::FRAC_PI_2 / view.camera().sensitivity;
        view.on_mouse_move(quarter, 0.0);
        view.on_key_down("ArrowUp");
        for frame in 1..=30 {
            view.animate_frame(at(t0, frame, 60));
        }
        let pos = view.camera().position;
        assert!(pos.x > 5.0);
        assert!(pos.z.abs() < 1e-2);
    }

    #[test]
    fn stalled_frame_is_clamped() {
        let (mut view, t0) = view();
        view.on_key_down("KeyW");
        view.animate_frame(t0 + Duration::from_secs(10));
        // One clamped 0.1 s step: v = -40, moved 4 units.
        let z = view.camera().position.z;
        assert!((z + 4.0).abs() < 1e-3, "z={z}");
    }
}
