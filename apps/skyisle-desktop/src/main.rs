use anyhow::{Context, Result};
use clap::Parser;
use egui::Context as EguiContext;
use skyisle_common::{Color, Viewport};
use skyisle_explore::{ExploreConfig, MapView, PageHost, launch_map_view, wire_explore_button};
use skyisle_input::LockRequest;
use skyisle_render_wgpu::SurfaceRenderer;
use skyisle_scene::Renderer;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{DeviceEvent, ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{CursorGrabMode, Window, WindowId};

const LANDING_BACKGROUND: Color = Color::from_hex(0x1B1F2A);

#[derive(Parser)]
#[command(name = "skyisle-desktop", about = "Explore the floating island")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// YAML file with movement, camera and key binding overrides
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Skip the landing page and start exploring immediately
    #[arg(long)]
    explore: bool,

    /// Initial window width in pixels
    #[arg(long, default_value = "1280")]
    width: u32,

    /// Initial window height in pixels
    #[arg(long, default_value = "720")]
    height: u32,
}

/// The window as a page: a landing panel drawn by egui, and a map container
/// that is the window surface itself.
struct DesktopPage {
    landing_visible: bool,
    gpu: Option<SurfaceRenderer>,
}

impl PageHost for DesktopPage {
    type Renderer = SurfaceRenderer;

    fn has_explore_button(&self) -> bool {
        // The landing panel always draws one.
        true
    }

    fn hide_landing(&mut self) {
        self.landing_visible = false;
    }

    fn reveal_map_container(&mut self) -> Option<SurfaceRenderer> {
        self.gpu.take()
    }
}

/// Clicks collected while drawing the UI, handled after the frame.
#[derive(Default)]
struct UiEvents {
    explore_clicked: bool,
    overlay_clicked: bool,
}

struct GpuApp {
    config: ExploreConfig,
    explore_on_start: bool,
    initial_size: PhysicalSize<u32>,
    window: Option<Arc<Window>>,
    page: DesktopPage,
    map_view: Option<MapView<SurfaceRenderer>>,
    egui_ctx: EguiContext,
    egui_winit: Option<egui_winit::State>,
    egui_renderer: Option<egui_wgpu::Renderer>,
}

impl GpuApp {
    fn new(config: ExploreConfig, explore_on_start: bool, initial_size: PhysicalSize<u32>) -> Self {
        Self {
            config,
            explore_on_start,
            initial_size,
            window: None,
            page: DesktopPage {
                landing_visible: true,
                gpu: None,
            },
            map_view: None,
            egui_ctx: EguiContext::default(),
            egui_winit: None,
            egui_renderer: None,
        }
    }

    fn init_window(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title("Sky Isle")
            .with_inner_size(self.initial_size);
        let window = Arc::new(event_loop.create_window(attrs).context("create window")?);

        let size = window.inner_size();
        let gpu = SurfaceRenderer::create(window.clone(), Viewport::new(size.width, size.height))
            .context("initialize GPU")?;

        let egui_winit = egui_winit::State::new(
            self.egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(gpu.device(), gpu.format(), None, 1, false);

        self.page.gpu = Some(gpu);
        self.window = Some(window);
        self.egui_winit = Some(egui_winit);
        self.egui_renderer = Some(egui_renderer);
        Ok(())
    }

    fn gpu(&self) -> Option<&SurfaceRenderer> {
        match &self.map_view {
            Some(view) => Some(view.renderer()),
            None => self.page.gpu.as_ref(),
        }
    }

    fn launch(&mut self) {
        if self.map_view.is_some() {
            return;
        }
        match launch_map_view(&mut self.page, &self.config, Instant::now()) {
            Ok(view) => self.map_view = Some(view),
            Err(e) => tracing::error!("cannot launch map view: {e}"),
        }
    }

    fn redraw(&mut self) {
        let Some(window) = self.window.clone() else {
            return;
        };

        let frame = match &mut self.map_view {
            Some(view) => view.animate_frame(Instant::now()),
            None => match &self.page.gpu {
                Some(gpu) => gpu.clear_frame(LANDING_BACKGROUND),
                None => return,
            },
        };
        let frame = match frame {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                if let Some(gpu) = self.gpu() {
                    gpu.reconfigure();
                }
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return;
            }
        };

        let events = self.paint_ui(&window, &frame);
        frame.present();
        self.handle_ui_events(&window, events);
        window.request_redraw();
    }

    /// Draw the landing panel or the lock overlay on top of `frame`.
    fn paint_ui(&mut self, window: &Window, frame: &wgpu::SurfaceTexture) -> UiEvents {
        let mut events = UiEvents::default();
        let (Some(egui_winit), Some(egui_renderer)) =
            (self.egui_winit.as_mut(), self.egui_renderer.as_mut())
        else {
            return events;
        };
        let gpu = match (&self.map_view, &self.page.gpu) {
            (Some(view), _) => view.renderer(),
            (None, Some(gpu)) => gpu,
            (None, None) => return events,
        };

        let landing = self.page.landing_visible;
        let overlay = self
            .map_view
            .as_ref()
            .map(|view| view.overlay())
            .filter(|overlay| overlay.is_visible())
            .map(|overlay| overlay.instructions());

        let raw_input = egui_winit.take_egui_input(window);
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            if landing {
                draw_landing(ctx, &mut events);
            } else if let Some(instructions) = overlay {
                draw_overlay(ctx, instructions, &mut events);
            }
        });
        egui_winit.handle_platform_output(window, full_output.platform_output);

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);
        let viewport = gpu.viewport();
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [viewport.width(), viewport.height()],
            pixels_per_point: full_output.pixels_per_point,
        };

        let (device, queue) = (gpu.device(), gpu.queue());
        for (id, image_delta) in &full_output.textures_delta.set {
            egui_renderer.update_texture(device, queue, *id, image_delta);
        }
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("egui_encoder"),
        });
        egui_renderer.update_buffers(device, queue, &mut encoder, &paint_jobs, &screen_descriptor);
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            egui_renderer.render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            egui_renderer.free_texture(id);
        }

        events
    }

    fn handle_ui_events(&mut self, window: &Window, events: UiEvents) {
        if events.explore_clicked {
            tracing::info!("explore button clicked");
            self.launch();
        }
        if events.overlay_clicked {
            if let Some(view) = &mut self.map_view {
                if let Some(request) = view.click_overlay() {
                    apply_lock_request(window, view, request);
                }
            }
        }
    }

    fn handle_key(&mut self, key: KeyCode, pressed: bool) {
        let (Some(view), Some(window)) = (&mut self.map_view, &self.window) else {
            return;
        };
        if key == KeyCode::Escape {
            if pressed {
                if let Some(request) = view.request_unlock() {
                    apply_lock_request(window, view, request);
                }
            }
            return;
        }
        let Some(code) = key_code_name(key) else {
            return;
        };
        if pressed {
            view.on_key_down(code);
        } else {
            view.on_key_up(code);
        }
    }

    fn handle_resize(&mut self, size: PhysicalSize<u32>) {
        let viewport = Viewport::new(size.width, size.height);
        if let Some(view) = &mut self.map_view {
            view.on_window_resize(viewport);
        } else if let Some(gpu) = &mut self.page.gpu {
            gpu.resize(viewport);
        }
    }

    fn handle_focus_lost(&mut self) {
        let (Some(view), Some(window)) = (&mut self.map_view, &self.window) else {
            return;
        };
        view.on_focus_lost();
        if let Some(request) = view.request_unlock() {
            apply_lock_request(window, view, request);
        }
    }
}

/// Physical key name as used by key bindings (`KeyW`, `ArrowUp`, ...).
/// Keys without a name here cannot be bound.
fn key_code_name(key: KeyCode) -> Option<&'static str> {
    Some(match key {
        KeyCode::KeyA => "KeyA",
        KeyCode::KeyB => "KeyB",
        KeyCode::KeyC => "KeyC",
        KeyCode::KeyD => "KeyD",
        KeyCode::KeyE => "KeyE",
        KeyCode::KeyF => "KeyF",
        KeyCode::KeyG => "KeyG",
        KeyCode::KeyH => "KeyH",
        KeyCode::KeyI => "KeyI",
        KeyCode::KeyJ => "KeyJ",
        KeyCode::KeyK => "KeyK",
        KeyCode::KeyL => "KeyL",
        KeyCode::KeyM => "KeyM",
        KeyCode::KeyN => "KeyN",
        KeyCode::KeyO => "KeyO",
        KeyCode::KeyP => "KeyP",
        KeyCode::KeyQ => "KeyQ",
        KeyCode::KeyR => "KeyR",
        KeyCode::KeyS => "KeyS",
        KeyCode::KeyT => "KeyT",
        KeyCode::KeyU => "KeyU",
        KeyCode::KeyV => "KeyV",
        KeyCode::KeyW => "KeyW",
        KeyCode::KeyX => "KeyX",
        KeyCode::KeyY => "KeyY",
        KeyCode::KeyZ => "KeyZ",
        KeyCode::Digit0 => "Digit0",
        KeyCode::Digit1 => "Digit1",
        KeyCode::Digit2 => "Digit2",
        KeyCode::Digit3 => "Digit3",
        KeyCode::Digit4 => "Digit4",
        KeyCode::Digit5 => "Digit5",
        KeyCode::Digit6 => "Digit6",
        KeyCode::Digit7 => "Digit7",
        KeyCode::Digit8 => "Digit8",
        KeyCode::Digit9 => "Digit9",
        KeyCode::ArrowUp => "ArrowUp",
        KeyCode::ArrowDown => "ArrowDown",
        KeyCode::ArrowLeft => "ArrowLeft",
        KeyCode::ArrowRight => "ArrowRight",
        KeyCode::Space => "Space",
        KeyCode::ShiftLeft => "ShiftLeft",
        KeyCode::ShiftRight => "ShiftRight",
        KeyCode::ControlLeft => "ControlLeft",
        KeyCode::ControlRight => "ControlRight",
        KeyCode::AltLeft => "AltLeft",
        KeyCode::AltRight => "AltRight",
        KeyCode::Enter => "Enter",
        KeyCode::Tab => "Tab",
        KeyCode::Backspace => "Backspace",
        KeyCode::Home => "Home",
        KeyCode::End => "End",
        KeyCode::PageUp => "PageUp",
        KeyCode::PageDown => "PageDown",
        KeyCode::Numpad0 => "Numpad0",
        KeyCode::Numpad1 => "Numpad1",
        KeyCode::Numpad2 => "Numpad2",
        KeyCode::Numpad3 => "Numpad3",
        KeyCode::Numpad4 => "Numpad4",
        KeyCode::Numpad5 => "Numpad5",
        KeyCode::Numpad6 => "Numpad6",
        KeyCode::Numpad7 => "Numpad7",
        KeyCode::Numpad8 => "Numpad8",
        KeyCode::Numpad9 => "Numpad9",
        _ => return None,
    })
}

/// Carry out a pointer-lock request on the window and report the outcome.
fn apply_lock_request(window: &Window, view: &mut MapView<SurfaceRenderer>, request: LockRequest) {
    match request {
        LockRequest::Lock => {
            let grabbed = window
                .set_cursor_grab(CursorGrabMode::Locked)
                .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
            match grabbed {
                Ok(()) => {
                    window.set_cursor_visible(false);
                    view.on_pointer_locked();
                }
                Err(e) => view.on_pointer_lock_failed(&e.to_string()),
            }
        }
        LockRequest::Unlock => {
            if let Err(e) = window.set_cursor_grab(CursorGrabMode::None) {
                tracing::warn!("failed to release cursor: {e}");
            }
            window.set_cursor_visible(true);
            view.on_pointer_unlocked();
        }
    }
}

fn draw_landing(ctx: &EguiContext, events: &mut UiEvents) {
    egui::CentralPanel::default().show(ctx, |ui| {
        ui.vertical_centered(|ui| {
            ui.add_space(ui.available_height() * 0.3);
            ui.heading("Sky Isle");
            ui.label("A small island floating above the sea.");
            ui.add_space(16.0);
            if ui.button("Explore").clicked() {
                events.explore_clicked = true;
            }
        });
    });
}

fn draw_overlay(ctx: &EguiContext, instructions: &str, events: &mut UiEvents) {
    let rect = ctx.screen_rect();
    egui::Area::new(egui::Id::new("blocker"))
        .fixed_pos(rect.min)
        .order(egui::Order::Foreground)
        .show(ctx, |ui| {
            let response = ui.allocate_rect(rect, egui::Sense::click());
            let alpha = (skyisle_explore::overlay::BACKDROP_ALPHA * 255.0) as u8;
            ui.painter()
                .rect_filled(rect, 0.0, egui::Color32::from_black_alpha(alpha));
            ui.painter().text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                instructions,
                egui::FontId::proportional(24.0),
                egui::Color32::WHITE,
            );
            if response.clicked() {
                events.overlay_clicked = true;
            }
        });
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.init_window(event_loop) {
            tracing::error!("{e:#}");
            event_loop.exit();
            return;
        }
        if wire_explore_button(&self.page).is_ok() && self.explore_on_start {
            self.launch();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let (Some(egui_winit), Some(window)) = (&mut self.egui_winit, &self.window) {
            let response = egui_winit.on_window_event(window, &event);
            if response.consumed {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                self.handle_resize(new_size);
            }
            WindowEvent::Focused(false) => {
                self.handle_focus_lost();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: key_state,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                self.handle_key(key, key_state == ElementState::Pressed);
            }
            WindowEvent::RedrawRequested => {
                self.redraw();
            }
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta } = event {
            if let Some(view) = &mut self.map_view {
                view.on_mouse_move(delta.0 as f32, delta.1 as f32);
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    tracing::info!("skyisle-desktop starting");

    let config = match &cli.config {
        Some(path) => ExploreConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ExploreConfig::default(),
    };

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(
        config,
        cli.explore,
        PhysicalSize::new(cli.width.max(1), cli.height.max(1)),
    );
    event_loop.run_app(&mut app)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_names_match_default_bindings() {
        let bindings = skyisle_input::KeyBindings::default();
        for key in [
            KeyCode::KeyW,
            KeyCode::KeyA,
            KeyCode::KeyS,
            KeyCode::KeyD,
            KeyCode::ArrowUp,
            KeyCode::ArrowDown,
            KeyCode::ArrowLeft,
            KeyCode::ArrowRight,
        ] {
            let name = key_code_name(key).unwrap();
            assert!(bindings.lookup(name).is_some(), "{key:?}");
        }
        assert_eq!(key_code_name(KeyCode::Space), Some("Space"));
        assert!(bindings.lookup("Space").is_none());
    }

    #[test]
    fn key_names_follow_physical_codes() {
        assert_eq!(key_code_name(KeyCode::KeyQ), Some("KeyQ"));
        assert_eq!(key_code_name(KeyCode::Digit7), Some("Digit7"));
        assert_eq!(key_code_name(KeyCode::ShiftLeft), Some("ShiftLeft"));
        assert_eq!(key_code_name(KeyCode::Escape), None);
        assert_eq!(key_code_name(KeyCode::F1), None);
    }

    #[test]
    fn cli_defaults() {
        let cli = Cli::parse_from(["skyisle-desktop"]);
        assert!(!cli.explore);
        assert_eq!((cli.width, cli.height), (1280, 720));
        assert!(cli.config.is_none());
    }

    #[test]
    fn page_without_gpu_has_no_container() {
        let mut page = DesktopPage {
            landing_visible: true,
            gpu: None,
        };
        assert!(page.has_explore_button());
        assert!(page.reveal_map_container().is_none());
        page.hide_landing();
        assert!(!page.landing_visible);
    }
}
