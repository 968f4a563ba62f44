//! Window, event loop and the glue between input, scene, renderer and UI

use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use cgmath::{Deg, Vector3};
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalSize},
    event::{DeviceEvent, ElementState, KeyEvent, MouseButton, Touch, TouchPhase, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop, EventLoopProxy},
    keyboard::{KeyCode, PhysicalKey},
    window::{CursorGrabMode, Window, WindowAttributes, WindowId},
};

use crate::{
    config::{Preferences, ViewerConfig},
    error::ViewerError,
    gfx::{
        camera::{CameraManager, CameraOrientation, FirstPersonCamera},
        loader::{self, LoadProgress, ModelData},
        scene::Scene,
        RenderEngine,
    },
    input::{Controls, EscapeAction, InputMode, PointerLockRequest},
    ui::{viewer_panels, LoadStatus, UiManager, UiState},
};

/// Messages posted to the event loop from the loader thread
pub enum ViewerEvent {
    LoadProgress(LoadProgress),
    ModelLoaded {
        path: PathBuf,
        result: Result<ModelData, ViewerError>,
    },
}

pub struct ViewerApp {
    event_loop: Option<EventLoop<ViewerEvent>>,
    app_state: AppState,
}

struct AppState {
    config: ViewerConfig,
    preferences: Preferences,
    proxy: EventLoopProxy<ViewerEvent>,
    window: Option<Arc<Window>>,
    render_engine: Option<RenderEngine>,
    ui_manager: Option<UiManager>,
    ui_state: UiState,
    scene: Scene,
    load_started: bool,
}

impl ViewerApp {
    pub fn new(config: ViewerConfig) -> anyhow::Result<Self> {
        let event_loop = EventLoop::<ViewerEvent>::with_user_event()
            .build()
            .context("Failed to create event loop")?;
        let proxy = event_loop.create_proxy();

        let preferences = match Preferences::load(&config.preferences_path) {
            Ok(preferences) => preferences,
            Err(e) => {
                log::warn!("Ignoring unreadable preferences: {}", e);
                Preferences::default()
            }
        };

        let input_mode = config.controls.input_mode.resolve();
        log::info!("Input mode: {:?}", input_mode);

        let scene = build_scene(&config, &preferences, input_mode);

        Ok(Self {
            event_loop: Some(event_loop),
            app_state: AppState {
                config,
                preferences,
                proxy,
                window: None,
                render_engine: None,
                ui_manager: None,
                ui_state: UiState::default(),
                scene,
                load_started: false,
            },
        })
    }

    /// Runs until the window closes or Escape is pressed without pointer lock
    pub fn run(mut self) -> anyhow::Result<()> {
        let event_loop = self
            .event_loop
            .take()
            .context("Event loop already consumed")?;
        event_loop.set_control_flow(ControlFlow::Poll);

        event_loop
            .run_app(&mut self.app_state)
            .context("Event loop terminated with an error")
    }
}

/// Camera, controls, lights and edge overlay as described by the config
fn build_scene(config: &ViewerConfig, preferences: &Preferences, input_mode: InputMode) -> Scene {
    let aspect = config.window.width as f32 / config.window.height.max(1) as f32;

    let camera_config = config.camera;
    let mut camera = FirstPersonCamera::new(
        Vector3::from(camera_config.position),
        CameraOrientation::new(camera_config.yaw, camera_config.pitch),
        aspect,
    );
    camera.fovy = Deg(camera_config.fov);
    camera.znear = camera_config.near;
    camera.zfar = camera_config.far;

    let controls = Controls::new(
        input_mode,
        config.controls.desktop,
        config.controls.touch,
        preferences.invert_mouse,
    );

    Scene::new(
        CameraManager::new(camera, controls),
        config.lighting.clone(),
        config.edges,
        config.background,
    )
}

fn grab_cursor(window: &Window) -> bool {
    match window
        .set_cursor_grab(CursorGrabMode::Locked)
        .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined))
    {
        Ok(()) => {
            window.set_cursor_visible(false);
            true
        }
        Err(e) => {
            log::warn!("Pointer lock unavailable: {}", e);
            false
        }
    }
}

fn release_cursor(window: &Window) {
    if let Err(e) = window.set_cursor_grab(CursorGrabMode::None) {
        log::warn!("Failed to release cursor: {}", e);
    }
    window.set_cursor_visible(true);
}

impl AppState {
    /// Decodes the configured model on a worker thread
    fn start_model_load(&mut self) {
        if self.load_started {
            return;
        }
        self.load_started = true;

        let path = self.config.model_path();
        log::info!("Loading model from {}", path.display());
        self.ui_state.load_status = LoadStatus::Loading(LoadProgress { loaded: 0, total: 0 });

        let proxy = self.proxy.clone();
        let spawned = std::thread::Builder::new()
            .name("model-loader".into())
            .spawn(move || {
                let mut report = |progress: LoadProgress| {
                    let _ = proxy.send_event(ViewerEvent::LoadProgress(progress));
                };
                let result = loader::load_model(&path, &mut report);
                if proxy
                    .send_event(ViewerEvent::ModelLoaded { path, result })
                    .is_err()
                {
                    log::debug!("Event loop closed before the model finished loading");
                }
            });

        if let Err(e) = spawned {
            log::error!("Failed to start loader thread: {}", e);
            self.ui_state.load_status = LoadStatus::Failed(e.to_string());
        }
    }

    fn save_preferences(&mut self) {
        let Some(desktop) = self.scene.camera_manager.controls.desktop() else {
            return;
        };
        self.preferences.invert_mouse = desktop.invert_mouse;

        if let Err(e) = self.preferences.save(&self.config.preferences_path) {
            log::warn!("Failed to save preferences: {}", e);
        }
    }

    fn handle_escape(&mut self, event_loop: &ActiveEventLoop, window: &Window) {
        let action = match self.scene.camera_manager.controls.desktop_mut() {
            Some(desktop) => desktop.handle_escape(),
            None => EscapeAction::Exit,
        };

        match action {
            EscapeAction::ReleasePointer => release_cursor(window),
            EscapeAction::Exit => event_loop.exit(),
        }
    }

    fn toggle_pointer_lock(&mut self, window: &Window) {
        let Some(desktop) = self.scene.camera_manager.controls.desktop_mut() else {
            return;
        };

        match desktop.toggle_pointer_lock() {
            PointerLockRequest::Lock => {
                if !grab_cursor(window) {
                    desktop.set_pointer_locked(false);
                }
            }
            PointerLockRequest::Release => release_cursor(window),
        }
    }

    /// Stops movement and gives the cursor back when the window loses focus
    fn handle_focus_lost(&mut self, window: &Window) {
        if let Some(desktop) = self.scene.camera_manager.controls.desktop_mut() {
            desktop.release_all_keys();
            if desktop.is_pointer_locked() {
                desktop.set_pointer_locked(false);
                release_cursor(window);
            }
        }
    }

    fn render(&mut self, event_loop: &ActiveEventLoop, window: &Window) {
        if self.render_engine.is_none() {
            return;
        }

        self.scene.update();

        if let Some(ui_manager) = self.ui_manager.as_mut() {
            let ui_state = &mut self.ui_state;
            let scene = &mut self.scene;
            ui_manager.update_logic(window, |ui| viewer_panels(ui, ui_state, scene));
        }

        if std::mem::take(&mut self.ui_state.invert_mouse_changed) {
            self.save_preferences();
        }

        let (Some(render_engine), Some(ui_manager)) =
            (self.render_engine.as_mut(), self.ui_manager.as_mut())
        else {
            return;
        };

        render_engine.update(
            self.scene.camera_manager.camera.uniform,
            &self.scene.lighting,
            &self.scene.edges.style,
        );
        render_engine.prepare_scene(&mut self.scene);

        let result = render_engine.render_frame(
            &self.scene,
            Some(
                |device: &wgpu::Device,
                 queue: &wgpu::Queue,
                 encoder: &mut wgpu::CommandEncoder,
                 view: &wgpu::TextureView| {
                    ui_manager.render_display_only(device, queue, encoder, view);
                },
            ),
        );

        match result {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                render_engine.reconfigure();
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("GPU out of memory, exiting");
                event_loop.exit();
            }
            Err(e) => log::warn!("Dropped frame: {}", e),
        }
    }
}

impl ApplicationHandler<ViewerEvent> for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attributes = WindowAttributes::default()
            .with_title(self.config.window.title.clone())
            .with_inner_size(LogicalSize::new(
                self.config.window.width,
                self.config.window.height,
            ));

        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let PhysicalSize { width, height } = window.inner_size();
        let renderer = match pollster::block_on(RenderEngine::new(window.clone(), width, height)) {
            Ok(renderer) => renderer,
            Err(e) => {
                log::error!("Failed to initialise renderer: {:#}", e);
                event_loop.exit();
                return;
            }
        };

        self.scene
            .camera_manager
            .camera
            .resize_projection(width, height);
        renderer.prepare_scene(&mut self.scene);

        let mut ui_manager = UiManager::new(
            renderer.device(),
            renderer.queue(),
            renderer.surface_format(),
            &window,
        );
        ui_manager.update_display_size(width, height);

        self.ui_manager = Some(ui_manager);
        self.render_engine = Some(renderer);
        self.window = Some(window);

        self.start_model_load();
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: ViewerEvent) {
        match event {
            ViewerEvent::LoadProgress(progress) => {
                log::debug!("Loaded {}/{} meshes", progress.loaded, progress.total);
                self.ui_state.load_status = LoadStatus::Loading(progress);
            }
            ViewerEvent::ModelLoaded { path, result } => match result {
                Ok(model) => {
                    log::info!(
                        "Loaded {}: {} meshes, {} triangles",
                        path.display(),
                        model.meshes.len(),
                        model.triangle_count()
                    );
                    self.scene.set_model(model, Some(path));
                    if let Some(render_engine) = self.render_engine.as_ref() {
                        render_engine.prepare_scene(&mut self.scene);
                    }
                    self.ui_state.load_status = LoadStatus::Loaded;
                }
                Err(e) => {
                    log::error!("Failed to load {}: {}", path.display(), e);
                    self.scene.clear_model();
                    self.scene.model_path = Some(path);
                    self.ui_state.load_status = LoadStatus::Failed(e.to_string());
                }
            },
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(window) = self.window.clone() else {
            return;
        };

        let ui_captured = self
            .ui_manager
            .as_mut()
            .is_some_and(|ui| ui.handle_input(&window, window_id, &event));

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                self.scene
                    .camera_manager
                    .camera
                    .resize_projection(width, height);
                if let Some(render_engine) = self.render_engine.as_mut() {
                    render_engine.resize(width, height);
                }
                if let Some(ui_manager) = self.ui_manager.as_mut() {
                    ui_manager.update_display_size(width, height);
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key_code),
                        state,
                        repeat,
                        ..
                    },
                ..
            } => {
                if key_code == KeyCode::Escape {
                    if state == ElementState::Pressed && !repeat {
                        self.handle_escape(event_loop, &window);
                    }
                    return;
                }

                // Releases always go through so no key stays held
                if ui_captured && state == ElementState::Pressed {
                    return;
                }
                if let Some(desktop) = self.scene.camera_manager.controls.desktop_mut() {
                    desktop.process_keyboard(key_code, state);
                }
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } if !ui_captured => self.toggle_pointer_lock(&window),
            WindowEvent::CursorMoved { position, .. } => {
                let size = window.inner_size();
                if let Some(desktop) = self.scene.camera_manager.controls.desktop_mut() {
                    desktop.process_cursor_moved(position, size);
                }
            }
            WindowEvent::Touch(Touch {
                id,
                phase,
                location,
                ..
            }) => {
                let ending = matches!(phase, TouchPhase::Ended | TouchPhase::Cancelled);
                if !ui_captured || ending {
                    self.scene.camera_manager.process_touch(
                        id,
                        phase,
                        location,
                        window.scale_factor(),
                    );
                }
            }
            WindowEvent::Focused(false) => self.handle_focus_lost(&window),
            WindowEvent::RedrawRequested => self.render(event_loop, &window),
            _ => (),
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: DeviceEvent,
    ) {
        // Only pointer-locked motion reaches the camera, so UI capture is not consulted
        if let DeviceEvent::MouseMotion { delta } = event {
            self.scene.camera_manager.process_mouse_motion(delta);
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = self.window.as_ref() {
            window.request_redraw();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_build_scene_from_config() {
        let mut config = ViewerConfig::default();
        config.camera.fov = 60.0;
        config.camera.pitch = 0.25;
        config.background = 0x101010;

        let preferences = Preferences { invert_mouse: true };
        let scene = build_scene(&config, &preferences, InputMode::Desktop);

        let camera = &scene.camera_manager.camera;
        assert_eq!(camera.position, Vector3::new(-1.23, 23.44, 50.22));
        assert_eq!(camera.fovy, Deg(60.0));
        assert_relative_eq!(camera.orientation.pitch, 0.25);
        assert_relative_eq!(camera.aspect, 1280.0 / 800.0);
        assert_eq!(scene.background, 0x101010);

        let desktop = scene.camera_manager.controls.desktop().unwrap();
        assert!(desktop.invert_mouse);
        assert!(scene.objects.is_empty());
    }

    #[test]
    fn test_build_scene_touch_mode() {
        let scene = build_scene(
            &ViewerConfig::default(),
            &Preferences::default(),
            InputMode::Touch,
        );
        assert_eq!(scene.camera_manager.input_mode(), InputMode::Touch);
        assert!(scene.camera_manager.controls.desktop().is_none());
    }
}
