//! Turntable Viewer - main entry point
//!
//! Opens a window, loads the viewer settings and drives a [`Viewer`] from
//! winit events.
//!
//! Controls:
//! - drag with the left button to orbit, scroll to zoom, click a part to animate it
//! - `1`-`4` select the default, luxo, moderno and vintage presets
//! - `Q` `W` `E` `R` cycle the base, feet, needle and vinyl-base materials
//! - `Backspace` clears every custom material, `M` toggles sound

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use turntable_viewer::materials::PRESET_ORDER;
use turntable_viewer::raycast::PointerEvent;
use turntable_viewer::telemetry::{init_logging, LogConfig};
use turntable_viewer::{
    FileAssetLoader, LayoutBox, PartKey, Viewer, ViewerSettings, WgpuSurface,
};
use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalPosition};
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowAttributes, WindowId};

const WINDOW_TITLE: &str = "Turntable Viewer";

/// Wheel pixels per zoom step on touchpads
const PIXELS_PER_ZOOM_STEP: f32 = 50.0;

struct Running {
    window: Arc<Window>,
    viewer: Viewer<WgpuSurface>,
}

struct TurntableApp {
    settings: ViewerSettings,
    runtime: tokio::runtime::Runtime,
    running: Option<Running>,
    cursor: PhysicalPosition<f64>,
    dragging: bool,
    /// Index into each part's option menu
    option_cursor: BTreeMap<PartKey, usize>,
}

impl TurntableApp {
    fn new(settings: ViewerSettings, runtime: tokio::runtime::Runtime) -> Self {
        Self {
            settings,
            runtime,
            running: None,
            cursor: PhysicalPosition::new(0.0, 0.0),
            dragging: false,
            option_cursor: BTreeMap::new(),
        }
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) {
        let window_attributes = WindowAttributes::default()
            .with_title(WINDOW_TITLE)
            .with_inner_size(LogicalSize::new(
                self.settings.window_width,
                self.settings.window_height,
            ));
        let window = Arc::new(
            event_loop
                .create_window(window_attributes)
                .expect("Failed to create window"),
        );

        let surface = match pollster::block_on(WgpuSurface::new(window.clone())) {
            Ok(surface) => surface.with_exposure(self.settings.exposure),
            Err(e) => {
                tracing::error!("Failed to initialize GPU: {}", e);
                event_loop.exit();
                return;
            }
        };

        let size = window.inner_size();
        let loader = Arc::new(FileAssetLoader::new(&self.settings.texture_root));
        let viewer = Viewer::new(
            Some(surface),
            LayoutBox::new(size.width, size.height),
            self.settings.viewer_options(),
            loader,
            self.runtime.handle(),
        );
        let mut viewer = match viewer {
            Ok(viewer) => viewer,
            Err(e) => {
                tracing::error!("Failed to create viewer: {}", e);
                event_loop.exit();
                return;
            }
        };

        let title_window = window.clone();
        viewer.set_audio_state_handler(move |muted| {
            let title = if muted {
                format!("{} (muted)", WINDOW_TITLE)
            } else {
                WINDOW_TITLE.to_string()
            };
            title_window.set_title(&title);
        });

        tracing::info!("Window created: {}x{}", size.width, size.height);
        self.running = Some(Running { window, viewer });
    }

    fn handle_key(&mut self, key: &Key) {
        let Some(running) = self.running.as_mut() else {
            return;
        };
        let viewer = &mut running.viewer;
        match key {
            Key::Named(NamedKey::Backspace) => viewer.clear_all_custom_materials(),
            Key::Character(c) => match c.as_str() {
                "1" | "2" | "3" | "4" => {
                    let index = c.as_str().parse::<usize>().unwrap_or(1) - 1;
                    if let Some(preset) = PRESET_ORDER.get(index) {
                        viewer.set_preset(preset);
                        self.option_cursor.clear();
                    }
                }
                "q" | "Q" => cycle_part(viewer, &mut self.option_cursor, PartKey::Base),
                "w" | "W" => cycle_part(viewer, &mut self.option_cursor, PartKey::Feet),
                "e" | "E" => cycle_part(viewer, &mut self.option_cursor, PartKey::Needle),
                "r" | "R" => cycle_part(viewer, &mut self.option_cursor, PartKey::VinylBase),
                "m" | "M" => {
                    viewer.toggle_audio_muted();
                }
                _ => {}
            },
            _ => {}
        }
    }
}

/// Apply the part's next menu option
fn cycle_part(viewer: &mut Viewer<WgpuSurface>, cursor: &mut BTreeMap<PartKey, usize>, part: PartKey) {
    let count = viewer.library().custom_options(part).len();
    if count == 0 {
        return;
    }
    let index = cursor.entry(part).or_insert(0);
    *index = (*index + 1) % count;
    let library = viewer.library();
    let Some(option) = library.custom_options(part).get(*index) else {
        return;
    };
    tracing::info!("{}: {}", part.label(), option.label);
    let id = option.id;
    match option.to_override(library) {
        Some(choice) => viewer.set_custom_material(part, choice),
        None => tracing::warn!("Option {} has no library material", id),
    }
}

impl ApplicationHandler for TurntableApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.running.is_none() {
            tracing::info!("Creating window...");
            self.start(event_loop);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                if let Some(mut running) = self.running.take() {
                    running.viewer.dispose();
                }
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(running) = self.running.as_mut() {
                    running.viewer.resize(LayoutBox::new(size.width, size.height));
                }
            }
            WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Pressed => {
                self.handle_key(&event.logical_key);
            }
            WindowEvent::CursorMoved { position, .. } => {
                let dx = (position.x - self.cursor.x) as f32;
                let dy = (position.y - self.cursor.y) as f32;
                self.cursor = position;
                if self.dragging {
                    if let Some(running) = self.running.as_mut() {
                        running.viewer.orbit_drag(dx, dy);
                    }
                }
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                self.dragging = state == ElementState::Pressed;
                if self.dragging {
                    if let Some(running) = self.running.as_mut() {
                        let event = PointerEvent::primary(self.cursor.x as f32, self.cursor.y as f32);
                        if let Some(dispatch) = running.viewer.pointer_down(&event) {
                            tracing::debug!("Click dispatched: {:?}", dispatch);
                        }
                    }
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let steps = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32 / PIXELS_PER_ZOOM_STEP,
                };
                if let Some(running) = self.running.as_mut() {
                    running.viewer.zoom(steps);
                }
            }
            WindowEvent::RedrawRequested => {
                if let Some(running) = self.running.as_mut() {
                    running.viewer.frame_now();
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        // Damping and clips need continuous frames
        if let Some(running) = self.running.as_ref() {
            if !running.viewer.is_disposed() {
                running.window.request_redraw();
            }
        }
        event_loop.set_control_flow(ControlFlow::Wait);
    }
}

fn main() {
    let log_config = LogConfig::default();
    let _log_guard = match init_logging(&log_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            None
        }
    };

    tracing::info!("Turntable Viewer v{}", env!("CARGO_PKG_VERSION"));

    let settings = match std::env::args().nth(1) {
        Some(path) => match ViewerSettings::load_from_file(Path::new(&path)) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!("Failed to load settings from {}: {}", path, e);
                ViewerSettings::default()
            }
        },
        None => ViewerSettings::load_or_default(),
    };
    tracing::info!(
        "Model {} with preset {}",
        settings.model_path,
        settings.initial_preset
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to create tokio runtime");

    let event_loop = EventLoop::new().expect("Failed to create event loop");
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = TurntableApp::new(settings, runtime);
    event_loop.run_app(&mut app).expect("Event loop error");
}
