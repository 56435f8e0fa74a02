//! Windowed runner: one window, one [`Engine`] over a [`WgpuDevice`].
//!
//! Scene construction lives in a setup closure; per-frame logic lives in the
//! closure it returns. Node update callbacks run either way, so a setup that
//! only adds animated nodes can return `|_, _| {}`.

use std::sync::Arc;

use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::gpu::GpuContext;
use crate::logging::{LoggingConfig, init_logging};
use crate::node::FrameTime;
use crate::scene::Scene;
use crate::wgpu_device::{BASIC_VERTEX_WGSL, WIREFRAME_FRAGMENT_WGSL, WgpuDevice};

/// Configuration for the app window.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Installs an `env_logger` backend before the window opens when set.
    pub logging: Option<LoggingConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Tessera".to_string(),
            width: 800,
            height: 600,
            logging: Some(LoggingConfig::default()),
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn logging(mut self, logging: Option<LoggingConfig>) -> Self {
        self.logging = logging;
        self
    }
}

/// Runs a tessera application with the default configuration.
///
/// # Example
/// ```no_run
/// use tessera::{Mesh, Node, wgpu_device::{BASIC_FRAGMENT_WGSL, BASIC_VERTEX_WGSL}};
///
/// tessera::run(|engine| {
///     let program = engine.compile_program(BASIC_VERTEX_WGSL, BASIC_FRAGMENT_WGSL)?;
///     let cube = engine.add_mesh(Mesh::cuboid(0.5, 0.5, 0.5, 1, 1, 1));
///     engine.add(Node::renderable(cube, program));
///
///     Ok(|_scene: &mut tessera::Scene, _time: &tessera::FrameTime| {})
/// })
/// .unwrap();
/// ```
pub fn run<S, F>(setup: S) -> Result<()>
where
    S: FnOnce(&mut Engine<WgpuDevice>) -> Result<F> + 'static,
    F: FnMut(&mut Scene, &FrameTime) + 'static,
{
    run_with_config(AppConfig::default(), setup)
}

/// Runs a tessera application with a custom configuration.
///
/// Returns once the window is closed. A failing setup closure or a device
/// error that is not a lost frame ends the loop and is returned here.
pub fn run_with_config<S, F>(config: AppConfig, setup: S) -> Result<()>
where
    S: FnOnce(&mut Engine<WgpuDevice>) -> Result<F> + 'static,
    F: FnMut(&mut Scene, &FrameTime) + 'static,
{
    if let Some(logging) = config.logging.clone() {
        init_logging(logging);
    }

    let event_loop = EventLoop::new().map_err(|e| Error::EventLoop(e.to_string()))?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = TesseraApp {
        state: AppState::Pending {
            config,
            setup: Some(Box::new(move |engine| {
                let frame_fn = setup(engine)?;
                Ok(Box::new(frame_fn) as FrameFn)
            })),
        },
        error: None,
    };

    event_loop
        .run_app(&mut app)
        .map_err(|e| Error::EventLoop(e.to_string()))?;

    match app.error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

type FrameFn = Box<dyn FnMut(&mut Scene, &FrameTime)>;
type SetupFn = Box<dyn FnOnce(&mut Engine<WgpuDevice>) -> Result<FrameFn>>;

struct TesseraApp {
    state: AppState,
    error: Option<Error>,
}

enum AppState {
    Pending {
        config: AppConfig,
        setup: Option<SetupFn>,
    },
    Running {
        window: Arc<Window>,
        engine: Engine<WgpuDevice>,
        frame_fn: FrameFn,
    },
    Stopped,
}

impl TesseraApp {
    fn fail(&mut self, event_loop: &ActiveEventLoop, error: Error) {
        log::error!("{error}");
        self.error = Some(error);
        self.state = AppState::Stopped;
        event_loop.exit();
    }
}

/// Opens the window, builds the engine and runs the user's setup.
fn start(event_loop: &ActiveEventLoop, config: &AppConfig, setup: SetupFn) -> Result<AppState> {
    let window_attrs = WindowAttributes::default()
        .with_title(&config.title)
        .with_inner_size(winit::dpi::LogicalSize::new(config.width, config.height));

    let window = Arc::new(
        event_loop
            .create_window(window_attrs)
            .map_err(|e| Error::Device(format!("could not create window: {e}")))?,
    );
    let gpu = GpuContext::new(window.clone())?;
    let mut engine = Engine::new(WgpuDevice::new(gpu));

    let wireframe = engine.compile_program(BASIC_VERTEX_WGSL, WIREFRAME_FRAGMENT_WGSL)?;
    engine.scene_mut().set_wireframe_program(wireframe);

    let frame_fn = setup(&mut engine)?;
    log::info!("scene ready with {} nodes", engine.scene().node_count());

    Ok(AppState::Running {
        window,
        engine,
        frame_fn,
    })
}

impl ApplicationHandler for TesseraApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let AppState::Pending { config, setup } = &mut self.state else {
            return;
        };
        let Some(setup_fn) = setup.take() else {
            return;
        };

        match start(event_loop, config, setup_fn) {
            Ok(running) => self.state = running,
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let AppState::Running {
            window,
            engine,
            frame_fn,
        } = &mut self.state
        else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                engine.device_mut().resize(size.width, size.height);
            }
            WindowEvent::RedrawRequested => {
                let time = engine.tick();
                frame_fn(engine.scene_mut(), &time);

                match engine.frame_at(&time) {
                    Ok(_) => {}
                    // Already logged by the device; the next frame retries.
                    Err(Error::Surface(_)) => {}
                    Err(e) => {
                        self.fail(event_loop, e);
                        return;
                    }
                }

                window.request_redraw();
            }
            _ => {}
        }
    }
}
