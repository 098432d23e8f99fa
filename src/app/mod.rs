mod egui_host;
mod present;
mod timing;

use crate::controller::{ControllerError, FrameController, FrameInput, RendererAction, SceneRequest};
use crate::render::RendererFactory;
use crate::scene::catalog::{CatalogError, SCENE_EXTENSION};
use crate::scene::SceneLoader;
use crate::ui::{UiCommand, UiFrame, UiState};
use egui_host::EguiHost;
use present::PresentSurface;
use timing::FrameTiming;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowAttributes, WindowId};

const WINDOW_TITLE: &str = "pathview";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Controller(#[from] ControllerError),
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),
    #[error("no suitable GPU adapter found")]
    NoAdapter,
    #[error("failed to create GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
    #[error("surface reports no supported formats")]
    UnsupportedSurface,
}

pub struct App<F: RendererFactory, L: SceneLoader> {
    window: Option<Arc<Window>>,
    egui: Option<EguiHost>,
    surface: Option<PresentSurface>,
    controller: FrameController<F, L>,
    ui: UiState,
    timing: FrameTiming,
    screenshot_dir: PathBuf,
    fatal: Option<AppError>,
}

impl<F: RendererFactory, L: SceneLoader> App<F, L> {
    fn new(controller: FrameController<F, L>, screenshot_dir: PathBuf) -> Self {
        Self {
            window: None,
            egui: None,
            surface: None,
            controller,
            ui: UiState::new(),
            timing: FrameTiming::new(WINDOW_TITLE.to_string()),
            screenshot_dir,
            fatal: None,
        }
    }

    fn init_window(&mut self, event_loop: &ActiveEventLoop) -> Result<(), AppError> {
        let window_attrs = WindowAttributes::default()
            .with_title(WINDOW_TITLE)
            .with_inner_size(PhysicalSize::new(1600u32, 900u32))
            .with_resizable(true);
        let window = Arc::new(event_loop.create_window(window_attrs)?);
        log::info!(
            "Window created: {}x{}",
            window.inner_size().width,
            window.inner_size().height
        );

        self.surface = Some(PresentSurface::new(window.clone())?);
        self.egui = Some(EguiHost::new(&window));
        self.window = Some(window);
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: AppError) {
        log::error!("{}", err);
        self.fatal = Some(err);
        event_loop.exit();
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(window) = self.window.clone() else {
            return;
        };
        self.timing
            .update(Some(&window), Instant::now(), self.controller.sample_count());

        let Some(egui) = self.egui.as_mut() else {
            return;
        };
        let ui = &mut self.ui;
        let controller = &mut self.controller;
        let (output, passes) = egui.run_ui(&window, |ctx| ui.show(ctx, controller));
        let frame = passes.into_iter().reduce(UiFrame::merge).unwrap_or_default();

        let input = FrameInput {
            viewport: frame.viewport,
            drag: frame.drag,
            dt_seconds: self.timing.frame_dt,
        };
        match self.controller.run_frame(input, frame.edits) {
            Ok(report) => {
                if report.action != RendererAction::NoOp {
                    log::debug!("Frame action: {:?}", report.action);
                }
                if let Some(err) = report.scene_error {
                    self.ui.set_status(format!("Failed to load scene: {err}"));
                }
                if report.denoised {
                    self.ui.open_denoiser();
                }
            }
            Err(err) => {
                self.fail(event_loop, err.into());
                return;
            }
        }

        for command in frame.commands {
            self.handle_command(command);
        }

        if let Some(surface) = self.surface.as_mut() {
            surface.present(output);
        }
    }

    fn handle_command(&mut self, command: UiCommand) {
        match command {
            UiCommand::Screenshot => match self.controller.save_screenshot(&self.screenshot_dir) {
                Ok(path) => self.ui.set_status(format!("Saved {}", path.display())),
                Err(err) => {
                    log::warn!("Screenshot failed: {}", err);
                    self.ui.set_status(format!("Screenshot failed: {err}"));
                }
            },
            UiCommand::Denoise => {
                self.controller.denoise_now();
                self.ui.open_denoiser();
            }
            UiCommand::OpenScene => {
                if let Some(path) = rfd::FileDialog::new()
                    .add_filter("Scene", &[SCENE_EXTENSION])
                    .pick_file()
                {
                    self.controller.request_scene(SceneRequest::Path(path));
                }
            }
            UiCommand::SaveScene => {
                let Some(path) = rfd::FileDialog::new()
                    .add_filter("Scene", &[SCENE_EXTENSION])
                    .set_file_name(format!("scene.{SCENE_EXTENSION}"))
                    .save_file()
                else {
                    return;
                };
                match self.controller.save_scene(&path) {
                    Ok(()) => self.ui.set_status(format!("Saved {}", path.display())),
                    Err(err) => {
                        log::warn!("Failed to save scene: {}", err);
                        self.ui.set_status(format!("Failed to save scene: {err}"));
                    }
                }
            }
        }
    }
}

impl<F: RendererFactory, L: SceneLoader> ApplicationHandler for App<F, L> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(err) = self.init_window(event_loop) {
            self.fail(event_loop, err);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let (Some(window), Some(egui)) = (self.window.as_ref(), self.egui.as_mut()) {
            if !matches!(event, WindowEvent::RedrawRequested) && egui.on_window_event(window, &event) {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, shutting down...");
                event_loop.exit();
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed
                    && event.physical_key == PhysicalKey::Code(KeyCode::Escape)
                {
                    log::info!("Escape pressed, shutting down...");
                    event_loop.exit();
                }
            }
            WindowEvent::Resized(new_size) => {
                log::debug!("Window resized to {}x{}", new_size.width, new_size.height);
                if let Some(surface) = self.surface.as_mut() {
                    surface.resize(new_size.width, new_size.height);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        // Progressive rendering: keep producing frames.
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

/// Runs the window until it is closed. A fatal error raised inside the loop
/// is returned after the loop exits.
pub fn run<F, L>(controller: FrameController<F, L>, screenshot_dir: PathBuf) -> Result<(), AppError>
where
    F: RendererFactory,
    L: SceneLoader,
{
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(controller, screenshot_dir);
    event_loop.run_app(&mut app)?;

    match app.fatal.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
