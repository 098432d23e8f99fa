//! pathview - interactive viewer for a progressive path tracer.
//!
//! Drives the per-frame loop that reconciles camera drags, parameter edits and
//! transform edits against the renderer: keep accumulating, reset the
//! accumulation, or rebuild the renderer.

mod app;
mod cli;
mod controller;
mod render;
mod scene;
mod ui;

use app::AppError;
use clap::Parser;
use cli::CliArgs;
use controller::FrameController;
use render::PreviewRendererFactory;
use scene::{JsonSceneLoader, SceneCatalog};
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(err) => {
            // Usage errors end the process cleanly without opening a window.
            if let Err(print_err) = err.print() {
                log::warn!("Failed to print usage error: {}", print_err);
            }
            return ExitCode::SUCCESS;
        }
    };

    log::info!("pathview starting");
    log::info!("   Press ESC or close window to exit");

    match start(args) {
        Ok(()) => {
            log::info!("Goodbye!");
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("Fatal: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn start(args: CliArgs) -> Result<(), AppError> {
    let (catalog, initial_scene) = SceneCatalog::startup(args.scene, &args.assets)?;
    let controller = FrameController::new(
        PreviewRendererFactory::default().with_tiles_per_frame(args.tiles_per_frame),
        JsonSceneLoader,
        catalog,
        &initial_scene,
    )?
    .with_denoise_interval(args.denoise_interval);

    app::run(controller, args.screenshots)
}
