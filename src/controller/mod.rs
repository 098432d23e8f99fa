//! Per-frame reconciliation of input and edits against the live scene and
//! renderer.

pub mod policy;
pub mod transform_session;

pub use policy::{classify_options, decide, FrameEdits, RendererAction};
pub use transform_session::{GizmoOperation, TransformEditSession, TransformManipulator};

use crate::render::{save_frame, DragMode, FrameBuffer, RenderError, Renderer, RendererFactory, ScreenshotError};
use crate::scene::serialization::{save_scene_to_file, SerializationError};
use crate::scene::{RenderOptions, Scene, SceneCatalog, SceneLoadError, SceneLoader};
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

pub const DEFAULT_MOUSE_SENSITIVITY: f32 = 0.01;
pub const MOUSE_SENSITIVITY_RANGE: RangeInclusive<f32> = 0.01..=1.0;
pub const DEFAULT_DENOISE_INTERVAL: u32 = 20;

#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error("renderer reconstruction failed: {0}")]
    Reconstruct(#[from] RenderError),
    #[error("scene load failed: {0}")]
    SceneLoad(#[from] SceneLoadError),
}

/// Scene change asked for by the UI, serviced at the start of the next frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneRequest {
    Catalog(usize),
    Path(PathBuf),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerDrag {
    pub mode: DragMode,
    pub dx: f32,
    pub dy: f32,
}

/// Per-frame input gathered by the windowing layer.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct FrameInput {
    /// Size of the render viewport in physical pixels, if it was laid out.
    pub viewport: Option<[u32; 2]>,
    /// Drag over the viewport with a camera button held.
    pub drag: Option<PointerDrag>,
    pub dt_seconds: f32,
}

#[derive(Debug)]
pub struct FrameReport {
    pub action: RendererAction,
    /// A requested scene that failed to load; the previous scene stays live.
    pub scene_error: Option<SceneLoadError>,
    /// An automatic denoise pass ran this frame.
    pub denoised: bool,
}

/// Owns the live scene, the renderer handle and the editing session.
pub struct FrameController<F: RendererFactory, L: SceneLoader> {
    factory: F,
    loader: L,
    catalog: SceneCatalog,
    scene: Scene,
    scene_path: PathBuf,
    renderer: F::Renderer,
    options: RenderOptions,
    session: TransformEditSession,
    mouse_sensitivity: f32,
    denoise_interval: u32,
    denoised: Option<FrameBuffer>,
    /// Sample count of the last automatic denoise on the current handle.
    auto_denoised_at: Option<u32>,
    pending_scene: Option<SceneRequest>,
}

impl<F: RendererFactory, L: SceneLoader> FrameController<F, L> {
    /// Loads `initial_scene` and builds the first renderer handle. Both
    /// failures are fatal at startup.
    pub fn new(
        mut factory: F,
        loader: L,
        catalog: SceneCatalog,
        initial_scene: &Path,
    ) -> Result<Self, ControllerError> {
        let mut options = RenderOptions::default();
        let mut scene = loader.load(initial_scene, &mut options)?;
        scene.set_render_options(options.clone());
        let renderer = factory.create(&scene)?;
        let session = TransformEditSession::new(&scene);

        Ok(Self {
            factory,
            loader,
            catalog,
            scene,
            scene_path: initial_scene.to_path_buf(),
            renderer,
            options,
            session,
            mouse_sensitivity: DEFAULT_MOUSE_SENSITIVITY,
            denoise_interval: DEFAULT_DENOISE_INTERVAL,
            denoised: None,
            auto_denoised_at: None,
            pending_scene: None,
        })
    }

    pub fn with_denoise_interval(mut self, interval: u32) -> Self {
        self.denoise_interval = interval;
        self
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Direct scene access for editors; changes must be reported through
    /// [`FrameEdits`] to take effect in the renderer.
    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn scene_path(&self) -> &Path {
        &self.scene_path
    }

    pub fn catalog(&self) -> &SceneCatalog {
        &self.catalog
    }

    pub fn current_catalog_index(&self) -> Option<usize> {
        self.catalog.position(&self.scene_path)
    }

    /// Working options; compared against the scene's applied copy each frame.
    pub fn options_mut(&mut self) -> &mut RenderOptions {
        &mut self.options
    }

    pub fn session(&self) -> &TransformEditSession {
        &self.session
    }

    pub fn set_gizmo_operation(&mut self, operation: GizmoOperation) {
        self.session.set_operation(operation);
    }

    pub fn select_instance(&mut self, index: usize) {
        self.session.select(index, &self.scene);
    }

    /// Applies `manipulator` to the selected instance. Returns true when the
    /// transform actually changed.
    pub fn edit_selected_transform<M>(&mut self, manipulator: &mut M) -> bool
    where
        M: TransformManipulator + ?Sized,
    {
        self.session.edit(&mut self.scene, manipulator)
    }

    pub fn mouse_sensitivity(&self) -> f32 {
        self.mouse_sensitivity
    }

    pub fn set_mouse_sensitivity(&mut self, sensitivity: f32) {
        self.mouse_sensitivity = sensitivity.clamp(*MOUSE_SENSITIVITY_RANGE.start(), *MOUSE_SENSITIVITY_RANGE.end());
    }

    pub fn request_scene(&mut self, request: SceneRequest) {
        self.pending_scene = Some(request);
    }

    pub fn sample_count(&self) -> u32 {
        self.renderer.sample_count()
    }

    pub fn presentable_image(&self) -> &FrameBuffer {
        self.renderer.presentable_image()
    }

    pub fn denoised_image(&self) -> Option<&FrameBuffer> {
        self.denoised.as_ref()
    }

    pub fn denoise_now(&mut self) {
        self.denoised = Some(self.renderer.denoise());
    }

    pub fn save_screenshot(&self, dir: &Path) -> Result<PathBuf, ScreenshotError> {
        save_frame(&self.renderer.output_buffer(), self.renderer.sample_count(), dir)
    }

    pub fn save_scene(&self, path: &Path) -> Result<(), SerializationError> {
        save_scene_to_file(&self.scene, path)?;
        log::info!("Saved scene to {}", path.display());
        Ok(())
    }

    /// One iteration of the render loop.
    ///
    /// `edits` carries what the UI changed this frame; the camera drag,
    /// viewport size, pending scene request and option diff are folded in
    /// here before the policy picks a single action.
    pub fn run_frame(
        &mut self,
        input: FrameInput,
        mut edits: FrameEdits,
    ) -> Result<FrameReport, ControllerError> {
        self.scene.camera_mut().is_moving = false;

        let mut scene_error = None;
        if let Some(request) = self.pending_scene.take() {
            match self.swap_scene(&request) {
                Ok(swapped) => edits.scene_swapped |= swapped,
                Err(err) => {
                    log::warn!("Keeping current scene: {}", err);
                    scene_error = Some(err);
                }
            }
        }

        if let Some([width, height]) = input.viewport {
            let size = [width.max(1), height.max(1)];
            if size != self.renderer.resolution() {
                self.options.resolution = size;
                edits.viewport_resized = true;
            }
        }

        if let Some(drag) = input.drag {
            self.scene
                .camera_mut()
                .drag(drag.mode, drag.dx, drag.dy, self.mouse_sensitivity);
        }
        edits.camera_moved |= self.scene.camera().is_moving;

        edits.record_options(classify_options(self.scene.render_options(), &self.options));

        let action = decide(&edits);
        self.scene.set_render_options(self.options.clone());
        match action {
            RendererAction::Reconstruct => {
                let [width, height] = self.options.resolution;
                log::info!("Reconstructing renderer at {}x{}", width, height);
                self.renderer = self.factory.create(&self.scene)?;
                self.denoised = None;
                self.auto_denoised_at = None;
            }
            RendererAction::ResetAccumulation => {
                log::debug!("Resetting accumulation");
                self.renderer.reset_accumulation(&self.scene);
                self.auto_denoised_at = None;
            }
            RendererAction::NoOp => {}
        }

        self.renderer.update(input.dt_seconds);
        self.renderer.render();

        let samples = self.renderer.sample_count();
        let denoised = self.options.enable_denoiser
            && self.denoise_interval > 0
            && samples > 0
            && samples % self.denoise_interval == 0
            && self.auto_denoised_at != Some(samples);
        if denoised {
            self.denoise_now();
            self.auto_denoised_at = Some(samples);
        }

        Ok(FrameReport {
            action,
            scene_error,
            denoised,
        })
    }

    /// Replaces the live scene. `Ok(false)` when the request named nothing.
    fn swap_scene(&mut self, request: &SceneRequest) -> Result<bool, SceneLoadError> {
        let path = match request {
            SceneRequest::Catalog(index) => match self.catalog.get(*index) {
                Some(path) => path.to_path_buf(),
                None => {
                    log::warn!("Ignoring catalog index {} of {}", index, self.catalog.len());
                    return Ok(false);
                }
            },
            SceneRequest::Path(path) => path.clone(),
        };

        // Loaders may overwrite options; only keep them if the load succeeds.
        let mut options = self.options.clone();
        let scene = self.loader.load(&path, &mut options)?;
        self.options = options;
        self.scene = scene;
        self.scene.set_render_options(self.options.clone());
        self.scene_path = path;
        self.session.on_scene_swapped(&self.scene);
        Ok(true)
    }
}
