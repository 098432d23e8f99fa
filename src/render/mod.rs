mod camera;
pub mod preview;
pub mod screenshot;

pub use camera::{Camera, DragMode};
pub use preview::PreviewRendererFactory;
pub use screenshot::{save_frame, ScreenshotError};

use crate::scene::Scene;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("invalid render resolution {0}x{1}")]
    InvalidResolution(u32, u32),
}

/// Tightly packed RGB8 pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl FrameBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * 3],
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.pixels.len() == self.width as usize * self.height as usize * 3
    }
}

/// Progressive renderer bound to one scene and one set of render options.
///
/// A handle is only valid for the options it was built with; structural
/// option changes are serviced by dropping it and asking the factory for a
/// new one.
pub trait Renderer {
    /// Resolution the handle was constructed for.
    fn resolution(&self) -> [u32; 2];

    /// Discards accumulated samples and refreshes per-sample scene data
    /// (camera, materials, transforms, soft options).
    fn reset_accumulation(&mut self, scene: &Scene);

    /// Reports the wall-clock time since the previous frame. Renderers use it
    /// for time-based state or to pace how much work `render` does.
    fn update(&mut self, seconds_elapsed: f32);

    /// Accumulates one more sample batch against the scene data captured at
    /// the last reset. A batch may cover only part of the frame;
    /// `sample_count` counts completed full passes.
    fn render(&mut self);

    fn sample_count(&self) -> u32;

    /// Averaged output with rows ordered bottom to top.
    fn output_buffer(&self) -> FrameBuffer;

    /// Averaged output ready for display, rows ordered top to bottom.
    fn presentable_image(&self) -> &FrameBuffer;

    /// Runs a denoise pass over the current output and returns it for display.
    fn denoise(&mut self) -> FrameBuffer;
}

/// Builds renderer handles; one call per Reconstruct.
pub trait RendererFactory {
    type Renderer: Renderer;

    fn create(&mut self, scene: &Scene) -> Result<Self::Renderer, RenderError>;
}
