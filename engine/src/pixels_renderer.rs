use crate::graphics::{CpuRenderer, Renderer2d};
use crate::surface::{SurfaceSize, Viewport};

use pixels::Pixels;

/// Headful renderer built on `pixels`.
///
/// The frame buffer always matches the physical window size so that drawing happens at full
/// device resolution; `Viewport::scale_factor` maps logical layout units onto it.
pub struct PixelsRenderer2d {
    pixels: Pixels,
    viewport: Viewport,
}

impl PixelsRenderer2d {
    pub fn new(mut pixels: Pixels, viewport: Viewport) -> Result<Self, pixels::Error> {
        let size = viewport.physical;
        if !size.is_empty() {
            pixels.resize_buffer(size.width, size.height)?;
        }
        Ok(Self { pixels, viewport })
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn size(&self) -> SurfaceSize {
        self.viewport.physical
    }

    /// Resizes both the swapchain surface and the CPU buffer. A zero-sized viewport
    /// (minimised window) is remembered but not applied.
    pub fn resize(&mut self, viewport: Viewport) -> Result<(), pixels::Error> {
        self.viewport = viewport;
        let size = viewport.physical;
        if size.is_empty() {
            return Ok(());
        }
        self.pixels.resize_surface(size.width, size.height)?;
        self.pixels.resize_buffer(size.width, size.height)?;
        Ok(())
    }

    pub fn draw_frame<F, R>(&mut self, f: F) -> R
    where
        F: FnOnce(&mut dyn Renderer2d) -> R,
    {
        let size = self.viewport.physical;
        let mut cpu = CpuRenderer::new(self.pixels.frame_mut(), size)
            .with_scale_factor(self.viewport.scale_factor);
        f(&mut cpu)
    }

    pub fn present(&mut self) -> Result<(), pixels::Error> {
        if self.viewport.physical.is_empty() {
            return Ok(());
        }
        self.pixels.render()
    }
}
