use std::convert::Infallible;

use serde::{Deserialize, Serialize};

/// Size of a pixel buffer, always in device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn rgba_len(self) -> usize {
        (self.width as usize)
            .saturating_mul(self.height as usize)
            .saturating_mul(4)
    }
}

/// Maps logical layout units onto device pixels.
///
/// Layout code works in logical units so a button is the same visual size on a 1x and a 2x
/// display; the renderer multiplies by `scale_factor` when it touches pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub physical: SurfaceSize,
    pub scale_factor: f32,
}

impl Viewport {
    pub fn new(physical: SurfaceSize, scale_factor: f32) -> Self {
        let scale_factor = if scale_factor.is_finite() && scale_factor > 0.0 {
            scale_factor
        } else {
            1.0
        };
        Self {
            physical,
            scale_factor,
        }
    }

    /// A viewport whose logical size is `width` x `height` at the given density.
    pub fn from_logical(width: f32, height: f32, scale_factor: f32) -> Self {
        let vp = Self::new(SurfaceSize::new(0, 0), scale_factor);
        let physical = SurfaceSize::new(
            (width * vp.scale_factor).round().max(0.0) as u32,
            (height * vp.scale_factor).round().max(0.0) as u32,
        );
        Self { physical, ..vp }
    }

    pub fn logical_size(&self) -> (f32, f32) {
        (
            self.physical.width as f32 / self.scale_factor,
            self.physical.height as f32 / self.scale_factor,
        )
    }

    pub fn to_logical(&self, physical_x: f64, physical_y: f64) -> (f32, f32) {
        let s = self.scale_factor as f64;
        ((physical_x / s) as f32, (physical_y / s) as f32)
    }

    pub fn with_physical(self, physical: SurfaceSize) -> Self {
        Self { physical, ..self }
    }

    pub fn with_scale_factor(self, scale_factor: f32) -> Self {
        Self::new(self.physical, scale_factor)
    }
}

/// A resizable RGBA surface.
///
/// Rendering writes RGBA pixels into `frame_mut()`; presentation shows or records them.
/// Works for both windowed and offscreen runs.
pub trait Surface {
    type Error;

    fn size(&self) -> SurfaceSize;
    fn frame_mut(&mut self) -> &mut [u8];

    fn resize(&mut self, size: SurfaceSize) -> Result<(), Self::Error>;
    fn present(&mut self) -> Result<(), Self::Error>;
}

/// A simple in-memory RGBA surface for headless execution and tests.
#[derive(Debug, Clone)]
pub struct RgbaBufferSurface {
    size: SurfaceSize,
    buf: Vec<u8>,
}

impl RgbaBufferSurface {
    pub fn new(size: SurfaceSize) -> Self {
        Self {
            size,
            buf: vec![0u8; size.rgba_len()],
        }
    }

    pub fn frame(&self) -> &[u8] {
        &self.buf
    }

    /// RGBA of the device pixel at (`x`, `y`), or `None` when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.size.width || y >= self.size.height {
            return None;
        }
        let idx = ((y as usize) * (self.size.width as usize) + x as usize) * 4;
        let px = self.buf.get(idx..idx + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }
}

impl Surface for RgbaBufferSurface {
    type Error = Infallible;

    fn size(&self) -> SurfaceSize {
        self.size
    }

    fn frame_mut(&mut self) -> &mut [u8] {
        &mut self.buf
    }

    fn resize(&mut self, size: SurfaceSize) -> Result<(), Self::Error> {
        self.size = size;
        self.buf.resize(size.rgba_len(), 0u8);
        Ok(())
    }

    fn present(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}
