//! Decoded RGBA images and the two transforms the renderer needs from them: cover-fit
//! resampling onto a surface and a cheap blur for frosted panels.

use std::io::Cursor;
use std::path::Path;

use crate::graphics::Color;
use crate::surface::SurfaceSize;

#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("failed reading image {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed decoding png: {0}")]
    Decode(#[from] png::DecodingError),
    #[error("unsupported png color type {0:?}")]
    Unsupported(png::ColorType),
    #[error("image has zero width or height")]
    Empty,
    #[error("pixel buffer of {got} bytes does not match {width}x{height}")]
    BadLength { width: u32, height: u32, got: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbaImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl RgbaImage {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, ImageError> {
        if width == 0 || height == 0 {
            return Err(ImageError::Empty);
        }
        if pixels.len() != SurfaceSize::new(width, height).rgba_len() {
            return Err(ImageError::BadLength {
                width,
                height,
                got: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn filled(width: u32, height: u32, color: Color) -> Self {
        let len = SurfaceSize::new(width, height).rgba_len();
        let mut pixels = Vec::with_capacity(len);
        for _ in 0..len / 4 {
            pixels.extend_from_slice(&color);
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> SurfaceSize {
        SurfaceSize::new(self.width, self.height)
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = ((y as usize) * (self.width as usize) + x as usize) * 4;
        let px = &self.pixels[idx..idx + 4];
        Some([px[0], px[1], px[2], px[3]])
    }

    pub fn open_png(path: impl AsRef<Path>) -> Result<Self, ImageError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| ImageError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::decode_png(&bytes)
    }

    /// Decodes any 8/16-bit PNG into straight RGBA8.
    pub fn decode_png(bytes: &[u8]) -> Result<Self, ImageError> {
        let mut decoder = png::Decoder::new(Cursor::new(bytes));
        decoder.set_transformations(png::Transformations::normalize_to_color8());
        let mut reader = decoder.read_info()?;

        let (color_type, _) = reader.output_color_type();
        let (width, height) = {
            let info = reader.info();
            (info.width, info.height)
        };
        if width == 0 || height == 0 {
            return Err(ImageError::Empty);
        }

        let samples = color_type.samples();
        let mut buf = vec![0u8; width as usize * height as usize * samples];
        reader.next_frame(&mut buf)?;

        let pixels = match color_type {
            png::ColorType::Rgba => buf,
            png::ColorType::Rgb => buf
                .chunks_exact(3)
                .flat_map(|p| [p[0], p[1], p[2], 255])
                .collect(),
            png::ColorType::GrayscaleAlpha => buf
                .chunks_exact(2)
                .flat_map(|p| [p[0], p[0], p[0], p[1]])
                .collect(),
            png::ColorType::Grayscale => buf.iter().flat_map(|&v| [v, v, v, 255]).collect(),
            other => return Err(ImageError::Unsupported(other)),
        };

        Self::new(width, height, pixels)
    }

    /// Scales the image so it fully covers `target`, centred, cropping the overflow.
    pub fn cover_fit(&self, target: SurfaceSize) -> RgbaImage {
        if target.is_empty() {
            return RgbaImage {
                width: target.width,
                height: target.height,
                pixels: Vec::new(),
            };
        }
        if self.width == 0 || self.height == 0 {
            return RgbaImage {
                width: target.width,
                height: target.height,
                pixels: vec![0; target.rgba_len()],
            };
        }

        let iw = self.width as f32;
        let ih = self.height as f32;
        let scale = (target.width as f32 / iw).max(target.height as f32 / ih);
        let dx = (target.width as f32 - iw * scale) / 2.0;
        let dy = (target.height as f32 - ih * scale) / 2.0;

        let src_x: Vec<usize> = (0..target.width)
            .map(|x| {
                let sx = ((x as f32 + 0.5 - dx) / scale).floor();
                sx.clamp(0.0, iw - 1.0) as usize
            })
            .collect();

        let stride = self.width as usize * 4;
        let mut pixels = Vec::with_capacity(target.rgba_len());
        for y in 0..target.height {
            let sy = ((y as f32 + 0.5 - dy) / scale).floor().clamp(0.0, ih - 1.0) as usize;
            let row = &self.pixels[sy * stride..(sy + 1) * stride];
            for &sx in &src_x {
                pixels.extend_from_slice(&row[sx * 4..sx * 4 + 4]);
            }
        }

        RgbaImage {
            width: target.width,
            height: target.height,
            pixels,
        }
    }

    /// Two-pass separable box blur with clamped edges; close enough to a gaussian for a
    /// frosted-glass backdrop.
    pub fn box_blurred(&self, radius: u32) -> RgbaImage {
        if radius == 0 || self.pixels.is_empty() {
            return self.clone();
        }
        let w = self.width as usize;
        let h = self.height as usize;
        let mut a = self.pixels.clone();
        let mut b = vec![0u8; a.len()];
        for _ in 0..2 {
            blur_pass(&a, &mut b, w, h, radius as usize, true);
            blur_pass(&b, &mut a, w, h, radius as usize, false);
        }
        RgbaImage {
            width: self.width,
            height: self.height,
            pixels: a,
        }
    }
}

fn blur_pass(src: &[u8], dst: &mut [u8], w: usize, h: usize, r: usize, horizontal: bool) {
    let (lines, len) = if horizontal { (h, w) } else { (w, h) };
    let index = |line: usize, i: usize| -> usize {
        if horizontal {
            (line * w + i) * 4
        } else {
            (i * w + line) * 4
        }
    };
    let window = (2 * r + 1) as u32;

    for line in 0..lines {
        let mut sum = [0u32; 4];
        for k in 0..=2 * r {
            let i = (k as isize - r as isize).clamp(0, len as isize - 1) as usize;
            let idx = index(line, i);
            for c in 0..4 {
                sum[c] += src[idx + c] as u32;
            }
        }

        for i in 0..len {
            let out = index(line, i);
            for c in 0..4 {
                dst[out + c] = ((sum[c] + window / 2) / window) as u8;
            }
            let leaving = (i as isize - r as isize).clamp(0, len as isize - 1) as usize;
            let entering = (i + r + 1).min(len - 1);
            let li = index(line, leaving);
            let ei = index(line, entering);
            for c in 0..4 {
                sum[c] = sum[c] + src[ei + c] as u32 - src[li + c] as u32;
            }
        }
    }
}
