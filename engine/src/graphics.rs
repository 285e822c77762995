use crate::image::RgbaImage;
use crate::surface::SurfaceSize;
use crate::ui::Rect;

/// Straight (non-premultiplied) RGBA. The alpha channel is paint coverage: 255 overwrites,
/// anything lower blends over what is already in the frame.
pub type Color = [u8; 4];

// A tiny block font (no external deps). Glyphs are GLYPH_W x GLYPH_H cells; a font "size"
// is the height of one line including the leading, so one cell is size / LINE_CELLS.
const GLYPH_W: u32 = 3;
const GLYPH_H: u32 = 5;
const ADVANCE_CELLS: u32 = GLYPH_W + 1;
const LINE_CELLS: f32 = 7.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextBaseline {
    Top,
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Outline {
    pub color: Color,
    /// Stroke width as a fraction of the font size.
    pub width_ratio: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub size: f32,
    pub fill: Color,
    pub outline: Option<Outline>,
    pub align: TextAlign,
    pub baseline: TextBaseline,
}

impl TextStyle {
    pub fn new(size: f32, fill: Color) -> Self {
        Self {
            size,
            fill,
            outline: None,
            align: TextAlign::Left,
            baseline: TextBaseline::Top,
        }
    }

    pub fn outlined(mut self, color: Color, width_ratio: f32) -> Self {
        self.outline = Some(Outline { color, width_ratio });
        self
    }

    pub fn aligned(mut self, align: TextAlign, baseline: TextBaseline) -> Self {
        self.align = align;
        self.baseline = baseline;
        self
    }
}

/// Device pixels per glyph cell for a font size at a given density.
pub fn glyph_cell_px(size: f32, scale_factor: f32) -> u32 {
    ((size * scale_factor) / LINE_CELLS).round().max(1.0) as u32
}

/// Logical width of `text` when drawn at `size`.
pub fn measure_text(text: &str, size: f32, scale_factor: f32) -> f32 {
    let n = text.chars().count() as u32;
    if n == 0 {
        return 0.0;
    }
    let cell = glyph_cell_px(size, scale_factor);
    let device = (n * ADVANCE_CELLS - 1) * cell;
    device as f32 / scale_factor
}

/// Greedy word wrap. A single word wider than `max_width` gets a line of its own.
pub fn wrap_text(text: &str, max_width: f32, size: f32, scale_factor: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        if line.is_empty() {
            line.push_str(word);
            continue;
        }
        let candidate = format!("{line} {word}");
        if measure_text(&candidate, size, scale_factor) > max_width {
            lines.push(std::mem::take(&mut line));
            line.push_str(word);
        } else {
            line = candidate;
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

/// Unified 2D rendering interface.
///
/// All coordinates are logical units; implementations multiply by `scale_factor()` to
/// reach device pixels. Game code only talks to this trait.
pub trait Renderer2d {
    /// Device size of the target.
    fn size(&self) -> SurfaceSize;
    fn scale_factor(&self) -> f32;

    fn clear(&mut self, color: Color);
    fn fill_rect(&mut self, rect: Rect, color: Color);
    fn fill_rounded_rect(&mut self, rect: Rect, radius: f32, color: Color);
    /// Stroke centred on the rounded-rect path.
    fn stroke_rounded_rect(&mut self, rect: Rect, radius: f32, width: f32, color: Color);

    /// Blits a surface-sized image at the origin.
    fn draw_image(&mut self, image: &RgbaImage);
    /// Blits the part of a surface-sized image that falls inside a rounded clip.
    fn draw_image_rounded(&mut self, image: &RgbaImage, rect: Rect, radius: f32);

    fn draw_text(&mut self, x: f32, y: f32, text: &str, style: &TextStyle);

    fn logical_size(&self) -> (f32, f32) {
        let s = self.size();
        let f = self.scale_factor();
        (s.width as f32 / f, s.height as f32 / f)
    }

    fn measure_text(&self, text: &str, size: f32) -> f32 {
        measure_text(text, size, self.scale_factor())
    }

    fn wrap_text(&self, text: &str, max_width: f32, size: f32) -> Vec<String> {
        wrap_text(text, max_width, size, self.scale_factor())
    }
}

/// Rounded rect in device space, with the radius already clamped to half the short side.
#[derive(Debug, Clone, Copy)]
struct DeviceRoundRect {
    x0: f32,
    y0: f32,
    x1: f32,
    y1: f32,
    r: f32,
}

impl DeviceRoundRect {
    fn new(rect: Rect, radius: f32, scale: f32) -> Self {
        let x0 = rect.x * scale;
        let y0 = rect.y * scale;
        let x1 = rect.right() * scale;
        let y1 = rect.bottom() * scale;
        let r = (radius * scale)
            .min((x1 - x0) / 2.0)
            .min((y1 - y0) / 2.0)
            .max(0.0);
        Self { x0, y0, x1, y1, r }
    }

    fn grown(self, d: f32) -> Self {
        let r = (self.r + d).max(0.0);
        let out = Self {
            x0: self.x0 - d,
            y0: self.y0 - d,
            x1: self.x1 + d,
            y1: self.y1 + d,
            r,
        };
        let max_r = ((out.x1 - out.x0) / 2.0).min((out.y1 - out.y0) / 2.0).max(0.0);
        Self {
            r: out.r.min(max_r),
            ..out
        }
    }

    fn is_empty(&self) -> bool {
        self.x1 <= self.x0 || self.y1 <= self.y0
    }

    /// Sample at the pixel centre.
    fn contains(&self, px: f32, py: f32) -> bool {
        if px < self.x0 || px > self.x1 || py < self.y0 || py > self.y1 {
            return false;
        }
        let cx = if px < self.x0 + self.r {
            self.x0 + self.r
        } else if px > self.x1 - self.r {
            self.x1 - self.r
        } else {
            return true;
        };
        let cy = if py < self.y0 + self.r {
            self.y0 + self.r
        } else if py > self.y1 - self.r {
            self.y1 - self.r
        } else {
            return true;
        };
        let dx = px - cx;
        let dy = py - cy;
        dx * dx + dy * dy <= self.r * self.r
    }
}

/// CPU renderer that draws into an RGBA frame buffer.
pub struct CpuRenderer<'a> {
    frame: &'a mut [u8],
    size: SurfaceSize,
    scale: f32,
}

impl<'a> CpuRenderer<'a> {
    pub fn new(frame: &'a mut [u8], size: SurfaceSize) -> Self {
        Self {
            frame,
            size,
            scale: 1.0,
        }
    }

    pub fn with_scale_factor(mut self, scale: f32) -> Self {
        if scale.is_finite() && scale > 0.0 {
            self.scale = scale;
        }
        self
    }

    fn frame_ok(&self) -> bool {
        !self.size.is_empty() && self.frame.len() >= self.size.rgba_len()
    }

    /// Clipped device-space fill over half-open pixel ranges.
    fn fill_device(&mut self, x0: i64, y0: i64, x1: i64, y1: i64, color: Color) {
        if !self.frame_ok() || color[3] == 0 {
            return;
        }
        let w = self.size.width as i64;
        let h = self.size.height as i64;
        let (x0, x1) = (x0.clamp(0, w), x1.clamp(0, w));
        let (y0, y1) = (y0.clamp(0, h), y1.clamp(0, h));
        if x0 >= x1 || y0 >= y1 {
            return;
        }
        let stride = w as usize * 4;
        for y in y0 as usize..y1 as usize {
            let row = &mut self.frame[y * stride + x0 as usize * 4..y * stride + x1 as usize * 4];
            for px in row.chunks_exact_mut(4) {
                blend_px(px, color);
            }
        }
    }

    /// Visits every device pixel whose centre falls in `shape` (and, when given, outside
    /// `hole`), passing the byte index of the pixel.
    fn for_each_in_shape(
        &mut self,
        shape: DeviceRoundRect,
        hole: Option<DeviceRoundRect>,
        mut f: impl FnMut(&mut [u8], usize, u32, u32),
    ) {
        if !self.frame_ok() || shape.is_empty() {
            return;
        }
        let w = self.size.width;
        let h = self.size.height;
        let x0 = shape.x0.floor().max(0.0) as u32;
        let y0 = shape.y0.floor().max(0.0) as u32;
        let x1 = (shape.x1.ceil().max(0.0) as u32).min(w);
        let y1 = (shape.y1.ceil().max(0.0) as u32).min(h);
        for y in y0..y1 {
            let py = y as f32 + 0.5;
            for x in x0..x1 {
                let px = x as f32 + 0.5;
                if !shape.contains(px, py) {
                    continue;
                }
                if hole.is_some_and(|hole| !hole.is_empty() && hole.contains(px, py)) {
                    continue;
                }
                let idx = ((y as usize) * (w as usize) + x as usize) * 4;
                f(&mut *self.frame, idx, x, y);
            }
        }
    }

    fn glyph_pass(&mut self, ox: i64, oy: i64, text: &str, cell: i64, grow: i64, color: Color) {
        let mut cursor_x = ox;
        for ch in text.chars() {
            if ch != ' ' {
                for (row, bits) in glyph_rows(ch).into_iter().enumerate() {
                    let py = oy + row as i64 * cell;
                    for col in 0..GLYPH_W {
                        let mask = 1u8 << (GLYPH_W - 1 - col);
                        if bits & mask == 0 {
                            continue;
                        }
                        let px = cursor_x + col as i64 * cell;
                        self.fill_device(px - grow, py - grow, px + cell + grow, py + cell + grow, color);
                    }
                }
            }
            cursor_x += ADVANCE_CELLS as i64 * cell;
        }
    }
}

impl Renderer2d for CpuRenderer<'_> {
    fn size(&self) -> SurfaceSize {
        self.size
    }

    fn scale_factor(&self) -> f32 {
        self.scale
    }

    fn clear(&mut self, color: Color) {
        if !self.frame_ok() {
            return;
        }
        let len = self.size.rgba_len();
        for px in self.frame[..len].chunks_exact_mut(4) {
            px.copy_from_slice(&color);
        }
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        let s = self.scale;
        self.fill_device(
            (rect.x * s).round() as i64,
            (rect.y * s).round() as i64,
            (rect.right() * s).round() as i64,
            (rect.bottom() * s).round() as i64,
            color,
        );
    }

    fn fill_rounded_rect(&mut self, rect: Rect, radius: f32, color: Color) {
        if color[3] == 0 {
            return;
        }
        let shape = DeviceRoundRect::new(rect, radius, self.scale);
        self.for_each_in_shape(shape, None, |frame, idx, _, _| {
            blend_px(&mut frame[idx..idx + 4], color);
        });
    }

    fn stroke_rounded_rect(&mut self, rect: Rect, radius: f32, width: f32, color: Color) {
        if color[3] == 0 || width <= 0.0 {
            return;
        }
        let half = (width * self.scale / 2.0).max(0.5);
        let path = DeviceRoundRect::new(rect, radius, self.scale);
        let outer = path.grown(half);
        let inner = path.grown(-half);
        self.for_each_in_shape(outer, Some(inner), |frame, idx, _, _| {
            blend_px(&mut frame[idx..idx + 4], color);
        });
    }

    fn draw_image(&mut self, image: &RgbaImage) {
        if !self.frame_ok() {
            return;
        }
        let w = self.size.width.min(image.width()) as usize;
        let h = self.size.height.min(image.height()) as usize;
        let dst_stride = self.size.width as usize * 4;
        let src_stride = image.width() as usize * 4;
        let src = image.pixels();
        for y in 0..h {
            let dst = &mut self.frame[y * dst_stride..y * dst_stride + w * 4];
            let row = &src[y * src_stride..y * src_stride + w * 4];
            for (d, s) in dst.chunks_exact_mut(4).zip(row.chunks_exact(4)) {
                blend_px(d, [s[0], s[1], s[2], s[3]]);
            }
        }
    }

    fn draw_image_rounded(&mut self, image: &RgbaImage, rect: Rect, radius: f32) {
        let shape = DeviceRoundRect::new(rect, radius, self.scale);
        self.for_each_in_shape(shape, None, |frame, idx, x, y| {
            if let Some(c) = image.pixel(x, y) {
                blend_px(&mut frame[idx..idx + 4], c);
            }
        });
    }

    fn draw_text(&mut self, x: f32, y: f32, text: &str, style: &TextStyle) {
        if text.is_empty() {
            return;
        }
        let s = self.scale;
        let cell = glyph_cell_px(style.size, s) as i64;
        let width = measure_text(text, style.size, s);
        let glyph_h = (GLYPH_H as i64 * cell) as f32 / s;

        let left = match style.align {
            TextAlign::Left => x,
            TextAlign::Center => x - width / 2.0,
            TextAlign::Right => x - width,
        };
        let top = match style.baseline {
            TextBaseline::Top => y,
            TextBaseline::Middle => y - glyph_h / 2.0,
        };
        let ox = (left * s).round() as i64;
        let oy = (top * s).round() as i64;

        // Outline first, then fill on top, so the fill is never eaten by the stroke.
        if let Some(outline) = style.outline {
            let grow = (style.size * outline.width_ratio * s).round().max(1.0) as i64;
            self.glyph_pass(ox, oy, text, cell, grow, outline.color);
        }
        self.glyph_pass(ox, oy, text, cell, 0, style.fill);
    }
}

fn blend_px(px: &mut [u8], color: Color) {
    let a = color[3] as u32;
    if a == 0 {
        return;
    }
    if a == 255 {
        px.copy_from_slice(&color);
        return;
    }
    let inv = 255 - a;
    for c in 0..3 {
        px[c] = ((px[c] as u32 * inv + color[c] as u32 * a + 127) / 255) as u8;
    }
    px[3] = (a + (px[3] as u32 * inv + 127) / 255).min(255) as u8;
}

fn glyph_rows(ch: char) -> [u8; GLYPH_H as usize] {
    let c = ch.to_ascii_uppercase();
    match c {
        // Digits
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],

        // Letters
        'A' => [0b010, 0b101, 0b111, 0b101, 0b101],
        'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'C' => [0b111, 0b100, 0b100, 0b100, 0b111],
        'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'E' => [0b111, 0b100, 0b111, 0b100, 0b111],
        'F' => [0b111, 0b100, 0b111, 0b100, 0b100],
        'G' => [0b111, 0b100, 0b101, 0b101, 0b111],
        'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'J' => [0b111, 0b001, 0b001, 0b101, 0b010],
        'K' => [0b101, 0b110, 0b100, 0b110, 0b101],
        'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'M' => [0b101, 0b111, 0b111, 0b101, 0b101],
        'N' => [0b101, 0b111, 0b111, 0b111, 0b101],
        'O' => [0b111, 0b101, 0b101, 0b101, 0b111],
        'P' => [0b111, 0b101, 0b111, 0b100, 0b100],
        'Q' => [0b111, 0b101, 0b101, 0b111, 0b001],
        'R' => [0b111, 0b101, 0b111, 0b110, 0b101],
        'S' => [0b111, 0b100, 0b111, 0b001, 0b111],
        'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'V' => [0b101, 0b101, 0b101, 0b101, 0b010],
        'W' => [0b101, 0b101, 0b111, 0b111, 0b101],
        'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'Y' => [0b101, 0b101, 0b010, 0b010, 0b010],
        'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],

        // Punctuation
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ',' => [0b000, 0b000, 0b000, 0b010, 0b100],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        ';' => [0b000, 0b010, 0b000, 0b010, 0b100],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '(' => [0b010, 0b100, 0b100, 0b100, 0b010],
        ')' => [0b010, 0b001, 0b001, 0b001, 0b010],
        '!' => [0b010, 0b010, 0b010, 0b000, 0b010],
        '?' => [0b111, 0b001, 0b010, 0b000, 0b010],
        '"' => [0b101, 0b101, 0b000, 0b000, 0b000],
        '%' => [0b101, 0b001, 0b010, 0b100, 0b101],
        '=' => [0b000, 0b111, 0b000, 0b111, 0b000],

        // Extras used in formatting.
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '+' => [0b000, 0b010, 0b111, 0b010, 0b000],
        '\'' => [0b010, 0b010, 0b000, 0b000, 0b000],

        _ => [0b111, 0b001, 0b010, 0b000, 0b010], // '?'
    }
}
