use engine::graphics::{CpuRenderer, Renderer2d, TextAlign, TextBaseline, TextStyle};
use engine::image::RgbaImage;
use engine::surface::{RgbaBufferSurface, Surface, SurfaceSize};
use engine::ui::Rect;

const BG: [u8; 4] = [10, 10, 30, 255];

fn px(frame: &[u8], width: u32, x: u32, y: u32) -> [u8; 4] {
    let i = ((y * width + x) * 4) as usize;
    [frame[i], frame[i + 1], frame[i + 2], frame[i + 3]]
}

#[test]
fn fills_outside_the_surface_are_clipped() {
    let mut surface = RgbaBufferSurface::new(SurfaceSize::new(16, 16));
    let size = surface.size();
    let mut gfx = CpuRenderer::new(surface.frame_mut(), size);
    gfx.clear(BG);
    gfx.fill_rect(Rect::new(-10.0, -10.0, 14.0, 14.0), [255, 0, 0, 255]);
    gfx.fill_rect(Rect::new(12.0, 12.0, 100.0, 100.0), [0, 255, 0, 255]);
    gfx.fill_rounded_rect(Rect::new(-50.0, 8.0, 10.0, 10.0), 3.0, [0, 0, 255, 255]);

    assert_eq!(surface.pixel(0, 0), Some([255, 0, 0, 255]));
    assert_eq!(surface.pixel(4, 4), Some(BG));
    assert_eq!(surface.pixel(15, 15), Some([0, 255, 0, 255]));
    assert_eq!(surface.pixel(0, 12), Some(BG));
}

#[test]
fn centered_text_straddles_the_anchor() {
    let (w, h) = (80u32, 20u32);
    let mut frame = vec![0u8; (w * h * 4) as usize];
    let mut gfx = CpuRenderer::new(&mut frame, SurfaceSize::new(w, h));
    gfx.clear(BG);
    let style = TextStyle::new(14.0, [255, 255, 255, 255])
        .aligned(TextAlign::Center, TextBaseline::Middle);
    // "HH" is 14 logical wide at this size, so it spans x 33..47.
    gfx.draw_text(40.0, 10.0, "HH", &style);

    // Middle row of 'H' is fully lit: glyph top is 10 - 5 = 5, row 2 covers y 9..11.
    assert_eq!(px(&frame, w, 33, 9), [255, 255, 255, 255]);
    assert_eq!(px(&frame, w, 46, 9), [255, 255, 255, 255]);
    assert_eq!(px(&frame, w, 31, 9), BG);
    assert_eq!(px(&frame, w, 48, 9), BG);
}

#[test]
fn image_blit_respects_source_alpha() {
    let (w, h) = (4u32, 4u32);
    let mut frame = vec![0u8; (w * h * 4) as usize];
    let img = RgbaImage::filled(4, 4, [255, 255, 255, 0]);
    let mut gfx = CpuRenderer::new(&mut frame, SurfaceSize::new(w, h));
    gfx.clear(BG);
    gfx.draw_image(&img);
    assert_eq!(px(&frame, w, 2, 2), BG);

    let opaque = RgbaImage::filled(4, 4, [1, 2, 3, 255]);
    let mut gfx = CpuRenderer::new(&mut frame, SurfaceSize::new(w, h));
    gfx.draw_image(&opaque);
    assert_eq!(px(&frame, w, 2, 2), [1, 2, 3, 255]);
}

#[test]
fn logical_size_divides_by_scale() {
    let mut frame = vec![0u8; 200 * 100 * 4];
    let gfx = CpuRenderer::new(&mut frame, SurfaceSize::new(200, 100)).with_scale_factor(2.0);
    assert_eq!(gfx.logical_size(), (100.0, 50.0));
}
