//! Game-agnostic 2D plumbing: surfaces, a CPU renderer with a block font, image decoding,
//! layout rects, a winit/pixels window loop, and frame-hash regression helpers.

pub mod app;
pub mod graphics;
pub mod image;
pub mod pixels_renderer;
pub mod regression;
pub mod surface;
pub mod ui;
