use std::time::Instant;

use pixels::{PixelsBuilder, SurfaceTexture};
use winit::dpi::LogicalSize;
use winit::event::{ElementState, Event, KeyboardInput, MouseButton, VirtualKeyCode, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::{Window, WindowBuilder};

use crate::graphics::Renderer2d;
use crate::pixels_renderer::PixelsRenderer2d;
use crate::surface::{SurfaceSize, Viewport};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("failed creating window: {0}")]
    Window(#[from] winit::error::OsError),
    #[error("failed creating pixel surface: {0}")]
    Pixels(#[from] pixels::Error),
}

pub struct AppConfig {
    pub title: String,
    /// Requested inner size in logical units.
    pub desired_size: LogicalSize<u32>,
    pub clamp_to_monitor: bool,
    pub vsync: Option<bool>,
}

pub struct AppContext {
    pub window: Window,
    pub renderer: PixelsRenderer2d,
}

/// Input gathered since the previous frame. Pointer coordinates are logical.
#[derive(Debug, Clone, Default)]
pub struct InputFrame {
    pub pointer: Option<(f32, f32)>,
    /// A left click was released this frame.
    pub clicked: bool,
    pub keys_pressed: Vec<VirtualKeyCode>,
}

impl InputFrame {
    fn end_frame(&mut self) {
        self.clicked = false;
        self.keys_pressed.clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

pub trait GameApp {
    /// Advances the app by one frame. `now` is the frame's wall-clock instant.
    fn update(&mut self, input: &InputFrame, now: Instant) -> Flow;

    fn render(&mut self, renderer: &mut dyn Renderer2d);
}

pub fn run_game<G: GameApp + 'static>(config: AppConfig, mut game: G) -> Result<(), AppError> {
    let event_loop = EventLoop::new();
    let initial_size = match event_loop.primary_monitor() {
        Some(monitor) if config.clamp_to_monitor => {
            let bounds: LogicalSize<u32> = monitor.size().to_logical(monitor.scale_factor());
            LogicalSize::new(
                config.desired_size.width.min(bounds.width),
                config.desired_size.height.min(bounds.height),
            )
        }
        _ => config.desired_size,
    };
    let window = WindowBuilder::new()
        .with_title(config.title)
        .with_inner_size(initial_size)
        .build(&event_loop)?;

    let inner = window.inner_size();
    let viewport = Viewport::new(
        SurfaceSize::new(inner.width, inner.height),
        window.scale_factor() as f32,
    );

    let pixels = {
        let (w, h) = (inner.width.max(1), inner.height.max(1));
        let surface_texture = SurfaceTexture::new(w, h, &window);
        let mut builder = PixelsBuilder::new(w, h, surface_texture);
        if let Some(vsync) = config.vsync {
            builder = builder.enable_vsync(vsync);
        }
        builder.build()?
    };
    let renderer = PixelsRenderer2d::new(pixels, viewport)?;
    tracing::debug!(
        width = viewport.physical.width,
        height = viewport.physical.height,
        scale = viewport.scale_factor,
        "window ready"
    );

    let mut ctx = AppContext { window, renderer };
    let mut input = InputFrame::default();

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Poll;

        match event {
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => {
                    *control_flow = ControlFlow::Exit;
                }
                WindowEvent::Resized(size) => {
                    let viewport = ctx
                        .renderer
                        .viewport()
                        .with_physical(SurfaceSize::new(size.width, size.height));
                    if let Err(err) = ctx.renderer.resize(viewport) {
                        tracing::warn!("resize failed: {err}");
                    }
                    ctx.window.request_redraw();
                }
                WindowEvent::ScaleFactorChanged {
                    scale_factor,
                    new_inner_size,
                } => {
                    let size = *new_inner_size;
                    let viewport = Viewport::new(
                        SurfaceSize::new(size.width, size.height),
                        scale_factor as f32,
                    );
                    if let Err(err) = ctx.renderer.resize(viewport) {
                        tracing::warn!("scale change resize failed: {err}");
                    }
                    ctx.window.request_redraw();
                }
                WindowEvent::CursorMoved { position, .. } => {
                    input.pointer = Some(ctx.renderer.viewport().to_logical(position.x, position.y));
                }
                WindowEvent::CursorLeft { .. } => {
                    input.pointer = None;
                }
                WindowEvent::MouseInput {
                    state: ElementState::Released,
                    button: MouseButton::Left,
                    ..
                } => {
                    input.clicked = true;
                }
                WindowEvent::KeyboardInput {
                    input:
                        KeyboardInput {
                            state: ElementState::Pressed,
                            virtual_keycode: Some(key),
                            ..
                        },
                    ..
                } => {
                    input.keys_pressed.push(key);
                }
                _ => {}
            },
            Event::RedrawRequested(_) => {
                if game.update(&input, Instant::now()) == Flow::Exit {
                    *control_flow = ControlFlow::Exit;
                    return;
                }
                input.end_frame();

                ctx.renderer.draw_frame(|gfx| game.render(gfx));
                if let Err(err) = ctx.renderer.present() {
                    tracing::warn!("present failed: {err}");
                }
            }
            Event::MainEventsCleared => {
                ctx.window.request_redraw();
            }
            _ => {}
        }
    });
}
