//! Immediate-mode drawing of the in-game screen.
//!
//! Layout is recomputed from the logical surface size on every call, and the rectangles that
//! were drawn become the zone map used for pointer hit testing until the next frame.

use std::sync::Arc;

use engine::graphics::{Color, Renderer2d, TextAlign, TextBaseline, TextStyle};
use engine::image::RgbaImage;
use engine::surface::SurfaceSize;
use engine::ui::{Anchor, Rect, Size};

use crate::backdrop::{BackdropResolver, ImageLoader};
use crate::mode::Mode;
use crate::question::OptionKey;
use crate::state::{GameState, Lifeline};
use crate::zones::ZoneMap;

pub const BASE: Color = [16, 18, 32, 255];
const BLACK: Color = [0, 0, 0, 255];
const WHITE: Color = [255, 255, 255, 255];
const FLAT_GLASS: Color = [0, 0, 0, 38];
const AMBER: Color = [255, 190, 11, 217];
const TIMER_TEXT: Color = [255, 226, 139, 255];
const KEY_LABEL: Color = [230, 225, 255, 242];
const DISABLED: Color = [0, 0, 0, 64];
const CORRECT: Color = [46, 125, 50, 191];
const WRONG: Color = [255, 75, 92, 191];

const BLUR_PX: f32 = 10.0;
const GLASS_STROKE: f32 = 3.0;

const HUD_H: f32 = 70.0;
const BAR_H: f32 = 13.0;
const BAR_INSET: f32 = 40.0;
const SECTION_GAP: f32 = 18.0;
const ROW_GAP: f32 = 12.0;
const COL_GAP: f32 = 14.0;
const MIN_ANSWER_AREA_H: f32 = 130.0;
const LIFELINE_H: f32 = 36.0;
const LIFELINE_GAP: f32 = 10.0;
const NEXT_W: f32 = 190.0;
const NEXT_H: f32 = 40.0;
const NEXT_GAP: f32 = 10.0;
/// Below this logical height every vertical measure shrinks in proportion.
const FULL_SCALE_H: f32 = 600.0;

/// Every rectangle of the game screen for one logical surface size.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub hud: Rect,
    pub bar: Rect,
    pub card: Rect,
    /// Indexed by `OptionKey::index`.
    pub answers: [Rect; 4],
    /// In `Lifeline::ALL` order.
    pub lifelines: [Rect; 3],
    pub next: Rect,
}

/// Sections stack top-down (HUD, card, answers) and bottom-up (lifelines, next). The answer
/// grid takes whatever is left between them; when that falls under its minimum the card
/// gives up height first.
pub fn compute_layout(width: f32, height: f32) -> Layout {
    let k = (height / FULL_SCALE_H).min(1.0);
    let margin_x = (width * 0.04).max(18.0);
    let margin_top = (height * 0.03).max(16.0 * k);
    let margin_bottom = margin_top;
    let gap = SECTION_GAP * k;

    let hud_h = HUD_H * k;
    let hud = Rect::new(margin_x, margin_top, width - margin_x * 2.0, hud_h);
    let bar = Rect::new(
        hud.x + BAR_INSET,
        hud.bottom() - hud_h / 3.0,
        hud.w - BAR_INSET * 2.0,
        BAR_H * k,
    );

    let lifeline_h = LIFELINE_H * k;
    let lifeline_top = height - margin_bottom - lifeline_h;
    let row = Rect::new(hud.x, lifeline_top, hud.w, lifeline_h);
    let cols = row.columns(3, LIFELINE_GAP);
    let lifelines = [cols[0], cols[1], cols[2]];

    let next_h = NEXT_H * k;
    let next_top = lifeline_top - NEXT_GAP * k - next_h;
    let next = Rect::new(0.0, next_top, width, next_h)
        .place(Size::new(NEXT_W.min(hud.w), next_h), Anchor::Center);

    let area_bottom = next_top - NEXT_GAP * k;
    let card_top = hud.bottom() + gap;
    let room = area_bottom - card_top - gap;
    let min_area = MIN_ANSWER_AREA_H * k;
    let card_h = (height * 0.26)
        .min(170.0)
        .min(room - min_area)
        .max(0.0);
    let card = Rect::new(0.0, card_top, width, card_h)
        .place(Size::new(hud.w, card_h), Anchor::TopCenter);

    let area_top = card.bottom() + gap;
    let area_h = (area_bottom - area_top).max(0.0);
    let row_gap = ROW_GAP * k;
    let btn_w = (card.w - COL_GAP) / 2.0;
    let btn_h = ((area_h - row_gap) / 2.0).max(0.0);
    let answers = std::array::from_fn(|i| {
        let col = (i % 2) as f32;
        let row = (i / 2) as f32;
        Rect::new(
            card.x + col * (btn_w + COL_GAP),
            area_top + row * (btn_h + row_gap),
            btn_w,
            btn_h,
        )
    });

    Layout {
        hud,
        bar,
        card,
        answers,
        lifelines,
        next,
    }
}

struct BackdropCache {
    generation: u64,
    size: SurfaceSize,
    cover: RgbaImage,
    blurred: RgbaImage,
}

/// Draws game state and owns the backdrop resolver plus the zone map of the last frame.
pub struct RenderEngine<L: ImageLoader> {
    resolver: BackdropResolver<L>,
    cache: Option<BackdropCache>,
    zones: ZoneMap,
}

impl<L: ImageLoader> RenderEngine<L> {
    pub fn new(resolver: BackdropResolver<L>) -> Self {
        Self {
            resolver,
            cache: None,
            zones: ZoneMap::default(),
        }
    }

    pub fn resolver(&self) -> &BackdropResolver<L> {
        &self.resolver
    }

    pub fn zones(&self) -> &ZoneMap {
        &self.zones
    }

    /// Draws one frame for `state` and returns the zones that were drawn.
    pub fn draw(&mut self, gfx: &mut dyn Renderer2d, state: &GameState) -> &ZoneMap {
        self.resolver.poll();
        self.zones.clear();
        gfx.clear(BASE);

        if !state.mode.is_in_game() {
            self.resolver.reset();
            self.cache = None;
            return &self.zones;
        }

        self.resolver.request(&state.category_bg);
        self.refresh_cache(gfx.size(), gfx.scale_factor());

        let (width, height) = gfx.logical_size();
        let layout = compute_layout(width, height);
        let mut painter = Painter {
            gfx,
            backdrop: self.cache.as_ref().map(|c| (&c.cover, &c.blurred)),
        };
        painter.backdrop();
        draw_hud(&mut painter, &layout, state);
        draw_card(&mut painter, &layout, state);
        draw_answers(&mut painter, &layout, state, &mut self.zones);
        draw_lifelines(&mut painter, &layout, state, &mut self.zones);
        if state.mode == Mode::Feedback {
            draw_next(&mut painter, &layout);
            self.zones.next = Some(layout.next);
        }
        &self.zones
    }

    fn refresh_cache(&mut self, size: SurfaceSize, scale_factor: f32) {
        let Some((image, generation)) = self.resolver.image() else {
            self.cache = None;
            return;
        };
        if self
            .cache
            .as_ref()
            .is_some_and(|c| c.generation == generation && c.size == size)
        {
            return;
        }
        if size.is_empty() {
            self.cache = None;
            return;
        }
        let image: Arc<RgbaImage> = Arc::clone(image);
        let cover = image.cover_fit(size);
        let blurred = cover.box_blurred((BLUR_PX * scale_factor).round() as u32);
        self.cache = Some(BackdropCache {
            generation,
            size,
            cover,
            blurred,
        });
    }
}

struct Painter<'g, 'b> {
    gfx: &'g mut dyn Renderer2d,
    backdrop: Option<(&'b RgbaImage, &'b RgbaImage)>,
}

impl Painter<'_, '_> {
    fn backdrop(&mut self) {
        if let Some((cover, _)) = self.backdrop {
            self.gfx.draw_image(cover);
        }
    }

    /// Frosted panel: blurred backdrop (or a flat tint) inside the rounded clip, a translucent
    /// fill on top, then the border. The border is kept inside the clip.
    fn glass(&mut self, rect: Rect, radius: f32, fill: Color, stroke: Color) {
        match self.backdrop {
            Some((_, blurred)) => self.gfx.draw_image_rounded(blurred, rect, radius),
            None => self.gfx.fill_rounded_rect(rect, radius, FLAT_GLASS),
        }
        self.gfx.fill_rounded_rect(rect, radius, fill);
        let half = GLASS_STROKE / 4.0;
        self.gfx
            .stroke_rounded_rect(rect.expand(-half), radius - half, GLASS_STROKE / 2.0, stroke);
    }

    fn fill(&mut self, rect: Rect, radius: f32, color: Color) {
        self.gfx.fill_rounded_rect(rect, radius, color);
    }

    fn text(&mut self, x: f32, y: f32, text: &str, style: TextStyle) {
        self.gfx.draw_text(x, y, text, &style);
    }

    /// Word-wrapped block centred on (`cx`, `cy`).
    fn wrapped(&mut self, cx: f32, cy: f32, max_w: f32, line_h: f32, text: &str, style: TextStyle) {
        let lines = self.gfx.wrap_text(text, max_w, style.size);
        let n = lines.len() as f32;
        let style = style.aligned(TextAlign::Center, TextBaseline::Top);
        for (i, line) in lines.iter().enumerate() {
            let y = cy - n * line_h / 2.0 + i as f32 * line_h;
            self.gfx.draw_text(cx, y, line, &style);
        }
    }
}

fn outlined(size: f32, fill: Color, ratio: f32) -> TextStyle {
    TextStyle::new(size, fill).outlined(BLACK, ratio)
}

fn draw_hud(p: &mut Painter<'_, '_>, layout: &Layout, state: &GameState) {
    let hud = layout.hud;
    p.glass(hud, 22.0, [255, 255, 255, 26], [255, 255, 255, 46]);

    let text_y = hud.y + hud.h / 3.0;
    p.text(
        hud.x + 16.0,
        text_y,
        &format!("SCORE: {}", state.score),
        outlined(16.0, WHITE, 0.08).aligned(TextAlign::Left, TextBaseline::Middle),
    );
    p.text(
        hud.right() - 16.0,
        text_y,
        &format!(
            "QUESTION {} / {}",
            state.current_index + 1,
            state.questions.len()
        ),
        outlined(14.0, WHITE, 0.08).aligned(TextAlign::Right, TextBaseline::Middle),
    );
    p.text(
        hud.center().0,
        text_y,
        &format!("{} S", state.remaining_time),
        outlined(16.0, TIMER_TEXT, 0.10).aligned(TextAlign::Center, TextBaseline::Middle),
    );

    let bar = layout.bar;
    p.glass(bar, 5.0, [255, 255, 255, 31], [255, 255, 255, 64]);
    let active = bar.w * state.time_fraction();
    if active > 0.0 {
        p.fill(Rect::new(bar.x, bar.y, active, bar.h), 5.0, AMBER);
    }
}

fn draw_card(p: &mut Painter<'_, '_>, layout: &Layout, state: &GameState) {
    let card = layout.card;
    p.glass(card, 22.0, [255, 255, 255, 31], [255, 255, 255, 51]);
    let text = state
        .current_question()
        .map(|q| q.text.as_str())
        .unwrap_or("");
    let (cx, cy) = card.center();
    p.wrapped(cx, cy, card.w - 36.0, 22.0, text, outlined(21.0, WHITE, 0.09));
}

fn draw_answers(p: &mut Painter<'_, '_>, layout: &Layout, state: &GameState, zones: &mut ZoneMap) {
    let Some(question) = state.current_question() else {
        return;
    };
    let feedback = state.mode == Mode::Feedback;

    for key in OptionKey::ALL {
        let Some(text) = question.answers.get(&key) else {
            continue;
        };
        let rect = layout.answers[key.index()];
        p.glass(rect, 18.0, [255, 255, 255, 26], [255, 255, 255, 46]);

        if state.disabled_answers.contains(&key) {
            p.fill(rect, 18.0, DISABLED);
        }
        if feedback && key == question.correct {
            p.fill(rect, 18.0, CORRECT);
        }
        if feedback && state.last_answer == Some(key) && state.last_answer_correct != Some(true) {
            p.fill(rect, 18.0, WRONG);
        }

        p.text(
            rect.x + 10.0,
            rect.y + 10.0,
            &format!("{key}:"),
            outlined(19.0, KEY_LABEL, 0.10),
        );
        let (cx, cy) = rect.center();
        p.wrapped(cx, cy, rect.w - 24.0, 28.0, text, outlined(21.0, WHITE, 0.09));

        zones.answers.insert(key, rect);
    }
}

fn draw_lifelines(p: &mut Painter<'_, '_>, layout: &Layout, state: &GameState, zones: &mut ZoneMap) {
    for (kind, rect) in Lifeline::ALL.into_iter().zip(layout.lifelines) {
        let (fill, stroke) = if state.lifelines.is_used(kind) {
            (DISABLED, [255, 255, 255, 31])
        } else {
            ([255, 255, 255, 31], [255, 255, 255, 56])
        };
        p.glass(rect, 18.0, fill, stroke);
        let (cx, cy) = rect.center();
        p.text(
            cx,
            cy,
            kind.label(),
            outlined(13.0, WHITE, 0.12).aligned(TextAlign::Center, TextBaseline::Middle),
        );
        zones.lifelines.insert(kind, rect);
    }
}

fn draw_next(p: &mut Painter<'_, '_>, layout: &Layout) {
    let rect = layout.next;
    p.glass(rect, 22.0, [255, 255, 255, 31], [255, 255, 255, 56]);
    p.fill(rect, 22.0, AMBER);
    let (cx, cy) = rect.center();
    p.text(
        cx,
        cy,
        "NEXT QUESTION",
        TextStyle::new(15.0, BLACK).aligned(TextAlign::Center, TextBaseline::Middle),
    );
}
