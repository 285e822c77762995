use std::time::Instant;

use engine::app::{Flow, GameApp, InputFrame};
use engine::graphics::Renderer2d;

use crate::backdrop::ImageLoader;
use crate::bank::QuestionBank;
use crate::input::{KeyAction, map_key};
use crate::render::RenderEngine;
use crate::session::{Session, StartRequest};
use crate::zones::locate;

/// Window front end: keys and clicks go into the session, the session's snapshot is drawn.
pub struct QuizApp<L: ImageLoader> {
    session: Session,
    bank: QuestionBank,
    start: StartRequest,
    render: RenderEngine<L>,
}

impl<L: ImageLoader> QuizApp<L> {
    pub fn new(
        session: Session,
        bank: QuestionBank,
        start: StartRequest,
        render: RenderEngine<L>,
    ) -> Self {
        Self {
            session,
            bank,
            start,
            render,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn render_engine(&self) -> &RenderEngine<L> {
        &self.render
    }

    fn apply(&mut self, action: KeyAction, now: Instant) -> Flow {
        match action {
            KeyAction::Quiz(event) => self.session.dispatch(event, now),
            KeyAction::StartRun => {
                if let Err(err) = self.session.start_run(&self.bank, self.start.clone(), now) {
                    tracing::warn!("cannot start run: {err}");
                }
            }
            KeyAction::ShowLeaderboard => self.session.show_leaderboard(),
            KeyAction::Menu => self.session.back_to_menu(),
            KeyAction::Quit => return Flow::Exit,
        }
        Flow::Continue
    }
}

impl<L: ImageLoader> GameApp for QuizApp<L> {
    fn update(&mut self, input: &InputFrame, now: Instant) -> Flow {
        self.session.tick(now);

        for key in &input.keys_pressed {
            let screen = self.session.state().screen();
            let Some(action) = map_key(*key, screen) else {
                continue;
            };
            if self.apply(action, now) == Flow::Exit {
                return Flow::Exit;
            }
        }

        if let (true, Some(point)) = (input.clicked, input.pointer) {
            let state = self.session.state();
            if let Some(event) = locate(point, self.render.zones(), &state) {
                self.session.dispatch(event, now);
            }
        }

        Flow::Continue
    }

    fn render(&mut self, renderer: &mut dyn Renderer2d) {
        let state = self.session.state();
        self.render.draw(renderer, &state);
    }
}
