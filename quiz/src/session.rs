//! Drives a `GameStateMachine` from wall time: the per-question countdown and the deferred
//! auto-advance after feedback. Callers pass `now` on every call; nothing here sleeps.

use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::bank::{DEFAULT_QUESTION_COUNT, PickOptions, QuestionBank, pick_questions};
use crate::machine::{GameStateMachine, QuizError};
use crate::mode::Mode;
use crate::question::Difficulty;
use crate::state::{GameState, RunOptions};
use crate::timers::{AutoAdvance, Countdown, DEFAULT_AUTO_ADVANCE, QuestionKey};
use crate::zones::QuizEvent;

/// What the player chose on the start screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartRequest {
    pub name: String,
    pub difficulty: Difficulty,
    pub category: String,
}

pub struct Session {
    machine: GameStateMachine,
    countdown: Countdown,
    advance: AutoAdvance,
    question_count: usize,
    run: u64,
    rng: ChaCha8Rng,
}

impl Session {
    pub fn new(machine: GameStateMachine) -> Self {
        Self {
            machine,
            countdown: Countdown::default(),
            advance: AutoAdvance::new(DEFAULT_AUTO_ADVANCE),
            question_count: DEFAULT_QUESTION_COUNT,
            run: 0,
            rng: ChaCha8Rng::seed_from_u64(rand::random()),
        }
    }

    pub fn with_auto_advance(mut self, delay: Duration) -> Self {
        self.advance = AutoAdvance::new(delay);
        self
    }

    pub fn with_question_count(mut self, count: usize) -> Self {
        self.question_count = count.max(1);
        self
    }

    /// Seeds question sampling.
    pub fn with_rng(mut self, rng: ChaCha8Rng) -> Self {
        self.rng = rng;
        self
    }

    pub fn machine(&self) -> &GameStateMachine {
        &self.machine
    }

    pub fn machine_mut(&mut self) -> &mut GameStateMachine {
        &mut self.machine
    }

    pub fn state(&self) -> Arc<GameState> {
        self.machine.state()
    }

    pub fn countdown(&self) -> &Countdown {
        &self.countdown
    }

    pub fn advance_pending(&self) -> bool {
        self.advance.is_pending()
    }

    fn key_for(&self, state: &GameState) -> QuestionKey {
        QuestionKey {
            run: self.run,
            index: state.current_index,
        }
    }

    pub fn start_run(
        &mut self,
        bank: &QuestionBank,
        request: StartRequest,
        now: Instant,
    ) -> Result<(), QuizError> {
        let pick = PickOptions {
            difficulty: request.difficulty,
            count: self.question_count,
            category: request.category.clone(),
        };
        let questions = pick_questions(&bank.questions, &pick, &mut self.rng);
        let run = RunOptions {
            player_name: request.name,
            time_per_question: request.difficulty.time_per_question(),
            category_bg: bank.category_bg(&request.category).to_string(),
            category: request.category,
        };
        self.machine.init_game(questions, run)?;

        self.run += 1;
        self.countdown.stop();
        self.advance.cancel();
        self.sync_timers(now);
        Ok(())
    }

    /// Single entry point for pointer and keyboard intents.
    pub fn dispatch(&mut self, event: QuizEvent, now: Instant) {
        let mode = self.machine.state().mode;
        match event {
            QuizEvent::Answer(key) => {
                if mode != Mode::Question {
                    return;
                }
                self.machine.register_answer(key);
                if self.machine.state().mode == Mode::Feedback {
                    self.schedule_advance(now);
                }
            }
            QuizEvent::Lifeline(kind) => self.machine.use_lifeline(kind),
            QuizEvent::Next => {
                if mode != Mode::Feedback {
                    return;
                }
                self.advance.cancel();
                self.machine.go_to_next_question();
            }
        }
        self.sync_timers(now);
    }

    /// Fires every countdown tick and auto-advance that is due at `now`.
    pub fn tick(&mut self, now: Instant) {
        self.sync_timers(now);

        while self.machine.state().mode.is_question() && self.countdown.poll_tick(now) {
            self.machine.decrement_time();
            if self.machine.state().remaining_time == 0 {
                self.machine.handle_time_up();
                self.countdown.stop();
                self.schedule_advance(now);
            }
        }

        if let Some(key) = self.advance.take_due(now) {
            let state = self.machine.state();
            if state.mode == Mode::Feedback && key == self.key_for(&state) {
                tracing::debug!(index = key.index, "auto-advance");
                self.machine.go_to_next_question();
            } else {
                tracing::debug!(?key, "dropping stale auto-advance");
            }
        }

        self.sync_timers(now);
    }

    pub fn show_leaderboard(&mut self) {
        self.countdown.stop();
        self.advance.cancel();
        self.machine.show_leaderboard_screen();
    }

    pub fn back_to_menu(&mut self) {
        self.countdown.stop();
        self.advance.cancel();
        self.machine.back_to_menu();
    }

    fn schedule_advance(&mut self, now: Instant) {
        let key = self.key_for(&self.machine.state());
        self.advance.schedule(key, now);
    }

    /// Keeps the countdown armed for exactly the current question.
    fn sync_timers(&mut self, now: Instant) {
        let state = self.machine.state();
        if !state.mode.is_in_game() {
            self.countdown.stop();
            self.advance.cancel();
            return;
        }
        if state.mode.is_question() {
            let key = self.key_for(&state);
            if self.countdown.armed_for() != Some(key) {
                self.countdown.arm(key, now);
            }
        } else {
            self.countdown.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::QuestionBank;
    use crate::leaderboard::MemoryStore;
    use crate::mode::Screen;
    use crate::question::OptionKey;

    const BANK: &str = r#"{
        "categories": { "science": { "bg": "assets/images/science.png" } },
        "questions": [
            { "id": 1, "question": "one", "answers": {"A":"a","B":"b","C":"c","D":"d"},
              "correct": "A", "difficulty": "easy", "category": "science" },
            { "id": 2, "question": "two", "answers": {"A":"a","B":"b","C":"c","D":"d"},
              "correct": "B", "difficulty": "easy", "category": "science" }
        ]
    }"#;

    fn session() -> Session {
        Session::new(GameStateMachine::new(MemoryStore::new()))
            .with_rng(ChaCha8Rng::seed_from_u64(3))
            .with_question_count(2)
    }

    fn request() -> StartRequest {
        StartRequest {
            name: "ada".into(),
            difficulty: Difficulty::Easy,
            category: "science".into(),
        }
    }

    #[test]
    fn start_run_uses_difficulty_timer_and_category_backdrop() {
        let bank = QuestionBank::from_json(BANK.as_bytes()).expect("bank parses");
        let mut s = session();
        let t0 = Instant::now();
        s.start_run(&bank, request(), t0).expect("run starts");

        let state = s.state();
        assert_eq!(state.screen(), Screen::Game);
        assert_eq!(state.remaining_time, 20);
        assert_eq!(state.questions.len(), 2);
        assert_eq!(state.category_bg, "assets/images/science.png");
        assert!(s.countdown().is_running());
    }

    #[test]
    fn empty_bank_refuses_to_start() {
        let bank = QuestionBank::default();
        let mut s = session();
        assert_eq!(
            s.start_run(&bank, request(), Instant::now()),
            Err(QuizError::NoQuestions)
        );
        assert!(!s.countdown().is_running());
    }

    #[test]
    fn answering_stops_countdown_and_schedules_advance() {
        let bank = QuestionBank::from_json(BANK.as_bytes()).expect("bank parses");
        let mut s = session();
        let t0 = Instant::now();
        s.start_run(&bank, request(), t0).expect("run starts");

        s.dispatch(QuizEvent::Answer(OptionKey::C), t0);
        assert_eq!(s.state().mode, Mode::Feedback);
        assert!(!s.countdown().is_running());
        assert!(s.advance_pending());

        s.tick(t0 + DEFAULT_AUTO_ADVANCE);
        assert_eq!(s.state().mode, Mode::Question);
        assert_eq!(s.state().current_index, 1);
        assert!(s.countdown().is_running());
    }

    #[test]
    fn leaving_the_game_clears_timers() {
        let bank = QuestionBank::from_json(BANK.as_bytes()).expect("bank parses");
        let mut s = session();
        let t0 = Instant::now();
        s.start_run(&bank, request(), t0).expect("run starts");
        s.dispatch(QuizEvent::Answer(OptionKey::A), t0);

        s.show_leaderboard();
        assert!(!s.countdown().is_running());
        assert!(!s.advance_pending());
        assert_eq!(s.state().screen(), Screen::Leaderboard);

        s.tick(t0 + Duration::from_secs(30));
        assert_eq!(s.state().screen(), Screen::Leaderboard);
    }
}
