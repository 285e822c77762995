//! The single owner of gameplay state.
//!
//! Every operation is total: when its guard does not hold it returns without touching the
//! state or notifying anyone. When it does hold, it builds the next `GameState` in full and
//! publishes it once.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

use crate::bank::ALL_CATEGORIES;
use crate::leaderboard::{LEADERBOARD_CAPACITY, LeaderboardStore, sort_entries};
use crate::mode::{ModeEffect, ModeEvent};
use crate::question::{OptionKey, Question};
use crate::state::{
    DEFAULT_PLAYER_NAME, EXTRA_TIME_SECS, GameState, LeaderboardEntry, Lifeline, RunOptions,
};

pub const CORRECT_BASE_POINTS: u32 = 100;
pub const POINTS_PER_SECOND_LEFT: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuizError {
    #[error("cannot start a run without questions")]
    NoQuestions,
}

/// Wall-clock source for leaderboard timestamps.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&Arc<GameState>)>;

pub struct GameStateMachine {
    state: Arc<GameState>,
    store: Box<dyn LeaderboardStore>,
    clock: Box<dyn Clock>,
    rng: ChaCha8Rng,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_listener: u64,
}

impl GameStateMachine {
    pub fn new(store: impl LeaderboardStore + 'static) -> Self {
        let state = GameState {
            leaderboard: store.load(),
            ..GameState::default()
        };
        Self {
            state: Arc::new(state),
            store: Box::new(store),
            clock: Box::new(SystemClock),
            rng: ChaCha8Rng::seed_from_u64(rand::random()),
            listeners: Vec::new(),
            next_listener: 0,
        }
    }

    pub fn with_rng(mut self, rng: ChaCha8Rng) -> Self {
        self.rng = rng;
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Current snapshot.
    pub fn state(&self) -> Arc<GameState> {
        Arc::clone(&self.state)
    }

    /// Registers `listener` and immediately hands it the current snapshot.
    pub fn subscribe(&mut self, mut listener: impl FnMut(&Arc<GameState>) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_listener);
        self.next_listener += 1;
        listener(&self.state);
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    fn commit(&mut self, next: GameState) {
        if next == *self.state {
            return;
        }
        self.state = Arc::new(next);
        for (_, listener) in &mut self.listeners {
            listener(&self.state);
        }
    }

    pub fn init_game(&mut self, questions: Vec<Question>, opts: RunOptions) -> Result<(), QuizError> {
        if questions.is_empty() {
            return Err(QuizError::NoQuestions);
        }
        let (mode, _) = self.state.mode.handle(ModeEvent::Begin);

        let player_name = match opts.player_name.trim() {
            "" => DEFAULT_PLAYER_NAME.to_string(),
            name => name.to_string(),
        };
        let selected_category = match opts.category.trim() {
            "" => ALL_CATEGORIES.to_string(),
            category => category.to_string(),
        };

        tracing::info!(
            player = %player_name,
            category = %selected_category,
            questions = questions.len(),
            time_per_question = opts.time_per_question,
            "run started"
        );

        let next = GameState {
            mode,
            questions,
            time_per_question: opts.time_per_question,
            remaining_time: opts.time_per_question,
            player_name,
            selected_category,
            category_bg: opts.category_bg,
            leaderboard: self.store.load(),
            ..GameState::default()
        };
        self.commit(next);
        Ok(())
    }

    pub fn decrement_time(&mut self) {
        if !self.state.mode.is_question() {
            return;
        }
        let mut next = (*self.state).clone();
        next.remaining_time = next.remaining_time.saturating_sub(1);
        self.commit(next);
    }

    /// Resolves the current question with no answer. Callers invoke this when the countdown
    /// reaches zero; a second call in the same question is a no-op.
    pub fn handle_time_up(&mut self) {
        if !self.state.mode.is_question() {
            return;
        }
        let (mode, _) = self.state.mode.handle(ModeEvent::Resolve);
        let mut next = (*self.state).clone();
        next.mode = mode;
        next.last_answer = None;
        next.last_answer_correct = Some(false);
        tracing::debug!(index = next.current_index, "time up");
        self.commit(next);
    }

    pub fn register_answer(&mut self, key: OptionKey) {
        if !self.state.mode.is_question() {
            return;
        }
        let Some(question) = self.state.current_question() else {
            return;
        };
        if !question.has_answer(key) {
            return;
        }
        let correct = question.correct == key;
        let gained = if correct {
            CORRECT_BASE_POINTS + self.state.remaining_time * POINTS_PER_SECOND_LEFT
        } else {
            0
        };

        let (mode, _) = self.state.mode.handle(ModeEvent::Resolve);
        let mut next = (*self.state).clone();
        next.mode = mode;
        next.score += gained;
        next.last_answer = Some(key);
        next.last_answer_correct = Some(correct);
        tracing::debug!(index = next.current_index, %key, correct, gained, "answer registered");
        self.commit(next);
    }

    pub fn go_to_next_question(&mut self) {
        if !self.state.mode.is_in_game() {
            return;
        }
        let next = self.advanced((*self.state).clone());
        self.commit(next);
    }

    /// Moves `next` past the current question, ending the run after the last one.
    fn advanced(&mut self, mut next: GameState) -> GameState {
        if next.is_last_question() {
            return self.finished(next);
        }
        let (mode, _) = next.mode.handle(ModeEvent::Advance);
        next.mode = mode;
        next.current_index += 1;
        next.remaining_time = next.time_per_question;
        next.last_answer = None;
        next.last_answer_correct = None;
        next.disabled_answers.clear();
        tracing::debug!(index = next.current_index, "next question");
        next
    }

    fn finished(&mut self, mut next: GameState) -> GameState {
        let (mode, effect) = next.mode.handle(ModeEvent::Finish);
        if effect == ModeEffect::RecordScore {
            let entry = LeaderboardEntry {
                name: if next.player_name.is_empty() {
                    DEFAULT_PLAYER_NAME.to_string()
                } else {
                    next.player_name.clone()
                },
                score: next.score,
                timestamp: self.clock.now(),
            };
            let mut all = self.store.load();
            all.push(entry);
            sort_entries(&mut all);
            all.truncate(LEADERBOARD_CAPACITY);
            self.store.save(&all);
            next.leaderboard = all;
            tracing::info!(player = %next.player_name, score = next.score, "run finished");
        }
        next.mode = mode;
        next.remaining_time = 0;
        next.disabled_answers.clear();
        next
    }

    fn lifeline_available(&self, lifeline: Lifeline) -> bool {
        self.state.mode.is_question() && !self.state.lifelines.is_used(lifeline)
    }

    pub fn use_lifeline(&mut self, lifeline: Lifeline) {
        match lifeline {
            Lifeline::FiftyFifty => self.use_fifty_fifty(),
            Lifeline::Skip => self.use_skip(),
            Lifeline::ExtraTime => self.use_extra_time(),
        }
    }

    /// Disables two randomly chosen wrong answers (fewer when fewer exist).
    pub fn use_fifty_fifty(&mut self) {
        if !self.lifeline_available(Lifeline::FiftyFifty) {
            return;
        }
        let Some(question) = self.state.current_question() else {
            return;
        };
        let mut wrong = question.wrong_keys();
        wrong.shuffle(&mut self.rng);

        let mut next = (*self.state).clone();
        next.lifelines.mark_used(Lifeline::FiftyFifty);
        next.disabled_answers = wrong.into_iter().take(2).collect();
        tracing::debug!(disabled = ?next.disabled_answers, "fifty-fifty used");
        self.commit(next);
    }

    /// Leaves the current question without scoring it.
    pub fn use_skip(&mut self) {
        if !self.lifeline_available(Lifeline::Skip) {
            return;
        }
        let mut next = (*self.state).clone();
        next.lifelines.mark_used(Lifeline::Skip);
        tracing::debug!(index = next.current_index, "skip used");
        let next = self.advanced(next);
        self.commit(next);
    }

    pub fn use_extra_time(&mut self) {
        if !self.lifeline_available(Lifeline::ExtraTime) {
            return;
        }
        let mut next = (*self.state).clone();
        next.lifelines.mark_used(Lifeline::ExtraTime);
        next.remaining_time += EXTRA_TIME_SECS;
        tracing::debug!(remaining = next.remaining_time, "extra time used");
        self.commit(next);
    }

    pub fn show_leaderboard_screen(&mut self) {
        let (mode, _) = self.state.mode.handle(ModeEvent::ShowLeaderboard);
        let mut next = (*self.state).clone();
        next.mode = mode;
        next.leaderboard = self.store.load();
        self.commit(next);
    }

    /// Resets every run field, keeping only the last category choice.
    pub fn back_to_menu(&mut self) {
        let (mode, _) = self.state.mode.handle(ModeEvent::Menu);
        let next = GameState {
            mode,
            selected_category: self.state.selected_category.clone(),
            category_bg: self.state.category_bg.clone(),
            leaderboard: self.store.load(),
            ..GameState::default()
        };
        self.commit(next);
    }
}
