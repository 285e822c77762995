use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::bank::ALL_CATEGORIES;
use crate::mode::{Mode, Screen, Status};
use crate::question::{OptionKey, Question};

pub const EXTRA_TIME_SECS: u32 = 5;
pub const DEFAULT_PLAYER_NAME: &str = "Anonymous";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Lifeline {
    FiftyFifty,
    Skip,
    ExtraTime,
}

impl Lifeline {
    pub const ALL: [Lifeline; 3] = [Lifeline::FiftyFifty, Lifeline::Skip, Lifeline::ExtraTime];

    pub fn label(self) -> &'static str {
        match self {
            Lifeline::FiftyFifty => "50-50",
            Lifeline::Skip => "SKIP",
            Lifeline::ExtraTime => "+5 S",
        }
    }
}

/// One-shot latches, reset only by a new run or by returning to the menu.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lifelines {
    pub fifty_fifty_used: bool,
    pub skip_used: bool,
    pub extra_time_used: bool,
}

impl Lifelines {
    pub fn is_used(&self, lifeline: Lifeline) -> bool {
        match lifeline {
            Lifeline::FiftyFifty => self.fifty_fifty_used,
            Lifeline::Skip => self.skip_used,
            Lifeline::ExtraTime => self.extra_time_used,
        }
    }

    pub fn mark_used(&mut self, lifeline: Lifeline) {
        match lifeline {
            Lifeline::FiftyFifty => self.fifty_fifty_used = true,
            Lifeline::Skip => self.skip_used = true,
            Lifeline::ExtraTime => self.extra_time_used = true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub name: String,
    pub score: u32,
    #[serde(rename = "date")]
    pub timestamp: DateTime<Utc>,
}

/// Configuration for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub player_name: String,
    pub time_per_question: u32,
    pub category: String,
    pub category_bg: String,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            player_name: DEFAULT_PLAYER_NAME.to_string(),
            time_per_question: 15,
            category: ALL_CATEGORIES.to_string(),
            category_bg: String::new(),
        }
    }
}

/// The whole gameplay aggregate. Every transition builds a new value; listeners receive it
/// behind an `Arc` and can never mutate it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameState {
    pub mode: Mode,
    pub questions: Vec<Question>,
    pub current_index: usize,
    pub time_per_question: u32,
    pub remaining_time: u32,
    pub score: u32,
    pub player_name: String,
    pub selected_category: String,
    pub category_bg: String,
    pub last_answer: Option<OptionKey>,
    pub last_answer_correct: Option<bool>,
    pub disabled_answers: BTreeSet<OptionKey>,
    pub lifelines: Lifelines,
    pub leaderboard: Vec<LeaderboardEntry>,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            mode: Mode::Start,
            questions: Vec::new(),
            current_index: 0,
            time_per_question: 15,
            remaining_time: 0,
            score: 0,
            player_name: String::new(),
            selected_category: ALL_CATEGORIES.to_string(),
            category_bg: String::new(),
            last_answer: None,
            last_answer_correct: None,
            disabled_answers: BTreeSet::new(),
            lifelines: Lifelines::default(),
            leaderboard: Vec::new(),
        }
    }
}

impl GameState {
    pub fn screen(&self) -> Screen {
        self.mode.screen()
    }

    pub fn status(&self) -> Status {
        self.mode.status()
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current_index)
    }

    pub fn is_last_question(&self) -> bool {
        self.current_index + 1 >= self.questions.len()
    }

    /// Filled fraction of the countdown bar.
    pub fn time_fraction(&self) -> f32 {
        if self.time_per_question == 0 {
            return 0.0;
        }
        (self.remaining_time as f32 / self.time_per_question as f32).clamp(0.0, 1.0)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifeline_latches_track_each_kind() {
        let mut l = Lifelines::default();
        assert!(Lifeline::ALL.iter().all(|k| !l.is_used(*k)));
        l.mark_used(Lifeline::Skip);
        assert!(l.is_used(Lifeline::Skip));
        assert!(!l.is_used(Lifeline::FiftyFifty));
        assert!(!l.is_used(Lifeline::ExtraTime));
    }

    #[test]
    fn time_fraction_is_clamped() {
        let mut s = GameState {
            time_per_question: 10,
            remaining_time: 15,
            ..GameState::default()
        };
        assert_eq!(s.time_fraction(), 1.0);
        s.remaining_time = 5;
        assert_eq!(s.time_fraction(), 0.5);
        s.time_per_question = 0;
        assert_eq!(s.time_fraction(), 0.0);
    }

    #[test]
    fn leaderboard_entry_uses_date_key() {
        let entry = LeaderboardEntry {
            name: "ada".into(),
            score: 120,
            timestamp: "2024-05-01T10:00:00Z".parse().expect("valid timestamp"),
        };
        let json = serde_json::to_value(&entry).expect("entry serializes");
        assert_eq!(json["date"], "2024-05-01T10:00:00Z");
        assert_eq!(json["score"], 120);
    }

    #[test]
    fn snapshot_serializes_mode_and_fields() {
        let json = GameState::default().to_json_pretty().expect("state serializes");
        assert!(json.contains("\"mode\": \"Start\""));
        assert!(json.contains("\"selected_category\": \"all\""));
    }
}
