use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Answer slot. Ordering is the display order of the answer grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OptionKey {
    A,
    B,
    C,
    D,
}

impl OptionKey {
    pub const ALL: [OptionKey; 4] = [OptionKey::A, OptionKey::B, OptionKey::C, OptionKey::D];

    /// Zero-based position in the 2x2 grid (row-major).
    pub fn index(self) -> usize {
        match self {
            OptionKey::A => 0,
            OptionKey::B => 1,
            OptionKey::C => 2,
            OptionKey::D => 3,
        }
    }

    pub fn from_index(i: usize) -> Option<Self> {
        Self::ALL.get(i).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OptionKey::A => "A",
            OptionKey::B => "B",
            OptionKey::C => "C",
            OptionKey::D => "D",
        }
    }
}

impl fmt::Display for OptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    /// Seconds on the clock for each question.
    pub fn time_per_question(self) -> u32 {
        match self {
            Difficulty::Easy => 20,
            Difficulty::Normal => 15,
            Difficulty::Hard => 10,
        }
    }
}

impl std::str::FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "normal" => Ok(Difficulty::Normal),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty '{other}' (expected easy, normal or hard)")),
        }
    }
}

/// Banks in the wild use both numeric and string ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuestionId {
    Number(u64),
    Text(String),
}

impl Default for QuestionId {
    fn default() -> Self {
        QuestionId::Number(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    #[serde(default)]
    pub id: QuestionId,
    #[serde(rename = "question")]
    pub text: String,
    pub answers: BTreeMap<OptionKey, String>,
    pub correct: OptionKey,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub category: String,
}

impl Question {
    pub fn has_answer(&self, key: OptionKey) -> bool {
        self.answers.contains_key(&key)
    }

    pub fn wrong_keys(&self) -> Vec<OptionKey> {
        self.answers
            .keys()
            .copied()
            .filter(|k| *k != self.correct)
            .collect()
    }
}
