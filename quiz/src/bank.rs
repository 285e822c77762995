use std::collections::BTreeMap;
use std::path::Path;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::question::{Difficulty, Question};

pub const ALL_CATEGORIES: &str = "all";
pub const DEFAULT_QUESTION_COUNT: usize = 10;

#[derive(Debug, thiserror::Error)]
pub enum BankError {
    #[error("failed reading question bank {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed parsing question bank: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    #[serde(default)]
    pub bg: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionBank {
    #[serde(default)]
    pub categories: BTreeMap<String, Category>,
    #[serde(default)]
    pub questions: Vec<Question>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawBank {
    Bare(Vec<Question>),
    Full(QuestionBank),
}

impl QuestionBank {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, BankError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| BankError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let bank = Self::from_json(&bytes)?;
        tracing::info!(
            path = %path.display(),
            questions = bank.questions.len(),
            categories = bank.categories.len(),
            "question bank loaded"
        );
        Ok(bank)
    }

    /// Accepts either `{ "categories": {...}, "questions": [...] }` or a bare question array.
    pub fn from_json(bytes: &[u8]) -> Result<Self, BankError> {
        let raw: RawBank = serde_json::from_slice(bytes)?;
        Ok(match raw {
            RawBank::Bare(questions) => QuestionBank {
                categories: BTreeMap::new(),
                questions,
            },
            RawBank::Full(bank) => bank,
        })
    }

    /// Backdrop identifier for a category, or `""` when the category is unknown.
    pub fn category_bg(&self, name: &str) -> &str {
        self.categories
            .get(name)
            .map(|c| c.bg.as_str())
            .unwrap_or("")
    }

    pub fn category_names(&self) -> Vec<&str> {
        self.categories.keys().map(String::as_str).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickOptions {
    pub difficulty: Difficulty,
    pub count: usize,
    /// `"all"` or empty disables the category filter.
    pub category: String,
}

impl Default for PickOptions {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Normal,
            count: DEFAULT_QUESTION_COUNT,
            category: ALL_CATEGORIES.to_string(),
        }
    }
}

fn category_matches(filter: &str, q: &Question) -> bool {
    filter.is_empty() || filter == ALL_CATEGORIES || q.category == filter
}

/// Samples up to `count` questions, widening the filter when the pool is too small:
/// difficulty + category, then category only, then the whole bank.
pub fn pick_questions<R: Rng + ?Sized>(
    all: &[Question],
    opts: &PickOptions,
    rng: &mut R,
) -> Vec<Question> {
    let category = opts.category.as_str();

    let mut pool: Vec<&Question> = all
        .iter()
        .filter(|q| q.difficulty == opts.difficulty && category_matches(category, q))
        .collect();
    if pool.len() < opts.count {
        pool = all.iter().filter(|q| category_matches(category, q)).collect();
    }
    if pool.len() < opts.count {
        pool = all.iter().collect();
    }

    pool.shuffle(rng);
    pool.into_iter().take(opts.count).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::question::{OptionKey, QuestionId};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn q(id: u64, difficulty: Difficulty, category: &str) -> Question {
        Question {
            id: QuestionId::Number(id),
            text: format!("question {id}"),
            answers: [(OptionKey::A, "a".to_string()), (OptionKey::B, "b".to_string())]
                .into_iter()
                .collect(),
            correct: OptionKey::A,
            difficulty,
            category: category.to_string(),
        }
    }

    fn ids(qs: &[Question]) -> Vec<u64> {
        let mut v: Vec<u64> = qs
            .iter()
            .map(|q| match q.id {
                QuestionId::Number(n) => n,
                QuestionId::Text(_) => u64::MAX,
            })
            .collect();
        v.sort();
        v
    }

    fn sample_bank() -> Vec<Question> {
        vec![
            q(1, Difficulty::Easy, "history"),
            q(2, Difficulty::Easy, "history"),
            q(3, Difficulty::Hard, "history"),
            q(4, Difficulty::Easy, "science"),
            q(5, Difficulty::Hard, "science"),
        ]
    }

    #[test]
    fn exact_filter_is_used_when_large_enough() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let opts = PickOptions {
            difficulty: Difficulty::Easy,
            count: 2,
            category: "history".into(),
        };
        let picked = pick_questions(&sample_bank(), &opts, &mut rng);
        assert_eq!(ids(&picked), vec![1, 2]);
    }

    #[test]
    fn short_pool_drops_difficulty_but_keeps_category() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let opts = PickOptions {
            difficulty: Difficulty::Hard,
            count: 3,
            category: "history".into(),
        };
        let picked = pick_questions(&sample_bank(), &opts, &mut rng);
        assert_eq!(ids(&picked), vec![1, 2, 3]);
    }

    #[test]
    fn still_short_pool_falls_back_to_whole_bank() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let opts = PickOptions {
            difficulty: Difficulty::Hard,
            count: 4,
            category: "science".into(),
        };
        let picked = pick_questions(&sample_bank(), &opts, &mut rng);
        assert_eq!(picked.len(), 4);
    }

    #[test]
    fn small_bank_returns_fewer_than_requested() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let opts = PickOptions {
            count: 10,
            ..PickOptions::default()
        };
        let picked = pick_questions(&sample_bank(), &opts, &mut rng);
        assert_eq!(ids(&picked), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn same_seed_gives_same_order() {
        let opts = PickOptions {
            count: 5,
            ..PickOptions::default()
        };
        let a = pick_questions(&sample_bank(), &opts, &mut ChaCha8Rng::seed_from_u64(9));
        let b = pick_questions(&sample_bank(), &opts, &mut ChaCha8Rng::seed_from_u64(9));
        assert_eq!(a, b);
    }

    #[test]
    fn bank_accepts_object_and_bare_array() {
        let full = QuestionBank::from_json(
            br#"{"categories":{"history":{"bg":"assets/images/history.png"}},
                 "questions":[{"id":1,"question":"?","answers":{"A":"x","B":"y"},"correct":"A"}]}"#,
        )
        .expect("object bank should parse");
        assert_eq!(full.questions.len(), 1);
        assert_eq!(full.category_bg("history"), "assets/images/history.png");
        assert_eq!(full.category_bg("unknown"), "");
        assert_eq!(full.category_names(), vec!["history"]);

        let bare = QuestionBank::from_json(
            br#"[{"id":1,"question":"?","answers":{"A":"x","B":"y"},"correct":"B"}]"#,
        )
        .expect("array bank should parse");
        assert_eq!(bare.questions.len(), 1);
        assert!(bare.categories.is_empty());

        let empty = QuestionBank::from_json(b"{}").expect("empty object should parse");
        assert!(empty.questions.is_empty());
    }

    #[test]
    fn malformed_bank_is_a_parse_error() {
        assert!(matches!(
            QuestionBank::from_json(b"{not json"),
            Err(BankError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        assert!(matches!(
            QuestionBank::load("/definitely/not/here/data.json"),
            Err(BankError::Io { .. })
        ));
    }
}
