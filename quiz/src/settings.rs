use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::backdrop::DEFAULT_BACKDROP;
use crate::bank::DEFAULT_QUESTION_COUNT;
use crate::paths::{UserDir, user_file};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct WindowSettings {
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            width: 960,
            height: 720,
            vsync: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuizSettings {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default = "default_question_count")]
    pub question_count: usize,
    #[serde(default = "default_auto_advance_ms")]
    pub auto_advance_ms: u64,
    #[serde(default = "default_backdrop")]
    pub default_backdrop: String,
    #[serde(default = "default_assets_dir")]
    pub assets_dir: PathBuf,
    #[serde(default = "default_bank_path")]
    pub bank_path: PathBuf,
    #[serde(default)]
    pub window: WindowSettings,
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            version: default_version(),
            question_count: default_question_count(),
            auto_advance_ms: default_auto_advance_ms(),
            default_backdrop: default_backdrop(),
            assets_dir: default_assets_dir(),
            bank_path: default_bank_path(),
            window: WindowSettings::default(),
        }
    }
}

impl QuizSettings {
    pub fn sanitized(mut self) -> Self {
        self.version = default_version();
        self.question_count = self.question_count.clamp(1, 50);
        self.auto_advance_ms = self.auto_advance_ms.clamp(250, 10_000);
        if self.default_backdrop.trim().is_empty() {
            self.default_backdrop = default_backdrop();
        }
        self.window.width = self.window.width.max(320);
        self.window.height = self.window.height.max(240);
        self
    }

    pub fn auto_advance(&self) -> Duration {
        Duration::from_millis(self.auto_advance_ms)
    }
}

fn default_version() -> u32 {
    1
}

fn default_question_count() -> usize {
    DEFAULT_QUESTION_COUNT
}

fn default_auto_advance_ms() -> u64 {
    1500
}

fn default_backdrop() -> String {
    DEFAULT_BACKDROP.to_string()
}

fn default_assets_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_bank_path() -> PathBuf {
    PathBuf::from("public/data.json")
}

#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `QUIZ_SETTINGS_PATH` wins; otherwise the XDG config dir.
    pub fn from_env() -> Self {
        Self::new(user_file("QUIZ_SETTINGS_PATH", UserDir::Config, "settings.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing or unreadable settings fall back to defaults.
    pub fn load(&self) -> QuizSettings {
        let Ok(bytes) = fs::read(&self.path) else {
            return QuizSettings::default();
        };
        match serde_json::from_slice::<QuizSettings>(&bytes) {
            Ok(settings) => settings.sanitized(),
            Err(err) => {
                tracing::warn!(path = %self.path.display(), "ignoring corrupt settings: {err}");
                QuizSettings::default()
            }
        }
    }
}
