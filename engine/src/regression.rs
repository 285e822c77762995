//! Frame hashing for render determinism checks.
//!
//! Tests hash each rendered RGBA buffer and compare the sequence against a JSON golden under
//! the crate's `tests/goldens/`. A missing golden is recorded on first run; set
//! `QUIZ_UPDATE_GOLDENS=1` to re-record existing ones.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub const UPDATE_GOLDENS_ENV: &str = "QUIZ_UPDATE_GOLDENS";

pub fn rgba_sha256_hex(rgba: &[u8]) -> String {
    hex::encode(Sha256::digest(rgba))
}

/// True when `UPDATE_GOLDENS_ENV` is `1`, `true`, `yes` or `on`.
pub fn update_goldens_enabled() -> bool {
    std::env::var(UPDATE_GOLDENS_ENV)
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

/// `<manifest_dir>/tests/goldens/<name>.json`, with `name` reduced to `[A-Za-z0-9_-]`.
pub fn golden_path(manifest_dir: impl AsRef<Path>, name: &str) -> PathBuf {
    let stem: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    manifest_dir
        .as_ref()
        .join("tests")
        .join("goldens")
        .join(format!("{stem}.json"))
}

/// Hashes of consecutive frames rendered at one surface size.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FrameHashes {
    pub width: u32,
    pub height: u32,
    pub frames: Vec<String>,
}

impl FrameHashes {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            frames: Vec::new(),
        }
    }

    pub fn push(&mut self, rgba: &[u8]) {
        self.frames.push(rgba_sha256_hex(rgba));
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GoldenError {
    #[error("golden io at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("golden {path} is not valid json: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("golden {path} was recorded at {expected:?}, frames are {actual:?}")]
    Size {
        path: PathBuf,
        expected: (u32, u32),
        actual: (u32, u32),
    },
    #[error("golden {path}: frame {frame} differs (expected {expected}, got {actual})")]
    Frame {
        path: PathBuf,
        frame: usize,
        expected: String,
        actual: String,
    },
    #[error("golden {path} has {expected} frames, got {actual}")]
    FrameCount {
        path: PathBuf,
        expected: usize,
        actual: usize,
    },
}

fn write_golden(path: &Path, hashes: &FrameHashes) -> Result<(), GoldenError> {
    let io_err = |source| GoldenError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let text = serde_json::to_string_pretty(hashes).map_err(|source| GoldenError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, text).map_err(io_err)
}

/// Compares `actual` with the golden at `path`, recording it instead when the golden is
/// missing or `update` is set.
pub fn check_golden(path: &Path, actual: &FrameHashes, update: bool) -> Result<(), GoldenError> {
    if update || !path.exists() {
        return write_golden(path, actual);
    }

    let bytes = fs::read(path).map_err(|source| GoldenError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let expected: FrameHashes =
        serde_json::from_slice(&bytes).map_err(|source| GoldenError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    if (expected.width, expected.height) != (actual.width, actual.height) {
        return Err(GoldenError::Size {
            path: path.to_path_buf(),
            expected: (expected.width, expected.height),
            actual: (actual.width, actual.height),
        });
    }
    if expected.frames.len() != actual.frames.len() {
        return Err(GoldenError::FrameCount {
            path: path.to_path_buf(),
            expected: expected.frames.len(),
            actual: actual.frames.len(),
        });
    }
    let first_diff = expected
        .frames
        .iter()
        .zip(&actual.frames)
        .position(|(a, b)| a != b);
    match first_diff {
        Some(frame) => Err(GoldenError::Frame {
            path: path.to_path_buf(),
            frame,
            expected: expected.frames[frame].clone(),
            actual: actual.frames[frame].clone(),
        }),
        None => Ok(()),
    }
}
