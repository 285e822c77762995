use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::paths::{UserDir, user_file};
use crate::state::LeaderboardEntry;

pub const LEADERBOARD_CAPACITY: usize = 10;

/// Persisted list of recent results.
///
/// `load` never fails: absent or unreadable data is an empty list, and what it returns is
/// sorted and capped. `save` keeps at most
/// `LEADERBOARD_CAPACITY` entries of an already-sorted list.
pub trait LeaderboardStore {
    fn load(&self) -> Vec<LeaderboardEntry>;
    fn save(&mut self, entries: &[LeaderboardEntry]);
}

/// Score descending, then most recent first.
pub fn sort_entries(entries: &mut [LeaderboardEntry]) {
    entries.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| b.timestamp.cmp(&a.timestamp))
    });
}

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `QUIZ_LEADERBOARD_PATH` wins; otherwise the XDG data dir.
    pub fn from_env() -> Self {
        Self::new(user_file("QUIZ_LEADERBOARD_PATH", UserDir::Data, "leaderboard.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_atomic(&self, entries: &[LeaderboardEntry]) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let text = serde_json::to_string_pretty(entries)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, text)?;
        fs::rename(&tmp, &self.path)
    }
}

impl LeaderboardStore for JsonFileStore {
    fn load(&self) -> Vec<LeaderboardEntry> {
        let Ok(bytes) = fs::read(&self.path) else {
            return Vec::new();
        };
        match serde_json::from_slice::<Vec<LeaderboardEntry>>(&bytes) {
            Ok(mut list) => {
                // The file may have been edited by hand.
                sort_entries(&mut list);
                list.truncate(LEADERBOARD_CAPACITY);
                list
            }
            Err(err) => {
                tracing::warn!(path = %self.path.display(), "ignoring corrupt leaderboard: {err}");
                Vec::new()
            }
        }
    }

    fn save(&mut self, entries: &[LeaderboardEntry]) {
        let trimmed = &entries[..entries.len().min(LEADERBOARD_CAPACITY)];
        if let Err(err) = self.write_atomic(trimmed) {
            tracing::warn!(path = %self.path.display(), "failed saving leaderboard: {err}");
        }
    }
}

/// In-memory store. Clones share the same list, so a test can keep a handle after moving
/// the store into a state machine.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<Vec<LeaderboardEntry>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: Vec<LeaderboardEntry>) -> Self {
        Self {
            entries: Arc::new(Mutex::new(entries)),
        }
    }

    pub fn snapshot(&self) -> Vec<LeaderboardEntry> {
        self.load()
    }
}

impl LeaderboardStore for MemoryStore {
    fn load(&self) -> Vec<LeaderboardEntry> {
        match self.entries.lock() {
            Ok(list) => list.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn save(&mut self, entries: &[LeaderboardEntry]) {
        let trimmed = entries[..entries.len().min(LEADERBOARD_CAPACITY)].to_vec();
        match self.entries.lock() {
            Ok(mut list) => *list = trimmed,
            Err(poisoned) => *poisoned.into_inner() = trimmed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use std::time::{SystemTime, UNIX_EPOCH};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).single().expect("valid timestamp")
    }

    fn entry(name: &str, score: u32, secs: i64) -> LeaderboardEntry {
        LeaderboardEntry {
            name: name.into(),
            score,
            timestamp: at(secs),
        }
    }

    fn unique_temp_dir() -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        std::env::temp_dir().join(format!("quiz_leaderboard_store_{nanos}"))
    }

    #[test]
    fn sort_is_score_desc_then_newest_first() {
        let mut list = vec![
            entry("low", 50, 300),
            entry("new", 90, 200),
            entry("old", 90, 100),
        ];
        sort_entries(&mut list);
        let names: Vec<&str> = list.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["new", "old", "low"]);
    }

    #[test]
    fn memory_store_caps_to_capacity() {
        let mut store = MemoryStore::new();
        let list: Vec<_> = (0..15).map(|i| entry("p", 100 - i, i as i64)).collect();
        store.save(&list);
        assert_eq!(store.load().len(), LEADERBOARD_CAPACITY);
        assert_eq!(store.load()[0].score, 100);
    }

    #[test]
    fn file_store_round_trips_and_tolerates_corruption() {
        let dir = unique_temp_dir();
        let path = dir.join("nested").join("leaderboard.json");
        let mut store = JsonFileStore::new(&path);

        assert!(store.load().is_empty(), "absent file reads as empty");

        let list = vec![entry("ada", 300, 10), entry("bob", 120, 20)];
        store.save(&list);
        assert_eq!(store.load(), list);

        let raw = fs::read_to_string(&path).expect("file written");
        assert!(raw.contains("\"date\""));

        fs::write(&path, b"{ definitely not a list").expect("overwrite with junk");
        assert!(store.load().is_empty(), "corrupt file reads as empty");

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn hand_edited_file_loads_sorted_and_capped() {
        let dir = unique_temp_dir();
        let path = dir.join("leaderboard.json");
        fs::create_dir_all(&dir).expect("create dir");
        let unsorted: Vec<_> = (0..12).map(|i| entry("p", 10 * i, i as i64)).collect();
        fs::write(&path, serde_json::to_vec(&unsorted).expect("encode")).expect("write file");

        let loaded = JsonFileStore::new(&path).load();
        assert_eq!(loaded.len(), LEADERBOARD_CAPACITY);
        let scores: Vec<u32> = loaded.iter().map(|e| e.score).collect();
        assert_eq!(scores, vec![110, 100, 90, 80, 70, 60, 50, 40, 30, 20]);

        let _ = fs::remove_dir_all(dir);
    }
}
