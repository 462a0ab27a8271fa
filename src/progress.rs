//! Per-user progress: completed challenge ids and score.
//!
//! The score is always the number of completed challenges; a completion is
//! worth one point exactly once and is never revoked.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{info, warn};

/// One learner's record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserProgress {
    user: String,
    completed: BTreeSet<u32>,
}

impl UserProgress {
    /// Empty record for `user`.
    #[must_use]
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            completed: BTreeSet::new(),
        }
    }

    /// Who the record belongs to.
    #[must_use]
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Completed ids in ascending order.
    pub fn completed(&self) -> impl Iterator<Item = u32> + '_ {
        self.completed.iter().copied()
    }

    /// Whether `id` has been completed.
    #[must_use]
    pub fn is_completed(&self, id: u32) -> bool {
        self.completed.contains(&id)
    }

    /// One point per completed challenge.
    #[must_use]
    pub fn score(&self) -> u32 {
        u32::try_from(self.completed.len()).unwrap_or(u32::MAX)
    }

    /// Record a completion. Returns `true` when this earned a point.
    pub fn record_completion(&mut self, id: u32) -> bool {
        self.completed.insert(id)
    }
}

/// On-disk shape of one record. `score` is written for readers of the file
/// and recomputed on load.
#[derive(Debug, Serialize, Deserialize)]
struct StoredRecord {
    completed: Vec<u32>,
    score: u32,
}

impl From<&UserProgress> for StoredRecord {
    fn from(progress: &UserProgress) -> Self {
        Self {
            completed: progress.completed().collect(),
            score: progress.score(),
        }
    }
}

/// Where progress lives between sessions.
pub trait ProgressStore {
    /// Load `user`'s record. Never fails: a missing or unreadable store
    /// yields an empty record.
    fn load(&self, user: &str) -> UserProgress;

    /// Persist a record, replacing any earlier one for the same user.
    ///
    /// # Errors
    ///
    /// Propagates any failure to write.
    fn save(&self, progress: &UserProgress) -> io::Result<()>;
}

/// All users' records in one JSON object keyed by user name.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Store backed by `path`; the file is created on first save.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every user's record, still undecoded, so one bad record cannot cost
    /// the others.
    fn read_all(&self) -> io::Result<BTreeMap<String, serde_json::Value>> {
        let text = std::fs::read_to_string(&self.path)?;
        serde_json::from_str(&text).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// Unreadable files are kept beside the store rather than overwritten.
    fn backup_path(&self) -> PathBuf {
        self.path.with_extension("json.bak")
    }
}

impl ProgressStore for JsonFileStore {
    fn load(&self, user: &str) -> UserProgress {
        let records = match self.read_all() {
            Ok(records) => records,
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "progress unreadable, starting fresh");
                BTreeMap::new()
            }
        };
        let mut progress = UserProgress::new(user);
        let Some(raw) = records.get(user) else {
            return progress;
        };
        let record: StoredRecord = match serde_json::from_value(raw.clone()) {
            Ok(record) => record,
            Err(e) => {
                warn!(user, error = %e, "progress record unreadable, starting fresh");
                return progress;
            }
        };
        for id in &record.completed {
            progress.record_completion(*id);
        }
        if record.score != progress.score() {
            warn!(
                user,
                stored = record.score,
                recomputed = progress.score(),
                "stored score disagrees with completions"
            );
        }
        progress
    }

    fn save(&self, progress: &UserProgress) -> io::Result<()> {
        let mut records = match self.read_all() {
            Ok(records) => records,
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                let backup = self.backup_path();
                warn!(
                    path = %self.path.display(),
                    backup = %backup.display(),
                    error = %e,
                    "progress unreadable, moving it aside"
                );
                std::fs::rename(&self.path, &backup)?;
                BTreeMap::new()
            }
        };
        records.insert(
            progress.user().to_string(),
            serde_json::to_value(StoredRecord::from(progress))?,
        );
        let json = serde_json::to_string_pretty(&records)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        info!(
            user = progress.user(),
            score = progress.score(),
            path = %self.path.display(),
            "progress saved"
        );
        Ok(())
    }
}

/// In-process store for tests and `--no-save` sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<BTreeMap<String, UserProgress>>,
}

impl MemoryStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressStore for MemoryStore {
    fn load(&self, user: &str) -> UserProgress {
        self.records
            .lock()
            .ok()
            .and_then(|records| records.get(user).cloned())
            .unwrap_or_else(|| UserProgress::new(user))
    }

    fn save(&self, progress: &UserProgress) -> io::Result<()> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| io::Error::other("progress store lock poisoned"))?;
        records.insert(progress.user().to_string(), progress.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_score_counts_distinct_completions() {
        let mut progress = UserProgress::new("ada");
        assert!(progress.record_completion(3));
        assert!(progress.record_completion(1));
        assert!(!progress.record_completion(3));
        assert_eq!(progress.score(), 2);
        assert_eq!(progress.completed().collect::<Vec<_>>(), vec![1, 3]);
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("progress.json"));
        let progress = store.load("ada");
        assert_eq!(progress.user(), "ada");
        assert_eq!(progress.score(), 0);
    }

    #[test]
    fn test_corrupt_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("progress.json");
        std::fs::write(&path, "not json").unwrap();
        let store = JsonFileStore::new(&path);
        assert_eq!(store.load("ada").score(), 0);
    }

    #[test]
    fn test_round_trip_keeps_other_users() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("progress.json");
        let store = JsonFileStore::new(&path);

        let mut ada = UserProgress::new("ada");
        ada.record_completion(2);
        ada.record_completion(1);
        store.save(&ada).unwrap();

        let mut bob = UserProgress::new("bob");
        bob.record_completion(5);
        store.save(&bob).unwrap();

        assert_eq!(store.load("ada"), ada);
        assert_eq!(store.load("bob"), bob);

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["ada"]["completed"], serde_json::json!([1, 2]));
        assert_eq!(json["ada"]["score"], 2);
    }

    #[test]
    fn test_load_recomputes_score() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("progress.json");
        std::fs::write(&path, r#"{"ada": {"completed": [1, 1, 4], "score": 99}}"#).unwrap();
        let progress = JsonFileStore::new(&path).load("ada");
        assert_eq!(progress.score(), 2);
    }

    #[test]
    fn test_bad_record_does_not_cost_other_users() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("progress.json");
        std::fs::write(&path, r#"{"bob": {"completed": [1], "score": -1}}"#).unwrap();
        let store = JsonFileStore::new(&path);
        assert_eq!(store.load("bob").score(), 0);

        let mut ada = UserProgress::new("ada");
        ada.record_completion(2);
        store.save(&ada).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["bob"]["score"], -1);
        assert_eq!(json["ada"]["completed"], serde_json::json!([2]));
        assert!(!store.backup_path().exists());
    }

    #[test]
    fn test_unreadable_file_is_kept_aside_on_save() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("progress.json");
        std::fs::write(&path, "not json").unwrap();
        let store = JsonFileStore::new(&path);

        store.save(&UserProgress::new("ada")).unwrap();
        assert_eq!(
            std::fs::read_to_string(store.backup_path()).unwrap(),
            "not json"
        );
        assert_eq!(store.load("ada").user(), "ada");
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["ada"]["score"], 0);
    }

    #[test]
    fn test_save_into_unwritable_location_fails() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "").unwrap();
        let store = JsonFileStore::new(blocker.join("progress.json"));
        assert!(store.save(&UserProgress::new("ada")).is_err());
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new();
        assert_eq!(store.load("ada").score(), 0);
        let mut ada = UserProgress::new("ada");
        ada.record_completion(7);
        store.save(&ada).unwrap();
        assert_eq!(store.load("ada"), ada);
    }
}
