//! The persistent bot state: all repop timers and the score ledger.
//!
//! The whole document lives in memory behind a single lock. Every mutation
//! is followed by a full snapshot written to the state file.
mod file;

use crate::archi::{MemberId, PointPolicy, ScoreLedger, TimerRegistry};

use chrono::{DateTime, FixedOffset};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to access state file: {0}")]
    Io(#[from] io::Error),
    #[error("invalid state file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Everything the bot remembers between restarts.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Document {
    pub archis: TimerRegistry,
    pub scores: ScoreLedger,
}

#[derive(Serialize)]
struct DocumentRef<'a> {
    archis: &'a TimerRegistry,
    daily: &'a BTreeMap<String, BTreeMap<MemberId, i64>>,
    weekly: &'a BTreeMap<MemberId, i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    week_start: Option<DateTime<FixedOffset>>,
}

#[derive(Deserialize)]
struct DocumentOwned {
    #[serde(default)]
    archis: TimerRegistry,
    #[serde(default)]
    daily: BTreeMap<String, BTreeMap<MemberId, i64>>,
    #[serde(default)]
    weekly: BTreeMap<MemberId, i64>,
    #[serde(default)]
    week_start: Option<DateTime<FixedOffset>>,
}

impl Document {
    fn to_json(&self) -> Result<Vec<u8>> {
        let doc = DocumentRef {
            archis: &self.archis,
            daily: &self.scores.daily,
            weekly: &self.scores.weekly,
            week_start: self.scores.week_start,
        };

        Ok(serde_json::to_vec_pretty(&doc)?)
    }

    fn from_json(buf: &[u8]) -> Result<Self> {
        let doc: DocumentOwned = serde_json::from_slice(buf)?;

        let mut scores = ScoreLedger::default();
        scores.daily = doc.daily;
        scores.weekly = doc.weekly;
        scores.week_start = doc.week_start;

        Ok(Self {
            archis: doc.archis,
            scores,
        })
    }
}

/// A shared handle to the [`Document`]. Clones refer to the same state.
#[derive(Clone, Debug, Default)]
pub struct Store {
    inner: Arc<Mutex<Document>>,
    path: Option<PathBuf>,
}

impl Store {
    /// Creates a new `Store` that is never written to disk.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Opens the state file at `path`. A missing file starts an empty state,
    /// the file is created on the first write.
    pub fn open<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref().to_path_buf();

        let document = match file::read(&path)? {
            Some(buf) => {
                let document = Document::from_json(&buf)?;
                log::info!(
                    "[STORE] Loaded {} timers from {}",
                    document.archis.len(),
                    path.display()
                );
                document
            }
            None => {
                log::info!("[STORE] No state at {}, starting empty", path.display());
                Document::default()
            }
        };

        Ok(Self {
            inner: Arc::new(Mutex::new(document)),
            path: Some(path),
        })
    }

    /// Applies the runtime settings that are not part of the persisted state.
    pub fn configure<I, T>(&self, policy: PointPolicy, rare: I)
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let mut document = self.inner.lock();
        document.scores.set_policy(policy);
        document.archis.set_rare(rare);
    }

    /// Runs `f` with read access to the document.
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Document) -> R,
    {
        let document = self.inner.lock();
        f(&document)
    }

    /// Runs `f` with write access to the document and writes a snapshot
    /// afterwards. No other handler observes the document between `f` and the
    /// snapshot. If the snapshot fails the changes of `f` are rolled back.
    pub fn write<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut Document) -> R,
    {
        let mut document = self.inner.lock();

        // Only file-backed stores can fail to save.
        let backup = self.path.as_ref().map(|_| document.clone());
        let res = f(&mut document);

        // The snapshot is written and synced on the calling thread while the
        // lock is held. The document stays small.
        if let Err(err) = self.save(&document) {
            if let Some(backup) = backup {
                *document = backup;
            }
            return Err(err);
        }

        Ok(res)
    }

    /// Writes a snapshot of the current state.
    pub fn persist(&self) -> Result<()> {
        let document = self.inner.lock();
        self.save(&document)
    }

    fn save(&self, document: &Document) -> Result<()> {
        if let Some(path) = &self.path {
            file::write(path, &document.to_json()?)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Document, Error, Store};
    use crate::archi::{Capturer, PointPolicy};

    use chrono::DateTime;
    use tempfile::tempdir;

    #[test]
    fn test_document_format() {
        let doc = Document::from_json(
            br#"{
                "archis": {"bulgig": {"time": "2024-01-01T10:00:00+01:00", "reporter": "Robin", "reporter_id": 111}},
                "daily": {"2024-01-01": {"111": 5}},
                "weekly": {"111": 5}
            }"#,
        )
        .unwrap();

        assert_eq!(doc.archis.len(), 1);
        assert_eq!(doc.scores.daily_total("2024-01-01"), 5);
        assert_eq!(doc.scores.weekly.get(&111), Some(&5));

        let json: serde_json::Value = serde_json::from_slice(&doc.to_json().unwrap()).unwrap();
        assert!(json["archis"]["bulgig"].is_object());
        assert_eq!(json["daily"]["2024-01-01"]["111"], 5);
        assert_eq!(json["weekly"]["111"], 5);
    }

    #[test]
    fn test_document_missing_sections() {
        let doc = Document::from_json(b"{}").unwrap();
        assert_eq!(doc, Document::default());
    }

    #[test]
    fn test_store_persists_writes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("archis.json");
        let now = DateTime::parse_from_rfc3339("2024-01-01T10:00:00+01:00").unwrap();

        let store = Store::open(&path).unwrap();
        store.configure(PointPolicy::default(), ["bulgig"]);
        store
            .write(|doc| {
                let (timer, _) = doc
                    .archis
                    .register_capture("bulgig", Capturer::member(111, "Robin"), now);
                doc.scores.award(111, "2024-01-01", timer.is_rare);
            })
            .unwrap();

        let reopened = Store::open(&path).unwrap();
        reopened.read(|doc| {
            let timer = doc.archis.get("bulgig").unwrap();
            assert!(timer.is_rare);
            assert_eq!(timer.capture_time, now);
            assert_eq!(doc.scores.weekly.get(&111), Some(&5));
        });
    }

    #[test]
    fn test_store_open_invalid() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("archis.json");
        std::fs::write(&path, b"not json").unwrap();

        assert!(matches!(Store::open(&path), Err(Error::Json(_))));
    }

    #[test]
    fn test_failed_write_rolls_back() {
        let dir = tempdir().unwrap();
        // The parent directory does not exist, every snapshot fails.
        let store = Store::open(dir.path().join("missing").join("archis.json")).unwrap();

        for _ in 0..2 {
            let res = store.write(|doc| doc.scores.award(1, "2024-01-01", true));
            assert!(matches!(res, Err(Error::Io(_))));
        }

        assert_eq!(store.read(|doc| doc.clone()), Document::default());
    }

    #[test]
    fn test_week_start_persisted() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("archis.json");
        let now = DateTime::parse_from_rfc3339("2024-01-07T21:00:00+01:00").unwrap();

        let store = Store::open(&path).unwrap();
        store.write(|doc| doc.scores.reset_weekly(now)).unwrap();

        let reopened = Store::open(&path).unwrap();
        assert_eq!(reopened.read(|doc| doc.scores.week_start), Some(now));
    }

    #[test]
    fn test_in_memory_store() {
        let store = Store::in_memory();
        let clone = store.clone();

        clone
            .write(|doc| doc.scores.weekly.insert(1, 3))
            .unwrap();

        assert_eq!(store.read(|doc| doc.scores.weekly.get(&1).copied()), Some(3));
    }
}
