//! Whole-document JSON persistence.
//!
//! Each store is a single JSON file read and written in full. A
//! `parking_lot::RwLock` serializes writers: `mutate` applies the closure to
//! a copy of the document, persists the copy, then commits it in memory, all
//! under the write lock. A closure that fails leaves memory and disk
//! untouched, and racing admin writes cannot interleave at sub-document
//! granularity.

use adpulse_core::documents::{AnalyticsDocument, EntityDocument};
use adpulse_core::AdPulseResult;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Inventory store: banners, clients, campaigns, placements, audit log.
pub type EntityStore = DocumentStore<EntityDocument>;
/// Event store: impression/click rings and the daily rollup.
pub type AnalyticsStore = DocumentStore<AnalyticsDocument>;

pub struct DocumentStore<T> {
    path: PathBuf,
    doc: RwLock<T>,
}

impl<T> DocumentStore<T>
where
    T: Clone + Default + Serialize + DeserializeOwned,
{
    /// Open the document at `path`, seeding it with `T::default()` when the
    /// file does not exist yet.
    pub fn open(path: impl AsRef<Path>) -> AdPulseResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let doc = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            serde_json::from_str(&raw)?
        } else {
            let seeded = T::default();
            persist(&path, &seeded)?;
            info!(path = %path.display(), "Seeded new document store");
            seeded
        };
        Ok(Self {
            path,
            doc: RwLock::new(doc),
        })
    }

    /// Shared read access. Delivery selection runs entirely through this and
    /// never blocks other readers.
    pub fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.doc.read())
    }

    /// Exclusive mutation. The closure receives a copy of the document;
    /// only when it succeeds is the copy persisted and swapped in, so a
    /// partially-applied failed mutation can never leak.
    pub fn mutate<R>(&self, f: impl FnOnce(&mut T) -> AdPulseResult<R>) -> AdPulseResult<R> {
        let mut guard = self.doc.write();
        let mut draft = guard.clone();
        let out = f(&mut draft)?;
        persist(&self.path, &draft)?;
        *guard = draft;
        debug!(path = %self.path.display(), "Document persisted");
        Ok(out)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn persist<T: Serialize>(path: &Path, doc: &T) -> AdPulseResult<()> {
    let raw = serde_json::to_vec_pretty(doc)?;
    fs::write(path, raw)?;
    Ok(())
}

// ─── Tests ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use adpulse_core::AdPulseError;

    #[test]
    fn test_open_seeds_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("banners.json");
        let store = EntityStore::open(&path).unwrap();
        assert!(path.exists(), "seed document written on first open");
        assert_eq!(store.read(|doc| doc.placements.len()), 7);
        assert!(store.read(|doc| doc.banners.is_empty()));
    }

    #[test]
    fn test_mutation_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("banners.json");
        {
            let store = EntityStore::open(&path).unwrap();
            store
                .mutate(|doc| {
                    doc.settings.frequency_cap = 9;
                    Ok(())
                })
                .unwrap();
        }
        let reopened = EntityStore::open(&path).unwrap();
        assert_eq!(reopened.read(|doc| doc.settings.frequency_cap), 9);
    }

    #[test]
    fn test_failed_mutation_leaves_document_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("banners.json");
        let store = EntityStore::open(&path).unwrap();

        let result: AdPulseResult<()> = store.mutate(|doc| {
            // Mutate first, then fail — the draft must be discarded whole.
            doc.placements.clear();
            Err(AdPulseError::Validation("nope".into()))
        });
        assert!(result.is_err());
        assert_eq!(store.read(|doc| doc.placements.len()), 7);

        let reopened = EntityStore::open(&path).unwrap();
        assert_eq!(reopened.read(|doc| doc.placements.len()), 7);
    }

    #[test]
    fn test_analytics_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("analytics.json");
        let store = AnalyticsStore::open(&path).unwrap();
        store
            .mutate(|doc| {
                doc.day_mut("2024-03-01").impressions = 42;
                Ok(())
            })
            .unwrap();

        let reopened = AnalyticsStore::open(&path).unwrap();
        assert_eq!(
            reopened.read(|doc| doc.day("2024-03-01").map(|d| d.impressions)),
            Some(42)
        );
    }
}
