//! Draft persistence.
//!
//! A wizard keeps its draft under five fixed keys plus a schema version key.
//! Reads never fail (bad data falls back to defaults) and writes are
//! fire-and-forget: backend errors are logged and swallowed.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::booking::Booking;
use crate::validation::ValidationMap;
use crate::wizard::{SubmissionStatus, Variant};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access draft file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Minimal string key-value backend
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

/// One file per key inside a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key);
        fs::write(&path, value).map_err(|source| StoreError::Io { path, source })
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }
}

/// In-memory backend; clones share the same map
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw value of a key, for inspection
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    pub fn insert_raw(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.raw(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.insert_raw(key, value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}

/// Storage keys of one wizard variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DraftKeys {
    pub booking: &'static str,
    pub validation: &'static str,
    pub active_step: &'static str,
    pub booking_state: &'static str,
    pub current_error: &'static str,
    pub version: &'static str,
    /// Schema version written by this build
    pub current_version: &'static str,
}

impl DraftKeys {
    pub fn for_variant(variant: Variant) -> Self {
        match variant {
            Variant::Attendee => Self {
                booking: "booking",
                validation: "formValidation",
                active_step: "activeStep",
                booking_state: "bookingState",
                current_error: "currentError",
                version: "formVersion",
                current_version: "1.2",
            },
            Variant::Artist => Self {
                booking: "artistBooking",
                validation: "artistFormValidation",
                active_step: "artistActiveStep",
                booking_state: "artistBookingState",
                current_error: "artistCurrentError",
                version: "artistFormVersion",
                current_version: "1.0",
            },
        }
    }

    /// The five draft keys gated by the version key
    pub fn draft_keys(&self) -> [&'static str; 5] {
        [
            self.booking,
            self.validation,
            self.active_step,
            self.booking_state,
            self.current_error,
        ]
    }
}

/// Everything a wizard persists
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    pub booking: Booking,
    pub validation: ValidationMap,
    pub active_step: usize,
    pub status: SubmissionStatus,
    pub current_error: String,
}

/// Namespaced, versioned draft persistence for one wizard
pub struct DraftStore {
    backend: Box<dyn KeyValueStore>,
    keys: DraftKeys,
}

impl DraftStore {
    pub fn new(variant: Variant, backend: impl KeyValueStore + 'static) -> Self {
        Self {
            backend: Box::new(backend),
            keys: DraftKeys::for_variant(variant),
        }
    }

    pub fn keys(&self) -> DraftKeys {
        self.keys
    }

    /// Drop all draft keys if they were written by another schema version.
    ///
    /// Returns true when stale data was discarded.
    pub fn check_version(&mut self) -> bool {
        let stored = self.backend.get(self.keys.version).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to read draft version");
            None
        });

        if stored.as_deref() == Some(self.keys.current_version) {
            return false;
        }

        tracing::info!(
            stored = ?stored,
            current = self.keys.current_version,
            "Draft schema version changed, discarding stored draft"
        );
        self.clear();
        if let Err(e) = self
            .backend
            .set(self.keys.version, self.keys.current_version)
        {
            tracing::warn!(error = %e, "Failed to write draft version");
        }
        stored.is_some()
    }

    /// Read and decode a key, falling back on any problem
    pub fn load<T: DeserializeOwned>(&self, key: &str, fallback: T) -> T {
        match self.backend.get(key) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => value,
                Err(e) => {
                    tracing::debug!(key, error = %e, "Discarding malformed draft value");
                    fallback
                }
            },
            Ok(None) => fallback,
            Err(e) => {
                tracing::warn!(key, error = %e, "Failed to read draft value");
                fallback
            }
        }
    }

    /// Encode and write a key; failures are only logged
    pub fn save<T: Serialize>(&mut self, key: &str, value: &T) {
        let encoded = match serde_json::to_string(value) {
            Ok(encoded) => encoded,
            Err(e) => {
                tracing::warn!(key, error = %e, "Failed to encode draft value");
                return;
            }
        };
        if let Err(e) = self.backend.set(key, &encoded) {
            tracing::warn!(key, error = %e, "Failed to write draft value");
        }
    }

    pub fn load_draft(&self) -> Draft {
        let keys = self.keys;
        Draft {
            booking: self.load(keys.booking, Booking::default()),
            validation: self.load(keys.validation, ValidationMap::new()),
            active_step: self.load(keys.active_step, 0),
            status: self.load(keys.booking_state, SubmissionStatus::default()),
            current_error: self.load(keys.current_error, String::new()),
        }
    }

    pub fn save_draft(&mut self, draft: &Draft) {
        let keys = self.keys;
        self.save(keys.booking, &draft.booking);
        self.save(keys.validation, &draft.validation);
        self.save(keys.active_step, &draft.active_step);
        self.save(keys.booking_state, &draft.status);
        self.save(keys.current_error, &draft.current_error);
    }

    /// Remove the five draft keys
    pub fn clear(&mut self) {
        for key in self.keys.draft_keys() {
            if let Err(e) = self.backend.remove(key) {
                tracing::warn!(key, error = %e, "Failed to remove draft value");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booking::{Field, Selection};
    use tempfile::TempDir;

    fn sample_draft() -> Draft {
        let mut booking = Booking::default();
        booking.first_name = "Max".to_string();
        booking.ticket = Selection::Selected(2);
        booking.material_ids.insert(5);

        let mut validation = ValidationMap::new();
        validation.insert(Field::LastName, "Bitte gib einen Nachnamen an".to_string());

        Draft {
            booking,
            validation,
            active_step: 3,
            status: SubmissionStatus::Submitted { successful: false },
            current_error: "Bitte gib einen Nachnamen an".to_string(),
        }
    }

    #[test]
    fn test_draft_round_trip() {
        let memory = MemoryStore::new();
        let mut store = DraftStore::new(Variant::Attendee, memory.clone());
        store.check_version();
        store.save_draft(&sample_draft());

        let reopened = DraftStore::new(Variant::Attendee, memory);
        assert_eq!(reopened.load_draft(), sample_draft());
    }

    #[test]
    fn test_malformed_values_fall_back() {
        let memory = MemoryStore::new();
        memory.insert_raw("booking", "{\"first_name\": ");
        memory.insert_raw("activeStep", "\"three\"");

        let store = DraftStore::new(Variant::Attendee, memory);
        let draft = store.load_draft();
        assert_eq!(draft.booking, Booking::default());
        assert_eq!(draft.active_step, 0);
    }

    #[test]
    fn test_version_mismatch_clears_all_draft_keys() {
        let memory = MemoryStore::new();
        let mut store = DraftStore::new(Variant::Artist, memory.clone());
        store.save_draft(&sample_draft());
        memory.insert_raw("artistFormVersion", "0.9");

        assert!(store.check_version());
        for key in store.keys().draft_keys() {
            assert!(memory.raw(key).is_none(), "{key} should be cleared");
        }
        assert_eq!(memory.raw("artistFormVersion").as_deref(), Some("1.0"));
        assert_eq!(store.load_draft(), Draft::default());
    }

    #[test]
    fn test_matching_version_keeps_draft() {
        let memory = MemoryStore::new();
        let mut store = DraftStore::new(Variant::Attendee, memory.clone());
        store.check_version();
        store.save_draft(&sample_draft());

        assert!(!store.check_version());
        assert_eq!(store.load_draft(), sample_draft());
    }

    #[test]
    fn test_variants_use_separate_namespaces() {
        let memory = MemoryStore::new();
        let mut attendee = DraftStore::new(Variant::Attendee, memory.clone());
        attendee.check_version();
        attendee.save_draft(&sample_draft());

        let mut artist = DraftStore::new(Variant::Artist, memory);
        artist.check_version();
        assert_eq!(artist.load_draft(), Draft::default());
        assert_eq!(attendee.load_draft(), sample_draft());
    }

    #[test]
    fn test_file_store_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let backend = FileStore::open(temp_dir.path().join("drafts")).unwrap();
        let mut store = DraftStore::new(Variant::Attendee, backend.clone());
        store.check_version();
        store.save_draft(&sample_draft());

        assert!(backend.dir().join("booking.json").exists());
        let reopened = DraftStore::new(Variant::Attendee, backend);
        assert_eq!(reopened.load_draft(), sample_draft());
    }

    #[test]
    fn test_file_store_missing_key_is_none() {
        let temp_dir = TempDir::new().unwrap();
        let mut backend = FileStore::open(temp_dir.path()).unwrap();
        assert!(backend.get("nothing").unwrap().is_none());
        backend.remove("nothing").unwrap();
    }
}
