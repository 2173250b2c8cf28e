//! Persistence port and its key-value implementation.
//!
//! # Invariants
//! - Every save is a full replace of its slot, never a diff.
//! - Absent or malformed state loads as empty.
//! - A failed backend read is an error, so nothing overwrites state that
//!   was never read.
//! - No resume is represented by a missing key, not a null marker.

use crate::error::PersistError;
use crate::models::JobApplication;
#[cfg(feature = "resume")]
use crate::resume::ResumeDocument;
use crate::storage::KeyValueStorage;

pub const JOBS_KEY: &str = "jobData";
#[cfg(feature = "resume")]
pub const RESUME_KEY: &str = "resume";

/// What the tracker needs from durable storage.
pub trait PersistencePort {
    fn load_records(&self) -> Result<Vec<JobApplication>, PersistError>;
    fn save_records(&self, records: &[JobApplication]) -> Result<(), PersistError>;

    #[cfg(feature = "resume")]
    fn load_resume(&self) -> Result<Option<ResumeDocument>, PersistError>;
    #[cfg(feature = "resume")]
    fn save_resume(&self, doc: &ResumeDocument) -> Result<(), PersistError>;
    #[cfg(feature = "resume")]
    fn clear_resume(&self) -> Result<(), PersistError>;
}

/// Port backed by a `KeyValueStorage`, using the `jobData` and `resume` keys.
pub struct LocalPersistence<S> {
    storage: S,
}

impl<S: KeyValueStorage> LocalPersistence<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Raw stored collection, for export.
    pub fn raw_records(&self) -> Result<Option<String>, PersistError> {
        self.read(JOBS_KEY)
    }

    fn read(&self, key: &'static str) -> Result<Option<String>, PersistError> {
        self.storage.get(key).map_err(|source| {
            log::warn!("event=load module=persistence key={key} status=error error={source}");
            PersistError::Load { key, source }
        })
    }
}

impl<S: KeyValueStorage> PersistencePort for LocalPersistence<S> {
    fn load_records(&self) -> Result<Vec<JobApplication>, PersistError> {
        let Some(raw) = self.read(JOBS_KEY)? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str::<Vec<JobApplication>>(&raw) {
            Ok(records) => {
                log::info!(
                    "event=load module=persistence key={JOBS_KEY} status=ok records={}",
                    records.len()
                );
                Ok(records)
            }
            Err(e) => {
                log::warn!(
                    "event=load module=persistence key={JOBS_KEY} status=malformed error={e}"
                );
                Ok(Vec::new())
            }
        }
    }

    fn save_records(&self, records: &[JobApplication]) -> Result<(), PersistError> {
        let json = serde_json::to_string(records).map_err(|source| PersistError::Serialize {
            key: JOBS_KEY,
            source,
        })?;
        self.storage
            .set(JOBS_KEY, &json)
            .map_err(|source| PersistError::Storage {
                key: JOBS_KEY,
                source,
            })?;
        log::debug!(
            "event=save module=persistence key={JOBS_KEY} status=ok records={}",
            records.len()
        );
        Ok(())
    }

    #[cfg(feature = "resume")]
    fn load_resume(&self) -> Result<Option<ResumeDocument>, PersistError> {
        let Some(raw) = self.read(RESUME_KEY)? else {
            return Ok(None);
        };
        match ResumeDocument::from_data_url(&raw) {
            Ok(doc) => Ok(Some(doc)),
            Err(e) => {
                log::warn!(
                    "event=load module=persistence key={RESUME_KEY} status=malformed error={e}"
                );
                Ok(None)
            }
        }
    }

    #[cfg(feature = "resume")]
    fn save_resume(&self, doc: &ResumeDocument) -> Result<(), PersistError> {
        self.storage
            .set(RESUME_KEY, &doc.to_data_url())
            .map_err(|source| PersistError::Storage {
                key: RESUME_KEY,
                source,
            })
    }

    #[cfg(feature = "resume")]
    fn clear_resume(&self) -> Result<(), PersistError> {
        self.storage
            .remove(RESUME_KEY)
            .map_err(|source| PersistError::Storage {
                key: RESUME_KEY,
                source,
            })
    }
}
