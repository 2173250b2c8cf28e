use crate::analytics::StatusBreakdown;
use crate::error::{PersistError, StoreError};
use crate::models::{JobApplication, NewApplication, Status};
use crate::persistence::PersistencePort;
#[cfg(feature = "resume")]
use crate::resume::ResumeDocument;
use crate::store::{RecordStore, ViewCache, ViewQuery};

/// Result of a mutation: the in-memory change always lands, `warning` says
/// whether writing it through to storage failed.
#[derive(Debug)]
#[must_use]
pub struct Synced<T> {
    pub value: T,
    pub warning: Option<PersistError>,
}

impl<T> Synced<T> {
    fn clean(value: T) -> Self {
        Self {
            value,
            warning: None,
        }
    }

    fn with(value: T, written: Result<(), PersistError>) -> Self {
        Self {
            value,
            warning: written.err(),
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.warning.is_none()
    }
}

/// The store plus the port it writes through.
pub struct Tracker<P: PersistencePort> {
    store: RecordStore,
    port: P,
    cache: ViewCache,
    #[cfg(feature = "resume")]
    resume: Option<ResumeDocument>,
}

impl<P: PersistencePort> Tracker<P> {
    /// Rehydrates from the port once. A failed read is returned rather
    /// than treated as empty, since the first save would overwrite it.
    pub fn open(port: P) -> Result<Self, PersistError> {
        let store = RecordStore::from_records(port.load_records()?);
        #[cfg(feature = "resume")]
        let resume = port.load_resume()?;
        log::info!(
            "event=tracker_open module=tracker status=ok records={}",
            store.len()
        );
        Ok(Self {
            store,
            port,
            cache: ViewCache::new(),
            #[cfg(feature = "resume")]
            resume,
        })
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    pub fn records(&self) -> &[JobApplication] {
        self.store.list()
    }

    pub fn get(&self, id: i64) -> Option<&JobApplication> {
        self.store.get(id)
    }

    fn save(&self) -> Result<(), PersistError> {
        let written = self.port.save_records(self.store.list());
        if let Err(e) = &written {
            log::warn!("event=save module=tracker status=error error={e}");
        }
        written
    }

    /// Fails only when no id is left; nothing changes then.
    pub fn add(&mut self, new: NewApplication) -> Result<Synced<JobApplication>, StoreError> {
        let record = self.store.add(new)?;
        log::info!("event=add module=tracker id={}", record.id);
        let written = self.save();
        Ok(Synced::with(record, written))
    }

    /// `value` is `false` when `id` does not exist; nothing is written then.
    pub fn update_status(&mut self, id: i64, status: Status) -> Synced<bool> {
        if !self.store.update_status(id, status) {
            return Synced::clean(false);
        }
        log::info!("event=update_status module=tracker id={id} status={status}");
        let written = self.save();
        Synced::with(true, written)
    }

    #[cfg(feature = "notes")]
    pub fn update_note(&mut self, id: i64, note: Option<String>) -> Synced<bool> {
        if !self.store.update_note(id, note) {
            return Synced::clean(false);
        }
        log::info!("event=update_note module=tracker id={id}");
        let written = self.save();
        Synced::with(true, written)
    }

    pub fn remove(&mut self, id: i64) -> Synced<Option<JobApplication>> {
        let Some(removed) = self.store.remove(id) else {
            return Synced::clean(None);
        };
        log::info!("event=remove module=tracker id={id}");
        let written = self.save();
        Synced::with(Some(removed), written)
    }

    pub fn view(&mut self, query: &ViewQuery) -> &[JobApplication] {
        self.cache.get(&self.store, query)
    }

    pub fn breakdown(&self) -> StatusBreakdown {
        StatusBreakdown::from_records(self.store.list())
    }

    #[cfg(feature = "resume")]
    pub fn resume(&self) -> Option<&ResumeDocument> {
        self.resume.as_ref()
    }

    /// Replaces any previous resume.
    #[cfg(feature = "resume")]
    pub fn attach_resume(&mut self, doc: ResumeDocument) -> Synced<()> {
        let written = self.port.save_resume(&doc);
        if let Err(e) = &written {
            log::warn!("event=attach_resume module=tracker status=error error={e}");
        } else {
            log::info!("event=attach_resume module=tracker status=ok bytes={}", doc.len());
        }
        self.resume = Some(doc);
        Synced::with((), written)
    }

    /// `value` is `false` when there was no resume to clear.
    #[cfg(feature = "resume")]
    pub fn clear_resume(&mut self) -> Synced<bool> {
        let had = self.resume.take().is_some();
        let written = self.port.clear_resume();
        if let Err(e) = &written {
            log::warn!("event=clear_resume module=tracker status=error error={e}");
        }
        Synced::with(had, written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SortOrder, StatusFilter};
    use crate::persistence::LocalPersistence;
    use crate::error::StorageError;
    use crate::storage::{KeyValueStorage, MemoryStorage, StorageResult};
    use std::cell::Cell;

    /// Reads fail while `locked` is set.
    struct FlakyStorage {
        inner: MemoryStorage,
        locked: Cell<bool>,
    }

    impl KeyValueStorage for FlakyStorage {
        fn get(&self, key: &str) -> StorageResult<Option<String>> {
            if self.locked.get() {
                return Err(StorageError::Io(std::io::Error::other("database is locked")));
            }
            self.inner.get(key)
        }
        fn set(&self, key: &str, value: &str) -> StorageResult<()> {
            self.inner.set(key, value)
        }
        fn remove(&self, key: &str) -> StorageResult<()> {
            self.inner.remove(key)
        }
    }

    fn tracker() -> Tracker<LocalPersistence<MemoryStorage>> {
        Tracker::open(LocalPersistence::new(MemoryStorage::new())).unwrap()
    }

    #[test]
    fn test_every_mutation_writes_through() {
        let mut t = tracker();
        assert!(t.add(NewApplication::new("a", "x")).unwrap().is_persisted());
        assert_eq!(t.port().load_records().unwrap().len(), 1);

        assert!(t.update_status(1, Status::Selected).value);
        assert_eq!(t.port().load_records().unwrap()[0].status, Status::Selected);

        assert!(t.remove(1).value.is_some());
        assert!(t.port().load_records().unwrap().is_empty());
    }

    #[test]
    fn test_missing_id_does_not_write() {
        let storage = MemoryStorage::new();
        let mut t = Tracker::open(LocalPersistence::new(&storage)).unwrap();
        let synced = t.update_status(9, Status::Rejected);
        assert!(!synced.value);
        assert!(synced.is_persisted());
        assert!(!storage.contains("jobData"));
    }

    #[test]
    fn test_reopen_restores_state() {
        let storage = MemoryStorage::new();
        {
            let mut t = Tracker::open(LocalPersistence::new(&storage)).unwrap();
            let _ = t
                .add(NewApplication::new("Backend Engineer", "Acme").with_ctc(Some(30.0)))
                .unwrap();
            let _ = t.add(NewApplication::new("Designer", "Zenith")).unwrap();
        }
        let mut t = Tracker::open(LocalPersistence::new(&storage)).unwrap();
        assert_eq!(t.records().len(), 2);
        assert_eq!(t.add(NewApplication::new("c", "c")).unwrap().value.id, 3);
    }

    #[test]
    fn test_write_failure_is_a_warning_not_a_loss() {
        let mut t = Tracker::open(LocalPersistence::new(MemoryStorage::with_quota(8))).unwrap();
        let synced = t.add(NewApplication::new("Staff Engineer", "Initech")).unwrap();
        assert!(synced.warning.is_some());
        assert_eq!(synced.value.id, 1);
        // the in-memory collection keeps the record
        assert_eq!(t.records().len(), 1);
    }

    #[test]
    fn test_open_fails_when_storage_unreadable() {
        let storage = FlakyStorage {
            inner: MemoryStorage::new(),
            locked: Cell::new(false),
        };
        {
            let mut t = Tracker::open(LocalPersistence::new(&storage)).unwrap();
            let _ = t.add(NewApplication::new("Backend Engineer", "Acme")).unwrap();
            let _ = t.add(NewApplication::new("Designer", "Zenith")).unwrap();
        }

        storage.locked.set(true);
        let err = Tracker::open(LocalPersistence::new(&storage)).err().unwrap();
        assert!(matches!(err, PersistError::Load { .. }));

        // the stored collection is still there once the lock clears
        storage.locked.set(false);
        let t = Tracker::open(LocalPersistence::new(&storage)).unwrap();
        assert_eq!(t.records().len(), 2);
    }

    #[test]
    fn test_add_after_last_id_changes_nothing() {
        let storage = MemoryStorage::new();
        storage
            .set(
                "jobData",
                &format!(
                    r#"[{{"id":{},"title":"a","company":"b","ctc":null,"status":"Applied"}}]"#,
                    i64::MAX
                ),
            )
            .unwrap();
        let mut t = Tracker::open(LocalPersistence::new(&storage)).unwrap();
        let before = storage.get("jobData").unwrap();

        let err = t.add(NewApplication::new("c", "c")).unwrap_err();
        assert_eq!(err, StoreError::IdsExhausted { max: i64::MAX });
        assert_eq!(t.records().len(), 1);
        assert_eq!(storage.get("jobData").unwrap(), before);
    }

    #[test]
    fn test_view_reflects_mutations() {
        let mut t = tracker();
        let _ = t.add(NewApplication::new("a", "x").with_ctc(Some(2.0))).unwrap();
        let _ = t.add(NewApplication::new("b", "x").with_ctc(Some(1.0))).unwrap();
        let query = ViewQuery::new("", StatusFilter::All, SortOrder::Asc);
        assert_eq!(t.view(&query)[0].id, 2);

        let _ = t.remove(2);
        let rows = t.view(&query);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, 1);
    }

    #[test]
    fn test_breakdown() {
        let mut t = tracker();
        let _ = t.add(NewApplication::new("a", "x")).unwrap();
        let _ = t.add(NewApplication::new("b", "x").with_status(Status::Selected)).unwrap();
        let b = t.breakdown();
        assert_eq!(b.count(Status::Selected), 1);
        assert_eq!(b.total, 2);
    }

    #[cfg(feature = "notes")]
    #[test]
    fn test_update_note_writes_through() {
        let mut t = tracker();
        let _ = t.add(NewApplication::new("a", "x")).unwrap();
        assert!(t.update_note(1, Some("ping recruiter".into())).value);
        assert_eq!(
            t.port().load_records().unwrap()[0].note.as_deref(),
            Some("ping recruiter")
        );
    }

    #[cfg(feature = "resume")]
    #[test]
    fn test_resume_attach_replace_clear() {
        use crate::persistence::RESUME_KEY;
        use crate::resume::PDF_MIME;

        let storage = MemoryStorage::new();
        let mut t = Tracker::open(LocalPersistence::new(&storage)).unwrap();
        let first = ResumeDocument::from_bytes(PDF_MIME, b"%PDF one".to_vec()).unwrap();
        let second = ResumeDocument::from_bytes(PDF_MIME, b"%PDF two".to_vec()).unwrap();

        assert!(t.attach_resume(first).is_persisted());
        assert!(t.attach_resume(second.clone()).is_persisted());
        assert_eq!(t.resume(), Some(&second));

        let reopened = Tracker::open(LocalPersistence::new(&storage)).unwrap();
        assert_eq!(reopened.resume(), Some(&second));

        assert!(t.clear_resume().value);
        assert!(storage.get(RESUME_KEY).unwrap().is_none());
        assert!(Tracker::open(LocalPersistence::new(&storage)).unwrap().resume().is_none());
        assert!(!t.clear_resume().value);
    }
}
