use std::cmp::Ordering;

use crate::error::StoreError;
use crate::models::{JobApplication, NewApplication, SortOrder, Status, StatusFilter};

/// Search, filter and sort settings for the derived view.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ViewQuery {
    pub search: String,
    pub status: StatusFilter,
    pub sort: SortOrder,
}

impl ViewQuery {
    pub fn new(search: impl Into<String>, status: StatusFilter, sort: SortOrder) -> Self {
        Self {
            search: search.into(),
            status,
            sort,
        }
    }
}

/// In-memory, insertion-ordered collection of applications.
///
/// Every mutation that changes the collection bumps `version`, which is what
/// `ViewCache` keys on.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: Vec<JobApplication>,
    version: u64,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from persisted records, keeping the first occurrence of
    /// any duplicated id.
    pub fn from_records(records: Vec<JobApplication>) -> Self {
        let mut kept: Vec<JobApplication> = Vec::with_capacity(records.len());
        for record in records {
            if kept.iter().any(|r| r.id == record.id) {
                log::warn!("event=duplicate_id_dropped module=store id={}", record.id);
                continue;
            }
            kept.push(record);
        }
        Self {
            records: kept,
            version: 0,
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn list(&self) -> &[JobApplication] {
        &self.records
    }

    pub fn get(&self, id: i64) -> Option<&JobApplication> {
        self.records.iter().find(|r| r.id == id)
    }

    fn next_id(&self) -> Result<i64, StoreError> {
        match self.records.iter().map(|r| r.id).max() {
            None => Ok(1),
            Some(max) => max.checked_add(1).ok_or(StoreError::IdsExhausted { max }),
        }
    }

    /// Appends with id `max + 1`. Fails, leaving the store untouched, once
    /// the highest id is `i64::MAX`.
    pub fn add(&mut self, new: NewApplication) -> Result<JobApplication, StoreError> {
        let record = new.into_application(self.next_id()?);
        self.records.push(record.clone());
        self.version += 1;
        Ok(record)
    }

    /// Returns `false` when no record has `id`.
    pub fn update_status(&mut self, id: i64, status: Status) -> bool {
        let Some(record) = self.records.iter_mut().find(|r| r.id == id) else {
            return false;
        };
        record.status = status;
        self.version += 1;
        true
    }

    /// Returns `false` when no record has `id`.
    #[cfg(feature = "notes")]
    pub fn update_note(&mut self, id: i64, note: Option<String>) -> bool {
        let Some(record) = self.records.iter_mut().find(|r| r.id == id) else {
            return false;
        };
        record.note = note;
        self.version += 1;
        true
    }

    pub fn remove(&mut self, id: i64) -> Option<JobApplication> {
        let idx = self.records.iter().position(|r| r.id == id)?;
        self.version += 1;
        Some(self.records.remove(idx))
    }

    /// Filtered and sorted copy of the collection. Never mutates the store.
    pub fn view(&self, query: &ViewQuery) -> Vec<JobApplication> {
        let needle = query.search.to_lowercase();
        let mut out: Vec<JobApplication> = self
            .records
            .iter()
            .filter(|r| {
                r.title.to_lowercase().contains(&needle)
                    || r.company.to_lowercase().contains(&needle)
            })
            .filter(|r| query.status.matches(r.status))
            .cloned()
            .collect();

        // sort_by is stable, so equal compensation keeps insertion order
        out.sort_by(|a, b| {
            let ord = a
                .ctc_or_zero()
                .partial_cmp(&b.ctc_or_zero())
                .unwrap_or(Ordering::Equal);
            match query.sort {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        });
        out
    }
}

/// Memoizes the last view, keyed on store version and query.
#[derive(Debug, Default)]
pub struct ViewCache {
    key: Option<(u64, ViewQuery)>,
    rows: Vec<JobApplication>,
}

impl ViewCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, store: &RecordStore, query: &ViewQuery) -> &[JobApplication] {
        let fresh = matches!(&self.key, Some((v, q)) if *v == store.version() && q == query);
        if !fresh {
            self.rows = store.view(query);
            self.key = Some((store.version(), query.clone()));
        }
        &self.rows
    }

    pub fn invalidate(&mut self) {
        self.key = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(title: &str, company: &str, ctc: Option<f64>) -> NewApplication {
        NewApplication::new(title, company).with_ctc(ctc)
    }

    fn ids(rows: &[JobApplication]) -> Vec<i64> {
        rows.iter().map(|r| r.id).collect()
    }

    #[test]
    fn test_sequential_ids_from_empty() {
        let mut store = RecordStore::new();
        for n in 1..=5 {
            let added = store.add(job("t", "c", None)).unwrap();
            assert_eq!(added.id, n);
        }
        assert_eq!(ids(store.list()), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_next_id_is_max_plus_one_with_gaps() {
        let mut store = RecordStore::from_records(vec![
            job("a", "a", None).into_application(4),
            job("b", "b", None).into_application(17),
            job("c", "c", None).into_application(9),
        ]);
        assert_eq!(store.add(job("d", "d", None)).unwrap().id, 18);

        store.remove(18);
        store.remove(17);
        // only ids still present count
        assert_eq!(store.add(job("e", "e", None)).unwrap().id, 10);
    }

    #[test]
    fn test_add_after_max_id_fails_without_change() {
        let mut store =
            RecordStore::from_records(vec![job("last", "x", None).into_application(i64::MAX)]);
        let version = store.version();

        let err = store.add(job("one more", "x", None)).unwrap_err();
        assert_eq!(err, StoreError::IdsExhausted { max: i64::MAX });
        assert_eq!(ids(store.list()), vec![i64::MAX]);
        assert_eq!(store.version(), version);

        // freeing the top id makes room again
        store.remove(i64::MAX);
        assert_eq!(store.add(job("again", "x", None)).unwrap().id, 1);
    }

    #[test]
    fn test_add_accepts_empty_fields_and_defaults_to_applied() {
        let mut store = RecordStore::new();
        let added = store.add(NewApplication::default()).unwrap();
        assert_eq!(added.title, "");
        assert_eq!(added.company, "");
        assert_eq!(added.ctc, None);
        assert_eq!(added.status, Status::Applied);
    }

    #[test]
    fn test_remove_then_view_excludes_id() {
        let mut store = RecordStore::new();
        store.add(job("a", "x", Some(1.0))).unwrap();
        store.add(job("b", "y", Some(2.0))).unwrap();
        assert!(store.remove(1).is_some());
        let rows = store.view(&ViewQuery::default());
        assert_eq!(ids(&rows), vec![2]);
    }

    #[test]
    fn test_remove_missing_id_is_noop() {
        let mut store = RecordStore::new();
        store.add(job("a", "x", Some(1.0))).unwrap();
        let before = store.list().to_vec();
        let version = store.version();

        assert!(store.remove(42).is_none());
        assert_eq!(store.list(), before.as_slice());
        assert_eq!(store.version(), version);
    }

    #[test]
    fn test_update_status_touches_only_target() {
        let mut store = RecordStore::new();
        store.add(job("a", "x", Some(1.0))).unwrap();
        store.add(job("b", "y", None)).unwrap();
        let before = store.list().to_vec();

        assert!(store.update_status(2, Status::Selected));

        let after = store.list();
        assert_eq!(after[0], before[0]);
        let mut expected = before[1].clone();
        expected.status = Status::Selected;
        assert_eq!(after[1], expected);
    }

    #[test]
    fn test_update_status_missing_id_is_noop() {
        let mut store = RecordStore::new();
        store.add(job("a", "x", None)).unwrap();
        assert!(!store.update_status(7, Status::Rejected));
        assert_eq!(store.list()[0].status, Status::Applied);
    }

    #[cfg(feature = "notes")]
    #[test]
    fn test_update_note() {
        let mut store = RecordStore::new();
        store.add(job("a", "x", None)).unwrap();
        assert!(store.update_note(1, Some("recruiter call".into())));
        assert_eq!(store.get(1).unwrap().note.as_deref(), Some("recruiter call"));
        assert!(store.update_note(1, None));
        assert_eq!(store.get(1).unwrap().note, None);
        assert!(!store.update_note(2, Some("nope".into())));
    }

    #[test]
    fn test_view_sorts_by_ctc_with_absent_as_zero() {
        let mut store = RecordStore::new();
        store.add(job("a", "x", Some(10.0))).unwrap();
        store.add(job("b", "x", None)).unwrap();
        store.add(job("c", "x", Some(5.0))).unwrap();
        store.add(job("d", "x", Some(0.0))).unwrap();

        let asc = store.view(&ViewQuery::default());
        assert_eq!(ids(&asc), vec![2, 4, 3, 1]);

        let desc = store.view(&ViewQuery::new("", StatusFilter::All, SortOrder::Desc));
        // ties (2 and 4 both count as zero) keep insertion order
        assert_eq!(ids(&desc), vec![1, 3, 2, 4]);
    }

    #[test]
    fn test_view_search_is_case_insensitive_on_title_or_company() {
        let mut store = RecordStore::new();
        store.add(job("Backend Engineer", "Acme", None)).unwrap();
        store.add(job("Designer", "Zenith", None)).unwrap();

        for term in ["ack", "ACME", "engineer"] {
            let rows = store.view(&ViewQuery::new(term, StatusFilter::All, SortOrder::Asc));
            assert_eq!(ids(&rows), vec![1], "term {term}");
        }
        let rows = store.view(&ViewQuery::new("zen", StatusFilter::All, SortOrder::Asc));
        assert_eq!(ids(&rows), vec![2]);
    }

    #[test]
    fn test_view_status_filter() {
        let mut store = RecordStore::new();
        store.add(job("a", "x", None)).unwrap();
        store.add(job("b", "x", None)).unwrap();
        store.update_status(2, Status::Rejected);

        let rows = store.view(&ViewQuery::new(
            "",
            StatusFilter::Only(Status::Rejected),
            SortOrder::Asc,
        ));
        assert_eq!(ids(&rows), vec![2]);
        assert_eq!(store.view(&ViewQuery::default()).len(), 2);
    }

    #[test]
    fn test_view_does_not_mutate() {
        let mut store = RecordStore::new();
        store.add(job("a", "x", Some(3.0))).unwrap();
        store.add(job("b", "x", Some(1.0))).unwrap();
        let version = store.version();
        let _ = store.view(&ViewQuery::new("", StatusFilter::All, SortOrder::Desc));
        assert_eq!(ids(store.list()), vec![1, 2]);
        assert_eq!(store.version(), version);
    }

    #[test]
    fn test_from_records_drops_duplicate_ids() {
        let store = RecordStore::from_records(vec![
            job("first", "x", None).into_application(1),
            job("second", "x", None).into_application(1),
        ]);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(1).unwrap().title, "first");
    }

    #[test]
    fn test_view_cache_recomputes_on_change() {
        let mut store = RecordStore::new();
        let mut cache = ViewCache::new();
        let query = ViewQuery::default();

        store.add(job("a", "x", None)).unwrap();
        assert_eq!(cache.get(&store, &query).len(), 1);

        store.add(job("b", "x", None)).unwrap();
        assert_eq!(cache.get(&store, &query).len(), 2);

        let narrowed = ViewQuery::new("b", StatusFilter::All, SortOrder::Asc);
        assert_eq!(ids(cache.get(&store, &narrowed)), vec![2]);
    }
}
