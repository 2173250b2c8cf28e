pub mod analytics;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod persistence;
#[cfg(feature = "resume")]
pub mod resume;
pub mod storage;
pub mod store;
pub mod tracker;

pub use error::{InputError, PersistError, StorageError, StoreError};
pub use models::{JobApplication, NewApplication, SortOrder, Status, StatusFilter};
pub use persistence::{LocalPersistence, PersistencePort};
pub use storage::{KeyValueStorage, MemoryStorage, SqliteStorage};
pub use store::{RecordStore, ViewCache, ViewQuery};
pub use tracker::{Synced, Tracker};
