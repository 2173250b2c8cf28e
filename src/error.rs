use thiserror::Error;

/// Failure of the key-value backend itself.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage backend error: {0}")]
    Backend(#[from] rusqlite::Error),

    #[error("storage quota exceeded writing '{key}'")]
    QuotaExceeded { key: String },

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A persistence failure. For writes the in-memory state is still
/// authoritative; a failed read means the stored state is unknown.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to read '{key}': {source}")]
    Load {
        key: &'static str,
        #[source]
        source: StorageError,
    },

    #[error("failed to serialize '{key}': {source}")]
    Serialize {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write '{key}': {source}")]
    Storage {
        key: &'static str,
        #[source]
        source: StorageError,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("no id left after {max}")]
    IdsExhausted { max: i64 },
}

/// Rejected user input.
#[derive(Debug, Error, PartialEq)]
pub enum InputError {
    #[error("compensation must be a number, got '{0}'")]
    NotANumber(String),

    #[error("compensation cannot be negative, got {0}")]
    Negative(f64),

    #[error("unknown status '{0}' (expected Applied, Rejected or Selected)")]
    UnknownStatus(String),

    #[error("unknown sort order '{0}' (expected asc or desc)")]
    UnknownSortOrder(String),
}

#[cfg(feature = "resume")]
#[derive(Debug, Error)]
pub enum ResumeError {
    #[error("not a base64 data URL")]
    MalformedDataUrl,

    #[error("invalid base64 payload: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("document is empty")]
    Empty,

    #[error("document is {size} bytes, larger than the {limit} byte limit")]
    TooLarge { size: u64, limit: u64 },

    #[error("failed to read document: {0}")]
    Io(#[from] std::io::Error),
}
