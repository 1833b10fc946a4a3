//! Error kinds of the content crate.

use thiserror::Error;

/// Result alias used throughout the content crate.
pub type ContentResult<T> = Result<T, ContentError>;

/// Every failure a content operation can report.
///
/// `Validation`, `NotFound` and `SystemPage` are recoverable: callers surface
/// them to the author and nothing has been written. The remaining kinds come
/// from storage, serialization or the network.
#[derive(Debug, Error)]
pub enum ContentError {
    /// A required field is missing or a value is out of range.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The referenced article, page or comment does not exist.
    #[error("{what} not found: {key}")]
    NotFound {
        /// Kind of record that was looked up.
        what: &'static str,
        /// Identity (id, title or slug) that was looked up.
        key: String,
    },

    /// System pages can be edited but never deleted.
    #[error("system page `{0}` cannot be deleted")]
    SystemPage(String),

    /// The remote content store could not be queried or patched.
    #[error("remote content store failed: {0}")]
    RemoteFetch(String),

    /// The local store rejected a read or write.
    #[error("local store failure: {0}")]
    Persistence(#[from] rusqlite::Error),

    /// A stored or received value could not be (de)serialized.
    #[error("serialization failure: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filesystem failure while importing or exporting content.
    #[error("io failure: {0}")]
    Io(#[from] std::io::Error),
}

impl ContentError {
    pub(crate) fn not_found(what: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            what,
            key: key.into(),
        }
    }

    /// Whether the failure is a user-level condition rather than a storage or
    /// network fault.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::NotFound { .. } | Self::SystemPage(_))
    }
}

impl From<reqwest::Error> for ContentError {
    fn from(err: reqwest::Error) -> Self {
        Self::RemoteFetch(err.to_string())
    }
}
