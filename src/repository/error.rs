use std::fmt;

use crate::store::StoreError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoError {
    /// A required record is missing.
    NotFound { collection: String, id: String },
    /// A single-result query matched more than one record.
    NonUniqueResult { collection: String, count: usize },
    /// Malformed query, page, example or derived name. Raised before the
    /// store is touched.
    Validation(String),
    /// Optimistic write lost. `actual` is 0 when the row no longer exists.
    ConcurrentModification {
        collection: String,
        id: String,
        expected: u64,
        actual: u64,
    },
    Store(StoreError),
}

impl fmt::Display for RepoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepoError::NotFound { collection, id } => {
                write!(f, "record not found: {}:{}", collection, id)
            }
            RepoError::NonUniqueResult { collection, count } => write!(
                f,
                "expected at most one {} record, query matched {}",
                collection, count
            ),
            RepoError::Validation(message) => write!(f, "invalid query: {}", message),
            RepoError::ConcurrentModification {
                collection,
                id,
                expected,
                actual,
            } => write!(
                f,
                "concurrent modification of {}:{} (expected version {}, got {})",
                collection, id, expected, actual
            ),
            RepoError::Store(err) => write!(f, "store error: {}", err),
        }
    }
}

impl std::error::Error for RepoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RepoError::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for RepoError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict {
                collection,
                id,
                expected,
                actual,
            } => RepoError::ConcurrentModification {
                collection,
                id,
                expected,
                actual,
            },
            StoreError::Field(err) => RepoError::Validation(err.to_string()),
            other => RepoError::Store(other),
        }
    }
}
