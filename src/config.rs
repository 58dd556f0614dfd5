//! Repository configuration.
//!
//! Every field has a default, so a partial JSON document is enough:
//!
//! ```ignore
//! let config = RepositoryConfig::from_json(r#"{ "paging": { "max_page_size": 100 } }"#)?;
//! ```

use serde::{Deserialize, Serialize};

use crate::repository::RepoError;

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const MAX_PAGE_SIZE: usize = 2000;

/// How raw page parameters from a surrounding service are interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PagingConfig {
    /// Page size used when the caller gives none.
    pub default_page_size: usize,
    /// Requested sizes above this are clamped.
    pub max_page_size: usize,
    /// Treat incoming page numbers as starting at 1.
    pub one_indexed_parameters: bool,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
            one_indexed_parameters: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    pub paging: PagingConfig,
    /// Log every compiled query at info level instead of debug.
    pub show_queries: bool,
}

impl RepositoryConfig {
    pub fn from_json(json: &str) -> Result<Self, RepoError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| RepoError::Validation(format!("invalid repository config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), RepoError> {
        let paging = &self.paging;
        if paging.default_page_size == 0 || paging.max_page_size == 0 {
            return Err(RepoError::Validation(
                "page sizes in config must be at least 1".into(),
            ));
        }
        if paging.default_page_size > paging.max_page_size {
            return Err(RepoError::Validation(format!(
                "default page size {} exceeds max page size {}",
                paging.default_page_size, paging.max_page_size
            )));
        }
        Ok(())
    }
}
