//! Auditing - Creation and modification stamps maintained on save.
//!
//! Records embed an [`AuditFields`] value and implement [`Auditable`]. An
//! [`AuditingRepository`] stamps them from an [`AuditorAware`] provider and a
//! [`Clock`]. Creation stamps are written once and survive every later save.
//!
//! ## Example
//!
//! ```ignore
//! let articles = AuditingRepository::new(
//!     store.repository::<Article>(),
//!     FixedAuditor::new("admin"),
//!     SystemClock,
//! );
//! let saved = articles.save(&Article::new("hello"))?;
//! assert_eq!(saved.audit.created_by.as_deref(), Some("admin"));
//! ```

mod clock;

use std::ops::Deref;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::record::Record;
use crate::repository::{RepoError, Repository};
use crate::store::RecordStore;

pub use clock::{Clock, FixedClock, SystemClock};

const MAX_SAVE_ATTEMPTS: usize = 8;

/// Who created and last modified a record, and when.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditFields {
    pub created_by: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub last_modified_by: Option<String>,
    pub last_modified_at: Option<DateTime<Utc>>,
}

/// A record carrying audit stamps.
pub trait Auditable: Record {
    fn audit(&self) -> &AuditFields;
    fn audit_mut(&mut self) -> &mut AuditFields;
}

/// Supplies the identity of the current actor.
pub trait AuditorAware: Send + Sync {
    fn current_auditor(&self) -> Option<String>;
}

impl<F> AuditorAware for F
where
    F: Fn() -> Option<String> + Send + Sync,
{
    fn current_auditor(&self) -> Option<String> {
        self()
    }
}

/// Always reports the same auditor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedAuditor(String);

impl FixedAuditor {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl AuditorAware for FixedAuditor {
    fn current_auditor(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

/// A repository that stamps [`AuditFields`] on every save.
///
/// Reads and every other operation go straight to the wrapped repository.
pub struct AuditingRepository<S, R, P, C> {
    inner: Repository<S, R>,
    auditor: P,
    clock: C,
}

impl<S, R, P, C> AuditingRepository<S, R, P, C>
where
    S: RecordStore,
    R: Auditable,
    P: AuditorAware,
    C: Clock,
{
    pub fn new(inner: Repository<S, R>, auditor: P, clock: C) -> Self {
        Self {
            inner,
            auditor,
            clock,
        }
    }

    pub fn inner(&self) -> &Repository<S, R> {
        &self.inner
    }

    /// Save with fresh modification stamps.
    ///
    /// A new record gets its creation stamps too. For an existing record the
    /// stored creation stamps are restored, whatever the caller sent. The
    /// write only lands if the row is unchanged since it was read; a lost
    /// race is retried with fresh stamps.
    pub fn save(&self, record: &R) -> Result<R, RepoError> {
        let mut attempt = 1;
        loop {
            match self.try_save(record) {
                Err(RepoError::ConcurrentModification { .. }) if attempt < MAX_SAVE_ATTEMPTS => {
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    fn try_save(&self, record: &R) -> Result<R, RepoError> {
        let now = self.clock.now();
        let auditor = self.auditor.current_auditor();

        let stored = match record.id() {
            Some(id) => self.inner.find_versioned_by_id(&id)?,
            None => None,
        };

        let mut record = record.clone();
        let audit = record.audit_mut();
        match &stored {
            Some(stored) => {
                audit.created_by = stored.data.audit().created_by.clone();
                audit.created_at = stored.data.audit().created_at;
            }
            None => {
                audit.created_by = auditor.clone();
                audit.created_at = Some(now);
            }
        }
        audit.last_modified_by = auditor;
        audit.last_modified_at = Some(now);

        let store = self.inner.store();
        let saved = match &stored {
            Some(stored) => store.update(&record, stored.version)?,
            None => store.insert(&record)?,
        };
        debug!(
            collection = R::COLLECTION,
            id = ?saved.data.id(),
            version = saved.version,
            created = stored.is_none(),
            by = ?saved.data.audit().last_modified_by,
            "saved audited record"
        );
        Ok(saved.data)
    }

    pub fn save_all(&self, records: &[R]) -> Result<Vec<R>, RepoError> {
        records.iter().map(|record| self.save(record)).collect()
    }
}

impl<S, R, P, C> Deref for AuditingRepository<S, R, P, C> {
    type Target = Repository<S, R>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
