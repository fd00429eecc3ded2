use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::data::ApplicantData;
use super::locale::Locale;
use crate::program::{ProgramDefinition, ProgramId};

/// Identifier wrapper for applicant records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicantId(pub u64);

impl fmt::Display for ApplicantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Storage of applicant documents. Lookups return `None` for unknown ids.
#[async_trait]
pub trait ApplicantRepository: Send + Sync {
    async fn lookup_applicant(&self, id: ApplicantId)
        -> Result<Option<ApplicantData>, RepositoryError>;
    async fn insert_applicant(&self, data: ApplicantData) -> Result<ApplicantId, RepositoryError>;
    async fn update_applicant(
        &self,
        id: ApplicantId,
        data: ApplicantData,
    ) -> Result<(), RepositoryError>;
}

/// Read access to published program versions.
#[async_trait]
pub trait ProgramRepository: Send + Sync {
    async fn lookup_program(
        &self,
        id: ProgramId,
    ) -> Result<Option<Arc<ProgramDefinition>>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Opaque per-locale string lookup used for validation messages.
pub trait MessageCatalog: Send + Sync {
    fn localized_string(&self, key: &str, locale: &Locale) -> Option<String>;
}

/// Catalog with no translations; every message falls back to its default text.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultMessages;

impl MessageCatalog for DefaultMessages {
    fn localized_string(&self, _key: &str, _locale: &Locale) -> Option<String> {
        None
    }
}

/// Source of metadata timestamps.
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_millis(&self) -> i64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}
