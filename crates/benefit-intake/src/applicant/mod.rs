//! Applicant answers, block navigation, and update staging.
//!
//! Answers live in one [`ApplicantData`] document per applicant. A
//! [`ReadOnlyApplicantProgramService`] expands a program into concrete blocks against a
//! snapshot of that document, and [`ApplicantService`] stages form submissions into it.

pub mod block;
pub mod data;
pub mod locale;
pub mod navigation;
pub mod path;
pub(crate) mod predicate;
pub mod question;
pub mod repository;
pub mod router;
pub mod scalar;
pub mod service;
pub mod staging;
pub mod summary;
pub mod views;

#[cfg(test)]
mod tests;

pub use block::Block;
pub use data::{applicant_path, ApplicantData, DocumentError, APPLICANT_KEY};
pub use locale::{Locale, LocalizedStrings, TranslationNotFound, DEFAULT_LOCALE};
pub use navigation::{NavigationError, ReadOnlyApplicantProgramService};
pub use path::{Path, PathError};
pub use predicate::{PredicateAnomaly, PredicateRole, PredicateWarning};
pub use question::{ApplicantQuestion, QuestionErrors, ValidationErrorMessage};
pub use repository::{
    ApplicantId, ApplicantRepository, Clock, DefaultMessages, MessageCatalog, ProgramRepository,
    RepositoryError, SystemClock,
};
pub use router::applicant_router;
pub use scalar::{Scalar, ScalarError, ScalarType};
pub use service::{ApplicantService, ApplicantServiceError};
pub use staging::{FieldError, StageOutcome, StagedUpdates, StagingError};
pub use summary::{write_csv, AnswerData, SummaryExportError};
pub use views::{
    AnswerView, ApplicantCreatedView, BlockView, ErrorView, ProgramProgressView, QuestionView,
    StageResultView, SummaryView,
};
