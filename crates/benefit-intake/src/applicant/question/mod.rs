//! Applicant-facing view of one question inside a concrete block.
//!
//! Each question type has a validator module; [`ApplicantQuestion::new`] dispatches on
//! [`QuestionConfig`] so adding a type without a validator fails to compile.

mod address;
mod enumerator;
mod file_upload;
mod messages;
mod name;
mod number;
mod select;
mod text;

use super::data::ApplicantData;
use super::locale::Locale;
use super::path::Path;
use super::scalar::{Scalar, ScalarType};
use crate::program::ProgramQuestionDefinition;
use crate::question::{QuestionConfig, QuestionDefinition, QuestionId, QuestionType};

pub(crate) use enumerator::entity_names as enumerator_entity_names;
pub use messages::{QuestionErrors, ValidationErrorMessage};

/// A question bound to a context path and evaluated against one document snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicantQuestion {
    definition: ProgramQuestionDefinition,
    context: Path,
    answered: bool,
    errors: QuestionErrors,
}

impl ApplicantQuestion {
    pub(crate) fn new(
        definition: ProgramQuestionDefinition,
        context: Path,
        data: &ApplicantData,
    ) -> Self {
        let mut question = Self {
            definition,
            context,
            answered: false,
            errors: QuestionErrors::default(),
        };
        question.answered = question.detect_answer(data);
        if question.answered {
            question.errors = question.validate(data);
        }
        question
    }

    pub fn definition(&self) -> &QuestionDefinition {
        &self.definition.question
    }

    pub fn id(&self) -> QuestionId {
        self.definition.question.id
    }

    pub fn question_type(&self) -> QuestionType {
        self.definition.question.question_type()
    }

    pub fn is_optional(&self) -> bool {
        self.definition.optional
    }

    pub fn is_enumerator(&self) -> bool {
        self.definition.question.is_enumerator()
    }

    /// Context the question was placed in: `applicant` or an entity element.
    pub fn context(&self) -> &Path {
        &self.context
    }

    /// Contextualized path of the question's answers.
    pub fn path(&self) -> Path {
        self.definition.question.contextualized_path(&self.context)
    }

    pub fn scalar_path(&self, scalar: Scalar) -> Path {
        self.path().join_scalar(scalar)
    }

    /// Owned scalar paths without metadata; empty for enumerators.
    pub fn scalar_paths(&self) -> Vec<(Path, ScalarType)> {
        let question_path = self.path();
        self.definition
            .question
            .scalars()
            .map(|scalars| {
                scalars
                    .iter()
                    .map(|(scalar, scalar_type)| (question_path.join_scalar(*scalar), *scalar_type))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn is_answered(&self) -> bool {
        self.answered
    }

    pub fn errors(&self) -> &QuestionErrors {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn question_text(&self, locale: &Locale) -> &str {
        self.definition.question.question_text.get_or_default(locale)
    }

    pub fn help_text(&self, locale: &Locale) -> &str {
        self.definition.question.help_text.get_or_default(locale)
    }

    /// Last update timestamp, epoch milliseconds.
    pub fn updated_at(&self, data: &ApplicantData) -> Option<i64> {
        self.metadata_paths(data, Scalar::UpdatedAt)
            .iter()
            .filter_map(|path| data.read_long(path))
            .max()
    }

    /// Program the question was last answered in.
    pub fn updated_in_program(&self, data: &ApplicantData) -> Option<i64> {
        let mut latest: Option<(i64, i64)> = None;
        for path in self.metadata_paths(data, Scalar::ProgramUpdatedIn) {
            let Some(program) = data.read_long(&path) else {
                continue;
            };
            let at = data
                .read_long(&path.parent_path().join_scalar(Scalar::UpdatedAt))
                .unwrap_or(i64::MIN);
            if latest.map_or(true, |(seen, _)| at >= seen) {
                latest = Some((at, program));
            }
        }
        latest.map(|(_, program)| program)
    }

    /// Entity names declared through an enumerator question, in index order.
    pub fn entity_names(&self, data: &ApplicantData) -> Vec<String> {
        if !self.is_enumerator() {
            return Vec::new();
        }
        enumerator::entity_names(&self.path(), data)
    }

    /// Human readable answer for review screens; empty when unanswered.
    pub fn answer_text(&self, data: &ApplicantData, locale: &Locale) -> String {
        if !self.answered {
            return String::new();
        }
        match &self.definition.question.config {
            QuestionConfig::Address { .. } => address::answer_text(self, data),
            QuestionConfig::Checkbox { .. } => select::multi_answer_text(self, data, locale),
            QuestionConfig::Dropdown { .. } | QuestionConfig::RadioButton { .. } => {
                select::single_answer_text(self, data, locale)
            }
            QuestionConfig::Enumerator { .. } => self.entity_names(data).join(", "),
            QuestionConfig::FileUpload => file_upload::answer_text(self, data),
            QuestionConfig::Name => name::answer_text(self, data),
            QuestionConfig::Number { .. } => number::answer_text(self, data),
            QuestionConfig::Text { .. } => text::answer_text(self, data),
            QuestionConfig::Date => String::new(),
        }
    }

    /// Enumerator metadata lives on each entity element.
    fn metadata_paths(&self, data: &ApplicantData, scalar: Scalar) -> Vec<Path> {
        if self.is_enumerator() {
            let list = self.path();
            return (0..data.array_len(&list))
                .map(|index| list.at_index(index).join_scalar(scalar))
                .collect();
        }
        vec![self.scalar_path(scalar)]
    }

    fn detect_answer(&self, data: &ApplicantData) -> bool {
        if self.is_enumerator() {
            return data.has_path(&self.path());
        }
        self.scalar_paths()
            .iter()
            .any(|(path, _)| data.has_path(path))
    }

    fn validate(&self, data: &ApplicantData) -> QuestionErrors {
        match &self.definition.question.config {
            QuestionConfig::Address { disallow_po_box } => {
                address::validate(self, data, *disallow_po_box)
            }
            QuestionConfig::Checkbox {
                options,
                min_choices,
                max_choices,
            } => select::validate_multi(self, data, options, *min_choices, *max_choices),
            QuestionConfig::Dropdown { options } | QuestionConfig::RadioButton { options } => {
                select::validate_single(self, data, options)
            }
            QuestionConfig::Enumerator { .. } => enumerator::validate(self, data),
            QuestionConfig::FileUpload => file_upload::validate(self, data),
            QuestionConfig::Name => name::validate(self, data),
            QuestionConfig::Number { min, max } => number::validate(self, data, *min, *max),
            QuestionConfig::Text {
                min_length,
                max_length,
            } => text::validate(self, data, *min_length, *max_length),
            QuestionConfig::Date => QuestionErrors::default(),
        }
    }
}

/// Trimmed string value, `None` when absent or blank.
fn present(data: &ApplicantData, path: &Path) -> Option<String> {
    data.read_string(path)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
