use serde::Serialize;

use super::block::Block;
use super::locale::Locale;
use super::navigation::ReadOnlyApplicantProgramService;
use super::path::Path;
use super::predicate::PredicateWarning;
use super::question::{ApplicantQuestion, ValidationErrorMessage};
use super::repository::{ApplicantId, MessageCatalog};
use super::staging::StageOutcome;
use super::summary::AnswerData;
use crate::program::ProgramId;
use crate::question::{QuestionId, QuestionType};

#[derive(Debug, Clone, Serialize)]
pub struct ApplicantCreatedView {
    pub applicant_id: ApplicantId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorView {
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<Path>,
    pub message: String,
}

impl ErrorView {
    fn render(
        error: ValidationErrorMessage,
        path: Option<&Path>,
        messages: &dyn MessageCatalog,
        locale: &Locale,
    ) -> Self {
        Self {
            code: error.key(),
            path: path.cloned(),
            message: error.message(messages, locale),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestionView {
    pub question_id: QuestionId,
    pub question_type: QuestionType,
    pub path: Path,
    pub text: String,
    pub help_text: String,
    pub optional: bool,
    pub answered: bool,
    pub errors: Vec<ErrorView>,
}

impl QuestionView {
    fn render(question: &ApplicantQuestion, messages: &dyn MessageCatalog, locale: &Locale) -> Self {
        let errors = question.errors();
        let question_level = errors
            .question_errors()
            .iter()
            .map(|error| ErrorView::render(*error, None, messages, locale));
        let scalar_level = errors.scalar_errors().iter().flat_map(|(path, set)| {
            set.iter()
                .map(move |error| ErrorView::render(*error, Some(path), messages, locale))
        });

        Self {
            question_id: question.id(),
            question_type: question.question_type(),
            path: question.path(),
            text: question.question_text(locale).to_string(),
            help_text: question.help_text(locale).to_string(),
            optional: question.is_optional(),
            answered: question.is_answered(),
            errors: question_level.chain(scalar_level).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BlockView {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_name: Option<String>,
    pub hidden: bool,
    pub optional: bool,
    pub complete: bool,
    pub has_errors: bool,
    pub questions: Vec<QuestionView>,
}

impl BlockView {
    pub fn render(block: &Block, messages: &dyn MessageCatalog, locale: &Locale) -> Self {
        Self {
            id: block.id().to_string(),
            name: block.name().to_string(),
            description: block.description().to_string(),
            entity_name: block.entity_name().map(str::to_string),
            hidden: block.is_hidden(),
            optional: block.is_optional(),
            complete: block.is_complete(),
            has_errors: block.has_errors(),
            questions: block
                .questions()
                .iter()
                .map(|question| QuestionView::render(question, messages, locale))
                .collect(),
        }
    }
}

/// Program progress for one applicant, as served to the form frontend.
#[derive(Debug, Clone, Serialize)]
pub struct ProgramProgressView {
    pub applicant_id: ApplicantId,
    pub program_id: ProgramId,
    pub program_title: String,
    pub preferred_locale: Locale,
    pub preferred_language_supported: bool,
    pub blocks: Vec<BlockView>,
    pub in_progress_block_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_incomplete_block_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub predicate_warnings: Vec<PredicateWarning>,
}

impl ProgramProgressView {
    pub fn render(
        applicant_id: ApplicantId,
        view: &ReadOnlyApplicantProgramService,
        messages: &dyn MessageCatalog,
    ) -> Self {
        let locale = view.preferred_locale();
        Self {
            applicant_id,
            program_id: view.program().id(),
            program_title: view.program_title().to_string(),
            preferred_language_supported: view.preferred_language_supported(),
            blocks: view
                .all_blocks()
                .iter()
                .map(|block| BlockView::render(block, messages, &locale))
                .collect(),
            in_progress_block_ids: view
                .in_progress_blocks()
                .into_iter()
                .map(|block| block.id().to_string())
                .collect(),
            first_incomplete_block_id: view
                .first_incomplete_block()
                .map(|block| block.id().to_string()),
            predicate_warnings: view.predicate_warnings().to_vec(),
            preferred_locale: locale,
        }
    }
}

/// Response to one block submission.
#[derive(Debug, Clone, Serialize)]
pub struct StageResultView {
    pub block_id: String,
    pub persisted: bool,
    pub field_errors: Vec<ErrorView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block: Option<BlockView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_block_id: Option<String>,
}

impl StageResultView {
    pub fn render(block_id: &str, outcome: &StageOutcome, messages: &dyn MessageCatalog) -> Self {
        let locale = outcome.view.preferred_locale();
        Self {
            block_id: block_id.to_string(),
            persisted: outcome.persisted,
            field_errors: outcome
                .field_errors
                .iter()
                .map(|error| ErrorView::render(error.message, Some(&error.path), messages, &locale))
                .collect(),
            block: outcome
                .view
                .block(block_id)
                .map(|block| BlockView::render(block, messages, &locale)),
            next_block_id: outcome
                .persisted
                .then(|| outcome.view.in_progress_block_after(block_id))
                .flatten()
                .map(|block| block.id().to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryView {
    pub applicant_id: ApplicantId,
    pub program_id: ProgramId,
    pub program_title: String,
    pub answers: Vec<AnswerView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnswerView {
    pub key: String,
    #[serde(flatten)]
    pub answer: AnswerData,
    pub answered_elsewhere: bool,
}

impl SummaryView {
    pub fn render(applicant_id: ApplicantId, view: &ReadOnlyApplicantProgramService) -> Self {
        Self {
            applicant_id,
            program_id: view.program().id(),
            program_title: view.program_title().to_string(),
            answers: view
                .summary_data()
                .into_iter()
                .map(|answer| AnswerView {
                    key: answer.key(),
                    answered_elsewhere: answer.answered_elsewhere(),
                    answer,
                })
                .collect(),
        }
    }
}
