use super::{ApplicantQuestion, QuestionErrors, ValidationErrorMessage};
use crate::applicant::data::ApplicantData;
use crate::applicant::locale::Locale;
use crate::applicant::scalar::Scalar;
use crate::question::QuestionOption;

fn is_known(options: &[QuestionOption], selected: i64) -> bool {
    options.iter().any(|option| option.id == selected)
}

pub(super) fn validate_single(
    question: &ApplicantQuestion,
    data: &ApplicantData,
    options: &[QuestionOption],
) -> QuestionErrors {
    let mut errors = QuestionErrors::default();
    let path = question.scalar_path(Scalar::Selection);
    if let Some(selected) = data.read_long(&path) {
        if !is_known(options, selected) {
            errors.scalar_error(path, ValidationErrorMessage::InvalidSelection);
        }
    }
    errors
}

/// Choice-count bounds are question-level; unknown option ids are pinned to the selection.
pub(super) fn validate_multi(
    question: &ApplicantQuestion,
    data: &ApplicantData,
    options: &[QuestionOption],
    min_choices: Option<usize>,
    max_choices: Option<usize>,
) -> QuestionErrors {
    let mut errors = QuestionErrors::default();
    let path = question.scalar_path(Scalar::Selection);
    let selected = data.read_long_list(&path).unwrap_or_default();

    if let Some(min) = min_choices.filter(|min| selected.len() < *min) {
        errors.question_error(ValidationErrorMessage::TooFewSelections { min });
    }
    if let Some(max) = max_choices.filter(|max| selected.len() > *max) {
        errors.question_error(ValidationErrorMessage::TooManySelections { max });
    }
    if selected.iter().any(|id| !is_known(options, *id)) {
        errors.scalar_error(path, ValidationErrorMessage::InvalidSelection);
    }
    errors
}

pub(super) fn single_answer_text(
    question: &ApplicantQuestion,
    data: &ApplicantData,
    locale: &Locale,
) -> String {
    data.read_long(&question.scalar_path(Scalar::Selection))
        .and_then(|selected| question.definition().option_text(selected, locale))
        .map(str::to_string)
        .unwrap_or_default()
}

pub(super) fn multi_answer_text(
    question: &ApplicantQuestion,
    data: &ApplicantData,
    locale: &Locale,
) -> String {
    data.read_long_list(&question.scalar_path(Scalar::Selection))
        .unwrap_or_default()
        .into_iter()
        .filter_map(|selected| question.definition().option_text(selected, locale))
        .collect::<Vec<_>>()
        .join(", ")
}
