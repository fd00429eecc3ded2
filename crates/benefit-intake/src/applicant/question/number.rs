use super::{ApplicantQuestion, QuestionErrors, ValidationErrorMessage};
use crate::applicant::data::ApplicantData;
use crate::applicant::scalar::Scalar;

pub(super) fn validate(
    question: &ApplicantQuestion,
    data: &ApplicantData,
    min: Option<i64>,
    max: Option<i64>,
) -> QuestionErrors {
    let mut errors = QuestionErrors::default();
    let Some(value) = data.read_long(&question.scalar_path(Scalar::Number)) else {
        return errors;
    };

    if let Some(min) = min.filter(|min| value < *min) {
        errors.question_error(ValidationErrorMessage::NumberTooSmall { min });
    }
    if let Some(max) = max.filter(|max| value > *max) {
        errors.question_error(ValidationErrorMessage::NumberTooLarge { max });
    }
    errors
}

pub(super) fn answer_text(question: &ApplicantQuestion, data: &ApplicantData) -> String {
    data.read_long(&question.scalar_path(Scalar::Number))
        .map(|value| value.to_string())
        .unwrap_or_default()
}
