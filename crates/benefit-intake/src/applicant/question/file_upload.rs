use super::{present, ApplicantQuestion, QuestionErrors, ValidationErrorMessage};
use crate::applicant::data::ApplicantData;
use crate::applicant::scalar::Scalar;

pub(super) fn validate(question: &ApplicantQuestion, data: &ApplicantData) -> QuestionErrors {
    let mut errors = QuestionErrors::default();
    let path = question.scalar_path(Scalar::FileKey);
    if present(data, &path).is_none() {
        errors.scalar_error(path, ValidationErrorMessage::FileKeyRequired);
    }
    errors
}

/// The storage key; rendering a download link is the caller's job.
pub(super) fn answer_text(question: &ApplicantQuestion, data: &ApplicantData) -> String {
    present(data, &question.scalar_path(Scalar::FileKey)).unwrap_or_default()
}
