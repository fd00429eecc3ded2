use std::collections::BTreeSet;

use super::{ApplicantQuestion, QuestionErrors, ValidationErrorMessage};
use crate::applicant::data::ApplicantData;
use crate::applicant::path::Path;
use crate::applicant::scalar::Scalar;

/// Names stored at `<list>[i].entity_name`, blank where an element has none.
pub(crate) fn entity_names(list: &Path, data: &ApplicantData) -> Vec<String> {
    (0..data.array_len(list))
        .map(|index| {
            data.read_string(&list.at_index(index).join_scalar(Scalar::EntityName))
                .unwrap_or_default()
        })
        .collect()
}

pub(super) fn validate(question: &ApplicantQuestion, data: &ApplicantData) -> QuestionErrors {
    let mut errors = QuestionErrors::default();
    let mut seen = BTreeSet::new();

    for name in entity_names(&question.path(), data) {
        let name = name.trim().to_lowercase();
        if name.is_empty() {
            errors.question_error(ValidationErrorMessage::EntityNameRequired);
        } else if !seen.insert(name) {
            errors.question_error(ValidationErrorMessage::DuplicateEntityName);
        }
    }
    errors
}
