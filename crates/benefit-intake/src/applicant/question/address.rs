use std::sync::LazyLock;

use regex::Regex;

use super::{present, ApplicantQuestion, QuestionErrors, ValidationErrorMessage};
use crate::applicant::data::ApplicantData;
use crate::applicant::scalar::Scalar;

static PO_BOX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)P(OST|.)?\s*((O(FF(ICE)?)?)?.?\s*(B(IN|OX|.?)))+")
        .expect("PO box pattern compiles")
});

static ZIP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{5}(?:-[0-9]{4})?$").expect("zip pattern compiles"));

/// Answering any part of an address commits the applicant to street, city and state.
pub(super) fn validate(
    question: &ApplicantQuestion,
    data: &ApplicantData,
    disallow_po_box: bool,
) -> QuestionErrors {
    let mut errors = QuestionErrors::default();
    let street = present(data, &question.scalar_path(Scalar::Street));

    if disallow_po_box && street.as_deref().is_some_and(|value| PO_BOX.is_match(value)) {
        errors.question_error(ValidationErrorMessage::NoPoBox);
    }

    for (scalar, error) in [
        (Scalar::Street, ValidationErrorMessage::StreetRequired),
        (Scalar::City, ValidationErrorMessage::CityRequired),
        (Scalar::State, ValidationErrorMessage::StateRequired),
    ] {
        let path = question.scalar_path(scalar);
        if present(data, &path).is_none() {
            errors.scalar_error(path, error);
        }
    }

    let zip_path = question.scalar_path(Scalar::Zip);
    if data.has_path(&zip_path) {
        match present(data, &zip_path) {
            None => errors.scalar_error(zip_path, ValidationErrorMessage::ZipRequired),
            Some(zip) if !ZIP.is_match(&zip) => {
                errors.scalar_error(zip_path, ValidationErrorMessage::InvalidZip)
            }
            Some(_) => {}
        }
    }

    errors
}

pub(super) fn answer_text(question: &ApplicantQuestion, data: &ApplicantData) -> String {
    let part = |scalar| present(data, &question.scalar_path(scalar));
    let locality = [part(Scalar::State), part(Scalar::Zip)]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ");

    [part(Scalar::Street), part(Scalar::Line2), part(Scalar::City)]
        .into_iter()
        .flatten()
        .chain((!locality.is_empty()).then_some(locality))
        .collect::<Vec<_>>()
        .join(", ")
}
