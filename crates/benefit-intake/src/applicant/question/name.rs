use super::{present, ApplicantQuestion, QuestionErrors, ValidationErrorMessage};
use crate::applicant::data::ApplicantData;
use crate::applicant::scalar::Scalar;

pub(super) fn validate(question: &ApplicantQuestion, data: &ApplicantData) -> QuestionErrors {
    let mut errors = QuestionErrors::default();
    for (scalar, error) in [
        (Scalar::FirstName, ValidationErrorMessage::FirstNameRequired),
        (Scalar::LastName, ValidationErrorMessage::LastNameRequired),
    ] {
        let path = question.scalar_path(scalar);
        if present(data, &path).is_none() {
            errors.scalar_error(path, error);
        }
    }
    errors
}

pub(super) fn answer_text(question: &ApplicantQuestion, data: &ApplicantData) -> String {
    [Scalar::FirstName, Scalar::MiddleName, Scalar::LastName]
        .into_iter()
        .filter_map(|scalar| present(data, &question.scalar_path(scalar)))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::applicant::data::applicant_path;
    use crate::applicant::locale::Locale;
    use crate::applicant::path::Path;
    use crate::program::ProgramQuestionDefinition;
    use crate::question::{QuestionConfig, QuestionDefinition};

    fn name_question(data: &ApplicantData) -> ApplicantQuestion {
        ApplicantQuestion::new(
            ProgramQuestionDefinition::required(QuestionDefinition::new(
                1,
                "name",
                QuestionConfig::Name,
            )),
            applicant_path(),
            data,
        )
    }

    #[test]
    fn partially_answered_name_requires_first_and_last() {
        let mut data = ApplicantData::new();
        data.put_string(&Path::parse("applicant.name.middle_name").expect("valid"), "Q")
            .expect("writes");

        let question = name_question(&data);

        assert!(question.is_answered());
        assert_eq!(
            question.errors().all().into_iter().collect::<Vec<_>>(),
            vec![
                ValidationErrorMessage::FirstNameRequired,
                ValidationErrorMessage::LastNameRequired
            ]
        );
    }

    #[test]
    fn full_name_reads_in_order() {
        let mut data = ApplicantData::new();
        data.put_string(&Path::parse("applicant.name.first_name").expect("valid"), "Alice")
            .expect("writes");
        data.put_string(&Path::parse("applicant.name.last_name").expect("valid"), "Doe")
            .expect("writes");

        let question = name_question(&data);

        assert!(!question.has_errors());
        assert_eq!(question.answer_text(&data, &Locale::default()), "Alice Doe");
    }
}
