use super::{ApplicantQuestion, QuestionErrors, ValidationErrorMessage};
use crate::applicant::data::ApplicantData;
use crate::applicant::scalar::Scalar;

pub(super) fn validate(
    question: &ApplicantQuestion,
    data: &ApplicantData,
    min_length: Option<usize>,
    max_length: Option<usize>,
) -> QuestionErrors {
    let mut errors = QuestionErrors::default();
    let Some(value) = data.read_string(&question.scalar_path(Scalar::Text)) else {
        return errors;
    };

    let length = value.chars().count();
    if let Some(min) = min_length.filter(|min| length < *min) {
        errors.question_error(ValidationErrorMessage::TextTooShort { min });
    }
    if let Some(max) = max_length.filter(|max| length > *max) {
        errors.question_error(ValidationErrorMessage::TextTooLong { max });
    }
    errors
}

pub(super) fn answer_text(question: &ApplicantQuestion, data: &ApplicantData) -> String {
    data.read_string(&question.scalar_path(Scalar::Text))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::applicant::data::applicant_path;
    use crate::program::ProgramQuestionDefinition;
    use crate::question::{QuestionConfig, QuestionDefinition};

    fn nickname(value: &str) -> ApplicantQuestion {
        let mut data = ApplicantData::new();
        data.put_string(&applicant_path().join("nickname").join("text"), value)
            .expect("writes");
        ApplicantQuestion::new(
            ProgramQuestionDefinition::required(QuestionDefinition::new(
                1,
                "nickname",
                QuestionConfig::Text {
                    min_length: Some(2),
                    max_length: Some(5),
                },
            )),
            applicant_path(),
            &data,
        )
    }

    #[test]
    fn counts_characters_not_bytes() {
        assert!(nickname("José").errors().is_empty());
        assert_eq!(
            nickname("J").errors().question_errors().iter().copied().collect::<Vec<_>>(),
            vec![ValidationErrorMessage::TextTooShort { min: 2 }]
        );
        assert_eq!(
            nickname("Josephine").errors().question_errors().iter().copied().collect::<Vec<_>>(),
            vec![ValidationErrorMessage::TextTooLong { max: 5 }]
        );
    }
}
