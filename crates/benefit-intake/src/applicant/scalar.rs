use serde::{Deserialize, Serialize};

use crate::question::QuestionType;

/// Concrete fields backing a question's answer inside the applicant document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Scalar {
    City,
    /// Edit-only key naming entity positions to drop from an enumerator list; never stored.
    DeleteEntity,
    EntityName,
    FileKey,
    FirstName,
    LastName,
    Line2,
    MiddleName,
    Number,
    ProgramUpdatedIn,
    Selection,
    State,
    Street,
    Text,
    UpdatedAt,
    Zip,
}

impl Scalar {
    /// Lower snake case document key.
    pub const fn key(self) -> &'static str {
        match self {
            Self::City => "city",
            Self::DeleteEntity => "delete_entity",
            Self::EntityName => "entity_name",
            Self::FileKey => "file_key",
            Self::FirstName => "first_name",
            Self::LastName => "last_name",
            Self::Line2 => "line2",
            Self::MiddleName => "middle_name",
            Self::Number => "number",
            Self::ProgramUpdatedIn => "program_updated_in",
            Self::Selection => "selection",
            Self::State => "state",
            Self::Street => "street",
            Self::Text => "text",
            Self::UpdatedAt => "updated_at",
            Self::Zip => "zip",
        }
    }
}

/// Primitive storage type of a scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScalarType {
    String,
    Long,
    ListOfString,
    ListOfLong,
}

impl ScalarType {
    pub const fn is_list(self) -> bool {
        matches!(self, Self::ListOfString | Self::ListOfLong)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScalarError {
    #[error("{0:?} questions have no scalars of their own; entity names are handled separately")]
    InvalidQuestionType(QuestionType),
    #[error("question type {0:?} is not supported yet")]
    UnsupportedQuestionType(QuestionType),
}

const ADDRESS_SCALARS: &[(Scalar, ScalarType)] = &[
    (Scalar::Street, ScalarType::String),
    (Scalar::Line2, ScalarType::String),
    (Scalar::City, ScalarType::String),
    (Scalar::State, ScalarType::String),
    (Scalar::Zip, ScalarType::String),
];

const FILE_UPLOAD_SCALARS: &[(Scalar, ScalarType)] = &[(Scalar::FileKey, ScalarType::String)];

const MULTI_SELECT_SCALARS: &[(Scalar, ScalarType)] =
    &[(Scalar::Selection, ScalarType::ListOfLong)];

const NAME_SCALARS: &[(Scalar, ScalarType)] = &[
    (Scalar::FirstName, ScalarType::String),
    (Scalar::MiddleName, ScalarType::String),
    (Scalar::LastName, ScalarType::String),
];

const NUMBER_SCALARS: &[(Scalar, ScalarType)] = &[(Scalar::Number, ScalarType::Long)];

const SINGLE_SELECT_SCALARS: &[(Scalar, ScalarType)] = &[(Scalar::Selection, ScalarType::Long)];

const TEXT_SCALARS: &[(Scalar, ScalarType)] = &[(Scalar::Text, ScalarType::String)];

const METADATA_SCALARS: &[(Scalar, ScalarType)] = &[
    (Scalar::UpdatedAt, ScalarType::Long),
    (Scalar::ProgramUpdatedIn, ScalarType::Long),
];

/// Ordered scalars owned by a question type.
///
/// Enumerator questions store entity names under each entity element and report
/// `InvalidQuestionType`; callers special-case them.
pub fn scalars_for(
    question_type: QuestionType,
) -> Result<&'static [(Scalar, ScalarType)], ScalarError> {
    match question_type {
        QuestionType::Address => Ok(ADDRESS_SCALARS),
        QuestionType::FileUpload => Ok(FILE_UPLOAD_SCALARS),
        QuestionType::Name => Ok(NAME_SCALARS),
        QuestionType::Number => Ok(NUMBER_SCALARS),
        QuestionType::Text => Ok(TEXT_SCALARS),
        QuestionType::Checkbox => Ok(MULTI_SELECT_SCALARS),
        QuestionType::Dropdown | QuestionType::RadioButton => Ok(SINGLE_SELECT_SCALARS),
        QuestionType::Enumerator => Err(ScalarError::InvalidQuestionType(question_type)),
        QuestionType::Date => Err(ScalarError::UnsupportedQuestionType(question_type)),
    }
}

/// Scalars stamped on every answered question regardless of type.
pub fn metadata_scalars() -> &'static [(Scalar, ScalarType)] {
    METADATA_SCALARS
}

/// Keys user-supplied update paths must never end in.
pub fn metadata_scalar_keys() -> impl Iterator<Item = &'static str> {
    METADATA_SCALARS.iter().map(|(scalar, _)| scalar.key())
}

pub fn is_metadata_key(key: &str) -> bool {
    metadata_scalar_keys().any(|reserved| reserved == key)
}
