use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::applicant::locale::Locale;
use crate::applicant::path::Path;
use crate::applicant::repository::MessageCatalog;

/// Structured validation failure with a stable message key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum ValidationErrorMessage {
    NoPoBox,
    StreetRequired,
    CityRequired,
    StateRequired,
    ZipRequired,
    InvalidZip,
    FirstNameRequired,
    LastNameRequired,
    NumberTooSmall { min: i64 },
    NumberTooLarge { max: i64 },
    TextTooShort { min: usize },
    TextTooLong { max: usize },
    TooFewSelections { min: usize },
    TooManySelections { max: usize },
    InvalidSelection,
    FileKeyRequired,
    EntityNameRequired,
    DuplicateEntityName,
    InvalidEntityIndex,
    InvalidNumber,
}

impl ValidationErrorMessage {
    pub const fn key(self) -> &'static str {
        match self {
            Self::NoPoBox => "validation.address.no_po_box",
            Self::StreetRequired => "validation.address.street_required",
            Self::CityRequired => "validation.address.city_required",
            Self::StateRequired => "validation.address.state_required",
            Self::ZipRequired => "validation.address.zip_required",
            Self::InvalidZip => "validation.address.invalid_zip",
            Self::FirstNameRequired => "validation.name.first_required",
            Self::LastNameRequired => "validation.name.last_required",
            Self::NumberTooSmall { .. } => "validation.number.too_small",
            Self::NumberTooLarge { .. } => "validation.number.too_large",
            Self::TextTooShort { .. } => "validation.text.too_short",
            Self::TextTooLong { .. } => "validation.text.too_long",
            Self::TooFewSelections { .. } => "validation.select.too_few",
            Self::TooManySelections { .. } => "validation.select.too_many",
            Self::InvalidSelection => "validation.select.invalid",
            Self::FileKeyRequired => "validation.file_upload.required",
            Self::EntityNameRequired => "validation.enumerator.entity_required",
            Self::DuplicateEntityName => "validation.enumerator.duplicate_entity",
            Self::InvalidEntityIndex => "validation.enumerator.invalid_entity",
            Self::InvalidNumber => "validation.number.invalid",
        }
    }

    /// Bound substituted for `{0}` in message templates.
    fn bound(self) -> Option<String> {
        match self {
            Self::NumberTooSmall { min } => Some(min.to_string()),
            Self::NumberTooLarge { max } => Some(max.to_string()),
            Self::TextTooShort { min } | Self::TooFewSelections { min } => Some(min.to_string()),
            Self::TextTooLong { max } | Self::TooManySelections { max } => Some(max.to_string()),
            _ => None,
        }
    }

    fn template(self) -> &'static str {
        match self {
            Self::NoPoBox => "Please enter a valid physical address. We cannot accept a PO Box.",
            Self::StreetRequired => "Please enter a valid street name and number.",
            Self::CityRequired => "Please enter a city.",
            Self::StateRequired => "Please enter a state.",
            Self::ZipRequired => "Please enter a ZIP code.",
            Self::InvalidZip => "Please enter a valid 5-digit ZIP code.",
            Self::FirstNameRequired => "Please enter your first name.",
            Self::LastNameRequired => "Please enter your last name.",
            Self::NumberTooSmall { .. } => "Must be at least {0}.",
            Self::NumberTooLarge { .. } => "Must be at most {0}.",
            Self::TextTooShort { .. } => "Must contain at least {0} characters.",
            Self::TextTooLong { .. } => "Must contain at most {0} characters.",
            Self::TooFewSelections { .. } => "Please select at least {0}.",
            Self::TooManySelections { .. } => "Please select at most {0}.",
            Self::InvalidSelection => "Please choose one of the listed options.",
            Self::FileKeyRequired => "Please upload a file.",
            Self::EntityNameRequired => "Please enter a value for each line.",
            Self::DuplicateEntityName => "Please enter a unique value for each line.",
            Self::InvalidEntityIndex => "Please choose an entry from the list to remove.",
            Self::InvalidNumber => "Please enter a whole number.",
        }
    }

    pub fn default_text(self) -> String {
        render(self.template(), self.bound())
    }

    /// Localized text from the catalog, falling back to the English default.
    pub fn message(self, catalog: &dyn MessageCatalog, locale: &Locale) -> String {
        match catalog.localized_string(self.key(), locale) {
            Some(template) => render(&template, self.bound()),
            None => self.default_text(),
        }
    }
}

fn render(template: &str, bound: Option<String>) -> String {
    match bound {
        Some(value) => template.replace("{0}", &value),
        None => template.to_string(),
    }
}

/// Errors raised for one applicant question.
///
/// Question-level errors concern the answer as a whole; scalar errors are keyed by the
/// contextualized path of the offending scalar.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QuestionErrors {
    question: BTreeSet<ValidationErrorMessage>,
    scalars: BTreeMap<Path, BTreeSet<ValidationErrorMessage>>,
}

impl QuestionErrors {
    pub fn question_error(&mut self, error: ValidationErrorMessage) {
        self.question.insert(error);
    }

    pub fn scalar_error(&mut self, path: Path, error: ValidationErrorMessage) {
        self.scalars.entry(path).or_default().insert(error);
    }

    pub fn is_empty(&self) -> bool {
        self.question.is_empty() && self.scalars.values().all(BTreeSet::is_empty)
    }

    pub fn question_errors(&self) -> &BTreeSet<ValidationErrorMessage> {
        &self.question
    }

    pub fn scalar_errors(&self) -> &BTreeMap<Path, BTreeSet<ValidationErrorMessage>> {
        &self.scalars
    }

    pub fn errors_for(&self, path: &Path) -> Option<&BTreeSet<ValidationErrorMessage>> {
        self.scalars.get(path)
    }

    /// Every error regardless of where it was raised.
    pub fn all(&self) -> BTreeSet<ValidationErrorMessage> {
        self.question
            .iter()
            .chain(self.scalars.values().flatten())
            .copied()
            .collect()
    }
}
