//! Administrator-authored question definitions.
//!
//! Definitions are immutable once loaded; applicant-facing behavior lives in
//! [`crate::applicant::question`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::applicant::locale::{Locale, LocalizedStrings};
use crate::applicant::path::Path;
use crate::applicant::scalar::{self, Scalar, ScalarError, ScalarType};

/// Identifier wrapper for question definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(pub u64);

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Closed set of question types understood by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionType {
    Address,
    Checkbox,
    Date,
    Dropdown,
    Enumerator,
    FileUpload,
    Name,
    Number,
    RadioButton,
    Text,
}

impl QuestionType {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Address => "address",
            Self::Checkbox => "checkbox",
            Self::Date => "date",
            Self::Dropdown => "dropdown",
            Self::Enumerator => "enumerator",
            Self::FileUpload => "file_upload",
            Self::Name => "name",
            Self::Number => "number",
            Self::RadioButton => "radio_button",
            Self::Text => "text",
        }
    }

    pub const fn is_multi_option(self) -> bool {
        matches!(self, Self::Checkbox | Self::Dropdown | Self::RadioButton)
    }
}

/// One selectable answer of a multi-option question. Applicants store the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub id: i64,
    pub text: LocalizedStrings,
}

impl QuestionOption {
    pub fn new(id: i64, text: impl Into<String>) -> Self {
        Self {
            id,
            text: LocalizedStrings::default_text(text),
        }
    }
}

/// Type tag plus the admin-configured validation parameters for that type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionConfig {
    Address {
        #[serde(default)]
        disallow_po_box: bool,
    },
    Checkbox {
        options: Vec<QuestionOption>,
        #[serde(default)]
        min_choices: Option<usize>,
        #[serde(default)]
        max_choices: Option<usize>,
    },
    Date,
    Dropdown {
        options: Vec<QuestionOption>,
    },
    Enumerator {
        #[serde(default)]
        entity_type: LocalizedStrings,
    },
    FileUpload,
    Name,
    Number {
        #[serde(default)]
        min: Option<i64>,
        #[serde(default)]
        max: Option<i64>,
    },
    RadioButton {
        options: Vec<QuestionOption>,
    },
    Text {
        #[serde(default)]
        min_length: Option<usize>,
        #[serde(default)]
        max_length: Option<usize>,
    },
}

impl QuestionConfig {
    pub const fn question_type(&self) -> QuestionType {
        match self {
            Self::Address { .. } => QuestionType::Address,
            Self::Checkbox { .. } => QuestionType::Checkbox,
            Self::Date => QuestionType::Date,
            Self::Dropdown { .. } => QuestionType::Dropdown,
            Self::Enumerator { .. } => QuestionType::Enumerator,
            Self::FileUpload => QuestionType::FileUpload,
            Self::Name => QuestionType::Name,
            Self::Number { .. } => QuestionType::Number,
            Self::RadioButton { .. } => QuestionType::RadioButton,
            Self::Text { .. } => QuestionType::Text,
        }
    }

    pub fn options(&self) -> &[QuestionOption] {
        match self {
            Self::Checkbox { options, .. }
            | Self::Dropdown { options }
            | Self::RadioButton { options } => options,
            _ => &[],
        }
    }
}

/// Immutable description of one question. Identity is `(id, version)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionDefinition {
    pub id: QuestionId,
    #[serde(default = "first_version")]
    pub version: u32,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub path_segment: String,
    #[serde(default)]
    pub enumerator_id: Option<QuestionId>,
    pub question_text: LocalizedStrings,
    #[serde(default)]
    pub help_text: LocalizedStrings,
    pub config: QuestionConfig,
}

fn first_version() -> u32 {
    1
}

impl QuestionDefinition {
    /// Start a definition whose path segment is derived from `name`.
    pub fn new(id: u64, name: impl Into<String>, config: QuestionConfig) -> Self {
        let name = name.into();
        Self {
            id: QuestionId(id),
            version: first_version(),
            path_segment: path_segment_for(&name),
            question_text: LocalizedStrings::default_text(name.clone()),
            name,
            description: String::new(),
            enumerator_id: None,
            help_text: LocalizedStrings::default(),
            config,
        }
    }

    pub fn with_text(mut self, question_text: LocalizedStrings) -> Self {
        self.question_text = question_text;
        self
    }

    pub fn with_help_text(mut self, help_text: LocalizedStrings) -> Self {
        self.help_text = help_text;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// Mark the question as answered once per entity of `enumerator`.
    pub fn repeated_for(mut self, enumerator: QuestionId) -> Self {
        self.enumerator_id = Some(enumerator);
        self
    }

    pub fn question_type(&self) -> QuestionType {
        self.config.question_type()
    }

    pub fn is_enumerator(&self) -> bool {
        self.question_type() == QuestionType::Enumerator
    }

    pub fn options(&self) -> &[QuestionOption] {
        self.config.options()
    }

    pub fn option_text(&self, option_id: i64, locale: &Locale) -> Option<&str> {
        self.options()
            .iter()
            .find(|option| option.id == option_id)
            .map(|option| option.text.get_or_default(locale))
    }

    /// Where this question's answers live for a given context path.
    pub fn contextualized_path(&self, context: &Path) -> Path {
        context.join(&self.path_segment)
    }

    /// Owned scalars with their types, relative to the question path.
    pub fn scalars(&self) -> Result<&'static [(Scalar, ScalarType)], ScalarError> {
        scalar::scalars_for(self.question_type())
    }

    /// Scalar paths for a context, including the metadata scalars.
    pub fn contextualized_scalars(
        &self,
        context: &Path,
    ) -> Result<Vec<(Path, ScalarType)>, ScalarError> {
        let question_path = self.contextualized_path(context);
        Ok(self
            .scalars()?
            .iter()
            .chain(scalar::metadata_scalars())
            .map(|(scalar, scalar_type)| (question_path.join_scalar(*scalar), *scalar_type))
            .collect())
    }
}

/// Lower snake case key derived from an admin-facing name.
pub fn path_segment_for(name: &str) -> String {
    let mut segment = String::with_capacity(name.len());
    for c in name.trim().chars() {
        if c.is_ascii_alphanumeric() {
            segment.push(c.to_ascii_lowercase());
        } else if !segment.ends_with('_') && !segment.is_empty() {
            segment.push('_');
        }
    }
    let segment = segment.trim_end_matches('_').to_string();

    match segment.chars().next() {
        Some(first) if first.is_ascii_lowercase() => segment,
        Some(_) => format!("q_{segment}"),
        None => "question".to_string(),
    }
}
