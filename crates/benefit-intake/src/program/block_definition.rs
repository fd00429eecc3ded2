use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::predicate::PredicateDefinition;
use super::{BlockDefinitionId, Memo};
use crate::applicant::path::Path;
use crate::applicant::scalar::ScalarType;
use crate::question::{QuestionDefinition, QuestionId, QuestionType};

/// A question placed in a block, with its per-program optionality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramQuestionDefinition {
    pub question: QuestionDefinition,
    #[serde(default)]
    pub optional: bool,
}

impl ProgramQuestionDefinition {
    pub fn required(question: QuestionDefinition) -> Self {
        Self {
            question,
            optional: false,
        }
    }

    pub fn optional(question: QuestionDefinition) -> Self {
        Self {
            question,
            optional: true,
        }
    }

    pub fn id(&self) -> QuestionId {
        self.question.id
    }
}

/// One page of questions. Repeated when `enumerator_id` names an enumerator block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockDefinition {
    id: BlockDefinitionId,
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    enumerator_id: Option<BlockDefinitionId>,
    #[serde(default)]
    hide_predicate: Option<PredicateDefinition>,
    #[serde(default)]
    optional_predicate: Option<PredicateDefinition>,
    questions: Vec<ProgramQuestionDefinition>,
    #[serde(skip)]
    scalar_types: Memo<BTreeMap<Path, ScalarType>>,
}

impl BlockDefinition {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id: BlockDefinitionId(id),
            name: name.into(),
            description: String::new(),
            enumerator_id: None,
            hide_predicate: None,
            optional_predicate: None,
            questions: Vec::new(),
            scalar_types: Memo::default(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_question(mut self, question: ProgramQuestionDefinition) -> Self {
        self.questions.push(question);
        self.scalar_types = Memo::default();
        self
    }

    pub fn repeated_for(mut self, enumerator: BlockDefinitionId) -> Self {
        self.enumerator_id = Some(enumerator);
        self
    }

    pub fn hidden_when(mut self, predicate: PredicateDefinition) -> Self {
        self.hide_predicate = Some(predicate);
        self
    }

    pub fn optional_when(mut self, predicate: PredicateDefinition) -> Self {
        self.optional_predicate = Some(predicate);
        self
    }

    pub fn id(&self) -> BlockDefinitionId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn enumerator_id(&self) -> Option<BlockDefinitionId> {
        self.enumerator_id
    }

    pub fn is_repeated(&self) -> bool {
        self.enumerator_id.is_some()
    }

    /// True iff the block holds exactly one question and it is an enumerator.
    pub fn is_enumerator(&self) -> bool {
        matches!(self.questions.as_slice(), [only] if only.question.is_enumerator())
    }

    /// The enumerator question of an enumerator block.
    pub fn enumerator_question(&self) -> Option<&QuestionDefinition> {
        if self.is_enumerator() {
            self.questions.first().map(|question| &question.question)
        } else {
            None
        }
    }

    pub fn hide_predicate(&self) -> Option<&PredicateDefinition> {
        self.hide_predicate.as_ref()
    }

    pub fn optional_predicate(&self) -> Option<&PredicateDefinition> {
        self.optional_predicate.as_ref()
    }

    pub fn questions(&self) -> &[ProgramQuestionDefinition] {
        &self.questions
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    pub fn has_question(&self, question_id: QuestionId) -> bool {
        self.questions
            .iter()
            .any(|question| question.id() == question_id)
    }

    /// Union of every question's scalars, metadata included, relative to the block context.
    ///
    /// Enumerator questions own no scalars and unmodeled types are skipped; program
    /// validation rejects both misuses before a definition reaches applicants.
    pub fn scalar_types(&self) -> &BTreeMap<Path, ScalarType> {
        self.scalar_types.get_or_init(|| {
            self.relative_scalars()
                .into_iter()
                .map(|(path, scalar_type, _)| (path, scalar_type))
                .collect()
        })
    }

    /// Relative scalar paths tagged with the question that owns them, in declaration order.
    pub(crate) fn relative_scalars(&self) -> Vec<(Path, ScalarType, QuestionId)> {
        let root = Path::root();
        self.questions
            .iter()
            .filter(|question| question.question.question_type() != QuestionType::Enumerator)
            .filter_map(|question| {
                question
                    .question
                    .contextualized_scalars(&root)
                    .ok()
                    .map(|scalars| (question.id(), scalars))
            })
            .flat_map(|(question_id, scalars)| {
                scalars
                    .into_iter()
                    .map(move |(path, scalar_type)| (path, scalar_type, question_id))
            })
            .collect()
    }
}
