use std::collections::BTreeMap;

use super::data::ApplicantData;
use super::path::Path;
use super::question::ApplicantQuestion;
use super::scalar::{Scalar, ScalarType};
use crate::program::{BlockDefinition, ProgramId};
use crate::question::QuestionId;

/// One concrete, applicant-specific block: a definition bound to a context path.
///
/// Repeated blocks carry the entity they were instantiated for. All derived state is
/// computed once from the document snapshot the block was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    id: String,
    definition: BlockDefinition,
    context: Path,
    entity_name: Option<String>,
    questions: Vec<ApplicantQuestion>,
    scalar_types: BTreeMap<Path, ScalarType>,
    hidden: bool,
    optional: bool,
}

impl Block {
    pub(crate) fn new(
        id: String,
        definition: &BlockDefinition,
        context: Path,
        entity_name: Option<String>,
        data: &ApplicantData,
        hidden: bool,
        optional: bool,
    ) -> Self {
        let questions = definition
            .questions()
            .iter()
            .map(|question| ApplicantQuestion::new(question.clone(), context.clone(), data))
            .collect();
        let scalar_types = definition
            .scalar_types()
            .iter()
            .map(|(relative, scalar_type)| (context.concat(relative), *scalar_type))
            .collect();

        Self {
            id,
            definition: definition.clone(),
            context,
            entity_name,
            questions,
            scalar_types,
            hidden,
            optional,
        }
    }

    /// Synthesized id: the definition id, then one `-index` per enclosing entity.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn definition(&self) -> &BlockDefinition {
        &self.definition
    }

    pub fn name(&self) -> &str {
        self.definition.name()
    }

    pub fn description(&self) -> &str {
        self.definition.description()
    }

    pub fn context(&self) -> &Path {
        &self.context
    }

    pub fn entity_name(&self) -> Option<&str> {
        self.entity_name.as_deref()
    }

    pub fn is_repeated(&self) -> bool {
        self.definition.is_repeated()
    }

    pub fn is_enumerator(&self) -> bool {
        self.definition.is_enumerator()
    }

    pub fn questions(&self) -> &[ApplicantQuestion] {
        &self.questions
    }

    pub fn question(&self, question_id: QuestionId) -> Option<&ApplicantQuestion> {
        self.questions
            .iter()
            .find(|question| question.id() == question_id)
    }

    /// List path holding the entities of an enumerator block.
    pub fn enumerator_path(&self) -> Option<Path> {
        self.definition
            .enumerator_question()
            .map(|question| question.contextualized_path(&self.context))
    }

    /// Contextualized scalar schema, metadata scalars included.
    pub fn scalar_types(&self) -> &BTreeMap<Path, ScalarType> {
        &self.scalar_types
    }

    /// Declared type of an edit path; indexed list paths resolve through their list.
    ///
    /// Enumerator blocks also accept the entity list itself, `<list>.delete_entity` (a list of
    /// entity positions), and `<list>[i].entity_name`.
    pub fn scalar_type(&self, path: &Path) -> Option<ScalarType> {
        if let Some(scalar_type) = self.scalar_types.get(&path.without_array_reference()) {
            return Some(*scalar_type);
        }

        let list = self.enumerator_path()?;
        if path == &list {
            return Some(ScalarType::ListOfString);
        }
        if path.without_array_reference() == list.join_scalar(Scalar::DeleteEntity) {
            return Some(ScalarType::ListOfLong);
        }
        let parent = path.parent_path();
        let names_entity = path.key_name() == Scalar::EntityName.key()
            && !path.is_array_element()
            && parent.is_array_element()
            && parent.without_array_reference() == list;
        names_entity.then_some(ScalarType::String)
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// Hidden blocks never report errors.
    pub fn has_errors(&self) -> bool {
        !self.hidden && self.questions.iter().any(ApplicantQuestion::has_errors)
    }

    /// Hidden blocks are complete; otherwise no errors and every required question answered.
    pub fn is_complete(&self) -> bool {
        if self.hidden {
            return true;
        }
        if self.has_errors() {
            return false;
        }
        self.optional
            || self
                .questions
                .iter()
                .filter(|question| !question.is_optional())
                .all(ApplicantQuestion::is_answered)
    }

    pub fn answered_question_count(&self) -> usize {
        self.questions
            .iter()
            .filter(|question| question.is_answered())
            .count()
    }

    /// True when any question was last answered while applying to `program`.
    pub fn was_updated_in_program(&self, data: &ApplicantData, program: ProgramId) -> bool {
        self.questions.iter().any(|question| {
            question
                .updated_in_program(data)
                .is_some_and(|stored| program.is_stamped_as(stored))
        })
    }
}
