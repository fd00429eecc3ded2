//! Read-only traversal of one applicant's progress through one program.
//!
//! Block expansion is a pure function of the program and a document snapshot and is
//! recomputed for every view, so entity list changes are never served stale.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use super::block::Block;
use super::data::{applicant_path, ApplicantData};
use super::locale::Locale;
use super::path::Path;
use super::predicate::{PredicateEvaluator, PredicateRole, PredicateWarning};
use super::question::enumerator_entity_names;
use super::summary::AnswerData;
use crate::program::{BlockDefinition, BlockDefinitionId, PredicateDefinition, ProgramDefinition};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NavigationError {
    #[error("block {0} not found")]
    BlockNotFound(String),
}

/// Concrete block list plus navigation queries for an applicant and program.
#[derive(Debug, Clone)]
pub struct ReadOnlyApplicantProgramService {
    data: Arc<ApplicantData>,
    program: Arc<ProgramDefinition>,
    blocks: Vec<Block>,
    index: HashMap<String, usize>,
    in_progress: Vec<usize>,
    warnings: Vec<PredicateWarning>,
}

impl ReadOnlyApplicantProgramService {
    pub fn new(data: Arc<ApplicantData>, program: Arc<ProgramDefinition>) -> Self {
        let (blocks, warnings) = Expansion::run(&program, &data);
        let index = blocks
            .iter()
            .enumerate()
            .map(|(position, block)| (block.id().to_string(), position))
            .collect();
        let in_progress = blocks
            .iter()
            .enumerate()
            .filter(|(_, block)| {
                !block.is_hidden()
                    && (!block.is_complete()
                        || block.has_errors()
                        || block.was_updated_in_program(&data, program.id()))
            })
            .map(|(position, _)| position)
            .collect();

        Self {
            data,
            program,
            blocks,
            index,
            in_progress,
            warnings,
        }
    }

    pub fn applicant_data(&self) -> &ApplicantData {
        &self.data
    }

    pub fn program(&self) -> &ProgramDefinition {
        &self.program
    }

    pub fn preferred_locale(&self) -> Locale {
        self.data.preferred_locale()
    }

    /// Localized program name with language fallback.
    pub fn program_title(&self) -> &str {
        self.program
            .localized_name()
            .get_or_default(&self.preferred_locale())
    }

    /// True when the program and all of its question text exist in the applicant's language.
    pub fn preferred_language_supported(&self) -> bool {
        let locale = self.preferred_locale();
        self.program.localized_name().supports(&locale)
            && self.program.block_definitions().iter().all(|block| {
                block
                    .questions()
                    .iter()
                    .all(|question| question.question.question_text.supports(&locale))
            })
    }

    /// Every concrete block in depth-first order, repeated blocks expanded per entity.
    pub fn all_blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Visible blocks that are incomplete, erroring, or were answered in this program.
    pub fn in_progress_blocks(&self) -> Vec<&Block> {
        self.in_progress
            .iter()
            .map(|position| &self.blocks[*position])
            .collect()
    }

    pub fn block(&self, block_id: &str) -> Option<&Block> {
        self.index
            .get(block_id)
            .map(|position| &self.blocks[*position])
    }

    pub fn block_index(&self, block_id: &str) -> Result<usize, NavigationError> {
        self.index
            .get(block_id)
            .copied()
            .ok_or_else(|| NavigationError::BlockNotFound(block_id.to_string()))
    }

    /// Next in-progress block after `block_id`.
    ///
    /// When `block_id` is not itself in progress, the first in-progress block positioned
    /// after it in the full list is returned.
    pub fn in_progress_block_after(&self, block_id: &str) -> Option<&Block> {
        let position = self.block_index(block_id).ok()?;
        self.in_progress
            .iter()
            .find(|candidate| **candidate > position)
            .map(|candidate| &self.blocks[*candidate])
    }

    pub fn first_incomplete_block(&self) -> Option<&Block> {
        self.blocks.iter().find(|block| !block.is_complete())
    }

    pub fn predicate_warnings(&self) -> &[PredicateWarning] {
        &self.warnings
    }

    /// One entry per question of every visible block, in block order.
    pub fn summary_data(&self) -> Vec<AnswerData> {
        let locale = self.preferred_locale();
        self.blocks
            .iter()
            .filter(|block| !block.is_hidden())
            .flat_map(|block| {
                block
                    .questions()
                    .iter()
                    .enumerate()
                    .map(move |(question_index, question)| (block, question_index, question))
            })
            .map(|(block, question_index, question)| AnswerData {
                program_id: self.program.id(),
                block_id: block.id().to_string(),
                question_index,
                question_id: question.id(),
                question_type: question.question_type(),
                context_path: question.path(),
                question_text: question.question_text(&locale).to_string(),
                answer_text: question.answer_text(&self.data, &locale),
                is_answered: question.is_answered(),
                entity_name: block.entity_name().map(str::to_string),
                updated_at: question.updated_at(&self.data),
                updated_in_program: question.updated_in_program(&self.data),
            })
            .collect()
    }
}

/// Depth-first, entity-major expansion of a program's blocks.
struct Expansion<'a> {
    program: &'a ProgramDefinition,
    data: &'a ApplicantData,
    children: BTreeMap<BlockDefinitionId, Vec<&'a BlockDefinition>>,
    blocks: Vec<Block>,
    warnings: Vec<PredicateWarning>,
}

impl<'a> Expansion<'a> {
    fn run(
        program: &'a ProgramDefinition,
        data: &'a ApplicantData,
    ) -> (Vec<Block>, Vec<PredicateWarning>) {
        let mut children: BTreeMap<BlockDefinitionId, Vec<&'a BlockDefinition>> = BTreeMap::new();
        for block in program.block_definitions() {
            if let Some(enumerator) = block.enumerator_id() {
                children.entry(enumerator).or_default().push(block);
            }
        }

        let mut expansion = Self {
            program,
            data,
            children,
            blocks: Vec::with_capacity(program.block_count()),
            warnings: Vec::new(),
        };
        for block in program.non_repeated_block_definitions() {
            expansion.expand(block, applicant_path(), None, &[]);
        }
        (expansion.blocks, expansion.warnings)
    }

    fn expand(
        &mut self,
        definition: &'a BlockDefinition,
        context: Path,
        entity_name: Option<String>,
        indices: &[usize],
    ) {
        let id = indices
            .iter()
            .fold(definition.id().to_string(), |id, index| format!("{id}-{index}"));
        let block = self.build(id, definition, context.clone(), entity_name);
        self.blocks.push(block);

        let Some(question) = definition.enumerator_question() else {
            return;
        };
        let list = question.contextualized_path(&context);
        let Some(children) = self.children.get(&definition.id()).cloned() else {
            return;
        };

        for (index, name) in enumerator_entity_names(&list, self.data)
            .into_iter()
            .enumerate()
        {
            let mut child_indices = indices.to_vec();
            child_indices.push(index);
            for child in &children {
                self.expand(child, list.at_index(index), Some(name.clone()), &child_indices);
            }
        }
    }

    fn build(
        &mut self,
        id: String,
        definition: &BlockDefinition,
        context: Path,
        entity_name: Option<String>,
    ) -> Block {
        let hidden = self.evaluate(&id, definition, &context, PredicateRole::Hide);
        let optional = self.evaluate(&id, definition, &context, PredicateRole::Optional);
        Block::new(id, definition, context, entity_name, self.data, hidden, optional)
    }

    /// Fails open: an anomaly counts as false and is recorded as a warning.
    fn evaluate(
        &mut self,
        block_id: &str,
        definition: &BlockDefinition,
        context: &Path,
        role: PredicateRole,
    ) -> bool {
        let predicate: Option<&PredicateDefinition> = match role {
            PredicateRole::Hide => definition.hide_predicate(),
            PredicateRole::Optional => definition.optional_predicate(),
        };
        let Some(predicate) = predicate else {
            return false;
        };

        PredicateEvaluator::new(self.program, self.data, definition, context)
            .evaluate(predicate)
            .unwrap_or_else(|anomaly| {
                self.warnings.push(PredicateWarning {
                    block_id: block_id.to_string(),
                    role,
                    anomaly,
                });
                false
            })
    }
}
