use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::block_definition::{BlockDefinition, ProgramQuestionDefinition};
use super::{BlockDefinitionId, ProgramId};
use crate::applicant::locale::LocalizedStrings;
use crate::applicant::path::Path;
use crate::question::{QuestionDefinition, QuestionId, QuestionType};

/// Structural problems in a program definition, plus lookup failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProgramError {
    #[error("block definition {0} appears more than once")]
    DuplicateBlockId(BlockDefinitionId),
    #[error("block definition {block} references missing enumerator block {enumerator}")]
    MissingEnumerator {
        block: BlockDefinitionId,
        enumerator: BlockDefinitionId,
    },
    #[error("block definition {block} references block {enumerator}, which is not an enumerator")]
    NotAnEnumerator {
        block: BlockDefinitionId,
        enumerator: BlockDefinitionId,
    },
    #[error("block definition {0} mixes an enumerator question with other questions")]
    MixedEnumeratorBlock(BlockDefinitionId),
    #[error("block definition {0} is part of an enumerator cycle")]
    EnumeratorCycle(BlockDefinitionId),
    #[error("question {question} in block {block} does not belong to that block's enumerator")]
    QuestionEnumeratorMismatch {
        block: BlockDefinitionId,
        question: QuestionId,
    },
    #[error("question {question} in block {block} has unsupported type {question_type:?}")]
    UnsupportedQuestionType {
        block: BlockDefinitionId,
        question: QuestionId,
        question_type: QuestionType,
    },
    #[error("block definition {block} declares scalar path '{path}' twice")]
    DuplicateScalarPath {
        block: BlockDefinitionId,
        path: Path,
    },
    #[error("block definition {0} not found")]
    BlockDefinitionNotFound(BlockDefinitionId),
}

/// Immutable, validated program version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ProgramDefinitionRecord")]
pub struct ProgramDefinition {
    id: ProgramId,
    admin_name: String,
    localized_name: LocalizedStrings,
    localized_description: LocalizedStrings,
    block_definitions: Vec<BlockDefinition>,
}

/// Unvalidated wire shape; deserialization funnels through the builder.
#[derive(Deserialize)]
struct ProgramDefinitionRecord {
    id: ProgramId,
    admin_name: String,
    #[serde(default)]
    localized_name: LocalizedStrings,
    #[serde(default)]
    localized_description: LocalizedStrings,
    block_definitions: Vec<BlockDefinition>,
}

impl TryFrom<ProgramDefinitionRecord> for ProgramDefinition {
    type Error = ProgramError;

    fn try_from(record: ProgramDefinitionRecord) -> Result<Self, Self::Error> {
        ProgramDefinitionBuilder {
            id: record.id,
            admin_name: record.admin_name,
            localized_name: record.localized_name,
            localized_description: record.localized_description,
            block_definitions: record.block_definitions,
        }
        .build()
    }
}

pub struct ProgramDefinitionBuilder {
    id: ProgramId,
    admin_name: String,
    localized_name: LocalizedStrings,
    localized_description: LocalizedStrings,
    block_definitions: Vec<BlockDefinition>,
}

impl ProgramDefinitionBuilder {
    pub fn localized_name(mut self, name: LocalizedStrings) -> Self {
        self.localized_name = name;
        self
    }

    pub fn localized_description(mut self, description: LocalizedStrings) -> Self {
        self.localized_description = description;
        self
    }

    pub fn block(mut self, block: BlockDefinition) -> Self {
        self.block_definitions.push(block);
        self
    }

    pub fn build(self) -> Result<ProgramDefinition, ProgramError> {
        let program = ProgramDefinition {
            id: self.id,
            admin_name: self.admin_name,
            localized_name: self.localized_name,
            localized_description: self.localized_description,
            block_definitions: self.block_definitions,
        };
        program.validate()?;
        Ok(program)
    }
}

impl ProgramDefinition {
    pub fn builder(id: u64, admin_name: impl Into<String>) -> ProgramDefinitionBuilder {
        let admin_name = admin_name.into();
        ProgramDefinitionBuilder {
            id: ProgramId(id),
            localized_name: LocalizedStrings::default_text(admin_name.clone()),
            admin_name,
            localized_description: LocalizedStrings::default(),
            block_definitions: Vec::new(),
        }
    }

    pub fn id(&self) -> ProgramId {
        self.id
    }

    pub fn admin_name(&self) -> &str {
        &self.admin_name
    }

    pub fn localized_name(&self) -> &LocalizedStrings {
        &self.localized_name
    }

    pub fn localized_description(&self) -> &LocalizedStrings {
        &self.localized_description
    }

    /// Blocks in declared order.
    pub fn block_definitions(&self) -> &[BlockDefinition] {
        &self.block_definitions
    }

    pub fn block_count(&self) -> usize {
        self.block_definitions.len()
    }

    pub fn block_definition(&self, id: BlockDefinitionId) -> Result<&BlockDefinition, ProgramError> {
        self.block_definitions
            .iter()
            .find(|block| block.id() == id)
            .ok_or(ProgramError::BlockDefinitionNotFound(id))
    }

    pub fn block_definition_by_index(&self, index: usize) -> Option<&BlockDefinition> {
        self.block_definitions.get(index)
    }

    /// Largest block id in use; zero for an empty program.
    pub fn max_block_definition_id(&self) -> u64 {
        self.block_definitions
            .iter()
            .map(|block| block.id().0)
            .max()
            .unwrap_or(0)
    }

    /// Blocks repeated directly under `enumerator`, in declared order.
    pub fn block_definitions_for_enumerator(
        &self,
        enumerator: BlockDefinitionId,
    ) -> Vec<&BlockDefinition> {
        self.block_definitions
            .iter()
            .filter(|block| block.enumerator_id() == Some(enumerator))
            .collect()
    }

    pub fn non_repeated_block_definitions(&self) -> Vec<&BlockDefinition> {
        self.block_definitions
            .iter()
            .filter(|block| !block.is_repeated())
            .collect()
    }

    /// Locate a question and the block holding it.
    pub fn question_definition(
        &self,
        question_id: QuestionId,
    ) -> Option<(&BlockDefinition, &ProgramQuestionDefinition)> {
        self.block_definitions.iter().find_map(|block| {
            block
                .questions()
                .iter()
                .find(|question| question.id() == question_id)
                .map(|question| (block, question))
        })
    }

    /// Questions a predicate on `block_id` may reference: those in earlier blocks that are
    /// top level or share one of the block's enumerator ancestors.
    pub fn available_predicate_question_definitions(
        &self,
        block_id: BlockDefinitionId,
    ) -> Result<Vec<&QuestionDefinition>, ProgramError> {
        let target = self.block_definition(block_id)?;
        let mut visible_contexts: BTreeSet<Option<BlockDefinitionId>> = BTreeSet::new();
        visible_contexts.insert(None);
        let mut ancestor = target.enumerator_id();
        while let Some(id) = ancestor {
            if !visible_contexts.insert(Some(id)) {
                break;
            }
            ancestor = self.block_definition(id)?.enumerator_id();
        }

        let mut questions = Vec::new();
        for block in self.ordered_block_definitions() {
            if block.id() == block_id {
                break;
            }
            if !visible_contexts.contains(&block.enumerator_id()) {
                continue;
            }
            questions.extend(
                block
                    .questions()
                    .iter()
                    .map(|question| &question.question)
                    .filter(|question| {
                        !matches!(
                            question.question_type(),
                            QuestionType::Enumerator | QuestionType::FileUpload
                        )
                    }),
            );
        }
        Ok(questions)
    }

    /// True when declared order already matches [`Self::ordered_block_definitions`].
    pub fn has_ordered_block_definitions(&self) -> bool {
        self.ordered_block_definitions()
            .iter()
            .map(|block| block.id())
            .eq(self.block_definitions.iter().map(|block| block.id()))
    }

    /// Depth-first order: each enumerator block is followed by its repeated blocks,
    /// recursively, before the next top-level block.
    pub fn ordered_block_definitions(&self) -> Vec<&BlockDefinition> {
        let mut children: BTreeMap<BlockDefinitionId, Vec<&BlockDefinition>> = BTreeMap::new();
        for block in &self.block_definitions {
            if let Some(enumerator) = block.enumerator_id() {
                children.entry(enumerator).or_default().push(block);
            }
        }

        let mut ordered = Vec::with_capacity(self.block_definitions.len());
        for block in self.non_repeated_block_definitions() {
            push_depth_first(block, &children, &mut ordered);
        }
        ordered
    }

    fn validate(&self) -> Result<(), ProgramError> {
        let mut seen = BTreeSet::new();
        for block in &self.block_definitions {
            if !seen.insert(block.id()) {
                return Err(ProgramError::DuplicateBlockId(block.id()));
            }
        }

        for block in &self.block_definitions {
            self.validate_block(block)?;
        }
        Ok(())
    }

    fn validate_block(&self, block: &BlockDefinition) -> Result<(), ProgramError> {
        let has_enumerator_question = block
            .questions()
            .iter()
            .any(|question| question.question.is_enumerator());
        if has_enumerator_question && !block.is_enumerator() {
            return Err(ProgramError::MixedEnumeratorBlock(block.id()));
        }

        let parent_question = match block.enumerator_id() {
            Some(enumerator) => {
                let parent = self
                    .block_definitions
                    .iter()
                    .find(|candidate| candidate.id() == enumerator)
                    .ok_or(ProgramError::MissingEnumerator {
                        block: block.id(),
                        enumerator,
                    })?;
                let question = parent
                    .enumerator_question()
                    .ok_or(ProgramError::NotAnEnumerator {
                        block: block.id(),
                        enumerator,
                    })?;
                self.ensure_acyclic(block)?;
                Some(question.id)
            }
            None => None,
        };

        for question in block.questions() {
            let definition = &question.question;
            if definition.question_type() == QuestionType::Date {
                return Err(ProgramError::UnsupportedQuestionType {
                    block: block.id(),
                    question: definition.id,
                    question_type: definition.question_type(),
                });
            }
            if definition.enumerator_id != parent_question {
                return Err(ProgramError::QuestionEnumeratorMismatch {
                    block: block.id(),
                    question: definition.id,
                });
            }
        }

        let mut paths = BTreeSet::new();
        for (path, _, _) in block.relative_scalars() {
            if !paths.insert(path.clone()) {
                return Err(ProgramError::DuplicateScalarPath {
                    block: block.id(),
                    path,
                });
            }
        }
        Ok(())
    }

    fn ensure_acyclic(&self, block: &BlockDefinition) -> Result<(), ProgramError> {
        let mut steps = 0;
        let mut current = block.enumerator_id();
        while let Some(id) = current {
            if id == block.id() || steps > self.block_definitions.len() {
                return Err(ProgramError::EnumeratorCycle(block.id()));
            }
            steps += 1;
            current = self
                .block_definitions
                .iter()
                .find(|candidate| candidate.id() == id)
                .and_then(BlockDefinition::enumerator_id);
        }
        Ok(())
    }
}

fn push_depth_first<'a>(
    block: &'a BlockDefinition,
    children: &BTreeMap<BlockDefinitionId, Vec<&'a BlockDefinition>>,
    ordered: &mut Vec<&'a BlockDefinition>,
) {
    ordered.push(block);
    if let Some(repeated) = children.get(&block.id()) {
        for child in repeated {
            push_depth_first(child, children, ordered);
        }
    }
}
