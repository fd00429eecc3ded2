//! Applying one batch of raw form edits to a private copy of an applicant document.
//!
//! Schema violations abort the whole batch. Conversion failures are collected per path and
//! returned next to the staged document so the caller can re-render inline errors.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::block::Block;
use super::data::{ApplicantData, DocumentError};
use super::navigation::ReadOnlyApplicantProgramService;
use super::path::{Path, PathError};
use super::question::ValidationErrorMessage;
use super::scalar::{is_metadata_key, Scalar, ScalarType};
use crate::program::ProgramId;

/// Failures that reject an entire staging batch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StagingError {
    #[error("'{raw}' is not a valid path: {source}")]
    InvalidPath {
        raw: String,
        #[source]
        source: PathError,
    },
    #[error("path '{0}' addresses a system managed field")]
    ReservedScalarKey(Path),
    #[error("block {0} not found for this applicant")]
    BlockNotFound(String),
    #[error("path '{path}' is not part of block {block_id}")]
    PathNotInBlock { block_id: String, path: Path },
    #[error("entity names are edited one at a time at '{list}[i].entity_name'")]
    EntityNamesNotIndexed { list: Path },
    #[error("program {0} cannot be recorded on answers")]
    ProgramIdOutOfRange(ProgramId),
    #[error(transparent)]
    Document(#[from] DocumentError),
}

/// A conversion failure attributed to one edited path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub path: Path,
    pub message: ValidationErrorMessage,
}

/// Result of staging a batch: the fresh view plus whether the document was saved.
#[derive(Debug, Clone)]
pub struct StageOutcome {
    pub view: ReadOnlyApplicantProgramService,
    pub field_errors: Vec<FieldError>,
    pub persisted: bool,
}

impl StageOutcome {
    pub fn has_errors(&self) -> bool {
        !self.field_errors.is_empty()
    }
}

/// Edits after parsing: ordered, parsed, free of metadata keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StagedUpdates(BTreeMap<Path, String>);

impl StagedUpdates {
    /// Parse raw `(path, value)` pairs, rejecting malformed paths and metadata keys.
    pub fn parse<'a, I>(raw: I) -> Result<Self, StagingError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut updates = BTreeMap::new();
        for (raw_path, value) in raw {
            let path = Path::parse(raw_path).map_err(|source| StagingError::InvalidPath {
                raw: raw_path.to_string(),
                source,
            })?;
            if is_metadata_key(path.without_array_reference().key_name()) {
                return Err(StagingError::ReservedScalarKey(path));
            }
            updates.insert(path, value.to_string());
        }
        Ok(Self(updates))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Path, &str)> {
        self.0.iter().map(|(path, value)| (path, value.as_str()))
    }
}

/// Staged copy of the document and the per-path conversion errors.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedDocument {
    pub data: ApplicantData,
    pub field_errors: Vec<FieldError>,
}

/// One edit after schema resolution.
enum Edit<'a> {
    Scalar {
        path: &'a Path,
        scalar_type: ScalarType,
        value: &'a str,
    },
    /// Indexed or comma separated values for one list scalar.
    List {
        path: Path,
        scalar_type: ScalarType,
        values: Vec<&'a str>,
    },
    /// Blank submission on an enumerator list: the applicant declares no entities.
    ClearEntities { list: Path },
    /// Entity positions, as stored before this batch, to drop from an enumerator list.
    DeleteEntities { list: Path, values: Vec<&'a str> },
}

/// Write `updates` into a copy of the document `view` was built from.
///
/// Every path is resolved against the pre-update block before anything is written. Entity
/// removals run first, so `<list>[i].entity_name` edits in the same batch address the
/// shortened list. Each distinct parent of a written scalar gets its metadata stamped exactly
/// once.
pub fn stage_updates(
    view: &ReadOnlyApplicantProgramService,
    block_id: &str,
    updates: &StagedUpdates,
    program_id: ProgramId,
    now_millis: i64,
) -> Result<StagedDocument, StagingError> {
    let program = program_id
        .stamp()
        .ok_or(StagingError::ProgramIdOutOfRange(program_id))?;
    let block = view
        .block(block_id)
        .ok_or_else(|| StagingError::BlockNotFound(block_id.to_string()))?;
    let edits = resolve(block, updates)?;

    let mut data = view.applicant_data().clone();
    let mut field_errors = Vec::new();
    let mut written = BTreeSet::new();

    for edit in edits {
        match edit {
            Edit::Scalar {
                path,
                scalar_type: ScalarType::Long,
                value,
            } => {
                if value.trim().is_empty() {
                    continue;
                }
                match value.trim().parse::<i64>() {
                    Ok(number) => {
                        data.put_long(path, number)?;
                        written.insert(path.parent_path());
                    }
                    Err(_) => field_errors.push(FieldError {
                        path: path.clone(),
                        message: ValidationErrorMessage::InvalidNumber,
                    }),
                }
            }
            Edit::Scalar { path, value, .. } => {
                data.put_string(path, value)?;
                written.insert(path.parent_path());
            }
            Edit::List {
                path,
                scalar_type,
                values,
            } => {
                let values = values
                    .into_iter()
                    .map(str::trim)
                    .filter(|value| !value.is_empty());
                if scalar_type == ScalarType::ListOfLong {
                    let mut numbers = Vec::new();
                    let mut valid = true;
                    for value in values {
                        match value.parse::<i64>() {
                            Ok(number) => numbers.push(number),
                            Err(_) => valid = false,
                        }
                    }
                    if !valid {
                        field_errors.push(FieldError {
                            path,
                            message: ValidationErrorMessage::InvalidNumber,
                        });
                        continue;
                    }
                    data.put_long_list(&path, numbers)?;
                } else {
                    data.put_string_list(&path, values.map(str::to_string).collect())?;
                }
                written.insert(path.parent_path());
            }
            Edit::ClearEntities { list } => {
                data.put_string_list(&list, Vec::new())?;
            }
            Edit::DeleteEntities { list, values } => {
                let len = data.array_len(&list);
                let mut positions = BTreeSet::new();
                let mut valid = true;
                for value in values.into_iter().map(str::trim).filter(|value| !value.is_empty()) {
                    match value.parse::<usize>() {
                        Ok(position) if position < len => {
                            positions.insert(position);
                        }
                        _ => valid = false,
                    }
                }
                if !valid {
                    field_errors.push(FieldError {
                        path: list.join_scalar(Scalar::DeleteEntity),
                        message: ValidationErrorMessage::InvalidEntityIndex,
                    });
                    continue;
                }
                if positions.is_empty() {
                    continue;
                }
                data.remove_array_elements(&list, &positions)?;
                written.extend((0..data.array_len(&list)).map(|index| list.at_index(index)));
            }
        }
    }

    for parent in &written {
        data.put_long(&parent.join_scalar(Scalar::UpdatedAt), now_millis)?;
        data.put_long(&parent.join_scalar(Scalar::ProgramUpdatedIn), program)?;
    }

    Ok(StagedDocument { data, field_errors })
}

/// Map every update onto the block schema, grouping list edits by their list path.
///
/// Entity list edits come back first, ahead of the scalar and list edits.
fn resolve<'a>(block: &Block, updates: &'a StagedUpdates) -> Result<Vec<Edit<'a>>, StagingError> {
    let enumerator = block.enumerator_path();
    let deletion = enumerator
        .as_ref()
        .map(|list| list.join_scalar(Scalar::DeleteEntity));
    let mut entity_edits = Vec::new();
    let mut deleted: Vec<&'a str> = Vec::new();
    let mut edits = Vec::new();
    let mut lists: BTreeMap<Path, (ScalarType, Vec<&'a str>)> = BTreeMap::new();

    for (path, value) in updates.iter() {
        let not_in_block = || StagingError::PathNotInBlock {
            block_id: block.id().to_string(),
            path: path.clone(),
        };
        let scalar_type = block.scalar_type(path).ok_or_else(not_in_block)?;
        if path.is_array_element() && !scalar_type.is_list() {
            return Err(not_in_block());
        }

        if let Some(list) = enumerator.as_ref().filter(|list| *list == path) {
            if !value.trim().is_empty() {
                return Err(StagingError::EntityNamesNotIndexed { list: list.clone() });
            }
            entity_edits.push(Edit::ClearEntities { list: list.clone() });
        } else if deletion.as_ref() == Some(&path.without_array_reference()) {
            if path.is_array_element() {
                deleted.push(value);
            } else {
                deleted.extend(value.split(','));
            }
        } else if scalar_type.is_list() {
            let entry = lists
                .entry(path.without_array_reference())
                .or_insert_with(|| (scalar_type, Vec::new()));
            if path.is_array_element() {
                entry.1.push(value);
            } else {
                entry.1.extend(value.split(','));
            }
        } else {
            edits.push(Edit::Scalar {
                path,
                scalar_type,
                value,
            });
        }
    }

    if let (Some(list), false) = (enumerator, deleted.is_empty()) {
        entity_edits.insert(0, Edit::DeleteEntities { list, values: deleted });
    }
    entity_edits.extend(edits);
    entity_edits.extend(
        lists
            .into_iter()
            .map(|(path, (scalar_type, values))| Edit::List {
                path,
                scalar_type,
                values,
            }),
    );
    Ok(entity_edits)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::program::{
        BlockDefinition, BlockDefinitionId, ProgramDefinition, ProgramQuestionDefinition,
    };
    use crate::question::{QuestionConfig, QuestionDefinition, QuestionId, QuestionOption};

    const NOW: i64 = 1_700_000_000_000;

    fn program() -> Arc<ProgramDefinition> {
        let name = QuestionDefinition::new(1, "name", QuestionConfig::Name);
        let age = QuestionDefinition::new(2, "age", QuestionConfig::Number { min: None, max: None });
        let pets = QuestionDefinition::new(
            3,
            "pets",
            QuestionConfig::Checkbox {
                options: vec![QuestionOption::new(1, "Cat"), QuestionOption::new(2, "Dog")],
                min_choices: None,
                max_choices: None,
            },
        );
        let members = QuestionDefinition::new(
            4,
            "members",
            QuestionConfig::Enumerator {
                entity_type: Default::default(),
            },
        );
        let job = QuestionDefinition::new(5, "job", QuestionConfig::Text {
            min_length: None,
            max_length: None,
        })
        .repeated_for(QuestionId(4));

        Arc::new(
            ProgramDefinition::builder(9, "benefits")
                .block(
                    BlockDefinition::new(1, "about")
                        .with_question(ProgramQuestionDefinition::required(name))
                        .with_question(ProgramQuestionDefinition::required(age))
                        .with_question(ProgramQuestionDefinition::optional(pets)),
                )
                .block(
                    BlockDefinition::new(2, "members")
                        .with_question(ProgramQuestionDefinition::required(members)),
                )
                .block(
                    BlockDefinition::new(3, "job")
                        .repeated_for(BlockDefinitionId(2))
                        .with_question(ProgramQuestionDefinition::required(job)),
                )
                .build()
                .expect("valid program"),
        )
    }

    fn view(data: ApplicantData) -> ReadOnlyApplicantProgramService {
        ReadOnlyApplicantProgramService::new(Arc::new(data), program())
    }

    fn updates(raw: &[(&str, &str)]) -> StagedUpdates {
        StagedUpdates::parse(raw.iter().copied()).expect("valid updates")
    }

    fn path(raw: &str) -> Path {
        Path::parse(raw).expect("valid path")
    }

    fn stage(data: ApplicantData, block: &str, raw: &[(&str, &str)]) -> Result<StagedDocument, StagingError> {
        stage_updates(&view(data), block, &updates(raw), ProgramId(9), NOW)
    }

    #[test]
    fn rejects_metadata_keys_indexed_or_not() {
        for raw in ["applicant.name.updated_at", "applicant.members[0].program_updated_in", "applicant.pets.updated_at[2]"] {
            let error = StagedUpdates::parse([(raw, "1")]).expect_err("reserved");
            assert!(matches!(error, StagingError::ReservedScalarKey(_)), "{raw}");
        }
        assert!(matches!(
            StagedUpdates::parse([("applicant..name", "x")]),
            Err(StagingError::InvalidPath { .. })
        ));
    }

    #[test]
    fn stamps_metadata_once_per_parent() {
        let staged = stage(
            ApplicantData::new(),
            "1",
            &[
                ("applicant.name.first_name", "Alice"),
                ("applicant.name.last_name", "Doe"),
            ],
        )
        .expect("staged");

        let data = &staged.data;
        assert!(staged.field_errors.is_empty());
        assert_eq!(data.read_string(&path("applicant.name.first_name")).as_deref(), Some("Alice"));
        assert_eq!(data.read_long(&path("applicant.name.updated_at")), Some(NOW));
        assert_eq!(data.read_long(&path("applicant.name.program_updated_in")), Some(9));
        assert!(!data.has_path(&path("applicant.age")));
    }

    #[test]
    fn path_outside_block_fails_the_batch() {
        let error = stage(
            ApplicantData::new(),
            "1",
            &[
                ("applicant.name.first_name", "Alice"),
                ("applicant.address.street", "1 Main St"),
            ],
        )
        .expect_err("rejected");
        assert_eq!(
            error,
            StagingError::PathNotInBlock {
                block_id: "1".to_string(),
                path: path("applicant.address.street"),
            }
        );
        assert_eq!(
            stage(ApplicantData::new(), "7", &[]).expect_err("missing"),
            StagingError::BlockNotFound("7".to_string())
        );
    }

    #[test]
    fn numbers_are_parsed_and_blank_is_a_no_op() {
        let staged = stage(ApplicantData::new(), "1", &[("applicant.age.number", "forty")])
            .expect("staged");
        assert_eq!(
            staged.field_errors,
            vec![FieldError {
                path: path("applicant.age.number"),
                message: ValidationErrorMessage::InvalidNumber,
            }]
        );
        assert!(!staged.data.has_path(&path("applicant.age")));

        let blank = stage(ApplicantData::new(), "1", &[("applicant.age.number", "  ")])
            .expect("staged");
        assert_eq!(blank.data, ApplicantData::new());

        let valid = stage(ApplicantData::new(), "1", &[("applicant.age.number", " 42 ")])
            .expect("staged");
        assert_eq!(valid.data.read_long(&path("applicant.age.number")), Some(42));
    }

    #[test]
    fn list_edits_replace_the_stored_list() {
        let mut data = ApplicantData::new();
        data.put_long_list(&path("applicant.pets.selection"), vec![1, 2])
            .expect("writes");

        let staged = stage(
            data,
            "1",
            &[
                ("applicant.pets.selection[1]", "1"),
                ("applicant.pets.selection[0]", "2"),
            ],
        )
        .expect("staged");
        assert_eq!(
            staged.data.read_long_list(&path("applicant.pets.selection")),
            Some(vec![2, 1])
        );

        let split = stage(ApplicantData::new(), "1", &[("applicant.pets.selection", "2, 1")])
            .expect("staged");
        assert_eq!(
            split.data.read_long_list(&path("applicant.pets.selection")),
            Some(vec![2, 1])
        );
        assert_eq!(split.data.read_long(&path("applicant.pets.updated_at")), Some(NOW));
    }

    fn members(names: &[&str]) -> ApplicantData {
        let mut data = ApplicantData::new();
        for (index, name) in names.iter().enumerate() {
            data.put_string(&path(&format!("applicant.members[{index}].entity_name")), *name)
                .expect("writes");
        }
        data
    }

    fn entity_names(data: &ApplicantData) -> Vec<String> {
        (0..data.array_len(&path("applicant.members")))
            .map(|index| {
                data.read_string(&path(&format!("applicant.members[{index}].entity_name")))
                    .unwrap_or_default()
            })
            .collect()
    }

    #[test]
    fn entity_names_are_written_per_element() {
        let staged = stage(
            ApplicantData::new(),
            "2",
            &[
                ("applicant.members[0].entity_name", "Smith, Jr."),
                ("applicant.members[1].entity_name", "Grace"),
            ],
        )
        .expect("staged");
        let data = &staged.data;
        assert_eq!(entity_names(data), vec!["Smith, Jr.", "Grace"]);
        assert_eq!(data.read_long(&path("applicant.members[0].updated_at")), Some(NOW));
        assert_eq!(data.read_long(&path("applicant.members[1].program_updated_in")), Some(9));

        let none = stage(ApplicantData::new(), "2", &[("applicant.members", "")]).expect("staged");
        assert!(none.data.has_path(&path("applicant.members")));
        assert_eq!(none.data.array_len(&path("applicant.members")), 0);
    }

    #[test]
    fn whole_list_entity_names_are_rejected() {
        let error = stage(ApplicantData::new(), "2", &[("applicant.members", "Smith, Jr.")])
            .expect_err("rejected");
        assert_eq!(
            error,
            StagingError::EntityNamesNotIndexed {
                list: path("applicant.members"),
            }
        );
    }

    #[test]
    fn blank_list_clears_existing_entities() {
        let mut data = members(&["Ada", "Grace"]);
        data.put_string(&path("applicant.members[1].job.text"), "pilot")
            .expect("writes");

        let staged = stage(data, "2", &[("applicant.members", " ")]).expect("staged");
        assert!(staged.data.has_path(&path("applicant.members")));
        assert_eq!(staged.data.array_len(&path("applicant.members")), 0);
        assert!(!staged.data.has_path(&path("applicant.members[1].job.text")));
    }

    #[test]
    fn deleted_entities_shift_later_ones_down() {
        let mut data = members(&["Ada", "Grace", "Linus"]);
        data.put_string(&path("applicant.members[2].job.text"), "kernel")
            .expect("writes");

        let staged = stage(
            data,
            "2",
            &[
                ("applicant.members.delete_entity[0]", "1"),
                ("applicant.members[2].entity_name", "Margaret"),
            ],
        )
        .expect("staged");
        let data = &staged.data;
        assert!(staged.field_errors.is_empty());
        assert_eq!(entity_names(data), vec!["Ada", "Linus", "Margaret"]);
        assert_eq!(
            data.read_string(&path("applicant.members[1].job.text")).as_deref(),
            Some("kernel")
        );
        assert_eq!(data.read_long(&path("applicant.members[0].updated_at")), Some(NOW));
        assert!(!data.has_path(&path("applicant.members.delete_entity")));
    }

    #[test]
    fn deleting_unknown_entities_is_a_field_error() {
        for value in ["5", "first"] {
            let staged = stage(members(&["Ada"]), "2", &[("applicant.members.delete_entity", value)])
                .expect("staged");
            assert_eq!(
                staged.field_errors,
                vec![FieldError {
                    path: path("applicant.members.delete_entity"),
                    message: ValidationErrorMessage::InvalidEntityIndex,
                }],
                "{value}"
            );
            assert_eq!(entity_names(&staged.data), vec!["Ada"]);
        }
    }

    #[test]
    fn indexing_a_single_value_field_fails_the_batch() {
        let error = stage(
            ApplicantData::new(),
            "1",
            &[
                ("applicant.name.first_name[0]", "Alice"),
                ("applicant.name.last_name", "Doe"),
            ],
        )
        .expect_err("rejected");
        assert_eq!(
            error,
            StagingError::PathNotInBlock {
                block_id: "1".to_string(),
                path: path("applicant.name.first_name[0]"),
            }
        );
        assert!(matches!(
            stage(ApplicantData::new(), "2", &[("applicant.members[0]", "Ada")]),
            Err(StagingError::PathNotInBlock { .. })
        ));
    }

    #[test]
    fn oversized_program_ids_fail_staging() {
        let result = stage_updates(
            &view(ApplicantData::new()),
            "1",
            &updates(&[("applicant.name.first_name", "Alice")]),
            ProgramId(u64::MAX),
            NOW,
        );
        assert_eq!(
            result.expect_err("rejected"),
            StagingError::ProgramIdOutOfRange(ProgramId(u64::MAX))
        );
    }

    #[test]
    fn repeated_blocks_write_inside_their_entity() {
        let mut data = ApplicantData::new();
        data.put_string(&path("applicant.members[0].entity_name"), "Ada")
            .expect("writes");

        let staged = stage(data, "3-0", &[("applicant.members[0].job.text", "engineer")])
            .expect("staged");
        assert_eq!(
            staged.data.read_string(&path("applicant.members[0].job.text")).as_deref(),
            Some("engineer")
        );
        assert_eq!(
            staged.data.read_long(&path("applicant.members[0].job.updated_at")),
            Some(NOW)
        );
    }
}
