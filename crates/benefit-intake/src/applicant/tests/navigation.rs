use std::sync::Arc;

use super::common::*;
use crate::applicant::data::ApplicantData;
use crate::applicant::locale::Locale;
use crate::applicant::navigation::{NavigationError, ReadOnlyApplicantProgramService};
use crate::applicant::predicate::{PredicateAnomaly, PredicateRole};
use crate::applicant::scalar::Scalar;
use crate::program::{
    BlockDefinition, BlockDefinitionId, Operator, PredicateDefinition, PredicateValue,
    ProgramDefinition, ProgramQuestionDefinition,
};
use crate::question::{QuestionConfig, QuestionDefinition, QuestionId, QuestionType};

fn view(data: ApplicantData) -> ReadOnlyApplicantProgramService {
    ReadOnlyApplicantProgramService::new(Arc::new(data), Arc::new(household_program()))
}

fn ids(blocks: &[&crate::applicant::block::Block]) -> Vec<String> {
    blocks.iter().map(|block| block.id().to_string()).collect()
}

fn all_ids(view: &ReadOnlyApplicantProgramService) -> Vec<String> {
    view.all_blocks()
        .iter()
        .map(|block| block.id().to_string())
        .collect()
}

#[test]
fn repeated_blocks_follow_their_enumerator_once_per_entity() {
    let none = view(answered_basics(PROGRAM));
    assert_eq!(all_ids(&none), vec!["1", "2", "3", "5", "6"]);

    let three = view(with_members(answered_basics(PROGRAM), &["Ada", "Grace", "Linus"]));
    assert_eq!(
        all_ids(&three),
        vec!["1", "2", "3", "4-0", "4-1", "4-2", "5", "6"]
    );

    let grace = three.block("4-1").expect("instance for second entity");
    assert_eq!(grace.entity_name(), Some("Grace"));
    assert_eq!(
        grace.context(),
        &path("applicant.household_members[1]")
    );
    assert_eq!(
        grace.questions()[0].path(),
        path("applicant.household_members[1].monthly_income")
    );
}

#[test]
fn nested_enumerators_expand_depth_first() {
    let members = QuestionDefinition::new(
        1,
        "members",
        QuestionConfig::Enumerator {
            entity_type: Default::default(),
        },
    );
    let jobs = QuestionDefinition::new(
        2,
        "jobs",
        QuestionConfig::Enumerator {
            entity_type: Default::default(),
        },
    )
    .repeated_for(QuestionId(1));
    let hours = QuestionDefinition::new(3, "hours", QuestionConfig::Number { min: None, max: None })
        .repeated_for(QuestionId(2));
    let program = ProgramDefinition::builder(3, "jobs")
        .block(
            BlockDefinition::new(1, "members")
                .with_question(ProgramQuestionDefinition::required(members)),
        )
        .block(
            BlockDefinition::new(2, "jobs")
                .repeated_for(BlockDefinitionId(1))
                .with_question(ProgramQuestionDefinition::required(jobs)),
        )
        .block(
            BlockDefinition::new(3, "hours")
                .repeated_for(BlockDefinitionId(2))
                .with_question(ProgramQuestionDefinition::required(hours)),
        )
        .build()
        .expect("valid program");

    let mut data = ApplicantData::new();
    for (raw, name) in [
        ("applicant.members[0].entity_name", "Ada"),
        ("applicant.members[1].entity_name", "Grace"),
        ("applicant.members[0].jobs[0].entity_name", "analyst"),
        ("applicant.members[0].jobs[1].entity_name", "teacher"),
        ("applicant.members[1].jobs[0].entity_name", "admiral"),
    ] {
        data.put_string(&path(raw), name).expect("writes");
    }

    let view = ReadOnlyApplicantProgramService::new(Arc::new(data), Arc::new(program));
    assert_eq!(
        all_ids(&view),
        vec!["1", "2-0", "3-0-0", "3-0-1", "2-1", "3-1-0"]
    );
    assert_eq!(
        view.block("3-0-1").expect("nested instance").questions()[0].path(),
        path("applicant.members[0].jobs[1].hours")
    );
}

#[test]
fn in_progress_blocks_exclude_answers_from_other_programs() {
    let here = view(answered_basics(PROGRAM));
    assert_eq!(ids(&here.in_progress_blocks()), vec!["1", "2", "3", "5"]);

    let elsewhere = view(answered_basics(OTHER_PROGRAM));
    assert_eq!(ids(&elsewhere.in_progress_blocks()), vec!["3", "5"]);
    assert!(elsewhere.block("1").expect("block").is_complete());
}

#[test]
fn first_incomplete_and_next_in_progress() {
    let empty = view(ApplicantData::new());
    assert_eq!(empty.first_incomplete_block().map(|block| block.id()), Some("1"));

    let basics = view(answered_basics(PROGRAM));
    assert_eq!(basics.first_incomplete_block().map(|block| block.id()), Some("3"));
    assert_eq!(
        basics.in_progress_block_after("1").map(|block| block.id()),
        Some("2")
    );
    assert_eq!(
        basics.in_progress_block_after("3").map(|block| block.id()),
        Some("5")
    );
    assert!(basics.in_progress_block_after("5").is_none());
    assert!(basics.in_progress_block_after("missing").is_none());

    let elsewhere = view(answered_basics(OTHER_PROGRAM));
    assert_eq!(
        elsewhere.in_progress_block_after("1").map(|block| block.id()),
        Some("3")
    );
}

#[test]
fn first_incomplete_is_empty_only_when_everything_is_complete() {
    let mut data = with_members(answered_basics(PROGRAM), &["Ada"]);
    data.put_long(&path("applicant.household_members[0].monthly_income.number"), 1200)
        .expect("writes");
    data.put_long_list(&path("applicant.pets.selection"), vec![1])
        .expect("writes");

    let complete = view(data);
    assert!(complete.first_incomplete_block().is_none());
    assert!(complete.all_blocks().iter().all(|block| block.is_complete()));
}

#[test]
fn block_index_reports_missing_blocks() {
    let basics = view(with_members(answered_basics(PROGRAM), &["Ada"]));
    assert_eq!(basics.block_index("4-0"), Ok(3));
    assert_eq!(
        basics.block_index("4-1"),
        Err(NavigationError::BlockNotFound("4-1".to_string()))
    );
    assert!(basics.block("4-1").is_none());
}

#[test]
fn hidden_blocks_are_complete_and_skipped() {
    let mut data = answered_basics(PROGRAM);
    data.put_long(&path("applicant.age.number"), 12).expect("writes");
    let minor = view(data);

    let pets = minor.block("5").expect("pets block");
    assert!(pets.is_hidden());
    assert!(pets.is_complete());
    assert!(!ids(&minor.in_progress_blocks()).contains(&"5".to_string()));
    assert!(minor
        .summary_data()
        .iter()
        .all(|answer| answer.block_id != "5"));
}

#[test]
fn broken_predicates_fail_open_with_a_warning() {
    let age = QuestionDefinition::new(1, "age", QuestionConfig::Number { min: None, max: None });
    let note = QuestionDefinition::new(2, "note", QuestionConfig::Text {
        min_length: None,
        max_length: None,
    });
    let program = ProgramDefinition::builder(4, "broken")
        .block(
            BlockDefinition::new(1, "age").with_question(ProgramQuestionDefinition::required(age)),
        )
        .block(
            BlockDefinition::new(2, "note")
                .with_question(ProgramQuestionDefinition::required(note))
                .hidden_when(PredicateDefinition::leaf(
                    QuestionId(99),
                    Scalar::Number,
                    Operator::EqualTo,
                    PredicateValue::Long(1),
                ))
                .optional_when(PredicateDefinition::leaf(
                    QuestionId(1),
                    Scalar::Number,
                    Operator::AnyOf,
                    PredicateValue::Long(1),
                )),
        )
        .build()
        .expect("valid program");

    let view = ReadOnlyApplicantProgramService::new(Arc::new(ApplicantData::new()), Arc::new(program));
    let note = view.block("2").expect("note block");
    assert!(!note.is_hidden());
    assert!(!note.is_optional());

    let warnings = view.predicate_warnings();
    assert_eq!(warnings.len(), 2);
    assert_eq!(warnings[0].role, PredicateRole::Hide);
    assert_eq!(
        warnings[0].anomaly,
        PredicateAnomaly::QuestionNotFound {
            question_id: QuestionId(99)
        }
    );
    assert_eq!(warnings[1].role, PredicateRole::Optional);
    assert!(matches!(
        warnings[1].anomaly,
        PredicateAnomaly::TypeMismatch { .. }
    ));
}

#[test]
fn summary_lists_every_visible_question() {
    let basics = view(with_members(answered_basics(OTHER_PROGRAM), &["Ada"]));
    let summary = basics.summary_data();

    let keys: Vec<_> = summary.iter().map(|answer| answer.key()).collect();
    assert_eq!(keys, vec!["1-0", "1-1", "2-0", "3-0", "4-0-0", "5-0", "6-0"]);

    let name = &summary[0];
    assert_eq!(name.question_type, QuestionType::Name);
    assert_eq!(name.answer_text, "Alice Doe");
    assert_eq!(name.updated_at, Some(NOW - 1_000));
    assert!(name.answered_elsewhere());

    let members = &summary[3];
    assert_eq!(members.answer_text, "Ada");
    let income = &summary[4];
    assert_eq!(income.entity_name.as_deref(), Some("Ada"));
    assert!(!income.is_answered);
    assert_eq!(income.answer_text, "");
}

#[test]
fn localized_title_and_language_support() {
    let spanish = view(ApplicantData::with_locale(Locale::new("es-US")));
    assert_eq!(spanish.program_title(), "Beneficios del hogar");
    assert!(!spanish.preferred_language_supported());

    let english = view(ApplicantData::new());
    assert_eq!(english.program_title(), "Household benefits");
    assert!(english.preferred_language_supported());
}
