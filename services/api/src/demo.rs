use crate::infra::{InMemoryApplicantRepository, InMemoryProgramRepository, PinnedClock};
use benefit_intake::applicant::{
    write_csv, ApplicantId, ApplicantService, LocalizedStrings, ProgramProgressView, Scalar,
    StageResultView,
};
use benefit_intake::config::IntakeConfig;
use benefit_intake::error::AppError;
use benefit_intake::program::{
    BlockDefinition, BlockDefinitionId, Operator, PredicateDefinition, PredicateValue,
    ProgramDefinition, ProgramError, ProgramId, ProgramQuestionDefinition,
};
use benefit_intake::question::{QuestionConfig, QuestionDefinition, QuestionId, QuestionOption};
use chrono::{Local, NaiveDate};
use clap::Args;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

pub(crate) const DEMO_PROGRAM: ProgramId = ProgramId(1);

type DemoService = ApplicantService<InMemoryApplicantRepository, InMemoryProgramRepository>;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Date stamped on every saved answer (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) as_of: Option<NaiveDate>,
    /// JSON file of `{ "block_id", "updates" }` submissions to replay instead of the built-in script.
    #[arg(long)]
    pub(crate) answers: Option<PathBuf>,
    /// Print the final progress view as JSON.
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct SummaryArgs {
    /// Date stamped on every saved answer (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) as_of: Option<NaiveDate>,
    /// JSON file of submissions to replay instead of the built-in script.
    #[arg(long)]
    pub(crate) answers: Option<PathBuf>,
    /// Write the CSV here instead of stdout.
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
}

/// One block submission replayed against the demo program.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ScriptedSubmission {
    pub(crate) block_id: String,
    pub(crate) updates: BTreeMap<String, String>,
}

impl ScriptedSubmission {
    fn new(block_id: &str, updates: &[(&str, &str)]) -> Self {
        Self {
            block_id: block_id.to_string(),
            updates: updates
                .iter()
                .map(|(path, value)| (path.to_string(), value.to_string()))
                .collect(),
        }
    }
}

pub(crate) struct Playback {
    pub(crate) applicant_id: ApplicantId,
    pub(crate) results: Vec<StageResultView>,
}

/// Blocks: 1 name, 2 home address, 3 household members, 4 monthly income per member,
/// 5 housing situation, 6 monthly rent (hidden unless renting), 7 notes (optional).
pub(crate) fn demo_program() -> Result<ProgramDefinition, ProgramError> {
    let name = QuestionDefinition::new(1, "applicant name", QuestionConfig::Name)
        .with_text(LocalizedStrings::default_text("What is your legal name?"));
    let address = QuestionDefinition::new(
        2,
        "home address",
        QuestionConfig::Address {
            disallow_po_box: true,
        },
    )
    .with_text(LocalizedStrings::default_text("Where do you live?"));
    let members = QuestionDefinition::new(
        3,
        "household members",
        QuestionConfig::Enumerator {
            entity_type: LocalizedStrings::default_text("household member"),
        },
    )
    .with_text(LocalizedStrings::default_text("Who lives with you?"));
    let income = QuestionDefinition::new(
        4,
        "monthly income",
        QuestionConfig::Number {
            min: Some(0),
            max: None,
        },
    )
    .repeated_for(QuestionId(3));
    let housing = QuestionDefinition::new(
        5,
        "housing situation",
        QuestionConfig::RadioButton {
            options: vec![
                QuestionOption::new(1, "Renting"),
                QuestionOption::new(2, "Owning"),
                QuestionOption::new(3, "Staying with family"),
            ],
        },
    );
    let rent = QuestionDefinition::new(
        6,
        "monthly rent",
        QuestionConfig::Number {
            min: Some(0),
            max: None,
        },
    );
    let notes = QuestionDefinition::new(
        7,
        "notes",
        QuestionConfig::Text {
            min_length: None,
            max_length: Some(500),
        },
    );

    ProgramDefinition::builder(DEMO_PROGRAM.0, "community food assistance")
        .localized_name(
            LocalizedStrings::default_text("Community food assistance")
                .with(benefit_intake::applicant::Locale::new("es-US"), "Asistencia alimentaria"),
        )
        .block(
            BlockDefinition::new(1, "about you")
                .with_question(ProgramQuestionDefinition::required(name)),
        )
        .block(
            BlockDefinition::new(2, "address")
                .with_question(ProgramQuestionDefinition::required(address)),
        )
        .block(
            BlockDefinition::new(3, "household")
                .with_question(ProgramQuestionDefinition::required(members)),
        )
        .block(
            BlockDefinition::new(4, "member income")
                .repeated_for(BlockDefinitionId(3))
                .with_question(ProgramQuestionDefinition::required(income)),
        )
        .block(
            BlockDefinition::new(5, "housing")
                .with_question(ProgramQuestionDefinition::required(housing)),
        )
        .block(
            BlockDefinition::new(6, "rent")
                .with_question(ProgramQuestionDefinition::required(rent))
                .hidden_when(PredicateDefinition::leaf(
                    QuestionId(5),
                    Scalar::Selection,
                    Operator::In,
                    PredicateValue::ListOfLongs(vec![2, 3]),
                )),
        )
        .block(
            BlockDefinition::new(7, "notes")
                .with_question(ProgramQuestionDefinition::optional(notes)),
        )
        .build()
}

/// Walkthrough with one rejected address and one non-numeric income along the way.
pub(crate) fn default_script() -> Vec<ScriptedSubmission> {
    vec![
        ScriptedSubmission::new(
            "1",
            &[
                ("applicant.applicant_name.first_name", "Rosa"),
                ("applicant.applicant_name.last_name", "Diaz"),
            ],
        ),
        ScriptedSubmission::new(
            "2",
            &[
                ("applicant.home_address.street", "PO Box 42"),
                ("applicant.home_address.city", "Tacoma"),
                ("applicant.home_address.state", "WA"),
                ("applicant.home_address.zip", "98402"),
            ],
        ),
        ScriptedSubmission::new(
            "2",
            &[
                ("applicant.home_address.street", "1200 Pacific Ave"),
                ("applicant.home_address.city", "Tacoma"),
                ("applicant.home_address.state", "WA"),
                ("applicant.home_address.zip", "98402"),
            ],
        ),
        ScriptedSubmission::new(
            "3",
            &[
                ("applicant.household_members[0].entity_name", "Rosa"),
                ("applicant.household_members[1].entity_name", "Mateo"),
            ],
        ),
        ScriptedSubmission::new(
            "4-0",
            &[("applicant.household_members[0].monthly_income.number", "2100")],
        ),
        ScriptedSubmission::new(
            "4-1",
            &[("applicant.household_members[1].monthly_income.number", "six fifty")],
        ),
        ScriptedSubmission::new(
            "4-1",
            &[("applicant.household_members[1].monthly_income.number", "650")],
        ),
        ScriptedSubmission::new("5", &[("applicant.housing_situation.selection", "2")]),
    ]
}

fn load_script(answers: Option<PathBuf>) -> Result<Vec<ScriptedSubmission>, AppError> {
    match answers {
        Some(path) => {
            let raw = std::fs::read_to_string(path)?;
            let script = serde_json::from_str(&raw).map_err(std::io::Error::from)?;
            Ok(script)
        }
        None => Ok(default_script()),
    }
}

pub(crate) fn demo_service(as_of: NaiveDate) -> Result<DemoService, AppError> {
    let programs = InMemoryProgramRepository::new([demo_program()?]);
    Ok(ApplicantService::new(
        Arc::new(InMemoryApplicantRepository::default()),
        Arc::new(programs),
        IntakeConfig::default(),
    )
    .with_clock(Arc::new(PinnedClock::at(as_of))))
}

/// Create an applicant and replay every submission; schema rejections are reported and skipped.
pub(crate) async fn play_script(
    service: &DemoService,
    script: &[ScriptedSubmission],
    verbose: bool,
) -> Result<Playback, AppError> {
    let applicant_id = service.create_applicant().await?;
    if verbose {
        println!("- Created applicant {}", applicant_id);
    }

    let mut results = Vec::with_capacity(script.len());
    for submission in script {
        let updates = submission
            .updates
            .iter()
            .map(|(path, value)| (path.as_str(), value.as_str()));
        let outcome = match service
            .stage_and_update_if_valid(applicant_id, DEMO_PROGRAM, &submission.block_id, updates)
            .await
        {
            Ok(outcome) => outcome,
            Err(err) => {
                if verbose {
                    println!("  Block {} rejected: {}", submission.block_id, err);
                }
                continue;
            }
        };

        let view = StageResultView::render(&submission.block_id, &outcome, service.messages());
        if verbose {
            render_stage_result(&view);
        }
        results.push(view);
    }

    Ok(Playback {
        applicant_id,
        results,
    })
}

fn render_stage_result(view: &StageResultView) {
    let status = if view.persisted { "saved" } else { "not saved" };
    println!("- Block {} -> {}", view.block_id, status);
    for error in &view.field_errors {
        match &error.path {
            Some(path) => println!("    - {}: {}", path, error.message),
            None => println!("    - {}", error.message),
        }
    }
    if let Some(block) = &view.block {
        for question in &block.questions {
            for error in &question.errors {
                let target = error
                    .path
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_else(|| question.path.to_string());
                println!("    - {}: {}", target, error.message);
            }
        }
    }
    if let Some(next) = &view.next_block_id {
        println!("  Next block: {}", next);
    }
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        as_of,
        answers,
        json,
    } = args;

    let as_of = as_of.unwrap_or_else(|| Local::now().date_naive());
    let script = load_script(answers)?;
    let service = demo_service(as_of)?;

    println!("Benefit intake demo (answers stamped {})", as_of);
    let playback = play_script(&service, &script, true).await?;
    let view = service
        .read_only_applicant_program_service(playback.applicant_id, DEMO_PROGRAM)
        .await?;

    println!("\n{}", view.program_title());
    for block in view.all_blocks() {
        let label = match block.entity_name() {
            Some(entity) => format!("{} ({})", block.name(), entity),
            None => block.name().to_string(),
        };
        let state = if block.is_hidden() {
            "hidden"
        } else if block.is_complete() {
            "complete"
        } else {
            "incomplete"
        };
        println!("  - [{}] {}: {}", block.id(), label, state);
    }
    match view.first_incomplete_block() {
        Some(block) => println!("First incomplete block: {}", block.id()),
        None => println!("Every visible block is complete"),
    }

    if json {
        let progress = ProgramProgressView::render(playback.applicant_id, &view, service.messages());
        match serde_json::to_string_pretty(&progress) {
            Ok(json) => println!("{}", json),
            Err(err) => println!("Progress payload unavailable: {}", err),
        }
    }

    Ok(())
}

pub(crate) async fn run_summary(args: SummaryArgs) -> Result<(), AppError> {
    let SummaryArgs {
        as_of,
        answers,
        output,
    } = args;

    let as_of = as_of.unwrap_or_else(|| Local::now().date_naive());
    let script = load_script(answers)?;
    let service = demo_service(as_of)?;
    let playback = play_script(&service, &script, false).await?;
    let view = service
        .read_only_applicant_program_service(playback.applicant_id, DEMO_PROGRAM)
        .await?;

    let rows = view.summary_data();
    match output {
        Some(path) => write_csv(&rows, File::create(path)?)?,
        None => write_csv(&rows, std::io::stdout().lock())?,
    }
    Ok(())
}
