use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::response::Response;
use serde_json::Value;

use crate::applicant::data::ApplicantData;
use crate::applicant::locale::{Locale, LocalizedStrings};
use crate::applicant::path::Path;
use crate::applicant::repository::{
    ApplicantId, ApplicantRepository, Clock, MessageCatalog, ProgramRepository, RepositoryError,
};
use crate::applicant::scalar::Scalar;
use crate::applicant::service::ApplicantService;
use crate::config::IntakeConfig;
use crate::program::{
    BlockDefinition, BlockDefinitionId, Operator, PredicateDefinition, PredicateValue,
    ProgramDefinition, ProgramId, ProgramQuestionDefinition,
};
use crate::question::{QuestionConfig, QuestionDefinition, QuestionId, QuestionOption};

pub(super) const NOW: i64 = 1_700_000_000_000;
pub(super) const PROGRAM: ProgramId = ProgramId(1);
pub(super) const OTHER_PROGRAM: ProgramId = ProgramId(2);

pub(super) fn path(raw: &str) -> Path {
    Path::parse(raw).expect("valid path")
}

/// Blocks, in declared order:
/// 1 name + age, 2 home address, 3 household members (enumerator),
/// 4 monthly income per member, 5 pets (hidden for minors), 6 comments (optional).
pub(super) fn household_program() -> ProgramDefinition {
    household_program_with_id(PROGRAM.0)
}

pub(super) fn household_program_with_id(id: u64) -> ProgramDefinition {
    let name = QuestionDefinition::new(1, "applicant name", QuestionConfig::Name);
    let age = QuestionDefinition::new(
        2,
        "age",
        QuestionConfig::Number {
            min: Some(0),
            max: Some(130),
        },
    );
    let address = QuestionDefinition::new(
        3,
        "home address",
        QuestionConfig::Address {
            disallow_po_box: true,
        },
    );
    let members = QuestionDefinition::new(
        4,
        "household members",
        QuestionConfig::Enumerator {
            entity_type: LocalizedStrings::default_text("household member"),
        },
    );
    let income = QuestionDefinition::new(
        5,
        "monthly income",
        QuestionConfig::Number {
            min: Some(0),
            max: None,
        },
    )
    .repeated_for(QuestionId(4));
    let pets = QuestionDefinition::new(
        6,
        "pets",
        QuestionConfig::Checkbox {
            options: vec![
                QuestionOption::new(1, "Cat"),
                QuestionOption::new(2, "Dog"),
                QuestionOption::new(3, "Fish"),
            ],
            min_choices: Some(1),
            max_choices: Some(2),
        },
    );
    let comments = QuestionDefinition::new(
        7,
        "comments",
        QuestionConfig::Text {
            min_length: None,
            max_length: Some(200),
        },
    );

    ProgramDefinition::builder(id, "household benefits")
        .localized_name(
            LocalizedStrings::default_text("Household benefits")
                .with(Locale::new("es-US"), "Beneficios del hogar"),
        )
        .block(
            BlockDefinition::new(1, "about you")
                .with_question(ProgramQuestionDefinition::required(name))
                .with_question(ProgramQuestionDefinition::required(age)),
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
            BlockDefinition::new(5, "pets")
                .with_question(ProgramQuestionDefinition::required(pets))
                .hidden_when(PredicateDefinition::leaf(
                    QuestionId(2),
                    Scalar::Number,
                    Operator::LessThan,
                    PredicateValue::Long(18),
                )),
        )
        .block(
            BlockDefinition::new(6, "comments")
                .with_question(ProgramQuestionDefinition::optional(comments)),
        )
        .build()
        .expect("valid program")
}

/// `applicant name`, `age`, and `home address` answered in `program`.
pub(super) fn answered_basics(program: ProgramId) -> ApplicantData {
    let mut data = ApplicantData::new();
    let program = i64::try_from(program.0).expect("small id");
    for (raw, value) in [
        ("applicant.applicant_name.first_name", "Alice"),
        ("applicant.applicant_name.last_name", "Doe"),
        ("applicant.home_address.street", "123 Main St"),
        ("applicant.home_address.city", "Seattle"),
        ("applicant.home_address.state", "WA"),
        ("applicant.home_address.zip", "98101"),
    ] {
        data.put_string(&path(raw), value).expect("writes");
    }
    data.put_long(&path("applicant.age.number"), 40).expect("writes");
    for parent in ["applicant.applicant_name", "applicant.age", "applicant.home_address"] {
        data.put_long(&path(parent).join_scalar(Scalar::UpdatedAt), NOW - 1_000)
            .expect("writes");
        data.put_long(&path(parent).join_scalar(Scalar::ProgramUpdatedIn), program)
            .expect("writes");
    }
    data
}

pub(super) fn with_members(mut data: ApplicantData, names: &[&str]) -> ApplicantData {
    for (index, name) in names.iter().enumerate() {
        data.put_string(
            &path("applicant.household_members")
                .at_index(index)
                .join_scalar(Scalar::EntityName),
            *name,
        )
        .expect("writes");
    }
    data
}

pub(super) struct FixedClock(pub(super) i64);

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.0
    }
}

#[derive(Default)]
pub(super) struct MemoryApplicants {
    pub(super) records: Arc<Mutex<HashMap<ApplicantId, ApplicantData>>>,
    next_id: AtomicU64,
    pub(super) updates: AtomicU64,
}

impl MemoryApplicants {
    pub(super) fn seeded(id: ApplicantId, data: ApplicantData) -> Self {
        let applicants = Self::default();
        applicants
            .records
            .lock()
            .expect("repository mutex poisoned")
            .insert(id, data);
        applicants
    }

    pub(super) fn stored(&self, id: ApplicantId) -> Option<ApplicantData> {
        self.records
            .lock()
            .expect("repository mutex poisoned")
            .get(&id)
            .cloned()
    }

    pub(super) fn update_count(&self) -> u64 {
        self.updates.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ApplicantRepository for MemoryApplicants {
    async fn lookup_applicant(
        &self,
        id: ApplicantId,
    ) -> Result<Option<ApplicantData>, RepositoryError> {
        Ok(self.stored(id))
    }

    async fn insert_applicant(&self, data: ApplicantData) -> Result<ApplicantId, RepositoryError> {
        let id = ApplicantId(self.next_id.fetch_add(1, Ordering::SeqCst) + 100);
        self.records
            .lock()
            .expect("repository mutex poisoned")
            .insert(id, data);
        Ok(id)
    }

    async fn update_applicant(
        &self,
        id: ApplicantId,
        data: ApplicantData,
    ) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if !guard.contains_key(&id) {
            return Err(RepositoryError::NotFound);
        }
        guard.insert(id, data);
        self.updates.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
pub(super) struct MemoryPrograms {
    programs: HashMap<ProgramId, Arc<ProgramDefinition>>,
}

impl MemoryPrograms {
    pub(super) fn with(mut self, program: ProgramDefinition) -> Self {
        self.programs.insert(program.id(), Arc::new(program));
        self
    }
}

#[async_trait]
impl ProgramRepository for MemoryPrograms {
    async fn lookup_program(
        &self,
        id: ProgramId,
    ) -> Result<Option<Arc<ProgramDefinition>>, RepositoryError> {
        Ok(self.programs.get(&id).cloned())
    }
}

pub(super) struct UnavailableApplicants;

#[async_trait]
impl ApplicantRepository for UnavailableApplicants {
    async fn lookup_applicant(
        &self,
        _id: ApplicantId,
    ) -> Result<Option<ApplicantData>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    async fn insert_applicant(&self, _data: ApplicantData) -> Result<ApplicantId, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    async fn update_applicant(
        &self,
        _id: ApplicantId,
        _data: ApplicantData,
    ) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

/// Spanish catalog covering one message key.
pub(super) struct SpanishMessages;

impl MessageCatalog for SpanishMessages {
    fn localized_string(&self, key: &str, locale: &Locale) -> Option<String> {
        (locale.language() == "es" && key == "validation.address.no_po_box")
            .then(|| "No aceptamos apartados postales.".to_string())
    }
}

pub(super) const APPLICANT: ApplicantId = ApplicantId(7);

pub(super) fn build_service(
    data: ApplicantData,
) -> (
    ApplicantService<MemoryApplicants, MemoryPrograms>,
    Arc<MemoryApplicants>,
) {
    let applicants = Arc::new(MemoryApplicants::seeded(APPLICANT, data));
    let programs = Arc::new(
        MemoryPrograms::default()
            .with(household_program())
            .with(household_program_with_id(OTHER_PROGRAM.0)),
    );
    let service = ApplicantService::new(applicants.clone(), programs, IntakeConfig::default())
        .with_clock(Arc::new(FixedClock(NOW)));
    (service, applicants)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
