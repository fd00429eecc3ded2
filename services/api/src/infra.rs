use async_trait::async_trait;
use benefit_intake::applicant::{
    ApplicantData, ApplicantId, ApplicantRepository, Clock, ProgramRepository, RepositoryError,
};
use benefit_intake::program::{ProgramDefinition, ProgramId};
use chrono::{NaiveDate, NaiveTime};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryApplicantRepository {
    records: Arc<Mutex<HashMap<ApplicantId, ApplicantData>>>,
    next_id: Arc<AtomicU64>,
}

#[async_trait]
impl ApplicantRepository for InMemoryApplicantRepository {
    async fn lookup_applicant(
        &self,
        id: ApplicantId,
    ) -> Result<Option<ApplicantData>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(&id).cloned())
    }

    async fn insert_applicant(&self, data: ApplicantData) -> Result<ApplicantId, RepositoryError> {
        let id = ApplicantId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        guard.insert(id, data);
        Ok(id)
    }

    async fn update_applicant(
        &self,
        id: ApplicantId,
        data: ApplicantData,
    ) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&id) {
            guard.insert(id, data);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }
}

/// Published programs, fixed at startup.
#[derive(Default, Clone)]
pub(crate) struct InMemoryProgramRepository {
    programs: Arc<HashMap<ProgramId, Arc<ProgramDefinition>>>,
}

impl InMemoryProgramRepository {
    pub(crate) fn new(programs: impl IntoIterator<Item = ProgramDefinition>) -> Self {
        let programs = programs
            .into_iter()
            .map(|program| (program.id(), Arc::new(program)))
            .collect();
        Self {
            programs: Arc::new(programs),
        }
    }
}

#[async_trait]
impl ProgramRepository for InMemoryProgramRepository {
    async fn lookup_program(
        &self,
        id: ProgramId,
    ) -> Result<Option<Arc<ProgramDefinition>>, RepositoryError> {
        Ok(self.programs.get(&id).cloned())
    }
}

/// Clock pinned to midnight UTC of a given day, for reproducible demo timestamps.
pub(crate) struct PinnedClock {
    millis: i64,
}

impl PinnedClock {
    pub(crate) fn at(day: NaiveDate) -> Self {
        Self {
            millis: day.and_time(NaiveTime::MIN).and_utc().timestamp_millis(),
        }
    }
}

impl Clock for PinnedClock {
    fn now_millis(&self) -> i64 {
        self.millis
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
