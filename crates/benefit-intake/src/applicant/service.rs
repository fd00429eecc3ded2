use std::sync::Arc;

use tracing::{debug, info, warn};

use super::data::ApplicantData;
use super::navigation::ReadOnlyApplicantProgramService;
use super::repository::{
    ApplicantId, ApplicantRepository, Clock, DefaultMessages, MessageCatalog, ProgramRepository,
    RepositoryError, SystemClock,
};
use super::staging::{stage_updates, StageOutcome, StagedUpdates, StagingError};
use crate::config::IntakeConfig;
use crate::program::{ProgramDefinition, ProgramId};

/// Service composing the applicant and program repositories with the staging engine.
pub struct ApplicantService<A, P> {
    applicants: Arc<A>,
    programs: Arc<P>,
    clock: Arc<dyn Clock>,
    messages: Arc<dyn MessageCatalog>,
    config: IntakeConfig,
}

impl<A, P> ApplicantService<A, P>
where
    A: ApplicantRepository + 'static,
    P: ProgramRepository + 'static,
{
    pub fn new(applicants: Arc<A>, programs: Arc<P>, config: IntakeConfig) -> Self {
        Self {
            applicants,
            programs,
            clock: Arc::new(SystemClock),
            messages: Arc::new(DefaultMessages),
            config,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_messages(mut self, messages: Arc<dyn MessageCatalog>) -> Self {
        self.messages = messages;
        self
    }

    pub fn messages(&self) -> &dyn MessageCatalog {
        self.messages.as_ref()
    }

    pub fn config(&self) -> &IntakeConfig {
        &self.config
    }

    /// Insert an empty document stamped with the configured default locale.
    pub async fn create_applicant(&self) -> Result<ApplicantId, ApplicantServiceError> {
        let data = ApplicantData::with_locale(self.config.default_locale.clone());
        let applicant_id = self.applicants.insert_applicant(data).await?;
        info!(%applicant_id, "applicant created");
        Ok(applicant_id)
    }

    /// Current progress of an applicant through a program.
    pub async fn read_only_applicant_program_service(
        &self,
        applicant_id: ApplicantId,
        program_id: ProgramId,
    ) -> Result<ReadOnlyApplicantProgramService, ApplicantServiceError> {
        let (data, program) = self.load(applicant_id, program_id).await?;
        Ok(self.view(Arc::new(data), program))
    }

    /// Apply one form submission to a block, saving only when the block ends up valid.
    ///
    /// Validation failures are not errors: the outcome carries the unsaved view and
    /// `persisted` is false. Malformed or out-of-block paths reject the whole batch.
    pub async fn stage_and_update_if_valid<'a, I>(
        &self,
        applicant_id: ApplicantId,
        program_id: ProgramId,
        block_id: &str,
        updates: I,
    ) -> Result<StageOutcome, ApplicantServiceError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let updates = StagedUpdates::parse(updates)?;
        if updates.len() > self.config.max_updates {
            return Err(ApplicantServiceError::TooManyUpdates {
                count: updates.len(),
                max: self.config.max_updates,
            });
        }

        debug!(
            %applicant_id,
            %program_id,
            block_id,
            update_count = updates.len(),
            "staging applicant updates"
        );

        let (data, program) = self.load(applicant_id, program_id).await?;
        let current = ReadOnlyApplicantProgramService::new(Arc::new(data), program.clone());
        let staged = stage_updates(
            &current,
            block_id,
            &updates,
            program_id,
            self.clock.now_millis(),
        )?;

        let view = self.view(Arc::new(staged.data), program);
        let block_valid = view
            .block(block_id)
            .is_some_and(|block| !block.has_errors());
        let persist = !updates.is_empty() && staged.field_errors.is_empty() && block_valid;

        if persist {
            self.applicants
                .update_applicant(applicant_id, view.applicant_data().clone())
                .await?;
            info!(%applicant_id, %program_id, block_id, "applicant updates persisted");
        } else {
            debug!(
                %applicant_id,
                block_id,
                field_errors = staged.field_errors.len(),
                block_valid,
                "applicant updates not persisted"
            );
        }

        Ok(StageOutcome {
            view,
            field_errors: staged.field_errors,
            persisted: persist,
        })
    }

    /// Both loads run concurrently; a missing applicant is reported before a missing program.
    async fn load(
        &self,
        applicant_id: ApplicantId,
        program_id: ProgramId,
    ) -> Result<(ApplicantData, Arc<ProgramDefinition>), ApplicantServiceError> {
        let (applicant, program) = tokio::join!(
            self.applicants.lookup_applicant(applicant_id),
            self.programs.lookup_program(program_id)
        );
        let data = applicant?.ok_or(ApplicantServiceError::ApplicantNotFound(applicant_id))?;
        let program = program?.ok_or(ApplicantServiceError::ProgramNotFound(program_id))?;
        Ok((data, program))
    }

    fn view(
        &self,
        data: Arc<ApplicantData>,
        program: Arc<ProgramDefinition>,
    ) -> ReadOnlyApplicantProgramService {
        let view = ReadOnlyApplicantProgramService::new(data, program);
        for warning in view.predicate_warnings() {
            warn!(
                program_id = %view.program().id(),
                block_id = %warning.block_id,
                role = ?warning.role,
                anomaly = %warning.anomaly,
                "predicate evaluation failed open"
            );
        }
        view
    }
}

/// Error raised by the applicant service.
#[derive(Debug, thiserror::Error)]
pub enum ApplicantServiceError {
    #[error("{count} updates exceed the limit of {max} per submission")]
    TooManyUpdates { count: usize, max: usize },
    #[error("applicant {0} not found")]
    ApplicantNotFound(ApplicantId),
    #[error("program {0} not found")]
    ProgramNotFound(ProgramId),
    #[error(transparent)]
    Staging(#[from] StagingError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
