use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;

use super::repository::{ApplicantId, ApplicantRepository, ProgramRepository, RepositoryError};
use super::service::{ApplicantService, ApplicantServiceError};
use super::staging::StagingError;
use super::summary::write_csv;
use super::views::{ApplicantCreatedView, ProgramProgressView, StageResultView, SummaryView};
use crate::program::ProgramId;

/// Router builder exposing applicant intake endpoints.
pub fn applicant_router<A, P>(service: Arc<ApplicantService<A, P>>) -> Router
where
    A: ApplicantRepository + 'static,
    P: ProgramRepository + 'static,
{
    Router::new()
        .route("/api/v1/applicants", post(create_handler::<A, P>))
        .route(
            "/api/v1/applicants/:applicant_id/programs/:program_id",
            get(progress_handler::<A, P>),
        )
        .route(
            "/api/v1/applicants/:applicant_id/programs/:program_id/blocks/:block_id",
            post(stage_handler::<A, P>),
        )
        .route(
            "/api/v1/applicants/:applicant_id/programs/:program_id/summary",
            get(summary_handler::<A, P>),
        )
        .route(
            "/api/v1/applicants/:applicant_id/programs/:program_id/summary/csv",
            get(summary_csv_handler::<A, P>),
        )
        .with_state(service)
}

pub(crate) async fn create_handler<A, P>(
    State(service): State<Arc<ApplicantService<A, P>>>,
) -> Response
where
    A: ApplicantRepository + 'static,
    P: ProgramRepository + 'static,
{
    match service.create_applicant().await {
        Ok(applicant_id) => (
            StatusCode::CREATED,
            axum::Json(ApplicantCreatedView { applicant_id }),
        )
            .into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn progress_handler<A, P>(
    State(service): State<Arc<ApplicantService<A, P>>>,
    Path((applicant_id, program_id)): Path<(u64, u64)>,
) -> Response
where
    A: ApplicantRepository + 'static,
    P: ProgramRepository + 'static,
{
    let applicant_id = ApplicantId(applicant_id);
    match service
        .read_only_applicant_program_service(applicant_id, ProgramId(program_id))
        .await
    {
        Ok(view) => {
            let payload = ProgramProgressView::render(applicant_id, &view, service.messages());
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

/// Validation failures still answer 200; `persisted` tells the client whether to advance.
pub(crate) async fn stage_handler<A, P>(
    State(service): State<Arc<ApplicantService<A, P>>>,
    Path((applicant_id, program_id, block_id)): Path<(u64, u64, String)>,
    axum::Json(updates): axum::Json<BTreeMap<String, String>>,
) -> Response
where
    A: ApplicantRepository + 'static,
    P: ProgramRepository + 'static,
{
    let outcome = service
        .stage_and_update_if_valid(
            ApplicantId(applicant_id),
            ProgramId(program_id),
            &block_id,
            updates
                .iter()
                .map(|(path, value)| (path.as_str(), value.as_str())),
        )
        .await;

    match outcome {
        Ok(outcome) => {
            let payload = StageResultView::render(&block_id, &outcome, service.messages());
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn summary_handler<A, P>(
    State(service): State<Arc<ApplicantService<A, P>>>,
    Path((applicant_id, program_id)): Path<(u64, u64)>,
) -> Response
where
    A: ApplicantRepository + 'static,
    P: ProgramRepository + 'static,
{
    let applicant_id = ApplicantId(applicant_id);
    match service
        .read_only_applicant_program_service(applicant_id, ProgramId(program_id))
        .await
    {
        Ok(view) => {
            let payload = SummaryView::render(applicant_id, &view);
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn summary_csv_handler<A, P>(
    State(service): State<Arc<ApplicantService<A, P>>>,
    Path((applicant_id, program_id)): Path<(u64, u64)>,
) -> Response
where
    A: ApplicantRepository + 'static,
    P: ProgramRepository + 'static,
{
    let view = match service
        .read_only_applicant_program_service(ApplicantId(applicant_id), ProgramId(program_id))
        .await
    {
        Ok(view) => view,
        Err(error) => return error_response(error),
    };

    let mut buffer = Vec::new();
    match write_csv(&view.summary_data(), &mut buffer) {
        Ok(()) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/csv; charset=utf-8")],
            buffer,
        )
            .into_response(),
        Err(error) => {
            let payload = json!({
                "error": error.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

/// HTTP status for a service failure; shared with [`crate::error::AppError`].
pub(crate) fn status_for(error: &ApplicantServiceError) -> StatusCode {
    match error {
        ApplicantServiceError::TooManyUpdates { .. }
        | ApplicantServiceError::Staging(StagingError::InvalidPath { .. })
        | ApplicantServiceError::Staging(StagingError::ReservedScalarKey(_))
        | ApplicantServiceError::Staging(StagingError::PathNotInBlock { .. })
        | ApplicantServiceError::Staging(StagingError::EntityNamesNotIndexed { .. })
        | ApplicantServiceError::Staging(StagingError::ProgramIdOutOfRange(_)) => {
            StatusCode::BAD_REQUEST
        }
        ApplicantServiceError::ApplicantNotFound(_)
        | ApplicantServiceError::ProgramNotFound(_)
        | ApplicantServiceError::Staging(StagingError::BlockNotFound(_))
        | ApplicantServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        ApplicantServiceError::Staging(StagingError::Document(_)) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        ApplicantServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

fn error_response(error: ApplicantServiceError) -> Response {
    let status = status_for(&error);

    let payload = json!({
        "error": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}
