use crate::applicant::router::status_for;
use crate::applicant::{ApplicantServiceError, SummaryExportError};
use crate::config::ConfigError;
use crate::program::ProgramError;
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Program(ProgramError),
    Service(ApplicantServiceError),
    Summary(SummaryExportError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Program(err) => write!(f, "program definition error: {}", err),
            AppError::Service(err) => write!(f, "applicant service error: {}", err),
            AppError::Summary(err) => write!(f, "summary export error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Program(err) => Some(err),
            AppError::Service(err) => Some(err),
            AppError::Summary(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Program(_) => StatusCode::BAD_REQUEST,
            AppError::Service(err) => status_for(err),
            AppError::Summary(_)
            | AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<ProgramError> for AppError {
    fn from(value: ProgramError) -> Self {
        Self::Program(value)
    }
}

impl From<ApplicantServiceError> for AppError {
    fn from(value: ApplicantServiceError) -> Self {
        Self::Service(value)
    }
}

impl From<SummaryExportError> for AppError {
    fn from(value: SummaryExportError) -> Self {
        Self::Summary(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::applicant::{ApplicantId, Path, RepositoryError, StagingError};
    use crate::program::ProgramId;

    fn status(err: impl Into<AppError>) -> StatusCode {
        err.into().into_response().status()
    }

    fn staging(err: StagingError) -> StatusCode {
        status(ApplicantServiceError::Staging(err))
    }

    #[test]
    fn service_failures_keep_their_router_status() {
        let path = Path::parse("applicant.name.first_name[0]").expect("valid");
        assert_eq!(
            status(ApplicantServiceError::TooManyUpdates { count: 9, max: 8 }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            staging(StagingError::PathNotInBlock {
                block_id: "1".to_string(),
                path: path.clone(),
            }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            staging(StagingError::ReservedScalarKey(path)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            staging(StagingError::BlockNotFound("9".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status(ApplicantServiceError::ApplicantNotFound(ApplicantId(3))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status(ApplicantServiceError::ProgramNotFound(ProgramId(3))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status(ApplicantServiceError::Repository(RepositoryError::Unavailable(
                "down".to_string()
            ))),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn non_service_failures_map_by_kind() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        assert_eq!(status(io), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
