use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use artifact::ArtifactError;
use shared::IsoTimestamp;

/// HTTP-facing error type. Wraps [`ArtifactError`] plus the small set of errors that can only
/// occur at the HTTP boundary (missing query parameters, malformed identifiers).
#[derive(Debug, Error)]
pub enum DistributionError {
    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    #[error("missing query parameter: {0}")]
    MissingParam(&'static str),

    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

fn map_artifact_error(err: &ArtifactError) -> (StatusCode, &'static str) {
    match err {
        ArtifactError::ArtifactNotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
        ArtifactError::RepositoryOutOfService { .. } => (StatusCode::SERVICE_UNAVAILABLE, "out_of_service"),
        ArtifactError::InvalidPath { .. } | ArtifactError::InvalidCoordinates { .. } => {
            (StatusCode::BAD_REQUEST, "bad_request")
        }
        ArtifactError::VersionPolicyViolation { .. } => (StatusCode::BAD_REQUEST, "version_policy_violation"),
        ArtifactError::RedeploymentForbidden { .. } => (StatusCode::BAD_REQUEST, "redeployment_forbidden"),
        ArtifactError::WriteToGroupForbidden { .. } | ArtifactError::DeleteFromGroupForbidden { .. } => {
            (StatusCode::BAD_REQUEST, "group_repository")
        }
        ArtifactError::RangeNotSatisfiable { .. } => (StatusCode::RANGE_NOT_SATISFIABLE, "range_not_satisfiable"),
        ArtifactError::MetadataCorrupt { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "metadata_corrupt"),
        ArtifactError::ChecksumMismatch { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "checksum_mismatch"),
        ArtifactError::Io { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "io_error"),
    }
}

impl IntoResponse for DistributionError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            DistributionError::Artifact(e) => map_artifact_error(e),
            DistributionError::MissingParam(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            DistributionError::InvalidId(_) => (StatusCode::BAD_REQUEST, "bad_request"),
        };
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(%message, %error_type, "request failed");
        } else {
            tracing::warn!(%message, %error_type, "request rejected");
        }

        let body = Json(json!({
            "error": {
                "type": error_type,
                "message": message,
                "timestamp": IsoTimestamp::now().to_string(),
            }
        }));
        (status, body).into_response()
    }
}

pub type DistributionResult<T> = std::result::Result<T, DistributionError>;
