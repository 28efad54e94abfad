use shared::RepositoryId;
use thiserror::Error;

/// Error taxonomy for the artifact access and integrity subsystem.
///
/// Every variant carries enough context to log an actionable line at the boundary where it is
/// first handled, and maps 1:1 to an HTTP status in `distribution::error`.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("artifact not found: {path}")]
    ArtifactNotFound { path: String },

    #[error("repository {repo} is out of service")]
    RepositoryOutOfService { repo: RepositoryId },

    #[error("invalid path: {path}: {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("invalid coordinates for path {path}: {reason}")]
    InvalidCoordinates { path: String, reason: String },

    #[error("version policy violation on {path}: {reason}")]
    VersionPolicyViolation { path: String, reason: String },

    #[error("redeployment forbidden: {path} already exists")]
    RedeploymentForbidden { path: String },

    #[error("cannot write into group repository {repo}")]
    WriteToGroupForbidden { repo: RepositoryId },

    #[error("cannot delete from group repository {repo}")]
    DeleteFromGroupForbidden { repo: RepositoryId },

    #[error("range not satisfiable: offset {offset} >= length {length}")]
    RangeNotSatisfiable { offset: u64, length: u64 },

    #[error("metadata corrupt at {path}: {reason}")]
    MetadataCorrupt { path: String, reason: String },

    #[error("checksum mismatch for {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    #[error("io error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl ArtifactError {
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error should be logged at `error!` (server-class) rather than
    /// `warn!`/`debug!` (client-class) at the boundary that surfaces it as an HTTP response.
    pub fn is_server_fault(&self) -> bool {
        matches!(
            self,
            ArtifactError::Io { .. } | ArtifactError::MetadataCorrupt { .. }
        )
    }
}

pub type ArtifactResult<T> = std::result::Result<T, ArtifactError>;
