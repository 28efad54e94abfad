use shared::RepositoryId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("unknown storage: {0}")]
    UnknownStorage(String),

    #[error("unknown repository: {0}")]
    UnknownRepository(RepositoryId),

    #[error("invalid repository configuration for {repo}: {reason}")]
    InvalidConfig { repo: RepositoryId, reason: String },

    #[error("failed to load repository topology: {0}")]
    ConfigLoad(String),
}

pub type RepositoryResult<T> = std::result::Result<T, RepositoryError>;
