use std::io;
use thiserror::Error;

/// Bootstrap-time errors: configuration, logging setup, and binding the listener. Per-request
/// errors are handled entirely inside `distribution::DistributionError`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("failed to initialize logging: {0}")]
    LoggingSetup(String),

    #[error("repository topology error: {0}")]
    Topology(String),

    #[error("failed to bind server: {0}")]
    ServerBind(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;
