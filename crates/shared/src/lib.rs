//! Small identifiers and value objects shared across the artifact repository crates.

pub mod error;
pub mod ids;
pub mod time;

pub use error::SharedError;
pub use ids::{RepositoryId, StorageId};
pub use time::IsoTimestamp;
