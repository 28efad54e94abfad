//! HTTP surface translating the artifact management service into the repository server's wire
//! protocol.

pub mod error;
pub mod handlers;
pub mod router;

pub use error::{DistributionError, DistributionResult};
pub use handlers::AppState;
pub use router::build_router;
