//! Storage and repository topology: the static data model describing where artifacts live
//! and under what policy, plus an in-memory registry built once at startup.

pub mod error;
pub mod model;
pub mod registry;

pub use error::RepositoryError;
pub use model::{
    DeploymentPolicy, Repository, RepositoryType, Storage,
};
pub use registry::Registry;
