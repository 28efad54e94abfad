//! Location Resolvers: the uniform contract implemented by the FS resolver (local filesystem)
//! and the Group resolver (ordered member federation).

mod fs;
mod group;

pub use fs::FsResolver;
pub use group::GroupResolver;

use async_trait::async_trait;
use bytes::Bytes;
use shared::{RepositoryId, StorageId};

use crate::error::ArtifactResult;

#[async_trait]
pub trait LocationResolver: Send + Sync {
    async fn resolve(&self, storage_id: &StorageId, repo_id: &RepositoryId, path: &str) -> ArtifactResult<Bytes>;

    async fn store(&self, storage_id: &StorageId, repo_id: &RepositoryId, path: &str, content: Bytes) -> ArtifactResult<()>;

    async fn delete(&self, storage_id: &StorageId, repo_id: &RepositoryId, path: &str, force: bool) -> ArtifactResult<()>;

    async fn contains(&self, storage_id: &StorageId, repo_id: &RepositoryId, path: &str) -> ArtifactResult<bool>;
}
