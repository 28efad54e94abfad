use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use shared::{RepositoryId, StorageId};

use repository::{Registry, RepositoryType};

use crate::error::{ArtifactError, ArtifactResult};
use crate::resolver::{FsResolver, LocationResolver};

/// Federates an ordered list of member repositories. Reads fall through members in priority
/// order; writes and deletes are structurally forbidden.
///
/// Recurses into itself for nested group members, carrying a visited-set keyed by
/// `(storage, repo)` so a cyclic membership graph degrades to "member not found" instead of
/// infinite recursion.
pub struct GroupResolver {
    registry: Arc<Registry>,
    fs: FsResolver,
}

impl GroupResolver {
    pub fn new(registry: Arc<Registry>) -> Self {
        let fs = FsResolver::new(registry.clone());
        Self { registry, fs }
    }

    async fn resolve_inner(
        &self,
        storage_id: &StorageId,
        repo_id: &RepositoryId,
        path: &str,
        visited: &mut HashSet<(StorageId, RepositoryId)>,
    ) -> ArtifactResult<Bytes> {
        let key = (storage_id.clone(), repo_id.clone());
        if !visited.insert(key) {
            return Err(ArtifactError::ArtifactNotFound { path: path.to_string() });
        }

        let repo = self
            .registry
            .repository(storage_id, repo_id)
            .map_err(|_| ArtifactError::ArtifactNotFound { path: path.to_string() })?;

        match &repo.repo_type {
            RepositoryType::Hosted => self.fs.resolve(storage_id, repo_id, path).await,
            RepositoryType::Proxy => Err(ArtifactError::Io {
                path: path.to_string(),
                source: std::io::Error::other("proxy repositories are not fetchable by this core"),
            }),
            RepositoryType::Group { members } => {
                let members = members.clone();
                for member in &members {
                    match Box::pin(self.resolve_inner(storage_id, member, path, visited)).await {
                        Ok(bytes) => return Ok(bytes),
                        Err(ArtifactError::ArtifactNotFound { .. }) => continue,
                        Err(other) => return Err(other),
                    }
                }
                Err(ArtifactError::ArtifactNotFound { path: path.to_string() })
            }
        }
    }

    async fn contains_inner(
        &self,
        storage_id: &StorageId,
        repo_id: &RepositoryId,
        path: &str,
        visited: &mut HashSet<(StorageId, RepositoryId)>,
    ) -> ArtifactResult<bool> {
        let key = (storage_id.clone(), repo_id.clone());
        if !visited.insert(key) {
            return Ok(false);
        }
        let repo = self
            .registry
            .repository(storage_id, repo_id)
            .map_err(|_| ArtifactError::ArtifactNotFound { path: path.to_string() })?;

        match &repo.repo_type {
            RepositoryType::Hosted => self.fs.contains(storage_id, repo_id, path).await,
            RepositoryType::Proxy => Ok(false),
            RepositoryType::Group { members } => {
                let members = members.clone();
                for member in &members {
                    if Box::pin(self.contains_inner(storage_id, member, path, visited)).await? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }
}

#[async_trait]
impl LocationResolver for GroupResolver {
    async fn resolve(&self, storage_id: &StorageId, repo_id: &RepositoryId, path: &str) -> ArtifactResult<Bytes> {
        self.resolve_inner(storage_id, repo_id, path, &mut HashSet::new()).await
    }

    async fn store(&self, _storage_id: &StorageId, repo_id: &RepositoryId, _path: &str, _content: Bytes) -> ArtifactResult<()> {
        Err(ArtifactError::WriteToGroupForbidden { repo: repo_id.clone() })
    }

    async fn delete(&self, _storage_id: &StorageId, repo_id: &RepositoryId, _path: &str, _force: bool) -> ArtifactResult<()> {
        Err(ArtifactError::DeleteFromGroupForbidden { repo: repo_id.clone() })
    }

    async fn contains(&self, storage_id: &StorageId, repo_id: &RepositoryId, path: &str) -> ArtifactResult<bool> {
        self.contains_inner(storage_id, repo_id, path, &mut HashSet::new()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use repository::{DeploymentPolicy, Repository, Storage};
    use shared::{RepositoryId as Rid, StorageId as Sid};

    fn build(basedir: &std::path::Path) -> (Arc<Registry>, Sid) {
        let storage_id = Sid::new("s0").unwrap();
        let storage = Storage { id: storage_id.clone(), basedir: basedir.to_path_buf() };
        let r1 = Repository {
            id: Rid::new("r1").unwrap(),
            storage_id: storage_id.clone(),
            repo_type: RepositoryType::Hosted,
            policy: DeploymentPolicy::Release,
            in_service: true,
            allows_redeployment: true,
            checksum_headers_enabled: false,
            basedir: basedir.join("r1"),
        };
        let r2 = Repository {
            id: Rid::new("r2").unwrap(),
            storage_id: storage_id.clone(),
            repo_type: RepositoryType::Hosted,
            policy: DeploymentPolicy::Release,
            in_service: true,
            allows_redeployment: true,
            checksum_headers_enabled: false,
            basedir: basedir.join("r2"),
        };
        let group = Repository {
            id: Rid::new("g").unwrap(),
            storage_id: storage_id.clone(),
            repo_type: RepositoryType::Group { members: vec![r1.id.clone(), r2.id.clone()] },
            policy: DeploymentPolicy::Mixed,
            in_service: true,
            allows_redeployment: true,
            checksum_headers_enabled: false,
            basedir: basedir.to_path_buf(),
        };
        let registry = Registry::new(vec![storage], vec![r1, r2, group]).unwrap();
        (Arc::new(registry), storage_id)
    }

    #[tokio::test]
    async fn resolves_from_first_member_containing_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let (registry, sid) = build(dir.path());
        let fs = FsResolver::new(registry.clone());
        let r2 = Rid::new("r2").unwrap();
        fs.store(&sid, &r2, "p.jar", Bytes::from_static(b"from-r2")).await.unwrap();

        let group = GroupResolver::new(registry);
        let gid = Rid::new("g").unwrap();
        let got = group.resolve(&sid, &gid, "p.jar").await.unwrap();
        assert_eq!(&got[..], b"from-r2");
    }

    #[tokio::test]
    async fn store_and_delete_are_forbidden() {
        let dir = tempfile::tempdir().unwrap();
        let (registry, sid) = build(dir.path());
        let group = GroupResolver::new(registry);
        let gid = Rid::new("g").unwrap();
        assert!(matches!(
            group.store(&sid, &gid, "p.jar", Bytes::from_static(b"x")).await.unwrap_err(),
            ArtifactError::WriteToGroupForbidden { .. }
        ));
        assert!(matches!(
            group.delete(&sid, &gid, "p.jar", false).await.unwrap_err(),
            ArtifactError::DeleteFromGroupForbidden { .. }
        ));
    }

    #[tokio::test]
    async fn missing_in_all_members_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let (registry, sid) = build(dir.path());
        let group = GroupResolver::new(registry);
        let gid = Rid::new("g").unwrap();
        assert!(matches!(
            group.resolve(&sid, &gid, "missing.jar").await.unwrap_err(),
            ArtifactError::ArtifactNotFound { .. }
        ));
    }
}
