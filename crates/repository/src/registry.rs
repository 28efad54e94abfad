use std::collections::HashMap;
use std::path::Path;

use shared::{RepositoryId, StorageId};

use crate::error::{RepositoryError, RepositoryResult};
use crate::model::{DeploymentPolicy, Repository, RepositoryType, Storage};

/// Immutable, process-wide view of the storages/repositories topology.
///
/// Built once at startup from `Config`; the only mutable field on a member `Repository` is
/// `in_service`, which callers toggle through [`Registry::set_in_service`].
#[derive(Debug, Default)]
pub struct Registry {
    storages: HashMap<StorageId, Storage>,
    repositories: HashMap<(StorageId, RepositoryId), Repository>,
}

impl Registry {
    pub fn new(storages: Vec<Storage>, repositories: Vec<Repository>) -> RepositoryResult<Self> {
        let storages: HashMap<_, _> = storages.into_iter().map(|s| (s.id.clone(), s)).collect();
        let mut repos = HashMap::new();
        for repo in repositories {
            if !storages.contains_key(&repo.storage_id) {
                return Err(RepositoryError::UnknownStorage(repo.storage_id.to_string()));
            }
            if let RepositoryType::Group { members } = &repo.repo_type {
                if members.is_empty() {
                    return Err(RepositoryError::InvalidConfig {
                        repo: repo.id.clone(),
                        reason: "group repository must list at least one member".into(),
                    });
                }
            }
            repos.insert((repo.storage_id.clone(), repo.id.clone()), repo);
        }
        Ok(Self {
            storages,
            repositories: repos,
        })
    }

    pub fn storage(&self, id: &StorageId) -> Option<&Storage> {
        self.storages.get(id)
    }

    pub fn repository(&self, storage_id: &StorageId, repo_id: &RepositoryId) -> RepositoryResult<&Repository> {
        self.repositories
            .get(&(storage_id.clone(), repo_id.clone()))
            .ok_or_else(|| RepositoryError::UnknownRepository(repo_id.clone()))
    }

    pub fn set_in_service(&mut self, storage_id: &StorageId, repo_id: &RepositoryId, in_service: bool) -> RepositoryResult<()> {
        let repo = self
            .repositories
            .get_mut(&(storage_id.clone(), repo_id.clone()))
            .ok_or_else(|| RepositoryError::UnknownRepository(repo_id.clone()))?;
        repo.in_service = in_service;
        Ok(())
    }

    /// A minimal two-repository topology (`storage0/releases`, `storage0/snapshots`) rooted
    /// under `base`, used for local runs and as a test fixture when no topology file is given.
    pub fn single_storage_defaults(base: &Path) -> RepositoryResult<Self> {
        let storage_id = StorageId::new("storage0").map_err(|e| RepositoryError::ConfigLoad(e.to_string()))?;
        let storage = Storage {
            id: storage_id.clone(),
            basedir: base.to_path_buf(),
        };

        let releases_id = RepositoryId::new("releases").map_err(|e| RepositoryError::ConfigLoad(e.to_string()))?;
        let releases = Repository {
            id: releases_id,
            storage_id: storage_id.clone(),
            repo_type: RepositoryType::Hosted,
            policy: DeploymentPolicy::Release,
            in_service: true,
            allows_redeployment: false,
            checksum_headers_enabled: true,
            basedir: base.join("releases"),
        };

        let snapshots_id = RepositoryId::new("snapshots").map_err(|e| RepositoryError::ConfigLoad(e.to_string()))?;
        let snapshots = Repository {
            id: snapshots_id,
            storage_id: storage_id.clone(),
            repo_type: RepositoryType::Hosted,
            policy: DeploymentPolicy::Snapshot,
            in_service: true,
            allows_redeployment: true,
            checksum_headers_enabled: true,
            basedir: base.join("snapshots"),
        };

        Self::new(vec![storage], vec![releases, snapshots])
    }
}
