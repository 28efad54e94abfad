use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use shared::{RepositoryId, StorageId};

/// A named container of repositories, backed by a filesystem root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Storage {
    pub id: StorageId,
    pub basedir: PathBuf,
}

/// How a repository resolves writes/snapshots.
///
/// `Mixed` rejects neither releases nor snapshots; only the redeployment rule still applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentPolicy {
    Release,
    Snapshot,
    Mixed,
}

/// Dispatch key for the Location Resolver layer.
///
/// `Proxy` is accepted for forward-compatible configuration parsing; no proxy resolver exists,
/// so resolver dispatch against a proxy repository always fails (see `artifact::resolver`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RepositoryType {
    Hosted,
    Group { members: Vec<RepositoryId> },
    Proxy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    pub id: RepositoryId,
    pub storage_id: StorageId,
    pub repo_type: RepositoryType,
    pub policy: DeploymentPolicy,
    pub in_service: bool,
    pub allows_redeployment: bool,
    pub checksum_headers_enabled: bool,
    pub basedir: PathBuf,
}

impl Repository {
    pub fn is_group(&self) -> bool {
        matches!(self.repo_type, RepositoryType::Group { .. })
    }

    pub fn is_proxy(&self) -> bool {
        matches!(self.repo_type, RepositoryType::Proxy)
    }

    pub fn group_members(&self) -> &[RepositoryId] {
        match &self.repo_type {
            RepositoryType::Group { members } => members,
            _ => &[],
        }
    }
}
