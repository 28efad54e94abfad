//! Composition root: wires the repository registry, the artifact management service, and the
//! checksum cache sweeper into a ready-to-serve [`distribution::AppState`].

use std::sync::Arc;
use std::time::Duration;

use artifact::{ArtifactService, ChecksumCache};
use distribution::AppState;
use repository::{Registry, Repository, Storage};
use serde::Deserialize;
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::error::{AppError, Result};

pub struct Bootstrapped {
    pub state: AppState,
    pub cache_sweeper: JoinHandle<()>,
}

/// On-disk shape of a topology file: the same `Storage`/`Repository` model the in-memory
/// `Registry` is built from, so no translation layer sits between the file and `Registry::new`.
#[derive(Debug, Deserialize)]
struct TopologyFile {
    storages: Vec<Storage>,
    repositories: Vec<Repository>,
}

async fn load_registry(config: &Config) -> Result<Registry> {
    let Some(topology_file) = &config.storage.topology_file else {
        return Registry::single_storage_defaults(&config.storage.basedir).map_err(|e| AppError::Topology(e.to_string()));
    };

    let contents = tokio::fs::read_to_string(topology_file)
        .await
        .map_err(|e| AppError::Topology(format!("reading {}: {e}", topology_file.display())))?;
    let topology: TopologyFile = serde_json::from_str(&contents)
        .map_err(|e| AppError::Topology(format!("parsing {}: {e}", topology_file.display())))?;

    Registry::new(topology.storages, topology.repositories).map_err(|e| AppError::Topology(e.to_string()))
}

pub async fn bootstrap(config: &Config) -> Result<Bootstrapped> {
    tokio::fs::create_dir_all(&config.storage.basedir)
        .await
        .map_err(|e| AppError::Topology(e.to_string()))?;

    let registry = load_registry(config).await?;

    let cache = ChecksumCache::new(Duration::from_millis(config.checksum_cache.lifetime_ms));
    let service = Arc::new(ArtifactService::new(Arc::new(registry), cache));
    let cache_sweeper = service
        .start_cache_sweeper(Duration::from_millis(config.checksum_cache.expired_check_interval_ms))
        .await;

    Ok(Bootstrapped {
        state: AppState { service },
        cache_sweeper,
    })
}
