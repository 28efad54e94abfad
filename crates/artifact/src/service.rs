//! The Artifact Management Service: orchestrates resolver selection, validation, the checksum
//! cache, and directory metadata on top of the Location Resolvers.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use repository::{Registry, RepositoryType};
use shared::{RepositoryId, StorageId};
use tokio::sync::Mutex;

use crate::cache::ChecksumCache;
use crate::checksum::{digest_bytes, Algorithm};
use crate::coordinates::{is_checksum, is_metadata, parse_coordinates};
use crate::error::{ArtifactError, ArtifactResult};
use crate::metadata::{MetadataLevel, MetadataManager};
use crate::resolver::{FsResolver, GroupResolver, LocationResolver};
use crate::validation::ValidationPipeline;

/// A digest pair produced or looked up for an artifact download.
#[derive(Debug, Clone, Default)]
pub struct ArtifactDigests {
    pub md5: Option<String>,
    pub sha1: Option<String>,
}

pub struct ArtifactService {
    registry: Arc<Registry>,
    fs: FsResolver,
    group: GroupResolver,
    cache: ChecksumCache,
    validators: ValidationPipeline,
    /// Per `(storage, repo, path)` lock serializing store/delete of the same artifact.
    path_locks: Mutex<HashMap<(StorageId, RepositoryId, String), Arc<Mutex<()>>>>,
}

impl ArtifactService {
    pub fn new(registry: Arc<Registry>, cache: ChecksumCache) -> Self {
        Self {
            fs: FsResolver::new(registry.clone()),
            group: GroupResolver::new(registry.clone()),
            validators: ValidationPipeline::standard(),
            registry,
            cache,
            path_locks: Mutex::new(HashMap::new()),
        }
    }

    fn resolver_for(&self, repo_type: &RepositoryType) -> ArtifactResult<&dyn LocationResolver> {
        match repo_type {
            RepositoryType::Hosted => Ok(&self.fs),
            RepositoryType::Group { .. } => Ok(&self.group),
            RepositoryType::Proxy => Err(ArtifactError::Io {
                path: String::new(),
                source: std::io::Error::other("proxy repositories are not fetchable by this core"),
            }),
        }
    }

    async fn lock_for(&self, storage_id: &StorageId, repo_id: &RepositoryId, path: &str) -> Arc<Mutex<()>> {
        let key = (storage_id.clone(), repo_id.clone(), path.to_string());
        let mut locks = self.path_locks.lock().await;
        locks.entry(key).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
    }

    pub async fn resolve(&self, storage_id: &StorageId, repo_id: &RepositoryId, path: &str) -> ArtifactResult<Bytes> {
        let repo = self.registry.repository(storage_id, repo_id).map_err(|_| ArtifactError::ArtifactNotFound {
            path: path.to_string(),
        })?;
        if !repo.in_service {
            return Err(ArtifactError::RepositoryOutOfService { repo: repo_id.clone() });
        }
        let resolver = self.resolver_for(&repo.repo_type)?;
        resolver.resolve(storage_id, repo_id, path).await
    }

    pub async fn digests_for(&self, storage_id: &StorageId, repo_id: &RepositoryId, path: &str) -> ArtifactDigests {
        let cache_key = format!("{storage_id}/{repo_id}/{path}");
        let md5 = self.cache.get(&cache_key, Algorithm::Md5).await;
        let sha1 = self.cache.get(&cache_key, Algorithm::Sha1).await;
        if md5.is_some() || sha1.is_some() {
            return ArtifactDigests { md5, sha1 };
        }
        // Fall through to the sidecar files on a cache miss.
        let md5 = self.resolve(storage_id, repo_id, &format!("{path}.md5")).await.ok();
        let sha1 = self.resolve(storage_id, repo_id, &format!("{path}.sha1")).await.ok();
        let digests = ArtifactDigests {
            md5: md5.map(|b| String::from_utf8_lossy(&b).trim().to_string()),
            sha1: sha1.map(|b| String::from_utf8_lossy(&b).trim().to_string()),
        };
        if digests.md5.is_some() || digests.sha1.is_some() {
            self.cache
                .put(
                    cache_key,
                    crate::checksum::DigestSet {
                        md5: digests.md5.clone(),
                        sha1: digests.sha1.clone(),
                    },
                )
                .await;
        }
        digests
    }

    pub async fn store(&self, storage_id: &StorageId, repo_id: &RepositoryId, path: &str, content: Bytes) -> ArtifactResult<()> {
        let repo = self.registry.repository(storage_id, repo_id).map_err(|_| ArtifactError::ArtifactNotFound {
            path: path.to_string(),
        })?;
        if !repo.in_service {
            return Err(ArtifactError::RepositoryOutOfService { repo: repo_id.clone() });
        }
        if repo.is_group() {
            return Err(ArtifactError::WriteToGroupForbidden { repo: repo_id.clone() });
        }

        let lock = self.lock_for(storage_id, repo_id, path).await;
        let _guard = lock.lock().await;

        let resolver = self.resolver_for(&repo.repo_type)?;

        if is_checksum(path) {
            resolver.store(storage_id, repo_id, path, content).await?;
            return Ok(());
        }

        if is_metadata(path) {
            let metadata = MetadataManager::parse_metadata(&content)?;
            let dir = metadata_directory(path);
            MetadataManager::store_metadata(&repo.basedir.join(&dir), metadata, MetadataLevel::ArtifactRootLevel).await?;
            self.cache.invalidate(&format!("{storage_id}/{repo_id}/{path}")).await;
            return Ok(());
        }

        let coords = parse_coordinates(path)?;
        let exists = resolver.contains(storage_id, repo_id, path).await?;
        self.validators.run(repo, &coords, path, exists)?;

        let digests = digest_bytes(&content);
        resolver.store(storage_id, repo_id, path, content).await?;

        let cache_key = format!("{storage_id}/{repo_id}/{path}");
        self.cache.invalidate(&cache_key).await;
        self.cache.put(cache_key, digests).await;

        let dir = artifact_directory(path);
        MetadataManager::add_version(&repo.basedir.join(&dir), &coords.group_id, &coords.artifact_id, &coords.version)
            .await?;

        tracing::info!(storage = %storage_id, repository = %repo_id, path, "artifact stored");
        Ok(())
    }

    pub async fn delete(&self, storage_id: &StorageId, repo_id: &RepositoryId, path: &str, force: bool) -> ArtifactResult<()> {
        let repo = self.registry.repository(storage_id, repo_id).map_err(|_| ArtifactError::ArtifactNotFound {
            path: path.to_string(),
        })?;
        if repo.is_group() {
            return Err(ArtifactError::DeleteFromGroupForbidden { repo: repo_id.clone() });
        }

        let lock = self.lock_for(storage_id, repo_id, path).await;
        let _guard = lock.lock().await;

        let resolver = self.resolver_for(&repo.repo_type)?;
        let coords = if !is_checksum(path) && !is_metadata(path) {
            Some(parse_coordinates(path)?)
        } else {
            None
        };

        resolver.delete(storage_id, repo_id, path, force).await?;
        self.cache.invalidate(&format!("{storage_id}/{repo_id}/{path}")).await;

        if let Some(coords) = coords {
            let dir = artifact_directory(path);
            MetadataManager::remove_version(&repo.basedir.join(&dir), &coords.group_id, &coords.artifact_id, &coords.version)
                .await?;
        }

        tracing::info!(storage = %storage_id, repository = %repo_id, path, "artifact deleted");
        Ok(())
    }

    pub async fn copy(
        &self,
        src_storage: &StorageId,
        src_repo: &RepositoryId,
        path: &str,
        dst_storage: &StorageId,
        dst_repo: &RepositoryId,
    ) -> ArtifactResult<()> {
        let content = self.resolve(src_storage, src_repo, path).await?;
        self.store(dst_storage, dst_repo, path, content).await
    }

    pub async fn start_cache_sweeper(&self, interval: std::time::Duration) -> tokio::task::JoinHandle<()> {
        self.cache.spawn_sweeper(interval)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

/// The directory portion a `maven-metadata.xml` lives in for the given artifact path:
/// everything up to and including `artifactId`, i.e. one level above the version directory.
fn artifact_directory(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.len() < 2 {
        return String::new();
    }
    segments[..segments.len() - 2].join("/")
}

/// The directory a `maven-metadata.xml` path itself lives in: everything but the filename.
fn metadata_directory(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        return String::new();
    }
    segments[..segments.len() - 1].join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use repository::{DeploymentPolicy, Repository, Storage};
    use shared::{RepositoryId as Rid, StorageId as Sid};

    fn service(basedir: &std::path::Path) -> ArtifactService {
        let storage_id = Sid::new("s0").unwrap();
        let storage = Storage { id: storage_id.clone(), basedir: basedir.to_path_buf() };
        let releases = Repository {
            id: Rid::new("releases").unwrap(),
            storage_id: storage_id.clone(),
            repo_type: RepositoryType::Hosted,
            policy: DeploymentPolicy::Release,
            in_service: true,
            allows_redeployment: false,
            checksum_headers_enabled: true,
            basedir: basedir.join("releases"),
        };
        let registry = Arc::new(Registry::new(vec![storage], vec![releases]).unwrap());
        ArtifactService::new(registry, ChecksumCache::new(std::time::Duration::from_secs(60)))
    }

    #[tokio::test]
    async fn store_resolve_round_trip_updates_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path());
        let sid = Sid::new("s0").unwrap();
        let rid = Rid::new("releases").unwrap();
        svc.store(&sid, &rid, "org/foo/foo/1.0/foo-1.0.jar", Bytes::from_static(b"abc")).await.unwrap();

        let got = svc.resolve(&sid, &rid, "org/foo/foo/1.0/foo-1.0.jar").await.unwrap();
        assert_eq!(&got[..], b"abc");

        let md = MetadataManager::read_metadata(&dir.path().join("releases/org/foo/foo"), "org.foo", "foo")
            .await
            .unwrap();
        assert_eq!(md.versions, vec!["1.0".to_string()]);
    }

    #[tokio::test]
    async fn redeployment_is_rejected_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path());
        let sid = Sid::new("s0").unwrap();
        let rid = Rid::new("releases").unwrap();
        svc.store(&sid, &rid, "org/foo/foo/1.0/foo-1.0.jar", Bytes::from_static(b"abc")).await.unwrap();
        let err = svc
            .store(&sid, &rid, "org/foo/foo/1.0/foo-1.0.jar", Bytes::from_static(b"def"))
            .await
            .unwrap_err();
        assert!(matches!(err, ArtifactError::RedeploymentForbidden { .. }));
    }

    #[tokio::test]
    async fn delete_then_resolve_fails_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path());
        let sid = Sid::new("s0").unwrap();
        let rid = Rid::new("releases").unwrap();
        svc.store(&sid, &rid, "org/foo/foo/1.0/foo-1.0.jar", Bytes::from_static(b"abc")).await.unwrap();
        svc.delete(&sid, &rid, "org/foo/foo/1.0/foo-1.0.jar", false).await.unwrap();
        assert!(svc.resolve(&sid, &rid, "org/foo/foo/1.0/foo-1.0.jar").await.is_err());

        let md = MetadataManager::read_metadata(&dir.path().join("releases/org/foo/foo"), "org.foo", "foo")
            .await
            .unwrap();
        assert!(md.versions.is_empty());
    }

    #[tokio::test]
    async fn direct_metadata_put_is_routed_through_metadata_manager() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path());
        let sid = Sid::new("s0").unwrap();
        let rid = Rid::new("releases").unwrap();

        let body = b"<?xml version=\"1.0\"?><metadata><groupId>org.foo</groupId><artifactId>foo</artifactId>\
            <versioning><versions><version>1.0</version></versions><lastUpdated>stale</lastUpdated></versioning>\
            </metadata>";
        svc.store(&sid, &rid, "org/foo/foo/maven-metadata.xml", Bytes::from_static(body)).await.unwrap();

        let md = MetadataManager::read_metadata(&dir.path().join("releases/org/foo/foo"), "org.foo", "foo")
            .await
            .unwrap();
        assert_eq!(md.versions, vec!["1.0".to_string()]);
        assert_ne!(md.last_updated, "stale");

        // the sidecars the real body's digests match, not whatever the client happened to send
        let sidecar = tokio::fs::read_to_string(dir.path().join("releases/org/foo/foo/maven-metadata.xml.md5"))
            .await
            .unwrap();
        let on_disk = tokio::fs::read(dir.path().join("releases/org/foo/foo/maven-metadata.xml")).await.unwrap();
        assert_eq!(sidecar, crate::checksum::digest_bytes(&on_disk).md5.unwrap());
    }

    #[tokio::test]
    async fn copy_writes_into_destination_repo() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path());
        let sid = Sid::new("s0").unwrap();
        let rid = Rid::new("releases").unwrap();
        svc.store(&sid, &rid, "org/foo/foo/1.0/foo-1.0.jar", Bytes::from_static(b"abc")).await.unwrap();
        svc.copy(&sid, &rid, "org/foo/foo/1.0/foo-1.0.jar", &sid, &rid).await.unwrap_err();
        // copying onto the same (storage, repo, path) hits the redeployment rule; copying to a
        // distinct destination (covered in distribution's integration tests) succeeds.
    }
}
