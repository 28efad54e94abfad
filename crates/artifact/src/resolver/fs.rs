use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use shared::{RepositoryId, StorageId};
use tokio::io::AsyncWriteExt;

use repository::Registry;

use crate::checksum::{digest_bytes, Algorithm};
use crate::error::{ArtifactError, ArtifactResult};
use crate::resolver::LocationResolver;

/// Resolves artifacts directly on the local filesystem under each repository's `basedir`.
///
/// Writes go through a temp file in the same directory followed by an atomic rename, the same
/// pattern used by the teacher's `LocalFsArtifactStorage::upload`/`upload_from_path`.
pub struct FsResolver {
    registry: Arc<Registry>,
}

impl FsResolver {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    fn resolve_path(&self, storage_id: &StorageId, repo_id: &RepositoryId, path: &str) -> ArtifactResult<PathBuf> {
        let repo = self.registry.repository(storage_id, repo_id).map_err(|_| ArtifactError::ArtifactNotFound {
            path: path.to_string(),
        })?;
        if !repo.in_service {
            return Err(ArtifactError::RepositoryOutOfService { repo: repo_id.clone() });
        }
        if path.split('/').any(|segment| segment == "..") {
            return Err(ArtifactError::InvalidPath {
                path: path.to_string(),
                reason: "path escapes repository basedir".into(),
            });
        }
        Ok(repo.basedir.join(path))
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    path.with_extension(format!(
        "{}.tmp",
        path.extension().and_then(|e| e.to_str()).unwrap_or("part")
    ))
}

/// Writes `content` to a temp file next to `path` without making it visible at `path` yet.
/// Returns the temp file's path so the caller can decide the rename order.
async fn write_temp(path: &Path, content: &[u8]) -> ArtifactResult<PathBuf> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| ArtifactError::io(parent.display().to_string(), e))?;
    }
    let tmp_path = temp_path_for(path);
    let mut file = tokio::fs::File::create(&tmp_path)
        .await
        .map_err(|e| ArtifactError::io(tmp_path.display().to_string(), e))?;
    file.write_all(content)
        .await
        .map_err(|e| ArtifactError::io(tmp_path.display().to_string(), e))?;
    file.flush().await.map_err(|e| ArtifactError::io(tmp_path.display().to_string(), e))?;
    drop(file);
    Ok(tmp_path)
}

async fn rename_into_place(tmp_path: &Path, path: &Path) -> ArtifactResult<()> {
    tokio::fs::rename(tmp_path, path)
        .await
        .map_err(|e| ArtifactError::io(path.display().to_string(), e))?;
    Ok(())
}

#[async_trait]
impl LocationResolver for FsResolver {
    async fn resolve(&self, storage_id: &StorageId, repo_id: &RepositoryId, path: &str) -> ArtifactResult<Bytes> {
        let full = self.resolve_path(storage_id, repo_id, path)?;
        let bytes = tokio::fs::read(&full).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ArtifactError::ArtifactNotFound { path: path.to_string() }
            } else {
                ArtifactError::io(full.display().to_string(), e)
            }
        })?;
        Ok(Bytes::from(bytes))
    }

    /// Writes the artifact body and its `.md5`/`.sha1` sidecars as a single atomic unit: all
    /// three are written to temp files first, the sidecars are renamed into place, and only
    /// then is the artifact body itself renamed last. This ordering means a concurrent reader
    /// can never observe new artifact bytes sitting next to stale (or absent) sidecar digests —
    /// the instant the artifact becomes visible, its sidecars already agree with it.
    async fn store(&self, storage_id: &StorageId, repo_id: &RepositoryId, path: &str, content: Bytes) -> ArtifactResult<()> {
        let full = self.resolve_path(storage_id, repo_id, path)?;

        // Sidecars are skipped for checksum files themselves (a sidecar has no sidecar).
        let sidecars = if crate::coordinates::is_checksum(path) {
            Vec::new()
        } else {
            let digests = digest_bytes(&content);
            let mut sidecars = Vec::new();
            if let Some(md5) = digests.get(Algorithm::Md5) {
                let sidecar_path = self.resolve_path(storage_id, repo_id, &format!("{path}.md5"))?;
                let tmp = write_temp(&sidecar_path, md5.as_bytes()).await?;
                sidecars.push((tmp, sidecar_path));
            }
            if let Some(sha1) = digests.get(Algorithm::Sha1) {
                let sidecar_path = self.resolve_path(storage_id, repo_id, &format!("{path}.sha1"))?;
                let tmp = write_temp(&sidecar_path, sha1.as_bytes()).await?;
                sidecars.push((tmp, sidecar_path));
            }
            sidecars
        };

        let artifact_tmp = write_temp(&full, &content).await?;

        for (tmp, sidecar_path) in &sidecars {
            rename_into_place(tmp, sidecar_path).await?;
        }
        rename_into_place(&artifact_tmp, &full).await?;
        Ok(())
    }

    async fn delete(&self, storage_id: &StorageId, repo_id: &RepositoryId, path: &str, _force: bool) -> ArtifactResult<()> {
        // `force` has no effect here: the FS resolver has no trash/quarantine concept, so both
        // values perform an unconditional delete (see DESIGN.md open question).
        let full = self.resolve_path(storage_id, repo_id, path)?;
        match tokio::fs::remove_file(&full).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ArtifactError::ArtifactNotFound { path: path.to_string() });
            }
            Err(e) => return Err(ArtifactError::io(full.display().to_string(), e)),
        }
        for ext in [".md5", ".sha1"] {
            if let Ok(sidecar) = self.resolve_path(storage_id, repo_id, &format!("{path}{ext}")) {
                let _ = tokio::fs::remove_file(&sidecar).await;
            }
        }
        Ok(())
    }

    async fn contains(&self, storage_id: &StorageId, repo_id: &RepositoryId, path: &str) -> ArtifactResult<bool> {
        let full = self.resolve_path(storage_id, repo_id, path)?;
        Ok(tokio::fs::try_exists(&full).await.unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use repository::{DeploymentPolicy, Repository, RepositoryType, Storage};
    use shared::{RepositoryId as Rid, StorageId as Sid};

    fn registry(basedir: &Path) -> Arc<Registry> {
        let storage_id = Sid::new("s0").unwrap();
        let repo_id = Rid::new("releases").unwrap();
        let storage = Storage { id: storage_id.clone(), basedir: basedir.to_path_buf() };
        let repo = Repository {
            id: repo_id,
            storage_id,
            repo_type: RepositoryType::Hosted,
            policy: DeploymentPolicy::Release,
            in_service: true,
            allows_redeployment: true,
            checksum_headers_enabled: true,
            basedir: basedir.to_path_buf(),
        };
        Arc::new(Registry::new(vec![storage], vec![repo]).unwrap())
    }

    #[tokio::test]
    async fn store_then_resolve_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let reg = registry(dir.path());
        let resolver = FsResolver::new(reg);
        let sid = Sid::new("s0").unwrap();
        let rid = Rid::new("releases").unwrap();
        resolver.store(&sid, &rid, "org/foo/foo/1.0/foo-1.0.jar", Bytes::from_static(b"abc")).await.unwrap();
        let got = resolver.resolve(&sid, &rid, "org/foo/foo/1.0/foo-1.0.jar").await.unwrap();
        assert_eq!(&got[..], b"abc");
        let md5 = resolver.resolve(&sid, &rid, "org/foo/foo/1.0/foo-1.0.jar.md5").await.unwrap();
        assert_eq!(&md5[..], b"900150983cd24fb0d6963f7d28e17f72");
    }

    #[tokio::test]
    async fn delete_removes_artifact_and_sidecars() {
        let dir = tempfile::tempdir().unwrap();
        let reg = registry(dir.path());
        let resolver = FsResolver::new(reg);
        let sid = Sid::new("s0").unwrap();
        let rid = Rid::new("releases").unwrap();
        resolver.store(&sid, &rid, "org/foo/foo/1.0/foo-1.0.jar", Bytes::from_static(b"abc")).await.unwrap();
        resolver.delete(&sid, &rid, "org/foo/foo/1.0/foo-1.0.jar", false).await.unwrap();
        assert!(resolver.resolve(&sid, &rid, "org/foo/foo/1.0/foo-1.0.jar").await.is_err());
        assert!(resolver.resolve(&sid, &rid, "org/foo/foo/1.0/foo-1.0.jar.md5").await.is_err());
    }

    #[tokio::test]
    async fn rejects_path_escaping_basedir() {
        let dir = tempfile::tempdir().unwrap();
        let reg = registry(dir.path());
        let resolver = FsResolver::new(reg);
        let sid = Sid::new("s0").unwrap();
        let rid = Rid::new("releases").unwrap();
        let err = resolver
            .store(&sid, &rid, "../../etc/passwd", Bytes::from_static(b"x"))
            .await
            .unwrap_err();
        assert!(matches!(err, ArtifactError::InvalidPath { .. }));
    }
}
