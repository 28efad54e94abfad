//! Reads and writes the per-directory `maven-metadata.xml` version index.

use std::path::Path;

use serde::{Deserialize, Serialize};
use shared::IsoTimestamp;
use tokio::io::AsyncWriteExt;

use crate::checksum::digest_bytes;
use crate::coordinates::METADATA_FILENAME;
use crate::error::{ArtifactError, ArtifactResult};

/// Granularity at which `maven-metadata.xml` is (re)written. `VersionLevel` and
/// `PluginGroupLevel` are accepted for parity with the wire format described in the on-disk
/// layout, but this core only ever writes at `ArtifactRootLevel`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataLevel {
    ArtifactRootLevel,
    VersionLevel,
    PluginGroupLevel,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename = "metadata")]
struct MetadataXml {
    #[serde(rename = "groupId")]
    group_id: String,
    #[serde(rename = "artifactId")]
    artifact_id: String,
    versioning: VersioningXml,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct VersioningXml {
    latest: Option<String>,
    release: Option<String>,
    versions: VersionsXml,
    #[serde(rename = "lastUpdated")]
    last_updated: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct VersionsXml {
    #[serde(rename = "version", default)]
    version: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct DirectoryMetadata {
    pub group_id: String,
    pub artifact_id: String,
    pub versions: Vec<String>,
    pub latest: Option<String>,
    pub release: Option<String>,
    pub last_updated: String,
}

impl From<MetadataXml> for DirectoryMetadata {
    fn from(xml: MetadataXml) -> Self {
        Self {
            group_id: xml.group_id,
            artifact_id: xml.artifact_id,
            versions: xml.versioning.versions.version,
            latest: xml.versioning.latest,
            release: xml.versioning.release,
            last_updated: xml.versioning.last_updated,
        }
    }
}

impl From<DirectoryMetadata> for MetadataXml {
    fn from(m: DirectoryMetadata) -> Self {
        MetadataXml {
            group_id: m.group_id,
            artifact_id: m.artifact_id,
            versioning: VersioningXml {
                latest: m.latest,
                release: m.release,
                versions: VersionsXml { version: m.versions },
                last_updated: m.last_updated,
            },
        }
    }
}

pub struct MetadataManager;

impl MetadataManager {
    fn metadata_path(dir: &Path) -> std::path::PathBuf {
        dir.join(METADATA_FILENAME)
    }

    /// Returns an empty [`DirectoryMetadata`] (not an error) when no metadata file exists yet.
    pub async fn read_metadata(dir: &Path, group_id: &str, artifact_id: &str) -> ArtifactResult<DirectoryMetadata> {
        let path = Self::metadata_path(dir);
        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(DirectoryMetadata {
                    group_id: group_id.to_string(),
                    artifact_id: artifact_id.to_string(),
                    ..Default::default()
                });
            }
            Err(e) => return Err(ArtifactError::io(path.display().to_string(), e)),
        };

        let xml: MetadataXml = quick_xml::de::from_str(&contents).map_err(|e| ArtifactError::MetadataCorrupt {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(xml.into())
    }

    /// Parses a client-supplied `maven-metadata.xml` payload (a direct `PUT`) into a
    /// [`DirectoryMetadata`], so it can be routed through [`Self::store_metadata`] instead of
    /// written to disk verbatim.
    pub fn parse_metadata(body: &[u8]) -> ArtifactResult<DirectoryMetadata> {
        let text = std::str::from_utf8(body).map_err(|e| ArtifactError::MetadataCorrupt {
            path: METADATA_FILENAME.to_string(),
            reason: e.to_string(),
        })?;
        let xml: MetadataXml = quick_xml::de::from_str(text).map_err(|e| ArtifactError::MetadataCorrupt {
            path: METADATA_FILENAME.to_string(),
            reason: e.to_string(),
        })?;
        Ok(xml.into())
    }

    /// Writes `maven-metadata.xml` and regenerates its `.md5`/`.sha1` sidecars atomically: all
    /// three are written to temp files first, the sidecars are renamed into place, and only
    /// then is `maven-metadata.xml` itself renamed last, so a reader never observes the body
    /// next to stale (or absent) sidecar digests.
    pub async fn store_metadata(dir: &Path, mut metadata: DirectoryMetadata, _level: MetadataLevel) -> ArtifactResult<()> {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| ArtifactError::io(dir.display().to_string(), e))?;

        metadata.last_updated = IsoTimestamp::now().to_maven_format();
        let xml: MetadataXml = metadata.into();
        let body = quick_xml::se::to_string(&xml).map_err(|e| ArtifactError::MetadataCorrupt {
            path: dir.display().to_string(),
            reason: e.to_string(),
        })?;
        let body = format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{body}\n");

        let final_path = Self::metadata_path(dir);
        let digests = digest_bytes(body.as_bytes());

        let mut sidecars = Vec::new();
        if let Some(md5) = &digests.md5 {
            let sidecar_path = final_path.with_extension("xml.md5");
            let tmp = write_temp(&sidecar_path, md5.as_bytes()).await?;
            sidecars.push((tmp, sidecar_path));
        }
        if let Some(sha1) = &digests.sha1 {
            let sidecar_path = final_path.with_extension("xml.sha1");
            let tmp = write_temp(&sidecar_path, sha1.as_bytes()).await?;
            sidecars.push((tmp, sidecar_path));
        }

        let body_tmp = write_temp(&final_path, body.as_bytes()).await?;

        for (tmp, sidecar_path) in &sidecars {
            rename_into_place(tmp, sidecar_path).await?;
        }
        rename_into_place(&body_tmp, &final_path).await?;
        Ok(())
    }

    /// Adds `version` to the directory's index, creating it if absent. No-op if already
    /// present (invariant: versions are unique).
    pub async fn add_version(dir: &Path, group_id: &str, artifact_id: &str, version: &str) -> ArtifactResult<()> {
        let mut metadata = Self::read_metadata(dir, group_id, artifact_id).await?;
        if !metadata.versions.iter().any(|v| v == version) {
            metadata.versions.push(version.to_string());
        }
        metadata.latest = Some(version.to_string());
        Self::store_metadata(dir, metadata, MetadataLevel::ArtifactRootLevel).await
    }

    /// Removes `version` from the directory's index and rewrites at `ArtifactRootLevel`.
    ///
    /// `version` mirrors the source's quirky signature: it is accepted but the rewrite always
    /// happens at `ArtifactRootLevel` regardless of its value, which is retained here as an
    /// open correctness question rather than "fixed" (see DESIGN.md).
    pub async fn remove_version(dir: &Path, group_id: &str, artifact_id: &str, version: &str) -> ArtifactResult<()> {
        let mut metadata = Self::read_metadata(dir, group_id, artifact_id).await?;
        metadata.versions.retain(|v| v != version);
        if metadata.latest.as_deref() == Some(version) {
            metadata.latest = metadata.versions.last().cloned();
        }
        Self::store_metadata(dir, metadata, MetadataLevel::ArtifactRootLevel).await
    }
}

/// Writes `contents` to a temp file next to `path` without making it visible at `path` yet.
/// Returns the temp file's path so the caller can decide the rename order.
async fn write_temp(path: &Path, contents: &[u8]) -> ArtifactResult<std::path::PathBuf> {
    let tmp_path = path.with_extension(format!(
        "{}.tmp",
        path.extension().and_then(|e| e.to_str()).unwrap_or("xml")
    ));
    let mut file = tokio::fs::File::create(&tmp_path)
        .await
        .map_err(|e| ArtifactError::io(tmp_path.display().to_string(), e))?;
    file.write_all(contents)
        .await
        .map_err(|e| ArtifactError::io(tmp_path.display().to_string(), e))?;
    file.flush()
        .await
        .map_err(|e| ArtifactError::io(tmp_path.display().to_string(), e))?;
    drop(file);
    Ok(tmp_path)
}

async fn rename_into_place(tmp_path: &Path, path: &Path) -> ArtifactResult<()> {
    tokio::fs::rename(tmp_path, path)
        .await
        .map_err(|e| ArtifactError::io(path.display().to_string(), e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trips_versions() {
        let dir = tempfile::tempdir().unwrap();
        MetadataManager::add_version(dir.path(), "org.foo", "foo", "1.0").await.unwrap();
        MetadataManager::add_version(dir.path(), "org.foo", "foo", "1.1").await.unwrap();

        let md = MetadataManager::read_metadata(dir.path(), "org.foo", "foo").await.unwrap();
        assert_eq!(md.versions, vec!["1.0".to_string(), "1.1".to_string()]);
        assert_eq!(md.latest.as_deref(), Some("1.1"));

        let sidecar = tokio::fs::read_to_string(dir.path().join("maven-metadata.xml.md5")).await.unwrap();
        let artifact_bytes = tokio::fs::read(dir.path().join("maven-metadata.xml")).await.unwrap();
        assert_eq!(sidecar, digest_bytes(&artifact_bytes).md5.unwrap());
    }

    #[tokio::test]
    async fn adding_same_version_twice_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        MetadataManager::add_version(dir.path(), "org.foo", "foo", "1.0").await.unwrap();
        MetadataManager::add_version(dir.path(), "org.foo", "foo", "1.0").await.unwrap();
        let md = MetadataManager::read_metadata(dir.path(), "org.foo", "foo").await.unwrap();
        assert_eq!(md.versions, vec!["1.0".to_string()]);
    }

    #[tokio::test]
    async fn removing_last_version_clears_it() {
        let dir = tempfile::tempdir().unwrap();
        MetadataManager::add_version(dir.path(), "org.foo", "foo", "1.0").await.unwrap();
        MetadataManager::remove_version(dir.path(), "org.foo", "foo", "1.0").await.unwrap();
        let md = MetadataManager::read_metadata(dir.path(), "org.foo", "foo").await.unwrap();
        assert!(md.versions.is_empty());
    }

    #[tokio::test]
    async fn reading_absent_metadata_returns_empty() {
        let dir = tempfile::tempdir().unwrap();
        let md = MetadataManager::read_metadata(dir.path(), "org.foo", "foo").await.unwrap();
        assert!(md.versions.is_empty());
    }
}
