//! Ordered chain of version validators applied before a write is admitted.

use repository::{DeploymentPolicy, Repository};

use crate::coordinates::ArtifactCoordinates;
use crate::error::{ArtifactError, ArtifactResult};

pub trait VersionValidator: Send + Sync {
    fn validate(&self, repo: &Repository, coords: &ArtifactCoordinates, path: &str, exists: bool) -> ArtifactResult<()>;
}

pub struct ReleaseVersionValidator;

impl VersionValidator for ReleaseVersionValidator {
    fn validate(&self, repo: &Repository, coords: &ArtifactCoordinates, path: &str, _exists: bool) -> ArtifactResult<()> {
        if repo.policy == DeploymentPolicy::Release && coords.is_snapshot() {
            return Err(ArtifactError::VersionPolicyViolation {
                path: path.to_string(),
                reason: "release policy rejects snapshot".into(),
            });
        }
        Ok(())
    }
}

pub struct SnapshotVersionValidator;

impl VersionValidator for SnapshotVersionValidator {
    fn validate(&self, repo: &Repository, coords: &ArtifactCoordinates, path: &str, _exists: bool) -> ArtifactResult<()> {
        if repo.policy == DeploymentPolicy::Snapshot && !coords.is_snapshot() {
            return Err(ArtifactError::VersionPolicyViolation {
                path: path.to_string(),
                reason: "snapshot policy rejects release".into(),
            });
        }
        Ok(())
    }
}

pub struct RedeploymentValidator;

impl VersionValidator for RedeploymentValidator {
    fn validate(&self, repo: &Repository, coords: &ArtifactCoordinates, path: &str, exists: bool) -> ArtifactResult<()> {
        if coords.is_snapshot() {
            return Ok(());
        }
        if !repo.allows_redeployment && exists {
            return Err(ArtifactError::RedeploymentForbidden { path: path.to_string() });
        }
        Ok(())
    }
}

/// Runs the standard validators in stable order, short-circuiting on the first failure.
pub struct ValidationPipeline {
    validators: Vec<Box<dyn VersionValidator>>,
}

impl ValidationPipeline {
    pub fn standard() -> Self {
        Self {
            validators: vec![
                Box::new(ReleaseVersionValidator),
                Box::new(SnapshotVersionValidator),
                Box::new(RedeploymentValidator),
            ],
        }
    }

    pub fn run(&self, repo: &Repository, coords: &ArtifactCoordinates, path: &str, exists: bool) -> ArtifactResult<()> {
        for validator in &self.validators {
            validator.validate(repo, coords, path, exists)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinates::parse_coordinates;
    use repository::RepositoryType;
    use shared::{RepositoryId, StorageId};

    fn repo(policy: DeploymentPolicy, allows_redeployment: bool) -> Repository {
        Repository {
            id: RepositoryId::new("r").unwrap(),
            storage_id: StorageId::new("s").unwrap(),
            repo_type: RepositoryType::Hosted,
            policy,
            in_service: true,
            allows_redeployment,
            checksum_headers_enabled: true,
            basedir: "/tmp/r".into(),
        }
    }

    #[test]
    fn release_policy_rejects_snapshot() {
        let r = repo(DeploymentPolicy::Release, true);
        let c = parse_coordinates("org/foo/foo/1.0-SNAPSHOT/foo-1.0-SNAPSHOT.jar").unwrap();
        let pipeline = ValidationPipeline::standard();
        let err = pipeline.run(&r, &c, "x", false).unwrap_err();
        assert!(matches!(err, ArtifactError::VersionPolicyViolation { .. }));
    }

    #[test]
    fn snapshot_policy_rejects_release() {
        let r = repo(DeploymentPolicy::Snapshot, true);
        let c = parse_coordinates("org/foo/foo/1.0/foo-1.0.jar").unwrap();
        let pipeline = ValidationPipeline::standard();
        assert!(pipeline.run(&r, &c, "x", false).is_err());
    }

    #[test]
    fn redeployment_forbidden_on_existing_release() {
        let r = repo(DeploymentPolicy::Release, false);
        let c = parse_coordinates("org/foo/foo/1.0/foo-1.0.jar").unwrap();
        let pipeline = ValidationPipeline::standard();
        assert!(pipeline.run(&r, &c, "x", false).is_ok());
        let err = pipeline.run(&r, &c, "x", true).unwrap_err();
        assert!(matches!(err, ArtifactError::RedeploymentForbidden { .. }));
    }

    #[test]
    fn snapshots_are_exempt_from_redeployment_rule() {
        let r = repo(DeploymentPolicy::Snapshot, false);
        let c = parse_coordinates("org/foo/foo/1.0-SNAPSHOT/foo-1.0-SNAPSHOT.jar").unwrap();
        let pipeline = ValidationPipeline::standard();
        assert!(pipeline.run(&r, &c, "x", true).is_ok());
    }

    #[test]
    fn mixed_policy_only_enforces_redeployment_rule() {
        let r = repo(DeploymentPolicy::Mixed, false);
        let release = parse_coordinates("org/foo/foo/1.0/foo-1.0.jar").unwrap();
        let snapshot = parse_coordinates("org/foo/foo/1.0-SNAPSHOT/foo-1.0-SNAPSHOT.jar").unwrap();
        let pipeline = ValidationPipeline::standard();
        assert!(pipeline.run(&r, &release, "x", false).is_ok());
        assert!(pipeline.run(&r, &snapshot, "x", true).is_ok());
        assert!(pipeline.run(&r, &release, "x", true).is_err());
    }
}
