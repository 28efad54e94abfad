//! Parses a repository-relative path into Maven-style coordinates and classifies it.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{ArtifactError, ArtifactResult};

lazy_static! {
    static ref SNAPSHOT_TIMESTAMP: Regex = Regex::new(r"^\d{8}\.\d{6}-\d+$").unwrap();
}

pub const METADATA_FILENAME: &str = "maven-metadata.xml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactCoordinates {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub classifier: Option<String>,
    pub extension: String,
}

impl ArtifactCoordinates {
    pub fn is_snapshot(&self) -> bool {
        self.version.ends_with("-SNAPSHOT") || SNAPSHOT_TIMESTAMP.is_match(&self.version)
    }
}

/// `path` is treated as checksum sidecar iff its final extension is `.md5` or `.sha1`.
pub fn is_checksum(path: &str) -> bool {
    path.ends_with(".md5") || path.ends_with(".sha1")
}

/// `path` is the directory-level Maven metadata index.
pub fn is_metadata(path: &str) -> bool {
    path.rsplit('/').next() == Some(METADATA_FILENAME)
        || path
            .rsplit('/')
            .next()
            .map(|f| f.starts_with(METADATA_FILENAME) && is_checksum(f))
            .unwrap_or(false)
}

/// Parses `g1/g2/.../artifactId/version/artifactId-version[-classifier].ext[.algo]`.
///
/// Fails with [`ArtifactError::InvalidCoordinates`] when the path has fewer than three segments
/// or the filename does not start with `artifactId-version`.
pub fn parse_coordinates(path: &str) -> ArtifactResult<ArtifactCoordinates> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.len() < 3 {
        return Err(ArtifactError::InvalidCoordinates {
            path: path.to_string(),
            reason: "path must have at least groupId/artifactId/version/filename".into(),
        });
    }

    let filename = *segments.last().unwrap();
    let version = segments[segments.len() - 2];
    let artifact_id = segments[segments.len() - 3];
    let group_id = segments[..segments.len() - 3].join(".");

    let (base_name, checksum_suffix) = strip_checksum_suffix(filename);
    let prefix = format!("{artifact_id}-{version}");
    if !base_name.starts_with(&prefix) {
        return Err(ArtifactError::InvalidCoordinates {
            path: path.to_string(),
            reason: format!("filename {base_name} does not start with {prefix}"),
        });
    }

    let remainder = &base_name[prefix.len()..];
    let (classifier, extension) = split_classifier_and_extension(remainder)?;
    let extension = match checksum_suffix {
        Some(algo) => format!("{extension}.{algo}"),
        None => extension,
    };

    Ok(ArtifactCoordinates {
        group_id,
        artifact_id: artifact_id.to_string(),
        version: version.to_string(),
        classifier,
        extension,
    })
}

fn strip_checksum_suffix(filename: &str) -> (&str, Option<&'static str>) {
    if let Some(stripped) = filename.strip_suffix(".md5") {
        (stripped, Some("md5"))
    } else if let Some(stripped) = filename.strip_suffix(".sha1") {
        (stripped, Some("sha1"))
    } else {
        (filename, None)
    }
}

fn split_classifier_and_extension(remainder: &str) -> ArtifactResult<(Option<String>, String)> {
    // remainder looks like "" , ".jar", "-sources.jar", "-sources.tar.gz"
    if remainder.is_empty() {
        return Err(ArtifactError::InvalidCoordinates {
            path: remainder.to_string(),
            reason: "missing extension".into(),
        });
    }
    let remainder = remainder
        .strip_prefix('-')
        .map(|r| ("classifier", r))
        .unwrap_or(("none", remainder.trim_start_matches('.')));

    match remainder {
        ("classifier", rest) => {
            let mut parts = rest.splitn(2, '.');
            let classifier = parts.next().unwrap_or_default().to_string();
            let ext = parts.next().unwrap_or_default().to_string();
            if ext.is_empty() {
                return Err(ArtifactError::InvalidCoordinates {
                    path: rest.to_string(),
                    reason: "missing extension after classifier".into(),
                });
            }
            Ok((Some(classifier), ext))
        }
        (_, rest) => Ok((None, rest.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_jar() {
        let c = parse_coordinates("org/foo/foo-core/1.0/foo-core-1.0.jar").unwrap();
        assert_eq!(c.group_id, "org.foo");
        assert_eq!(c.artifact_id, "foo-core");
        assert_eq!(c.version, "1.0");
        assert_eq!(c.classifier, None);
        assert_eq!(c.extension, "jar");
        assert!(!c.is_snapshot());
    }

    #[test]
    fn parses_classifier() {
        let c = parse_coordinates("org/foo/foo-core/1.0/foo-core-1.0-sources.jar").unwrap();
        assert_eq!(c.classifier, Some("sources".to_string()));
        assert_eq!(c.extension, "jar");
    }

    #[test]
    fn detects_snapshot_suffix() {
        let c = parse_coordinates("org/foo/foo/1.0-SNAPSHOT/foo-1.0-SNAPSHOT.jar").unwrap();
        assert!(c.is_snapshot());
    }

    #[test]
    fn detects_timestamped_snapshot() {
        let c = parse_coordinates("org/foo/foo/1.0-SNAPSHOT/foo-1.0-20240102.030405-1.jar").unwrap();
        assert!(c.is_snapshot());
    }

    #[test]
    fn rejects_short_path() {
        assert!(parse_coordinates("foo.jar").is_err());
    }

    #[test]
    fn classifies_checksum_and_metadata() {
        assert!(is_checksum("org/foo/foo/1.0/foo-1.0.jar.md5"));
        assert!(is_metadata("org/foo/foo/maven-metadata.xml"));
        assert!(!is_checksum("org/foo/foo/1.0/foo-1.0.jar"));
    }
}
