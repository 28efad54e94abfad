//! Streaming digests (MD5, SHA-1) and sidecar file parsing.

use md5::Md5;
use sha2::Digest;
use sha1::Sha1;

use crate::error::{ArtifactError, ArtifactResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    Md5,
    Sha1,
}

impl Algorithm {
    pub fn sidecar_extension(self) -> &'static str {
        match self {
            Algorithm::Md5 => "md5",
            Algorithm::Sha1 => "sha1",
        }
    }

    pub const ALL: [Algorithm; 2] = [Algorithm::Md5, Algorithm::Sha1];
}

/// Hex digests for one artifact, keyed by algorithm.
#[derive(Debug, Clone, Default)]
pub struct DigestSet {
    pub md5: Option<String>,
    pub sha1: Option<String>,
}

impl DigestSet {
    pub fn get(&self, algo: Algorithm) -> Option<&str> {
        match algo {
            Algorithm::Md5 => self.md5.as_deref(),
            Algorithm::Sha1 => self.sha1.as_deref(),
        }
    }
}

/// A writer that accumulates bytes written to it while computing MD5 and SHA-1 in lockstep.
///
/// Mirrors a streaming digesting writer, but our Location Resolvers build whole artifacts in
/// memory before an atomic rename (see `resolver::fs`), so this wrapper works directly over a
/// byte buffer instead of an `AsyncWrite` — the checksum semantics are identical either way.
pub struct DigestingWriter {
    md5: Md5,
    sha1: Sha1,
    len: u64,
}

impl DigestingWriter {
    pub fn new() -> Self {
        Self {
            md5: Md5::new(),
            sha1: Sha1::new(),
            len: 0,
        }
    }

    pub fn write(&mut self, chunk: &[u8]) {
        self.md5.update(chunk);
        self.sha1.update(chunk);
        self.len += chunk.len() as u64;
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn finish(self) -> DigestSet {
        DigestSet {
            md5: Some(hex::encode(self.md5.finalize())),
            sha1: Some(hex::encode(self.sha1.finalize())),
        }
    }
}

impl Default for DigestingWriter {
    fn default() -> Self {
        Self::new()
    }
}

pub fn digest_bytes(data: &[u8]) -> DigestSet {
    let mut writer = DigestingWriter::new();
    writer.write(data);
    writer.finish()
}

/// Parses a sidecar file's contents: the first whitespace-separated token, lowercased.
///
/// Many tools emit `<hex>  filename` (like `md5sum` output); only the first token is the
/// digest.
pub fn parse_sidecar(path: &str, contents: &str) -> ArtifactResult<String> {
    let token = contents
        .split_whitespace()
        .next()
        .ok_or_else(|| ArtifactError::MetadataCorrupt {
            path: path.to_string(),
            reason: "empty checksum sidecar".into(),
        })?;
    Ok(token.to_lowercase())
}
