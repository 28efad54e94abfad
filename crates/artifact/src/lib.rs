//! Core artifact access and integrity subsystem: coordinate parsing, checksums, the checksum
//! cache, directory metadata, validation, Location Resolvers, the façade service, and HTTP
//! byte-range accounting.

pub mod cache;
pub mod checksum;
pub mod coordinates;
pub mod error;
pub mod metadata;
pub mod range;
pub mod resolver;
pub mod service;
pub mod validation;

pub use cache::ChecksumCache;
pub use error::{ArtifactError, ArtifactResult};
pub use service::{ArtifactDigests, ArtifactService};
