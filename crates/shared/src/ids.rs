//! Storage and repository identifiers.
//!
//! Unlike the principal-scoped ids elsewhere in the ecosystem, storages and repositories are
//! named by short operator-chosen strings (`"storage0"`, `"releases"`) rather than UUIDs, so
//! these wrap `String` directly.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SharedError;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StorageId(String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RepositoryId(String);

macro_rules! string_id {
    ($ty:ident) => {
        impl $ty {
            pub fn new(value: impl Into<String>) -> Result<Self, SharedError> {
                let value = value.into();
                if value.is_empty() || value.contains('/') || value.contains("..") {
                    return Err(SharedError::InvalidId(value));
                }
                Ok(Self(value))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl FromStr for $ty {
            type Err = SharedError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $ty {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(StorageId);
string_id!(RepositoryId);
