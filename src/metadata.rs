//! Collaborator seams for metadata generation and persistence
//!
//! The batch engine does not know how metadata is produced or how it is
//! stored. Both concerns sit behind the two traits in this module, and the
//! engine only moves an opaque [`Metadata`] value from one to the other.
//! Implementations must be callable from multiple worker threads
//! concurrently (with different paths).

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Error type for collaborator implementations
///
/// Kept open so external services can surface whatever error they carry;
/// the task unit reduces it to a recorded failure reason either way.
pub type ServiceError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Opaque structured metadata for one image
///
/// Produced by a [`MetadataGenerator`], consumed by a [`MetadataWriter`].
/// The engine never interprets its fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(serde_json::Value);

impl Metadata {
    /// Wrap a JSON value as opaque metadata
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    /// Borrow the underlying value
    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }

    /// Unwrap into the underlying value
    pub fn into_value(self) -> serde_json::Value {
        self.0
    }
}

impl From<serde_json::Value> for Metadata {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

/// Produces metadata for an image file
///
/// May block (network calls). Must be safe to call concurrently from
/// multiple worker threads with different paths.
pub trait MetadataGenerator: Send + Sync {
    /// Generate metadata for the image at `path`
    fn generate(&self, path: &Path) -> Result<Metadata, ServiceError>;
}

/// Persists metadata for an image file
///
/// May block (file I/O). Same concurrency requirement as
/// [`MetadataGenerator`].
pub trait MetadataWriter: Send + Sync {
    /// Persist `metadata` for the image at `path`
    fn write(&self, path: &Path, metadata: &Metadata) -> Result<(), ServiceError>;
}

#[cfg(test)]
pub(crate) mod tests_support {
    use super::*;
    use serde_json::json;

    /// Generator stub that always succeeds with an empty object
    pub struct StubGenerator;

    impl MetadataGenerator for StubGenerator {
        fn generate(&self, _path: &Path) -> Result<Metadata, ServiceError> {
            Ok(Metadata::new(json!({})))
        }
    }

    /// Writer stub that always succeeds without touching the filesystem
    pub struct StubWriter;

    impl MetadataWriter for StubWriter {
        fn write(&self, _path: &Path, _metadata: &Metadata) -> Result<(), ServiceError> {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_metadata_roundtrip() {
        let meta = Metadata::new(json!({"title": "sunset", "keywords": ["beach"]}));
        assert_eq!(meta.as_value()["title"], "sunset");

        let serialized = serde_json::to_string(&meta).unwrap();
        let parsed: Metadata = serde_json::from_str(&serialized).unwrap();
        assert_eq!(parsed, meta);
    }
}
