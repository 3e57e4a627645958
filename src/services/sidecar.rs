//! Sidecar persistence for generated metadata
//!
//! Writes the opaque metadata value as pretty-printed JSON next to the
//! image: `photo.jpg` gets `photo.jpg.meta.json`. Writers that embed
//! metadata into the image container itself implement `MetadataWriter`
//! the same way; the engine does not care which is wired in.

use crate::metadata::{Metadata, MetadataWriter, ServiceError};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Suffix appended to the image file name
const SIDECAR_SUFFIX: &str = ".meta.json";

/// Writing collaborator that persists metadata as a JSON sidecar
#[derive(Debug, Default)]
pub struct SidecarWriter;

impl SidecarWriter {
    /// Create a sidecar writer
    pub fn new() -> Self {
        Self
    }

    /// Where the sidecar for `image` lives
    pub fn sidecar_path(image: &Path) -> PathBuf {
        let mut name: OsString = image.as_os_str().to_owned();
        name.push(SIDECAR_SUFFIX);
        PathBuf::from(name)
    }
}

impl MetadataWriter for SidecarWriter {
    fn write(&self, path: &Path, metadata: &Metadata) -> Result<(), ServiceError> {
        let sidecar = Self::sidecar_path(path);
        let json = serde_json::to_vec_pretty(metadata.as_value())?;
        std::fs::write(&sidecar, json)?;

        debug!(sidecar = %sidecar.display(), "metadata persisted");
        Ok(())
    }
}
