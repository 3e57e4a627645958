//! HTTP client for the metadata generation service
//!
//! Posts the raw image bytes to a configured endpoint and treats the JSON
//! response body as the metadata value. One client instance is shared by
//! all workers; reqwest's blocking client is internally synchronized and
//! pools connections per host.

use crate::metadata::{Metadata, MetadataGenerator, ServiceError};
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Generation collaborator backed by an HTTP service
pub struct HttpGenerator {
    client: Client,
    endpoint: String,
}

impl HttpGenerator {
    /// Build a client for `endpoint` with a per-request timeout
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

impl MetadataGenerator for HttpGenerator {
    fn generate(&self, path: &Path) -> Result<Metadata, ServiceError> {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("image");

        debug!(
            path = %path.display(),
            bytes = bytes.len(),
            "requesting metadata"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("file", file_name)])
            .header(CONTENT_TYPE, content_type_for(path))
            .body(bytes)
            .send()?
            .error_for_status()?;

        let value: serde_json::Value = response.json()?;
        Ok(Metadata::new(value))
    }
}

/// MIME type for the upload body, from the file extension
fn content_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_mapping() {
        assert_eq!(content_type_for(Path::new("a.jpg")), "image/jpeg");
        assert_eq!(content_type_for(Path::new("a.JPEG")), "image/jpeg");
        assert_eq!(content_type_for(Path::new("a.png")), "image/png");
        assert_eq!(
            content_type_for(Path::new("a.webp")),
            "application/octet-stream"
        );
    }

    #[test]
    fn test_missing_file_surfaces_as_error() {
        let generator =
            HttpGenerator::new("http://localhost:1/never", Duration::from_secs(1)).unwrap();
        let err = generator
            .generate(Path::new("/no/such/image.jpg"))
            .unwrap_err();
        assert!(err.downcast_ref::<std::io::Error>().is_some());
    }
}
