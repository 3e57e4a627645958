//! Default collaborator implementations
//!
//! The engine only sees the `MetadataGenerator` / `MetadataWriter` traits;
//! these are the implementations the CLI wires in:
//!
//! - [`HttpGenerator`] - posts image bytes to a generation service and
//!   takes the JSON response as the opaque metadata value
//! - [`SidecarWriter`] - persists the metadata as a JSON sidecar next to
//!   the image
//!
//! Both are plain stateless values; one instance is shared across all
//! worker threads.

mod http;
mod sidecar;

pub use http::HttpGenerator;
pub use sidecar::SidecarWriter;
