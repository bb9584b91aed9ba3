//! Transport seams between the crypto pipeline and the backend
//!
//! The pipeline only needs two capabilities: send an encrypted blob with its
//! metadata, and fetch a blob (plus, optionally, its metadata) by handle.
//! [`crate::ApiClient`] implements both over HTTP; tests use in-memory fakes.

use std::fmt;
use std::future::Future;

use safeshare_core::types::{ExpiryDays, FileDescriptor, FileStatus};
use safeshare_crypto::{EncryptedBlob, EncryptionMetadata};

use crate::error::TransportError;

/// Everything one upload sends.
#[derive(Debug)]
pub struct UploadRequest {
    /// Name the backend stores the file under.
    pub file_name: String,
    pub blob: EncryptedBlob,
    /// `{"iv": [...], "key": "..."}`, sent once as its own field.
    pub metadata_json: String,
    pub status: FileStatus,
    pub expiry_days: Option<ExpiryDays>,
}

#[derive(Debug, Clone)]
pub struct DownloadedBlob {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
    /// Filename from `Content-Disposition`, if the server sent one.
    pub file_name: Option<String>,
}

/// Opaque download link issued by the backend.
///
/// Restricted to `[A-Za-z0-9_-]` so it can be spliced into a URL path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DownloadHandle(String);

impl DownloadHandle {
    pub fn parse(raw: &str) -> Result<Self, TransportError> {
        let trimmed = raw.trim();
        let valid = !trimmed.is_empty()
            && trimmed
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(TransportError::InvalidHandle(raw.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DownloadHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub trait UploadTransport {
    fn upload(
        &self,
        request: UploadRequest,
    ) -> impl Future<Output = Result<FileDescriptor, TransportError>> + Send;
}

pub trait DownloadTransport {
    fn fetch_blob(
        &self,
        handle: &DownloadHandle,
    ) -> impl Future<Output = Result<DownloadedBlob, TransportError>> + Send;

    /// Fetch the `{iv, key}` record the uploader attached to this handle.
    fn fetch_metadata(
        &self,
        handle: &DownloadHandle,
    ) -> impl Future<Output = Result<EncryptionMetadata, TransportError>> + Send;
}
