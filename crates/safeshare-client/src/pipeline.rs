//! Encrypt-then-upload and download-then-decrypt
//!
//! ```text
//! upload:   read -> size check -> encrypt (fresh key + IV) -> multipart POST
//! download: GET blob -> metadata (given or fetched) -> decrypt -> scoped save
//! ```
//!
//! Plaintext and keys never reach the transport: uploads carry only the
//! ciphertext and the `{iv, key}` metadata field the backend stores for the
//! recipient.

use std::path::{Path, PathBuf};

use safeshare_core::media_type::{guess_media_type, OCTET_STREAM};
use safeshare_core::types::{ExpiryDays, FileDescriptor, FileStatus};
use safeshare_crypto::{
    decrypt_file, encrypt_file, EncryptedBlob, EncryptionMetadata, PlaintextFile,
};
use tracing::{debug, info};

use crate::error::{PipelineError, TransportError};
use crate::save::save_decrypted;
use crate::transport::{DownloadHandle, DownloadTransport, UploadRequest, UploadTransport};

#[derive(Debug, Clone, Default)]
pub struct UploadOptions {
    pub status: FileStatus,
    pub expiry_days: Option<ExpiryDays>,
    /// Reject plaintext larger than this before encrypting; 0 disables the check.
    pub max_bytes: u64,
}

#[derive(Debug)]
pub struct UploadOutcome {
    pub descriptor: FileDescriptor,
    /// Full record including `originalName`, for handing to a recipient.
    pub metadata: EncryptionMetadata,
    pub plaintext_bytes: u64,
}

/// Where decryption metadata comes from on download.
#[derive(Debug)]
pub enum MetadataSource {
    /// Supplied out of band, e.g. from a metadata file.
    Provided(EncryptionMetadata),
    /// Ask the backend for the record stored at upload time.
    Fetch,
}

#[derive(Debug, Clone)]
pub struct DownloadOutcome {
    pub path: PathBuf,
    pub name: String,
    pub media_type: String,
    pub bytes: u64,
}

/// Read a local file into a [`PlaintextFile`], guessing its media type.
pub async fn read_plaintext(path: &Path) -> std::io::Result<PlaintextFile> {
    let bytes = tokio::fs::read(path).await?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| crate::save::FALLBACK_NAME.to_string());
    let media_type = guess_media_type(&name);
    Ok(PlaintextFile::new(name, media_type, bytes))
}

pub async fn upload_file<T: UploadTransport>(
    transport: &T,
    file: PlaintextFile,
    options: &UploadOptions,
) -> Result<UploadOutcome, PipelineError> {
    let size = file.bytes.len() as u64;
    if options.max_bytes > 0 && size > options.max_bytes {
        return Err(PipelineError::TooLarge {
            size,
            limit: options.max_bytes,
        });
    }

    let file_name = file.name.clone();
    let (blob, metadata) = encrypt_file(file).await?;
    let request = UploadRequest {
        file_name: file_name.clone(),
        blob,
        metadata_json: metadata.to_wire_json()?,
        status: options.status,
        expiry_days: options.expiry_days,
    };

    let descriptor = transport.upload(request).await?;
    info!(
        name = %file_name,
        id = descriptor.id,
        bytes = size,
        "uploaded encrypted file"
    );

    Ok(UploadOutcome {
        descriptor,
        metadata,
        plaintext_bytes: size,
    })
}

/// Fetch, decrypt, and save the file behind `handle` into `dest_dir`.
///
/// The saved name is the metadata's `originalName` when present, then
/// `name_hint`, then the server's `Content-Disposition` filename, then the
/// handle itself. Nothing is written unless decryption succeeds.
pub async fn download_file<T: DownloadTransport>(
    transport: &T,
    handle: &DownloadHandle,
    source: MetadataSource,
    name_hint: Option<&str>,
    dest_dir: &Path,
) -> Result<DownloadOutcome, PipelineError> {
    let downloaded = transport.fetch_blob(handle).await?;
    let metadata = match source {
        MetadataSource::Provided(metadata) => metadata,
        // a record the backend holds but we cannot parse is a crypto failure
        MetadataSource::Fetch => match transport.fetch_metadata(handle).await {
            Ok(metadata) => metadata,
            Err(TransportError::Metadata(e)) => return Err(PipelineError::Crypto(e)),
            Err(e) => return Err(e.into()),
        },
    };

    let target_name = metadata
        .original_name
        .clone()
        .or_else(|| name_hint.map(str::to_string))
        .or_else(|| downloaded.file_name.clone())
        .unwrap_or_else(|| handle.to_string());
    let media_type = downloaded
        .content_type
        .clone()
        .unwrap_or_else(|| OCTET_STREAM.to_string());
    debug!(%handle, name = %target_name, bytes = downloaded.bytes.len(), "decrypting download");

    let blob = EncryptedBlob::new(downloaded.bytes, media_type);
    let decrypted = decrypt_file(blob, metadata, target_name).await?;

    let dir = dest_dir.to_path_buf();
    let (path, decrypted) = tokio::task::spawn_blocking(move || {
        save_decrypted(&decrypted, &dir).map(|path| (path, decrypted))
    })
    .await
    .map_err(|e| PipelineError::Save(std::io::Error::other(e)))?
    .map_err(PipelineError::Save)?;

    info!(%handle, path = %path.display(), "saved decrypted file");
    Ok(DownloadOutcome {
        path,
        name: decrypted.name,
        media_type: decrypted.media_type,
        bytes: decrypted.bytes.len() as u64,
    })
}
