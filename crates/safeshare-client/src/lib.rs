//! safeshare-client: backend transport and the encrypt/upload, download/decrypt pipeline

pub mod api;
pub mod error;
pub mod pipeline;
pub mod save;
pub mod transport;

pub use api::ApiClient;
pub use error::{PipelineError, TransportError};
pub use pipeline::{
    download_file, read_plaintext, upload_file, DownloadOutcome, MetadataSource, UploadOptions,
    UploadOutcome,
};
pub use save::save_decrypted;
pub use transport::{DownloadHandle, DownloadTransport, DownloadedBlob, UploadRequest, UploadTransport};
