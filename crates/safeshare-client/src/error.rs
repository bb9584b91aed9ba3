use reqwest::StatusCode;
use safeshare_crypto::CryptoError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("unauthorized: session token missing or expired")]
    Unauthorized,

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("file not found")]
    NotFound,

    #[error("file has expired")]
    Expired,

    #[error("file size exceeds limit")]
    PayloadTooLarge,

    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("invalid download handle: {0:?}")]
    InvalidHandle(String),

    #[error(
        "endpoint {0} uses plaintext HTTP, but server.enforce_tls is enabled. \
         Use an HTTPS endpoint or set server.enforce_tls = false for local development."
    )]
    InsecureEndpoint(String),

    #[error("unexpected response: {0}")]
    Decode(String),

    /// The metadata endpoint answered with a record that is not valid metadata.
    #[error(transparent)]
    Metadata(#[from] CryptoError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl TransportError {
    /// Map a non-success status and its body to a typed error.
    ///
    /// The backend reports failures as `{"error": "..."}` (or `{"detail": "..."}`
    /// for authentication failures); that message is kept when present.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = error_message(body);
        match status {
            StatusCode::UNAUTHORIZED => TransportError::Unauthorized,
            StatusCode::FORBIDDEN => TransportError::Forbidden(
                message.unwrap_or_else(|| "guest users cannot upload files".to_string()),
            ),
            StatusCode::NOT_FOUND => TransportError::NotFound,
            StatusCode::GONE => TransportError::Expired,
            StatusCode::PAYLOAD_TOO_LARGE => TransportError::PayloadTooLarge,
            _ => TransportError::Status {
                status: status.as_u16(),
                message: message.unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("unknown status")
                        .to_string()
                }),
            },
        }
    }
}

fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["error", "detail", "message"]
        .iter()
        .find_map(|field| value.get(field).and_then(|v| v.as_str()))
        .map(str::to_string)
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("file is {size} bytes, over the {limit}-byte upload limit")]
    TooLarge { size: u64, limit: u64 },

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("saving decrypted file: {0}")]
    Save(#[source] std::io::Error),
}
