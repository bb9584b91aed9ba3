//! HTTP client for the file-sharing backend
//!
//! All endpoints hang off one base URL (default
//! `http://localhost:8000/api/files/`). Requests carry the session token as a
//! bearer header when one is configured. The encryption key never appears in
//! a header or URL: it only travels inside the `encryption_metadata` form field.

use std::time::Duration;

use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use safeshare_core::config::ServerConfig;
use safeshare_core::types::{FileDescriptor, ShareRequest, UserData};
use safeshare_crypto::EncryptionMetadata;

use crate::error::TransportError;
use crate::transport::{
    DownloadHandle, DownloadTransport, DownloadedBlob, UploadRequest, UploadTransport,
};

#[derive(Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    token: Option<SecretString>,
}

impl ApiClient {
    pub fn new(
        base_url: &str,
        token: Option<SecretString>,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        Self::with_base_url(parse_base_url(base_url)?, token, timeout)
    }

    fn with_base_url(
        base_url: Url,
        token: Option<SecretString>,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("safeshare/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url,
            token,
        })
    }

    /// Build a client from config.
    ///
    /// If `enforce_tls` is true and the endpoint uses HTTP, this returns an error.
    /// Otherwise, a warning is logged for non-HTTPS endpoints.
    pub fn from_config(
        server: &ServerConfig,
        token: Option<SecretString>,
    ) -> Result<Self, TransportError> {
        let base_url = parse_base_url(&server.base_url)?;
        // Url lowercases the scheme, so "HTTP://" lands here too
        if base_url.scheme() == "http" {
            if server.enforce_tls {
                return Err(TransportError::InsecureEndpoint(server.base_url.clone()));
            }
            warn!(
                endpoint = %server.base_url,
                "backend uses plaintext HTTP: session tokens and encryption metadata are \
                 transmitted unencrypted. Set server.enforce_tls = true and use HTTPS in production."
            );
        }
        Self::with_base_url(base_url, token, Duration::from_secs(server.timeout_secs))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, TransportError> {
        self.base_url
            .join(path)
            .map_err(|e| TransportError::InvalidUrl(format!("{path}: {e}")))
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, TransportError> {
        let response = self.authorized(builder).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        debug!(%status, "backend rejected request");
        Err(TransportError::from_status(status, &body))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, TransportError> {
        let url = self.endpoint(path)?;
        let response = self.send(self.http.get(url)).await?;
        decode_json(response).await
    }

    /// Files uploaded by the signed-in user.
    pub async fn list_uploaded(&self) -> Result<Vec<FileDescriptor>, TransportError> {
        self.get_json("uploaded-files/").await
    }

    /// Files other users shared with the signed-in user.
    pub async fn list_shared(&self) -> Result<Vec<FileDescriptor>, TransportError> {
        self.get_json("shared-files/").await
    }

    pub async fn user_data(&self) -> Result<UserData, TransportError> {
        self.get_json("user-data/").await
    }

    pub async fn delete_file(&self, id: u64) -> Result<(), TransportError> {
        let url = self.endpoint(&format!("delete/{id}/"))?;
        self.send(self.http.delete(url)).await?;
        Ok(())
    }

    /// Share a file with the given addresses.
    ///
    /// The backend marks the file public and issues a new download link; the
    /// returned descriptor carries it, and the previous link stops working.
    pub async fn share_file(
        &self,
        id: u64,
        emails: &[String],
    ) -> Result<FileDescriptor, TransportError> {
        let url = self.endpoint(&format!("share/{id}/"))?;
        let body = ShareRequest {
            emails: emails.to_vec(),
        };
        let response = self.send(self.http.post(url).json(&body)).await?;
        decode_json(response).await
    }
}

impl UploadTransport for ApiClient {
    async fn upload(&self, request: UploadRequest) -> Result<FileDescriptor, TransportError> {
        let url = self.endpoint("upload/")?;
        let size = request.blob.len();

        let part = Part::bytes(request.blob.ciphertext)
            .file_name(request.file_name)
            .mime_str(&request.blob.media_type)?;
        let mut form = Form::new()
            .part("file", part)
            .text("status", request.status.as_str())
            .text("encryption_metadata", request.metadata_json);
        if let Some(days) = request.expiry_days {
            form = form.text("expiry_days", days.get().to_string());
        }

        debug!(bytes = size, "uploading encrypted blob");
        let response = self.send(self.http.post(url).multipart(form)).await?;
        decode_json(response).await
    }
}

impl DownloadTransport for ApiClient {
    async fn fetch_blob(&self, handle: &DownloadHandle) -> Result<DownloadedBlob, TransportError> {
        let url = self.endpoint(&format!("download/{handle}/"))?;
        let response = self.send(self.http.get(url)).await?;

        let headers = response.headers();
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let file_name = headers
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(disposition_file_name);

        let bytes = response.bytes().await?.to_vec();
        debug!(bytes = bytes.len(), "downloaded encrypted blob");
        Ok(DownloadedBlob {
            bytes,
            content_type,
            file_name,
        })
    }

    async fn fetch_metadata(
        &self,
        handle: &DownloadHandle,
    ) -> Result<EncryptionMetadata, TransportError> {
        let url = self.endpoint(&format!("metadata/{handle}/"))?;
        let response = self.send(self.http.get(url)).await?;
        let body = response.bytes().await?;
        Ok(EncryptionMetadata::from_json_slice(&body)?)
    }
}

fn parse_base_url(raw: &str) -> Result<Url, TransportError> {
    let mut url =
        Url::parse(raw).map_err(|e| TransportError::InvalidUrl(format!("{raw}: {e}")))?;
    if url.cannot_be_a_base() {
        return Err(TransportError::InvalidUrl(url.to_string()));
    }
    // Url::join drops the last segment unless the path ends in '/'
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T, TransportError> {
    let body = response.bytes().await?;
    serde_json::from_slice(&body).map_err(|e| TransportError::Decode(e.to_string()))
}

/// Extract `filename` from an `attachment; filename="..."` header value.
pub fn disposition_file_name(value: &str) -> Option<String> {
    value.split(';').map(str::trim).find_map(|param| {
        let (key, raw) = param.split_once('=')?;
        if !key.trim().eq_ignore_ascii_case("filename") {
            return None;
        }
        let name = raw.trim().trim_matches('"');
        (!name.is_empty()).then(|| name.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server(base_url: &str, enforce_tls: bool) -> ServerConfig {
        ServerConfig {
            base_url: base_url.into(),
            enforce_tls,
            ..Default::default()
        }
    }

    #[test]
    fn test_from_config_http_allowed_without_enforce_tls() {
        let client = ApiClient::from_config(&server("http://localhost:8000/api/files/", false), None);
        assert!(client.is_ok());
    }

    #[test]
    fn test_from_config_http_enforce_tls() {
        let result = ApiClient::from_config(&server("http://insecure:8000/api/files/", true), None);
        let err = result.unwrap_err();
        assert!(matches!(err, TransportError::InsecureEndpoint(_)));
        assert!(
            err.to_string().contains("enforce_tls"),
            "error message should mention enforce_tls"
        );

        // scheme matching is case-insensitive
        for base_url in ["HTTP://insecure.example.com/api/files/", "Http://insecure/api/"] {
            let result = ApiClient::from_config(&server(base_url, true), None);
            assert!(
                matches!(result, Err(TransportError::InsecureEndpoint(_))),
                "{base_url} must be refused"
            );
        }
    }

    #[test]
    fn test_from_config_uppercase_https_enforce_tls() {
        let client =
            ApiClient::from_config(&server("HTTPS://files.example.com/api/files/", true), None)
                .unwrap();
        assert_eq!(client.base_url().scheme(), "https");
    }

    #[test]
    fn test_from_config_https_enforce_tls() {
        let result = ApiClient::from_config(&server("https://files.example.com/api/files/", true), None);
        assert!(result.is_ok());
    }

    #[test]
    fn test_invalid_base_url() {
        let result = ApiClient::from_config(&server("not a url", false), None);
        assert!(matches!(result, Err(TransportError::InvalidUrl(_))));
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let client = ApiClient::new(
            "http://localhost:8000/api/files",
            None,
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(
            client.endpoint("upload/").unwrap().as_str(),
            "http://localhost:8000/api/files/upload/"
        );
    }

    #[test]
    fn test_endpoint_paths() {
        let client = ApiClient::new(
            "https://files.example.com/api/files/",
            None,
            Duration::from_secs(5),
        )
        .unwrap();
        let handle = DownloadHandle::parse("abc-123").unwrap();
        assert_eq!(
            client.endpoint(&format!("download/{handle}/")).unwrap().as_str(),
            "https://files.example.com/api/files/download/abc-123/"
        );
    }

    #[test]
    fn test_debug_hides_token() {
        let client = ApiClient::new(
            "http://localhost:8000/api/files/",
            Some(SecretString::from("very-secret-token".to_string())),
            Duration::from_secs(5),
        )
        .unwrap();
        assert!(!format!("{client:?}").contains("very-secret-token"));
    }

    #[test]
    fn test_disposition_file_name() {
        assert_eq!(
            disposition_file_name(r#"attachment; filename="report.pdf""#).as_deref(),
            Some("report.pdf")
        );
        assert_eq!(
            disposition_file_name("attachment; FILENAME=plain.txt").as_deref(),
            Some("plain.txt")
        );
        assert_eq!(
            disposition_file_name(r#"attachment; filename="my notes.txt"; size=10"#).as_deref(),
            Some("my notes.txt")
        );
        assert_eq!(disposition_file_name("attachment"), None);
        assert_eq!(disposition_file_name(r#"attachment; filename="""#), None);
    }
}
