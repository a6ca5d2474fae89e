//! Blob store client.
//!
//! Photos are kept in an object-storage service and addressed by URL. Each
//! upload gets a globally unique key derived from a random token plus the
//! original file's extension, so nothing about the source filename has to be
//! unique or even well-formed.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use uuid::Uuid;

/// Port to the object-storage service.
///
/// The production implementation is [`BlobStore`]; tests substitute an
/// in-memory fake.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Uploads raw bytes and returns the URL of the stored object.
    async fn upload(&self, bytes: &[u8], original_filename: &str) -> Result<String, BlobError>;

    /// Downloads the object behind a URL previously returned by `upload`.
    async fn download(&self, url: &str) -> Result<Bytes, BlobError>;

    /// Ensures that the object behind the URL does not exist.
    ///
    /// Succeeds when the object is already gone.
    async fn ensure_deleted(&self, url: &str) -> Result<(), BlobError>;
}

/// HTTP client for an object-storage service laid out as
/// `{endpoint}/{container}/{key}`.
#[derive(Debug, Clone)]
pub struct BlobStore {
    endpoint: String,
    container: String,
    access_key: String,
    client: Client,
}

impl BlobStore {
    /// Creates a new `BlobStore` addressing one container.
    ///
    /// # Arguments
    /// * `endpoint` - Base URL of the storage account.
    /// * `container` - Container all photos are stored under.
    /// * `access_key` - Credential sent as bearer token.
    pub fn new(endpoint: &str, container: &str, access_key: &str) -> BlobStore {
        BlobStore {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            container: container.to_string(),
            access_key: access_key.to_string(),
            client: Client::new(),
        }
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.endpoint, self.container, key)
    }

    /// Generates a storage key from a random token and the filename's
    /// extension.
    ///
    /// The extension is whatever follows the last dot; a dot-free filename
    /// contributes itself wholesale. No check that the result names an image
    /// format.
    fn derive_key(original_filename: &str) -> String {
        match original_filename.rsplit('.').next() {
            Some(ext) if !ext.is_empty() => format!("{}.{}", Uuid::new_v4(), ext),
            _ => Uuid::new_v4().to_string(),
        }
    }
}

#[async_trait]
impl ObjectStore for BlobStore {
    async fn upload(&self, bytes: &[u8], original_filename: &str) -> Result<String, BlobError> {
        let url = self.object_url(&Self::derive_key(original_filename));

        let resp = self
            .client
            .put(&url)
            .bearer_auth(&self.access_key)
            .body(bytes.to_vec())
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(BlobError::Service {
                status: resp.status(),
                body: resp.text().await.unwrap_or_default(),
            });
        }

        Ok(url)
    }

    async fn download(&self, url: &str) -> Result<Bytes, BlobError> {
        let resp = self.client.get(url).send().await?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Err(BlobError::NotFound {
                url: url.to_string(),
            });
        }
        if !resp.status().is_success() {
            return Err(BlobError::Service {
                status: resp.status(),
                body: resp.text().await.unwrap_or_default(),
            });
        }

        Ok(resp.bytes().await?)
    }

    async fn ensure_deleted(&self, url: &str) -> Result<(), BlobError> {
        let resp = self
            .client
            .delete(url)
            .bearer_auth(&self.access_key)
            .send()
            .await?;

        // Already-gone objects satisfy the contract.
        if !resp.status().is_success() && resp.status() != StatusCode::NOT_FOUND {
            return Err(BlobError::Service {
                status: resp.status(),
                body: resp.text().await.unwrap_or_default(),
            });
        }

        Ok(())
    }
}

/// Errors that can occur while talking to the object-storage service.
#[derive(Debug, Error)]
pub enum BlobError {
    /// Transport-level failure reaching the service.
    #[error("storage transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("storage service returned {status}: {body}")]
    Service { status: StatusCode, body: String },

    /// The object behind the URL does not exist.
    #[error("object not found: {url}")]
    NotFound { url: String },
}
