//! Vision tagging client.
//!
//! Images are sent to a remote computer-vision service which answers with
//! zero or more descriptive labels. The client reports results as-is; the
//! substitution of a sentinel for an empty answer is workflow policy and
//! lives in [`crate::app`].

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;

/// Language hint sent with every tagging request.
pub const TAG_LANGUAGE: &str = "ja";

/// One label proposed by the vision service.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TagLabel {
    pub name: String,
    pub confidence: f64,
}

/// Wire shape of the tagging endpoint's answer.
#[derive(Debug, Deserialize)]
struct TagImageResponse {
    tags: Vec<TagLabel>,
}

/// Port to the vision tagging service.
///
/// The production implementation is [`VisionClient`]; tests substitute
/// fakes with canned label lists.
#[async_trait]
pub trait Tagger: Send + Sync {
    /// Requests descriptive labels for the image bytes.
    ///
    /// An empty list is a valid answer. Partial results are not accepted:
    /// any service failure surfaces as an error.
    async fn tag(&self, bytes: &[u8], language: &str) -> Result<Vec<TagLabel>, VisionError>;
}

/// HTTP client for the vision service's image tagging endpoint.
#[derive(Debug, Clone)]
pub struct VisionClient {
    endpoint: String,
    key: String,
    client: Client,
}

impl VisionClient {
    /// Creates a new `VisionClient`.
    ///
    /// # Arguments
    /// * `endpoint` - Base URL of the vision service.
    /// * `key` - Subscription key for the service.
    pub fn new(endpoint: &str, key: &str) -> VisionClient {
        VisionClient {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            key: key.to_string(),
            client: Client::new(),
        }
    }

    fn tag_url(&self, language: &str) -> String {
        format!("{}/vision/v3.2/tag?language={}", self.endpoint, language)
    }
}

#[async_trait]
impl Tagger for VisionClient {
    async fn tag(&self, bytes: &[u8], language: &str) -> Result<Vec<TagLabel>, VisionError> {
        let resp = self
            .client
            .post(self.tag_url(language))
            .header("Ocp-Apim-Subscription-Key", &self.key)
            .header("Content-Type", "application/octet-stream")
            .body(bytes.to_vec())
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(VisionError::Service {
                status: resp.status(),
                body: resp.text().await.unwrap_or_default(),
            });
        }

        let parsed: TagImageResponse = resp.json().await?;

        Ok(parsed.tags)
    }
}

/// Errors that can occur while talking to the vision service.
#[derive(Debug, Error)]
pub enum VisionError {
    /// Transport-level failure reaching the service, or an undecodable answer.
    #[error("vision transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("vision service returned {status}: {body}")]
    Service { status: StatusCode, body: String },
}
