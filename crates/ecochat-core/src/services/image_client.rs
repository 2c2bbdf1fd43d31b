use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::Serialize;
use tracing::debug;

use super::completion_client::CollaboratorError;
use crate::settings::AssistantSettings;

/// Raw bytes returned by the image collaborator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedImage {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

#[async_trait]
pub trait ImageClient: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<GeneratedImage, CollaboratorError>;
}

#[derive(Serialize)]
struct ImageRequest<'a> {
    prompt: &'a str,
}

/// Text-to-image workflow endpoint returning a JPEG body.
pub struct FireworksImageClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl FireworksImageClient {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key,
        }
    }

    pub fn from_settings(settings: &AssistantSettings) -> Self {
        Self::new(settings.image_url.clone(), settings.api_key.clone())
    }
}

#[async_trait]
impl ImageClient for FireworksImageClient {
    async fn generate(&self, prompt: &str) -> Result<GeneratedImage, CollaboratorError> {
        let mut request = self
            .http
            .post(&self.endpoint)
            .header(ACCEPT, "image/jpeg")
            .json(&ImageRequest { prompt });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        debug!(prompt_len = prompt.len(), "Sending image request");
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CollaboratorError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await?;

        if bytes.is_empty() {
            return Err(CollaboratorError::MalformedResponse("empty image body".into()));
        }

        Ok(GeneratedImage {
            bytes: bytes.to_vec(),
            content_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'];

    #[tokio::test]
    async fn test_returns_body_bytes_and_content_type() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/text_to_image"))
            .and(header("accept", "image/jpeg"))
            .and(header("authorization", "Bearer fw-key"))
            .and(body_json(serde_json::json!({"prompt": "a recycling bin"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "image/jpeg")
                    .set_body_bytes(JPEG),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = FireworksImageClient::new(
            format!("{}/text_to_image", server.uri()),
            Some("fw-key".into()),
        );
        let image = client.generate("a recycling bin").await.unwrap();

        assert_eq!(image.bytes, JPEG);
        assert_eq!(image.content_type.as_deref(), Some("image/jpeg"));
    }

    #[tokio::test]
    async fn test_empty_body_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = FireworksImageClient::new(server.uri(), None);
        let err = client.generate("x").await.unwrap_err();
        assert!(matches!(err, CollaboratorError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_server_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
            .mount(&server)
            .await;

        let client = FireworksImageClient::new(server.uri(), Some("k".into()));
        let err = client.generate("x").await.unwrap_err();
        assert!(matches!(err, CollaboratorError::Status { status: 503, .. }));
    }
}
