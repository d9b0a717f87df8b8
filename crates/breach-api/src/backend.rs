//! HTTP client for the analysis backend.
use async_trait::async_trait;
use breach_core::{BackendClient, BreachError, ExtractResult, ImageUpload, SolveResult};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

pub const EXTRACT_PATH: &str = "/extract";
pub const SOLVE_PATH: &str = "/breach";

/// Longest slice of an error body kept in a transport error
const ERROR_BODY_LIMIT: usize = 200;

/// Talks to the backend's `/extract` and `/breach` endpoints.
///
/// Calls carry no timeout and are never retried.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn parse<T: DeserializeOwned>(endpoint: &str, response: Response) -> Result<T, BreachError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body: String = body.trim().chars().take(ERROR_BODY_LIMIT).collect();
            return Err(BreachError::transport(
                endpoint,
                format!("HTTP {}: {}", status.as_u16(), body),
            ));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| BreachError::transport(endpoint, e))?;
        serde_json::from_slice(&body).map_err(|e| BreachError::decode(endpoint, e))
    }
}

#[async_trait]
impl BackendClient for HttpBackend {
    async fn extract(&self, image: &ImageUpload) -> Result<ExtractResult, BreachError> {
        debug!(file_name = %image.file_name, bytes = image.bytes.len(), "POST {}", EXTRACT_PATH);
        let part = Part::bytes(image.bytes.clone()).file_name(image.file_name.clone());
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(self.url(EXTRACT_PATH))
            .multipart(form)
            .send()
            .await
            .map_err(|e| BreachError::transport(EXTRACT_PATH, e))?;

        Self::parse(EXTRACT_PATH, response).await
    }

    async fn solve(&self, extract: &ExtractResult) -> Result<SolveResult, BreachError> {
        debug!(buffer_size = extract.buffer_size, "POST {}", SOLVE_PATH);
        let response = self
            .client
            .post(self.url(SOLVE_PATH))
            .json(extract)
            .send()
            .await
            .map_err(|e| BreachError::transport(SOLVE_PATH, e))?;

        Self::parse(SOLVE_PATH, response).await
    }
}
