use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::config::ProviderConfig;
use crate::error::{GenAiError, Result};
use crate::http::RetryConfig;
use crate::providers::gemini;
use crate::service::{Download, GenerativeService};
use crate::types::{ContentRequest, ContentResponse, Operation, VideoRequest};

#[derive(Debug, Clone)]
pub struct GenAiClient {
    config: ProviderConfig,
    client: Client,
    poll_retry: RetryConfig,
}

impl GenAiClient {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        Ok(Self {
            config,
            client: Client::builder()
                .timeout(Duration::from_secs(120))
                .build()
                .map_err(GenAiError::from)?,
            poll_retry: RetryConfig::default(),
        })
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_poll_retry(mut self, retry: RetryConfig) -> Self {
        self.poll_retry = retry;
        self
    }
}

#[async_trait]
impl GenerativeService for GenAiClient {
    async fn generate_content(&self, req: ContentRequest) -> Result<ContentResponse> {
        tracing::info!(model = %req.model, parts = req.parts.len(), "generateContent");
        gemini::generate_content(&self.client, &self.config, &req).await
    }

    async fn submit_video(&self, req: VideoRequest) -> Result<Operation> {
        tracing::info!(model = %req.model, resolution = %req.resolution, "predictLongRunning");
        gemini::submit_video(&self.client, &self.config, &req).await
    }

    async fn get_operation(&self, operation: &Operation) -> Result<Operation> {
        tracing::debug!(operation = %operation.name, "polling operation");
        gemini::get_operation(&self.client, &self.config, &self.poll_retry, &operation.name).await
    }

    async fn download(&self, uri: &str) -> Result<Download> {
        let (bytes, content_type) = gemini::download(&self.client, &self.config, uri).await?;
        Ok(Download {
            bytes,
            content_type,
        })
    }
}
