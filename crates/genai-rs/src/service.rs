use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;
use crate::types::{ContentRequest, ContentResponse, Operation, VideoRequest};

/// Downloaded file body.
#[derive(Debug, Clone)]
pub struct Download {
    pub bytes: Bytes,
    pub content_type: Option<String>,
}

/// The generative backend as seen by callers: one-shot content generation,
/// and long-running video jobs that are submitted, polled and downloaded.
#[async_trait]
pub trait GenerativeService: Send + Sync {
    async fn generate_content(&self, req: ContentRequest) -> Result<ContentResponse>;

    async fn submit_video(&self, req: VideoRequest) -> Result<Operation>;

    async fn get_operation(&self, operation: &Operation) -> Result<Operation>;

    async fn download(&self, uri: &str) -> Result<Download>;
}
