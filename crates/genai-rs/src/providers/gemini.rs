//! Gemini REST calls: `generateContent` for images, `predictLongRunning`
//! plus operation polling for Veo, and authenticated file download.

use bytes::Bytes;
use reqwest::Client;
use serde_json::Value;

use crate::config::ProviderConfig;
use crate::error::{GenAiError, Result};
use crate::http::{send_bytes, send_json, send_json_with_retry, RetryConfig};
use crate::providers::resolve_api_key;
use crate::types::{ContentRequest, ContentResponse, Operation, VideoRequest};

const API_KEY_HEADER: &str = "x-goog-api-key";

fn endpoint(cfg: &ProviderConfig, path: &str) -> Result<String> {
    let base = cfg
        .base_url
        .as_deref()
        .ok_or_else(|| GenAiError::Config("base_url required".into()))?;
    Ok(format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    ))
}

fn model_endpoint(cfg: &ProviderConfig, model: &str, method: &str) -> Result<String> {
    endpoint(cfg, &format!("models/{model}:{method}"))
}

pub async fn generate_content(
    client: &Client,
    cfg: &ProviderConfig,
    req: &ContentRequest,
) -> Result<ContentResponse> {
    let url = model_endpoint(cfg, &req.model, "generateContent")?;
    let key = resolve_api_key(cfg)?;
    let resp: Value = send_json(
        client
            .post(url)
            .header(API_KEY_HEADER, key)
            .json(&req.to_body()),
    )
    .await?;
    ContentResponse::from_json(&resp)
}

/// Start a video job. The returned operation is usually not done yet.
pub async fn submit_video(
    client: &Client,
    cfg: &ProviderConfig,
    req: &VideoRequest,
) -> Result<Operation> {
    let url = model_endpoint(cfg, &req.model, "predictLongRunning")?;
    let key = resolve_api_key(cfg)?;
    let resp: Value = send_json(
        client
            .post(url)
            .header(API_KEY_HEADER, key)
            .json(&req.to_body()),
    )
    .await?;
    Operation::from_json(resp)
}

/// Fetch the current state of an operation. `name` may be a bare resource
/// name or a full URL.
pub async fn get_operation(
    client: &Client,
    cfg: &ProviderConfig,
    retry: &RetryConfig,
    name: &str,
) -> Result<Operation> {
    let url = if name.starts_with("http") {
        name.to_string()
    } else {
        endpoint(cfg, name)?
    };
    let resp: Value = send_json_with_retry(retry, || {
        let key = resolve_api_key(cfg)?;
        Ok(client.get(&url).header(API_KEY_HEADER, key))
    })
    .await?;
    Operation::from_json(resp)
}

/// Download a generated file. The locator only dereferences with the key
/// attached as a query parameter.
pub async fn download(
    client: &Client,
    cfg: &ProviderConfig,
    uri: &str,
) -> Result<(Bytes, Option<String>)> {
    let key = resolve_api_key(cfg)?;
    send_bytes(client.get(uri).query(&[("key", key.as_str())])).await
}
