use bytes::Bytes;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::time::sleep;

use crate::error::{GenAiError, Result};

/// Lines of an error body kept in [`GenAiError::Http`].
const ERROR_BODY_LINES: usize = 20;

/// Exponential backoff for idempotent requests.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff_ms: 1_000,
            max_backoff_ms: 30_000,
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Send once, never retry.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let ms = self.initial_backoff_ms as f64 * self.backoff_multiplier.powi(attempt as i32);
        Duration::from_millis(ms.min(self.max_backoff_ms as f64) as u64)
    }
}

fn is_transient(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::REQUEST_TIMEOUT
            | StatusCode::TOO_MANY_REQUESTS
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    )
}

async fn status_error(resp: Response) -> GenAiError {
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    let body = body
        .lines()
        .take(ERROR_BODY_LINES)
        .collect::<Vec<_>>()
        .join("\n");
    GenAiError::status(status, body)
}

async fn parse_json<T: DeserializeOwned>(resp: Response) -> Result<T> {
    if !resp.status().is_success() {
        return Err(status_error(resp).await);
    }
    resp.json()
        .await
        .map_err(|e| GenAiError::Parse(e.to_string()))
}

/// Send once and decode a JSON body.
pub async fn send_json<T: DeserializeOwned>(req: RequestBuilder) -> Result<T> {
    parse_json(req.send().await?).await
}

/// Send once and return the raw body with its content type, parameters
/// stripped.
pub async fn send_bytes(req: RequestBuilder) -> Result<(Bytes, Option<String>)> {
    let resp = req.send().await?;
    if !resp.status().is_success() {
        return Err(status_error(resp).await);
    }
    let content_type = resp
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|v| v.trim().to_string());
    Ok((resp.bytes().await?, content_type))
}

/// Send a JSON request, retrying transport errors and transient statuses.
/// `build` is called once per attempt; only use this for idempotent calls.
pub async fn send_json_with_retry<T, F>(retry: &RetryConfig, mut build: F) -> Result<T>
where
    T: DeserializeOwned,
    F: FnMut() -> Result<RequestBuilder>,
{
    let mut attempt = 0;
    loop {
        let last_try = attempt >= retry.max_retries;
        match build()?.send().await {
            Ok(resp) if !last_try && is_transient(resp.status()) => {
                let status = resp.status().as_u16();
                tracing::debug!(status, attempt, "transient status, retrying");
            }
            Ok(resp) => return parse_json(resp).await,
            Err(err) if !last_try => {
                tracing::debug!(error = %err, attempt, "transport error, retrying");
            }
            Err(err) => return Err(err.into()),
        }
        sleep(retry.backoff(attempt)).await;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_then_clamps() {
        let retry = RetryConfig {
            max_retries: 5,
            initial_backoff_ms: 500,
            max_backoff_ms: 3_000,
            backoff_multiplier: 2.0,
        };
        let steps: Vec<u64> = (0..5).map(|n| retry.backoff(n).as_millis() as u64).collect();
        assert_eq!(steps, vec![500, 1_000, 2_000, 3_000, 3_000]);
    }

    #[test]
    fn only_transient_statuses_retry() {
        for code in [408u16, 429, 502, 503, 504] {
            assert!(is_transient(StatusCode::from_u16(code).unwrap()), "{code}");
        }
        for code in [200u16, 400, 401, 403, 404, 500] {
            assert!(!is_transient(StatusCode::from_u16(code).unwrap()), "{code}");
        }
    }

    #[test]
    fn none_disables_retries() {
        assert_eq!(RetryConfig::none().max_retries, 0);
    }
}
