use crate::config::ProviderConfig;
use crate::error::{GenAiError, Result};
use std::env;

pub mod gemini;

/// Resolve the key for a request: selected key, then explicit key, then the
/// configured environment variable.
pub fn resolve_api_key(cfg: &ProviderConfig) -> Result<String> {
    if let Some(key) = cfg.key_store.as_ref().and_then(|store| store.get()) {
        if !key.is_empty() {
            return Ok(key);
        }
    }
    if let Some(key) = cfg.api_key.clone() {
        return Ok(key);
    }
    if let Some(env_key) = cfg.api_key_env.as_deref() {
        return env::var(env_key)
            .ok()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| GenAiError::MissingApiKey(env_key.to_string()));
    }
    Err(GenAiError::MissingApiKey("<unset>".into()))
}
