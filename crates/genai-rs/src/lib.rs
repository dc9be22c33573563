//! Minimal Gemini REST client for image generation and Veo video jobs.

pub mod client;
pub mod config;
pub mod credential;
pub mod error;
pub mod http;
pub mod providers;
pub mod service;
pub mod types;

pub use client::GenAiClient;
pub use config::ProviderConfig;
pub use credential::ApiKeyStore;
pub use error::{GenAiError, Result};
pub use service::{Download, GenerativeService};
pub use types::*;
