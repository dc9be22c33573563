use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::paths::{atelier_dir, home_dir};

pub const DEFAULT_PRODUCT_PREFIX: &str = "atelier";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;
/// Shortest accepted wait between operation polls.
pub const MIN_POLL_INTERVAL_SECS: u64 = 1;
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_API_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub defaults: Defaults,
    pub provider: ProviderConfig,
    pub models: ModelConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Defaults {
    pub product_prefix: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub poll_interval_secs: Option<u64>,
    pub aspect_ratio: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProviderConfig {
    pub base_url: Option<String>,
    pub api_key_env: Option<String>,
}

/// Backing model names for each tier family.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelConfig {
    pub image_base: String,
    pub image_elevated: String,
    pub video_fast: String,
    pub video_base: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            image_base: "gemini-2.5-flash-image".to_string(),
            image_elevated: "gemini-3-pro-image-preview".to_string(),
            video_fast: "veo-3.1-fast-generate-preview".to_string(),
            video_base: "veo-3.1-generate-preview".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct ConfigFile {
    pub defaults: Option<Defaults>,
    pub provider: Option<ProviderConfig>,
    pub models: Option<ModelOverrides>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct ModelOverrides {
    pub image_base: Option<String>,
    pub image_elevated: Option<String>,
    pub video_fast: Option<String>,
    pub video_base: Option<String>,
}

impl Config {
    pub fn load_with_profile(profile: Option<&str>) -> Result<Self> {
        let mut config = Config::default();
        for path in default_config_paths(profile) {
            if path.exists() {
                let file = load_config_file(&path)?;
                config.merge(file);
            }
        }
        Ok(config)
    }

    pub fn product_prefix(&self) -> &str {
        self.defaults
            .product_prefix
            .as_deref()
            .unwrap_or(DEFAULT_PRODUCT_PREFIX)
    }

    pub fn poll_interval(&self) -> Duration {
        let secs = self
            .defaults
            .poll_interval_secs
            .unwrap_or(DEFAULT_POLL_INTERVAL_SECS);
        Duration::from_secs(secs.max(MIN_POLL_INTERVAL_SECS))
    }

    pub fn base_url(&self) -> &str {
        self.provider.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn api_key_env(&self) -> &str {
        self.provider
            .api_key_env
            .as_deref()
            .unwrap_or(DEFAULT_API_KEY_ENV)
    }

    fn merge(&mut self, other: ConfigFile) {
        if let Some(defaults) = other.defaults {
            merge_defaults(&mut self.defaults, defaults);
        }
        if let Some(provider) = other.provider {
            merge_provider(&mut self.provider, provider);
        }
        if let Some(models) = other.models {
            merge_models(&mut self.models, models);
        }
    }
}

fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let raw =
        fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("parse config {}", path.display()))
}

/// Directories that may hold `config.toml` and `profiles/`, lowest priority
/// first.
fn config_roots() -> Vec<PathBuf> {
    let mut roots = vec![atelier_dir()];
    roots.extend(home_dir().map(|home| home.join(".config").join("atelier")));
    roots.extend(
        env::var_os("XDG_CONFIG_HOME").map(|xdg| PathBuf::from(xdg).join("atelier")),
    );
    roots
}

fn default_config_paths(profile: Option<&str>) -> Vec<PathBuf> {
    let roots = config_roots();
    let mut paths: Vec<PathBuf> = roots.iter().map(|root| root.join("config.toml")).collect();
    paths.push(PathBuf::from("atelier.toml"));
    paths.extend(env::var_os("ATELIER_CONFIG_PATH").map(PathBuf::from));

    if let Some(name) = profile {
        let file = format!("{name}.toml");
        paths.extend(roots.iter().map(|root| root.join("profiles").join(&file)));
        paths.push(PathBuf::from(format!("atelier.{name}.toml")));
    }
    paths
}

fn merge_defaults(target: &mut Defaults, other: Defaults) {
    if other.product_prefix.is_some() {
        target.product_prefix = other.product_prefix;
    }
    if other.output_dir.is_some() {
        target.output_dir = other.output_dir;
    }
    if other.poll_interval_secs.is_some() {
        target.poll_interval_secs = other.poll_interval_secs;
    }
    if other.aspect_ratio.is_some() {
        target.aspect_ratio = other.aspect_ratio;
    }
}

fn merge_provider(target: &mut ProviderConfig, other: ProviderConfig) {
    if other.base_url.is_some() {
        target.base_url = other.base_url;
    }
    if other.api_key_env.is_some() {
        target.api_key_env = other.api_key_env;
    }
}

fn merge_models(target: &mut ModelConfig, other: ModelOverrides) {
    if let Some(model) = other.image_base {
        target.image_base = model;
    }
    if let Some(model) = other.image_elevated {
        target.image_elevated = model;
    }
    if let Some(model) = other.video_fast {
        target.video_fast = model;
    }
    if let Some(model) = other.video_base {
        target.video_base = model;
    }
}
