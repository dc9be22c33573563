use crate::credential::ApiKeyStore;

/// Where requests go and how they are authenticated.
#[derive(Debug, Clone, Default)]
pub struct ProviderConfig {
    pub base_url: Option<String>,
    pub api_key_env: Option<String>,
    pub api_key: Option<String>,
    /// Key chosen at runtime; takes precedence over the other sources.
    pub key_store: Option<ApiKeyStore>,
}

impl ProviderConfig {
    pub fn with_base_url(mut self, base: impl Into<String>) -> Self {
        self.base_url = Some(base.into());
        self
    }

    pub fn with_api_key_env(mut self, var: impl Into<String>) -> Self {
        self.api_key_env = Some(var.into());
        self
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_key_store(mut self, store: ApiKeyStore) -> Self {
        self.key_store = Some(store);
        self
    }
}
