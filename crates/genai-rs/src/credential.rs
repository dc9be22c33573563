use std::fmt;
use std::sync::{Arc, RwLock};

/// Process-wide API key slot, filled lazily by a credential selection flow
/// and read by every request afterwards.
#[derive(Clone, Default)]
pub struct ApiKeyStore {
    inner: Arc<RwLock<Option<String>>>,
}

impl ApiKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<String> {
        self.inner
            .read()
            .map(|guard| guard.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    pub fn set(&self, key: impl Into<String>) {
        let key = key.into();
        match self.inner.write() {
            Ok(mut guard) => *guard = Some(key),
            Err(poisoned) => *poisoned.into_inner() = Some(key),
        }
    }

    pub fn is_set(&self) -> bool {
        self.get().is_some_and(|key| !key.is_empty())
    }
}

impl fmt::Debug for ApiKeyStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKeyStore")
            .field("set", &self.is_set())
            .finish()
    }
}
