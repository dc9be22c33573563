//! Credential gate for elevated tiers.
//!
//! The key itself lives in a process-wide [`ApiKeyStore`] that the HTTP client
//! reads on every request; the gate only decides when to ask for one.

use async_trait::async_trait;
use atelier_core::{Result, StudioError};
use genai_rs::ApiKeyStore;
use std::env;
use std::io::{self, Write};
use std::sync::Arc;

use crate::input::LineInput;

/// External credential selection.
#[async_trait]
pub trait CredentialFlow: Send + Sync {
    fn has_credential(&self) -> bool;

    /// Ask the user for a credential. A declined or cancelled selection is a
    /// [`StudioError::Credential`].
    async fn request_selection(&self) -> Result<()>;
}

#[derive(Clone)]
pub struct CredentialGate {
    flow: Arc<dyn CredentialFlow>,
}

impl CredentialGate {
    pub fn new(flow: Arc<dyn CredentialFlow>) -> Self {
        Self { flow }
    }

    /// Make sure a credential is available, running the selection flow only
    /// when none is.
    pub async fn ensure(&self) -> Result<()> {
        if self.flow.has_credential() {
            return Ok(());
        }
        tracing::info!("no credential selected, starting selection");
        self.flow.request_selection().await
    }

    /// Run the selection flow again regardless of current state.
    pub async fn reselect(&self) -> Result<()> {
        self.flow.request_selection().await
    }
}

/// Prompts on stderr and reads the key from the shared input.
pub struct TerminalCredentialFlow {
    store: ApiKeyStore,
    env_var: String,
    input: Arc<LineInput>,
}

impl TerminalCredentialFlow {
    pub fn new(store: ApiKeyStore, env_var: impl Into<String>, input: Arc<LineInput>) -> Self {
        Self {
            store,
            env_var: env_var.into(),
            input,
        }
    }
}

#[async_trait]
impl CredentialFlow for TerminalCredentialFlow {
    fn has_credential(&self) -> bool {
        self.store.is_set()
            || env::var(&self.env_var)
                .map(|key| !key.trim().is_empty())
                .unwrap_or(false)
    }

    async fn request_selection(&self) -> Result<()> {
        {
            let mut stderr = io::stderr().lock();
            let _ = write!(
                stderr,
                "This tier needs an API key with access to the paid models.\nAPI key (empty to cancel): "
            );
            let _ = stderr.flush();
        }
        let line = self
            .input
            .next_line()
            .await
            .map_err(|err| StudioError::Credential(format!("read key: {err}")))?;
        match line.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => {
                self.store.set(key);
                tracing::info!("credential selected");
                Ok(())
            }
            _ => Err(StudioError::Credential("selection cancelled".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct CountingFlow {
        present: AtomicBool,
        accept: bool,
        requests: AtomicUsize,
    }

    #[async_trait]
    impl CredentialFlow for CountingFlow {
        fn has_credential(&self) -> bool {
            self.present.load(Ordering::SeqCst)
        }

        async fn request_selection(&self) -> Result<()> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            if self.accept {
                self.present.store(true, Ordering::SeqCst);
                Ok(())
            } else {
                Err(StudioError::Credential("declined".into()))
            }
        }
    }

    fn flow(present: bool, accept: bool) -> Arc<CountingFlow> {
        Arc::new(CountingFlow {
            present: AtomicBool::new(present),
            accept,
            requests: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn ensure_skips_selection_when_present() {
        let flow = flow(true, true);
        CredentialGate::new(flow.clone()).ensure().await.unwrap();
        assert_eq!(flow.requests.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn ensure_selects_lazily_once() {
        let flow = flow(false, true);
        let gate = CredentialGate::new(flow.clone());
        gate.ensure().await.unwrap();
        gate.ensure().await.unwrap();
        assert_eq!(flow.requests.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn declined_selection_is_credential_error() {
        let gate = CredentialGate::new(flow(false, false));
        assert!(matches!(
            gate.ensure().await,
            Err(StudioError::Credential(_))
        ));
    }

    #[tokio::test]
    async fn reselect_always_prompts() {
        let flow = flow(true, true);
        CredentialGate::new(flow.clone()).reselect().await.unwrap();
        assert_eq!(flow.requests.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn terminal_flow_stores_entered_key() {
        let store = ApiKeyStore::new();
        let input = LineInput::new(&b"  k-42  \n"[..]);
        let flow = TerminalCredentialFlow::new(store.clone(), "ATELIER_TEST_UNSET_KEY", input);
        assert!(!flow.has_credential());
        flow.request_selection().await.unwrap();
        assert_eq!(store.get().as_deref(), Some("k-42"));
        assert!(flow.has_credential());
    }

    #[tokio::test]
    async fn terminal_flow_empty_line_cancels() {
        let store = ApiKeyStore::new();
        let input = LineInput::new(&b"\n"[..]);
        let flow = TerminalCredentialFlow::new(store.clone(), "ATELIER_TEST_UNSET_KEY", input);
        assert!(matches!(
            flow.request_selection().await,
            Err(StudioError::Credential(_))
        ));
        assert!(!store.is_set());
    }
}
