//! Editing session: committed history plus the ephemeral draft and
//! in-flight request state.

use std::sync::Arc;
use tokio::sync::watch;

use crate::error::{Result, StudioError};
use crate::history::HistoryStore;
use crate::media::{ReferenceFile, ResourceHandle};
use crate::snapshot::{AspectRatio, OutputKind, QualityMode, Snapshot, SnapshotChanges};

/// Everything one generation attempt needs, captured when it starts.
#[derive(Debug, Clone)]
pub struct GenerationTicket {
    pub snapshot: Arc<Snapshot>,
    pub draft: String,
    pub kind: OutputKind,
}

/// How a generation attempt ended. Failures are values, not errors: nothing
/// escapes the orchestrator.
#[derive(Debug)]
pub enum GenerationOutcome {
    Artifact(ResourceHandle),
    /// The service answered but produced no binary output.
    NoArtifact { message: Option<String> },
    Failed(StudioError),
}

#[derive(Debug)]
pub struct Studio {
    history: HistoryStore,
    draft: String,
    loading: bool,
    status: watch::Sender<String>,
}

impl Default for Studio {
    fn default() -> Self {
        Self::new(Snapshot::default())
    }
}

impl Studio {
    pub fn new(seed: Snapshot) -> Self {
        let draft = seed.prompt().to_string();
        let (status, _) = watch::channel(String::new());
        Self {
            history: HistoryStore::new(seed),
            draft,
            loading: false,
            status,
        }
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn current(&self) -> &Arc<Snapshot> {
        self.history.current()
    }

    pub fn kind(&self) -> OutputKind {
        self.current().kind()
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn status(&self) -> String {
        self.status.borrow().clone()
    }

    /// Receive status updates, including those published while a job runs.
    pub fn subscribe_status(&self) -> watch::Receiver<String> {
        self.status.subscribe()
    }

    /// Handle the orchestrator uses to publish progress.
    pub fn status_publisher(&self) -> StatusPublisher {
        StatusPublisher {
            sender: self.status.clone(),
        }
    }

    /// Update the draft prompt without touching history.
    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    /// Commit the draft prompt (the blur-equivalent event).
    pub fn commit_draft(&mut self) -> bool {
        self.history.commit(SnapshotChanges::new().prompt(self.draft.clone()))
    }

    pub fn set_aspect_ratio(&mut self, ratio: AspectRatio) -> bool {
        self.history.commit(SnapshotChanges::new().aspect_ratio(ratio))
    }

    /// Select a tier by name for the active output kind.
    pub fn set_quality(&mut self, tier: &str) -> Result<bool> {
        let quality = QualityMode::parse_for(self.kind(), tier)?;
        Ok(self.history.commit(SnapshotChanges::new().quality(quality)))
    }

    pub fn set_reference(&mut self, reference: Option<ReferenceFile>) -> bool {
        self.history.commit(SnapshotChanges::new().reference(reference))
    }

    /// Switch output kind: resets the tier to the kind's default and clears
    /// the previous result.
    pub fn switch_kind(&mut self, kind: OutputKind) -> bool {
        self.history.commit(
            SnapshotChanges::new()
                .quality(QualityMode::default_for(kind))
                .result(None),
        )
    }

    pub fn undo(&mut self) -> bool {
        let moved = self.history.undo();
        self.resync_draft();
        moved
    }

    pub fn redo(&mut self) -> bool {
        let moved = self.history.redo();
        self.resync_draft();
        moved
    }

    fn resync_draft(&mut self) {
        self.draft = self.history.current().prompt().to_string();
    }

    /// Start a generation attempt. Refused while another one is in flight.
    ///
    /// The ticket carries the current snapshot with the draft prompt applied.
    /// History is not touched until the attempt finishes.
    pub fn begin_generation(&mut self) -> Result<GenerationTicket> {
        if self.loading {
            return Err(StudioError::Busy);
        }
        self.loading = true;
        let pending = SnapshotChanges::new().prompt(self.draft.clone());
        let snapshot = if pending.is_satisfied_by(self.current()) {
            self.current().clone()
        } else {
            Arc::new(self.current().merged(&pending))
        };
        let kind = snapshot.kind();
        self.status
            .send_replace(format!("Generating {kind} ({})...", snapshot.quality().tier_name()));
        Ok(GenerationTicket {
            snapshot,
            draft: self.draft.clone(),
            kind,
        })
    }

    /// Record the end of an attempt. `loading` is cleared on every path.
    /// A failed attempt leaves history alone; otherwise the draft prompt is
    /// committed, together with the artifact when there is one.
    pub fn finish_generation(&mut self, ticket: GenerationTicket, outcome: &GenerationOutcome) {
        self.loading = false;
        let status = match outcome {
            GenerationOutcome::Artifact(handle) => {
                self.history.commit(
                    SnapshotChanges::new()
                        .result(Some(handle.clone()))
                        .prompt(ticket.draft),
                );
                format!("Saved {}", handle.path.display())
            }
            GenerationOutcome::NoArtifact { message } => {
                self.history.commit(SnapshotChanges::new().prompt(ticket.draft));
                message
                    .clone()
                    .unwrap_or_else(|| "The service returned no output.".to_string())
            }
            GenerationOutcome::Failed(err) => err.user_message(),
        };
        self.status.send_replace(status);
    }
}

/// Cloneable sender for status text.
#[derive(Debug, Clone)]
pub struct StatusPublisher {
    sender: watch::Sender<String>,
}

impl StatusPublisher {
    pub fn publish(&self, status: impl Into<String>) {
        self.sender.send_replace(status.into());
    }

    /// A publisher that nobody listens to.
    pub fn detached() -> Self {
        let (sender, _) = watch::channel(String::new());
        Self { sender }
    }
}
