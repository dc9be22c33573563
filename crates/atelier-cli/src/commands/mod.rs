pub(crate) mod generate;
pub(crate) mod studio;
pub(crate) mod tiers;

use atelier_core::media::ResourceHandle;
use atelier_core::{GenerationOutcome, QualityMode, Studio, StudioError};
use serde::Serialize;
use std::io::{self, Write};
use tokio::sync::watch;

use crate::orchestrator::Orchestrator;

/// What a finished attempt looked like, for printing.
#[derive(Debug, Serialize)]
pub(crate) struct GenerationReport {
    pub outcome: &'static str,
    pub quality: QualityMode,
    pub status: String,
    pub artifact: Option<ResourceHandle>,
    pub history_len: usize,
    pub cursor: usize,
}

impl GenerationReport {
    pub fn new(studio: &Studio, outcome: &GenerationOutcome) -> Self {
        let (label, artifact) = match outcome {
            GenerationOutcome::Artifact(handle) => ("artifact", Some(handle.clone())),
            GenerationOutcome::NoArtifact { .. } => ("no_artifact", None),
            GenerationOutcome::Failed(_) => ("failed", None),
        };
        Self {
            outcome: label,
            quality: studio.current().quality(),
            status: studio.status(),
            artifact,
            history_len: studio.history().len(),
            cursor: studio.history().cursor(),
        }
    }

    pub fn render_text(&self) -> String {
        match &self.artifact {
            Some(handle) => handle.path.display().to_string(),
            None => self.status.clone(),
        }
    }
}

/// Run one attempt with the studio's current snapshot. Progress updates are
/// echoed to stderr while the attempt is in flight.
pub(crate) async fn generate_once(
    studio: &mut Studio,
    orchestrator: &Orchestrator,
) -> Result<GenerationOutcome, StudioError> {
    let progress_rx = studio.subscribe_status();
    let ticket = studio.begin_generation()?;
    let progress = tokio::spawn(echo_progress(progress_rx));

    let outcome = orchestrator.run(&ticket).await;
    progress.abort();
    studio.finish_generation(ticket, &outcome);
    Ok(outcome)
}

async fn echo_progress(mut rx: watch::Receiver<String>) {
    while rx.changed().await.is_ok() {
        let status = rx.borrow_and_update().clone();
        if !status.is_empty() {
            let mut stderr = io::stderr().lock();
            let _ = writeln!(stderr, "{status}");
        }
    }
}
