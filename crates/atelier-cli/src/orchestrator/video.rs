use atelier_core::media;
use atelier_core::tiers::{video_aspect_ratio, video_plan};
use atelier_core::{GenerationOutcome, GenerationTicket, StatusPublisher};
use genai_rs::{GenAiError, GenerativeService, InlineData, Operation, VideoRequest};
use std::time::Duration;
use tokio::time::sleep;

use super::{Failure, Orchestrator};

const FALLBACK_VIDEO_MIME: &str = "video/mp4";

pub(super) async fn generate(
    orch: &Orchestrator,
    ticket: &GenerationTicket,
) -> Result<GenerationOutcome, Failure> {
    let snapshot = &ticket.snapshot;
    let plan = video_plan(snapshot.quality().video_tier(), &orch.models);
    orch.gate.ensure().await?;

    let image = match snapshot.reference() {
        Some(reference) => {
            let encoded = media::encode(reference).await?;
            Some(InlineData::new(encoded.mime_type, encoded.bytes))
        }
        None => None,
    };
    let request = VideoRequest {
        model: plan.model.clone(),
        prompt: ticket.draft.clone(),
        number_of_videos: 1,
        resolution: plan.resolution.to_string(),
        aspect_ratio: video_aspect_ratio(snapshot.aspect_ratio()).to_string(),
        image,
    };

    tracing::info!(
        model = %request.model,
        resolution = %request.resolution,
        aspect_ratio = %request.aspect_ratio,
        "submitting video job"
    );
    let operation = orch.service.submit_video(request).await?;
    let operation =
        poll_until_done(orch.service.as_ref(), operation, orch.poll_interval, &orch.status)
            .await?;

    if let Some(message) = operation.error_message() {
        return Err(GenAiError::Operation(message).into());
    }
    let Some(uri) = operation.video_uri() else {
        tracing::warn!(operation = %operation.name, "video job finished without a result");
        return Ok(GenerationOutcome::NoArtifact { message: None });
    };

    let download = orch.service.download(&uri).await?;
    let mime_type = download
        .content_type
        .filter(|mime| mime.starts_with("video/"))
        .unwrap_or_else(|| FALLBACK_VIDEO_MIME.to_string());
    let handle = orch.store.materialize(&download.bytes, &mime_type).await?;
    Ok(GenerationOutcome::Artifact(handle))
}

/// Re-fetch `operation` until it reports done, waiting `interval` before
/// every fetch. There is no iteration bound and no way to cancel.
pub async fn poll_until_done(
    service: &dyn GenerativeService,
    mut operation: Operation,
    interval: Duration,
    status: &StatusPublisher,
) -> genai_rs::Result<Operation> {
    let mut polls = 0u32;
    while !operation.done {
        sleep(interval).await;
        polls += 1;
        tracing::debug!(operation = %operation.name, polls, "polling video job");
        operation = service.get_operation(&operation).await?;
        status.publish(format!("Rendering video (check {polls})..."));
    }
    Ok(operation)
}
