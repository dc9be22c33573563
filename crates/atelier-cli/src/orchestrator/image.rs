use atelier_core::media;
use atelier_core::tiers::image_plan;
use atelier_core::{GenerationOutcome, GenerationTicket, OutputKind};
use genai_rs::{ContentRequest, InlineData};

use super::{Failure, Orchestrator};

/// Single `generateContent` call. Edit mode sends the reference image ahead
/// of the prompt; create mode never does.
pub(super) async fn generate(
    orch: &Orchestrator,
    ticket: &GenerationTicket,
) -> Result<GenerationOutcome, Failure> {
    let snapshot = &ticket.snapshot;
    let plan = image_plan(snapshot.quality().image_tier(), &orch.models);
    if plan.requires_credential() {
        orch.gate.ensure().await?;
    }

    let mut request = ContentRequest::new(plan.model.as_str());
    if ticket.kind == OutputKind::Edit {
        if let Some(reference) = snapshot.reference() {
            let encoded = media::encode(reference).await?;
            request = request.inline(InlineData::new(encoded.mime_type, encoded.bytes));
        }
    }
    let request = request
        .text(ticket.draft.as_str())
        .aspect_ratio(snapshot.aspect_ratio().as_str())
        .image_size(plan.image_size);

    tracing::info!(
        model = %plan.model,
        aspect_ratio = %snapshot.aspect_ratio(),
        image_size = plan.image_size.unwrap_or("default"),
        "submitting image request"
    );
    let response = orch.service.generate_content(request).await?;

    match response.first_inline() {
        Some(image) => {
            let handle = orch.store.materialize(&image.data, &image.mime_type).await?;
            Ok(GenerationOutcome::Artifact(handle))
        }
        None => Ok(GenerationOutcome::NoArtifact {
            message: response.text(),
        }),
    }
}
