use anyhow::{Context, Result};
use atelier_core::media::ReferenceFile;
use atelier_core::output::{emit, OutputFormat};
use atelier_core::{GenerationOutcome, OutputKind, QualityMode, SnapshotChanges, Studio};

use crate::commands::{generate_once, GenerationReport};
use crate::{AppContext, ImageArgs, RequestArgs, VideoArgs};

pub(crate) async fn handle_image(
    ctx: &AppContext,
    args: ImageArgs,
    format: OutputFormat,
) -> Result<()> {
    let kind = if args.edit {
        OutputKind::Edit
    } else {
        OutputKind::Create
    };
    if kind == OutputKind::Edit && args.request.reference.is_none() {
        anyhow::bail!("--edit needs --reference");
    }
    run_single(ctx, kind, args.request, format, "generate.image").await
}

pub(crate) async fn handle_video(
    ctx: &AppContext,
    args: VideoArgs,
    format: OutputFormat,
) -> Result<()> {
    run_single(ctx, OutputKind::Video, args.request, format, "generate.video").await
}

/// One-shot generation: a throwaway studio seeded from the arguments.
async fn run_single(
    ctx: &AppContext,
    kind: OutputKind,
    args: RequestArgs,
    format: OutputFormat,
    event: &str,
) -> Result<()> {
    let changes = request_changes(kind, args)?;
    let mut studio = Studio::new(ctx.seed()?.merged(&changes));
    let orchestrator = ctx.orchestrator(studio.status_publisher())?;

    let outcome = generate_once(&mut studio, &orchestrator).await?;
    let report = GenerationReport::new(&studio, &outcome);
    emit(format, event, &report, GenerationReport::render_text)?;

    match outcome {
        GenerationOutcome::Failed(err) => Err(err.into()),
        _ => Ok(()),
    }
}

fn request_changes(kind: OutputKind, args: RequestArgs) -> Result<SnapshotChanges> {
    let quality = match args.quality.as_deref() {
        Some(tier) => QualityMode::parse_for(kind, tier)?,
        None => QualityMode::default_for(kind),
    };
    let mut changes = SnapshotChanges::new().prompt(args.prompt).quality(quality);
    if let Some(ratio) = args.aspect_ratio.as_deref() {
        changes = changes.aspect_ratio(ratio.parse()?);
    }
    if let Some(path) = args.reference.as_deref() {
        let reference = ReferenceFile::from_path(path)
            .with_context(|| format!("reference {}", path.display()))?;
        changes = changes.reference(Some(reference));
    }
    Ok(changes)
}
