use anyhow::Result;
use atelier_core::config::ModelConfig;
use atelier_core::output::{emit, OutputFormat};
use atelier_core::tiers::{image_plan, video_aspect_ratio, video_plan};
use atelier_core::{AspectRatio, ImageTier, VideoTier};
use serde::Serialize;

use crate::AppContext;

#[derive(Debug, Serialize)]
struct ImageRow {
    tier: &'static str,
    model: String,
    image_size: Option<&'static str>,
    requires_credential: bool,
}

#[derive(Debug, Serialize)]
struct VideoRow {
    tier: &'static str,
    model: String,
    resolution: &'static str,
}

#[derive(Debug, Serialize)]
struct TierTables {
    image: Vec<ImageRow>,
    video: Vec<VideoRow>,
    video_square_as: AspectRatio,
}

fn tier_tables(models: &ModelConfig) -> TierTables {
    let image = ImageTier::ALL
        .into_iter()
        .map(|tier| {
            let plan = image_plan(tier, models);
            ImageRow {
                tier: tier.as_str(),
                requires_credential: plan.requires_credential(),
                model: plan.model,
                image_size: plan.image_size,
            }
        })
        .collect();
    let video = VideoTier::ALL
        .into_iter()
        .map(|tier| {
            let plan = video_plan(tier, models);
            VideoRow {
                tier: tier.as_str(),
                model: plan.model,
                resolution: plan.resolution,
            }
        })
        .collect();
    TierTables {
        image,
        video,
        video_square_as: video_aspect_ratio(AspectRatio::Square),
    }
}

fn render_text(tables: &TierTables) -> String {
    let mut out = String::from("image\n");
    for row in &tables.image {
        out.push_str(&format!(
            "  {:<9} {:<32} {:<4} {}\n",
            row.tier,
            row.model,
            row.image_size.unwrap_or("-"),
            if row.requires_credential {
                "key required"
            } else {
                "no key needed"
            }
        ));
    }
    out.push_str(&format!(
        "video (key required, 1:1 is sent as {})\n",
        tables.video_square_as
    ));
    for row in &tables.video {
        out.push_str(&format!(
            "  {:<9} {:<32} {}\n",
            row.tier, row.model, row.resolution
        ));
    }
    out.trim_end().to_string()
}

pub(crate) fn handle_tiers(ctx: &AppContext, format: OutputFormat) -> Result<()> {
    let tables = tier_tables(&ctx.config.models);
    emit(format, "tiers", &tables, render_text)
}
