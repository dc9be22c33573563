//! Quality tier → backing model mapping for both output kinds.

use serde::Serialize;

use crate::config::ModelConfig;
use crate::snapshot::{AspectRatio, ImageTier, VideoTier};

/// Resolved parameters for an image request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImagePlan {
    pub model: String,
    pub image_size: Option<&'static str>,
    pub elevated: bool,
}

impl ImagePlan {
    /// Elevated tiers require the user to have selected a credential.
    pub fn requires_credential(&self) -> bool {
        self.elevated
    }
}

pub fn image_plan(tier: ImageTier, models: &ModelConfig) -> ImagePlan {
    let (elevated, image_size) = match tier {
        ImageTier::Fast => (false, None),
        ImageTier::Standard => (true, Some("1K")),
        ImageTier::Hd => (true, Some("2K")),
        ImageTier::Uhd => (true, Some("4K")),
    };
    let model = if elevated {
        models.image_elevated.clone()
    } else {
        models.image_base.clone()
    };
    ImagePlan {
        model,
        image_size,
        elevated,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoVariant {
    Fast,
    Base,
}

/// Resolved parameters for a video request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoPlan {
    pub variant: VideoVariant,
    pub model: String,
    pub resolution: &'static str,
}

pub fn video_plan(tier: VideoTier, models: &ModelConfig) -> VideoPlan {
    let (variant, resolution) = match tier {
        VideoTier::Fast => (VideoVariant::Fast, "720p"),
        VideoTier::Standard => (VideoVariant::Fast, "1080p"),
        VideoTier::Quality => (VideoVariant::Base, "720p"),
        VideoTier::Pro => (VideoVariant::Base, "1080p"),
    };
    let model = match variant {
        VideoVariant::Fast => models.video_fast.clone(),
        VideoVariant::Base => models.video_base.clone(),
    };
    VideoPlan {
        variant,
        model,
        resolution,
    }
}

/// Veo has no square output; square requests are widened to 16:9.
pub fn video_aspect_ratio(ratio: AspectRatio) -> AspectRatio {
    match ratio {
        AspectRatio::Square => AspectRatio::Wide,
        other => other,
    }
}
