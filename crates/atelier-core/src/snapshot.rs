//! Request configuration values and the immutable [`Snapshot`] that records them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::StudioError;
use crate::media::{ReferenceFile, ResourceHandle};

/// Requested output geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "16:9")]
    Wide,
    #[serde(rename = "9:16")]
    Tall,
    #[serde(rename = "3:4")]
    Portrait,
    #[serde(rename = "4:3")]
    Landscape,
}

impl AspectRatio {
    pub const ALL: [AspectRatio; 5] = [
        AspectRatio::Square,
        AspectRatio::Wide,
        AspectRatio::Tall,
        AspectRatio::Portrait,
        AspectRatio::Landscape,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Wide => "16:9",
            AspectRatio::Tall => "9:16",
            AspectRatio::Portrait => "3:4",
            AspectRatio::Landscape => "4:3",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = StudioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        AspectRatio::ALL
            .into_iter()
            .find(|ratio| ratio.as_str() == trimmed)
            .ok_or_else(|| StudioError::InvalidInput(format!("unknown aspect ratio: {s}")))
    }
}

/// Which generation mode is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    Create,
    Edit,
    Video,
}

impl OutputKind {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputKind::Create => "create",
            OutputKind::Edit => "edit",
            OutputKind::Video => "video",
        }
    }

    pub fn is_video(self) -> bool {
        matches!(self, OutputKind::Video)
    }
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputKind {
    type Err = StudioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "create" | "image" => Ok(OutputKind::Create),
            "edit" => Ok(OutputKind::Edit),
            "video" => Ok(OutputKind::Video),
            _ => Err(StudioError::InvalidInput(format!("unknown output kind: {s}"))),
        }
    }
}

/// Image quality tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageTier {
    #[default]
    Fast,
    Standard,
    Hd,
    Uhd,
}

impl ImageTier {
    pub const ALL: [ImageTier; 4] = [
        ImageTier::Fast,
        ImageTier::Standard,
        ImageTier::Hd,
        ImageTier::Uhd,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ImageTier::Fast => "fast",
            ImageTier::Standard => "standard",
            ImageTier::Hd => "hd",
            ImageTier::Uhd => "uhd",
        }
    }
}

impl FromStr for ImageTier {
    type Err = StudioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        ImageTier::ALL
            .into_iter()
            .find(|tier| tier.as_str() == lowered)
            .ok_or_else(|| StudioError::InvalidInput(format!("unknown image tier: {s}")))
    }
}

/// Video quality tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoTier {
    Fast,
    #[default]
    Standard,
    Quality,
    Pro,
}

impl VideoTier {
    pub const ALL: [VideoTier; 4] = [
        VideoTier::Fast,
        VideoTier::Standard,
        VideoTier::Quality,
        VideoTier::Pro,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            VideoTier::Fast => "fast",
            VideoTier::Standard => "standard",
            VideoTier::Quality => "quality",
            VideoTier::Pro => "pro",
        }
    }
}

impl FromStr for VideoTier {
    type Err = StudioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        VideoTier::ALL
            .into_iter()
            .find(|tier| tier.as_str() == lowered)
            .ok_or_else(|| StudioError::InvalidInput(format!("unknown video tier: {s}")))
    }
}

/// Quality selector tagged with the output kind it was chosen under.
///
/// The tag doubles as the session's active output kind, so switching tabs is
/// recorded in history and undone like any other edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "tier", rename_all = "lowercase")]
pub enum QualityMode {
    Create(ImageTier),
    Edit(ImageTier),
    Video(VideoTier),
}

impl Default for QualityMode {
    fn default() -> Self {
        QualityMode::default_for(OutputKind::Create)
    }
}

impl QualityMode {
    pub fn default_for(kind: OutputKind) -> Self {
        match kind {
            OutputKind::Create => QualityMode::Create(ImageTier::default()),
            OutputKind::Edit => QualityMode::Edit(ImageTier::default()),
            OutputKind::Video => QualityMode::Video(VideoTier::default()),
        }
    }

    /// Parse a tier name as it applies to `kind`.
    pub fn parse_for(kind: OutputKind, tier: &str) -> Result<Self, StudioError> {
        match kind {
            OutputKind::Create => Ok(QualityMode::Create(tier.parse()?)),
            OutputKind::Edit => Ok(QualityMode::Edit(tier.parse()?)),
            OutputKind::Video => Ok(QualityMode::Video(tier.parse()?)),
        }
    }

    pub fn kind(self) -> OutputKind {
        match self {
            QualityMode::Create(_) => OutputKind::Create,
            QualityMode::Edit(_) => OutputKind::Edit,
            QualityMode::Video(_) => OutputKind::Video,
        }
    }

    pub fn tier_name(self) -> &'static str {
        match self {
            QualityMode::Create(tier) | QualityMode::Edit(tier) => tier.as_str(),
            QualityMode::Video(tier) => tier.as_str(),
        }
    }

    /// The image tier to use for this mode. A video tier is reinterpreted as
    /// the default image tier.
    pub fn image_tier(self) -> ImageTier {
        match self {
            QualityMode::Create(tier) | QualityMode::Edit(tier) => tier,
            QualityMode::Video(_) => ImageTier::default(),
        }
    }

    /// The video tier to use for this mode. An image tier is reinterpreted as
    /// the default video tier.
    pub fn video_tier(self) -> VideoTier {
        match self {
            QualityMode::Video(tier) => tier,
            QualityMode::Create(_) | QualityMode::Edit(_) => VideoTier::default(),
        }
    }
}

impl fmt::Display for QualityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind(), self.tier_name())
    }
}

/// One complete request configuration plus the artifact it produced.
///
/// Snapshots are only ever created by merging [`SnapshotChanges`] into an
/// existing snapshot; there is no way to modify one in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    prompt: String,
    aspect_ratio: AspectRatio,
    quality: QualityMode,
    reference: Option<ReferenceFile>,
    result: Option<ResourceHandle>,
}

impl Snapshot {
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn aspect_ratio(&self) -> AspectRatio {
        self.aspect_ratio
    }

    pub fn quality(&self) -> QualityMode {
        self.quality
    }

    pub fn kind(&self) -> OutputKind {
        self.quality.kind()
    }

    pub fn reference(&self) -> Option<&ReferenceFile> {
        self.reference.as_ref()
    }

    pub fn result(&self) -> Option<&ResourceHandle> {
        self.result.as_ref()
    }

    /// Build the snapshot obtained by applying `changes` on top of `self`.
    pub fn merged(&self, changes: &SnapshotChanges) -> Snapshot {
        Snapshot {
            prompt: changes
                .prompt
                .clone()
                .unwrap_or_else(|| self.prompt.clone()),
            aspect_ratio: changes.aspect_ratio.unwrap_or(self.aspect_ratio),
            quality: changes.quality.unwrap_or(self.quality),
            reference: match &changes.reference {
                Some(reference) => reference.clone(),
                None => self.reference.clone(),
            },
            result: match &changes.result {
                Some(result) => result.clone(),
                None => self.result.clone(),
            },
        }
    }
}

/// A partial snapshot. Absent fields are left untouched by a commit;
/// `Some(None)` clears an optional field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotChanges {
    pub prompt: Option<String>,
    pub aspect_ratio: Option<AspectRatio>,
    pub quality: Option<QualityMode>,
    pub reference: Option<Option<ReferenceFile>>,
    pub result: Option<Option<ResourceHandle>>,
}

impl SnapshotChanges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    pub fn aspect_ratio(mut self, ratio: AspectRatio) -> Self {
        self.aspect_ratio = Some(ratio);
        self
    }

    pub fn quality(mut self, quality: QualityMode) -> Self {
        self.quality = Some(quality);
        self
    }

    pub fn reference(mut self, reference: Option<ReferenceFile>) -> Self {
        self.reference = Some(reference);
        self
    }

    pub fn result(mut self, result: Option<ResourceHandle>) -> Self {
        self.result = Some(result);
        self
    }

    /// True when every field present in `self` already equals the
    /// corresponding field of `snapshot`.
    pub fn is_satisfied_by(&self, snapshot: &Snapshot) -> bool {
        self.prompt
            .as_deref()
            .map_or(true, |prompt| prompt == snapshot.prompt)
            && self
                .aspect_ratio
                .map_or(true, |ratio| ratio == snapshot.aspect_ratio)
            && self
                .quality
                .map_or(true, |quality| quality == snapshot.quality)
            && self
                .reference
                .as_ref()
                .map_or(true, |reference| reference == &snapshot.reference)
            && self
                .result
                .as_ref()
                .map_or(true, |result| result == &snapshot.result)
    }
}
