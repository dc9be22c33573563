//! Core types for the atelier generation studio: request snapshots, their
//! undo/redo history, quality tiers and media handling.

pub mod config;
pub mod error;
pub mod history;
pub mod media;
pub mod output;
pub mod paths;
pub mod session;
pub mod snapshot;
pub mod studio;
pub mod tiers;

pub use error::{Result, StudioError};
pub use history::HistoryStore;
pub use snapshot::{
    AspectRatio, ImageTier, OutputKind, QualityMode, Snapshot, SnapshotChanges, VideoTier,
};
pub use studio::{GenerationOutcome, GenerationTicket, StatusPublisher, Studio};
