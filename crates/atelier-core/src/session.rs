//! Per-run session directories. Each studio or one-shot run gets its own
//! folder, and generated media lands in its `media/` subfolder unless
//! `defaults.output_dir` says otherwise.

use anyhow::{Context, Result};
use rand::{distributions::Alphanumeric, Rng};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use time::{format_description::FormatItem, macros::format_description, OffsetDateTime};

use crate::paths::atelier_dir;

static SESSION_STAMP: &[FormatItem<'static>] =
    format_description!("[year][month][day]_[hour][minute][second]");

#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub id: String,
    pub path: PathBuf,
}

impl SessionInfo {
    pub fn media_dir(&self) -> PathBuf {
        self.path.join("media")
    }
}

/// `{atelier_dir}/sessions`.
pub fn session_base_dir() -> PathBuf {
    atelier_dir().join("sessions")
}

/// Create a fresh session under [`session_base_dir`].
pub fn create_session_dir() -> Result<SessionInfo> {
    create_session_in(&session_base_dir())
}

/// Create `{base}/{YYYYMMDD_HHMMSS}_{rand6}`.
pub fn create_session_in(base: &Path) -> Result<SessionInfo> {
    let stamp = OffsetDateTime::now_utc()
        .format(SESSION_STAMP)
        .unwrap_or_else(|_| "unknown".to_string());
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(char::from)
        .collect();
    let id = format!("{stamp}_{suffix}");
    let path = base.join(&id);
    fs::create_dir_all(&path).with_context(|| format!("create session dir {}", path.display()))?;
    tracing::debug!(session = %id, "session created");
    Ok(SessionInfo { id, path })
}
