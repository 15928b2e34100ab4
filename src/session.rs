//! Last-session persistence.
//!
//! One JSON record under the user data directory, written after a successful
//! generation and removed on explicit reset. Single writer assumed;
//! last-writer-wins. A record with an unknown schema version is treated as
//! absent rather than failing startup.
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::catalog::{BibleVersion, Passage};

pub const SESSION_SCHEMA_VERSION: u32 = 1;

/// Everything needed to restore the last study view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub schema_version: u32,
    pub passage: Passage,
    pub version: BibleVersion,
    pub target_chars: u32,
    /// Index of the section (rubrique) last shown.
    pub active_section: usize,
    /// Raw generation output, kept so the view can be re-formatted on demand.
    pub last_content: String,
    /// Section label -> generated, for the completion indicators.
    #[serde(default)]
    pub completion: BTreeMap<String, bool>,
}

pub fn default_session_path() -> Result<PathBuf> {
    let base = dirs::data_dir().context("resolve user data directory")?;
    Ok(base.join("etude-bible").join("session.json"))
}

pub fn load_session(path: &Path) -> Result<Option<SessionRecord>> {
    if !path.exists() {
        return Ok(None);
    }
    let bytes = fs::read(path).with_context(|| format!("read session {}", path.display()))?;
    let record: SessionRecord = serde_json::from_slice(&bytes).context("parse session JSON")?;
    if record.schema_version != SESSION_SCHEMA_VERSION {
        tracing::warn!(
            found = record.schema_version,
            expected = SESSION_SCHEMA_VERSION,
            "ignoring session with unknown schema version"
        );
        return Ok(None);
    }
    Ok(Some(record))
}

pub fn save_session(path: &Path, record: &SessionRecord) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("create session directory")?;
    }
    let text = serde_json::to_string_pretty(record).context("serialize session record")?;
    fs::write(path, text.as_bytes()).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Remove the record. Returns whether one existed.
pub fn clear_session(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(false);
    }
    fs::remove_file(path).with_context(|| format!("remove {}", path.display()))?;
    Ok(true)
}
