//! Local session record cache
//!
//! Plain JSON in the per-user data directory. The record only seeds the
//! balance store at startup and is rewritten whenever the balance changes.

use anyhow::{Context, Result};
use cryptoadvisor_model::SessionRecord;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

pub(crate) const SESSION_FILE: &str = "session.json";

#[derive(Debug, Clone)]
pub struct SessionStorage {
    path: PathBuf,
}

impl SessionStorage {
    /// Storage under the platform data directory.
    pub fn new() -> Result<Self> {
        let proj_dirs =
            ProjectDirs::from("", "cryptoadvisor", "cryptoadvisor-client")
                .ok_or_else(|| {
                    anyhow::anyhow!("Unable to determine data directory")
                })?;

        Ok(Self {
            path: proj_dirs.data_dir().join(SESSION_FILE),
        })
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn has_session(&self) -> bool {
        self.path.exists()
    }

    pub async fn save(&self, record: &SessionRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .context("Failed to create session directory")?;
        }

        let json = serde_json::to_string_pretty(record)
            .context("Failed to serialize session record")?;

        // Sibling temp file + rename: readers never see a partial record.
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .context("Failed to write session record")?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .context("Failed to replace session record")?;

        log::debug!(
            "[SessionStorage] Stored session for {} (balance {:.2})",
            record.owner_id,
            record.wallet_balance
        );
        Ok(())
    }

    /// `Ok(None)` when no session has been stored.
    pub async fn load(&self) -> Result<Option<SessionRecord>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let json = tokio::fs::read_to_string(&self.path)
            .await
            .context("Failed to read session record")?;
        let record = serde_json::from_str(&json)
            .context("Failed to parse session record")?;
        Ok(Some(record))
    }

    pub async fn clear(&self) -> Result<()> {
        if self.path.exists() {
            tokio::fs::remove_file(&self.path)
                .await
                .context("Failed to remove session record")?;
            log::info!("[SessionStorage] Cleared session record");
        }
        Ok(())
    }
}
