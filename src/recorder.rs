//! Run recorder: persists the subscription artifact and the status record
//!
//! Both files are overwritten on every run. The artifact goes through a
//! sibling temp file and a rename, so readers never see a partial write.

use crate::config::OutputConfig;
use crate::error::Result;
use crate::types::RunStatus;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Writes run outputs to the configured locations
#[derive(Clone, Debug)]
pub struct RunRecorder {
    output: OutputConfig,
}

impl RunRecorder {
    /// Create a recorder for `output`
    pub fn new(output: OutputConfig) -> Self {
        Self { output }
    }

    /// Configured output locations
    pub fn output(&self) -> &OutputConfig {
        &self.output
    }

    /// Replace the artifact with `content`, written verbatim as UTF-8
    pub async fn save_artifact(&self, content: &str) -> Result<()> {
        let target = &self.output.artifact_path;
        ensure_parent(target).await?;

        let temp = temp_sibling(target);
        fs::write(&temp, content.as_bytes()).await?;
        if let Err(e) = fs::rename(&temp, target).await {
            let _ = fs::remove_file(&temp).await;
            return Err(e.into());
        }

        info!(path = %target.display(), bytes = content.len(), "Saved subscription");
        Ok(())
    }

    /// Replace the status record with `status` as pretty-printed JSON
    pub async fn save_status(&self, status: &RunStatus) -> Result<()> {
        let target = &self.output.status_path;
        ensure_parent(target).await?;

        let json = serde_json::to_string_pretty(status)?;
        fs::write(target, json).await?;

        debug!(path = %target.display(), success = status.success, "Saved run status");
        Ok(())
    }
}

async fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).await?;
    }
    Ok(())
}

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "artifact".to_string());
    path.with_file_name(format!(".{}.tmp", name))
}
