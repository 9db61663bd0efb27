//! Knowledge base snapshots and run summaries
//!
//! Snapshots hold the extracted evidence table so a later run can
//! reclassify without scanning the corpus again.

use std::path::{Path, PathBuf};

use epoch_core::{EpochError, KnowledgeBase, KnowledgeSnapshot, Result, RunSummary};
use tracing::info;

/// JSON snapshot file of a knowledge base
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist the evidence table
    ///
    /// The file is written beside the target and renamed into place, so a
    /// reader never sees a partial snapshot.
    pub async fn save(&self, kb: &KnowledgeBase) -> Result<()> {
        let snapshot = kb.snapshot();
        let json = serde_json::to_vec_pretty(&snapshot)
            .map_err(|e| EpochError::Serialization(format!("Failed to encode snapshot: {e}")))?;

        write_atomically(&self.path, &json).await?;
        info!(path = %self.path.display(), persons = snapshot.persons.len(), "saved knowledge base");
        Ok(())
    }

    /// Read a snapshot back
    pub async fn load(&self) -> Result<KnowledgeSnapshot> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            EpochError::StorageUnavailable(format!(
                "Failed to read snapshot {}: {e}",
                self.path.display()
            ))
        })?;

        let snapshot: KnowledgeSnapshot = serde_json::from_str(&content).map_err(|e| {
            EpochError::Serialization(format!(
                "Failed to parse snapshot {}: {e}",
                self.path.display()
            ))
        })?;

        if snapshot.version > KnowledgeSnapshot::CURRENT_VERSION {
            return Err(EpochError::Serialization(format!(
                "Snapshot version {} is newer than supported version {}",
                snapshot.version,
                KnowledgeSnapshot::CURRENT_VERSION
            )));
        }
        Ok(snapshot)
    }
}

/// Write the run summary as pretty JSON
pub async fn write_summary(path: &Path, summary: &RunSummary) -> Result<()> {
    let json = serde_json::to_vec_pretty(summary)
        .map_err(|e| EpochError::Serialization(format!("Failed to encode summary: {e}")))?;
    write_atomically(path, &json).await
}

pub(crate) async fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}
