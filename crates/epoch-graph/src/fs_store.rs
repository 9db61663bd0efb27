//! Filesystem implementation of person storage
//!
//! Person records are JSON files laid out as `<root>/<shard>/<id>.json`,
//! where the shard is derived from the identifier (see [`crate::shard_for`]).

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use epoch_core::{EpochError, PersonEntity, PersonSource, Result, StorageConfig};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::shard_for;

/// Hash-sharded directory of person records
#[derive(Debug, Clone)]
pub struct FsPersonStore {
    root: PathBuf,
    person_prefix: String,
    file_extension: String,
}

impl FsPersonStore {
    /// Create a store over the configured persons directory
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            root: config.persons_dir.clone(),
            person_prefix: config.person_prefix.clone(),
            file_extension: config.file_extension.clone(),
        }
    }

    /// Create a store with default naming under `root`
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self::new(&StorageConfig {
            persons_dir: root.into(),
            ..Default::default()
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where the record for `id` lives
    pub fn path_for(&self, id: &str) -> PathBuf {
        self.root
            .join(shard_for(id))
            .join(format!("{id}.{}", self.file_extension))
    }

    /// Write a person record to its shard
    pub async fn save_person(&self, person: &PersonEntity) -> Result<()> {
        let path = self.path_for(&person.id);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_vec_pretty(person)
            .map_err(|e| EpochError::Serialization(format!("Failed to encode {}: {e}", person.id)))?;
        tokio::fs::write(&path, json).await?;
        Ok(())
    }

    fn scan(&self) -> Result<Vec<String>> {
        if !self.root.is_dir() {
            return Err(EpochError::StorageUnavailable(format!(
                "{} is not a directory",
                self.root.display()
            )));
        }

        let mut ids = Vec::new();
        for entry in WalkDir::new(&self.root).follow_links(false).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => {
                    return Err(EpochError::StorageUnavailable(format!(
                        "Failed to read {}: {e}",
                        self.root.display()
                    )));
                }
                Err(e) => {
                    warn!(error = %e, "skipping unreadable directory entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(self.file_extension.as_str()) {
                continue;
            }
            match path.file_stem().and_then(|s| s.to_str()) {
                Some(stem) if stem.starts_with(&self.person_prefix) => {
                    let expected = self.path_for(stem);
                    if path != expected {
                        warn!(
                            path = %path.display(),
                            expected = %expected.display(),
                            "person file outside its shard, skipping"
                        );
                        continue;
                    }
                    ids.push(stem.to_string());
                }
                _ => debug!(path = %path.display(), "ignoring non-person file"),
            }
        }
        Ok(ids)
    }
}

#[async_trait]
impl PersonSource for FsPersonStore {
    async fn list_persons(&self) -> Result<Vec<String>> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.scan())
            .await
            .map_err(|e| EpochError::StorageUnavailable(format!("Directory scan aborted: {e}")))?
    }

    async fn load_person(&self, id: &str) -> Result<PersonEntity> {
        let path = self.path_for(id);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(EpochError::NotFound(id.to_string()));
            }
            Err(e) => {
                return Err(EpochError::MalformedRecord {
                    id: id.to_string(),
                    reason: format!("cannot read {}: {e}", path.display()),
                });
            }
        };

        let person: PersonEntity =
            serde_json::from_str(&content).map_err(|e| EpochError::MalformedRecord {
                id: id.to_string(),
                reason: format!("cannot parse {}: {e}", path.display()),
            })?;

        if person.id != id {
            warn!(file = id, record = %person.id, "person id differs from file name");
        }
        Ok(person)
    }

    fn name(&self) -> &str {
        "filesystem"
    }
}
