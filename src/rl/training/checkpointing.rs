//! Model Checkpointing
//!
//! Save and rotate learned agent parameters on disk. Checkpoints are named
//! `<prefix>_ep<episode>.json`; other files in the directory are left alone.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::{ArbError, Result};

const EXTENSION: &str = "json";

/// Checkpointer for saving and loading agents
#[derive(Debug, Clone)]
pub struct Checkpointer {
    /// Directory for checkpoints
    checkpoint_dir: PathBuf,
    /// Maximum checkpoints to keep
    max_checkpoints: usize,
}

impl Checkpointer {
    /// Create a new checkpointer, creating the directory if needed
    pub fn new<P: AsRef<Path>>(checkpoint_dir: P, max_checkpoints: usize) -> Result<Self> {
        let checkpoint_dir = checkpoint_dir.as_ref().to_path_buf();

        if !checkpoint_dir.exists() {
            fs::create_dir_all(&checkpoint_dir).map_err(|e| {
                ArbError::Checkpoint(format!(
                    "cannot create checkpoint directory {}: {}",
                    checkpoint_dir.display(),
                    e
                ))
            })?;
        }

        Ok(Self {
            checkpoint_dir,
            max_checkpoints: max_checkpoints.max(1),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.checkpoint_dir
    }

    /// Get checkpoint path for a given name
    pub fn checkpoint_path(&self, name: &str) -> PathBuf {
        self.checkpoint_dir.join(format!("{}.{}", name, EXTENSION))
    }

    /// Save a checkpoint through `write`, which receives the target path
    pub fn save_with<F>(&self, name: &str, write: F) -> Result<PathBuf>
    where
        F: FnOnce(&Path) -> Result<()>,
    {
        let path = self.checkpoint_path(name);
        write(&path)?;

        info!("Saved checkpoint to {:?}", path);

        self.cleanup_old_checkpoints();

        Ok(path)
    }

    /// List available checkpoints, lowest episode first
    pub fn list_checkpoints(&self) -> Vec<String> {
        let suffix = format!(".{}", EXTENSION);
        let mut checkpoints = Vec::new();

        if let Ok(entries) = fs::read_dir(&self.checkpoint_dir) {
            for entry in entries.flatten() {
                if let Some(name) = entry.file_name().to_str() {
                    if let Some(stem) = name.strip_suffix(&suffix) {
                        if let Some(episode) = parse_episode(stem) {
                            checkpoints.push((episode, stem.to_string()));
                        }
                    }
                }
            }
        }

        checkpoints.sort();
        checkpoints.into_iter().map(|(_, name)| name).collect()
    }

    /// Get latest checkpoint name
    pub fn latest_checkpoint(&self) -> Option<String> {
        self.list_checkpoints().into_iter().last()
    }

    /// Path of the latest checkpoint, if any
    pub fn latest_path(&self) -> Option<PathBuf> {
        self.latest_checkpoint().map(|name| self.checkpoint_path(&name))
    }

    /// Cleanup old checkpoints keeping only max_checkpoints
    fn cleanup_old_checkpoints(&self) {
        let checkpoints = self.list_checkpoints();

        if checkpoints.len() <= self.max_checkpoints {
            return;
        }

        let to_remove = checkpoints.len() - self.max_checkpoints;
        for name in checkpoints.into_iter().take(to_remove) {
            let path = self.checkpoint_path(&name);
            if let Err(e) = fs::remove_file(&path) {
                warn!("Failed to remove old checkpoint {:?}: {}", path, e);
            } else {
                info!("Removed old checkpoint: {}", name);
            }
        }
    }

    /// Check if a checkpoint exists
    pub fn exists(&self, name: &str) -> bool {
        self.checkpoint_path(name).exists()
    }
}

/// Generate a checkpoint name with episode number
pub fn episode_name(prefix: &str, episode: usize) -> String {
    format!("{}_ep{:06}", prefix, episode)
}

/// Episode number of a name produced by `episode_name`
pub fn parse_episode(name: &str) -> Option<usize> {
    let (prefix, digits) = name.rsplit_once("_ep")?;
    if prefix.is_empty() || digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
