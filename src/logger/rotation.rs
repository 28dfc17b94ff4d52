//! Size-based file rotation

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;

use super::config::RotationConfig;
use super::error::LoggerError;

/// Decides when the active file rotates and prunes old rotated files.
pub struct RotationManager {
    config: RotationConfig,
}

impl RotationManager {
    pub fn new(config: RotationConfig) -> Self {
        Self { config }
    }

    pub fn should_rotate(&self, current_file_size: u64) -> bool {
        current_file_size >= self.config.max_size
    }

    /// Renames the active file aside and prunes the oldest rotated files.
    pub fn rotate(&self, current_path: &Path) -> Result<(), LoggerError> {
        if current_path.exists() {
            let rotated = rotated_path(current_path);
            fs::rename(current_path, &rotated).map_err(|e| {
                LoggerError::rotation(format!(
                    "failed to rename {} to {}: {}",
                    current_path.display(),
                    rotated.display(),
                    e
                ))
            })?;
        }
        self.cleanup(current_path)
    }

    fn cleanup(&self, base_path: &Path) -> Result<(), LoggerError> {
        let parent = match base_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let stem = base_path
            .file_stem()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        let prefix = format!("{}.", stem);

        let mut rotated: Vec<PathBuf> = fs::read_dir(parent)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path != base_path
                    && path
                        .file_name()
                        .map(|name| name.to_string_lossy().starts_with(&prefix))
                        .unwrap_or(false)
            })
            .collect();

        // Rotated names embed a sortable timestamp.
        rotated.sort();
        let excess = rotated.len().saturating_sub(self.config.max_files);
        for path in rotated.into_iter().take(excess) {
            fs::remove_file(&path)?;
        }
        Ok(())
    }
}

/// `logs/slotcast.log` -> `logs/slotcast.20250106T083000123.log`
fn rotated_path(base_path: &Path) -> PathBuf {
    let timestamp = Utc::now().format("%Y%m%dT%H%M%S%3f");
    let stem = base_path.file_stem().unwrap_or_default().to_string_lossy();
    let ext = base_path.extension().unwrap_or_default().to_string_lossy();

    let name = if ext.is_empty() {
        format!("{}.{}", stem, timestamp)
    } else {
        format!("{}.{}.{}", stem, timestamp, ext)
    };
    base_path.with_file_name(name)
}
