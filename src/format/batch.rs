//! Per-folder batch processing over a dataset root.
//!
//! Each immediate subdirectory of the root is one scene. A failure in one
//! folder is logged and recorded; processing continues with the next one.

use std::path::{Path, PathBuf};

use crate::format::error::FormatError;

/// Result of processing one scene folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FolderOutcome {
    /// Folder processed; the paths written.
    Processed(Vec<PathBuf>),
    /// A required input was missing.
    Skipped(String),
}

/// Summary of a batch run.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Folders processed and the files written for each.
    pub processed: Vec<(PathBuf, Vec<PathBuf>)>,
    /// Folders skipped, with the reason.
    pub skipped: Vec<(PathBuf, String)>,
    /// Folders that failed, with the error.
    pub failed: Vec<(PathBuf, FormatError)>,
}

impl BatchReport {
    /// Number of files written across all folders.
    pub fn files_written(&self) -> usize {
        self.processed.iter().map(|(_, files)| files.len()).sum()
    }

    /// Whether any folder failed.
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

/// Run `process` on every subdirectory of `root`, in name order.
///
/// Only an unreadable root is an error; per-folder errors go into the report.
pub fn for_each_scene<F>(root: &Path, mut process: F) -> Result<BatchReport, FormatError>
where
    F: FnMut(&Path) -> Result<FolderOutcome, FormatError>,
{
    if !root.is_dir() {
        return Err(FormatError::not_found(root));
    }

    let mut folders = Vec::new();
    for entry in std::fs::read_dir(root)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            folders.push(entry.path());
        }
    }
    folders.sort();

    let mut report = BatchReport::default();
    for folder in folders {
        match process(&folder) {
            Ok(FolderOutcome::Processed(files)) => {
                for file in &files {
                    log::info!("Saved {:?}", file);
                }
                report.processed.push((folder, files));
            }
            Ok(FolderOutcome::Skipped(reason)) => {
                log::warn!("Skipping {:?}: {}", folder, reason);
                report.skipped.push((folder, reason));
            }
            Err(e) => {
                log::error!("Error processing {:?}: {}", folder, e);
                report.failed.push((folder, e));
            }
        }
    }

    log::info!(
        "Batch finished: {} processed, {} skipped, {} failed",
        report.processed.len(),
        report.skipped.len(),
        report.failed.len()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_failures_are_isolated() {
        let root = TempDir::new().unwrap();
        for name in ["a", "b", "c"] {
            std::fs::create_dir(root.path().join(name)).unwrap();
        }
        std::fs::write(root.path().join("file.txt"), b"").unwrap();

        let mut seen = Vec::new();
        let report = for_each_scene(root.path(), |folder| {
            let name = folder.file_name().unwrap().to_string_lossy().into_owned();
            seen.push(name.clone());
            match name.as_str() {
                "a" => Err(FormatError::not_found(folder.join("x"))),
                "b" => Ok(FolderOutcome::Skipped("nothing to do".to_string())),
                _ => Ok(FolderOutcome::Processed(vec![folder.join("out.json")])),
            }
        })
        .unwrap();

        assert_eq!(seen, vec!["a", "b", "c"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.processed.len(), 1);
        assert_eq!(report.files_written(), 1);
        assert!(report.has_failures());
    }

    #[test]
    fn test_missing_root() {
        let root = TempDir::new().unwrap();
        let result = for_each_scene(&root.path().join("missing"), |_| {
            Ok(FolderOutcome::Skipped(String::new()))
        });
        assert!(result.is_err());
    }
}
