//! Atomic file operations against the output directory

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::atomic::write_atomic;
use crate::config::DeletePolicy;
use crate::error::Result;

/// Writes and removes note files in the output directory
#[derive(Debug, Clone)]
pub struct FileOperationExecutor {
    output_dir: PathBuf,
    on_delete: DeletePolicy,
}

impl FileOperationExecutor {
    /// Create a new executor
    #[must_use]
    pub const fn new(output_dir: PathBuf, on_delete: DeletePolicy) -> Self {
        Self {
            output_dir,
            on_delete,
        }
    }

    /// Full path of a destination file
    #[must_use]
    pub fn destination(&self, name: &str) -> PathBuf {
        self.output_dir.join(name)
    }

    /// Whether a destination file currently exists
    #[must_use]
    pub fn exists(&self, name: &str) -> bool {
        self.destination(name).is_file()
    }

    /// Names of regular files in the output directory, sorted
    ///
    /// A missing output directory yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory exists but cannot be listed.
    pub fn list(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(&self.output_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to list output directory: {}", self.output_dir.display())
                });
            }
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.with_context(|| {
                format!("Failed to read entry in: {}", self.output_dir.display())
            })?;
            if entry.file_type().is_ok_and(|t| t.is_file())
                && let Some(name) = entry.file_name().to_str()
            {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Write a note atomically, replacing any previous version
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write(&self, name: &str, bytes: &[u8]) -> Result<PathBuf> {
        let dest = self.destination(name);
        write_atomic(&dest, bytes)?;
        Ok(dest)
    }

    /// Apply the delete policy to a destination file
    ///
    /// Returns `true` if a file was removed. A file that is already gone is
    /// not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be removed.
    pub fn remove(&self, name: &str) -> Result<bool> {
        if self.on_delete == DeletePolicy::Retain {
            return Ok(false);
        }

        let dest = self.destination(name);
        match fs::remove_file(&dest) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_context(|| format!("Failed to remove {}", dest.display())),
        }
    }

    /// Output directory
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Configured delete policy
    #[must_use]
    pub const fn on_delete(&self) -> DeletePolicy {
        self.on_delete
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_and_remove() {
        let tmp = TempDir::new().unwrap();
        let executor = FileOperationExecutor::new(tmp.path().join("out"), DeletePolicy::Remove);

        let dest = executor.write("a.md", b"Hello").unwrap();
        assert_eq!(fs::read_to_string(&dest).unwrap(), "Hello");
        assert!(executor.exists("a.md"));

        assert!(executor.remove("a.md").unwrap());
        assert!(!executor.exists("a.md"));
        assert!(!executor.remove("a.md").unwrap());
    }

    #[test]
    fn test_retain_policy_keeps_file() {
        let tmp = TempDir::new().unwrap();
        let executor = FileOperationExecutor::new(tmp.path().to_path_buf(), DeletePolicy::Retain);

        executor.write("a.md", b"Hello").unwrap();
        assert!(!executor.remove("a.md").unwrap());
        assert!(executor.exists("a.md"));
    }

    #[test]
    fn test_list_output_files() {
        let tmp = TempDir::new().unwrap();
        let executor = FileOperationExecutor::new(tmp.path().join("out"), DeletePolicy::Remove);
        assert!(executor.list().unwrap().is_empty());

        executor.write("b.md", b"b").unwrap();
        executor.write("a.md", b"a").unwrap();
        fs::create_dir(tmp.path().join("out/sub")).unwrap();

        assert_eq!(executor.list().unwrap(), vec!["a.md", "b.md"]);
    }
}
