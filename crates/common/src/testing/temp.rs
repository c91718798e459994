//! Scratch directories for store tests
//!
//! Unlike `tempfile::TempDir`, the directory name carries a readable prefix
//! and a helper hands out store file paths inside it, so a failing test
//! leaves behind something recognisable when kept.

#![allow(clippy::missing_errors_doc)]

use std::path::{Path, PathBuf};
use std::{fs, io};

/// Temporary directory removed on drop
///
/// ```
/// use bunq_common::testing::TempDir;
///
/// let dir = TempDir::new("store").unwrap();
/// let path = dir.store_path("bunq.json");
/// assert!(path.starts_with(dir.path()));
/// ```
#[derive(Debug)]
pub struct TempDir {
    path: PathBuf,
}

impl TempDir {
    /// Create `<tmp>/<prefix>-<uuid>`
    pub fn new(prefix: &str) -> io::Result<Self> {
        let path = std::env::temp_dir().join(format!("{}-{}", prefix, uuid::Uuid::new_v4()));
        fs::create_dir_all(&path)?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path for a store file inside the directory; the file is not created
    pub fn store_path(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }

    /// Write `contents` to `name` inside the directory
    pub fn write_file(&self, name: &str, contents: &str) -> io::Result<PathBuf> {
        let path = self.path.join(name);
        fs::write(&path, contents)?;
        Ok(path)
    }

    /// Parse a JSON file inside the directory
    pub fn read_json(&self, name: &str) -> io::Result<serde_json::Value> {
        let bytes = fs::read(self.path.join(name))?;
        serde_json::from_slice(&bytes).map_err(io::Error::from)
    }

    /// Disable cleanup and return the path, for inspecting a failed run
    pub fn keep(mut self) -> PathBuf {
        std::mem::take(&mut self.path)
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        if !self.path.as_os_str().is_empty() && self.path.exists() {
            let _ = fs::remove_dir_all(&self.path);
        }
    }
}
