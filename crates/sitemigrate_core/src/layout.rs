use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::snapshot::SNAPSHOT_FILENAME;

/// Filesystem layout of one migration run, all rooted at the output
/// directory: cached media under media/, converted documents under the
/// root itself, and a scratch directory holding the single staging file
/// handed to the converter.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    pub site_root: PathBuf,
    pub media_dir: PathBuf,
    pub scratch_dir: PathBuf,
    pub snapshot_path: PathBuf,
}

impl OutputLayout {
    pub fn new(site_root: impl Into<PathBuf>) -> Self {
        let site_root = site_root.into();
        Self {
            media_dir: site_root.join("media"),
            scratch_dir: site_root.join("scratch"),
            snapshot_path: site_root.join(SNAPSHOT_FILENAME),
            site_root,
        }
    }

    pub fn init(&self) -> Result<()> {
        for dir in [&self.site_root, &self.media_dir, &self.scratch_dir] {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }
        Ok(())
    }

    /// The one staging file reused across conversions. Must be fully
    /// overwritten before each converter invocation; a concurrent variant
    /// would need a file per item instead.
    pub fn staging_file(&self) -> PathBuf {
        self.scratch_dir.join("staging.html")
    }

    /// Final location of a converted document.
    pub fn document_path(&self, processed_path: &str) -> PathBuf {
        self.site_root
            .join(format!("{}.md", processed_path.trim_matches('/')))
    }

    /// Local cache location of a media record (the flattened path).
    pub fn media_path(&self, processed_path: &str) -> PathBuf {
        self.media_dir.join(processed_path.trim_matches('/'))
    }

    pub fn ensure_parent(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        Ok(())
    }
}
