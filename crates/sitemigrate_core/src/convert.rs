use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result, bail};

pub const DEFAULT_PANDOC_BINARY: &str = "pandoc";

/// The document converter boundary: hand it a staged input file and the
/// desired output location, get a Markdown file or an error. Narrow on
/// purpose so tests can inject a fake that never shells out.
pub trait HtmlConverter {
    fn convert(&self, input: &Path, output: &Path) -> Result<()>;
}

/// Converts via the pandoc binary. File paths rather than piped bodies:
/// large inline markup does not survive argument passing reliably, so
/// pandoc reads and writes files itself.
pub struct PandocConverter {
    binary: String,
}

impl PandocConverter {
    pub fn new(binary: &str) -> Self {
        Self {
            binary: binary.to_string(),
        }
    }
}

impl Default for PandocConverter {
    fn default() -> Self {
        Self::new(DEFAULT_PANDOC_BINARY)
    }
}

impl HtmlConverter for PandocConverter {
    fn convert(&self, input: &Path, output: &Path) -> Result<()> {
        let result = Command::new(&self.binary)
            .args(["-f", "html", "-t", "gfm-raw_html", "--wrap=none"])
            .arg(input)
            .arg("-o")
            .arg(output)
            .output()
            .with_context(|| format!("failed to launch {}", self.binary))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            bail!(
                "{} exited with {} converting {}: {}",
                self.binary,
                result.status,
                input.display(),
                stderr.trim()
            );
        }
        Ok(())
    }
}
