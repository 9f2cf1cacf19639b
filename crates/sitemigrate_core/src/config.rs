use std::env;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_USER_AGENT: &str = "sitemigrate/0.2";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Runtime configuration, loaded from a TOML file when one exists.
/// Environment variables override file values; CLI flags override both.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct MigrateConfig {
    #[serde(default)]
    pub site: SiteSection,
    #[serde(default)]
    pub http: HttpSection,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct SiteSection {
    /// Base host of the exported site, used to tell local references from
    /// foreign ones (e.g. "example.org").
    pub host: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct HttpSection {
    pub user_agent: Option<String>,
    pub timeout_ms: Option<u64>,
}

impl MigrateConfig {
    /// Resolve the site host: env SITEMIGRATE_SITE_HOST > config > None.
    pub fn site_host(&self) -> Option<String> {
        if let Ok(value) = env::var("SITEMIGRATE_SITE_HOST") {
            let trimmed = value.trim().to_string();
            if !trimmed.is_empty() {
                return Some(trimmed);
            }
        }
        self.site.host.clone()
    }

    /// Resolve user agent: env SITEMIGRATE_USER_AGENT > config > default.
    pub fn user_agent(&self) -> String {
        if let Ok(value) = env::var("SITEMIGRATE_USER_AGENT") {
            let trimmed = value.trim().to_string();
            if !trimmed.is_empty() {
                return trimmed;
            }
        }
        self.http
            .user_agent
            .clone()
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string())
    }

    /// Resolve fetch timeout: env SITEMIGRATE_HTTP_TIMEOUT_MS > config > default.
    pub fn timeout_ms(&self) -> u64 {
        if let Some(value) = env::var("SITEMIGRATE_HTTP_TIMEOUT_MS")
            .ok()
            .and_then(|value| value.trim().parse::<u64>().ok())
        {
            return value;
        }
        self.http.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS)
    }
}

/// Load a MigrateConfig from a TOML file. Returns default when the file
/// does not exist.
pub fn load_config(config_path: &Path) -> Result<MigrateConfig> {
    if !config_path.exists() {
        return Ok(MigrateConfig::default());
    }
    let content = fs::read_to_string(config_path)
        .with_context(|| format!("failed to read {}", config_path.display()))?;
    let parsed: MigrateConfig = toml::from_str(&content)
        .with_context(|| format!("failed to parse {}", config_path.display()))?;
    Ok(parsed)
}
