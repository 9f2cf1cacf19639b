use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use reqwest::blocking::Client;
use serde::Serialize;

use crate::config::MigrateConfig;
use crate::content::{ContentKind, ContentRecord, SYNTHETIC_ID, Site};
use crate::links::{filename_stem, image_sources, is_local, strip_protocol};
use crate::resolve::attachment_path;

/// Author recorded on media records synthesized during discovery, so
/// snapshots show which records never existed in the export.
pub const SYNTHETIC_AUTHOR: &str = "sitemigrate";

#[derive(Debug, Clone, Default, Serialize)]
pub struct DiscoveryReport {
    pub scanned_documents: usize,
    pub foreign_references: usize,
    /// Guids of the synthetic records appended to the media collection.
    pub synthesized: Vec<String>,
}

/// Scan every page and post body for image references the export does not
/// account for, and append a synthetic media record for each. Matching is
/// by substring containment of the protocol-stripped reference against
/// known guids, so http/https and query-string variance cannot produce
/// duplicates. Running discovery twice over an unchanged graph adds
/// nothing: the first pass's synthetic records satisfy the containment
/// check on the second.
pub fn discover_untracked_media(site: &mut Site) -> DiscoveryReport {
    let mut report = DiscoveryReport::default();

    let mut candidates = Vec::new();
    for record in site.pages.iter().chain(site.posts.iter()) {
        report.scanned_documents += 1;
        candidates.extend(image_sources(&record.raw_content));
    }

    for reference in candidates {
        if !is_local(&reference, &site.site_host) {
            report.foreign_references += 1;
            continue;
        }

        let normalized = strip_protocol(&reference).to_string();
        let known = site.media.iter().any(|media| media.guid.contains(&normalized));
        if known {
            continue;
        }

        let name = filename_stem(&reference);
        let mut record = ContentRecord {
            id: SYNTHETIC_ID,
            kind: ContentKind::Attachment,
            title: name.clone(),
            author: SYNTHETIC_AUTHOR.to_string(),
            created_at: Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            status: "inherit".to_string(),
            name,
            guid: reference.clone(),
            parent_id: 0,
            raw_content: String::new(),
            processed_content: String::new(),
            processed_path: String::new(),
        };
        record.processed_path = attachment_path(&record.guid);

        report.synthesized.push(reference);
        site.media.push(record);
    }

    report
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct FetchReport {
    pub total: usize,
    pub saved: usize,
    pub already_cached: usize,
    pub failed: Vec<String>,
}

enum FetchOutcome {
    Saved,
    AlreadyCached,
}

/// Blocking media downloader. Fetches run strictly one at a time: the
/// origin server cannot tolerate concurrent load.
pub struct MediaFetcher {
    client: Client,
    user_agent: String,
}

impl MediaFetcher {
    pub fn new(config: &MigrateConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms()))
            .build()
            .context("failed to build media HTTP client")?;
        Ok(Self {
            client,
            user_agent: config.user_agent(),
        })
    }

    /// Fetch every media record into `media_dir`. A record whose cache
    /// file already exists is skipped without touching the network, which
    /// makes interrupted runs resumable. Individual failures land in
    /// `site.failed_media` and never abort the loop.
    pub fn fetch_all(&self, site: &mut Site, media_dir: &Path) -> Result<FetchReport> {
        fs::create_dir_all(media_dir)
            .with_context(|| format!("failed to create {}", media_dir.display()))?;

        let mut report = FetchReport {
            total: site.media.len(),
            ..FetchReport::default()
        };

        let mut failed = Vec::new();
        for media in &site.media {
            match self.fetch_one(media, &site.site_host, media_dir) {
                Ok(FetchOutcome::Saved) => report.saved += 1,
                Ok(FetchOutcome::AlreadyCached) => report.already_cached += 1,
                Err(_) => failed.push(media.guid.clone()),
            }
        }
        report.failed = failed.clone();
        site.failed_media.extend(failed);

        Ok(report)
    }

    fn fetch_one(
        &self,
        media: &ContentRecord,
        site_host: &str,
        media_dir: &Path,
    ) -> Result<FetchOutcome> {
        if media.processed_path.trim_matches('/').is_empty() {
            bail!("media {} has no resolved path", media.guid);
        }
        let local_path = media_dir.join(media.processed_path.trim_matches('/'));
        if local_path.exists() {
            return Ok(FetchOutcome::AlreadyCached);
        }

        let url = if media.guid.contains("http") {
            media.guid.clone()
        } else {
            format!("https://{}/{}", site_host, media.guid.trim_start_matches('/'))
        };

        if let Some(parent) = local_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let response = self
            .client
            .get(&url)
            .header("User-Agent", self.user_agent.clone())
            .send()
            .with_context(|| format!("failed to fetch {url}"))?;
        let status = response.status();
        if !status.is_success() {
            bail!("HTTP {} while fetching {url}", status.as_u16());
        }
        let bytes = response
            .bytes()
            .with_context(|| format!("failed to read body of {url}"))?;
        fs::write(&local_path, &bytes)
            .with_context(|| format!("failed to write {}", local_path.display()))?;

        Ok(FetchOutcome::Saved)
    }
}
