use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::config::MigrateConfig;
use crate::content::{ContentKind, Site};
use crate::convert::HtmlConverter;
use crate::import::{ImportReport, load_export};
use crate::layout::OutputLayout;
use crate::media::{DiscoveryReport, FetchReport, MediaFetcher, discover_untracked_media};
use crate::resolve::{exceeds_length_threshold, resolve_path};
use crate::rewrite::rewrite_body;
use crate::snapshot::write_snapshot;

#[derive(Debug, Clone, Default, Serialize)]
pub struct MigrationReport {
    pub pages: usize,
    pub posts: usize,
    pub media: usize,
    pub skipped_rows: usize,
    pub synthesized_media: usize,
    /// Pages whose parent chain cycled; resolved as failures, run continues.
    pub resolve_failures: Vec<String>,
    pub long_paths: Vec<String>,
    pub media_saved: usize,
    pub media_cached: usize,
    pub failed_media: Vec<String>,
    pub converted: usize,
    pub failed_conversions: Vec<String>,
    pub conversion_errors: Vec<String>,
    pub rewrite_warnings: Vec<String>,
}

/// Offline stages only: load the export, resolve every path, reconcile
/// media, and write the checkpoint snapshot. Touches no network and runs
/// no converter; the snapshot shows exactly what a full run would do.
pub fn plan_migration(
    export_path: &Path,
    site_host: &str,
    layout: &OutputLayout,
) -> Result<(Site, MigrationReport)> {
    layout.init()?;
    let mut report = MigrationReport::default();
    let site = prepare_site(export_path, site_host, &mut report)?;
    write_snapshot(&site, &layout.snapshot_path)?;
    Ok((site, report))
}

/// The full fixed sequence: load, resolve, discover, checkpoint snapshot,
/// sequential media fetch, rewrite-and-convert every post then page, final
/// snapshot. No stage repeats work and no per-item failure aborts the run.
pub fn run_migration(
    export_path: &Path,
    site_host: &str,
    layout: &OutputLayout,
    config: &MigrateConfig,
    converter: &dyn HtmlConverter,
) -> Result<MigrationReport> {
    layout.init()?;
    let mut report = MigrationReport::default();
    let mut site = prepare_site(export_path, site_host, &mut report)?;

    // Checkpoint before the slow network phase starts.
    write_snapshot(&site, &layout.snapshot_path)?;

    let fetcher = MediaFetcher::new(config)?;
    let fetch = fetcher.fetch_all(&mut site, &layout.media_dir)?;
    record_fetch(&fetch, &mut report);

    convert_documents(&mut site, layout, converter, &mut report)?;
    report.failed_conversions = site.failed_conversions.clone();

    write_snapshot(&site, &layout.snapshot_path)?;
    Ok(report)
}

/// Steps shared by plan and run: load → resolve → discover.
fn prepare_site(
    export_path: &Path,
    site_host: &str,
    report: &mut MigrationReport,
) -> Result<Site> {
    let mut site = Site::new(site_host);
    let import = load_export(export_path, &mut site)?;
    record_import(&import, &site, report);

    resolve_all(&mut site, report);

    let discovery = discover_untracked_media(&mut site);
    record_discovery(&discovery, &site, report);

    Ok(site)
}

/// Resolve `processed_path` for every record. Recursion inside the page
/// resolver handles ordering, so each collection is walked front to back.
/// A cycle fails only the record it was found on.
fn resolve_all(site: &mut Site, report: &mut MigrationReport) {
    for kind in [ContentKind::Page, ContentKind::Post, ContentKind::Attachment] {
        for index in 0..site.collection(kind).len() {
            let result = resolve_path(&site.collection(kind)[index], site);
            match result {
                Ok(path) => {
                    if exceeds_length_threshold(&path) {
                        report.long_paths.push(path.clone());
                    }
                    site.collection_mut(kind)[index].processed_path = path;
                }
                Err(error) => report.resolve_failures.push(error.to_string()),
            }
        }
    }
}

/// Step 6: for every post then page, rewrite the body into
/// `processed_content`, stage it to the shared scratch file, and hand it
/// to the converter. Conversion failures are recorded per item.
fn convert_documents(
    site: &mut Site,
    layout: &OutputLayout,
    converter: &dyn HtmlConverter,
    report: &mut MigrationReport,
) -> Result<()> {
    let staging = layout.staging_file();

    for kind in [ContentKind::Post, ContentKind::Page] {
        for index in 0..site.collection(kind).len() {
            let outcome = rewrite_body(&site.collection(kind)[index].raw_content, site);
            report.rewrite_warnings.extend(outcome.warnings);

            let processed_path = site.collection(kind)[index].processed_path.clone();
            site.collection_mut(kind)[index].processed_content = outcome.body.clone();

            // Records that never resolved (cycles) have nothing to write.
            if processed_path.trim_matches('/').is_empty() {
                continue;
            }

            let output = layout.document_path(&processed_path);
            OutputLayout::ensure_parent(&output)?;
            // The staging file is shared across the whole run and fully
            // overwritten for each item.
            fs::write(&staging, &outcome.body)
                .with_context(|| format!("failed to stage {}", staging.display()))?;

            match converter.convert(&staging, &output) {
                Ok(()) => report.converted += 1,
                Err(error) => {
                    site.failed_conversions.push(processed_path.clone());
                    report
                        .conversion_errors
                        .push(format!("{processed_path}: {error:#}"));
                }
            }
        }
    }

    Ok(())
}

fn record_import(import: &ImportReport, site: &Site, report: &mut MigrationReport) {
    report.pages = site.pages.len();
    report.posts = site.posts.len();
    report.media = site.media.len();
    report.skipped_rows = import.rows - import.imported;
}

fn record_discovery(discovery: &DiscoveryReport, site: &Site, report: &mut MigrationReport) {
    report.synthesized_media = discovery.synthesized.len();
    report.media = site.media.len();
}

fn record_fetch(fetch: &FetchReport, report: &mut MigrationReport) {
    report.media_saved = fetch.saved;
    report.media_cached = fetch.already_cached;
    report.failed_media = fetch.failed.clone();
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use anyhow::Result;
    use tempfile::tempdir;

    use super::*;
    use crate::snapshot::read_snapshot;

    /// Stands in for pandoc: copies the staged body to the output path.
    struct CopyConverter;

    impl HtmlConverter for CopyConverter {
        fn convert(&self, input: &Path, output: &Path) -> Result<()> {
            fs::copy(input, output)?;
            Ok(())
        }
    }

    /// Fails every invocation, for exercising the per-item failure path.
    struct BrokenConverter;

    impl HtmlConverter for BrokenConverter {
        fn convert(&self, _input: &Path, _output: &Path) -> Result<()> {
            anyhow::bail!("converter unavailable")
        }
    }

    const HEADER: &str = "ID,post_parent,post_title,post_content,author,post_date,post_modified,post_status,post_name,guid,post_type,post_mime_type";

    fn write_export(dir: &Path, rows: &[String]) -> std::path::PathBuf {
        let path = dir.join("siteData.csv");
        let mut content = String::from(HEADER);
        for row in rows {
            content.push('\n');
            content.push_str(row);
        }
        fs::write(&path, content).expect("write export");
        path
    }

    fn page_row(id: i64, parent: i64, name: &str, body: &str) -> String {
        format!(
            r#"{id},{parent},{name},"{body}",Ann,2020-01-01 00:00:00,2020-01-01 00:00:00,publish,{name},http://example.org/?page_id={id},page,"#
        )
    }

    fn post_row(id: i64, name: &str, body: &str) -> String {
        format!(
            r#"{id},0,{name},"{body}",Ann,2020-01-01 00:00:00,2020-01-01 00:00:00,publish,{name},http://example.org/?p={id},post,"#
        )
    }

    fn attachment_row(id: i64, name: &str, guid: &str) -> String {
        format!(
            r#"{id},0,{name},,Ann,2020-01-01 00:00:00,2020-01-01 00:00:00,inherit,{name},{guid},attachment,image/jpeg"#
        )
    }

    #[test]
    fn full_run_produces_documents_media_and_snapshot() {
        let temp = tempdir().expect("tempdir");
        let layout = OutputLayout::new(temp.path().join("site"));

        let export = write_export(
            temp.path(),
            &[
                page_row(
                    1,
                    0,
                    "docs",
                    r#"<p><a href=""http://example.org/docs/setup"">setup</a> <img src=""http://example.org/wp-content/uploads/2020/01/photo.jpg""></p>"#,
                ),
                page_row(2, 1, "docs-setup", "<p>setup body</p>"),
                post_row(3, "hello-world", "<p>first post</p>"),
                attachment_row(
                    4,
                    "photo",
                    "http://example.org/wp-content/uploads/2020/01/photo.jpg",
                ),
            ],
        );

        // Seed the media cache so the sequential fetch phase skips the
        // network entirely.
        layout.init().expect("init");
        let cache = layout.media_path("/2020/01/photo.jpg");
        fs::create_dir_all(cache.parent().expect("parent")).expect("media dirs");
        fs::write(&cache, b"jpeg bytes").expect("seed cache");

        let report = run_migration(
            &export,
            "example.org",
            &layout,
            &MigrateConfig::default(),
            &CopyConverter,
        )
        .expect("run");

        assert_eq!(report.pages, 2);
        assert_eq!(report.posts, 1);
        assert_eq!(report.media, 1);
        assert_eq!(report.media_cached, 1);
        assert_eq!(report.media_saved, 0);
        assert!(report.failed_media.is_empty());
        assert_eq!(report.converted, 3);

        // Posts under /news, pages at their resolved hierarchy, with the
        // redundant "docs-" prefix collapsed.
        assert!(layout.document_path("/news/hello-world").is_file());
        assert!(layout.document_path("/docs").is_file());
        assert!(layout.document_path("/docs/setup").is_file());

        // The staged/converted body carries the rewritten references.
        let converted = fs::read_to_string(layout.document_path("/docs")).expect("read");
        assert!(converted.contains(r#""/docs/setup.md""#));
        assert!(converted.contains(r#""/media/2020/01/photo.jpg""#));

        let snapshot = read_snapshot(&layout.snapshot_path).expect("snapshot");
        assert_eq!(snapshot.pages.len(), 2);
        assert!(snapshot.failed_conversions.is_empty());
        assert!(!snapshot.pages[0].processed_content.is_empty());
    }

    #[test]
    fn plan_writes_checkpoint_without_fetch_or_convert() {
        let temp = tempdir().expect("tempdir");
        let layout = OutputLayout::new(temp.path().join("site"));

        let export = write_export(
            temp.path(),
            &[page_row(
                1,
                0,
                "home",
                r#"<img src=""/wp-content/uploads/banner.png"">"#,
            )],
        );

        let (site, report) = plan_migration(&export, "example.org", &layout).expect("plan");

        assert_eq!(report.synthesized_media, 1);
        assert_eq!(site.media.len(), 1);
        assert_eq!(site.media[0].processed_path, "/banner.png");
        assert!(layout.snapshot_path.is_file());
        // Nothing fetched, nothing converted.
        assert!(!layout.document_path("/home").exists());
        assert!(fs::read_dir(&layout.media_dir).expect("media dir").next().is_none());
    }

    #[test]
    fn conversion_failures_are_collected_per_item() {
        let temp = tempdir().expect("tempdir");
        let layout = OutputLayout::new(temp.path().join("site"));

        let export = write_export(
            temp.path(),
            &[
                post_row(1, "one", "<p>a</p>"),
                post_row(2, "two", "<p>b</p>"),
            ],
        );

        let report = run_migration(
            &export,
            "example.org",
            &layout,
            &MigrateConfig::default(),
            &BrokenConverter,
        )
        .expect("run");

        assert_eq!(report.converted, 0);
        assert_eq!(report.failed_conversions, vec!["/news/one", "/news/two"]);
        assert_eq!(report.conversion_errors.len(), 2);

        let snapshot = read_snapshot(&layout.snapshot_path).expect("snapshot");
        assert_eq!(snapshot.failed_conversions.len(), 2);
    }

    #[test]
    fn cyclic_pages_fail_alone_and_the_run_completes() {
        let temp = tempdir().expect("tempdir");
        let layout = OutputLayout::new(temp.path().join("site"));

        let export = write_export(
            temp.path(),
            &[
                page_row(1, 2, "a", "<p>a</p>"),
                page_row(2, 1, "b", "<p>b</p>"),
                page_row(3, 0, "sane", "<p>fine</p>"),
            ],
        );

        let report = run_migration(
            &export,
            "example.org",
            &layout,
            &MigrateConfig::default(),
            &CopyConverter,
        )
        .expect("run");

        assert_eq!(report.resolve_failures.len(), 2);
        assert_eq!(report.converted, 1);
        assert!(layout.document_path("/sane").is_file());
    }
}
