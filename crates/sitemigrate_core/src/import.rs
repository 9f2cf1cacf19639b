use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::content::{ContentKind, ContentRecord, Site};

/// One row of the database dump. Column names follow the export query
/// verbatim so the CSV header maps directly onto the struct.
#[derive(Debug, Deserialize)]
struct ExportRow {
    #[serde(rename = "ID")]
    id: i64,
    #[serde(rename = "post_parent")]
    parent_id: i64,
    #[serde(rename = "post_title")]
    title: String,
    #[serde(rename = "post_content")]
    raw_content: String,
    #[serde(rename = "author")]
    author: String,
    #[serde(rename = "post_date")]
    created_at: String,
    #[serde(rename = "post_status")]
    status: String,
    #[serde(rename = "post_name")]
    name: String,
    #[serde(rename = "guid")]
    guid: String,
    #[serde(rename = "post_type")]
    kind: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    pub rows: usize,
    pub imported: usize,
    pub skipped_by_kind: BTreeMap<String, usize>,
}

/// Load every row of the export into the site. All rows load before any
/// resolution happens; row order is preserved within each collection.
pub fn load_export(export_path: &Path, site: &mut Site) -> Result<ImportReport> {
    let mut reader = csv::Reader::from_path(export_path)
        .with_context(|| format!("failed to open export {}", export_path.display()))?;

    let mut report = ImportReport::default();
    for row in reader.deserialize::<ExportRow>() {
        let row = row.with_context(|| {
            format!(
                "malformed export row {} in {}",
                report.rows + 1,
                export_path.display()
            )
        })?;
        report.rows += 1;

        let Some(kind) = ContentKind::parse(&row.kind) else {
            *report.skipped_by_kind.entry(row.kind).or_insert(0) += 1;
            continue;
        };

        site.add_record(ContentRecord {
            id: row.id,
            kind,
            title: row.title,
            author: row.author,
            created_at: row.created_at,
            status: row.status,
            name: row.name,
            guid: row.guid,
            parent_id: row.parent_id,
            raw_content: row.raw_content,
            processed_content: String::new(),
            processed_path: String::new(),
        });
        report.imported += 1;
    }

    Ok(report)
}
