use std::collections::HashSet;

use thiserror::Error;

use crate::content::{ContentKind, ContentRecord, Site};

/// Marker inside attachment guids; everything after it is the path the
/// file had under the export's upload directory.
pub const UPLOADS_MARKER: &str = "wp-content/uploads";

/// All posts land under one flat prefix regardless of parent id.
pub const POST_PREFIX: &str = "/news/";

/// Resolved paths longer than this are flagged for diagnostics. They are
/// still written; deeply nested slug chains just tend to indicate a
/// hierarchy worth reviewing by hand.
pub const LONG_PATH_THRESHOLD: usize = 100;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("parent chain of page {id} ({name}) cycles back on itself")]
    CycleDetected { id: i64, name: String },
}

/// Compute the output path for a record. Pure given the current graph:
/// only raw `name`/`parent_id` of ancestors are read, never their own
/// resolved paths, so records may be resolved in any order.
pub fn resolve_path(record: &ContentRecord, site: &Site) -> Result<String, ResolveError> {
    match record.kind {
        ContentKind::Attachment => Ok(attachment_path(&record.guid)),
        ContentKind::Post => Ok(format!("{POST_PREFIX}{}", record.name)),
        ContentKind::Page => {
            let mut visited = HashSet::new();
            page_path(record, site, &mut visited)
        }
    }
}

/// Attachments keep whatever followed the upload-directory marker in their
/// guid (the whole guid when the marker is absent), sanitized for the
/// filesystem.
pub fn attachment_path(guid: &str) -> String {
    let trailing = match guid.find(UPLOADS_MARKER) {
        Some(index) => &guid[index + UPLOADS_MARKER.len()..],
        None => guid,
    };
    sanitize_path(trailing)
}

pub fn exceeds_length_threshold(path: &str) -> bool {
    path.len() > LONG_PATH_THRESHOLD
}

fn page_path(
    record: &ContentRecord,
    site: &Site,
    visited: &mut HashSet<i64>,
) -> Result<String, ResolveError> {
    if !visited.insert(record.id) {
        return Err(ResolveError::CycleDetected {
            id: record.id,
            name: record.name.clone(),
        });
    }

    if record.parent_id == 0 {
        return Ok(format!("/{}", record.name));
    }

    // A dangling parent id is tolerated: the page becomes a root instead
    // of failing the run.
    let Some(parent) = site.page_by_id(record.parent_id) else {
        return Ok(format!("/{}", record.name));
    };

    // Nested slugs repeat their ancestor chain ("flatredball-math-collision"
    // under "flatredball-math"), which compounds into very long paths.
    // Collapse the parent's slug off the front, once per level.
    let child_name = record
        .name
        .strip_prefix(&format!("{}-", parent.name))
        .unwrap_or(&record.name)
        .to_string();

    Ok(format!("{}/{}", page_path(parent, site, visited)?, child_name))
}

/// Replace characters that are illegal or awkward in paths. Forward
/// slashes survive since the result is a relative path, not a filename.
fn sanitize_path(value: &str) -> String {
    value
        .chars()
        .map(|ch| {
            if ch.is_whitespace() || matches!(ch, '<' | '>' | ':' | '"' | '|' | '?' | '*' | '\\') {
                '-'
            } else {
                ch
            }
        })
        .collect()
}
