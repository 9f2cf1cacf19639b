use serde::{Deserialize, Serialize};

/// Id assigned to media records synthesized during discovery. Not unique;
/// every record imported from the export carries its real database id.
pub const SYNTHETIC_ID: i64 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Page,
    Post,
    Attachment,
}

impl ContentKind {
    /// Map the export's `post_type` tag onto a kind. Types with no
    /// counterpart in the output tree (menus, revisions, custom types)
    /// return `None` and are skipped at import.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "page" => Some(Self::Page),
            "post" => Some(Self::Post),
            "attachment" => Some(Self::Attachment),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Page => "page",
            Self::Post => "post",
            Self::Attachment => "attachment",
        }
    }
}

/// One row of the export: a page, a post, or a media attachment.
///
/// `raw_content` is the body as exported; `processed_content` and
/// `processed_path` start empty and are filled in during a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentRecord {
    pub id: i64,
    pub kind: ContentKind,
    pub title: String,
    pub author: String,
    pub created_at: String,
    pub status: String,
    pub name: String,
    pub guid: String,
    pub parent_id: i64,
    pub raw_content: String,
    #[serde(default)]
    pub processed_content: String,
    #[serde(default)]
    pub processed_path: String,
}

/// The whole content graph, partitioned by kind, plus the diagnostic
/// lists that accumulate over a run. Records are appended, never removed;
/// discovery may add synthetic media after import.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Site {
    pub site_host: String,
    pub pages: Vec<ContentRecord>,
    pub posts: Vec<ContentRecord>,
    pub media: Vec<ContentRecord>,
    #[serde(default)]
    pub failed_media: Vec<String>,
    #[serde(default)]
    pub failed_conversions: Vec<String>,
}

impl Site {
    pub fn new(site_host: &str) -> Self {
        Self {
            site_host: site_host.to_string(),
            ..Self::default()
        }
    }

    pub fn add_record(&mut self, record: ContentRecord) {
        match record.kind {
            ContentKind::Page => self.pages.push(record),
            ContentKind::Post => self.posts.push(record),
            ContentKind::Attachment => self.media.push(record),
        }
    }

    pub fn page_by_id(&self, id: i64) -> Option<&ContentRecord> {
        self.pages.iter().find(|page| page.id == id)
    }

    pub fn collection(&self, kind: ContentKind) -> &[ContentRecord] {
        match kind {
            ContentKind::Page => &self.pages,
            ContentKind::Post => &self.posts,
            ContentKind::Attachment => &self.media,
        }
    }

    pub fn collection_mut(&mut self, kind: ContentKind) -> &mut Vec<ContentRecord> {
        match kind {
            ContentKind::Page => &mut self.pages,
            ContentKind::Post => &mut self.posts,
            ContentKind::Attachment => &mut self.media,
        }
    }

    pub fn record_count(&self) -> usize {
        self.pages.len() + self.posts.len() + self.media.len()
    }
}

#[cfg(test)]
pub(crate) fn test_record(id: i64, kind: ContentKind, name: &str, parent_id: i64) -> ContentRecord {
    ContentRecord {
        id,
        kind,
        title: name.to_string(),
        author: "tester".to_string(),
        created_at: "2020-01-01 00:00:00".to_string(),
        status: "publish".to_string(),
        name: name.to_string(),
        guid: format!("http://example.org/?p={id}"),
        parent_id,
        raw_content: String::new(),
        processed_content: String::new(),
        processed_path: String::new(),
    }
}
