use serde::Serialize;

use crate::content::Site;
use crate::links::{has_file_extension, image_sources, is_local, link_targets, make_relative};

#[derive(Debug, Clone, Default, Serialize)]
pub struct RewriteOutcome {
    pub body: String,
    pub rewritten_links: usize,
    pub rewritten_images: usize,
    pub warnings: Vec<String>,
}

/// Rewrite every local link and image in a body to its migrated location.
/// Returns a new string; the input is never mutated.
///
/// Replacement targets are matched with their surrounding quotes so that a
/// link which happens to be a substring of a longer in-body link cannot
/// corrupt it.
pub fn rewrite_body(body: &str, site: &Site) -> RewriteOutcome {
    let mut outcome = RewriteOutcome {
        body: body.to_string(),
        ..RewriteOutcome::default()
    };

    for link in link_targets(body) {
        if !is_local(&link, &site.site_host) {
            continue;
        }
        let mut relative = make_relative(&link, &site.site_host);
        // Extension-less targets are pages or posts; after conversion they
        // exist as Markdown files.
        if !has_file_extension(&relative) {
            relative.push_str(".md");
        }
        let find = format!("\"{link}\"");
        let replace = format!("\"{relative}\"");
        if outcome.body.contains(&find) {
            outcome.body = outcome.body.replace(&find, &replace);
            outcome.rewritten_links += 1;
        }
    }

    for image in image_sources(body) {
        if !is_local(&image, &site.site_host) {
            continue;
        }
        let relative = make_relative(&image, &site.site_host);
        // Discovery guarantees a matching media record; a miss here means
        // reconciliation went wrong for this reference, so warn and leave
        // the occurrence alone instead of failing the document.
        let Some(media) = site
            .media
            .iter()
            .find(|media| media.guid.contains(relative.as_str()))
        else {
            outcome
                .warnings
                .push(format!("no media record matches image reference {image}"));
            continue;
        };

        let find = format!("\"{image}\"");
        let replace = format!("\"/media/{}\"", media.processed_path.trim_start_matches('/'));
        if outcome.body.contains(&find) {
            outcome.body = outcome.body.replace(&find, &replace);
            outcome.rewritten_images += 1;
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{ContentKind, ContentRecord, test_record};
    use crate::resolve::attachment_path;

    fn site_with_media(guids: &[&str]) -> Site {
        let mut site = Site::new("example.org");
        for (index, guid) in guids.iter().enumerate() {
            let mut record: ContentRecord =
                test_record(100 + index as i64, ContentKind::Attachment, "m", 0);
            record.guid = guid.to_string();
            record.processed_path = attachment_path(guid);
            site.add_record(record);
        }
        site
    }

    #[test]
    fn local_link_without_extension_gets_md_suffix() {
        let site = Site::new("example.org");
        let body = r#"<a href="https://example.org/docs/setup">setup</a>"#;
        let outcome = rewrite_body(body, &site);
        assert_eq!(outcome.body, r#"<a href="/docs/setup.md">setup</a>"#);
        assert_eq!(outcome.rewritten_links, 1);
    }

    #[test]
    fn local_link_with_extension_is_only_relativized() {
        let site = Site::new("example.org");
        let body = r#"<a href="http://example.org/files/manual.pdf">manual</a>"#;
        let outcome = rewrite_body(body, &site);
        assert_eq!(outcome.body, r#"<a href="/files/manual.pdf">manual</a>"#);
    }

    #[test]
    fn foreign_links_are_untouched() {
        let site = Site::new("example.org");
        let body = r#"<a href="https://other.net/page">elsewhere</a>"#;
        let outcome = rewrite_body(body, &site);
        assert_eq!(outcome.body, body);
        assert_eq!(outcome.rewritten_links, 0);
    }

    #[test]
    fn quoted_replacement_leaves_superstring_links_alone() {
        let site = Site::new("example.org");
        // "/docs" is a substring of "/docs-archive"; only the exact quoted
        // occurrence may change.
        let body = r#"<a href="/docs">d</a> <a href="/docs-archive">a</a>"#;
        let outcome = rewrite_body(body, &site);
        assert_eq!(
            outcome.body,
            r#"<a href="/docs.md">d</a> <a href="/docs-archive.md">a</a>"#
        );
    }

    #[test]
    fn local_image_is_repointed_at_media_cache() {
        let site = site_with_media(&["http://example.org/wp-content/uploads/2020/01/photo.jpg"]);
        let body = r#"<img src="https://example.org/wp-content/uploads/2020/01/photo.jpg">"#;
        let outcome = rewrite_body(body, &site);
        assert_eq!(outcome.body, r#"<img src="/media/2020/01/photo.jpg">"#);
        assert_eq!(outcome.rewritten_images, 1);
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn relative_image_reference_matches_synthetic_guid() {
        let site = site_with_media(&["images/chart.png"]);
        let body = r#"<img src="images/chart.png">"#;
        let outcome = rewrite_body(body, &site);
        assert_eq!(outcome.body, r#"<img src="/media/images/chart.png">"#);
    }

    #[test]
    fn unmatched_image_warns_and_is_left_unmodified() {
        let site = Site::new("example.org");
        let body = r#"<img src="/wp-content/uploads/ghost.png">"#;
        let outcome = rewrite_body(body, &site);
        assert_eq!(outcome.body, body);
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].contains("ghost.png"));
    }

    #[test]
    fn input_body_is_not_mutated() {
        let site = Site::new("example.org");
        let body = String::from(r#"<a href="/about">about</a>"#);
        let outcome = rewrite_body(&body, &site);
        assert_eq!(body, r#"<a href="/about">about</a>"#);
        assert_ne!(outcome.body, body);
    }
}
