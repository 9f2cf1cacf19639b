use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

static IMG_SRC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<img[^>]*\ssrc\s*=\s*"([^"]+)""#).expect("img src pattern"));
static ANCHOR_HREF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<a[^>]*\shref\s*=\s*"([^"]+)""#).expect("anchor href pattern"));

/// Distinct `<img src>` targets in first-occurrence order.
pub fn image_sources(body: &str) -> Vec<String> {
    distinct_captures(&IMG_SRC, body)
}

/// Distinct `<a href>` targets in first-occurrence order.
pub fn link_targets(body: &str) -> Vec<String> {
    distinct_captures(&ANCHOR_HREF, body)
}

/// A reference is local when it carries no protocol at all, or when it
/// carries one but points at the site's own host. Plain substring checks
/// on purpose: exported bodies mix http/https, www and bare hosts, and
/// query-string noise, and the looseness tolerates all of it.
pub fn is_local(target: &str, site_host: &str) -> bool {
    !target.contains("http") || target.contains(site_host)
}

/// Drop the leading scheme so http/https variance cannot defeat guid
/// containment checks.
pub fn strip_protocol(target: &str) -> &str {
    target
        .strip_prefix("https://")
        .or_else(|| target.strip_prefix("http://"))
        .unwrap_or(target)
}

/// Relative form of a target: scheme and host dropped, path plus query and
/// fragment kept. Already-relative targets come back unchanged.
pub fn make_relative(target: &str, site_host: &str) -> String {
    let stripped = strip_protocol(target);
    match stripped.find(site_host) {
        Some(index) => stripped[index + site_host.len()..].to_string(),
        None => stripped.to_string(),
    }
}

/// Whether the last path segment carries a file extension. Query and
/// fragment are ignored for the check.
pub fn has_file_extension(target: &str) -> bool {
    let path = target.split(['?', '#']).next().unwrap_or(target);
    let last = path.rsplit('/').next().unwrap_or(path);
    matches!(last.rsplit_once('.'), Some((stem, ext)) if !stem.is_empty() && !ext.is_empty())
}

/// Filename of the last path segment without its extension; used to name
/// synthesized media records.
pub fn filename_stem(target: &str) -> String {
    let path = target.split(['?', '#']).next().unwrap_or(target);
    let file = path.trim_end_matches('/').rsplit('/').next().unwrap_or(path);
    match file.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => file.to_string(),
    }
}

fn distinct_captures(pattern: &Regex, body: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut output = Vec::new();
    for capture in pattern.captures_iter(body) {
        let target = capture[1].to_string();
        if seen.insert(target.clone()) {
            output.push(target);
        }
    }
    output
}
