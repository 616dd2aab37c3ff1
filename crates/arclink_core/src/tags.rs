//! Tag string helpers.
//!
//! Tags live on the archive server as one raw comma-separated string. They are
//! only ever appended to, except for the reset path which keeps the
//! `date_added:` entry alone.

use url::Url;

pub const DATE_ADDED_NAMESPACE: &str = "date_added:";
pub const SOURCE_NAMESPACE: &str = "source:";

/// Iterates the trimmed, non-empty entries of a tag string.
pub fn split_tags(tags: &str) -> impl Iterator<Item = &str> {
    tags.split(',').map(str::trim).filter(|tag| !tag.is_empty())
}

pub fn date_added_entry(tags: &str) -> Option<&str> {
    split_tags(tags).find(|tag| tag.starts_with(DATE_ADDED_NAMESPACE))
}

/// Strips a tag string down to its `date_added:` entry, or nothing.
///
/// Applying it twice gives the same result as applying it once.
pub fn reset_tags(tags: &str) -> String {
    date_added_entry(tags).unwrap_or_default().to_string()
}

/// Appends `new_tags` onto `existing`.
///
/// With `reset`, `existing` is first reduced to its `date_added:` entry.
pub fn merge_tags(existing: &str, new_tags: &str, reset: bool) -> String {
    let base = if reset {
        reset_tags(existing)
    } else {
        existing.trim().to_string()
    };
    let new_tags = new_tags.trim();
    match (base.is_empty(), new_tags.is_empty()) {
        (_, true) => base,
        (true, false) => new_tags.to_string(),
        (false, false) => format!("{base},{new_tags}"),
    }
}

/// Host key used to recognise links to a site: lowercase host without a
/// leading `www.`, plus the port when one is given explicitly.
pub fn link_host(link: &str) -> Option<String> {
    let url = Url::parse(link).ok()?;
    let host = url.host_str()?.to_ascii_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host).to_string();
    Some(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host,
    })
}

/// Finds a `source:` tag pointing at `host` and returns it as an absolute link.
pub fn find_source_link(tags: &str, host: &str) -> Option<String> {
    let host = host.to_ascii_lowercase();
    split_tags(tags)
        .filter_map(|tag| tag.strip_prefix(SOURCE_NAMESPACE))
        .map(str::trim)
        .find(|value| value.to_ascii_lowercase().contains(&host))
        .map(|value| {
            if value.contains("://") {
                value.to_string()
            } else {
                format!("https://{value}")
            }
        })
}
