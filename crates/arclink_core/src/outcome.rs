use std::fmt;

use crate::tags::{find_source_link, merge_tags};
use crate::PluginResult;

/// Site a resolved link belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkSource {
    /// The primary catalog.
    Primary,
    /// The secondary mirror.
    Secondary,
}

impl fmt::Display for LinkSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkSource::Primary => write!(f, "primary"),
            LinkSource::Secondary => write!(f, "secondary"),
        }
    }
}

/// Terminal result of one archive's link resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionOutcome {
    LinkFound { source: LinkSource, link: String },
    NoLinkFound,
}

impl ResolutionOutcome {
    pub fn primary(link: impl Into<String>) -> Self {
        Self::LinkFound {
            source: LinkSource::Primary,
            link: link.into(),
        }
    }

    pub fn secondary(link: impl Into<String>) -> Self {
        Self::LinkFound {
            source: LinkSource::Secondary,
            link: link.into(),
        }
    }
}

/// Result of the metadata plugin stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PluginStage {
    /// New tags were merged and they name a primary catalog page.
    WithPrimaryLink { tags: String, link: String },
    /// New tags were merged, no usable link among them.
    TagsMerged { tags: String },
    /// The plugin ran but had nothing to add.
    NoNewTags,
    /// The plugin reported an error.
    PluginFailed { reason: String },
}

impl PluginStage {
    /// Merged tag string, when this stage produced one.
    pub fn merged_tags(&self) -> Option<&str> {
        match self {
            PluginStage::WithPrimaryLink { tags, .. } | PluginStage::TagsMerged { tags } => {
                Some(tags)
            }
            PluginStage::NoNewTags | PluginStage::PluginFailed { .. } => None,
        }
    }
}

/// Classifies a metadata plugin result against the archive's working tags.
///
/// `catalog_host` is `None` when the run mode never takes links from tags.
pub fn classify_plugin(
    result: &PluginResult,
    current_tags: &str,
    catalog_host: Option<&str>,
) -> PluginStage {
    if let Some(reason) = &result.error {
        return PluginStage::PluginFailed {
            reason: reason.clone(),
        };
    }
    let Some(new_tags) = result.fresh_tags() else {
        return PluginStage::NoNewTags;
    };
    let tags = merge_tags(current_tags, new_tags, false);
    match catalog_host.and_then(|host| find_source_link(&tags, host)) {
        Some(link) => PluginStage::WithPrimaryLink { tags, link },
        None => PluginStage::TagsMerged { tags },
    }
}
