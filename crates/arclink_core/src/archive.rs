use std::collections::HashSet;

/// Snapshot of one archive as listed by the archive server.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ArchiveRecord {
    pub id: String,
    pub extension: String,
    pub is_new: bool,
    pub page_count: u32,
    pub progress: u32,
    /// Raw comma-separated tag string.
    pub tags: String,
    pub title: String,
}

/// Parsed response of one remote plugin call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PluginResult {
    pub error: Option<String>,
    pub new_tags: Option<String>,
    pub title: Option<String>,
}

impl PluginResult {
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }

    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }

    /// New tags, ignoring a blank string.
    pub fn fresh_tags(&self) -> Option<&str> {
        self.new_tags
            .as_deref()
            .map(str::trim)
            .filter(|tags| !tags.is_empty())
    }

    /// Replacement title, ignoring a blank string.
    pub fn fresh_title(&self) -> Option<&str> {
        self.title
            .as_deref()
            .map(str::trim)
            .filter(|title| !title.is_empty())
    }
}

/// Which archives a run works on, and in what order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ArchiveSelection {
    pub only_untagged: bool,
    pub offset: usize,
    /// Maximum number of archives; 0 means unlimited.
    pub amount: usize,
}

impl ArchiveSelection {
    /// Sorts case-insensitively by title, keeps untagged ids when requested,
    /// then applies offset and amount.
    pub fn apply(
        &self,
        mut archives: Vec<ArchiveRecord>,
        untagged: Option<&HashSet<String>>,
    ) -> Vec<ArchiveRecord> {
        archives.sort_by_cached_key(|archive| archive.title.to_lowercase());
        if self.only_untagged {
            if let Some(ids) = untagged {
                archives.retain(|archive| ids.contains(&archive.id));
            }
        }
        let iter = archives.into_iter().skip(self.offset);
        if self.amount > 0 {
            iter.take(self.amount).collect()
        } else {
            iter.collect()
        }
    }

    /// Position of the first selected archive in progress lines (1-based).
    pub fn first_position(&self) -> usize {
        self.offset + 1
    }

    /// Total shown in progress lines for `selected` archives.
    pub fn total(&self, selected: usize) -> usize {
        selected + self.offset
    }
}
