//! Arclink core: pure resolution rules, no IO.
mod archive;
mod fuzzy;
mod outcome;
mod tags;
mod title;
mod window;

pub use archive::{ArchiveRecord, ArchiveSelection, PluginResult};
pub use fuzzy::{
    extract_all, score, select, Scored, SearchCandidate, Selection, DEFAULT_CUTOFF, EXACT_SCORE,
};
pub use outcome::{classify_plugin, LinkSource, PluginStage, ResolutionOutcome};
pub use tags::{
    date_added_entry, find_source_link, link_host, merge_tags, reset_tags, split_tags,
    DATE_ADDED_NAMESPACE, SOURCE_NAMESPACE,
};
pub use title::normalize_search_title;
pub use window::SlidingWindow;
