//! Arclink engine: archive server API, catalog and mirror sources, and the
//! per-archive resolution pipeline.
mod archive_server;
mod cascade;
mod catalog;
mod decode;
mod fetch;
mod limiter;
mod mirror;
mod plugins;
mod prompt;
mod resolver;
mod scrape;
mod types;

pub use archive_server::{ArchiveServerClient, ArchiveServerSettings, PluginInfo, PluginParameter};
pub use cascade::{Cascade, CascadeSettings, LoggingSink, ProgressSink};
pub use catalog::CatalogClient;
pub use decode::decode_page;
pub use fetch::{
    SourceClient, SourcePage, SourceSettings, DEFAULT_CATALOG_URL, DEFAULT_MIRROR_URL,
    SESSION_COOKIE_NAME,
};
pub use limiter::RateLimiter;
pub use mirror::{MirrorClient, MirrorHit};
pub use plugins::{Mode, PluginSet, CATALOG_PLUGIN, KOHARU_PLUGIN, KOROMO_PLUGIN, MIRROR_PLUGIN};
pub use prompt::{choose, parse_choice, render_menu, Choice, ConsoleOperator, MenuEntry, Operator};
pub use resolver::{resolve_link, search_catalog, search_mirror, Linkable, MatchPolicy};
pub use scrape::{select_anchors, Anchor};
pub use types::{
    ArchiveProgress, ArchiveReport, EngineEvent, FailureKind, SetupError, Stage, TransportError,
};
