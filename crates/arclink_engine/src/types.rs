use std::fmt;

use arclink_core::{PluginStage, ResolutionOutcome};

/// Step of the per-archive pipeline, reported through [`crate::ProgressSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Queued,
    ResettingTags,
    ApplyingPlugin,
    SearchingPrimary,
    VerifyingLink,
    SearchingMirror,
    AwaitingOperator,
    WritingBack,
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveProgress {
    pub archive_id: String,
    pub stage: Stage,
}

/// Everything the pipeline decided for one archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveReport {
    pub archive_id: String,
    pub title: String,
    pub plugin_stage: PluginStage,
    pub outcome: ResolutionOutcome,
    /// Tag string last written back, if any write happened.
    pub written_tags: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Progress(ArchiveProgress),
    ArchiveFinished {
        position: usize,
        total: usize,
        report: ArchiveReport,
    },
}

/// Failure talking to a remote host. Always fatal for the run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct TransportError {
    pub kind: FailureKind,
    pub message: String,
}

impl TransportError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    Decode,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::Decode => write!(f, "undecodable response"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}

/// Precondition failures detected before any archive is touched.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("metadata plugin '{0}' is not installed on the archive server")]
    MissingPlugin(String),
    #[error("catalog session was rejected, retry with a new session cookie")]
    LoginRejected,
    #[error(transparent)]
    Transport(#[from] TransportError),
}
