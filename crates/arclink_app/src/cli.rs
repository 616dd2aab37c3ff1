//! Command-line arguments and their translation into run settings.

use std::path::PathBuf;
use std::process::ExitCode;

use arclink_core::ArchiveSelection;
use arclink_engine::{ArchiveServerSettings, CascadeSettings, Mode, SourceSettings};
use clap::{Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "arclink")]
#[command(about = "Tags archive server entries from an online catalog and its mirror")]
pub struct Args {
    /// Archive server API key
    api_key: Option<String>,

    /// Archive server base URL
    server_url: Option<String>,

    /// Catalog session id, sent as the session cookie
    sid: Option<String>,

    /// How many archives to process, 0 for all of them
    amount: Option<String>,

    /// Optional offset, then any of: onlyUntagged dontCleanSearchTitles resetAllTags debug
    rest: Vec<String>,

    /// Metadata plugin that starts the pipeline
    #[arg(long, value_enum, default_value_t = ModeArg::Koromo)]
    mode: ModeArg,

    /// Catalog base URL
    #[arg(long)]
    catalog_url: Option<String>,

    /// Mirror base URL
    #[arg(long)]
    mirror_url: Option<String>,

    /// Also write the log to this file
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    Koromo,
    Koharu,
}

impl From<ModeArg> for Mode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Koromo => Mode::Koromo,
            ModeArg::Koharu => Mode::Koharu,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum UsageError {
    #[error("Missing api key")]
    MissingApiKey,
    #[error("Missing archive server link")]
    MissingServerUrl,
    #[error("Missing catalog session id")]
    MissingSessionId,
    #[error("Missing amount")]
    MissingAmount,
    #[error("Invalid amount '{0}'")]
    InvalidAmount(String),
}

impl UsageError {
    pub fn code(&self) -> u8 {
        match self {
            UsageError::MissingApiKey => 201,
            UsageError::MissingServerUrl => 202,
            UsageError::MissingSessionId => 203,
            UsageError::MissingAmount | UsageError::InvalidAmount(_) => 204,
        }
    }

    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.code())
    }
}

/// Everything one run needs, resolved from [`Args`].
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub server: ArchiveServerSettings,
    pub sources: SourceSettings,
    pub cascade: CascadeSettings,
    pub selection: ArchiveSelection,
    pub debug: bool,
    pub log_file: Option<PathBuf>,
    /// Trailing words that were neither an offset nor a known flag.
    pub ignored: Vec<String>,
}

impl Args {
    pub fn into_config(self) -> Result<RunConfig, UsageError> {
        let api_key = required(self.api_key).ok_or(UsageError::MissingApiKey)?;
        let server_url = required(self.server_url).ok_or(UsageError::MissingServerUrl)?;
        let sid = required(self.sid).ok_or(UsageError::MissingSessionId)?;
        let amount_text = required(self.amount).ok_or(UsageError::MissingAmount)?;
        let amount = amount_text
            .parse::<usize>()
            .map_err(|_| UsageError::InvalidAmount(amount_text.clone()))?;

        let mut words = self.rest.into_iter().peekable();
        let offset = match words.peek().and_then(|word| word.parse::<usize>().ok()) {
            Some(offset) => {
                words.next();
                offset
            }
            None => 0,
        };

        let mut cascade = CascadeSettings {
            mode: self.mode.into(),
            ..CascadeSettings::default()
        };
        let mut debug = false;
        let mut ignored = Vec::new();
        for word in words {
            match word.to_ascii_lowercase().as_str() {
                "onlyuntagged" => cascade.only_untagged = true,
                "dontcleansearchtitles" => cascade.clean_titles = false,
                "resetalltags" => cascade.reset_tags = true,
                "debug" => debug = true,
                _ => ignored.push(word),
            }
        }

        let mut sources = SourceSettings {
            session_cookie: Some(sid),
            ..SourceSettings::default()
        };
        if let Some(url) = required(self.catalog_url) {
            sources.catalog_url = url;
        }
        if let Some(url) = required(self.mirror_url) {
            sources.mirror_url = url;
        }

        Ok(RunConfig {
            server: ArchiveServerSettings::new(&server_url, api_key),
            sources,
            selection: ArchiveSelection {
                only_untagged: cascade.only_untagged,
                offset,
                amount,
            },
            cascade,
            debug,
            log_file: self.log_file,
            ignored,
        })
    }
}

fn required(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
