use std::fmt;

use crate::{PluginInfo, SetupError};

pub const KOROMO_PLUGIN: &str = "koromo";
pub const KOHARU_PLUGIN: &str = "Koushoku/Koharu.yaml";
pub const CATALOG_PLUGIN: &str = "FAKKU";
pub const MIRROR_PLUGIN: &str = "Chaika.moe";

/// Which sidecar metadata plugin starts the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// `info.json` sidecars; these may carry a catalog `source:` tag.
    #[default]
    Koromo,
    /// `info.yaml` sidecars; never trusted for source links.
    Koharu,
}

impl Mode {
    pub fn metadata_plugin(self) -> &'static str {
        match self {
            Mode::Koromo => KOROMO_PLUGIN,
            Mode::Koharu => KOHARU_PLUGIN,
        }
    }

    pub fn reads_source_links(self) -> bool {
        matches!(self, Mode::Koromo)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Koromo => write!(f, "koromo"),
            Mode::Koharu => write!(f, "koharu"),
        }
    }
}

/// The three plugins one run needs, looked up by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginSet {
    pub metadata: PluginInfo,
    pub catalog: PluginInfo,
    pub mirror: PluginInfo,
}

impl PluginSet {
    pub fn resolve(available: &[PluginInfo], mode: Mode) -> Result<Self, SetupError> {
        let find = |name: &str| {
            available
                .iter()
                .find(|plugin| plugin.name == name)
                .cloned()
                .ok_or_else(|| SetupError::MissingPlugin(name.to_string()))
        };
        Ok(Self {
            metadata: find(mode.metadata_plugin())?,
            catalog: find(CATALOG_PLUGIN)?,
            mirror: find(MIRROR_PLUGIN)?,
        })
    }
}
