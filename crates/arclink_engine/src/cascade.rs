//! Per-archive resolution pipeline.
//!
//! Each archive goes through: optional tag reset, metadata plugin, tag merge,
//! catalog link (from tags or search), link verification, mirror fallback and
//! finally the source plugin for whichever site resolved. Archives are handled
//! strictly one after another.

use std::sync::Arc;
use std::time::Duration;

use arclink_core::{
    classify_plugin, merge_tags, normalize_search_title, reset_tags, select, ArchiveRecord,
    ArchiveSelection, LinkSource, PluginStage, ResolutionOutcome, Scored, Selection,
};
use arclink_logging::{arclink_info, arclink_trace, arclink_warn};

use crate::plugins::{Mode, PluginSet};
use crate::prompt::Operator;
use crate::resolver::{resolve_link, search_catalog, search_mirror, Linkable, MatchPolicy};
use crate::{
    ArchiveProgress, ArchiveReport, ArchiveServerClient, CatalogClient, EngineEvent,
    MirrorClient, SetupError, SourceClient, SourceSettings, Stage, TransportError,
};

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

/// Sink that only traces stage changes; results are logged by the pipeline.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingSink;

impl ProgressSink for LoggingSink {
    fn emit(&self, event: EngineEvent) {
        if let EngineEvent::Progress(progress) = event {
            arclink_trace!("{} -> {:?}", progress.archive_id, progress.stage);
        }
    }
}

#[derive(Debug, Clone)]
pub struct CascadeSettings {
    pub mode: Mode,
    /// Strip bracketed annotations from titles before searching.
    pub clean_titles: bool,
    /// Reduce existing tags to `date_added:` before the metadata plugin runs.
    pub reset_tags: bool,
    pub only_untagged: bool,
    /// Pause before each archive.
    pub item_delay: Duration,
    pub policy: MatchPolicy,
}

impl Default for CascadeSettings {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            clean_titles: true,
            reset_tags: false,
            only_untagged: false,
            item_delay: Duration::from_millis(500),
            policy: MatchPolicy::default(),
        }
    }
}

pub struct Cascade {
    server: ArchiveServerClient,
    catalog: CatalogClient,
    mirror: MirrorClient,
    plugins: PluginSet,
    settings: CascadeSettings,
    operator: Box<dyn Operator>,
}

impl Cascade {
    pub fn new(
        server: ArchiveServerClient,
        catalog: CatalogClient,
        mirror: MirrorClient,
        plugins: PluginSet,
        settings: CascadeSettings,
        operator: Box<dyn Operator>,
    ) -> Self {
        Self {
            server,
            catalog,
            mirror,
            plugins,
            settings,
            operator,
        }
    }

    /// Looks up the plugins the run needs and builds the source clients.
    pub async fn connect(
        server: ArchiveServerClient,
        sources: SourceSettings,
        settings: CascadeSettings,
        operator: Box<dyn Operator>,
    ) -> Result<Self, SetupError> {
        arclink_info!("Getting metadata plugins");
        let available = server.metadata_plugins().await?;
        let plugins = PluginSet::resolve(&available, settings.mode)?;
        let source = Arc::new(SourceClient::new(sources)?);
        let catalog = CatalogClient::new(source.clone())?;
        let mirror = MirrorClient::new(source)?;
        Ok(Self::new(server, catalog, mirror, plugins, settings, operator))
    }

    pub fn server(&self) -> &ArchiveServerClient {
        &self.server
    }

    pub fn catalog(&self) -> &CatalogClient {
        &self.catalog
    }

    /// Fails unless the catalog session is logged in.
    pub async fn verify_login(&self) -> Result<(), SetupError> {
        if self.catalog.verify_login().await? {
            Ok(())
        } else {
            Err(SetupError::LoginRejected)
        }
    }

    /// Processes `archives` in order. The first transport failure stops the run.
    pub async fn run(
        &mut self,
        archives: &[ArchiveRecord],
        selection: &ArchiveSelection,
        sink: &dyn ProgressSink,
    ) -> Result<Vec<ArchiveReport>, TransportError> {
        let total = selection.total(archives.len());
        let mut reports = Vec::with_capacity(archives.len());
        for (index, archive) in archives.iter().enumerate() {
            if !self.settings.item_delay.is_zero() {
                tokio::time::sleep(self.settings.item_delay).await;
            }
            emit(sink, archive, Stage::Queued);
            let report = self.process(archive, sink).await?;
            let position = selection.first_position() + index;
            arclink_info!("Finished {}/{}", position, total);
            sink.emit(EngineEvent::ArchiveFinished {
                position,
                total,
                report: report.clone(),
            });
            reports.push(report);
        }
        Ok(reports)
    }

    /// Runs the whole pipeline for one archive.
    pub async fn process(
        &mut self,
        archive: &ArchiveRecord,
        sink: &dyn ProgressSink,
    ) -> Result<ArchiveReport, TransportError> {
        let mut written_tags = None;
        let mut tags = archive.tags.trim().to_string();

        if self.settings.reset_tags {
            let reset = reset_tags(&tags);
            if !self.settings.only_untagged && !tags.is_empty() && reset != tags {
                emit(sink, archive, Stage::ResettingTags);
                arclink_info!("Cleaning tags for '{}'", archive.title);
                self.server.update_metadata(&archive.id, &reset, None).await?;
                written_tags = Some(reset.clone());
            }
            tags = reset;
        }

        emit(sink, archive, Stage::ApplyingPlugin);
        arclink_info!("Using {} plugin for '{}'", self.settings.mode, archive.title);
        let result = self
            .server
            .invoke_plugin(&self.plugins.metadata, &archive.id, None)
            .await?;
        let catalog_host = self
            .settings
            .mode
            .reads_source_links()
            .then(|| self.catalog.host());
        let plugin_stage = classify_plugin(&result, &tags, catalog_host);

        match &plugin_stage {
            PluginStage::WithPrimaryLink { tags: merged, .. }
            | PluginStage::TagsMerged { tags: merged } => {
                arclink_info!("Found tags for '{}' ({})", archive.title, merged);
                emit(sink, archive, Stage::WritingBack);
                self.server
                    .update_metadata(&archive.id, merged, result.fresh_title())
                    .await?;
                tags = merged.clone();
                written_tags = Some(merged.clone());
            }
            PluginStage::NoNewTags => {
                arclink_info!("No new tags for '{}'", archive.title);
            }
            PluginStage::PluginFailed { reason } => {
                arclink_info!(
                    "No {} metadata for '{}' ({})",
                    self.settings.mode,
                    archive.title,
                    reason
                );
            }
        }

        let title = self.search_title(archive);
        let outcome = match &plugin_stage {
            PluginStage::WithPrimaryLink { link, .. } => {
                arclink_info!("Catalog link found for '{}' ({})", archive.title, link);
                self.verify_or_fallback(archive, link, &title, sink).await?
            }
            PluginStage::TagsMerged { .. }
            | PluginStage::NoNewTags
            | PluginStage::PluginFailed { .. } => {
                match self.search_primary(archive, &title, sink).await? {
                    Some(link) => self.verify_or_fallback(archive, &link, &title, sink).await?,
                    None => self.mirror_fallback(archive, None, &title, sink).await?,
                }
            }
        };

        match &outcome {
            ResolutionOutcome::LinkFound {
                source: LinkSource::Primary,
                link,
            } => arclink_info!("Found catalog link for '{}' ({})", archive.title, link),
            ResolutionOutcome::LinkFound {
                source: LinkSource::Secondary,
                link,
            } => arclink_info!("Found mirror link for '{}' ({})", archive.title, link),
            ResolutionOutcome::NoLinkFound => {
                arclink_info!("No link found for '{}'", archive.title)
            }
        }

        if let Some(merged) = self.apply_source_plugin(archive, &tags, &outcome, sink).await? {
            written_tags = Some(merged);
        }
        emit(sink, archive, Stage::Done);

        Ok(ArchiveReport {
            archive_id: archive.id.clone(),
            title: archive.title.clone(),
            plugin_stage,
            outcome,
            written_tags,
        })
    }

    fn search_title(&self, archive: &ArchiveRecord) -> String {
        if self.settings.clean_titles {
            normalize_search_title(&archive.title)
        } else {
            archive.title.clone()
        }
    }

    async fn search_primary(
        &mut self,
        archive: &ArchiveRecord,
        title: &str,
        sink: &dyn ProgressSink,
    ) -> Result<Option<String>, TransportError> {
        if title.is_empty() {
            arclink_info!("No search title for '{}'", archive.title);
            return Ok(None);
        }
        emit(sink, archive, Stage::SearchingPrimary);
        arclink_info!("Searching for '{}'", title);
        let results = search_catalog(&self.catalog, title, &self.settings.policy).await?;
        if results.is_empty() {
            arclink_info!("No results on catalog for '{}'", archive.title);
            return Ok(None);
        }
        arclink_info!("Catalog search results found for '{}'", title);
        Ok(self.resolve(archive, title, &results, sink).await)
    }

    async fn verify_or_fallback(
        &mut self,
        archive: &ArchiveRecord,
        link: &str,
        title: &str,
        sink: &dyn ProgressSink,
    ) -> Result<ResolutionOutcome, TransportError> {
        emit(sink, archive, Stage::VerifyingLink);
        if self.catalog.is_available(link).await? {
            arclink_info!("{} verified", link);
            return Ok(ResolutionOutcome::primary(link));
        }
        arclink_info!("Catalog page for '{}' is unavailable", archive.title);
        self.mirror_fallback(archive, Some(link), title, sink).await
    }

    async fn mirror_fallback(
        &mut self,
        archive: &ArchiveRecord,
        known_link: Option<&str>,
        title: &str,
        sink: &dyn ProgressSink,
    ) -> Result<ResolutionOutcome, TransportError> {
        emit(sink, archive, Stage::SearchingMirror);
        if let Some(known) = known_link {
            if let Some(hit) = self.mirror.find_by_reference(known).await? {
                return Ok(ResolutionOutcome::secondary(hit));
            }
        }

        if title.is_empty() {
            return Ok(ResolutionOutcome::NoLinkFound);
        }
        let results = search_mirror(&self.mirror, title, &self.settings.policy).await?;
        let Some(page) = self.resolve(archive, title, &results, sink).await else {
            return Ok(ResolutionOutcome::NoLinkFound);
        };

        if let Some(back) = self.mirror.back_reference(&page, self.catalog.host()).await? {
            if known_link != Some(back.as_str()) && self.catalog.is_available(&back).await? {
                return Ok(ResolutionOutcome::primary(back));
            }
        }
        Ok(ResolutionOutcome::secondary(page))
    }

    async fn resolve<T: Linkable + Sync>(
        &mut self,
        archive: &ArchiveRecord,
        title: &str,
        results: &[Scored<T>],
        sink: &dyn ProgressSink,
    ) -> Option<String> {
        if select(results) == Selection::Ambiguous {
            emit(sink, archive, Stage::AwaitingOperator);
        }
        resolve_link(self.operator.as_mut(), title, results).await
    }

    /// Runs the catalog or mirror plugin for a resolved link and appends its
    /// tags. Returns the tag string written, if any.
    async fn apply_source_plugin(
        &self,
        archive: &ArchiveRecord,
        tags: &str,
        outcome: &ResolutionOutcome,
        sink: &dyn ProgressSink,
    ) -> Result<Option<String>, TransportError> {
        let ResolutionOutcome::LinkFound { source, link } = outcome else {
            arclink_info!("Failed to get online tags for '{}'", archive.title);
            return Ok(None);
        };
        let plugin = match source {
            LinkSource::Primary => &self.plugins.catalog,
            LinkSource::Secondary => &self.plugins.mirror,
        };
        let result = self
            .server
            .invoke_plugin(plugin, &archive.id, Some(link))
            .await?;
        if let Some(error) = &result.error {
            arclink_warn!("{} plugin failed for '{}': {}", plugin.name, archive.title, error);
        }

        let Some(new_tags) = result.fresh_tags() else {
            arclink_info!("No new tags for '{}'", archive.title);
            return Ok(None);
        };
        let merged = merge_tags(tags, new_tags, false);
        arclink_info!("Found new tags for '{}' ({})", archive.title, new_tags);
        emit(sink, archive, Stage::WritingBack);
        self.server
            .update_metadata(&archive.id, &merged, result.fresh_title())
            .await?;
        arclink_info!("Finished metadata process for '{}'", archive.title);
        Ok(Some(merged))
    }
}

fn emit(sink: &dyn ProgressSink, archive: &ArchiveRecord, stage: Stage) {
    sink.emit(EngineEvent::Progress(ArchiveProgress {
        archive_id: archive.id.clone(),
        stage,
    }));
}
