use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use arclink_core::{ArchiveRecord, ArchiveSelection, PluginStage, ResolutionOutcome};
use arclink_engine::{
    ArchiveServerClient, ArchiveServerSettings, Cascade, CascadeSettings, EngineEvent, Mode,
    Operator, ProgressSink, SourceSettings, Stage,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TITLE: &str = "[Circle] The Quiet Afternoon at the Lakeside House (Comic Kairakuten)";
const SEARCH_TITLE: &str = "The Quiet Afternoon at the Lakeside House";

struct Sites {
    archive_server: MockServer,
    catalog: MockServer,
    mirror: MockServer,
}

impl Sites {
    async fn start() -> Self {
        let sites = Self {
            archive_server: MockServer::start().await,
            catalog: MockServer::start().await,
            mirror: MockServer::start().await,
        };
        Mock::given(method("GET"))
            .and(path("/api/plugins/metadata"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"name": "koromo", "namespace": "koromoplugin", "type": "metadata"},
                {"name": "Koushoku/Koharu.yaml", "namespace": "koharuyaml", "type": "metadata"},
                {"name": "FAKKU", "namespace": "fakkumetadata", "type": "metadata"},
                {"name": "Chaika.moe", "namespace": "trabant", "type": "metadata"}
            ])))
            .mount(&sites.archive_server)
            .await;
        sites
    }

    fn catalog_link(&self, slug: &str) -> String {
        format!("{}/hentai/{slug}", self.catalog.uri())
    }

    async fn plugin_answers(&self, namespace: &str, body: serde_json::Value) {
        Mock::given(method("POST"))
            .and(path("/api/plugins/use"))
            .and(query_param("plugin", namespace))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(1)
            .mount(&self.archive_server)
            .await;
    }

    async fn expect_tags_written(&self, tags: &str, times: u64) {
        Mock::given(method("PUT"))
            .and(path("/api/archives/a1/metadata"))
            .and(query_param("tags", tags))
            .respond_with(ResponseTemplate::new(200))
            .expect(times)
            .mount(&self.archive_server)
            .await;
    }

    async fn mirror_lists(&self, qsearch: &str, hrefs: &[&str]) {
        let anchors: String = hrefs
            .iter()
            .map(|href| format!(r#"<a href="{href}">The Quiet Afternoon at the Lakeside House</a>"#))
            .collect();
        Mock::given(method("GET"))
            .and(path("/search/"))
            .and(query_param("qsearch", qsearch))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                format!(r#"<div class="result-list">{anchors}</div>"#),
                "text/html",
            ))
            .expect(1)
            .mount(&self.mirror)
            .await;
    }

    async fn mirror_page_links_back(&self, page: &str, back_link: &str) {
        Mock::given(method("GET"))
            .and(path(page))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                format!(
                    r#"<table class="line-top"><tbody><tr><td><a href="{back_link}">Source</a></td></tr></tbody></table>"#
                ),
                "text/html",
            ))
            .expect(1)
            .mount(&self.mirror)
            .await;
    }

    async fn catalog_page_answers(&self, slug: &str, status: u16) {
        Mock::given(method("GET"))
            .and(path(format!("/hentai/{slug}")))
            .respond_with(ResponseTemplate::new(status))
            .expect(1)
            .mount(&self.catalog)
            .await;
    }

    async fn mirror_queries(&self) -> Vec<String> {
        self.mirror
            .received_requests()
            .await
            .unwrap()
            .iter()
            .filter(|request| request.url.path() == "/search/")
            .filter_map(|request| {
                request
                    .url
                    .query_pairs()
                    .find(|(name, _)| name == "qsearch")
                    .map(|(_, value)| value.into_owned())
            })
            .collect()
    }

    async fn cascade(&self, settings: CascadeSettings, operator: ScriptedOperator) -> Cascade {
        let server = ArchiveServerClient::new(ArchiveServerSettings::new(
            &self.archive_server.uri(),
            "secret",
        ))
        .unwrap();
        let sources = SourceSettings {
            catalog_url: self.catalog.uri(),
            mirror_url: self.mirror.uri(),
            permits: 64,
            ..SourceSettings::default()
        };
        Cascade::connect(
            server,
            sources,
            CascadeSettings {
                item_delay: Duration::ZERO,
                ..settings
            },
            Box::new(operator),
        )
        .await
        .unwrap()
    }
}

fn tags_found(tags: &str) -> serde_json::Value {
    json!({"operation": "use_plugin", "success": 1, "data": {"new_tags": tags, "title": ""}})
}

fn plugin_error(error: &str) -> serde_json::Value {
    json!({"operation": "use_plugin", "success": 0, "error": error})
}

fn archive(tags: &str) -> ArchiveRecord {
    ArchiveRecord {
        id: "a1".to_string(),
        title: TITLE.to_string(),
        tags: tags.to_string(),
        ..ArchiveRecord::default()
    }
}

#[derive(Clone, Default)]
struct ScriptedOperator {
    answers: Arc<Mutex<VecDeque<String>>>,
    menus: Arc<Mutex<Vec<String>>>,
}

impl ScriptedOperator {
    fn answering(answers: &[&str]) -> Self {
        let operator = Self::default();
        operator
            .answers
            .lock()
            .unwrap()
            .extend(answers.iter().map(|a| a.to_string()));
        operator
    }

    fn menus(&self) -> Vec<String> {
        self.menus.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Operator for ScriptedOperator {
    fn present(&mut self, menu: &str) {
        self.menus.lock().unwrap().push(menu.to_string());
    }

    async fn read_line(&mut self) -> Option<String> {
        self.answers.lock().unwrap().pop_front()
    }
}

#[derive(Default)]
struct TestSink {
    events: Mutex<Vec<EngineEvent>>,
}

impl TestSink {
    fn stages(&self) -> Vec<Stage> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|event| match event {
                EngineEvent::Progress(progress) => Some(progress.stage),
                EngineEvent::ArchiveFinished { .. } => None,
            })
            .collect()
    }
}

impl ProgressSink for TestSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

#[tokio::test]
async fn source_tag_link_that_answers_is_used_without_search() {
    let sites = Sites::start().await;
    let link = sites.catalog_link("quiet-afternoon");
    let plugin_tags = format!("artist:someone, source:{link}");
    let merged = format!("date_added:1,{plugin_tags}");
    let final_tags = format!("{merged},magazine:comic kairakuten");

    sites.plugin_answers("koromoplugin", tags_found(&plugin_tags)).await;
    sites.expect_tags_written(&merged, 1).await;
    Mock::given(method("GET"))
        .and(path("/hentai/quiet-afternoon"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&sites.catalog)
        .await;
    Mock::given(method("GET"))
        .and(path_regex("^/suggest/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&sites.catalog)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/plugins/use"))
        .and(query_param("plugin", "fakkumetadata"))
        .and(query_param("arg", link.as_str()))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(tags_found("magazine:comic kairakuten")),
        )
        .expect(1)
        .mount(&sites.archive_server)
        .await;
    sites.expect_tags_written(&final_tags, 1).await;

    let operator = ScriptedOperator::default();
    let mut cascade = sites
        .cascade(CascadeSettings::default(), operator.clone())
        .await;
    let sink = TestSink::default();
    let report = cascade.process(&archive("date_added:1"), &sink).await.unwrap();

    assert_eq!(report.outcome, ResolutionOutcome::primary(link.clone()));
    assert_eq!(
        report.plugin_stage,
        PluginStage::WithPrimaryLink {
            tags: merged,
            link
        }
    );
    assert_eq!(report.written_tags, Some(final_tags));
    assert!(operator.menus().is_empty());
    assert!(!sink.stages().contains(&Stage::SearchingPrimary));
}

#[tokio::test]
async fn dead_catalog_link_falls_back_to_mirror_reference() {
    let sites = Sites::start().await;
    let link = sites.catalog_link("gone");
    let plugin_tags = format!("source:{link}");
    let merged = format!("date_added:1,{plugin_tags}");
    let mirror_page = format!("{}/archive/42/", sites.mirror.uri());
    let final_tags = format!("{merged},female:glasses");

    sites.plugin_answers("koromoplugin", tags_found(&plugin_tags)).await;
    sites.expect_tags_written(&merged, 1).await;
    Mock::given(method("GET"))
        .and(path("/hentai/gone"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&sites.catalog)
        .await;
    Mock::given(method("GET"))
        .and(path("/search/"))
        .and(query_param("qsearch", link.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"<div class="result-list"><a href="/archive/42/">The Quiet Afternoon</a></div>"#,
            "text/html",
        ))
        .expect(1)
        .mount(&sites.mirror)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/plugins/use"))
        .and(query_param("plugin", "trabant"))
        .and(query_param("arg", mirror_page.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(tags_found("female:glasses")))
        .expect(1)
        .mount(&sites.archive_server)
        .await;
    sites.expect_tags_written(&final_tags, 1).await;

    let mut cascade = sites
        .cascade(CascadeSettings::default(), ScriptedOperator::default())
        .await;
    let report = cascade
        .process(&archive("date_added:1"), &TestSink::default())
        .await
        .unwrap();

    assert_eq!(report.outcome, ResolutionOutcome::secondary(mirror_page));
    assert_eq!(report.written_tags, Some(final_tags));
}

#[tokio::test]
async fn operator_rejecting_near_ties_leaves_no_link() {
    let sites = Sites::start().await;
    sites
        .plugin_answers("koromoplugin", plugin_error("No info.json in archive"))
        .await;
    Mock::given(method("GET"))
        .and(path_regex("^/suggest/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                {"link": "/hentai/a", "title": "The Quiet Afternoon at the Lakeside House", "type": "comic"},
                {"link": "/hentai/b", "title": "the quiet afternoon at the lakeside house", "type": "comic"},
                {"link": "/hentai/c", "title": "The Quiet Afternoon at the Lakeside Houses", "type": "comic"},
                {"link": "/hentai/d", "title": "A Loud Morning in the City", "type": "comic"}
            ]
        })))
        .expect(1)
        .mount(&sites.catalog)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&sites.archive_server)
        .await;

    let operator = ScriptedOperator::answering(&["0"]);
    let mut cascade = sites
        .cascade(CascadeSettings::default(), operator.clone())
        .await;
    let sink = TestSink::default();
    let report = cascade.process(&archive("date_added:1"), &sink).await.unwrap();

    assert_eq!(report.outcome, ResolutionOutcome::NoLinkFound);
    assert_eq!(
        report.plugin_stage,
        PluginStage::PluginFailed {
            reason: "No info.json in archive".to_string()
        }
    );
    assert_eq!(report.written_tags, None);

    let menus = operator.menus();
    assert_eq!(menus.len(), 1);
    let menu_lines: Vec<&str> = menus[0]
        .lines()
        .filter(|line| line.starts_with(|c: char| c.is_ascii_digit()))
        .collect();
    assert_eq!(menu_lines.len(), 3);
    assert!(menus[0].contains("'The Quiet Afternoon at the Lakeside House'"));
    assert!(sink.stages().contains(&Stage::AwaitingOperator));

    // mirror was searched with the cleaned title and had nothing
    let mirror_requests = sites.mirror.received_requests().await.unwrap();
    assert_eq!(mirror_requests.len(), 1);
    assert!(mirror_requests[0]
        .url
        .query_pairs()
        .any(|(k, v)| k == "qsearch" && v == "The Quiet Afternoon at the Lakeside House"));
}

#[tokio::test]
async fn unique_exact_match_is_taken_without_asking() {
    let sites = Sites::start().await;
    let link = sites.catalog_link("a");
    sites.plugin_answers("koromoplugin", tags_found("")).await;
    Mock::given(method("GET"))
        .and(path_regex("^/suggest/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                {"link": "/hentai/c", "title": "The Quiet Afternoon at the Lakeside Houses", "type": "comic"},
                {"link": "/hentai/a", "title": "The Quiet Afternoon at the Lakeside House", "type": "comic"}
            ]
        })))
        .mount(&sites.catalog)
        .await;
    Mock::given(method("GET"))
        .and(path("/hentai/a"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&sites.catalog)
        .await;
    sites
        .plugin_answers("fakkumetadata", tags_found("artist:someone"))
        .await;
    sites
        .expect_tags_written("date_added:1,artist:someone", 1)
        .await;

    let operator = ScriptedOperator::default();
    let mut cascade = sites
        .cascade(CascadeSettings::default(), operator.clone())
        .await;
    let report = cascade
        .process(&archive("date_added:1"), &TestSink::default())
        .await
        .unwrap();

    assert_eq!(report.plugin_stage, PluginStage::NoNewTags);
    assert_eq!(report.outcome, ResolutionOutcome::primary(link));
    assert!(operator.menus().is_empty());
}

#[tokio::test]
async fn koharu_mode_ignores_source_tags() {
    let sites = Sites::start().await;
    let link = sites.catalog_link("quiet-afternoon");
    let plugin_tags = format!("artist:someone,source:{link}");
    sites.plugin_answers("koharuyaml", tags_found(&plugin_tags)).await;
    sites.expect_tags_written(&plugin_tags, 1).await;
    Mock::given(method("GET"))
        .and(path("/hentai/quiet-afternoon"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&sites.catalog)
        .await;

    let settings = CascadeSettings {
        mode: Mode::Koharu,
        ..CascadeSettings::default()
    };
    let mut cascade = sites.cascade(settings, ScriptedOperator::default()).await;
    let report = cascade
        .process(&archive(""), &TestSink::default())
        .await
        .unwrap();

    assert_eq!(
        report.plugin_stage,
        PluginStage::TagsMerged {
            tags: plugin_tags.clone()
        }
    );
    assert_eq!(report.outcome, ResolutionOutcome::NoLinkFound);
    assert_eq!(report.written_tags, Some(plugin_tags));
}

#[tokio::test]
async fn reset_keeps_only_date_added_before_merging() {
    let sites = Sites::start().await;
    sites.expect_tags_written("date_added:1", 1).await;
    sites.plugin_answers("koromoplugin", tags_found("artist:new")).await;
    sites.expect_tags_written("date_added:1,artist:new", 1).await;

    let settings = CascadeSettings {
        reset_tags: true,
        ..CascadeSettings::default()
    };
    let mut cascade = sites.cascade(settings, ScriptedOperator::default()).await;
    let sink = TestSink::default();
    let report = cascade
        .process(&archive("artist:old, date_added:1"), &sink)
        .await
        .unwrap();

    assert_eq!(report.written_tags.as_deref(), Some("date_added:1,artist:new"));
    assert_eq!(sink.stages().first(), Some(&Stage::ResettingTags));
    assert_eq!(sink.stages().last(), Some(&Stage::Done));
}

#[tokio::test]
async fn run_reports_positions_after_the_offset() {
    let sites = Sites::start().await;
    Mock::given(method("POST"))
        .and(path("/api/plugins/use"))
        .and(query_param("plugin", "koromoplugin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(plugin_error("nothing")))
        .expect(2)
        .mount(&sites.archive_server)
        .await;

    let mut cascade = sites
        .cascade(CascadeSettings::default(), ScriptedOperator::default())
        .await;
    let archives = vec![
        ArchiveRecord {
            id: "a1".to_string(),
            title: "First".to_string(),
            ..ArchiveRecord::default()
        },
        ArchiveRecord {
            id: "a2".to_string(),
            title: "Second".to_string(),
            ..ArchiveRecord::default()
        },
    ];
    let selection = ArchiveSelection {
        offset: 3,
        ..ArchiveSelection::default()
    };
    let sink = TestSink::default();
    let reports = cascade.run(&archives, &selection, &sink).await.unwrap();

    assert_eq!(reports.len(), 2);
    let finished: Vec<(usize, usize)> = sink
        .events
        .lock()
        .unwrap()
        .iter()
        .filter_map(|event| match event {
            EngineEvent::ArchiveFinished {
                position, total, ..
            } => Some((*position, *total)),
            EngineEvent::Progress(_) => None,
        })
        .collect();
    assert_eq!(finished, vec![(4, 5), (5, 5)]);
}

#[tokio::test]
async fn archive_server_failure_stops_the_run() {
    let sites = Sites::start().await;
    Mock::given(method("POST"))
        .and(path("/api/plugins/use"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&sites.archive_server)
        .await;

    let mut cascade = sites
        .cascade(CascadeSettings::default(), ScriptedOperator::default())
        .await;
    let result = cascade
        .run(&[archive("")], &ArchiveSelection::default(), &TestSink::default())
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn mirror_title_match_prefers_live_catalog_back_reference() {
    let sites = Sites::start().await;
    let back_link = sites.catalog_link("alive");
    sites
        .plugin_answers("koromoplugin", plugin_error("No info.json in archive"))
        .await;
    sites.mirror_lists(SEARCH_TITLE, &["/archive/9/"]).await;
    sites.mirror_page_links_back("/archive/9/", &back_link).await;
    sites.catalog_page_answers("alive", 200).await;
    Mock::given(method("POST"))
        .and(path("/api/plugins/use"))
        .and(query_param("plugin", "fakkumetadata"))
        .and(query_param("arg", back_link.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(tags_found("artist:someone")))
        .expect(1)
        .mount(&sites.archive_server)
        .await;
    sites
        .expect_tags_written("date_added:1,artist:someone", 1)
        .await;

    let mut cascade = sites
        .cascade(CascadeSettings::default(), ScriptedOperator::default())
        .await;
    let report = cascade
        .process(&archive("date_added:1"), &TestSink::default())
        .await
        .unwrap();

    assert_eq!(report.outcome, ResolutionOutcome::primary(back_link));
    assert_eq!(sites.mirror_queries().await, vec![SEARCH_TITLE.to_string()]);
}

#[tokio::test]
async fn dead_back_reference_keeps_the_mirror_page() {
    let sites = Sites::start().await;
    let back_link = sites.catalog_link("removed");
    let mirror_page = format!("{}/archive/9/", sites.mirror.uri());
    sites
        .plugin_answers("koromoplugin", plugin_error("No info.json in archive"))
        .await;
    sites.mirror_lists(SEARCH_TITLE, &["/archive/9/"]).await;
    sites.mirror_page_links_back("/archive/9/", &back_link).await;
    sites.catalog_page_answers("removed", 404).await;
    Mock::given(method("POST"))
        .and(path("/api/plugins/use"))
        .and(query_param("plugin", "trabant"))
        .and(query_param("arg", mirror_page.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(tags_found("female:glasses")))
        .expect(1)
        .mount(&sites.archive_server)
        .await;
    sites
        .expect_tags_written("date_added:1,female:glasses", 1)
        .await;

    let mut cascade = sites
        .cascade(CascadeSettings::default(), ScriptedOperator::default())
        .await;
    let report = cascade
        .process(&archive("date_added:1"), &TestSink::default())
        .await
        .unwrap();

    assert_eq!(report.outcome, ResolutionOutcome::secondary(mirror_page));
}

#[tokio::test]
async fn back_reference_to_the_dead_tag_link_is_not_fetched_again() {
    let sites = Sites::start().await;
    let link = sites.catalog_link("gone");
    let plugin_tags = format!("source:{link}");
    let merged = format!("date_added:1,{plugin_tags}");
    let mirror_page = format!("{}/archive/9/", sites.mirror.uri());

    sites.plugin_answers("koromoplugin", tags_found(&plugin_tags)).await;
    sites.expect_tags_written(&merged, 1).await;
    // one GET during verification, none for the back-reference
    sites.catalog_page_answers("gone", 404).await;
    sites.mirror_lists(&link, &[]).await;
    sites.mirror_lists(SEARCH_TITLE, &["/archive/9/"]).await;
    sites.mirror_page_links_back("/archive/9/", &link).await;
    Mock::given(method("POST"))
        .and(path("/api/plugins/use"))
        .and(query_param("plugin", "trabant"))
        .and(query_param("arg", mirror_page.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(tags_found("")))
        .expect(1)
        .mount(&sites.archive_server)
        .await;

    let mut cascade = sites
        .cascade(CascadeSettings::default(), ScriptedOperator::default())
        .await;
    let report = cascade
        .process(&archive("date_added:1"), &TestSink::default())
        .await
        .unwrap();

    assert_eq!(report.outcome, ResolutionOutcome::secondary(mirror_page));
    assert_eq!(report.written_tags, Some(merged));
    assert_eq!(
        sites.mirror_queries().await,
        vec![link, SEARCH_TITLE.to_string()]
    );
}

#[tokio::test]
async fn dead_searched_link_is_looked_up_on_the_mirror() {
    let sites = Sites::start().await;
    let link = sites.catalog_link("a");
    let mirror_page = format!("{}/archive/5/", sites.mirror.uri());
    sites.plugin_answers("koromoplugin", tags_found("")).await;
    Mock::given(method("GET"))
        .and(path_regex("^/suggest/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                {"link": "/hentai/a", "title": SEARCH_TITLE, "type": "comic"}
            ]
        })))
        .expect(1)
        .mount(&sites.catalog)
        .await;
    sites.catalog_page_answers("a", 404).await;
    sites.mirror_lists(&link, &["/archive/5/"]).await;
    Mock::given(method("POST"))
        .and(path("/api/plugins/use"))
        .and(query_param("plugin", "trabant"))
        .and(query_param("arg", mirror_page.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(tags_found("")))
        .expect(1)
        .mount(&sites.archive_server)
        .await;

    let mut cascade = sites
        .cascade(CascadeSettings::default(), ScriptedOperator::default())
        .await;
    let report = cascade
        .process(&archive("date_added:1"), &TestSink::default())
        .await
        .unwrap();

    assert_eq!(report.outcome, ResolutionOutcome::secondary(mirror_page));
    assert_eq!(sites.mirror_queries().await, vec![link]);
}

#[tokio::test]
async fn ambiguous_reference_search_moves_on_to_the_title() {
    let sites = Sites::start().await;
    let link = sites.catalog_link("gone");
    let plugin_tags = format!("source:{link}");
    let merged = format!("date_added:1,{plugin_tags}");

    sites.plugin_answers("koromoplugin", tags_found(&plugin_tags)).await;
    sites.expect_tags_written(&merged, 1).await;
    sites.catalog_page_answers("gone", 404).await;
    sites.mirror_lists(&link, &["/archive/1/", "/archive/2/"]).await;
    sites.mirror_lists(SEARCH_TITLE, &[]).await;

    let operator = ScriptedOperator::default();
    let mut cascade = sites
        .cascade(CascadeSettings::default(), operator.clone())
        .await;
    let report = cascade
        .process(&archive("date_added:1"), &TestSink::default())
        .await
        .unwrap();

    assert_eq!(report.outcome, ResolutionOutcome::NoLinkFound);
    assert_eq!(report.written_tags, Some(merged));
    assert_eq!(
        sites.mirror_queries().await,
        vec![link, SEARCH_TITLE.to_string()]
    );
    assert!(operator.menus().is_empty());
}

#[tokio::test]
async fn title_made_only_of_annotations_is_not_searched() {
    let sites = Sites::start().await;
    sites
        .plugin_answers("koromoplugin", plugin_error("No info.json in archive"))
        .await;

    let mut cascade = sites
        .cascade(CascadeSettings::default(), ScriptedOperator::default())
        .await;
    let record = ArchiveRecord {
        id: "a1".to_string(),
        title: "[Circle] (Event)".to_string(),
        ..ArchiveRecord::default()
    };
    let sink = TestSink::default();
    let report = cascade.process(&record, &sink).await.unwrap();

    assert_eq!(report.outcome, ResolutionOutcome::NoLinkFound);
    assert!(sites.catalog.received_requests().await.unwrap().is_empty());
    assert!(sites.mirror.received_requests().await.unwrap().is_empty());
    assert!(!sink.stages().contains(&Stage::SearchingPrimary));
}
