//! Primary catalog: JSON suggestions, page probes and the login check.

use std::sync::Arc;

use arclink_core::{link_host, SearchCandidate};
use arclink_logging::{arclink_debug, arclink_info};
use serde::Deserialize;
use url::Url;

use crate::scrape::{first_href, unescape_entities};
use crate::{FailureKind, SourceClient, TransportError};

const SUGGEST_ACCEPT: &str = "application/json, text/javascript, */*; q=0.01";
const SUBSCRIBED_SELECTOR: &str = "a.bg-green-700";
const SUBSCRIBED_HREF: &str = "/subscription/payment";

#[derive(Debug, Deserialize)]
struct SuggestResponse {
    #[serde(default)]
    results: Vec<SuggestItem>,
    #[serde(default)]
    total: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct SuggestItem {
    link: String,
    title: String,
    #[serde(rename = "type", default)]
    kind: String,
}

#[derive(Debug, Clone)]
pub struct CatalogClient {
    source: Arc<SourceClient>,
    base: Url,
    host: String,
}

impl CatalogClient {
    pub fn new(source: Arc<SourceClient>) -> Result<Self, TransportError> {
        let base_url = source.settings().catalog_url.clone();
        let base = Url::parse(&base_url)
            .map_err(|err| TransportError::new(FailureKind::InvalidUrl, err.to_string()))?;
        let host = link_host(&base_url).ok_or_else(|| {
            TransportError::new(FailureKind::InvalidUrl, format!("no host in {base_url}"))
        })?;
        Ok(Self { source, base, host })
    }

    /// Host key recognised in `source:` tags and back-references.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Asks the catalog for title suggestions.
    ///
    /// `None` means the catalog answered with a non-success status, which the
    /// pipeline reads as "no match".
    pub async fn suggest(
        &self,
        query: &str,
    ) -> Result<Option<Vec<SearchCandidate>>, TransportError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| {
                TransportError::new(FailureKind::InvalidUrl, "catalog url cannot be a base")
            })?
            .pop_if_empty()
            .push("suggest")
            .push(query);
        let url = url.to_string();

        let page = self
            .source
            .get_page(
                &url,
                &[
                    ("Accept", SUGGEST_ACCEPT),
                    ("X-Requested-With", "XMLHttpRequest"),
                    ("Referer", url.as_str()),
                ],
            )
            .await?;
        if !page.is_success() {
            arclink_debug!("Catalog suggest for '{}' answered {}", query, page.status);
            return Ok(None);
        }

        let response: SuggestResponse = serde_json::from_str(&page.body)
            .map_err(|err| TransportError::new(FailureKind::Decode, err.to_string()))?;
        arclink_debug!(
            "Catalog suggest for '{}' returned {} of {:?} results",
            query,
            response.results.len(),
            response.total
        );
        Ok(Some(
            response
                .results
                .into_iter()
                .map(|item| SearchCandidate {
                    title: unescape_entities(&item.title),
                    link: self.absolute(&item.link),
                    kind: item.kind,
                })
                .collect(),
        ))
    }

    /// Whether a catalog page answers 2xx.
    pub async fn is_available(&self, link: &str) -> Result<bool, TransportError> {
        self.source.is_available(link).await
    }

    /// Checks that the session cookie belongs to a logged-in subscriber.
    pub async fn verify_login(&self) -> Result<bool, TransportError> {
        arclink_info!("Getting catalog subscription page to check login status");
        let url = self.absolute("/subscription");
        let page = self.source.get_page(&url, &[]).await?;
        arclink_info!("{} - {}", page.status, page.final_url);
        if !page.is_success() {
            return Err(TransportError::new(
                FailureKind::HttpStatus(page.status),
                format!("login check at {url} failed"),
            ));
        }
        if page.final_url.trim_end_matches('/') == self.base.as_str().trim_end_matches('/') {
            return Ok(false);
        }
        Ok(first_href(&page.body, SUBSCRIBED_SELECTOR).as_deref() == Some(SUBSCRIBED_HREF))
    }

    fn absolute(&self, link: &str) -> String {
        self.base
            .join(link)
            .map(String::from)
            .unwrap_or_else(|_| link.to_string())
    }
}
