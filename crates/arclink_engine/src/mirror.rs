//! Secondary mirror: HTML search results and gallery back-references.

use std::sync::Arc;

use arclink_logging::arclink_debug;
use url::Url;

use crate::scrape::select_anchors;
use crate::{FailureKind, SourceClient, TransportError};

const RESULT_SELECTOR: &str = ".result-list a";
const BACK_REFERENCE_SELECTOR: &str = ".line-top tbody a";

/// One search result on the mirror.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorHit {
    pub text: String,
    /// Absolute link to the mirror's gallery page.
    pub link: String,
}

#[derive(Debug, Clone)]
pub struct MirrorClient {
    source: Arc<SourceClient>,
    base: Url,
}

impl MirrorClient {
    pub fn new(source: Arc<SourceClient>) -> Result<Self, TransportError> {
        let base = Url::parse(&source.settings().mirror_url)
            .map_err(|err| TransportError::new(FailureKind::InvalidUrl, err.to_string()))?;
        Ok(Self { source, base })
    }

    /// Runs a mirror search. A non-success status yields no hits.
    pub async fn search(&self, query: &str) -> Result<Vec<MirrorHit>, TransportError> {
        let mut url = self
            .base
            .join("/search/")
            .map_err(|err| TransportError::new(FailureKind::InvalidUrl, err.to_string()))?;
        url.query_pairs_mut().append_pair("qsearch", query);

        let page = self.source.get_page(url.as_str(), &[]).await?;
        if !page.is_success() {
            arclink_debug!("Mirror search for '{}' answered {}", query, page.status);
            return Ok(Vec::new());
        }
        let hits: Vec<MirrorHit> = select_anchors(&page.body, RESULT_SELECTOR)
            .into_iter()
            .map(|anchor| MirrorHit {
                link: self.absolute(&anchor.href),
                text: anchor.text,
            })
            .collect();
        arclink_debug!("Mirror search for '{}' found {:?}", query, hits);
        Ok(hits)
    }

    /// Searches the mirror for a catalog link verbatim; only a single hit counts.
    pub async fn find_by_reference(&self, link: &str) -> Result<Option<String>, TransportError> {
        let mut hits = self.search(link).await?;
        if hits.len() == 1 {
            Ok(hits.pop().map(|hit| hit.link))
        } else {
            Ok(None)
        }
    }

    /// Scrapes a mirror gallery page for its link back to the catalog host.
    pub async fn back_reference(
        &self,
        page_link: &str,
        catalog_host: &str,
    ) -> Result<Option<String>, TransportError> {
        let page = self.source.get_page(page_link, &[]).await?;
        if !page.is_success() {
            return Ok(None);
        }
        let host = catalog_host.to_ascii_lowercase();
        Ok(select_anchors(&page.body, BACK_REFERENCE_SELECTOR)
            .into_iter()
            .next()
            .map(|anchor| anchor.href)
            .filter(|href| href.to_ascii_lowercase().contains(&host)))
    }

    fn absolute(&self, href: &str) -> String {
        self.base
            .join(href)
            .map(String::from)
            .unwrap_or_else(|_| href.to_string())
    }
}
