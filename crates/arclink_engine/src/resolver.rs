//! Fuzzy resolution of a search title to one link.

use arclink_core::{extract_all, select, Scored, SearchCandidate, Selection};
use arclink_logging::arclink_info;

use crate::prompt::{choose, MenuEntry, Operator};
use crate::{CatalogClient, MirrorClient, MirrorHit, TransportError};

/// A search result that can be shown in a menu and resolved to a link.
pub trait Linkable {
    fn text(&self) -> &str;
    fn link(&self) -> &str;
}

impl Linkable for SearchCandidate {
    fn text(&self) -> &str {
        &self.title
    }

    fn link(&self) -> &str {
        &self.link
    }
}

impl Linkable for MirrorHit {
    fn text(&self) -> &str {
        &self.text
    }

    fn link(&self) -> &str {
        &self.link
    }
}

/// Which catalog results take part in matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchPolicy {
    pub candidate_kind: String,
    pub cutoff: u8,
}

impl Default for MatchPolicy {
    fn default() -> Self {
        Self {
            candidate_kind: "comic".to_string(),
            cutoff: arclink_core::DEFAULT_CUTOFF,
        }
    }
}

/// Scores the catalog's suggestions for `query`. A failed suggest call is an
/// empty result.
pub async fn search_catalog(
    catalog: &CatalogClient,
    query: &str,
    policy: &MatchPolicy,
) -> Result<Vec<Scored<SearchCandidate>>, TransportError> {
    let Some(candidates) = catalog.suggest(query).await? else {
        return Ok(Vec::new());
    };
    let wanted = candidates
        .into_iter()
        .filter(|candidate| candidate.kind == policy.candidate_kind);
    Ok(extract_all(query, wanted, |c| c.title.clone(), policy.cutoff))
}

/// Scores the mirror's search results for `query`.
pub async fn search_mirror(
    mirror: &MirrorClient,
    query: &str,
    policy: &MatchPolicy,
) -> Result<Vec<Scored<MirrorHit>>, TransportError> {
    let hits = mirror.search(query).await?;
    Ok(extract_all(query, hits, |hit| hit.text.clone(), policy.cutoff))
}

/// Turns scored results into at most one link: a unique exact match is taken
/// as is, anything else non-empty goes to the operator.
pub async fn resolve_link<T: Linkable + Sync>(
    operator: &mut dyn Operator,
    title: &str,
    results: &[Scored<T>],
) -> Option<String> {
    for result in results {
        arclink_info!("{} ({}) scored {}", result.item.text(), result.item.link(), result.score);
    }
    match select(results) {
        Selection::Nothing => None,
        Selection::Exact(index) => Some(results[index].item.link().to_string()),
        Selection::Ambiguous => {
            let entries: Vec<MenuEntry<'_>> = results
                .iter()
                .map(|result| MenuEntry {
                    text: result.item.text(),
                    link: result.item.link(),
                })
                .collect();
            choose(operator, title, &entries)
                .await
                .map(|index| results[index].item.link().to_string())
        }
    }
}
