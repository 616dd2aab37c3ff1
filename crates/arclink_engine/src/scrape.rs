use scraper::{Html, Selector};

/// An anchor pulled from a page: its visible text and raw `href`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    pub text: String,
    pub href: String,
}

/// Collects every anchor matched by `selector` that has an `href`.
///
/// An unparsable selector matches nothing.
pub fn select_anchors(html: &str, selector: &str) -> Vec<Anchor> {
    let Ok(selector) = Selector::parse(selector) else {
        return Vec::new();
    };
    let doc = Html::parse_document(html);
    doc.select(&selector)
        .filter_map(|element| {
            let href = element.value().attr("href")?.trim();
            if href.is_empty() {
                return None;
            }
            Some(Anchor {
                text: collapse_whitespace(&element.text().collect::<String>()),
                href: href.to_string(),
            })
        })
        .collect()
}

/// `href` of the first anchor matched by `selector`.
pub fn first_href(html: &str, selector: &str) -> Option<String> {
    select_anchors(html, selector)
        .into_iter()
        .next()
        .map(|anchor| anchor.href)
}

/// Decodes HTML entities in a short text such as `Tom &amp; Jerry`.
pub fn unescape_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    let fragment = Html::parse_fragment(text);
    fragment.root_element().text().collect()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
