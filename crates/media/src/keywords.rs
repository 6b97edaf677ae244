// ABOUTME: Keyword extraction from article pages: chip widgets, tag-like elements, meta keywords.
// ABOUTME: Strategies run in order and the first one yielding anything wins.

use once_cell::sync::Lazy;
use scraper::Selector;
use tracing::{debug, warn};
use url::Url;

use crate::fetch::PageFetcher;
use crate::page::{is_absolute_http, Page};

static CHIP_CONTENT: Lazy<Selector> = Lazy::new(|| Selector::parse("div.q-chip__content").unwrap());
static TAG_ELEMENTS: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".tag, .keyword, .palavra-chave, .assunto").unwrap());
static META_KEYWORDS: Lazy<Selector> =
    Lazy::new(|| Selector::parse("meta[name='keywords']").unwrap());

/// Extract keywords from a parsed page, in document order.
///
/// Duplicates are kept; callers that need a set collect into one.
pub fn keywords_from_page(page: &Page) -> Vec<String> {
    let chips = page.texts(&CHIP_CONTENT);
    if !chips.is_empty() {
        debug!(count = chips.len(), "keywords from chip widgets");
        return chips;
    }

    let tags = page.texts(&TAG_ELEMENTS);
    if !tags.is_empty() {
        debug!(count = tags.len(), "keywords from tag elements");
        return tags;
    }

    page.attrs(&META_KEYWORDS, "content")
        .iter()
        .flat_map(|content| content.split(','))
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

/// Fetch `url` and extract its keywords. Any failure yields an empty list.
pub fn extract_keywords(fetcher: &dyn PageFetcher, url: &str) -> Vec<String> {
    let url = url.trim();
    if !is_absolute_http(url) {
        warn!(url, "invalid URL for keyword extraction");
        return Vec::new();
    }
    let Ok(parsed) = Url::parse(url) else {
        warn!(url, "invalid URL for keyword extraction");
        return Vec::new();
    };

    match fetcher.fetch_page(url) {
        Ok(markup) => keywords_from_page(&Page::parse(&markup, parsed)),
        Err(err) => {
            warn!(%err, "keyword extraction skipped");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;

    fn keywords(markup: &str) -> Vec<String> {
        keywords_from_page(&Page::parse(markup, Url::parse("https://x.com/p").unwrap()))
    }

    #[test]
    fn chips_win_over_other_strategies() {
        let found = keywords(
            r#"<meta name="keywords" content="a, b">
               <span class="tag">tag</span>
               <div class="q-chip__content"> Eleições </div>
               <div class="q-chip__content">Política</div>"#,
        );
        assert_eq!(found, vec!["Eleições", "Política"]);
    }

    #[test]
    fn tag_elements_before_meta() {
        let found = keywords(
            r#"<meta name="keywords" content="a, b"><a class="palavra-chave">Saúde</a>"#,
        );
        assert_eq!(found, vec!["Saúde"]);
    }

    #[test]
    fn meta_keywords_are_comma_split() {
        let found = keywords(r#"<meta name="keywords" content="economia, , juros ,inflação">"#);
        assert_eq!(found, vec!["economia", "juros", "inflação"]);
    }

    #[test]
    fn failures_yield_nothing() {
        let failing =
            |url: &str| -> Result<String, FetchError> { Err(FetchError::network(url, None)) };
        assert!(extract_keywords(&failing, "https://x.com/p").is_empty());
        assert!(extract_keywords(&failing, "").is_empty());
    }
}
