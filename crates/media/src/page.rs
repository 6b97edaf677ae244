// ABOUTME: A fetched page parsed once into a queryable document, plus URL helpers.
// ABOUTME: Search chains query pages through this type so tests can build pages from plain strings.

//! Parsed page capability.
//!
//! A [`Page`] pairs parsed markup with the URL it was requested from. All
//! queries return attribute values or text in document order, trimmed, with
//! empty values dropped. Relative links are absolutized against the requested
//! URL, never against a redirect target.

use scraper::{ElementRef, Html, Selector};
use url::Url;

/// A parsed page and the URL it was requested from.
pub struct Page {
    url: Url,
    markup: String,
    doc: Html,
}

impl Page {
    /// Parse markup fetched from `url`.
    pub fn parse(markup: &str, url: Url) -> Self {
        Self {
            url,
            markup: markup.to_string(),
            doc: Html::parse_document(markup),
        }
    }

    /// The URL the page was requested from.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The raw markup.
    pub fn markup(&self) -> &str {
        &self.markup
    }

    pub fn document(&self) -> &Html {
        &self.doc
    }

    /// Number of elements matching `selector`.
    pub fn count(&self, selector: &Selector) -> usize {
        self.doc.select(selector).count()
    }

    /// Values of `attr` on every element matching `selector`.
    pub fn attrs(&self, selector: &Selector, attr: &str) -> Vec<String> {
        self.doc
            .select(selector)
            .filter_map(|el| non_empty(el.value().attr(attr)))
            .collect()
    }

    /// First result `pick` yields for the elements matching `scope`, visited in document order.
    ///
    /// Each scope is searched completely before the next one is tried.
    pub fn first_in_scope<F>(&self, scope: &Selector, pick: F) -> Option<String>
    where
        F: FnMut(ElementRef<'_>) -> Option<String>,
    {
        self.doc.select(scope).find_map(pick)
    }

    /// Whitespace-normalized text of every element matching `selector`.
    pub fn texts(&self, selector: &Selector) -> Vec<String> {
        self.doc
            .select(selector)
            .filter_map(|el| {
                let text = normalize_whitespace(&el.text().collect::<Vec<_>>().join(" "));
                if text.is_empty() {
                    None
                } else {
                    Some(text)
                }
            })
            .collect()
    }

    /// Resolve a link found on this page against the page URL.
    pub fn absolutize(&self, link: &str) -> String {
        absolutize(link, &self.url)
    }
}

/// Resolve a possibly relative link against `base`.
///
/// Links that already carry a host are returned unchanged. If joining fails
/// the trimmed link is returned as found.
pub fn absolutize(link: &str, base: &Url) -> String {
    let link = link.trim();
    if let Ok(parsed) = Url::parse(link) {
        if parsed.has_host() {
            return link.to_string();
        }
    }
    match base.join(link) {
        Ok(resolved) => resolved.to_string(),
        Err(_) => link.to_string(),
    }
}

/// True when `url` syntactically starts with `http://` or `https://`.
pub fn is_absolute_http(url: &str) -> bool {
    let lower = url.trim().to_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// True when the path of `url` ends with `ext` (case-insensitive, query and fragment ignored).
pub fn has_extension(url: &str, ext: &str) -> bool {
    let lower = url.trim().to_lowercase();
    let path = lower
        .split(|c| c == '?' || c == '#')
        .next()
        .unwrap_or("");
    path.ends_with(ext)
}

/// Values of `attr` on the elements matching `selector` inside `element`.
pub fn attrs_in(element: ElementRef<'_>, selector: &Selector, attr: &str) -> Vec<String> {
    element
        .select(selector)
        .filter_map(|el| non_empty(el.value().attr(attr)))
        .collect()
}

fn non_empty(value: Option<&str>) -> Option<String> {
    let trimmed = value?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
