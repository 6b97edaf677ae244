// ABOUTME: Media link resolution: finds the asset link for a category on a seed page.
// ABOUTME: Applies a per-category fallback chain of DOM queries and synthesizes a link when nothing is found.

//! Media link resolver.
//!
//! `resolve(seed, category)` never fails. The outcomes are:
//! - seed is empty or not `http(s)://`: synthesized fallback, no request made;
//! - fetch fails: the seed itself, or the synthesized fallback when the seed
//!   already points at a media file of another kind;
//! - fetch succeeds: the first candidate of the category chain, absolutized
//!   against the seed; if the chain is empty, the seed for Portal and the
//!   synthesized fallback for every other category.

use once_cell::sync::Lazy;
use scraper::Selector;
use tracing::{debug, info, warn};
use url::Url;

use crate::category::MediaCategory;
use crate::fetch::PageFetcher;
use crate::page::{attrs_in, has_extension, is_absolute_http, Page};

/// Extensions stripped from a seed before the category extension is appended.
const STRIPPED_EXTENSIONS: &[&str] = &[".pdf", ".jpg", ".jpeg", ".mp4", ".mp3", ".html", ".htm"];

/// Extensions that mark a seed as a direct media file rather than a page.
const MEDIA_EXTENSIONS: &[&str] = &[".pdf", ".jpg", ".jpeg", ".mp4", ".mp3"];

/// Image name fragments that mark the printed-edition scan.
const PRINT_NAME_FRAGMENTS: &[&str] = &["site.jpg", "impresso.jpg", "noticia.jpg", "materia"];

/// Video hosts accepted for unscoped iframes.
const VIDEO_IFRAME_MARKERS: &[&str] = &["youtube", "vimeo", "video"];

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector must parse")
}

static ANCHORS: Lazy<Selector> = Lazy::new(|| selector("a[href]"));
static EMBEDS: Lazy<Selector> = Lazy::new(|| selector("embed[src], iframe[src], object[src]"));
static IMAGES: Lazy<Selector> = Lazy::new(|| selector("img[src]"));
static LAZY_SOURCES: Lazy<Selector> = Lazy::new(|| selector("[data-src]"));
static IFRAMES: Lazy<Selector> = Lazy::new(|| selector("iframe[src]"));

static PRINT_CONTAINERS: Lazy<Selector> =
    Lazy::new(|| selector("div.imagem-container, div.image-container, div.figura"));
static PRINT_CONTENT_IMAGES: Lazy<Selector> =
    Lazy::new(|| selector("img.imagem-full, img.materia-imagem, img.full-image"));

static VIDEO_CONTAINERS: Lazy<Selector> = Lazy::new(|| {
    selector("div.video-container, div.player, div.materia-video, div[data-v-6c6e7f38]")
});
static VIDEO_SOURCES: Lazy<Selector> = Lazy::new(|| selector("video source[src], video[src]"));

static AUDIO_CONTAINERS: Lazy<Selector> = Lazy::new(|| {
    selector("div.audio-container, div.player, div.materia-audio, div[data-v-6c6e7f38]")
});
static AUDIO_SOURCES: Lazy<Selector> = Lazy::new(|| selector("audio source[src], audio[src]"));

/// Build the synthesized fallback link for `seed` and `category`.
///
/// Known extensions are stripped (in list order, each at most once) and the
/// category's default extension is appended.
pub fn synthesize_fallback(seed: &str, category: MediaCategory) -> String {
    let mut base = seed.trim().to_string();
    for ext in STRIPPED_EXTENSIONS {
        if base.to_lowercase().ends_with(ext) {
            base.truncate(base.len() - ext.len());
        }
    }
    base.push_str(category.default_extension());
    base
}

fn first(candidates: Vec<String>) -> Option<String> {
    candidates.into_iter().next()
}

fn first_with_extension(candidates: Vec<String>, ext: &str) -> Option<String> {
    candidates.into_iter().find(|c| has_extension(c, ext))
}

fn with_extension(candidates: Vec<String>, ext: &str) -> Vec<String> {
    candidates
        .into_iter()
        .filter(|c| has_extension(c, ext))
        .collect()
}

/// Portal: getPDF anchors, then `.pdf` anchors, then `.pdf` embeds.
pub fn find_portal_link(page: &Page) -> Option<String> {
    let anchors = page.attrs(&ANCHORS, "href");

    let get_pdf: Vec<String> = anchors
        .iter()
        .filter(|href| href.to_lowercase().contains("getpdf"))
        .cloned()
        .collect();
    if let Some(link) = first(get_pdf) {
        debug!(%link, "portal: getPDF anchor");
        return Some(link);
    }

    if let Some(link) = first(with_extension(anchors, ".pdf")) {
        debug!(%link, "portal: pdf anchor");
        return Some(link);
    }

    let embeds = with_extension(page.attrs(&EMBEDS, "src"), ".pdf");
    if let Some(link) = first(embeds) {
        debug!(%link, "portal: pdf embed");
        return Some(link);
    }

    None
}

/// Print: container images, content-class images, named scans, then any photo.
pub fn find_print_link(page: &Page) -> Option<String> {
    let contained: Vec<String> = page
        .document()
        .select(&PRINT_CONTAINERS)
        .flat_map(|container| {
            let mut found: Vec<String> = container
                .select(&IMAGES)
                .filter_map(|img| img.value().attr("src"))
                .map(str::trim)
                .filter(|src| !src.is_empty())
                .map(str::to_string)
                .collect();
            found.extend(
                container
                    .select(&LAZY_SOURCES)
                    .filter_map(|el| el.value().attr("data-src"))
                    .map(str::trim)
                    .filter(|src| !src.is_empty())
                    .map(str::to_string),
            );
            found
        })
        .collect();
    if let Some(link) = first(contained) {
        debug!(%link, "print: container image");
        return Some(link);
    }

    if let Some(link) = first(page.attrs(&PRINT_CONTENT_IMAGES, "src")) {
        debug!(%link, "print: content-class image");
        return Some(link);
    }

    let images = page.attrs(&IMAGES, "src");

    let named = images.iter().find(|src| {
        let lower = src.to_lowercase();
        PRINT_NAME_FRAGMENTS.iter().any(|frag| lower.contains(frag))
    });
    if let Some(link) = named {
        debug!(%link, "print: named image");
        return Some(link.clone());
    }

    let photo = images.into_iter().find(|src| {
        let lower = src.to_lowercase();
        let is_photo = [".jpg", ".jpeg", ".png"]
            .iter()
            .any(|ext| has_extension(&lower, ext));
        is_photo && !lower.contains("icon") && !lower.contains("logo")
    });
    if let Some(ref link) = photo {
        debug!(%link, "print: photo");
    }
    photo
}

/// TV: per player container, mp4 sources, then mp4 anchors, then iframes;
/// if no container yields one, the same kinds across the page.
pub fn find_tv_link(page: &Page) -> Option<String> {
    let scoped = page.first_in_scope(&VIDEO_CONTAINERS, |player| {
        first_with_extension(attrs_in(player, &VIDEO_SOURCES, "src"), ".mp4")
            .or_else(|| first_with_extension(attrs_in(player, &ANCHORS, "href"), ".mp4"))
            .or_else(|| first(attrs_in(player, &IFRAMES, "src")))
    });
    if let Some(link) = scoped {
        debug!(%link, "tv: player-scoped candidate");
        return Some(link);
    }

    let unscoped = with_extension(page.attrs(&VIDEO_SOURCES, "src"), ".mp4")
        .into_iter()
        .chain(with_extension(page.attrs(&ANCHORS, "href"), ".mp4"))
        .chain(page.attrs(&IFRAMES, "src").into_iter().filter(|src| {
            let lower = src.to_lowercase();
            VIDEO_IFRAME_MARKERS.iter().any(|m| lower.contains(m))
        }))
        .next();
    if let Some(ref link) = unscoped {
        debug!(%link, "tv: page-wide candidate");
    }
    unscoped
}

/// Radio: per audio container, mp3 sources, then mp3 anchors; if no container
/// yields one, the same kinds across the page.
pub fn find_radio_link(page: &Page) -> Option<String> {
    let scoped = page.first_in_scope(&AUDIO_CONTAINERS, |player| {
        first_with_extension(attrs_in(player, &AUDIO_SOURCES, "src"), ".mp3")
            .or_else(|| first_with_extension(attrs_in(player, &ANCHORS, "href"), ".mp3"))
    });
    if let Some(link) = scoped {
        debug!(%link, "radio: player-scoped candidate");
        return Some(link);
    }

    let unscoped = with_extension(page.attrs(&AUDIO_SOURCES, "src"), ".mp3")
        .into_iter()
        .chain(with_extension(page.attrs(&ANCHORS, "href"), ".mp3"))
        .next();
    if let Some(ref link) = unscoped {
        debug!(%link, "radio: page-wide candidate");
    }
    unscoped
}

/// Run the chain for `category` and return its raw (unresolved) winner.
pub fn find_candidate(page: &Page, category: MediaCategory) -> Option<String> {
    match category {
        MediaCategory::Portal => find_portal_link(page),
        MediaCategory::Print => find_print_link(page),
        MediaCategory::Tv => find_tv_link(page),
        MediaCategory::Radio => find_radio_link(page),
    }
}

/// Pick the link for `category` on an already parsed page.
///
/// Portal falls back to the page URL; other categories to the synthesized link.
pub fn link_from_page(page: &Page, seed: &str, category: MediaCategory) -> String {
    match find_candidate(page, category) {
        Some(candidate) => page.absolutize(&candidate),
        None if category == MediaCategory::Portal => {
            info!(seed, "no PDF found, keeping page URL");
            seed.to_string()
        }
        None => {
            let fallback = synthesize_fallback(seed, category);
            info!(seed, %category, %fallback, "no media found, using synthesized link");
            fallback
        }
    }
}

/// Resolves category links by fetching seed pages.
pub struct MediaResolver<'a> {
    fetcher: &'a dyn PageFetcher,
}

impl<'a> MediaResolver<'a> {
    pub fn new(fetcher: &'a dyn PageFetcher) -> Self {
        Self { fetcher }
    }

    /// Resolve the link for `category` starting from `seed`. Never fails.
    pub fn resolve(&self, seed: &str, category: MediaCategory) -> String {
        let seed = seed.trim();
        if !is_absolute_http(seed) {
            warn!(seed, %category, "seed is not an absolute URL, synthesizing link");
            return synthesize_fallback(seed, category);
        }

        let url = match Url::parse(seed) {
            Ok(url) => url,
            Err(err) => {
                warn!(seed, %category, error = %err, "seed does not parse, synthesizing link");
                return synthesize_fallback(seed, category);
            }
        };

        let markup = match self.fetcher.fetch_page(seed) {
            Ok(markup) => markup,
            Err(err) => {
                warn!(%err, %category, "could not inspect seed page");
                return fetch_failure_link(seed, category);
            }
        };

        let page = Page::parse(&markup, url);
        let link = link_from_page(&page, seed, category);
        info!(seed, %category, %link, "resolved");
        link
    }

    /// Resolve by category label. Unknown labels return the seed verbatim.
    pub fn resolve_label(&self, seed: &str, label: &str) -> String {
        match MediaCategory::from_label(label) {
            Some(category) => self.resolve(seed, category),
            None => {
                warn!(seed, label, "unknown media category, keeping seed");
                seed.to_string()
            }
        }
    }
}

/// Link used when the seed page cannot be fetched.
///
/// A page link is kept as is. A seed that already names a media file is
/// swapped to the category's extension, since it cannot be the right asset
/// for a category with a different extension.
fn fetch_failure_link(seed: &str, category: MediaCategory) -> String {
    if MEDIA_EXTENSIONS.iter().any(|ext| has_extension(seed, ext)) {
        synthesize_fallback(seed, category)
    } else {
        seed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use pretty_assertions::assert_eq;

    fn page(markup: &str) -> Page {
        Page::parse(markup, Url::parse("https://x.com/n1.html").unwrap())
    }

    #[test]
    fn test_synthesize_strips_known_extensions() {
        assert_eq!(
            synthesize_fallback("https://x.com/a.mp4", MediaCategory::Print),
            "https://x.com/a.jpg"
        );
        assert_eq!(
            synthesize_fallback("https://x.com/a.HTML", MediaCategory::Portal),
            "https://x.com/a.pdf"
        );
        assert_eq!(
            synthesize_fallback("https://x.com/a", MediaCategory::Radio),
            "https://x.com/a.mp3"
        );
        assert_eq!(synthesize_fallback("", MediaCategory::Tv), ".mp4");
    }

    #[test]
    fn test_portal_prefers_get_pdf_marker() {
        let p = page(
            r#"<a href="/files/other.pdf">pdf</a>
               <a href="/getPDF?id=5">download</a>"#,
        );
        assert_eq!(find_portal_link(&p).as_deref(), Some("/getPDF?id=5"));
        assert_eq!(
            link_from_page(&p, "https://x.com/n1.html", MediaCategory::Portal),
            "https://x.com/getPDF?id=5"
        );
    }

    #[test]
    fn test_portal_pdf_anchor_then_embed() {
        let anchor = page(r#"<iframe src="/e.pdf"></iframe><a href="docs/a.pdf">a</a>"#);
        assert_eq!(find_portal_link(&anchor).as_deref(), Some("docs/a.pdf"));

        let embed = page(r#"<embed src="/viewer/e.PDF"><a href="/home">home</a>"#);
        assert_eq!(find_portal_link(&embed).as_deref(), Some("/viewer/e.PDF"));
    }

    #[test]
    fn test_portal_without_pdf_keeps_page_url() {
        let p = page("<p>nothing here</p>");
        assert_eq!(
            link_from_page(&p, "https://x.com/n1.html", MediaCategory::Portal),
            "https://x.com/n1.html"
        );
    }

    #[test]
    fn test_print_container_image_wins() {
        let p = page(
            r#"<img src="/banner.jpg">
               <div class="figura"><span data-src="/lazy.jpg"></span><img src="/scan.jpg"></div>"#,
        );
        assert_eq!(find_print_link(&p).as_deref(), Some("/scan.jpg"));
    }

    #[test]
    fn test_print_container_lazy_source() {
        let p = page(r#"<div class="imagem-container"><img data-src="/lazy.jpg"></div>"#);
        assert_eq!(find_print_link(&p).as_deref(), Some("/lazy.jpg"));
    }

    #[test]
    fn test_print_content_class_then_named_then_photo() {
        let classed = page(r#"<img src="/a.png"><img class="materia-imagem" src="/b.png">"#);
        assert_eq!(find_print_link(&classed).as_deref(), Some("/b.png"));

        let named = page(r#"<img src="/a.png"><img src="/up/materia-123.webp">"#);
        assert_eq!(find_print_link(&named).as_deref(), Some("/up/materia-123.webp"));

        let photo = page(r#"<img src="/logo.png"><img src="/icons/x.jpg"><img src="/p.jpeg">"#);
        assert_eq!(find_print_link(&photo).as_deref(), Some("/p.jpeg"));
    }

    #[test]
    fn test_print_without_image_synthesizes() {
        let p = page(r#"<img src="/logo.png">"#);
        assert_eq!(
            link_from_page(&p, "https://x.com/n1.html", MediaCategory::Print),
            "https://x.com/n1.jpg"
        );
    }

    #[test]
    fn test_tv_scoped_search_first() {
        let p = page(
            r#"<a href="/outside.mp4">x</a>
               <div class="player"><iframe src="https://player.example/embed/1"></iframe></div>"#,
        );
        assert_eq!(
            find_tv_link(&p).as_deref(),
            Some("https://player.example/embed/1")
        );
    }

    #[test]
    fn test_tv_scoped_priority_video_then_anchor_then_iframe() {
        let p = page(
            r#"<div class="video-container">
                 <iframe src="https://player.example/1"></iframe>
                 <a href="/clip.mp4">clip</a>
                 <video><source src="/stream.mp4" type="video/mp4"></video>
               </div>"#,
        );
        assert_eq!(find_tv_link(&p).as_deref(), Some("/stream.mp4"));
    }

    #[test]
    fn test_tv_first_player_wins_even_with_only_an_iframe() {
        let p = page(
            r#"<div class="player"><iframe src="https://www.youtube.com/embed/main"></iframe></div>
        <div class="video-container"><video><source src="/related/other.mp4"></video></div>"#,
        );
        assert_eq!(
            find_tv_link(&p).as_deref(),
            Some("https://www.youtube.com/embed/main")
        );
    }

    #[test]
    fn test_radio_first_container_wins() {
        let p = page(
            r#"<div class="player"><a href="/first.mp3">ouvir</a></div>
               <div class="audio-container"><audio src="/second.mp3"></audio></div>"#,
        );
        assert_eq!(find_radio_link(&p).as_deref(), Some("/first.mp3"));
    }

    #[test]
    fn test_tv_unscoped_iframe_requires_video_marker() {
        let p = page(
            r#"<iframe src="https://ads.example/banner"></iframe>
               <iframe src="https://www.youtube.com/embed/abc"></iframe>"#,
        );
        assert_eq!(
            find_tv_link(&p).as_deref(),
            Some("https://www.youtube.com/embed/abc")
        );

        let none = page(r#"<iframe src="https://ads.example/banner"></iframe>"#);
        assert_eq!(find_tv_link(&none), None);
    }

    #[test]
    fn test_radio_scoped_then_unscoped() {
        let scoped = page(
            r#"<a href="/other.mp3">o</a>
               <div class="audio-container"><audio src="/ep.mp3"></audio></div>"#,
        );
        assert_eq!(find_radio_link(&scoped).as_deref(), Some("/ep.mp3"));

        let unscoped = page(r#"<p><a href="media/ep2.MP3">ouvir</a></p>"#);
        assert_eq!(find_radio_link(&unscoped).as_deref(), Some("media/ep2.MP3"));
        assert_eq!(
            link_from_page(&unscoped, "https://x.com/n1.html", MediaCategory::Radio),
            "https://x.com/media/ep2.MP3"
        );
    }

    #[test]
    fn test_radio_ignores_iframes() {
        let p = page(
            r#"<div class="player"><iframe src="https://radio.example/live"></iframe></div>"#,
        );
        assert_eq!(find_radio_link(&p), None);
    }

    #[test]
    fn test_resolve_invalid_seed_makes_no_request() {
        let fetch = |_: &str| -> Result<String, FetchError> {
            panic!("no request expected for invalid seeds")
        };
        let resolver = MediaResolver::new(&fetch);
        assert_eq!(resolver.resolve("", MediaCategory::Tv), ".mp4");
        assert_eq!(resolver.resolve("   ", MediaCategory::Portal), ".pdf");
        assert_eq!(
            resolver.resolve("x.com/materia.html", MediaCategory::Radio),
            "x.com/materia.mp3"
        );
    }

    #[test]
    fn test_resolve_fetch_failure_keeps_page_seed() {
        let fetch = |url: &str| -> Result<String, FetchError> { Err(FetchError::status(url, 500)) };
        let resolver = MediaResolver::new(&fetch);
        assert_eq!(
            resolver.resolve("https://x.com/n1.html", MediaCategory::Print),
            "https://x.com/n1.html"
        );
    }

    #[test]
    fn test_resolve_fetch_failure_swaps_media_extension() {
        let fetch =
            |url: &str| -> Result<String, FetchError> { Err(FetchError::network(url, None)) };
        let resolver = MediaResolver::new(&fetch);
        assert_eq!(
            resolver.resolve("https://x.com/clip.mp4", MediaCategory::Radio),
            "https://x.com/clip.mp3"
        );
        assert_eq!(
            resolver.resolve("https://x.com/scan.jpeg", MediaCategory::Portal),
            "https://x.com/scan.pdf"
        );
    }

    #[test]
    fn test_resolve_label_unknown_category_returns_seed() {
        let fetch = |_: &str| -> Result<String, FetchError> { Ok("<p></p>".to_string()) };
        let resolver = MediaResolver::new(&fetch);
        assert_eq!(
            resolver.resolve_label("https://x.com/n1", "Podcast"),
            "https://x.com/n1"
        );
        assert_eq!(
            resolver.resolve_label("https://x.com/n1", "Rádio"),
            "https://x.com/n1.mp3"
        );
    }
}
