// ABOUTME: Best-effort guess of which single media category a page serves.
// ABOUTME: Video/audio elements first, then printed-edition markers and image-heavy pages.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Selector;
use tracing::{info, warn};
use url::Url;

use crate::category::MediaCategory;
use crate::fetch::PageFetcher;
use crate::page::{is_absolute_http, Page};

/// Pages with more photos than this are treated as printed-edition scans.
const PRINT_IMAGE_THRESHOLD: usize = 5;

static PRINTED_EDITION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)jornal impresso|vers[ãa]o impressa|edi[çc][ãa]o impressa").unwrap()
});
static VIDEO_LINK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\.mp4|youtube|vimeo").unwrap());
static AUDIO_LINK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\.mp3").unwrap());
static PHOTO_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\.(jpg|jpeg|png)").unwrap());

static VIDEO_ELEMENTS: Lazy<Selector> = Lazy::new(|| Selector::parse("video, iframe").unwrap());
static AUDIO_ELEMENTS: Lazy<Selector> = Lazy::new(|| Selector::parse("audio").unwrap());
static ANCHORS: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());
static IMAGES: Lazy<Selector> = Lazy::new(|| Selector::parse("img[src]").unwrap());

/// Classify an already parsed page.
pub fn classify_page(page: &Page) -> MediaCategory {
    let anchors = page.attrs(&ANCHORS, "href");

    if page.count(&VIDEO_ELEMENTS) > 0 || anchors.iter().any(|href| VIDEO_LINK_RE.is_match(href)) {
        return MediaCategory::Tv;
    }

    if page.count(&AUDIO_ELEMENTS) > 0 || anchors.iter().any(|href| AUDIO_LINK_RE.is_match(href)) {
        return MediaCategory::Radio;
    }

    if PRINTED_EDITION_RE.is_match(page.markup()) {
        return MediaCategory::Print;
    }

    let photos = page
        .attrs(&IMAGES, "src")
        .iter()
        .filter(|src| PHOTO_RE.is_match(src))
        .count();
    if photos > PRINT_IMAGE_THRESHOLD {
        return MediaCategory::Print;
    }

    MediaCategory::Portal
}

/// Fetch `url` and classify it. Invalid URLs and failed fetches are Portal.
pub fn detect_media_type(fetcher: &dyn PageFetcher, url: &str) -> MediaCategory {
    let url = url.trim();
    if !is_absolute_http(url) {
        warn!(url, "invalid URL for media type detection");
        return MediaCategory::Portal;
    }
    let Ok(parsed) = Url::parse(url) else {
        warn!(url, "invalid URL for media type detection");
        return MediaCategory::Portal;
    };

    match fetcher.fetch_page(url) {
        Ok(markup) => {
            let category = classify_page(&Page::parse(&markup, parsed));
            info!(url, %category, "detected media type");
            category
        }
        Err(err) => {
            warn!(%err, "media type detection fell back to Portal");
            MediaCategory::Portal
        }
    }
}
