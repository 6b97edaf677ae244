// ABOUTME: Library entry point for media link resolution.
// ABOUTME: Re-exports the fetcher, the parsed page type, the resolver, the detector and the keyword extractor.

//! clipping-media - finds the asset link a press-mention page offers for each media category.
//!
//! # Example
//!
//! ```no_run
//! use clipping_media::{Fetcher, MediaCategory, MediaResolver};
//!
//! let fetcher = Fetcher::builder().build()?;
//! let resolver = MediaResolver::new(&fetcher);
//! let pdf = resolver.resolve("https://example.com/materia/1", MediaCategory::Portal);
//! println!("{}", pdf);
//! # Ok::<(), clipping_media::FetchError>(())
//! ```

pub mod category;
pub mod detect;
pub mod error;
pub mod fetch;
pub mod keywords;
pub mod options;
pub mod page;
pub mod resolver;

pub use crate::category::MediaCategory;
pub use crate::detect::{classify_page, detect_media_type};
pub use crate::error::{FetchError, FetchErrorCode};
pub use crate::fetch::{CachedFetcher, Fetcher, PageFetcher};
pub use crate::keywords::{extract_keywords, keywords_from_page};
pub use crate::options::{
    FetchOptions, FetcherBuilder, BULK_PAUSE, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT,
};
pub use crate::page::{absolutize, has_extension, is_absolute_http, Page};
pub use crate::resolver::{find_candidate, link_from_page, synthesize_fallback, MediaResolver};
