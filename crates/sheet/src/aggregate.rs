// ABOUTME: Keyword Aggregator: groups canonical rows by keyword and builds one record per media category.
// ABOUTME: Picks a seed link per keyword by provenance and resolves each category through the media resolver.

use chrono::Local;
use clipping_media::{
    detect_media_type, is_absolute_http, MediaCategory, MediaResolver, PageFetcher,
};
use tracing::{debug, info};

use crate::error::SheetError;
use crate::mapper::{map_columns, ColumnMapping, MapperOptions};
use crate::models::{
    Aggregation, CanonicalRow, KeywordGroup, LinkCandidate, OutputRecord, Provenance, Table,
};

/// Prefix of the seed synthesized for keywords without any usable link.
pub const DEFAULT_FALLBACK_LINK_BASE: &str = "https://braspub.com.br/materias/";

/// Aggregation settings.
#[derive(Debug, Clone)]
pub struct AggregateOptions {
    /// Classify an image-link seed and use it directly for the category it serves.
    pub trust_image_media_type: bool,
    /// Date written on synthesized records.
    pub registration_date: String,
    /// Prefix for the keyword-derived seed.
    pub fallback_link_base: String,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            trust_image_media_type: true,
            registration_date: Local::now().format("%Y-%m-%d").to_string(),
            fallback_link_base: DEFAULT_FALLBACK_LINK_BASE.to_string(),
        }
    }
}

/// Partition rows into keyword groups, in order of first appearance.
///
/// A comma-separated keyword cell puts a copy of its row in every listed group;
/// each copy carries the single keyword it was grouped under.
pub fn group_rows(rows: &[CanonicalRow]) -> Vec<KeywordGroup> {
    let mut groups: Vec<KeywordGroup> = Vec::new();
    for row in rows {
        for keyword in row.keywords() {
            let mut member = row.clone();
            member.keyword = keyword.to_string();
            match groups.iter_mut().find(|g| g.keyword == keyword) {
                Some(group) => group.rows.push(member),
                None => groups.push(KeywordGroup {
                    keyword: keyword.to_string(),
                    rows: vec![member],
                }),
            }
        }
    }
    groups
}

/// Seed derived from the keyword text alone.
pub fn synthesized_seed(keyword: &str, base: &str) -> String {
    format!("{}{}", base, keyword.replace(' ', "_").to_lowercase())
}

/// Choose the seed link of a group.
///
/// Priority: absolute web-text link, absolute web-image link, any registered link,
/// any original link, then the keyword-derived link. Within a provenance the first
/// row wins.
pub fn select_seed(group: &KeywordGroup, fallback_base: &str) -> LinkCandidate {
    let rows = &group.rows;
    let candidate = first_link(rows, |r| r.link_web_text.as_str(), true)
        .map(|url| (url, Provenance::WebText))
        .or_else(|| {
            first_link(rows, |r| r.link_web_image.as_str(), true)
                .map(|url| (url, Provenance::WebImage))
        })
        .or_else(|| {
            first_link(rows, |r| r.registered_link.as_str(), false)
                .map(|url| (url, Provenance::Registered))
        })
        .or_else(|| {
            first_link(rows, |r| r.original_link.as_str(), false)
                .map(|url| (url, Provenance::Original))
        });

    match candidate {
        Some((url, provenance)) => LinkCandidate {
            url: url.to_string(),
            provenance,
        },
        None => LinkCandidate {
            url: synthesized_seed(&group.keyword, fallback_base),
            provenance: Provenance::Synthesized,
        },
    }
}

fn first_link<'r>(
    rows: &'r [CanonicalRow],
    value: impl Fn(&'r CanonicalRow) -> &'r str,
    absolute: bool,
) -> Option<&'r str> {
    rows.iter()
        .map(value)
        .map(str::trim)
        .find(|link| !link.is_empty() && (!absolute || is_absolute_http(link)))
}

/// Builds exactly one record per media category for every keyword.
pub struct Aggregator<'a> {
    fetcher: &'a dyn PageFetcher,
    resolver: MediaResolver<'a>,
    opts: AggregateOptions,
}

impl<'a> Aggregator<'a> {
    pub fn new(fetcher: &'a dyn PageFetcher, opts: AggregateOptions) -> Self {
        Self {
            fetcher,
            resolver: MediaResolver::new(fetcher),
            opts,
        }
    }

    pub fn options(&self) -> &AggregateOptions {
        &self.opts
    }

    /// Aggregate canonical rows. Every keyword gets four records in category order.
    pub fn aggregate(&self, rows: &[CanonicalRow]) -> Aggregation {
        let groups = group_rows(rows);
        info!(rows = rows.len(), keywords = groups.len(), "aggregating");
        groups
            .iter()
            .map(|group| (group.keyword.clone(), self.aggregate_group(group)))
            .collect()
    }

    /// The four records of one keyword group.
    pub fn aggregate_group(&self, group: &KeywordGroup) -> Vec<OutputRecord> {
        let seed = select_seed(group, &self.opts.fallback_link_base);
        info!(
            keyword = %group.keyword,
            seed = %seed.url,
            provenance = ?seed.provenance,
            "selected seed"
        );

        let trusted_image =
            seed.provenance == Provenance::WebImage && self.opts.trust_image_media_type;
        let served = if trusted_image {
            let category = detect_media_type(self.fetcher, &seed.url);
            debug!(keyword = %group.keyword, %category, "image link serves category");
            Some(category)
        } else {
            None
        };

        let web_text = group
            .rows
            .iter()
            .map(|r| r.link_web_text.trim())
            .find(|link| !link.is_empty());

        MediaCategory::ALL
            .iter()
            .map(|&category| {
                let link = match (served, web_text) {
                    (Some(served), _)
                        if served == category && category != MediaCategory::Portal =>
                    {
                        seed.url.clone()
                    }
                    (_, Some(text)) if category == MediaCategory::Portal => text.to_string(),
                    _ => self.resolver.resolve(&seed.url, category),
                };
                self.record_for(group, category, link)
            })
            .collect()
    }

    fn record_for(
        &self,
        group: &KeywordGroup,
        category: MediaCategory,
        link: String,
    ) -> OutputRecord {
        match group.rows.iter().find(|r| r.category() == Some(category)) {
            Some(existing) => OutputRecord {
                keyword: group.keyword.clone(),
                registration_date: existing.registration_date.clone(),
                title: existing.title.clone(),
                media_category: category,
                resolved_link: link,
            },
            None => OutputRecord {
                keyword: group.keyword.clone(),
                registration_date: self.opts.registration_date.clone(),
                title: format!("{} — untitled", group.keyword),
                media_category: category,
                resolved_link: link,
            },
        }
    }
}

/// Map, canonicalize and aggregate a whole table.
pub fn process_table(
    table: &Table,
    fetcher: &dyn PageFetcher,
    mapper_opts: &MapperOptions,
    opts: AggregateOptions,
) -> Result<(ColumnMapping, Aggregation), SheetError> {
    let mapping = map_columns(&table.headers, mapper_opts)?;
    let rows = mapping.canonicalize_table(table);
    let aggregation = Aggregator::new(fetcher, opts).aggregate(&rows);
    Ok((mapping, aggregation))
}
