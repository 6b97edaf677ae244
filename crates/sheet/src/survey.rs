// ABOUTME: Page Survey: per-row processing where the first column of each row is a page URL.
// ABOUTME: Resolves every category link, extracts keywords and detects the media type of each page.

use clipping_media::{
    detect_media_type, extract_keywords, is_absolute_http, MediaCategory, MediaResolver,
    PageFetcher,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::mapper::locate;
use crate::models::{Field, Table};

/// Header row of the "Pages" sheet.
pub const PAGE_HEADERS: [&str; 8] = [
    "URL",
    "TIPO DE MÍDIA",
    "PALAVRAS-CHAVE",
    "PDF",
    "IMAGEM",
    "VÍDEO",
    "ÁUDIO",
    "LINHA",
];

/// Everything learned about one surveyed page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageReport {
    /// Sheet row number (the header is row 1).
    pub row: usize,
    pub url: String,
    pub media_category: MediaCategory,
    pub keywords: Vec<String>,
    pub portal_link: String,
    pub print_link: String,
    pub tv_link: String,
    pub radio_link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_web_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_web_text: Option<String>,
}

impl PageReport {
    /// The report as "Pages" sheet cells, in [`PAGE_HEADERS`] order.
    pub fn cells(&self) -> Vec<String> {
        vec![
            self.url.clone(),
            self.media_category.label().to_string(),
            self.keywords.join(", "),
            self.portal_link.clone(),
            self.print_link.clone(),
            self.tv_link.clone(),
            self.radio_link.clone(),
            self.row.to_string(),
        ]
    }
}

/// Which sheet rows a survey visits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurveyOptions {
    /// First sheet row to survey. The header is row 1; lower values start at row 2.
    pub first_row: usize,
    /// Maximum number of sheet rows to visit, counting skipped ones. `None` or 0 visits all.
    pub limit: Option<usize>,
}

impl Default for SurveyOptions {
    fn default() -> Self {
        Self {
            first_row: 2,
            limit: None,
        }
    }
}

impl SurveyOptions {
    /// Zero-based data row indices selected from a table with `total` data rows.
    fn data_rows(&self, total: usize) -> std::ops::Range<usize> {
        let start = self.first_row.max(2) - 2;
        let end = match self.limit.filter(|&n| n > 0) {
            Some(limit) => start.saturating_add(limit).min(total),
            None => total,
        };
        start.min(end)..end
    }
}

fn non_empty(cell: &str) -> Option<String> {
    let cell = cell.trim();
    (!cell.is_empty()).then(|| cell.to_string())
}

/// Survey the rows of `table` selected by `opts`. Rows with an empty first cell are skipped.
///
/// Fetches run sequentially through `fetcher`, so pacing is whatever the fetcher enforces.
pub fn survey(table: &Table, fetcher: &dyn PageFetcher, opts: &SurveyOptions) -> Vec<PageReport> {
    let image_column = locate(Field::LinkWebImage, &table.headers);
    let text_column = locate(Field::LinkWebText, &table.headers);
    let selected = opts.data_rows(table.rows.len());
    let total = selected.len();
    info!(
        rows = total,
        first_row = selected.start + 2,
        ?image_column,
        ?text_column,
        "surveying pages"
    );

    let resolver = MediaResolver::new(fetcher);
    let mut reports = Vec::new();

    for (done, index) in selected.enumerate() {
        let cells = &table.rows[index];
        let row = index + 2;
        let Some(url) = non_empty(Table::cell(cells, 0)) else {
            warn!(row, "no URL in first column, skipping row");
            continue;
        };
        info!(row, progress = (done * 100) / total.max(1), %url, "surveying row");

        let link_web_image = image_column.and_then(|c| non_empty(Table::cell(cells, c)));
        let link_web_text = text_column.and_then(|c| non_empty(Table::cell(cells, c)));

        let portal_seed = match &link_web_text {
            Some(text) if is_absolute_http(text) => text.as_str(),
            _ => url.as_str(),
        };
        let portal_link = resolver.resolve(portal_seed, MediaCategory::Portal);

        let print_link = match &link_web_image {
            Some(image) if is_absolute_http(image) => image.clone(),
            _ => resolver.resolve(&url, MediaCategory::Print),
        };

        let report = PageReport {
            row,
            tv_link: resolver.resolve(&url, MediaCategory::Tv),
            radio_link: resolver.resolve(&url, MediaCategory::Radio),
            keywords: extract_keywords(fetcher, &url),
            media_category: detect_media_type(fetcher, &url),
            portal_link,
            print_link,
            link_web_image,
            link_web_text,
            url,
        };
        reports.push(report);
    }

    reports
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipping_media::FetchError;
    use pretty_assertions::assert_eq;

    const PAGE: &str = r#"<html><head><meta name="keywords" content="economia, juros"></head><body>
        <div class="figura"><img src="/scan.jpg"></div>
        <div class="audio-container"><audio><source src="/ep.mp3"></audio></div>
    </body></html>"#;

    fn fetcher(url: &str) -> Result<String, FetchError> {
        match url {
            "https://x.com/p1" => Ok(PAGE.to_string()),
            "https://x.com/texto" => Ok(r#"<a href="doc.pdf">pdf</a>"#.to_string()),
            _ => Err(FetchError::network(url, None)),
        }
    }

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn surveys_each_row() {
        let table = Table {
            headers: strings(&["URL", "Link web - Imagem", "Link web - Texto"]),
            rows: vec![
                strings(&["https://x.com/p1", "https://cdn.x.com/capa.jpg", "https://x.com/texto"]),
                strings(&["", "ignored"]),
                strings(&["https://x.com/p1"]),
            ],
        };
        let fetch = fetcher;
        let reports = survey(&table, &fetch, &SurveyOptions::default());
        assert_eq!(reports.len(), 2);

        let first = &reports[0];
        assert_eq!(first.row, 2);
        assert_eq!(first.portal_link, "https://x.com/doc.pdf");
        assert_eq!(first.print_link, "https://cdn.x.com/capa.jpg");
        assert_eq!(first.tv_link, "https://x.com/p1.mp4");
        assert_eq!(first.radio_link, "https://x.com/ep.mp3");
        assert_eq!(first.keywords, vec!["economia", "juros"]);
        assert_eq!(first.media_category, MediaCategory::Radio);

        let third = &reports[1];
        assert_eq!(third.row, 4);
        assert_eq!(third.portal_link, "https://x.com/p1");
        assert_eq!(third.print_link, "https://x.com/scan.jpg");
        assert_eq!(third.link_web_image, None);
    }

    #[test]
    fn unreachable_pages_still_report() {
        let table = Table {
            headers: strings(&["Endereço"]),
            rows: vec![strings(&["https://down.example/materia"])],
        };
        let fetch = fetcher;
        let reports = survey(&table, &fetch, &SurveyOptions::default());
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].media_category, MediaCategory::Portal);
        assert!(reports[0].keywords.is_empty());
        assert_eq!(reports[0].tv_link, "https://down.example/materia");
    }

    #[test]
    fn first_row_and_limit_select_sheet_rows() {
        let table = Table {
            headers: strings(&["URL"]),
            rows: vec![
                strings(&["https://x.com/a"]),
                strings(&["https://x.com/b"]),
                strings(&[""]),
                strings(&["https://x.com/d"]),
                strings(&["https://x.com/e"]),
            ],
        };
        let fetch = fetcher;
        let rows_of = |opts: SurveyOptions| -> Vec<usize> {
            survey(&table, &fetch, &opts).iter().map(|r| r.row).collect()
        };

        assert_eq!(rows_of(SurveyOptions::default()), vec![2, 3, 5, 6]);
        // Rows 3, 4 and 5; the empty row 4 still counts toward the limit.
        let window = SurveyOptions {
            first_row: 3,
            limit: Some(3),
        };
        assert_eq!(rows_of(window), vec![3, 5]);
        let clamped = SurveyOptions {
            first_row: 1,
            limit: Some(1),
        };
        assert_eq!(rows_of(clamped), vec![2]);
        let unlimited = SurveyOptions {
            first_row: 5,
            limit: Some(0),
        };
        assert_eq!(rows_of(unlimited), vec![5, 6]);
        let past_end = SurveyOptions {
            first_row: 40,
            limit: None,
        };
        assert!(rows_of(past_end).is_empty());
    }

    #[test]
    fn cells_follow_page_headers() {
        let report = PageReport {
            row: 2,
            url: "u".into(),
            media_category: MediaCategory::Print,
            keywords: vec!["a".into(), "b".into()],
            portal_link: "p".into(),
            print_link: "i".into(),
            tv_link: "v".into(),
            radio_link: "r".into(),
            link_web_image: None,
            link_web_text: None,
        };
        assert_eq!(report.cells().len(), PAGE_HEADERS.len());
        assert_eq!(report.cells()[1], "Impresso");
        assert_eq!(report.cells()[2], "a, b");
    }
}
