// ABOUTME: Spreadsheet Exporter: writes aggregated keyword records (and survey reports) to xlsx,
// ABOUTME: and converts them to and from the JSON status envelope.

use std::path::Path;

use rust_xlsxwriter::{Format, Workbook};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::SheetError;
use crate::models::{Aggregation, OutputRecord, OUTPUT_HEADERS};
use crate::survey::{PageReport, PAGE_HEADERS};

/// Name of the sheet holding keyword records.
pub const KEYWORDS_SHEET: &str = "Keywords";
/// Name of the sheet holding survey reports.
pub const PAGES_SHEET: &str = "Pages";

const MAX_COLUMN_WIDTH: usize = 100;

/// Records in output order: keywords sorted, then the fixed category order.
pub fn keyword_rows(aggregation: &Aggregation) -> Vec<OutputRecord> {
    aggregation
        .values()
        .flat_map(|records| {
            let mut records = records.clone();
            records.sort_by_key(|r| r.media_category);
            records
        })
        .collect()
}

/// Width per column: the longest cell, header included, plus two, capped at 100.
pub fn column_widths<S: AsRef<str>>(headers: &[&str], rows: &[Vec<S>]) -> Vec<f64> {
    headers
        .iter()
        .enumerate()
        .map(|(col, header)| {
            let longest = rows
                .iter()
                .filter_map(|row| row.get(col))
                .map(|cell| cell.as_ref().chars().count())
                .chain(std::iter::once(header.chars().count()))
                .max()
                .unwrap_or(0);
            (longest + 2).min(MAX_COLUMN_WIDTH) as f64
        })
        .collect()
}

/// Write one sheet with a bold header row and fitted column widths.
pub fn write_sheet(
    path: &Path,
    sheet_name: &str,
    headers: &[&str],
    rows: &[Vec<String>],
) -> Result<(), SheetError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name).map_err(SheetError::write)?;

    let bold = Format::new().set_bold();
    for (col, header) in headers.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, *header, &bold)
            .map_err(SheetError::write)?;
    }
    for (index, row) in rows.iter().enumerate() {
        for (col, value) in row.iter().enumerate() {
            worksheet
                .write_string(index as u32 + 1, col as u16, value)
                .map_err(SheetError::write)?;
        }
    }
    for (col, width) in column_widths(headers, rows).into_iter().enumerate() {
        worksheet
            .set_column_width(col as u16, width)
            .map_err(SheetError::write)?;
    }

    workbook
        .save(path)
        .map_err(|e| SheetError::write(format!("{}: {}", path.display(), e)))?;
    info!(path = %path.display(), sheet = sheet_name, rows = rows.len(), "wrote spreadsheet");
    Ok(())
}

/// Write the "Keywords" sheet.
pub fn write_keywords_xlsx(path: &Path, aggregation: &Aggregation) -> Result<(), SheetError> {
    let rows: Vec<Vec<String>> = keyword_rows(aggregation)
        .iter()
        .map(|r| r.cells().to_vec())
        .collect();
    write_sheet(path, KEYWORDS_SHEET, &OUTPUT_HEADERS, &rows)
}

/// Write the "Pages" sheet.
pub fn write_pages_xlsx(path: &Path, reports: &[PageReport]) -> Result<(), SheetError> {
    let rows: Vec<Vec<String>> = reports.iter().map(PageReport::cells).collect();
    write_sheet(path, PAGES_SHEET, &PAGE_HEADERS, &rows)
}

/// JSON status envelope exchanged between processing and export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Envelope {
    Ok {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        keywords: Option<Aggregation>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pages: Option<Vec<PageReport>>,
    },
    Error {
        message: String,
    },
}

impl Envelope {
    pub fn keywords(aggregation: Aggregation) -> Self {
        Envelope::Ok {
            keywords: Some(aggregation),
            pages: None,
        }
    }

    pub fn pages(reports: Vec<PageReport>) -> Self {
        Envelope::Ok {
            keywords: None,
            pages: Some(reports),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Envelope::Error {
            message: message.into(),
        }
    }

    pub fn to_json(&self, pretty: bool) -> Result<String, SheetError> {
        let json = if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        };
        json.map_err(SheetError::json)
    }
}

/// Parse a keywords envelope back into an aggregation.
pub fn aggregation_from_json(json: &str) -> Result<Aggregation, SheetError> {
    match serde_json::from_str::<Envelope>(json).map_err(SheetError::json)? {
        Envelope::Ok {
            keywords: Some(keywords),
            ..
        } => Ok(keywords),
        Envelope::Ok { keywords: None, .. } => Err(SheetError::json("envelope has no keywords")),
        Envelope::Error { message } => Err(SheetError::json(format!(
            "envelope carries an error: {}",
            message
        ))),
    }
}
