// ABOUTME: Reads a source spreadsheet (xlsx, xlsm, xlsb, xls, ods or csv) into a string Table.
// ABOUTME: The first row is the header row; typed cells are rendered to their display strings.

use std::io;
use std::path::Path;

use calamine::{open_workbook_auto, Data, DataType, Reader};
use tracing::{debug, info};

use crate::error::SheetError;
use crate::models::Table;

const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// Read the table at `path`.
///
/// For workbooks the first sheet is used unless `sheet` names another one.
/// Rows whose cells are all empty are dropped.
pub fn read_table(path: &Path, sheet: Option<&str>) -> Result<Table, SheetError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let table = if extension == "csv" {
        let file = std::fs::File::open(path)
            .map_err(|e| SheetError::read(format!("{}: {}", path.display(), e)))?;
        read_csv(file)?
    } else if WORKBOOK_EXTENSIONS.contains(&extension.as_str()) {
        read_workbook(path, sheet)?
    } else {
        return Err(SheetError::read(format!(
            "{}: unsupported file type (expected .xlsx, .xls, .ods or .csv)",
            path.display()
        )));
    };

    info!(
        path = %path.display(),
        columns = table.headers.len(),
        rows = table.rows.len(),
        "read source table"
    );
    Ok(table)
}

fn read_workbook(path: &Path, sheet: Option<&str>) -> Result<Table, SheetError> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| SheetError::read(format!("{}: {}", path.display(), e)))?;

    let range = match sheet {
        Some(name) => {
            if !workbook.sheet_names().iter().any(|s| s == name) {
                return Err(SheetError::read(format!(
                    "{}: no sheet named {:?}",
                    path.display(),
                    name
                )));
            }
            workbook.worksheet_range(name).map_err(SheetError::read)?
        }
        None => workbook
            .worksheet_range_at(0)
            .ok_or_else(|| SheetError::read(format!("{}: workbook has no sheets", path.display())))?
            .map_err(SheetError::read)?,
    };

    let mut rows = range
        .rows()
        .map(|row| row.iter().map(render_cell).collect::<Vec<String>>());
    let headers = rows.next().unwrap_or_default();
    debug!(?headers, "workbook headers");

    Ok(Table {
        headers: headers.into_iter().map(|h| h.trim().to_string()).collect(),
        rows: rows.filter(|row| !is_blank(row)).collect(),
    })
}

/// Read CSV from any reader. Ragged rows are accepted.
pub fn read_csv<R: io::Read>(reader: R) -> Result<Table, SheetError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(SheetError::read)?
        .iter()
        .enumerate()
        .map(|(i, h)| {
            let h = if i == 0 { h.trim_start_matches('\u{feff}') } else { h };
            h.trim().to_string()
        })
        .collect();

    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = record.map_err(SheetError::read)?;
        let row: Vec<String> = record.iter().map(str::to_string).collect();
        if !is_blank(&row) {
            rows.push(row);
        }
    }

    Ok(Table { headers, rows })
}

fn is_blank(row: &[String]) -> bool {
    row.iter().all(|c| c.trim().is_empty())
}

/// Render a typed cell the way it reads in the sheet.
pub fn render_cell(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => render_float(*f),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(_) => cell
            .as_datetime()
            .map(|dt| dt.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        Data::DateTimeIso(s) => s.get(..10).unwrap_or(s).to_string(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(e) => e.to_string(),
    }
}

fn render_float(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}
