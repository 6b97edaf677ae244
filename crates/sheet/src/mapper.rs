// ABOUTME: Column Mapper: matches arbitrary spreadsheet headers onto the canonical field set.
// ABOUTME: Each field owns an ordered list of pure header predicates; the keyword column is mandatory.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, warn};

use crate::error::SheetError;
use crate::models::{CanonicalRow, Field, Table};

/// A header test over the trimmed, lowercased header text.
pub type HeaderPredicate = fn(&str) -> bool;

fn has_any(header: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| header.contains(n))
}

fn is_link(header: &str) -> bool {
    has_any(header, &["link", "url"])
}

// Keyword
fn keyword_named(h: &str) -> bool {
    has_any(h, &["keyword", "palavra", "chave"])
}
fn keyword_subject(h: &str) -> bool {
    h.contains("assunto")
}
fn keyword_client(h: &str) -> bool {
    h == "cliente"
}

// RegistrationDate
fn date_registration(h: &str) -> bool {
    h.contains("data") && h.contains("cadastro")
}
fn date_any(h: &str) -> bool {
    has_any(h, &["data", "inclusão", "inclusao"])
}
fn date_publication(h: &str) -> bool {
    has_any(h, &["publicação", "publicacao"])
}

// Title
fn title_named(h: &str) -> bool {
    has_any(h, &["título", "titulo"])
}
fn title_article(h: &str) -> bool {
    has_any(h, &["matéria", "materia"]) && !is_link(h)
}
fn title_subject(h: &str) -> bool {
    h.contains("assunto")
}

// MediaCategory
fn media_type_named(h: &str) -> bool {
    h.contains("tipo") && has_any(h, &["mídia", "midia"])
}
fn media_type_loose(h: &str) -> bool {
    has_any(h, &["tipo", "mídia", "midia"])
}
fn media_type_label(h: &str) -> bool {
    matches!(h, "portal" | "online" | "impresso" | "tv" | "rádio" | "radio")
}

// LinkWebImage
fn web_image_named(h: &str) -> bool {
    h.contains("link web") && h.contains("imagem")
}
fn web_image_loose(h: &str) -> bool {
    h.contains("imagem") && is_link(h)
}

// LinkWebText
fn web_text_named(h: &str) -> bool {
    h.contains("link web") && h.contains("texto")
}
fn web_text_article(h: &str) -> bool {
    has_any(h, &["link materia", "link matéria"]) && !h.contains("cadastrada")
}
fn web_text_loose(h: &str) -> bool {
    has_any(h, &["texto", "materia", "matéria"]) && is_link(h) && !h.contains("cadastrada")
}

// RegisteredLink
fn registered_named(h: &str) -> bool {
    h.contains("link") && h.contains("cadastrada")
}
fn registered_article(h: &str) -> bool {
    h.contains("link") && has_any(h, &["matéria", "materia"])
}
fn registered_loose(h: &str) -> bool {
    has_any(h, &["link", "url", "endereço", "endereco", "http"])
        && !has_any(h, &["original", "web", "imagem"])
}

// OriginalLink
fn original_named(h: &str) -> bool {
    h.contains("original") && is_link(h)
}

/// The ordered predicate list for `field`. Index in the list is the predicate's rank.
pub fn predicates(field: Field) -> &'static [HeaderPredicate] {
    match field {
        Field::Keyword => &[keyword_named, keyword_subject, keyword_client],
        Field::RegistrationDate => &[date_registration, date_any, date_publication],
        Field::Title => &[title_named, title_article, title_subject],
        Field::MediaCategory => &[media_type_named, media_type_loose, media_type_label],
        Field::LinkWebImage => &[web_image_named, web_image_loose],
        Field::LinkWebText => &[web_text_named, web_text_article, web_text_loose],
        Field::RegisteredLink => &[registered_named, registered_article, registered_loose],
        Field::OriginalLink => &[original_named],
    }
}

fn normalize(header: &str) -> String {
    header.trim().to_lowercase()
}

/// Mapper configuration.
#[derive(Debug, Clone)]
pub struct MapperOptions {
    /// Use the first column as the keyword column when no header matches.
    pub first_column_fallback: bool,
}

impl Default for MapperOptions {
    fn default() -> Self {
        Self {
            first_column_fallback: true,
        }
    }
}

/// The source column chosen for one canonical field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedColumn {
    pub index: usize,
    pub header: String,
    /// Rank of the predicate that matched, or `None` for the first-column fallback.
    pub rank: Option<usize>,
}

/// Result of mapping one header row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnMapping {
    pub columns: BTreeMap<Field, MappedColumn>,
    pub diagnostics: Vec<String>,
}

impl ColumnMapping {
    pub fn column(&self, field: Field) -> Option<&MappedColumn> {
        self.columns.get(&field)
    }

    /// Project one source row onto the canonical fields. Unmapped fields stay empty.
    pub fn canonicalize(&self, row: &[String]) -> CanonicalRow {
        let mut canonical = CanonicalRow::default();
        for (field, column) in &self.columns {
            canonical.set(*field, Table::cell(row, column.index).trim());
        }
        canonical
    }

    /// Canonicalize every data row of `table`.
    pub fn canonicalize_table(&self, table: &Table) -> Vec<CanonicalRow> {
        table.rows.iter().map(|row| self.canonicalize(row)).collect()
    }
}

/// First header matching any of `field`'s predicates, ignoring what other fields consumed.
pub fn locate(field: Field, headers: &[String]) -> Option<usize> {
    let normalized: Vec<String> = headers.iter().map(|h| normalize(h)).collect();
    predicates(field).iter().find_map(|predicate| {
        normalized
            .iter()
            .position(|h| !h.is_empty() && predicate(h))
    })
}

/// Map `headers` onto the canonical fields.
///
/// Fields are evaluated in [`Field::ALL`] order. For each field its predicates are tried
/// by rank, and within a rank the headers are scanned left to right. A header already
/// consumed at rank `j` by an earlier field may be taken again only by a predicate of
/// rank strictly lower than `j`.
///
/// Fails with [`SheetError::MissingRequiredColumn`] when no keyword column can be found.
pub fn map_columns(headers: &[String], opts: &MapperOptions) -> Result<ColumnMapping, SheetError> {
    let normalized: Vec<String> = headers.iter().map(|h| normalize(h)).collect();
    let mut consumed: HashMap<usize, usize> = HashMap::new();
    let mut mapping = ColumnMapping::default();

    for field in Field::ALL {
        let found = predicates(field).iter().enumerate().find_map(|(rank, predicate)| {
            normalized.iter().enumerate().find_map(|(index, header)| {
                if header.is_empty() || !predicate(header) {
                    return None;
                }
                match consumed.get(&index) {
                    Some(&taken_at) if rank >= taken_at => None,
                    _ => Some((index, rank)),
                }
            })
        });

        match found {
            Some((index, rank)) => {
                debug!(field = field.name(), header = %headers[index], rank, "mapped column");
                let entry = consumed.entry(index).or_insert(rank);
                *entry = (*entry).min(rank);
                mapping.columns.insert(
                    field,
                    MappedColumn {
                        index,
                        header: headers[index].clone(),
                        rank: Some(rank),
                    },
                );
            }
            None if field == Field::Keyword => {
                if !opts.first_column_fallback || headers.is_empty() {
                    return Err(SheetError::missing_keyword_column(headers));
                }
                let note = format!(
                    "no keyword header recognized; using first column {:?}",
                    headers[0]
                );
                warn!("{}", note);
                mapping.diagnostics.push(note);
                consumed.insert(0, 0);
                mapping.columns.insert(
                    field,
                    MappedColumn {
                        index: 0,
                        header: headers[0].clone(),
                        rank: None,
                    },
                );
            }
            None => {
                let note = format!("no column found for {}; values default to empty", field.name());
                debug!("{}", note);
                mapping.diagnostics.push(note);
            }
        }
    }

    Ok(mapping)
}
