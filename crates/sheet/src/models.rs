// ABOUTME: Data model for keyword processing: source tables, canonical rows, link candidates, output records.
// ABOUTME: Output records serialize with the spreadsheet header names as JSON keys.

use std::collections::BTreeMap;

use clipping_media::MediaCategory;
use serde::{Deserialize, Serialize};

/// Header text of the keyword column in the output sheet.
pub const HEADER_KEYWORD: &str = "PALAVRAS-CHAVE";
/// Header text of the registration date column in the output sheet.
pub const HEADER_REGISTRATION_DATE: &str = "DATA DE CADASTRO";
/// Header text of the title column in the output sheet.
pub const HEADER_TITLE: &str = "TÍTULO DA MATÉRIA";
/// Header text of the media type column in the output sheet.
pub const HEADER_MEDIA_CATEGORY: &str = "TIPO DE MÍDIA";
/// Header text of the resolved link column in the output sheet.
pub const HEADER_RESOLVED_LINK: &str = "LINK DA MATÉRIA CADASTRADA";

/// Output columns, in order.
pub const OUTPUT_HEADERS: [&str; 5] = [
    HEADER_KEYWORD,
    HEADER_REGISTRATION_DATE,
    HEADER_TITLE,
    HEADER_MEDIA_CATEGORY,
    HEADER_RESOLVED_LINK,
];

/// A sheet as read from disk: one header row and string cells.
///
/// Rows may be shorter or longer than the header row; missing cells read as empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Cell at `column` in `row`, or "" when the row is short.
    pub fn cell<'a>(row: &'a [String], column: usize) -> &'a str {
        row.get(column).map(String::as_str).unwrap_or("")
    }

    /// One row as an ordered header -> value list.
    pub fn raw_row(&self, index: usize) -> Vec<(&str, &str)> {
        let row = self.rows.get(index).map(Vec::as_slice).unwrap_or(&[]);
        self.headers
            .iter()
            .enumerate()
            .map(|(col, header)| (header.as_str(), Table::cell(row, col)))
            .collect()
    }
}

/// The canonical fields a source column can be mapped onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Keyword,
    RegistrationDate,
    Title,
    MediaCategory,
    LinkWebImage,
    LinkWebText,
    RegisteredLink,
    OriginalLink,
}

impl Field {
    /// All fields, in mapping order.
    pub const ALL: [Field; 8] = [
        Field::Keyword,
        Field::RegistrationDate,
        Field::Title,
        Field::MediaCategory,
        Field::LinkWebImage,
        Field::LinkWebText,
        Field::RegisteredLink,
        Field::OriginalLink,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Field::Keyword => "Keyword",
            Field::RegistrationDate => "RegistrationDate",
            Field::Title => "Title",
            Field::MediaCategory => "MediaCategory",
            Field::LinkWebImage => "LinkWebImage",
            Field::LinkWebText => "LinkWebText",
            Field::RegisteredLink => "RegisteredLink",
            Field::OriginalLink => "OriginalLink",
        }
    }
}

/// A source row restricted to the canonical fields. Absent fields are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CanonicalRow {
    pub keyword: String,
    pub registration_date: String,
    pub title: String,
    pub media_category: String,
    pub link_web_text: String,
    pub link_web_image: String,
    pub registered_link: String,
    pub original_link: String,
}

impl CanonicalRow {
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Keyword => &self.keyword,
            Field::RegistrationDate => &self.registration_date,
            Field::Title => &self.title,
            Field::MediaCategory => &self.media_category,
            Field::LinkWebImage => &self.link_web_image,
            Field::LinkWebText => &self.link_web_text,
            Field::RegisteredLink => &self.registered_link,
            Field::OriginalLink => &self.original_link,
        }
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        match field {
            Field::Keyword => self.keyword = value,
            Field::RegistrationDate => self.registration_date = value,
            Field::Title => self.title = value,
            Field::MediaCategory => self.media_category = value,
            Field::LinkWebImage => self.link_web_image = value,
            Field::LinkWebText => self.link_web_text = value,
            Field::RegisteredLink => self.registered_link = value,
            Field::OriginalLink => self.original_link = value,
        }
    }

    /// The keywords this row contributes to: the keyword cell split on commas, trimmed.
    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.keyword
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    /// The media category of this row, if its label is recognized.
    pub fn category(&self) -> Option<MediaCategory> {
        MediaCategory::from_label(&self.media_category)
    }
}

/// All rows sharing one trimmed, case-preserved keyword.
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordGroup {
    pub keyword: String,
    pub rows: Vec<CanonicalRow>,
}

/// Where a seed link came from. Declaration order is selection priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Provenance {
    WebText,
    WebImage,
    Registered,
    Original,
    Synthesized,
}

/// A candidate seed link and its origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkCandidate {
    pub url: String,
    pub provenance: Provenance,
}

/// One output row: a keyword reported under one media category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputRecord {
    #[serde(rename = "PALAVRAS-CHAVE")]
    pub keyword: String,
    #[serde(rename = "DATA DE CADASTRO", default)]
    pub registration_date: String,
    #[serde(rename = "TÍTULO DA MATÉRIA", default)]
    pub title: String,
    #[serde(rename = "TIPO DE MÍDIA")]
    pub media_category: MediaCategory,
    #[serde(rename = "LINK DA MATÉRIA CADASTRADA", default)]
    pub resolved_link: String,
}

impl OutputRecord {
    /// The record as output cells, in column order.
    pub fn cells(&self) -> [String; 5] {
        [
            self.keyword.clone(),
            self.registration_date.clone(),
            self.title.clone(),
            self.media_category.label().to_string(),
            self.resolved_link.clone(),
        ]
    }
}

/// Aggregation result: keyword -> its records in category order.
pub type Aggregation = BTreeMap<String, Vec<OutputRecord>>;
