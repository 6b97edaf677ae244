// ABOUTME: Spreadsheet side of clipping: column mapping, keyword aggregation, reading and export.
// ABOUTME: Builds on clipping-media for every page fetch and link resolution.

pub mod aggregate;
pub mod error;
pub mod export;
pub mod mapper;
pub mod models;
pub mod reader;
pub mod survey;

pub use aggregate::{
    group_rows, process_table, select_seed, synthesized_seed, AggregateOptions, Aggregator,
    DEFAULT_FALLBACK_LINK_BASE,
};
pub use error::SheetError;
pub use export::{
    aggregation_from_json, column_widths, keyword_rows, write_keywords_xlsx, write_pages_xlsx,
    write_sheet, Envelope, KEYWORDS_SHEET, PAGES_SHEET,
};
pub use mapper::{locate, map_columns, predicates, ColumnMapping, MappedColumn, MapperOptions};
pub use models::{
    Aggregation, CanonicalRow, Field, KeywordGroup, LinkCandidate, OutputRecord, Provenance, Table,
    OUTPUT_HEADERS,
};
pub use reader::{read_csv, read_table, render_cell};
pub use survey::{survey, PageReport, SurveyOptions, PAGE_HEADERS};

pub use clipping_media::MediaCategory;
