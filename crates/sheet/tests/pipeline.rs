// ABOUTME: End-to-end tests: read a source sheet, aggregate against a mock site, write and re-read the export.
// ABOUTME: Uses httpmock for pages and tempfile for workbook round trips.

use std::fs;

use clipping_media::{CachedFetcher, Fetcher, MediaCategory};
use clipping_sheet::{
    process_table, read_table, survey, write_keywords_xlsx, write_pages_xlsx, AggregateOptions,
    MapperOptions, SurveyOptions, OUTPUT_HEADERS,
};
use httpmock::prelude::*;
use pretty_assertions::assert_eq;

const ARTICLE: &str = r#"<html><body>
  <a href="/getPDF?id=9">Baixar</a>
  <div class="imagem-container"><img data-src="/scans/capa.jpg"></div>
  <div class="video-container"><iframe src="https://player.example/embed/1"></iframe></div>
</body></html>"#;

fn opts() -> AggregateOptions {
    AggregateOptions {
        registration_date: "2024-05-01".to_string(),
        ..AggregateOptions::default()
    }
}

#[test]
fn csv_source_to_keywords_workbook() {
    let server = MockServer::start();
    let page = server.mock(|when, then| {
        when.method(GET).path("/materia/1");
        then.status(200).body(ARTICLE);
    });

    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("planilha.csv");
    fs::write(
        &source,
        format!(
            "Palavra-chave,Tipo da mídia,Título,Link da matéria cadastrada\n\
             \"eleições, política\",TV,Debate,{}\n",
            server.url("/materia/1")
        ),
    )
    .unwrap();

    let table = read_table(&source, None).unwrap();
    let fetcher = CachedFetcher::new(Fetcher::builder().build().unwrap());
    let (_, aggregation) =
        process_table(&table, &fetcher, &MapperOptions::default(), opts()).unwrap();

    // Four categories, two keywords, one page.
    page.assert_hits(1);
    assert_eq!(aggregation.len(), 2);

    let eleicoes = &aggregation["eleições"];
    assert_eq!(eleicoes[0].resolved_link, server.url("/getPDF?id=9"));
    assert_eq!(eleicoes[1].resolved_link, server.url("/scans/capa.jpg"));
    assert_eq!(eleicoes[2].resolved_link, "https://player.example/embed/1");
    assert_eq!(eleicoes[2].title, "Debate");
    assert_eq!(eleicoes[3].resolved_link, server.url("/materia/1.mp3"));
    assert_eq!(eleicoes[3].title, "eleições — untitled");

    let output = dir.path().join("planilha_keywords.xlsx");
    write_keywords_xlsx(&output, &aggregation).unwrap();

    let exported = read_table(&output, Some("Keywords")).unwrap();
    assert_eq!(exported.headers, OUTPUT_HEADERS.to_vec());
    assert_eq!(exported.rows.len(), 8);
    assert_eq!(exported.rows[0][0], "eleições");
    assert_eq!(exported.rows[0][3], "Portal");
    assert_eq!(exported.rows[3][3], "Rádio");
    assert_eq!(exported.rows[4][0], "política");
    assert_eq!(exported.rows[6][2], "Debate");
}

#[test]
fn missing_sheet_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.xlsx");
    write_keywords_xlsx(&output, &Default::default()).unwrap();

    let empty = read_table(&output, None).unwrap();
    assert_eq!(empty.headers.len(), 5);
    assert!(empty.rows.is_empty());

    let err = read_table(&output, Some("Planilha1")).unwrap_err();
    assert!(err.to_string().contains("Planilha1"));
}

#[test]
fn survey_writes_pages_sheet() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/materia/1");
        then.status(200).body(ARTICLE);
    });

    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("links.csv");
    fs::write(&source, format!("URL\n{}\n", server.url("/materia/1"))).unwrap();

    let table = read_table(&source, None).unwrap();
    let fetcher = Fetcher::builder().build().unwrap();
    let reports = survey(&table, &fetcher, &SurveyOptions::default());
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].media_category, MediaCategory::Tv);
    assert_eq!(reports[0].portal_link, server.url("/getPDF?id=9"));

    let output = dir.path().join("pages.xlsx");
    write_pages_xlsx(&output, &reports).unwrap();
    let pages = read_table(&output, Some("Pages")).unwrap();
    assert_eq!(pages.rows[0][0], server.url("/materia/1"));
    assert_eq!(pages.rows[0][1], "TV");
    assert_eq!(pages.rows[0][7], "2");
}
