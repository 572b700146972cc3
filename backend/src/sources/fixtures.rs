//! Workbook builders for tests.

use rust_xlsxwriter::Workbook as XlsxWorkbook;
use std::path::{Path, PathBuf};

pub(crate) enum FixtureCell<'a> {
    Text(&'a str),
    Num(f64),
}

pub(crate) struct FixtureSheet<'a> {
    pub name: &'a str,
    pub headers: &'a [&'a str],
    pub rows: Vec<Vec<FixtureCell<'a>>>,
}

pub(crate) fn sheet<'a>(
    name: &'a str,
    headers: &'a [&'a str],
    rows: Vec<Vec<FixtureCell<'a>>>,
) -> FixtureSheet<'a> {
    FixtureSheet {
        name,
        headers,
        rows,
    }
}

/// Serializes `sheets` into an in-memory `.xlsx`.
pub(crate) fn xlsx_bytes(sheets: &[FixtureSheet]) -> Vec<u8> {
    let mut workbook = XlsxWorkbook::new();
    for fixture in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(fixture.name).unwrap();
        for (col, header) in fixture.headers.iter().enumerate() {
            worksheet.write_string(0, col as u16, *header).unwrap();
        }
        for (row_idx, row) in fixture.rows.iter().enumerate() {
            let row_num = row_idx as u32 + 1;
            for (col, cell) in row.iter().enumerate() {
                match cell {
                    FixtureCell::Text(s) => worksheet.write_string(row_num, col as u16, *s).unwrap(),
                    FixtureCell::Num(n) => worksheet.write_number(row_num, col as u16, *n).unwrap(),
                };
            }
        }
    }
    workbook.save_to_buffer().unwrap()
}

pub(crate) fn write_xlsx(dir: &Path, file_name: &str, sheets: &[FixtureSheet]) -> PathBuf {
    let path = dir.join(file_name);
    std::fs::write(&path, xlsx_bytes(sheets)).unwrap();
    path
}

/// Mention rows as `(company, day, sentiment code, author)`.
pub(crate) fn mention_rows<'a>(rows: &[(&'a str, &'a str, f64, &'a str)]) -> Vec<Vec<FixtureCell<'a>>> {
    rows.iter()
        .map(|(company, day, sentiment, author)| {
            vec![
                FixtureCell::Text(*company),
                FixtureCell::Text(*day),
                FixtureCell::Num(*sentiment),
                FixtureCell::Text(*author),
            ]
        })
        .collect()
}

pub(crate) const MENTION_HEADERS: &[&str] = &["Company", "Date", "Sentiment", "Author"];
pub(crate) const ENGAGEMENT_HEADERS: &[&str] =
    &["author_name", "comment_count", "like_count", "share_count", "view_count"];

/// Engagement rows as `(author, comments, likes, shares, views)`.
pub(crate) fn engagement_rows<'a>(
    rows: &[(&'a str, f64, f64, f64, f64)],
) -> Vec<Vec<FixtureCell<'a>>> {
    rows.iter()
        .map(|(author, comments, likes, shares, views)| {
            vec![
                FixtureCell::Text(*author),
                FixtureCell::Num(*comments),
                FixtureCell::Num(*likes),
                FixtureCell::Num(*shares),
                FixtureCell::Num(*views),
            ]
        })
        .collect()
}
