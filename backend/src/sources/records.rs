//! Typed records decoded from sheet rows.
//!
//! Mention sheets must carry company, date and sentiment columns; author and
//! link are optional. Rows with a blank company, or whose date or sentiment
//! cannot be decoded, are skipped and counted in a [`LoadReport`]; they never
//! fail a report.
//! Engagement sheets must carry all four numeric columns, and unreadable
//! numbers count as zero.

use crate::error::ReportError;
use crate::sources::columns::{self, find_column, require_column};
use crate::sources::workbook::{Cell, Sheet};
use chrono::{Days, NaiveDate};
use common::model::sentiment::Sentiment;

/// Fallback name for rows without an author cell.
pub const UNKNOWN_AUTHOR: &str = "Unknown";

/// One mention row of a sentiment sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct Mention {
    pub company: String,
    pub day: NaiveDate,
    pub author: String,
    pub sentiment: Sentiment,
    pub link: Option<String>,
}

/// One post row of an engagement sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngagementRecord {
    pub author_name: String,
    pub comment_count: u64,
    pub like_count: u64,
    pub share_count: u64,
    pub view_count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub skipped_rows: usize,
}

pub fn mentions_from_sheet(sheet: &Sheet) -> Result<(Vec<Mention>, LoadReport), ReportError> {
    if sheet.headers.is_empty() && sheet.rows.is_empty() {
        return Ok((Vec::new(), LoadReport::default()));
    }

    let company_idx = require_column(sheet, &columns::COMPANY)?;
    let day_idx = require_column(sheet, &columns::DAY)?;
    let sentiment_idx = require_column(sheet, &columns::SENTIMENT)?;
    let author_idx = find_column(&sheet.headers, &columns::AUTHOR);
    let link_idx = find_column(&sheet.headers, &columns::LINK);

    let mut report = LoadReport::default();
    let mut mentions = Vec::with_capacity(sheet.rows.len());

    for row in &sheet.rows {
        report.total_rows += 1;
        let cell = |idx: usize| row.get(idx).unwrap_or(&Cell::Empty);

        let company = cell(company_idx).as_text().filter(|c| !c.trim().is_empty());
        let (Some(company), Some(day), Some(sentiment)) = (
            company,
            parse_day(cell(day_idx)),
            parse_sentiment(cell(sentiment_idx)),
        ) else {
            report.skipped_rows += 1;
            continue;
        };

        mentions.push(Mention {
            company,
            day,
            author: author_idx
                .and_then(|idx| cell(idx).as_text())
                .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
            sentiment,
            link: link_idx.and_then(|idx| cell(idx).as_text()),
        });
    }

    Ok((mentions, report))
}

pub fn engagement_from_sheet(sheet: &Sheet) -> Result<Vec<EngagementRecord>, ReportError> {
    if sheet.headers.is_empty() && sheet.rows.is_empty() {
        return Ok(Vec::new());
    }

    let author_idx = require_column(sheet, &columns::AUTHOR_NAME)?;
    let comment_idx = require_column(sheet, &columns::COMMENT_COUNT)?;
    let like_idx = require_column(sheet, &columns::LIKE_COUNT)?;
    let share_idx = require_column(sheet, &columns::SHARE_COUNT)?;
    let view_idx = require_column(sheet, &columns::VIEW_COUNT)?;

    Ok(sheet
        .rows
        .iter()
        .map(|row| {
            let cell = |idx: usize| row.get(idx).unwrap_or(&Cell::Empty);
            EngagementRecord {
                author_name: cell(author_idx)
                    .as_text()
                    .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
                comment_count: parse_count(cell(comment_idx)),
                like_count: parse_count(cell(like_idx)),
                share_count: parse_count(cell(share_idx)),
                view_count: parse_count(cell(view_idx)),
            }
        })
        .collect())
}

fn parse_sentiment(cell: &Cell) -> Option<Sentiment> {
    match cell {
        Cell::Number(n) if n.fract() == 0.0 => Sentiment::from_code(*n as i64),
        Cell::Text(s) => Sentiment::parse(s),
        _ => None,
    }
}

const TEXT_DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d.%m.%Y", "%d-%m-%Y"];

/// Accepts native dates, Excel serial numbers and the common text layouts.
/// Time-of-day suffixes (`2024-01-01 10:22:00`, `2024-01-01T10:22`) are
/// ignored.
pub fn parse_day(cell: &Cell) -> Option<NaiveDate> {
    match cell {
        Cell::Date(day) => Some(*day),
        Cell::Number(serial) => excel_serial_to_date(*serial),
        Cell::Text(raw) => {
            let date_part = raw.split(|c: char| c == ' ' || c == 'T').next()?;
            TEXT_DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
        }
        _ => None,
    }
}

/// Serial dates count days from 1899-12-30. Only values between 1950 and
/// 2100 are accepted so plain integers are not mistaken for dates.
fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !(18_264.0..=73_415.0).contains(&serial) {
        return None;
    }
    NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_days(Days::new(serial.trunc() as u64))
}

/// Non-negative integer or 0. Thousands separators in text are tolerated.
pub fn parse_count(cell: &Cell) -> u64 {
    let value = match cell {
        Cell::Number(n) => *n,
        Cell::Text(s) => {
            let s = s.replace(',', "");
            s.trim().parse::<f64>().unwrap_or(0.0)
        }
        _ => 0.0,
    };
    if value.is_finite() && value > 0.0 {
        value.round() as u64
    } else {
        0
    }
}
