use crate::error::ReportError;
use calamine::{open_workbook_auto, Data, DataType, Reader};
use chrono::NaiveDate;
use log::debug;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// A single decoded spreadsheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Date(NaiveDate),
    Bool(bool),
}

impl Cell {
    fn from_data(data: &Data) -> Cell {
        match data {
            Data::Empty | Data::Error(_) => Cell::Empty,
            Data::String(s) => Cell::from_text(s),
            Data::Int(i) => Cell::Number(*i as f64),
            Data::Float(f) => Cell::Number(*f),
            Data::Bool(b) => Cell::Bool(*b),
            Data::DateTime(_) | Data::DateTimeIso(_) => match data.as_date() {
                Some(day) => Cell::Date(day),
                None => Cell::from_text(&data.to_string()),
            },
            other => Cell::from_text(&other.to_string()),
        }
    }

    /// Builds a text cell, stripping the quoting and non-breaking spaces that
    /// spreadsheet exports tend to leave behind.
    pub fn from_text(raw: &str) -> Cell {
        let s = raw.trim();
        let s = s
            .strip_prefix('"')
            .and_then(|s| s.strip_suffix('"'))
            .or_else(|| s.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')))
            .unwrap_or(s);
        let s = s.replace('\u{00A0}', " ");
        let s = s.trim();
        if s.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Text rendition used for names and links.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Text(s) => Some(s.clone()),
            Cell::Number(n) if n.fract() == 0.0 => Some(format!("{}", *n as i64)),
            Cell::Number(n) => Some(n.to_string()),
            Cell::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
            Cell::Bool(b) => Some(b.to_string()),
        }
    }
}

/// One worksheet: its header row and the data rows below it.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

/// All sheets of one uploaded file, keyed by the data source it represents
/// (`combined_sources`, `official_facebook`, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct Workbook {
    pub source: String,
    sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new(source: impl Into<String>, sheets: Vec<Sheet>) -> Self {
        Self {
            source: source.into(),
            sheets,
        }
    }

    /// Exact name first, then case-insensitive.
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets
            .iter()
            .find(|s| s.name == name)
            .or_else(|| self.sheets.iter().find(|s| s.name.trim().eq_ignore_ascii_case(name)))
    }

    pub fn require_sheet(&self, name: &str) -> Result<&Sheet, ReportError> {
        self.sheet(name).ok_or_else(|| ReportError::MissingSheet {
            file: self.source.clone(),
            sheet: name.to_string(),
        })
    }

    pub fn first_sheet(&self) -> Option<&Sheet> {
        self.sheets.first()
    }

    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.sheets.iter().map(|s| s.name.as_str())
    }
}

/// Reads `path` into a [`Workbook`] named `source`.
///
/// Spreadsheet formats go through calamine; `.csv` exports become a single
/// sheet named after the source.
pub fn load_workbook(source: &str, path: &Path) -> Result<Workbook, ReportError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let workbook = match extension.as_str() {
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => load_spreadsheet(source, path)?,
        "csv" => load_csv(source, path)?,
        other => {
            return Err(ReportError::malformed(
                source,
                format!("unsupported file type '.{}'", other),
            ))
        }
    };

    debug!(
        "Loaded '{}' with sheets [{}]",
        source,
        workbook.sheet_names().collect::<Vec<_>>().join(", ")
    );
    Ok(workbook)
}

fn load_spreadsheet(source: &str, path: &Path) -> Result<Workbook, ReportError> {
    let mut reader = open_workbook_auto(path).map_err(|e| ReportError::malformed(source, e))?;

    let mut sheets = Vec::new();
    for name in reader.sheet_names() {
        let range = reader
            .worksheet_range(&name)
            .map_err(|e| ReportError::malformed(source, format!("sheet '{}': {}", name, e)))?;

        let mut rows = range.rows();
        let headers: Vec<String> = match rows.next() {
            Some(header) => header.iter().map(|c| c.to_string().trim().to_string()).collect(),
            None => Vec::new(),
        };
        let rows: Vec<Vec<Cell>> = rows
            .map(|row| row.iter().map(Cell::from_data).collect::<Vec<_>>())
            .filter(|row| !row.iter().all(Cell::is_empty))
            .collect();

        debug!("Sheet '{}' of '{}': {} data rows", name, source, rows.len());
        sheets.push(Sheet {
            name,
            headers,
            rows,
        });
    }

    Ok(Workbook::new(source, sheets))
}

/// Picks whichever of `, ; \t |` shows up most in the header line.
pub(crate) fn detect_delimiter(header_line: &str) -> u8 {
    [b',', b';', b'\t', b'|']
        .iter()
        .max_by_key(|&&d| header_line.matches(d as char).count())
        .copied()
        .unwrap_or(b',')
}

fn load_csv(source: &str, path: &Path) -> Result<Workbook, ReportError> {
    let mut header_line = String::new();
    BufReader::new(File::open(path)?)
        .read_line(&mut header_line)
        .map_err(|e| ReportError::malformed(source, e))?;
    let delimiter = detect_delimiter(header_line.trim_end_matches(&['\n', '\r'][..]));

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_path(path)
        .map_err(|e| ReportError::malformed(source, e))?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ReportError::malformed(source, e))?
        .iter()
        .map(|h| h.trim().trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ReportError::malformed(source, e))?;
        let row: Vec<Cell> = record.iter().map(Cell::from_text).collect();
        if !row.iter().all(Cell::is_empty) {
            rows.push(row);
        }
    }

    Ok(Workbook::new(
        source,
        vec![Sheet {
            name: source.to_string(),
            headers,
            rows,
        }],
    ))
}
