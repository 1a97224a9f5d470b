//! Workbook reading for Excel (.xlsx/.xlsm/.xlsb/.xls), OpenDocument (.ods)
//! and delimited text (.csv/.tsv).
//!
//! The container is detected from the bytes themselves; file names only
//! matter for naming the single sheet of a CSV upload.

use crate::error::{ParseError, ParseResult};
use calamine::{open_workbook_from_rs, Data, Ods, Reader, Xls, Xlsb, Xlsx};
use std::borrow::Cow;
use std::fmt;
use std::io::{Cursor, Read, Seek};

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const CFB_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Sheet name given to delimited text when no file name is known.
pub const DEFAULT_CSV_SHEET_NAME: &str = "Sheet1";

/// An untyped cell value. Date cells are kept as their numeric serial.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
    Bool(bool),
}

impl Cell {
    /// String form of the cell, untrimmed.
    pub fn to_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => format_number(*n),
            Cell::Bool(b) => b.to_string(),
        }
    }

    /// Blank for row-skipping purposes: empty, whitespace-free empty text, or
    /// the `null`/`undefined` strings some exporters leave behind.
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.is_empty() || s == "null" || s == "undefined",
            _ => false,
        }
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => Cell::Empty,
            Data::String(s) => Cell::Text(s.clone()),
            Data::Int(i) => Cell::Number(*i as f64),
            Data::Float(f) => Cell::Number(*f),
            Data::Bool(b) => Cell::Bool(*b),
            Data::DateTime(dt) => Cell::Number(dt.as_f64()),
            Data::DateTimeIso(s) => Cell::Text(s.clone()),
            Data::DurationIso(s) => Cell::Text(s.clone()),
            Data::Error(e) => Cell::Text(e.to_string()),
        }
    }
}

/// Avoid trailing ".0" for whole numbers.
fn format_number(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        format!("{}", f as i64)
    } else {
        format!("{}", f)
    }
}

/// One sheet as read from the container: the header row plus data rows.
#[derive(Debug, Clone)]
pub struct RawSheet {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl RawSheet {
    /// Split a full grid into header row and data rows.
    pub fn from_grid(name: &str, mut grid: Vec<Vec<Cell>>) -> Self {
        let headers = if grid.is_empty() {
            Vec::new()
        } else {
            grid.remove(0).iter().map(Cell::to_text).collect()
        };
        Self {
            name: name.to_string(),
            headers,
            rows: grid,
        }
    }
}

/// Read every sheet of an uploaded file.
///
/// `csv_sheet_name` names the sheet when the bytes turn out to be delimited
/// text. Workbooks keep their own sheet names.
pub fn read_workbook(data: &[u8], csv_sheet_name: &str) -> ParseResult<Vec<RawSheet>> {
    if data.is_empty() {
        return Err(ParseError::EmptyInput);
    }

    if data.starts_with(ZIP_MAGIC) {
        return read_zip_workbook(data);
    }

    if data.starts_with(CFB_MAGIC) {
        let workbook = open_workbook_from_rs::<Xls<_>, _>(Cursor::new(data))
            .map_err(|e| ParseError::Workbook(e.to_string()))?;
        return Ok(collect_sheets(workbook));
    }

    let text = data.strip_prefix(UTF8_BOM).unwrap_or(data);
    if let Some(text) = decode_text(text) {
        return parse_csv(csv_sheet_name, text.as_bytes());
    }

    Err(ParseError::UnsupportedContainer)
}

/// Zip containers: xlsx/xlsm first, then xlsb, then ods.
fn read_zip_workbook(data: &[u8]) -> ParseResult<Vec<RawSheet>> {
    let xlsx_err = match open_workbook_from_rs::<Xlsx<_>, _>(Cursor::new(data)) {
        Ok(workbook) => return Ok(collect_sheets(workbook)),
        Err(e) => e,
    };

    if let Ok(workbook) = open_workbook_from_rs::<Xlsb<_>, _>(Cursor::new(data)) {
        return Ok(collect_sheets(workbook));
    }
    if let Ok(workbook) = open_workbook_from_rs::<Ods<_>, _>(Cursor::new(data)) {
        return Ok(collect_sheets(workbook));
    }

    Err(ParseError::Workbook(xlsx_err.to_string()))
}

/// Load every worksheet. A sheet the reader cannot load is skipped so the
/// rest of the workbook still counts.
fn collect_sheets<RS, R>(mut workbook: R) -> Vec<RawSheet>
where
    RS: Read + Seek,
    R: Reader<RS>,
    R::Error: fmt::Display,
{
    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    let mut sheets = Vec::with_capacity(sheet_names.len());

    for name in &sheet_names {
        let range = match workbook.worksheet_range(name) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("Skipping sheet '{}': {}", name, e);
                continue;
            }
        };

        let grid: Vec<Vec<Cell>> = range
            .rows()
            .map(|row| row.iter().map(Cell::from).collect())
            .collect();
        sheets.push(RawSheet::from_grid(name, grid));
    }

    sheets
}

/// Text without NUL bytes. UTF-8 is tried first; anything else is read as
/// Windows-1252, the code page Excel uses for CSV exports.
fn decode_text(data: &[u8]) -> Option<Cow<'_, str>> {
    if data.contains(&0) {
        return None;
    }
    match std::str::from_utf8(data) {
        Ok(s) => Some(Cow::Borrowed(s)),
        Err(_) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(data);
            Some(decoded)
        }
    }
}

/// Pick the delimiter that occurs most often on the first line.
fn sniff_delimiter(data: &[u8]) -> u8 {
    let first_line = data.split(|b| *b == b'\n').next().unwrap_or(data);
    let count = |d: u8| first_line.iter().filter(|b| **b == d).count();

    let mut best = b',';
    for candidate in [b';', b'\t'] {
        if count(candidate) > count(best) {
            best = candidate;
        }
    }
    best
}

/// Parse delimited text into a single sheet. The first record is the header.
fn parse_csv(sheet_name: &str, data: &[u8]) -> ParseResult<Vec<RawSheet>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(false)
        .delimiter(sniff_delimiter(data))
        .from_reader(data);

    let mut grid = Vec::new();
    for result in reader.records() {
        let record = result?;
        grid.push(record.iter().map(infer_csv_cell).collect());
    }

    Ok(vec![RawSheet::from_grid(sheet_name, grid)])
}

/// Numeric-looking CSV fields become numbers so serials and years typed into
/// a CSV behave like their spreadsheet counterparts.
fn infer_csv_cell(field: &str) -> Cell {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return Cell::Empty;
    }
    let numeric_shape = trimmed
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'+' | b'e' | b'E'))
        && trimmed.bytes().any(|b| b.is_ascii_digit());
    if numeric_shape {
        if let Ok(n) = trimmed.parse::<f64>() {
            if n.is_finite() {
                return Cell::Number(n);
            }
        }
    }
    Cell::Text(field.to_string())
}

/// Sheet name for a CSV upload: the file stem, without directories.
pub fn csv_sheet_name(file_name: &str) -> String {
    let base = file_name
        .rsplit('/')
        .next()
        .unwrap_or(file_name)
        .rsplit('\\')
        .next()
        .unwrap_or(file_name);
    match base.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => base.to_string(),
    }
}
