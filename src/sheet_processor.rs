//! Row extraction: turns one classified sheet into normalized records.

use crate::analysis::{Record, Sheet, UNKNOWN};
use crate::columns::{detect_columns, ColumnMap};
use crate::month::normalize_month;
use crate::report_type::ReportType;
use crate::sheet_parser::{Cell, RawSheet};
use crate::status::{EngineStatuses, RecordStatus};
use std::collections::BTreeSet;
use tracing::{debug, info};

/// How a report type decides a row's status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusRule {
    /// Keyword match on the single status column.
    Keyword,
    /// Google/Bing/Yandex triad.
    EngineTriad,
}

impl ReportType {
    pub fn status_rule(self) -> StatusRule {
        if self.uses_engine_statuses() {
            StatusRule::EngineTriad
        } else {
            StatusRule::Keyword
        }
    }
}

/// A processed sheet plus the distinct dimension values it contributed.
#[derive(Debug, Clone)]
pub struct ProcessedSheet {
    pub sheet: Sheet,
    pub months: BTreeSet<String>,
    pub markets: BTreeSet<String>,
    pub content_owners: BTreeSet<String>,
}

impl ProcessedSheet {
    fn empty(report_type: ReportType) -> Self {
        Self {
            sheet: Sheet::empty(report_type),
            months: BTreeSet::new(),
            markets: BTreeSet::new(),
            content_owners: BTreeSet::new(),
        }
    }
}

/// Trimmed text of the cell at `idx`, empty when the column is missing.
fn text_at(row: &[Cell], idx: Option<usize>) -> String {
    idx.and_then(|i| row.get(i))
        .map(|c| c.to_text().trim().to_string())
        .unwrap_or_default()
}

fn is_blank_row(row: &[Cell]) -> bool {
    row.iter().all(Cell::is_blank)
}

/// Extract records from one sheet using the rules of `report_type`.
pub fn process_sheet(raw: &RawSheet, report_type: ReportType) -> ProcessedSheet {
    if raw.rows.is_empty() {
        debug!("Sheet '{}' ({}) has no data rows", raw.name, report_type);
        return ProcessedSheet::empty(report_type);
    }

    let columns = detect_columns(&raw.headers, Some(report_type));
    debug!("Sheet '{}' ({}) columns: {:?}", raw.name, report_type, columns);

    let rule = report_type.status_rule();
    let mut out = ProcessedSheet::empty(report_type);
    let mut records = Vec::with_capacity(raw.rows.len());
    let mut active_count = 0usize;
    let mut removed_count = 0usize;

    for row in &raw.rows {
        if is_blank_row(row) {
            continue;
        }

        let Some((record, status)) = extract_record(row, &columns, rule) else {
            continue;
        };

        match status {
            RecordStatus::Active => active_count += 1,
            RecordStatus::Removed => removed_count += 1,
            RecordStatus::Unknown => {}
        }

        if !record.month.is_empty() {
            out.months.insert(record.month.clone());
        }
        if record.market != UNKNOWN {
            out.markets.insert(record.market.clone());
        }
        if record.content_owner != UNKNOWN {
            out.content_owners.insert(record.content_owner.clone());
        }

        records.push(record);
    }

    out.sheet = Sheet::new(report_type, records, active_count, removed_count);

    info!(
        "Sheet '{}' ({}): {} records, {} active, {} removed",
        raw.name,
        report_type,
        out.sheet.total_urls,
        out.sheet.active_count,
        out.sheet.removed_count
    );

    out
}

/// Build the record for one non-blank row. Rows with neither a status nor a
/// URL carry no signal and yield `None`.
fn extract_record(
    row: &[Cell],
    columns: &ColumnMap,
    rule: StatusRule,
) -> Option<(Record, RecordStatus)> {
    let mut status = text_at(row, columns.status);
    let url = text_at(row, columns.url);
    let market = text_at(row, columns.market);
    let content_owner = text_at(row, columns.content_owner);
    let month = columns
        .month
        .and_then(|i| row.get(i))
        .map(normalize_month)
        .unwrap_or_default();

    if status.is_empty() && url.is_empty() {
        return None;
    }

    let normalized = match rule {
        StatusRule::Keyword => RecordStatus::from_label(&status),
        StatusRule::EngineTriad => {
            let google = text_at(row, columns.google_status);
            let bing = text_at(row, columns.bing_status);
            let yandex = text_at(row, columns.yandex_status);
            let engines = EngineStatuses {
                google: &google,
                bing: &bing,
                yandex: &yandex,
            };
            let (normalized, label) = engines.resolve();
            if let Some(label) = label {
                status = label.to_string();
            }
            normalized
        }
    };

    let record = Record {
        url,
        status: or_unknown(status),
        market: or_unknown(market),
        month,
        content_owner: or_unknown(content_owner),
    };
    Some((record, normalized))
}

fn or_unknown(value: String) -> String {
    if value.is_empty() {
        UNKNOWN.to_string()
    } else {
        value
    }
}
