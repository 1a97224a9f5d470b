//! Filters and rollups over normalized records.
//!
//! These recompute active/removed with the keyword rule only. For the
//! unauthorized-search report the display status was already rewritten to
//! `Approved/Up` or `Pending` at extraction, so the keyword rule agrees with
//! the engine rule for those rows; raw engine labels left on unresolved rows
//! (e.g. `Down`) can still count as removed here while they counted as
//! unknown at ingestion.

use crate::analysis::{
    removal_rate, ContentOwnerData, FilterState, MarketData, Record, Sheet, WorkbookAnalysis,
    UNKNOWN,
};
use crate::report_type::ReportType;
use crate::status::RecordStatus;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

fn passes(selection: &BTreeSet<String>, value: &str) -> bool {
    if selection.is_empty() {
        return true;
    }
    let value = value.trim();
    value.is_empty() || selection.contains(value)
}

/// Keep records matching every non-empty selection. A blank value never
/// excludes a record; order is preserved.
pub fn filter_records(records: &[Record], filter: &FilterState) -> Vec<Record> {
    if filter.is_empty() {
        return records.to_vec();
    }
    records
        .iter()
        .filter(|r| {
            passes(&filter.months, &r.month)
                && passes(&filter.markets, &r.market)
                && passes(&filter.content_owners, &r.content_owner)
        })
        .cloned()
        .collect()
}

/// Active/removed tally by keyword rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SheetStats {
    pub active: usize,
    pub removed: usize,
}

pub fn sheet_stats(records: &[Record]) -> SheetStats {
    records
        .iter()
        .fold(SheetStats::default(), |mut acc, r| {
            match RecordStatus::from_label(&r.status) {
                RecordStatus::Active => acc.active += 1,
                RecordStatus::Removed => acc.removed += 1,
                RecordStatus::Unknown => {}
            }
            acc
        })
}

fn label_or_unknown(value: &str) -> &str {
    if value.is_empty() {
        UNKNOWN
    } else {
        value
    }
}

/// Per-market active/removed counts, largest first. A market's total is its
/// active plus removed records; unknown-status records add nothing.
pub fn market_rollup(records: &[Record]) -> Vec<MarketData> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut rows: Vec<MarketData> = Vec::new();

    for record in records {
        let market = label_or_unknown(&record.market);
        let slot = *index.entry(market).or_insert_with(|| {
            rows.push(MarketData {
                market: market.to_string(),
                active_count: 0,
                removed_count: 0,
                total_urls: 0,
            });
            rows.len() - 1
        });
        let row = &mut rows[slot];
        match RecordStatus::from_label(&record.status) {
            RecordStatus::Active => row.active_count += 1,
            RecordStatus::Removed => row.removed_count += 1,
            RecordStatus::Unknown => {}
        }
    }

    for row in &mut rows {
        row.total_urls = row.active_count + row.removed_count;
    }
    // Stable: ties keep first-seen order
    rows.sort_by(|a, b| b.total_urls.cmp(&a.total_urls));
    rows
}

/// Record count and share per content owner, largest first.
pub fn content_owner_rollup<'a, I>(records: I) -> Vec<ContentOwnerData>
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<(&str, usize)> = Vec::new();
    let mut total = 0usize;

    for record in records {
        let owner = label_or_unknown(&record.content_owner);
        match index.get(owner) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(owner, counts.len());
                counts.push((owner, 1));
            }
        }
        total += 1;
    }

    let mut rows: Vec<ContentOwnerData> = counts
        .into_iter()
        .map(|(name, count)| ContentOwnerData {
            name: name.to_string(),
            count,
            percentage: if total > 0 {
                count as f64 / total as f64 * 100.0
            } else {
                0.0
            },
        })
        .collect();
    rows.sort_by(|a, b| b.count.cmp(&a.count));
    rows
}

/// Which record dimension to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RecordField {
    Url,
    Status,
    Market,
    Month,
    ContentOwner,
}

impl RecordField {
    pub fn get(self, record: &Record) -> &str {
        match self {
            Self::Url => &record.url,
            Self::Status => &record.status,
            Self::Market => &record.market,
            Self::Month => &record.month,
            Self::ContentOwner => &record.content_owner,
        }
    }
}

/// Sorted distinct non-empty values of one field.
pub fn unique_values(records: &[Record], field: RecordField) -> Vec<String> {
    records
        .iter()
        .map(|r| field.get(r))
        .filter(|v| !v.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

impl Sheet {
    /// Derived copy holding only the records that pass `filter`, with counts
    /// re-tallied from scratch.
    pub fn filtered(&self, filter: &FilterState) -> Sheet {
        let records = filter_records(&self.records, filter);
        let stats = sheet_stats(&records);
        Sheet::new(self.report_type, records, stats.active, stats.removed)
    }
}

/// Dashboard view of a stored analysis under a filter selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilteredAnalysis {
    pub sheets: Vec<Sheet>,
    pub total_urls: usize,
    pub active_count: usize,
    pub removed_count: usize,
    pub removal_rate: f64,
    pub usr_count: usize,
    pub atsm_count: usize,
    pub pssm_count: usize,
    pub psmp_count: usize,
    pub content_owners: Vec<ContentOwnerData>,
}

/// Re-derive every sheet under `filter`. The analysis itself is untouched.
pub fn filter_analysis(analysis: &WorkbookAnalysis, filter: &FilterState) -> FilteredAnalysis {
    let sheets: Vec<Sheet> = analysis.sheets.iter().map(|s| s.filtered(filter)).collect();

    let total_urls: usize = sheets.iter().map(|s| s.total_urls).sum();
    let active_count: usize = sheets.iter().map(|s| s.active_count).sum();
    let removed_count: usize = sheets.iter().map(|s| s.removed_count).sum();
    let count_of = |t: ReportType| {
        sheets
            .iter()
            .find(|s| s.report_type == t)
            .map_or(0, |s| s.total_urls)
    };

    let usr_count = count_of(ReportType::UnauthorizedSearch);
    let atsm_count = count_of(ReportType::AdsTutorials);
    let pssm_count = count_of(ReportType::PasswordSharingSocial);
    let psmp_count = count_of(ReportType::PasswordSharingMarketplace);
    let content_owners = content_owner_rollup(sheets.iter().flat_map(|s| s.records.iter()));

    FilteredAnalysis {
        total_urls,
        active_count,
        removed_count,
        removal_rate: removal_rate(removed_count, total_urls),
        usr_count,
        atsm_count,
        pssm_count,
        psmp_count,
        content_owners,
        sheets,
    }
}

/// Market rollup of one sheet under the dashboard filter. `market` then
/// narrows to a single country; `None` or `all` keeps every market.
pub fn sheet_market_view(
    sheet: &Sheet,
    filter: &FilterState,
    market: Option<&str>,
) -> Vec<MarketData> {
    let records = filter_records(&sheet.records, filter);
    let country = market.map(str::trim).filter(|m| !m.is_empty() && *m != "all");
    let records = match country {
        Some(country) => {
            let only = FilterState {
                markets: BTreeSet::from([country.to_string()]),
                ..Default::default()
            };
            filter_records(&records, &only)
        }
        None => records,
    };
    market_rollup(&records)
}

/// Content-owner rollup over the records of `sheets` that pass `filter`.
pub fn filtered_content_owners<'a, I>(sheets: I, filter: &FilterState) -> Vec<ContentOwnerData>
where
    I: IntoIterator<Item = &'a Sheet>,
{
    let records: Vec<Record> = sheets
        .into_iter()
        .flat_map(|s| filter_records(&s.records, filter))
        .collect();
    content_owner_rollup(&records)
}
