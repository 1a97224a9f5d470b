//! Analysis result types.
//!
//! Field names serialize in camelCase, the shape the dashboard consumes.

use crate::report_type::ReportType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Label used when a market, owner or status cell is blank.
pub const UNKNOWN: &str = "Unknown";

/// One normalized row of a report sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub url: String,
    /// Display status, never empty.
    pub status: String,
    pub market: String,
    /// `Mon-YY` label, pass-through text, or empty.
    pub month: String,
    pub content_owner: String,
}

/// Percentage of removed records, 0 for an empty set.
pub fn removal_rate(removed: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    removed as f64 / total as f64 * 100.0
}

/// Processed result of one report sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sheet {
    pub report_type: ReportType,
    pub full_name: String,
    pub records: Vec<Record>,
    pub total_urls: usize,
    pub active_count: usize,
    pub removed_count: usize,
    pub removal_rate: f64,
}

impl Sheet {
    /// Build a sheet; totals and rate are derived from the arguments.
    pub fn new(
        report_type: ReportType,
        records: Vec<Record>,
        active_count: usize,
        removed_count: usize,
    ) -> Self {
        let total_urls = records.len();
        Self {
            report_type,
            full_name: report_type.full_name().to_string(),
            records,
            total_urls,
            active_count,
            removed_count,
            removal_rate: removal_rate(removed_count, total_urls),
        }
    }

    /// All-zero sheet for a report type missing from the workbook.
    pub fn empty(report_type: ReportType) -> Self {
        Self::new(report_type, Vec::new(), 0, 0)
    }

    pub fn is_empty(&self) -> bool {
        self.total_urls == 0
    }
}

/// Snapshot produced by one successful upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkbookAnalysis {
    /// Always four sheets, in [`ReportType::ALL`] order.
    pub sheets: Vec<Sheet>,
    pub total_urls: usize,
    pub active_count: usize,
    pub removed_count: usize,
    pub removal_rate: f64,
    /// Unauthorized-search plus ads-tutorial records.
    pub usr_atsm_count: usize,
    /// Both password-sharing reports combined.
    pub pssm_psmp_count: usize,
    pub months: Vec<String>,
    pub markets: Vec<String>,
    pub content_owners: Vec<String>,
}

impl WorkbookAnalysis {
    pub fn sheet(&self, report_type: ReportType) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.report_type == report_type)
    }

    /// False when no recognized sheet produced a record.
    pub fn has_data(&self) -> bool {
        self.sheets.iter().any(|s| !s.is_empty())
    }

    /// Records of every sheet, in canonical sheet order.
    pub fn all_records(&self) -> impl Iterator<Item = &Record> {
        self.sheets.iter().flat_map(|s| s.records.iter())
    }
}

/// Market rollup row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketData {
    pub market: String,
    pub active_count: usize,
    pub removed_count: usize,
    pub total_urls: usize,
}

/// Content-owner rollup row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentOwnerData {
    pub name: String,
    pub count: usize,
    pub percentage: f64,
}

/// Selected values per dimension. An empty set means no restriction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    #[serde(default)]
    pub months: BTreeSet<String>,
    #[serde(default)]
    pub markets: BTreeSet<String>,
    #[serde(default)]
    pub content_owners: BTreeSet<String>,
}

impl FilterState {
    pub fn is_empty(&self) -> bool {
        self.months.is_empty() && self.markets.is_empty() && self.content_owners.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removal_rate() {
        assert_eq!(removal_rate(0, 0), 0.0);
        assert_eq!(removal_rate(5, 0), 0.0);
        assert_eq!(removal_rate(1, 4), 25.0);
        assert!((removal_rate(1, 3) - 33.333_333).abs() < 1e-4);
    }

    #[test]
    fn test_empty_sheet() {
        let sheet = Sheet::empty(ReportType::AdsTutorials);
        assert_eq!(sheet.full_name, "Ads Tutorials- Social Media");
        assert_eq!(sheet.total_urls, 0);
        assert_eq!(sheet.removal_rate, 0.0);
        assert!(sheet.is_empty());
    }

    #[test]
    fn test_serializes_camel_case() {
        let sheet = Sheet::empty(ReportType::UnauthorizedSearch);
        let json = serde_json::to_value(&sheet).unwrap();
        assert_eq!(json["reportType"], "USR");
        assert_eq!(json["fullName"], "Unauthorized Search Result");
        assert_eq!(json["totalUrls"], 0);
    }
}
