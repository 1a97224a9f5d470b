//! Workbook-level aggregation: the `parse` entry point.

use crate::analysis::{removal_rate, Sheet, WorkbookAnalysis};
use crate::error::ParseResult;
use crate::report_type::ReportType;
use crate::sheet_parser::{csv_sheet_name, read_workbook, RawSheet, DEFAULT_CSV_SHEET_NAME};
use crate::sheet_processor::{process_sheet, ProcessedSheet};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// Parse an uploaded file into a full analysis.
///
/// Fails only when the bytes are not a readable workbook or delimited text.
/// A workbook without any recognized sheet yields four empty sheets.
pub fn parse(data: &[u8]) -> ParseResult<WorkbookAnalysis> {
    let sheets = read_workbook(data, DEFAULT_CSV_SHEET_NAME)?;
    Ok(analyze_sheets(&sheets))
}

/// Like [`parse`], but a CSV upload's sheet is named after the file stem so
/// `Password Sharing-Marketplace.csv` is recognized.
pub fn parse_named(file_name: &str, data: &[u8]) -> ParseResult<WorkbookAnalysis> {
    let sheets = read_workbook(data, &csv_sheet_name(file_name))?;
    Ok(analyze_sheets(&sheets))
}

/// Classify, process and merge already-read sheets.
pub fn analyze_sheets(raw_sheets: &[RawSheet]) -> WorkbookAnalysis {
    let mut processed: BTreeMap<ReportType, Sheet> = BTreeMap::new();
    let mut months = BTreeSet::new();
    let mut markets = BTreeSet::new();
    let mut content_owners = BTreeSet::new();

    for raw in raw_sheets {
        let Some(report_type) = ReportType::classify(&raw.name) else {
            debug!("Ignoring unrecognized sheet '{}'", raw.name);
            continue;
        };
        if processed.contains_key(&report_type) {
            debug!(
                "Ignoring sheet '{}': {} already read from an earlier sheet",
                raw.name, report_type
            );
            continue;
        }

        let ProcessedSheet {
            sheet,
            months: sheet_months,
            markets: sheet_markets,
            content_owners: sheet_owners,
        } = process_sheet(raw, report_type);

        months.extend(sheet_months);
        markets.extend(sheet_markets);
        content_owners.extend(sheet_owners);
        processed.insert(report_type, sheet);
    }

    let sheets: Vec<Sheet> = ReportType::ALL
        .into_iter()
        .map(|t| processed.remove(&t).unwrap_or_else(|| Sheet::empty(t)))
        .collect();

    let analysis = summarize(sheets, months, markets, content_owners);
    info!(
        "Workbook analysed: {} URLs, {} active, {} removed ({:.1}% removed)",
        analysis.total_urls, analysis.active_count, analysis.removed_count, analysis.removal_rate
    );
    analysis
}

/// Totals over four canonical-order sheets. Dimension sets come out sorted.
pub(crate) fn summarize(
    sheets: Vec<Sheet>,
    months: BTreeSet<String>,
    markets: BTreeSet<String>,
    content_owners: BTreeSet<String>,
) -> WorkbookAnalysis {
    let total_urls: usize = sheets.iter().map(|s| s.total_urls).sum();
    let active_count: usize = sheets.iter().map(|s| s.active_count).sum();
    let removed_count: usize = sheets.iter().map(|s| s.removed_count).sum();

    let count_of = |types: &[ReportType]| -> usize {
        sheets
            .iter()
            .filter(|s| types.contains(&s.report_type))
            .map(|s| s.total_urls)
            .sum()
    };
    let usr_atsm_count = count_of(&[ReportType::UnauthorizedSearch, ReportType::AdsTutorials]);
    let pssm_psmp_count = count_of(&[
        ReportType::PasswordSharingSocial,
        ReportType::PasswordSharingMarketplace,
    ]);

    WorkbookAnalysis {
        sheets,
        total_urls,
        active_count,
        removed_count,
        removal_rate: removal_rate(removed_count, total_urls),
        usr_atsm_count,
        pssm_psmp_count,
        months: months.into_iter().collect(),
        markets: markets.into_iter().collect(),
        content_owners: content_owners.into_iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet_parser::Cell;

    #[test]
    fn test_csv_without_name_is_unrecognized() {
        let data = b"Linking URL,URL Status Google\nhttp://a,Approved\n";
        let analysis = parse(data).unwrap();
        assert_eq!(analysis.sheets.len(), 4);
        assert_eq!(analysis.total_urls, 0);
        assert!(!analysis.has_data());
        assert_eq!(analysis.removal_rate, 0.0);
    }

    #[test]
    fn test_named_csv_is_classified() {
        let data = b"Month,Market Scanned,Listing URL,URL Status\n\
2024-03-15,UK,http://a,Up\n\
2024-04-01,DE,http://b,Down\n\
45292,UK,http://c,Down\n";
        let analysis = parse_named("Password Sharing-Marketplace.csv", data).unwrap();

        let order: Vec<_> = analysis.sheets.iter().map(|s| s.report_type).collect();
        assert_eq!(order, ReportType::ALL.to_vec());

        let psmp = analysis.sheet(ReportType::PasswordSharingMarketplace).unwrap();
        assert_eq!(psmp.total_urls, 3);
        assert_eq!(psmp.active_count, 1);
        assert_eq!(psmp.removed_count, 2);

        assert_eq!(analysis.total_urls, 3);
        assert_eq!(analysis.usr_atsm_count, 0);
        assert_eq!(analysis.pssm_psmp_count, 3);
        assert!((analysis.removal_rate - 200.0 / 3.0).abs() < 1e-9);
        assert_eq!(analysis.months, vec!["Apr-24", "Jan-24", "Mar-24"]);
        assert_eq!(analysis.markets, vec!["DE", "UK"]);
        assert!(analysis.content_owners.is_empty());
    }

    #[test]
    fn test_duplicate_report_type_keeps_first() {
        let first = RawSheet::from_grid(
            "USR",
            vec![
                vec![Cell::Text("URL".into())],
                vec![Cell::Text("http://a".into())],
            ],
        );
        let mut second = first.clone();
        second.name = "Unauthorized Search Result".to_string();
        second.rows.push(second.rows[0].clone());

        let analysis = analyze_sheets(&[first, second]);
        assert_eq!(analysis.sheets[0].total_urls, 1);
        assert_eq!(analysis.total_urls, 1);
    }

    #[test]
    fn test_garbage_is_an_error() {
        assert!(parse(&[0u8, 1, 2, 3]).is_err());
        assert!(parse(&[]).is_err());
    }
}
