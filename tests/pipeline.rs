//! End-to-end checks: real workbook bytes in, analysis out.

use rust_xlsxwriter::{Workbook, XlsxError};
use takedown_insights::{
    content_hash, content_owner_rollup, filter_analysis, filtered_content_owners, market_rollup,
    parse, parse_named, run_parse, sheet_market_view, AnalysisStore, FilterState, IngestError,
    ParseRequest, ParseResponse, ReportType, StoredAnalysis,
};

const USR_HEADERS: [&str; 7] = [
    "Linking URL",
    "Market Scanned",
    "Month",
    "Copyright Owner",
    "URL Status Google",
    "URL Status Bing",
    "URL Status Yandex",
];

/// Two sheets: the unauthorized-search report and an unrelated notes sheet.
fn sample_workbook() -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();

    let usr = workbook.add_worksheet();
    usr.set_name("Unauthorized Search Result")?;
    for (col, header) in USR_HEADERS.iter().enumerate() {
        usr.write_string(0, col as u16, *header)?;
    }
    let rows: [(&str, &str, f64, &str, [&str; 3]); 3] = [
        ("http://a.example", "US", 45292.0, "Studio A", ["Approved", "", ""]),
        ("http://b.example", "DE", 45323.0, "Studio B", ["Pending", "Up", "Pending"]),
        ("http://c.example", "US", 45292.0, "Studio A", ["Pending", "Pending", "Pending"]),
    ];
    for (i, (url, market, month, owner, engines)) in rows.iter().enumerate() {
        let row = i as u32 + 1;
        usr.write_string(row, 0, *url)?;
        usr.write_string(row, 1, *market)?;
        usr.write_number(row, 2, *month)?;
        usr.write_string(row, 3, *owner)?;
        for (j, status) in engines.iter().enumerate() {
            if !status.is_empty() {
                usr.write_string(row, 4 + j as u16, *status)?;
            }
        }
    }

    let notes = workbook.add_worksheet();
    notes.set_name("Notes")?;
    notes.write_string(0, 0, "Status")?;
    notes.write_string(0, 1, "URL")?;
    for row in 1..=5u32 {
        notes.write_string(row, 0, "Active")?;
        notes.write_string(row, 1, format!("http://notes/{}", row))?;
    }

    workbook.save_to_buffer()
}

#[test]
fn test_unrecognized_sheets_are_ignored() {
    let data = sample_workbook().unwrap();
    let analysis = parse(&data).unwrap();

    let codes: Vec<&str> = analysis.sheets.iter().map(|s| s.report_type.code()).collect();
    assert_eq!(codes, ["USR", "ATSM", "PSSM", "PSMP"]);

    let usr = &analysis.sheets[0];
    assert_eq!(usr.total_urls, 3);
    assert_eq!(usr.active_count, 2);
    assert_eq!(usr.removed_count, 1);
    assert!(analysis.sheets[1..].iter().all(|s| s.is_empty()));

    assert_eq!(analysis.total_urls, 3);
    assert_eq!(analysis.usr_atsm_count, 3);
    assert_eq!(analysis.pssm_psmp_count, 0);
    assert!(analysis.has_data());
}

#[test]
fn test_workbook_dimensions_are_normalized() {
    let data = sample_workbook().unwrap();
    let analysis = parse(&data).unwrap();

    assert_eq!(analysis.months, ["Feb-24", "Jan-24"]);
    assert_eq!(analysis.markets, ["DE", "US"]);
    assert_eq!(analysis.content_owners, ["Studio A", "Studio B"]);

    let statuses: Vec<&str> = analysis.sheets[0]
        .records
        .iter()
        .map(|r| r.status.as_str())
        .collect();
    assert_eq!(statuses, ["Approved/Up", "Approved/Up", "Pending"]);
}

#[test]
fn test_filtered_view_and_rollups() {
    let data = sample_workbook().unwrap();
    let analysis = parse(&data).unwrap();

    let filter = FilterState {
        markets: ["US".to_string()].into_iter().collect(),
        ..Default::default()
    };
    let view = filter_analysis(&analysis, &filter);
    assert_eq!(view.total_urls, 2);
    assert_eq!(view.usr_count, 2);
    assert_eq!(view.removed_count, 1);
    assert_eq!(view.removal_rate, 50.0);
    // Stored analysis is untouched
    assert_eq!(analysis.total_urls, 3);

    let usr = analysis.sheet(ReportType::UnauthorizedSearch).unwrap();
    let markets = market_rollup(&usr.records);
    assert_eq!(markets[0].market, "US");
    assert_eq!(markets[0].total_urls, 2);
    assert_eq!(markets[1].market, "DE");

    let owners = content_owner_rollup(analysis.all_records());
    assert_eq!(owners[0].name, "Studio A");
    assert_eq!(owners[0].count, 2);
}

#[test]
fn test_csv_upload_named_after_file() {
    let csv = "Video/Posts URL;Status;Market;Month;Content Owner\n\
               http://v/1;Active;BR;2024-03-15;Label X\n\
               http://v/2;Removed;BR;2024-03-20;Label X\n\
               ;;;;\n";

    let analysis = parse_named("Ads Tutorials- Social Media.csv", csv.as_bytes()).unwrap();
    let atsm = analysis.sheet(ReportType::AdsTutorials).unwrap();
    assert_eq!(atsm.total_urls, 2);
    assert_eq!(atsm.active_count, 1);
    assert_eq!(atsm.removal_rate, 50.0);
    assert_eq!(analysis.months, ["Mar-24"]);

    // Without a file name the sheet is "Sheet1" and nothing is recognized
    let anonymous = parse(csv.as_bytes()).unwrap();
    assert!(!anonymous.has_data());
}

#[tokio::test]
async fn test_worker_and_store() {
    let data = sample_workbook().unwrap();

    let response = run_parse(ParseRequest::new(data.clone()).with_file_name("report.xlsx")).await;
    let analysis = match response {
        ParseResponse::Success { data } => data,
        ParseResponse::Error { error } => panic!("parse failed: {}", error),
    };

    let store = AnalysisStore::new();
    let stored = store.set(StoredAnalysis::new("report.xlsx", &data, analysis));
    let json = serde_json::to_value(&*stored).unwrap();
    assert_eq!(json["sourceFile"], "report.xlsx");
    assert_eq!(json["analysis"]["totalUrls"], 3);
    assert_eq!(json["analysis"]["sheets"][0]["reportType"], "USR");

    let garbage = run_parse(ParseRequest::new(vec![0u8, 159, 146, 150])).await;
    assert!(matches!(garbage, ParseResponse::Error { .. }));
}

#[tokio::test]
async fn test_rejected_uploads_keep_current_analysis() {
    let store = AnalysisStore::new();
    let data = sample_workbook().unwrap();
    let hash = content_hash(&data);
    let current = store.ingest("report.xlsx", data).await.unwrap();
    assert_eq!(current.content_hash, hash);
    assert_eq!(current.analysis.total_urls, 3);

    let err = store
        .ingest("broken.xlsx", vec![0u8, 159, 146, 150])
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::Parse(_)));
    assert_eq!(store.get().unwrap().id, current.id);

    let mut workbook = Workbook::new();
    let notes = workbook.add_worksheet();
    notes.set_name("Notes").unwrap();
    notes.write_string(0, 0, "Status").unwrap();
    notes.write_string(1, 0, "Active").unwrap();
    let unrecognized = workbook.save_to_buffer().unwrap();

    let err = store.ingest("notes.xlsx", unrecognized).await.unwrap_err();
    assert!(matches!(err, IngestError::NoData));
    assert_eq!(store.get().unwrap().id, current.id);
}

#[test]
fn test_filtered_sheet_views() {
    let data = sample_workbook().unwrap();
    let analysis = parse(&data).unwrap();
    let usr = analysis.sheet(ReportType::UnauthorizedSearch).unwrap();

    let jan = FilterState {
        months: ["Jan-24".to_string()].into_iter().collect(),
        ..Default::default()
    };
    let markets = sheet_market_view(usr, &jan, None);
    assert_eq!(markets.len(), 1);
    assert_eq!(markets[0].market, "US");
    assert_eq!((markets[0].active_count, markets[0].removed_count), (1, 1));

    let owners = filtered_content_owners([usr], &jan);
    assert_eq!(owners.len(), 1);
    assert_eq!(owners[0].name, "Studio A");
}
