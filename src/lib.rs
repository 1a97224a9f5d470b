//! Takedown Insights - report workbook ingestion and removal analytics.
//!
//! Reads a workbook holding up to four known report sheets, normalizes their
//! columns and status vocabularies into [`Record`]s, and aggregates them into
//! a [`WorkbookAnalysis`].

pub mod aggregate;
pub mod analysis;
pub mod columns;
pub mod config;
pub mod error;
pub mod month;
pub mod report_type;
pub mod sheet_parser;
pub mod sheet_processor;
pub mod status;
pub mod store;
pub mod worker;
pub mod workbook;

pub use aggregate::{
    content_owner_rollup, filter_analysis, filter_records, filtered_content_owners,
    market_rollup, sheet_market_view, sheet_stats, unique_values, FilteredAnalysis, RecordField,
    SheetStats,
};
pub use analysis::{
    removal_rate, ContentOwnerData, FilterState, MarketData, Record, Sheet, WorkbookAnalysis,
};
pub use error::{IngestError, ParseError, ParseResult};
pub use report_type::ReportType;
pub use status::RecordStatus;
pub use store::{content_hash, AnalysisStore, StoredAnalysis};
pub use worker::{run_parse, ParseRequest, ParseResponse};
pub use workbook::{parse, parse_named};
