//! Takedown Insights - upload a report workbook, query removal analytics.

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use takedown_insights::config::ServerConfig;
use takedown_insights::{
    filter_analysis, filtered_content_owners, sheet_market_view, AnalysisStore, FilterState,
    ReportType, Sheet, StoredAnalysis,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Application state shared across handlers.
#[derive(Clone)]
struct AppState {
    store: AnalysisStore,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "takedown_insights=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;
    info!("Loaded config: {:?}", config);

    let state = AppState {
        store: AnalysisStore::new(),
    };

    let app = Router::new()
        .route("/health", get(health))
        .route("/upload", post(upload_workbook))
        .route("/analysis", get(get_analysis).delete(clear_analysis))
        .route("/analysis/filtered", get(get_filtered))
        .route("/analysis/content-owners", get(get_all_content_owners))
        .route("/analysis/sheets/:code/markets", get(get_sheet_markets))
        .route("/analysis/sheets/:code/content-owners", get(get_sheet_content_owners))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let app = if config.cors_permissive {
        app.layer(CorsLayer::permissive())
    } else {
        app
    };

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!("Server listening on http://{}", config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Handlers
// ============================================================================

async fn health() -> &'static str {
    "ok"
}

/// Upload a workbook and make it the current analysis.
async fn upload_workbook(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, (StatusCode, String)> {
    let mut filename = String::new();
    let mut file_data = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("Multipart error: {}", e)))?
    {
        if field.name() == Some("file") {
            filename = field.file_name().unwrap_or("workbook").to_string();
            file_data = field
                .bytes()
                .await
                .map_err(|e| (StatusCode::BAD_REQUEST, format!("Failed to read file: {}", e)))?
                .to_vec();
            break;
        }
    }

    if file_data.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "No file uploaded".to_string()));
    }

    info!("Received file: {} ({} bytes)", filename, file_data.len());

    let stored = state
        .store
        .ingest(filename.clone(), file_data)
        .await
        .map_err(|e| {
            error!("Upload {} rejected: {}", filename, e);
            (StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
        })?;
    Ok(Json(&*stored).into_response())
}

fn current(state: &AppState) -> Result<Arc<StoredAnalysis>, StatusCode> {
    state.store.get().ok_or(StatusCode::NOT_FOUND)
}

async fn get_analysis(State(state): State<AppState>) -> Result<Response, StatusCode> {
    let stored = current(&state)?;
    Ok(Json(&*stored).into_response())
}

async fn clear_analysis(State(state): State<AppState>) -> StatusCode {
    if state.store.clear() {
        info!("Analysis cleared");
    }
    StatusCode::NO_CONTENT
}

/// Comma-separated selections; missing or empty means no restriction.
#[derive(Debug, Default, serde::Deserialize)]
struct FilterQuery {
    months: Option<String>,
    markets: Option<String>,
    owners: Option<String>,
}

fn split_list(value: Option<&str>) -> BTreeSet<String> {
    value
        .unwrap_or("")
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

impl From<&FilterQuery> for FilterState {
    fn from(query: &FilterQuery) -> Self {
        FilterState {
            months: split_list(query.months.as_deref()),
            markets: split_list(query.markets.as_deref()),
            content_owners: split_list(query.owners.as_deref()),
        }
    }
}

async fn get_filtered(
    State(state): State<AppState>,
    Query(query): Query<FilterQuery>,
) -> Result<Response, StatusCode> {
    let stored = current(&state)?;
    let view = filter_analysis(&stored.analysis, &FilterState::from(&query));
    Ok(Json(view).into_response())
}

async fn get_all_content_owners(
    State(state): State<AppState>,
    Query(query): Query<FilterQuery>,
) -> Result<Response, StatusCode> {
    let stored = current(&state)?;
    let owners = filtered_content_owners(&stored.analysis.sheets, &FilterState::from(&query));
    Ok(Json(owners).into_response())
}

#[derive(Debug, Default, serde::Deserialize)]
struct MarketQuery {
    market: Option<String>,
}

fn sheet_by_code<'a>(stored: &'a StoredAnalysis, code: &str) -> Result<&'a Sheet, StatusCode> {
    let report_type = ReportType::from_code(code).ok_or(StatusCode::NOT_FOUND)?;
    stored
        .analysis
        .sheet(report_type)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn get_sheet_markets(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Query(query): Query<FilterQuery>,
    Query(market): Query<MarketQuery>,
) -> Result<Response, StatusCode> {
    let stored = current(&state)?;
    let sheet = sheet_by_code(&stored, &code)?;
    let rows = sheet_market_view(sheet, &FilterState::from(&query), market.market.as_deref());
    Ok(Json(rows).into_response())
}

async fn get_sheet_content_owners(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Query(query): Query<FilterQuery>,
) -> Result<Response, StatusCode> {
    let stored = current(&state)?;
    let sheet = sheet_by_code(&stored, &code)?;
    let owners = filtered_content_owners([sheet], &FilterState::from(&query));
    Ok(Json(owners).into_response())
}
