// Axum API server module
//
// Exposes the feasibility calculator and the county insights over JSON.
// CPU-bound work runs on the blocking pool; responses are memoized for 5 min.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use moka::future::Cache;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::calculator::{recommend_with_config, FeasibilityResult};
use crate::config::CalculatorConfig;
use crate::data::DealData;
use crate::error::FeasibilityError;
use crate::filters::{split_by_window, years_available, AdminFilter, TimeWindow};
use crate::insights::{
    build_gp_by_county, buyer_count_by_county, buyer_label, build_rankings, compute_buyer_momentum,
    compute_county_trends, compute_financial_totals, compute_health_score, compute_overall_stats,
    county_sold_cut_counts, format_trend, top_buyers_by_county,
};
use crate::utils::{normalize_county, title_case};

/// Response cache time-to-live
const CACHE_TTL_SECS: u64 = 300;

// ============================================================================
// Configuration
// ============================================================================

/// File locations for the server's data
#[derive(Debug, Clone)]
pub struct DataPaths {
    pub deals_csv: PathBuf,
    pub tiers_csv: Option<PathBuf>,
    pub adjacency_json: Option<PathBuf>,
    pub calculator_config: Option<PathBuf>,
}

impl DataPaths {
    /// Resolve file names relative to `data_dir`
    ///
    /// Missing optional files are skipped rather than treated as errors.
    pub fn in_dir(data_dir: &str, deals: &str, tiers: &str, adjacency: &str) -> Self {
        let dir = PathBuf::from(data_dir);
        let existing = |name: &str| {
            let path = dir.join(name);
            path.exists().then_some(path)
        };

        Self {
            deals_csv: dir.join(deals),
            tiers_csv: existing(tiers),
            adjacency_json: existing(adjacency),
            calculator_config: existing("calculator.json"),
        }
    }
}

// ============================================================================
// Application State
// ============================================================================

#[derive(Clone)]
pub struct AppState {
    pub data: Arc<DealData>,
    pub config: Arc<CalculatorConfig>,
    pub cache: Cache<String, serde_json::Value>,
}

impl AppState {
    pub async fn new(paths: DataPaths) -> anyhow::Result<Self> {
        tracing::info!("Loading deal data...");
        let (data, config) = tokio::task::spawn_blocking(move || -> anyhow::Result<_> {
            let data = DealData::load(
                &paths.deals_csv,
                paths.tiers_csv.as_deref(),
                paths.adjacency_json.as_deref(),
            )?;
            let config = match &paths.calculator_config {
                Some(path) => CalculatorConfig::load(path)?,
                None => CalculatorConfig::default(),
            };
            Ok((data, config))
        })
        .await??;

        Ok(Self::from_data(data, config))
    }

    /// Wrap already-loaded data (tests, embedding)
    pub fn from_data(data: DealData, config: CalculatorConfig) -> Self {
        tracing::info!("Initializing Moka cache...");
        let cache = Cache::builder()
            .max_capacity(10_000)
            .time_to_live(Duration::from_secs(CACHE_TTL_SECS))
            .build();

        Self {
            data: Arc::new(data),
            config: Arc::new(config),
            cache,
        }
    }
}

// ============================================================================
// Router
// ============================================================================

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/counties", get(list_counties))
        .route("/api/windows", get(list_windows))
        .route("/api/feasibility", post(feasibility))
        .route("/api/rankings", get(rankings))
        .route("/api/trends", get(trends))
        .route("/api/financials", get(financials))
        // Middleware (applied in reverse order)
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct FeasibilityRequest {
    pub county: String,
    pub price: f64,
    /// "All years" (default), a year such as "2024", or "Last 12 months"
    #[serde(default)]
    pub window: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WindowQuery {
    pub window: Option<String>,
    /// Narrow sold counts to one disposition rep (rankings only)
    pub dispo_rep: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FinancialsQuery {
    pub window: Option<String>,
    pub market: Option<String>,
    pub acquisition_rep: Option<String>,
    pub dispo_rep: Option<String>,
}

/// Top buyers listed per county in `/api/counties`
const TOP_BUYERS_SHOWN: usize = 3;

fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}

fn parse_window(choice: Option<&str>) -> Result<TimeWindow, AppError> {
    let choice = choice.unwrap_or("All years");
    TimeWindow::parse(choice, today())
        .ok_or_else(|| AppError::BadRequest(format!("Unknown window: {}", choice)))
}

// ============================================================================
// Endpoint Handlers
// ============================================================================

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn list_counties(State(state): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    let counties = state.data.county_options()?;
    let tiers = state.data.tier_lookup()?;
    let split = split_by_window(&state.data.deals, &TimeWindow::AllYears)?;
    let top_buyers = top_buyers_by_county(&split.sold)?;

    let rows: Vec<serde_json::Value> = counties
        .iter()
        .map(|county| {
            let (tier, range) = tiers.get(county).cloned().unwrap_or_default();
            let buyers: Vec<serde_json::Value> = top_buyers
                .get(county)
                .map(|ranked| {
                    ranked
                        .iter()
                        .take(TOP_BUYERS_SHOWN)
                        .map(|(buyer, sold)| serde_json::json!({"buyer": buyer, "sold": sold}))
                        .collect()
                })
                .unwrap_or_default();
            serde_json::json!({
                "county": county,
                "title": title_case(county),
                "mao_tier": tier,
                "mao_range": range,
                "top_buyers": buyers,
            })
        })
        .collect();

    Ok(Json(serde_json::json!({
        "rows": rows.len(),
        "data": rows,
    })))
}

async fn list_windows(State(state): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    let mut choices = vec![TimeWindow::AllYears.label()];
    choices.extend(years_available(&state.data.deals)?.into_iter().rev().map(|y| y.to_string()));
    choices.push(TimeWindow::Last12Months { today: today() }.label());

    Ok(Json(serde_json::json!({ "windows": choices })))
}

async fn feasibility(
    State(state): State<AppState>,
    Json(request): Json<FeasibilityRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let window = parse_window(request.window.as_deref())?;
    let county = normalize_county(&request.county);
    let cache_key = format!("feasibility:{}:{}:{}", county, request.price, window.label());

    if let Some(cached) = state.cache.get(&cache_key).await {
        return Ok(Json(cached));
    }

    tracing::info!(county = %county, price = request.price, "Computing feasibility");

    let worker = state.clone();
    let result = tokio::task::spawn_blocking(move || -> Result<FeasibilityResult, FeasibilityError> {
        let split = split_by_window(&worker.data.deals, &window)?;
        recommend_with_config(
            &county,
            request.price,
            &split.sold,
            &split.cut,
            &worker.data.adjacency,
            &worker.config,
        )
    })
    .await
    .map_err(|e| AppError::Internal(format!("Task join error: {}", e)))??;

    let value = serde_json::to_value(&result)
        .map_err(|e| AppError::Internal(format!("Serialization error: {}", e)))?;
    state.cache.insert(cache_key, value.clone()).await;

    Ok(Json(value))
}

async fn rankings(
    State(state): State<AppState>,
    Query(query): Query<WindowQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let window = parse_window(query.window.as_deref())?;
    let dispo_rep = query.dispo_rep.filter(|rep| !rep.trim().is_empty());
    let cache_key = format!("rankings:{}:{}", window.label(), dispo_rep.as_deref().unwrap_or(""));

    if let Some(cached) = state.cache.get(&cache_key).await {
        return Ok(Json(cached));
    }

    let worker = state.clone();
    let (rows, overall) = tokio::task::spawn_blocking(move || -> Result<_, FeasibilityError> {
        let split = split_by_window(&worker.data.deals, &window)?;
        let counts = county_sold_cut_counts(&split.sold, &split.cut, dispo_rep.as_deref())?;
        let buyers = buyer_count_by_county(&split.sold)?;
        let health = compute_health_score(&counts.counties(), &counts);
        Ok((
            build_rankings(&counts, &buyers, &health),
            compute_overall_stats(&split.sold, &split.cut)?,
        ))
    })
    .await
    .map_err(|e| AppError::Internal(format!("Task join error: {}", e)))??;

    let value = serde_json::json!({
        "rows": rows.len(),
        "overall": overall,
        "data": rows,
    });
    state.cache.insert(cache_key, value.clone()).await;

    Ok(Json(value))
}

async fn trends(
    State(state): State<AppState>,
    Query(query): Query<WindowQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let window = parse_window(query.window.as_deref())?;
    let cache_key = format!("trends:{}", window.label());

    if let Some(cached) = state.cache.get(&cache_key).await {
        return Ok(Json(cached));
    }

    let worker = state.clone();
    let (counties, buyers) = tokio::task::spawn_blocking(move || -> Result<_, FeasibilityError> {
        let split = split_by_window(&worker.data.deals, &window)?;
        let anchor = today();
        Ok((
            compute_county_trends(&split.sold, anchor)?,
            compute_buyer_momentum(&split.sold, anchor)?,
        ))
    })
    .await
    .map_err(|e| AppError::Internal(format!("Task join error: {}", e)))??;

    let county_rows: Vec<serde_json::Value> = counties
        .iter()
        .map(|row| {
            serde_json::json!({
                "county": row.key,
                "last12": row.last12,
                "prev12": row.prev12,
                "delta": row.delta,
                "trend": format_trend(row.delta),
            })
        })
        .collect();

    let buyer_rows: Vec<serde_json::Value> = buyers
        .iter()
        .map(|row| {
            serde_json::json!({
                "buyer": row.key,
                "last12": row.last12,
                "prev12": row.prev12,
                "delta": row.delta,
                "label": buyer_label(row),
            })
        })
        .collect();

    let value = serde_json::json!({
        "counties": county_rows,
        "buyers": buyer_rows,
    });
    state.cache.insert(cache_key, value.clone()).await;

    Ok(Json(value))
}

async fn financials(
    State(state): State<AppState>,
    Query(query): Query<FinancialsQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let window = parse_window(query.window.as_deref())?;
    let filter = AdminFilter {
        market: query.market,
        acquisition_rep: query.acquisition_rep,
        dispo_rep: query.dispo_rep,
    };
    let cache_key = format!("financials:{}:{}", window.label(), filter.key());

    if let Some(cached) = state.cache.get(&cache_key).await {
        return Ok(Json(cached));
    }

    let worker = state.clone();
    let (totals, rows) = tokio::task::spawn_blocking(move || -> Result<_, FeasibilityError> {
        let split = filter.apply(&split_by_window(&worker.data.deals, &window)?)?;
        Ok((compute_financial_totals(&split.sold)?, build_gp_by_county(&split.sold)?))
    })
    .await
    .map_err(|e| AppError::Internal(format!("Task join error: {}", e)))??;

    let value = serde_json::json!({
        "totals": totals,
        "rows": rows.len(),
        "data": rows,
    });
    state.cache.insert(cache_key, value.clone()).await;

    Ok(Json(value))
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    /// Input shape problem the caller can fix (missing column, bad price)
    Configuration(String),
    Internal(String),
}

impl From<FeasibilityError> for AppError {
    fn from(err: FeasibilityError) -> Self {
        if err.is_configuration() {
            AppError::Configuration(err.to_string())
        } else {
            AppError::Internal(err.to_string())
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Configuration(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
