use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::board::{PulseBoard, PulseView};
use crate::config::AppConfig;
use crate::sectors::SectorCatalog;
use crate::sentiment::MacroModel;
use crate::weights::{reset_to_equal_weights, WeightError};

#[derive(Clone)]
pub struct AppState {
    pub board: Arc<PulseBoard>,
    pub catalog: Arc<SectorCatalog>,
    pub model: Arc<MacroModel>,
}

impl AppState {
    /// Wire up board, catalog and model from a resolved config.
    pub fn from_config(cfg: &AppConfig) -> anyhow::Result<Self> {
        let catalog = if cfg.sectors.is_empty() {
            SectorCatalog::default_seed()
        } else {
            SectorCatalog::new(cfg.sectors.clone(), cfg.aliases.clone())
        };

        let model = match &cfg.macro_config_path {
            Some(path) => MacroModel::seed_with_config_file(catalog.sectors.clone(), path)?,
            None => MacroModel::seed(catalog.sectors.clone()),
        };

        let initial_weights = if cfg.default_weights.is_empty() {
            reset_to_equal_weights(catalog.sectors.iter().cloned())
        } else {
            cfg.default_weights
                .iter()
                .map(|(k, v)| (catalog.canonical_or_verbatim(k), *v))
                .collect()
        };

        let board = PulseBoard::new(
            initial_weights,
            cfg.weight_floor,
            cfg.history_capacity,
            Duration::from_secs(cfg.rolling_window_days * 24 * 3600),
        );

        Ok(Self {
            board: Arc::new(board),
            catalog: Arc::new(catalog),
            model: Arc::new(model),
        })
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/pulse", get(get_pulse))
        .route("/sectors", get(get_sectors))
        .route("/weights", get(get_weights))
        .route("/weights/apply", post(apply_weight))
        .route("/weights/reset", post(reset_weights))
        .route("/weights/marketcap", post(adopt_market_caps))
        .route("/feed/scores", post(feed_scores))
        .route("/feed/macros", post(feed_macros))
        .route("/debug/history", get(debug_history))
        .route("/debug/rolling", get(debug_rolling))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

// --- errors ---

/// API-layer error type.
#[derive(Debug)]
pub enum ApiError {
    /// 400 - the edit referenced a sector the board does not track.
    UnknownSector {
        sector: String,
        suggestion: Option<String>,
    },
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    suggestion: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::UnknownSector { sector, suggestion } => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: "unknown_sector".into(),
                    message: format!("unknown sector '{sector}'"),
                    suggestion,
                },
            ),
        };
        (status, Json(body)).into_response()
    }
}

impl From<WeightError> for ApiError {
    fn from(err: WeightError) -> Self {
        match err {
            WeightError::UnknownSector { sector, suggestion } => {
                ApiError::UnknownSector { sector, suggestion }
            }
        }
    }
}

// --- handlers ---

async fn get_pulse(State(state): State<AppState>) -> Json<PulseView> {
    Json(state.board.view())
}

#[derive(Serialize)]
struct SectorsResp {
    sectors: Vec<String>,
}

async fn get_sectors(State(state): State<AppState>) -> Json<SectorsResp> {
    Json(SectorsResp {
        sectors: state.catalog.sectors.clone(),
    })
}

#[derive(Serialize)]
struct WeightsResp {
    weights: BTreeMap<String, f64>,
    total: f64,
    floor: f64,
}

async fn get_weights(State(state): State<AppState>) -> Json<WeightsResp> {
    let view = state.board.view();
    let total: f64 = view.weights.values().sum();
    Json(WeightsResp {
        weights: view.weights,
        total,
        floor: state.board.weight_floor(),
    })
}

#[derive(Deserialize)]
struct ApplyReq {
    sector: String,
    value: f64,
}

async fn apply_weight(
    State(state): State<AppState>,
    Json(body): Json<ApplyReq>,
) -> Result<Json<PulseView>, ApiError> {
    let sector = state.catalog.canonical_or_verbatim(&body.sector);
    let view = state.board.apply_edit(&sector, body.value)?;
    Ok(Json(view))
}

async fn reset_weights(State(state): State<AppState>) -> Json<PulseView> {
    Json(state.board.reset())
}

#[derive(Deserialize)]
struct MarketCapReq {
    caps: BTreeMap<String, f64>,
}

async fn adopt_market_caps(
    State(state): State<AppState>,
    Json(body): Json<MarketCapReq>,
) -> Json<PulseView> {
    let caps = canonicalize_keys(&state.catalog, body.caps);
    Json(state.board.adopt_market_caps(&caps))
}

#[derive(Deserialize)]
struct ScoresReq {
    scores: BTreeMap<String, f64>,
    #[serde(default)]
    as_of: Option<DateTime<Utc>>,
}

async fn feed_scores(
    State(state): State<AppState>,
    Json(body): Json<ScoresReq>,
) -> Json<PulseView> {
    let scores = canonicalize_keys(&state.catalog, body.scores);
    Json(state.board.refresh_scores(scores, body.as_of))
}

#[derive(Deserialize)]
struct MacrosReq {
    indicators: BTreeMap<String, f64>,
    #[serde(default)]
    as_of: Option<DateTime<Utc>>,
}

async fn feed_macros(
    State(state): State<AppState>,
    Json(body): Json<MacrosReq>,
) -> Json<PulseView> {
    let scores = state.model.score_sectors(&body.indicators);
    Json(state.board.refresh_scores(scores, body.as_of))
}

async fn debug_history(
    State(state): State<AppState>,
    Query(q): Query<HashMap<String, String>>,
) -> Json<Vec<crate::history::HistoryEntry>> {
    let n = q
        .get("n")
        .and_then(|v| v.parse().ok())
        .unwrap_or(10usize);
    Json(state.board.history_last_n(n))
}

#[derive(Serialize)]
struct RollingInfo {
    window_secs: u64,
    average: f64,
    count: usize,
}

async fn debug_rolling(State(state): State<AppState>) -> Json<RollingInfo> {
    let (average, count, window_secs) = state.board.rolling_stats();
    Json(RollingInfo {
        window_secs,
        average,
        count,
    })
}

/// Map sector spellings from the wire to catalog canonical names. Unknown
/// names pass through verbatim; the board decides whether they matter.
fn canonicalize_keys(
    catalog: &SectorCatalog,
    map: BTreeMap<String, f64>,
) -> BTreeMap<String, f64> {
    map.into_iter()
        .map(|(k, v)| (catalog.canonical_or_verbatim(&k), v))
        .collect()
}
