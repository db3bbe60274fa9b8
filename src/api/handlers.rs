//! API Request Handlers

use axum::{
    extract::{rejection::JsonRejection, Json, Query, State},
    http::{StatusCode, Uri},
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use super::middleware::{RateLimitConfig, RateLimiter};
use super::types::*;
use crate::core::scanner::ScanService;
use crate::models::errors::AppError;
use crate::models::types::{ScanStatus, TokenScanResult};
use crate::utils::constants::{APP_NAME, APP_VERSION, CACHE_CLEANUP_INTERVAL_SECS};

type ApiResult<T> = Result<Json<ApiResponse<T>>, (StatusCode, Json<ApiResponse<()>>)>;

/// Shared application state
pub struct AppState {
    pub scanner: Arc<ScanService>,
    pub rate_limiter: Arc<RateLimiter>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(scanner: Arc<ScanService>, rate_limit: RateLimitConfig) -> Self {
        let rate_limiter = Arc::new(RateLimiter::new(rate_limit));

        // Background task: sweep expired cache entries and stale rate limit windows
        let scanner_clone = scanner.clone();
        let limiter_clone = rate_limiter.clone();
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(Duration::from_secs(CACHE_CLEANUP_INTERVAL_SECS));
            loop {
                interval.tick().await;
                scanner_clone.cleanup_cache();
                limiter_clone.cleanup();
            }
        });

        Self {
            scanner,
            rate_limiter,
            start_time: Instant::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

fn reject(status: StatusCode, error: ApiError, start: Instant) -> (StatusCode, Json<ApiResponse<()>>) {
    (status, Json(ApiResponse::error(error, elapsed_ms(start))))
}

fn app_error(err: &AppError, start: Instant) -> (StatusCode, Json<ApiResponse<()>>) {
    let status =
        StatusCode::from_u16(err.code.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    reject(status, ApiError::from(err), start)
}

fn required_address(
    address: Option<String>,
    start: Instant,
) -> Result<String, (StatusCode, Json<ApiResponse<()>>)> {
    address
        .filter(|a| !a.trim().is_empty())
        .ok_or_else(|| reject(StatusCode::BAD_REQUEST, ApiError::missing_address(), start))
}

// ============================================
// Banner & Health Check
// ============================================

pub const ENDPOINTS: [&str; 6] = [
    "POST   /api/scan",
    "GET    /api/scan/status?address=",
    "DELETE /api/scan/cache?address=",
    "GET    /api/stats",
    "GET    /health",
    "GET    /",
];

pub async fn root() -> Json<ApiResponse<BannerData>> {
    let start = Instant::now();
    let data = BannerData {
        name: format!("{} API", APP_NAME),
        version: APP_VERSION.to_string(),
        endpoints: ENDPOINTS.iter().map(|e| e.to_string()).collect(),
    };
    Json(ApiResponse::success(data, elapsed_ms(start)))
}

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<ApiResponse<HealthData>> {
    let start = Instant::now();

    let data = HealthData {
        status: "healthy".to_string(),
        version: APP_VERSION.to_string(),
        uptime_seconds: state.uptime_seconds(),
        gateway: state.scanner.gateway_name().to_string(),
        cache_backend: state.scanner.cache_backend().to_string(),
    };

    Json(ApiResponse::success(data, elapsed_ms(start)))
}

// ============================================
// Scan
// ============================================

pub async fn scan_token(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ScanRequest>, JsonRejection>,
) -> ApiResult<TokenScanResult> {
    let start = Instant::now();

    let Json(req) = body.map_err(|e| {
        warn!("Rejected scan body: {}", e.body_text());
        reject(
            StatusCode::BAD_REQUEST,
            ApiError::validation(format!("Invalid request body: {}", e.body_text())),
            start,
        )
    })?;
    let address = req
        .contract_address
        .filter(|a| !a.trim().is_empty())
        .ok_or_else(|| {
            reject(
                StatusCode::BAD_REQUEST,
                ApiError::validation("contractAddress is required"),
                start,
            )
        })?;

    let result = state
        .scanner
        .scan(&address, req.force_refresh)
        .await
        .map_err(|e| app_error(&e, start))?;

    Ok(Json(ApiResponse::success(result, elapsed_ms(start))))
}

pub async fn scan_status(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AddressQuery>,
) -> ApiResult<ScanStatus> {
    let start = Instant::now();
    let address = required_address(query.address, start)?;

    let status = state
        .scanner
        .scan_status(&address)
        .await
        .map_err(|e| app_error(&e, start))?;

    Ok(Json(ApiResponse::success(status, elapsed_ms(start))))
}

pub async fn invalidate_cache(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AddressQuery>,
) -> ApiResult<InvalidateData> {
    let start = Instant::now();
    let address = required_address(query.address, start)?;

    let invalidated = state
        .scanner
        .invalidate(&address)
        .await
        .map_err(|e| app_error(&e, start))?;

    info!("🗑️ Cache invalidation for {}: {}", address, invalidated);
    Ok(Json(ApiResponse::success(
        InvalidateData { invalidated },
        elapsed_ms(start),
    )))
}

// ============================================
// Stats
// ============================================

pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<ApiResponse<StatsData>> {
    let start = Instant::now();

    let data = StatsData {
        scans: state.scanner.stats(),
        cache: state.scanner.cache_stats(),
        cache_backend: state.scanner.cache_backend().to_string(),
        uptime_seconds: state.uptime_seconds(),
        api_version: APP_VERSION.to_string(),
    };

    Json(ApiResponse::success(data, elapsed_ms(start)))
}

/// JSON 404 for unknown routes
pub async fn not_found(uri: Uri) -> (StatusCode, Json<ApiResponse<()>>) {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::error(ApiError::not_found(uri.path()), 0.0)),
    )
}
