//! API Request/Response Types

use serde::{Deserialize, Serialize};

use crate::models::errors::{AppError, ErrorCode};
use crate::utils::cache::CacheStats;
use crate::utils::telemetry::TelemetryStats;

/// API Response wrapper
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
    pub latency_ms: f64,
    pub timestamp: i64,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T, latency_ms: f64) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            latency_ms,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

impl ApiResponse<()> {
    pub fn error(error: ApiError, latency_ms: f64) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
            latency_ms,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

/// API Error with a stable wire code
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::from_code(ErrorCode::ApiBadRequest, message)
    }

    pub fn missing_address() -> Self {
        Self::from_code(
            ErrorCode::ApiMissingAddress,
            "Token address is required (?address=)",
        )
    }

    pub fn rate_limited(retry_after: u64) -> Self {
        Self {
            details: Some(format!("retry_after: {}", retry_after)),
            ..Self::from_code(
                ErrorCode::ApiRateLimited,
                format!("Rate limit exceeded. Retry after {} seconds", retry_after),
            )
        }
    }

    pub fn not_found(path: &str) -> Self {
        Self::from_code(ErrorCode::ApiNotFound, format!("No route for {}", path))
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::from_code(ErrorCode::ApiInternalError, message)
    }

    fn from_code(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.api_code().to_string(),
            message: message.into(),
            details: None,
        }
    }
}

impl From<&AppError> for ApiError {
    fn from(err: &AppError) -> Self {
        Self {
            code: err.code.api_code().to_string(),
            message: err.message.clone(),
            details: None,
        }
    }
}

// ============================================
// Scan
// ============================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRequest {
    #[serde(default)]
    pub contract_address: Option<String>,
    #[serde(default)]
    pub force_refresh: bool,
}

/// `?address=` for the status and cache endpoints
#[derive(Debug, Deserialize)]
pub struct AddressQuery {
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct InvalidateData {
    pub invalidated: bool,
}

// ============================================
// Stats / Telemetry
// ============================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsData {
    pub scans: TelemetryStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<CacheStats>,
    pub cache_backend: String,
    pub uptime_seconds: u64,
    pub api_version: String,
}

// ============================================
// Health Check
// ============================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthData {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub gateway: String,
    pub cache_backend: String,
}

#[derive(Debug, Serialize)]
pub struct BannerData {
    pub name: String,
    pub version: String,
    pub endpoints: Vec<String>,
}
