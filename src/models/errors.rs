//! Centralized Error Handling Module
//!
//! Every failure carries a unique error code so logs and API responses stay
//! greppable.
//!
//! Error codes follow pattern: CATEGORY_SPECIFIC_ERROR
//! - RPC_xxx: upstream RPC errors
//! - SCAN_xxx: scan pipeline errors
//! - API_xxx: API errors
//! - CACHE_xxx: result cache errors

use std::fmt;

/// Application-wide error type
#[derive(Debug)]
pub struct AppError {
    /// Unique error code for logging/monitoring
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Optional underlying error
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new AppError
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Create AppError with source error
    pub fn with_source(
        code: ErrorCode,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Get error code as string (for logging)
    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }

    pub fn is_retryable(&self) -> bool {
        self.code.is_retryable()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Unique error codes for monitoring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // ============================================
    // RPC / upstream errors
    // ============================================
    /// RPC connection failed
    RpcConnectionFailed,
    /// RPC request timeout
    RpcTimeout,
    /// RPC rate limited (HTTP 429)
    RpcRateLimited,
    /// RPC returned error response
    RpcError,
    /// Invalid RPC response
    RpcInvalidResponse,
    /// Market data API error
    MarketDataError,

    // ============================================
    // Scan errors
    // ============================================
    /// Malformed token address
    ValidationError,
    /// Metadata or holder list could not be fetched
    UpstreamUnavailable,
    /// Token metadata does not exist
    TokenNotFound,
    /// Holder list came back empty
    NoHolders,

    // ============================================
    // API errors
    // ============================================
    /// Invalid request format
    ApiBadRequest,
    /// Required address parameter missing
    ApiMissingAddress,
    /// Rate limit exceeded
    ApiRateLimited,
    /// Resource not found
    ApiNotFound,
    /// Internal server error
    ApiInternalError,

    // ============================================
    // Cache / config errors
    // ============================================
    /// Cache backend unreachable
    CacheUnavailable,
    /// Invalid configuration value
    ConfigInvalidValue,

    /// Unknown error
    Unknown,
}

impl ErrorCode {
    /// Get string representation of error code
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RpcConnectionFailed => "RPC_CONNECTION_FAILED",
            Self::RpcTimeout => "RPC_TIMEOUT",
            Self::RpcRateLimited => "RPC_RATE_LIMITED",
            Self::RpcError => "RPC_ERROR",
            Self::RpcInvalidResponse => "RPC_INVALID_RESPONSE",
            Self::MarketDataError => "MARKET_DATA_ERROR",

            Self::ValidationError => "SCAN_VALIDATION_ERROR",
            Self::UpstreamUnavailable => "SCAN_UPSTREAM_UNAVAILABLE",
            Self::TokenNotFound => "SCAN_TOKEN_NOT_FOUND",
            Self::NoHolders => "SCAN_NO_HOLDERS",

            Self::ApiBadRequest => "API_BAD_REQUEST",
            Self::ApiMissingAddress => "API_MISSING_ADDRESS",
            Self::ApiRateLimited => "API_RATE_LIMITED",
            Self::ApiNotFound => "API_NOT_FOUND",
            Self::ApiInternalError => "API_INTERNAL_ERROR",

            Self::CacheUnavailable => "CACHE_UNAVAILABLE",
            Self::ConfigInvalidValue => "CFG_INVALID_VALUE",

            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    /// Stable code exposed in API error bodies
    pub fn api_code(&self) -> &'static str {
        match self {
            Self::ValidationError | Self::ApiBadRequest => "VALIDATION_ERROR",
            Self::ApiMissingAddress => "MISSING_ADDRESS",
            Self::ApiRateLimited => "RATE_LIMITED",
            Self::ApiNotFound => "NOT_FOUND",
            Self::ApiInternalError | Self::CacheUnavailable | Self::ConfigInvalidValue => {
                "INTERNAL_ERROR"
            }
            _ => "SCAN_ERROR",
        }
    }

    /// Get HTTP status code for API responses
    pub fn http_status(&self) -> u16 {
        match self {
            Self::ValidationError | Self::ApiBadRequest | Self::ApiMissingAddress => 400,
            Self::ApiNotFound => 404,
            Self::ApiRateLimited => 429,
            Self::UpstreamUnavailable
            | Self::RpcConnectionFailed
            | Self::RpcTimeout
            | Self::RpcRateLimited
            | Self::RpcError
            | Self::RpcInvalidResponse
            | Self::MarketDataError => 502,
            _ => 500,
        }
    }

    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RpcTimeout | Self::RpcRateLimited | Self::RpcConnectionFailed
        )
    }
}

// ============================================
// Convenience constructors
// ============================================

impl AppError {
    /// RPC connection failed
    pub fn rpc_connection_failed(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::RpcConnectionFailed, msg)
    }

    /// RPC timeout
    pub fn rpc_timeout(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::RpcTimeout, msg)
    }

    /// RPC rate limited
    pub fn rpc_rate_limited() -> Self {
        Self::new(ErrorCode::RpcRateLimited, "Rate limited (HTTP 429)")
    }

    /// RPC returned an error object
    pub fn rpc_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::RpcError, msg)
    }

    /// Malformed token address
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationError, msg)
    }

    /// Metadata or holder list unavailable after retries
    pub fn upstream_unavailable(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::UpstreamUnavailable, msg)
    }

    /// Token not found
    pub fn token_not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::TokenNotFound, msg)
    }

    /// Empty holder list
    pub fn no_holders(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::NoHolders, msg)
    }

    /// Market data error
    pub fn market_data_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::MarketDataError, msg)
    }

    /// Cache backend unavailable
    pub fn cache_unavailable(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::CacheUnavailable, msg)
    }

    /// API bad request
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ApiBadRequest, msg)
    }

    /// Missing address query parameter
    pub fn missing_address() -> Self {
        Self::new(ErrorCode::ApiMissingAddress, "Address query parameter is required")
    }

    /// API internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ApiInternalError, msg)
    }
}

// ============================================
// Result type alias
// ============================================

/// Application Result type
pub type AppResult<T> = Result<T, AppError>;

// ============================================
// Conversion from common error types
// ============================================

impl From<eyre::Report> for AppError {
    fn from(err: eyre::Report) -> Self {
        Self::new(ErrorCode::Unknown, err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::new(ErrorCode::RpcTimeout, "Request timeout")
        } else if err.is_connect() {
            Self::new(ErrorCode::RpcConnectionFailed, "Connection failed")
        } else if err.status().map(|s| s.as_u16()) == Some(429) {
            Self::rpc_rate_limited()
        } else {
            Self::with_source(ErrorCode::RpcError, "HTTP request failed", err)
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(ErrorCode::RpcInvalidResponse, "JSON parse error", err)
    }
}

impl From<redis::RedisError> for AppError {
    fn from(err: redis::RedisError) -> Self {
        Self::with_source(ErrorCode::CacheUnavailable, "Redis error", err)
    }
}
