//! JSON-RPC Client Module
//!
//! Thin single-attempt JSON-RPC 2.0 client:
//! 1. User-Agent header and gzip compression
//! 2. HTTP 429 and JSON-RPC rate limit codes mapped to `RpcRateLimited`
//! 3. Timeouts and connect failures mapped to retryable codes
//!
//! Retries are applied one level up, around each gateway call, so a failed
//! attempt here surfaces immediately with a precise error code.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING, CONTENT_TYPE, USER_AGENT};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

use crate::models::errors::{AppError, AppResult, ErrorCode};
use crate::utils::constants::USER_AGENT as USER_AGENT_CONST;

/// JSON-RPC response structure
#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

/// JSON-RPC error structure
#[derive(Debug, Clone, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

impl RpcError {
    /// Rate limit error (code -32005 or a "rate limit" message)
    pub fn is_rate_limit(&self) -> bool {
        self.code == -32005 || self.message.to_lowercase().contains("rate limit")
    }

    /// Requested account or signature does not exist
    pub fn is_not_found(&self) -> bool {
        self.code == -32602 || self.message.to_lowercase().contains("could not find")
    }

    fn into_app_error(self, method: &str) -> AppError {
        if self.is_rate_limit() {
            AppError::rpc_rate_limited()
        } else if self.is_not_found() {
            AppError::token_not_found(format!("{}: {}", method, self.message))
        } else {
            AppError::rpc_error(format!("{} failed: {} (code: {})", method, self.message, self.code))
        }
    }
}

/// JSON-RPC client bound to one endpoint
pub struct RpcClient {
    url: String,
    client: reqwest::Client,
    next_id: AtomicU64,
}

impl RpcClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> AppResult<Self> {
        Ok(Self {
            url: url.into(),
            client: build_http_client(timeout)?,
            next_id: AtomicU64::new(1),
        })
    }

    /// Endpoint with any path-embedded API key masked (for logging)
    pub fn masked_url(&self) -> String {
        mask_url(&self.url)
    }

    /// Execute one JSON-RPC call
    pub async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> AppResult<T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": id
        });

        debug!("📡 RPC {} (id {})", method, id);

        let response = self.client.post(&self.url).json(&payload).send().await?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(AppError::rpc_rate_limited());
        }
        if status.is_server_error() {
            // 5xx is usually a transient node problem
            return Err(AppError::rpc_connection_failed(format!(
                "{} HTTP error: {}",
                method, status
            )));
        }
        if !status.is_success() {
            return Err(AppError::rpc_error(format!("{} HTTP error: {}", method, status)));
        }

        let body: RpcResponse<T> = response.json().await.map_err(|e| {
            AppError::with_source(
                ErrorCode::RpcInvalidResponse,
                format!("{}: failed to parse response", method),
                e,
            )
        })?;

        if let Some(error) = body.error {
            return Err(error.into_app_error(method));
        }

        body.result.ok_or_else(|| {
            AppError::new(
                ErrorCode::RpcInvalidResponse,
                format!("{}: no result in response", method),
            )
        })
    }
}

/// HTTP client shared by the RPC and market data clients (gzip enabled)
pub fn build_http_client(timeout: Duration) -> AppResult<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_CONST));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip"));

    reqwest::Client::builder()
        .default_headers(headers)
        .timeout(timeout)
        .gzip(true)
        .build()
        .map_err(|e| AppError::with_source(ErrorCode::ConfigInvalidValue, "Failed to build HTTP client", e))
}

/// Hide API keys carried in the URL path or query
pub fn mask_url(url: &str) -> String {
    if let Some((base, _)) = url.split_once("/v2/") {
        return format!("{}/v2/***HIDDEN***", base);
    }
    if let Some((base, _)) = url.split_once("api-key=") {
        return format!("{}api-key=***HIDDEN***", base);
    }
    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rpc_error_mapping() {
        let rate = RpcError {
            code: -32005,
            message: "Too many requests".into(),
        };
        assert_eq!(rate.into_app_error("getSlot").code, ErrorCode::RpcRateLimited);

        let text_rate = RpcError {
            code: -32000,
            message: "Rate limit exceeded".into(),
        };
        assert!(text_rate.is_rate_limit());

        let missing = RpcError {
            code: -32602,
            message: "Invalid param: could not find account".into(),
        };
        assert_eq!(missing.into_app_error("getTokenSupply").code, ErrorCode::TokenNotFound);

        let other = RpcError {
            code: -32603,
            message: "Internal error".into(),
        };
        assert_eq!(other.into_app_error("getTransaction").code, ErrorCode::RpcError);
    }

    #[test]
    fn test_mask_url() {
        assert_eq!(
            mask_url("https://solana-mainnet.g.alchemy.com/v2/secret"),
            "https://solana-mainnet.g.alchemy.com/v2/***HIDDEN***"
        );
        assert_eq!(
            mask_url("https://mainnet.helius-rpc.com/?api-key=secret"),
            "https://mainnet.helius-rpc.com/?api-key=***HIDDEN***"
        );
        assert_eq!(
            mask_url("https://api.mainnet-beta.solana.com"),
            "https://api.mainnet-beta.solana.com"
        );
    }
}
