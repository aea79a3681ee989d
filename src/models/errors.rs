//! Centralized Error Handling Module
//!
//! Every failure carries a unique error code so a degraded verdict can show
//! exactly which stage broke and why.
//!
//! Error codes follow pattern: CATEGORY_SPECIFIC_ERROR
//! - RPC_xxx: chain access errors
//! - EVAL_xxx: evaluation pipeline errors
//! - CFG_xxx: configuration errors
//! - API_xxx: host API errors

use serde::Deserialize;
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
    // Input Errors
    // ============================================
    /// Address is not `0x` followed by 40 hex digits
    InvalidAddressFormat,
    /// Recipient or amount cannot be decoded from the transaction
    MalformedTransactionData,

    // ============================================
    // RPC Errors
    // ============================================
    /// RPC connection failed
    RpcConnectionFailed,
    /// RPC request timeout
    RpcTimeout,
    /// RPC rate limited (HTTP 429)
    RpcRateLimited,
    /// RPC returned an `error` field
    RpcError,
    /// RPC answered with something we cannot parse
    RpcInvalidResponse,

    // ============================================
    // Evaluation Errors
    // ============================================
    /// Evaluation deadline elapsed
    EvaluationTimeout,

    // ============================================
    // Configuration Errors
    // ============================================
    /// Invalid configuration value
    ConfigInvalidValue,
    /// Decision table failed validation
    ConfigDecisionTable,

    // ============================================
    // API Errors
    // ============================================
    /// Invalid request format
    ApiBadRequest,

    /// Unknown error
    Unknown,
}

impl ErrorCode {
    /// Get string representation of error code
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidAddressFormat => "INVALID_ADDRESS_FORMAT",
            Self::MalformedTransactionData => "MALFORMED_TX_DATA",

            Self::RpcConnectionFailed => "RPC_CONNECTION_FAILED",
            Self::RpcTimeout => "RPC_TIMEOUT",
            Self::RpcRateLimited => "RPC_RATE_LIMITED",
            Self::RpcError => "RPC_ERROR",
            Self::RpcInvalidResponse => "RPC_INVALID_RESPONSE",

            Self::EvaluationTimeout => "EVAL_TIMEOUT",

            Self::ConfigInvalidValue => "CFG_INVALID_VALUE",
            Self::ConfigDecisionTable => "CFG_DECISION_TABLE",

            Self::ApiBadRequest => "API_BAD_REQUEST",

            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    /// Any failure talking to the chain node
    pub fn is_rpc_failure(&self) -> bool {
        matches!(
            self,
            Self::RpcConnectionFailed
                | Self::RpcTimeout
                | Self::RpcRateLimited
                | Self::RpcError
                | Self::RpcInvalidResponse
        )
    }

    /// Check if error is retryable
    ///
    /// RPC-level `error` responses are deterministic answers from the node
    /// and are surfaced immediately.
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
    /// Malformed address input
    pub fn invalid_address(input: &str) -> Self {
        Self::new(
            ErrorCode::InvalidAddressFormat,
            format!("Invalid address format: {}", input),
        )
    }

    /// Transaction payload does not decode
    pub fn malformed_tx_data(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::MalformedTransactionData, msg)
    }

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

    /// JSON-RPC `error` field
    pub fn rpc_error(error: RpcError) -> Self {
        let message = format!("RPC error: {} (code: {})", error.message, error.code);
        Self::with_source(ErrorCode::RpcError, message, error)
    }

    /// Unparseable RPC payload
    pub fn rpc_invalid_response(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::RpcInvalidResponse, msg)
    }

    /// Evaluation deadline elapsed
    pub fn evaluation_timeout(secs: u64) -> Self {
        Self::new(
            ErrorCode::EvaluationTimeout,
            format!("Evaluation did not finish within {}s", secs),
        )
    }

    /// Invalid config value
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigInvalidValue, msg)
    }

    /// API bad request
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ApiBadRequest, msg)
    }
}

impl AppError {
    /// The JSON-RPC error payload, if this error carries one
    pub fn rpc_error_detail(&self) -> Option<&RpcError> {
        self.source.as_ref()?.downcast_ref::<RpcError>()
    }

    /// Node does not implement the requested method
    pub fn is_method_not_found(&self) -> bool {
        self.rpc_error_detail()
            .map(RpcError::is_method_not_found)
            .unwrap_or(false)
    }
}

// ============================================
// JSON-RPC error payload
// ============================================

/// JSON-RPC error structure
#[derive(Debug, Clone, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

impl RpcError {
    /// Check if this is a rate limit error (HTTP 429 or code -32005)
    pub fn is_rate_limit(&self) -> bool {
        self.code == -32005 || self.message.to_lowercase().contains("rate limit")
    }

    /// Check if this is a method not found error (code -32601)
    pub fn is_method_not_found(&self) -> bool {
        self.code == -32601
            || self.message.to_lowercase().contains("method not found")
            || self.message.to_lowercase().contains("does not exist")
    }
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)
    }
}

impl std::error::Error for RpcError {}

// ============================================
// Result type alias
// ============================================

/// Application Result type
pub type AppResult<T> = Result<T, AppError>;

// ============================================
// Conversion from common error types
// ============================================

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::new(ErrorCode::RpcTimeout, "Request timeout")
        } else if err.is_connect() {
            Self::new(ErrorCode::RpcConnectionFailed, "Connection failed")
        } else {
            Self::new(ErrorCode::Unknown, err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(ErrorCode::RpcInvalidResponse, "JSON parse error", err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = AppError::rpc_timeout("Connection timed out");
        assert_eq!(err.code, ErrorCode::RpcTimeout);
        assert_eq!(err.code_str(), "RPC_TIMEOUT");
        assert_eq!(err.to_string(), "[RPC_TIMEOUT] Connection timed out");
    }

    #[test]
    fn test_retryable() {
        assert!(ErrorCode::RpcTimeout.is_retryable());
        assert!(ErrorCode::RpcRateLimited.is_retryable());
        assert!(!ErrorCode::RpcError.is_retryable());
        assert!(!ErrorCode::MalformedTransactionData.is_retryable());
    }

    #[test]
    fn test_rpc_error_classification() {
        let err = AppError::rpc_error(RpcError {
            code: -32601,
            message: "the method eth_getBlockReceipts does not exist/is not available".to_string(),
        });
        assert_eq!(err.code, ErrorCode::RpcError);
        assert!(err.is_method_not_found());

        let rate_limit_error = RpcError {
            code: -32005,
            message: "Rate limit exceeded".to_string(),
        };
        assert!(rate_limit_error.is_rate_limit());
        assert!(!AppError::rpc_error(rate_limit_error).is_method_not_found());
        assert!(!AppError::rpc_timeout("slow").is_method_not_found());
    }

    #[test]
    fn test_rpc_failure_family() {
        assert!(ErrorCode::RpcError.is_rpc_failure());
        assert!(ErrorCode::RpcInvalidResponse.is_rpc_failure());
        assert!(!ErrorCode::InvalidAddressFormat.is_rpc_failure());
    }
}
