//! Mapping of rejections to externally visible errors.

use serde::Serialize;
use tonic::Status;

use super::gate::RejectReason;

/// Externally visible failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorCategory {
    Unauthenticated,
    QuotaExceeded,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Unauthenticated => "unauthenticated",
            ErrorCategory::QuotaExceeded => "quota-exceeded",
        }
    }

    /// HTTP status code for adapters serving this category over HTTP.
    pub fn http_status(&self) -> u16 {
        match self {
            ErrorCategory::Unauthenticated => 401,
            ErrorCategory::QuotaExceeded => 429,
        }
    }

    /// gRPC status code for this category.
    pub fn grpc_code(&self) -> tonic::Code {
        match self {
            ErrorCategory::Unauthenticated => tonic::Code::Unauthenticated,
            ErrorCategory::QuotaExceeded => tonic::Code::ResourceExhausted,
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error as returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
    pub category: ErrorCategory,
    pub message: &'static str,
}

impl ErrorResponse {
    /// Map a gate rejection to its response.
    pub fn for_reason(reason: RejectReason) -> Self {
        let (category, message) = match reason {
            RejectReason::MissingCredential => (ErrorCategory::Unauthenticated, "Token is missing"),
            RejectReason::InvalidCredential => (ErrorCategory::Unauthenticated, "Invalid token"),
            RejectReason::ExpiredCredential => (ErrorCategory::Unauthenticated, "Token has expired"),
            RejectReason::RateLimited => (ErrorCategory::QuotaExceeded, "Rate limit exceeded"),
        };
        Self { category, message }
    }

    /// Response for a failed login.
    pub fn invalid_login() -> Self {
        Self {
            category: ErrorCategory::Unauthenticated,
            message: "Invalid credentials",
        }
    }

    pub fn http_status(&self) -> u16 {
        self.category.http_status()
    }

    /// JSON body for HTTP adapters: `{"error": "<category>: <message>"}`.
    pub fn json_body(&self) -> serde_json::Value {
        serde_json::json!({ "error": self.to_string() })
    }

    pub fn to_status(&self) -> Status {
        Status::new(self.category.grpc_code(), self.to_string())
    }
}

impl std::fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.category, self.message)
    }
}

impl From<RejectReason> for ErrorResponse {
    fn from(reason: RejectReason) -> Self {
        Self::for_reason(reason)
    }
}

impl From<ErrorResponse> for Status {
    fn from(response: ErrorResponse) -> Self {
        response.to_status()
    }
}
