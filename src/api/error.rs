//! Booking service error types

use std::fmt;

/// Errors that can occur when talking to the booking service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// 401 Unauthorized - token missing, invalid or expired, or a bad password
    Unauthorized { endpoint: String },
    /// Any other non-success status
    HttpError {
        endpoint: String,
        status: u16,
        message: String,
    },
    /// Connection, timeout or transport error
    NetworkError { endpoint: String, message: String },
    /// Success status with a body that does not parse
    Decode { endpoint: String, message: String },
}

impl ApiError {
    /// Check if the service rejected our credentials
    pub fn is_auth_error(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }

    /// Endpoint path the failing request went to
    pub fn endpoint(&self) -> &str {
        match self {
            ApiError::Unauthorized { endpoint } => endpoint,
            ApiError::HttpError { endpoint, .. } => endpoint,
            ApiError::NetworkError { endpoint, .. } => endpoint,
            ApiError::Decode { endpoint, .. } => endpoint,
        }
    }

    /// HTTP status, if the service answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized { .. } => Some(401),
            ApiError::HttpError { status, .. } => Some(*status),
            ApiError::NetworkError { .. } | ApiError::Decode { .. } => None,
        }
    }

    pub fn unauthorized(endpoint: impl Into<String>) -> Self {
        ApiError::Unauthorized {
            endpoint: endpoint.into(),
        }
    }

    pub fn http(endpoint: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        ApiError::HttpError {
            endpoint: endpoint.into(),
            status,
            message: message.into(),
        }
    }

    pub fn network(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::NetworkError {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    pub fn decode(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::Decode {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Unauthorized { endpoint } => {
                write!(f, "{}: Unauthorized (401)", endpoint)
            }
            ApiError::HttpError {
                endpoint,
                status,
                message,
            } => {
                if message.is_empty() {
                    write!(f, "{}: HTTP {}", endpoint, status)
                } else {
                    write!(f, "{}: HTTP {} - {}", endpoint, status, message)
                }
            }
            ApiError::NetworkError { endpoint, message } => {
                write!(f, "{}: Network error - {}", endpoint, message)
            }
            ApiError::Decode { endpoint, message } => {
                write!(f, "{}: Unexpected response - {}", endpoint, message)
            }
        }
    }
}

impl std::error::Error for ApiError {}
