// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Probe Error Types
 * Typed failure taxonomy for outbound probe operations with thiserror
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use std::time::Duration;
use thiserror::Error;

/// Main probe error type
#[derive(Error, Debug)]
pub enum CheckError {
    /// Network-related errors
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    /// HTTP-status errors from upstream registries
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    /// Upstream registry rate limiting
    #[error("Rate limited by {host}: retry after {retry_after:?}")]
    RateLimited {
        host: String,
        retry_after: Option<Duration>,
    },

    /// Response/record parsing errors
    #[error("Parse error: {0}")]
    Parse(String),

    /// Timeout errors
    #[error("Operation timed out after {duration:?}")]
    Timeout { duration: Duration },

    /// General errors
    #[error("Check error: {0}")]
    General(String),
}

/// Network-specific errors with detailed classification
#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("Connection timeout after {timeout:?} to {host}")]
    ConnectionTimeout { host: String, timeout: Duration },

    #[error("DNS resolution failed for {host}: {reason}")]
    DnsResolutionFailed { host: String, reason: String },

    #[error("TLS handshake failed for {host}: {reason}")]
    TlsHandshakeFailed { host: String, reason: String },

    #[error("Connection refused for {host}")]
    ConnectionRefused { host: String },

    #[error("Invalid URL: {url}")]
    InvalidUrl { url: String },

    #[error("Network error: {0}")]
    Other(String),
}

/// HTTP-specific errors with status code classification
#[derive(Error, Debug)]
pub enum HttpError {
    #[error("HTTP {status_code} Client Error for {url}")]
    ClientError { status_code: u16, url: String },

    #[error("HTTP {status_code} Server Error for {url}")]
    ServerError { status_code: u16, url: String },

    #[error("Malformed response from {url}: {reason}")]
    MalformedResponse { url: String, reason: String },

    #[error("HTTP error: {0}")]
    Other(String),
}

impl NetworkError {
    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            NetworkError::ConnectionTimeout { .. } => true,
            NetworkError::DnsResolutionFailed { .. } => false,
            NetworkError::TlsHandshakeFailed { .. } => false,
            NetworkError::ConnectionRefused { .. } => false,
            NetworkError::InvalidUrl { .. } => false,
            NetworkError::Other(_) => false,
        }
    }
}

impl HttpError {
    /// Check if HTTP error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            HttpError::ServerError { status_code, .. } => {
                matches!(status_code, 500 | 502 | 503 | 504)
            }
            HttpError::ClientError { status_code, .. } => {
                matches!(status_code, 408 | 429)
            }
            _ => false,
        }
    }
}

impl CheckError {
    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            CheckError::Network(e) => e.is_retryable(),
            CheckError::Http(e) => e.is_retryable(),
            CheckError::RateLimited { .. } => true,
            CheckError::Timeout { .. } => true,
            _ => false,
        }
    }
}

/// Convert reqwest errors to our error types
impl From<reqwest::Error> for CheckError {
    fn from(err: reqwest::Error) -> Self {
        let url = err.url().map(|u| u.to_string()).unwrap_or_default();

        if err.is_timeout() {
            CheckError::Network(NetworkError::ConnectionTimeout {
                host: url,
                timeout: Duration::from_secs(5),
            })
        } else if err.is_connect() {
            CheckError::Network(NetworkError::ConnectionRefused { host: url })
        } else if let Some(status) = err.status() {
            if status.as_u16() == 429 {
                CheckError::RateLimited {
                    host: url,
                    retry_after: Some(Duration::from_secs(60)),
                }
            } else if status.is_client_error() {
                CheckError::Http(HttpError::ClientError {
                    status_code: status.as_u16(),
                    url,
                })
            } else {
                CheckError::Http(HttpError::ServerError {
                    status_code: status.as_u16(),
                    url,
                })
            }
        } else if err.is_decode() {
            CheckError::Http(HttpError::MalformedResponse {
                url,
                reason: err.to_string(),
            })
        } else {
            CheckError::General(err.to_string())
        }
    }
}

/// Result type for probe operations
pub type CheckResult<T> = Result<T, CheckError>;
