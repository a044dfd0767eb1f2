//! Error types for fetching and classifying crawl responses.

use std::error::Error;
use std::fmt;
use std::time::Duration;

/// Errors that can occur while fetching a node's crawl endpoint.
///
/// Wrapped errors are only exposed through [`Error::source`], so walking the
/// chain yields each message once.
#[derive(Debug)]
pub enum FetchError {
    /// The HTTP client could not be constructed.
    ClientBuild(reqwest::Error),
    /// The request failed: connection refused, TLS failure, bad body, etc.
    Request(reqwest::Error),
    /// The node did not answer within the configured timeout.
    Timeout(Duration),
    /// The node answered with a non-success HTTP status.
    Status(reqwest::StatusCode),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::ClientBuild(_) => write!(f, "Failed to build HTTP client"),
            FetchError::Request(_) => write!(f, "Request to node failed"),
            FetchError::Timeout(timeout) => {
                write!(f, "Request timed out after {}ms", timeout.as_millis())
            }
            FetchError::Status(status) => write!(f, "Unexpected response status {status}"),
        }
    }
}

impl Error for FetchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            FetchError::ClientBuild(err) => Some(err),
            FetchError::Request(err) => Some(err),
            FetchError::Timeout(_) => None,
            FetchError::Status(_) => None,
        }
    }
}

/// Errors that can occur while classifying a crawl response.
#[derive(Debug)]
pub enum ClassifyError {
    /// The response is not a valid crawl document.
    Json(serde_json::Error),
}

impl fmt::Display for ClassifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassifyError::Json(_) => write!(f, "Invalid crawl response"),
        }
    }
}

impl Error for ClassifyError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ClassifyError::Json(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for ClassifyError {
    fn from(err: serde_json::Error) -> Self {
        ClassifyError::Json(err)
    }
}
