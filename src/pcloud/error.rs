use serde::Serialize;
use thiserror::Error;

/// Error payload returned by an API endpoint (`result != 0`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiFailure {
    pub code: u32,
    pub message: String,
    pub server: String,
}

impl std::fmt::Display for ApiFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (code {} from {})", self.message, self.code, self.server)
    }
}

#[derive(Debug, Error)]
pub enum PcloudError {
    #[error("Unsupported remote method: {0}")]
    UnsupportedMethod(String),

    #[error("Remote API error: {0}")]
    Api(ApiFailure),

    #[error("Remote service unavailable: {0}")]
    Unavailable(ApiFailure),

    #[error("No API endpoints configured")]
    NoEndpoints,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl PcloudError {
    /// The endpoint payload behind this error, if the remote side produced one.
    pub fn failure(&self) -> Option<&ApiFailure> {
        match self {
            PcloudError::Api(failure) | PcloudError::Unavailable(failure) => Some(failure),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for PcloudError {
    fn from(err: serde_json::Error) -> Self {
        PcloudError::MalformedResponse(err.to_string())
    }
}
