/// Failures of a single call against the marketplace API or the detection backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("API error (status {status}): {message}")]
    Status { status: u16, message: String },

    #[error("Response parsing failed: {0}")]
    Decode(String),

    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Unauthorized => Some(401),
            _ => None,
        }
    }

    /// The server refused because of a conflicting resource (e.g. slot already taken).
    pub fn is_conflict(&self) -> bool {
        self.status() == Some(409)
    }
}
