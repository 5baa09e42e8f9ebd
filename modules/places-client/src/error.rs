use thiserror::Error;

pub type Result<T> = std::result::Result<T, PlacesError>;

#[derive(Debug, Error)]
pub enum PlacesError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error ({status}): {message}")]
    Api { status: String, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl PlacesError {
    /// True when the request never produced an upstream answer (connection,
    /// TLS, timeout). API-status and decode failures are not transport-level.
    pub fn is_transport(&self) -> bool {
        matches!(self, PlacesError::Network(_))
    }
}

impl From<reqwest::Error> for PlacesError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            PlacesError::Parse(err.to_string())
        } else {
            PlacesError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for PlacesError {
    fn from(err: serde_json::Error) -> Self {
        PlacesError::Parse(err.to_string())
    }
}
