use thiserror::Error;
use tracing::error;

/// The one failure shape of the hosted backend. The status code is kept
/// for logging only; callers never branch on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RemoteError {
    pub message: String,
    pub status: Option<u16>,
}

impl RemoteError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: Some(status),
        }
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        Self {
            message: e.to_string(),
            status: e.status().map(|s| s.as_u16()),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Remote(#[from] RemoteError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Validation(String),

    #[error("Not signed in")]
    NotSignedIn,

    #[error("Administrator access required")]
    Forbidden,
}

impl AppError {
    /// Text for the blocking alert shown when a write fails.
    pub fn alert_message(&self) -> String {
        match self {
            AppError::Remote(e) => {
                error!("remote write failed: {}", e);
                if e.message.is_empty() {
                    "Please try again".to_string()
                } else {
                    e.message.clone()
                }
            }
            AppError::Config(msg) => {
                error!("configuration error: {}", msg);
                "Service is not configured".to_string()
            }
            other => other.to_string(),
        }
    }
}
