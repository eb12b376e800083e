use thiserror::Error;

#[derive(Error, Debug)]
pub enum MandiError {
    #[error("Request failed: {0}")]
    Transport(String),

    #[error("HTTP error! Status: {0}")]
    Status(u16),

    #[error("Response is not JSON (content type: {0})")]
    NotJson(String),

    #[error("Malformed response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

impl MandiError {
    /// Whether this error came from talking to the inventory API, as opposed
    /// to a local failure (writing an export, reading settings).
    pub fn is_fetch_failure(&self) -> bool {
        matches!(
            self,
            MandiError::Transport(_)
                | MandiError::Status(_)
                | MandiError::NotJson(_)
                | MandiError::Json(_)
                | MandiError::Malformed(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, MandiError>;
