use thiserror::Error;

pub type Result<T> = std::result::Result<T, FactoryError>;

#[derive(Debug, Error)]
pub enum FactoryError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// The factory answered but declined the request (`success: false`).
    #[error("Factory rejected request: {0}")]
    Rejected(String),
}

impl From<reqwest::Error> for FactoryError {
    fn from(err: reqwest::Error) -> Self {
        FactoryError::Network(err.to_string())
    }
}
