use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Remote store error: {0}")]
    Remote(String),

    #[error("Local cache error: {0}")]
    Cache(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}
