use thiserror::Error;

#[derive(Debug, Error)]
pub enum LevSimError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Unsupported product: {operation} is not defined for {product}")]
    UnsupportedProduct { product: String, operation: String },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for LevSimError {
    fn from(e: serde_json::Error) -> Self {
        LevSimError::SerializationError(e.to_string())
    }
}
