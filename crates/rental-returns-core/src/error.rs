use thiserror::Error;

#[derive(Debug, Error)]
pub enum RentalReturnsError {
    /// A field failed boundary validation
    #[error("Invalid input: {field} ({reason})")]
    InvalidInput { field: String, reason: String },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    /// Malformed JSON request
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for RentalReturnsError {
    fn from(e: serde_json::Error) -> Self {
        RentalReturnsError::SerializationError(e.to_string())
    }
}
