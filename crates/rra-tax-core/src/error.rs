use thiserror::Error;

#[derive(Debug, Error)]
pub enum RraError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Invalid table: {table} — {reason}")]
    InvalidTable { table: String, reason: String },

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Date error: {0}")]
    DateError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for RraError {
    fn from(e: serde_json::Error) -> Self {
        RraError::SerializationError(e.to_string())
    }
}
