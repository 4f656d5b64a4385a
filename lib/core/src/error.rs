use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Fatal errors. Recoverable outcomes (an empty corpus, a query whose
/// weights all drop out) are reported as ranking status, not here.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid embedding dimension for {context}: expected {expected}, got {actual}")]
    DimensionMismatch {
        context: String,
        expected: usize,
        actual: usize,
    },

    #[error("Similarity length mismatch for {context}: expected {expected} rows, got {actual}")]
    LengthMismatch {
        context: String,
        expected: usize,
        actual: usize,
    },

    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Numeric error: {0}")]
    Numeric(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
