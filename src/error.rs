use thiserror::Error;

/// Failures while locating or reading a workout definition.
#[derive(Debug, Error)]
pub enum WorkoutError {
    #[error("workout '{0}' not found")]
    NotFound(String),

    #[error("failed to read workout file: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse workout: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("workout '{0}' has no exercises")]
    Empty(String),
}

/// Failures of the durable session slot.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("slot I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("slot serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("unsupported slot version {found} (expected {expected})")]
    Version { found: u32, expected: u32 },
}

/// Failures of the results sink.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}
