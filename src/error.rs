use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndexerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A stored record could not be decoded back into its model type.
    #[error("Corrupt cache record {key}: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid manifest {path}: {message}")]
    Manifest { path: String, message: String },

    /// A single source file could not be read or parsed. Recovered by the analyzer.
    #[error("Parse error in {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Index error: {0}")]
    Index(String),
}

impl IndexerError {
    /// True for failures that stop a whole analysis run: the source root or
    /// cache directory is unusable, or the stored index is unreadable.
    pub fn is_io_failure(&self) -> bool {
        !matches!(self, IndexerError::Parse { .. })
    }
}

pub type Result<T> = std::result::Result<T, IndexerError>;
