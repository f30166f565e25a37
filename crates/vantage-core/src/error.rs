//! Error types for the Vantage system.

/// Result type alias for Vantage operations.
pub type Result<T> = std::result::Result<T, VantageError>;

/// Main error type for the Vantage system.
#[derive(Debug, thiserror::Error)]
pub enum VantageError {
    /// A bind against the management registry was rejected
    #[error("Registration failed for {kind} '{name}': {cause}")]
    Registration {
        kind: String,
        name: String,
        cause: String,
    },

    /// The pipeline finished its initial drain but the root node never appeared
    #[error("Startup error: {0}")]
    Startup(String),

    /// The pending queue was closed while a caller still depended on it
    #[error("Pending queue is closed")]
    QueueClosed,

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),

    /// Wrapped anyhow errors for compatibility
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl VantageError {
    /// Create a new registration error
    pub fn registration(
        kind: impl Into<String>,
        name: impl Into<String>,
        cause: impl Into<String>,
    ) -> Self {
        Self::Registration {
            kind: kind.into(),
            name: name.into(),
            cause: cause.into(),
        }
    }

    /// Create a new startup error
    pub fn startup(msg: impl Into<String>) -> Self {
        Self::Startup(msg.into())
    }

    /// Create a new config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
