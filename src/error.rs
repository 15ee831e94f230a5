use thiserror::Error;

/// Unified error type for pool operations
#[derive(Error, Debug)]
pub enum PoolError {
    // Parsing/validation errors
    #[error("Invalid proxy format ({field}): {reason}")]
    InvalidProxyFormat {
        field: &'static str,
        reason: String,
    },

    #[error("Unsupported proxy protocol: {0}")]
    UnsupportedProtocol(String),

    // Selection errors
    #[error("No active proxies available")]
    EmptyPool,

    #[error("Proxy not found: {id}")]
    RecordNotFound { id: i64 },

    // Store errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database connection failed: {0}")]
    DatabaseConnection(String),

    // Credential errors
    #[error("Credential vault error: {0}")]
    Vault(String),

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for pool operations
pub type Result<T> = std::result::Result<T, PoolError>;

impl PoolError {
    /// Whether this error means the caller referenced a proxy that no longer exists
    pub fn is_not_found(&self) -> bool {
        matches!(self, PoolError::RecordNotFound { .. })
    }

    /// Whether this error concerns the pool as a whole rather than a single proxy
    pub fn is_pool_level(&self) -> bool {
        matches!(
            self,
            PoolError::EmptyPool
                | PoolError::Database(_)
                | PoolError::DatabaseConnection(_)
                | PoolError::InvalidConfig(_)
        )
    }
}
