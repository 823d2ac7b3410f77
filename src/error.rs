use thiserror::Error;

/// Application error type
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    #[error("Failed to {operation}: {reason}")]
    Collaborator { operation: &'static str, reason: String },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not determine project directories")]
    NoProjectDirs,

    #[error("Lock poisoned")]
    LockPoisoned,
}

impl AppError {
    /// Failure reported by one of the browser-side collaborators.
    pub fn collaborator(operation: &'static str, reason: impl Into<String>) -> Self {
        Self::Collaborator { operation, reason: reason.into() }
    }
}
