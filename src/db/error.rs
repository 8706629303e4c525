use thiserror::Error;

/// Errors surfaced by the account store.
///
/// Lookup misses are not errors; query paths return `Ok(None)` instead.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Input rejected before any persistence attempt (bad email syntax,
    /// unknown or protected update field).
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Update target does not exist. Lookups report misses as `Ok(None)`;
    /// this is only for operations that require an existing record.
    #[error("Account not found: {0}")]
    NotFound(String),

    /// Any failure from the underlying storage. The enclosing transaction
    /// has already been rolled back; the original error is preserved.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Hashing library failures and blocking-task join errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl StoreError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
