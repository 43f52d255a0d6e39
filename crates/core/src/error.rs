//! Error types for the facilitator domain layer.
//!
//! This module defines a hierarchy of error types:
//!
//! - [`DomainError`] - Transition/dispatch errors
//! - [`StorageError`] - Database/repository errors
//! - [`ChainError`] - Subgraph connectivity errors
//! - [`FacilitatorError`] - Top-level orchestration errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.
//!
//! Two conditions that look like errors deliberately are not: a stale
//! transfer-request occurrence (superseded by a higher block) is a logged
//! no-op, and duplicate or out-of-order events are absorbed by the monotonic
//! transition rules on [`crate::models::Message`].

use thiserror::Error;

// =============================================================================
// Domain Errors
// =============================================================================

/// Dispatch and transition-layer errors.
///
/// Transition rules only ever move state forward or leave it unchanged, so
/// rule violations cannot occur; everything here is either a deployment
/// mismatch or a propagated storage failure.
#[derive(Debug, Error)]
pub enum DomainError {
    /// No handler registered for an observed event type. Fatal and
    /// non-retryable: the subscribed event set and the registry disagree.
    #[error("Handler implementation not found for {0}")]
    HandlerNotFound(String),

    /// An event record did not match its expected payload shape.
    #[error("Decoding error: {0}")]
    DecodingError(String),

    /// Generic validation error.
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Storage operation failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl DomainError {
    /// Whether the error is non-retryable.
    ///
    /// Storage failures are transient and owned by the orchestrator's
    /// replay-after-reconnect policy; everything else signals a deployment
    /// mismatch (missing registration, wrong payload shape) that replaying
    /// the same records can only reproduce.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Storage(_))
    }
}

// =============================================================================
// Storage Errors
// =============================================================================

/// Database and repository errors.
///
/// These errors originate from storage operations like queries,
/// migrations, and data conversion.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Failed to establish database connection.
    #[error("Database connection error: {0}")]
    ConnectionError(String),

    /// SQL query execution failed.
    #[error("Query execution error: {0}")]
    QueryError(String),

    /// Database constraint was violated (unique, check, etc.).
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Database migration failed.
    #[error("Migration error: {0}")]
    MigrationError(String),

    /// Row-to-entity conversion failed.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

// =============================================================================
// Chain Errors
// =============================================================================

/// Subgraph connectivity and query errors.
///
/// These errors occur when fetching decoded event records from the
/// Graph nodes indexing the two gateways.
#[derive(Debug, Error)]
pub enum ChainError {
    /// HTTP connection to the subgraph failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// GraphQL query was rejected by the subgraph.
    #[error("Query error: {0}")]
    QueryError(String),

    /// Event subscription failed or disconnected.
    #[error("Subscription error: {0}")]
    SubscriptionError(String),

    /// Subgraph response could not be interpreted.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

// =============================================================================
// Facilitator Errors
// =============================================================================

/// Top-level facilitator orchestration errors.
///
/// This is the main error type returned by
/// [`crate::services::FacilitatorService`]. It wraps all lower-level errors
/// and adds orchestration-specific variants.
#[derive(Debug, Error)]
pub enum FacilitatorError {
    /// Dispatch/transition error.
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// Storage/database error.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Subgraph connectivity error.
    #[error("Chain error: {0}")]
    Chain(#[from] ChainError),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Graceful shutdown was requested.
    ///
    /// This is not really an error but uses the error type for control flow.
    #[error("Facilitator shutdown requested")]
    ShutdownRequested,

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for facilitator operations.
pub type FacilitatorResult<T> = Result<T, FacilitatorError>;

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Result type for chain operations.
pub type ChainResult<T> = Result<T, ChainError>;
