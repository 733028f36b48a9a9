//! Layered error types for the leaderboard scoring core.
//!
//! This module provides a hierarchical error system:
//!
//! - [`DomainError`] - Scoring logic errors (bad payloads, overflow)
//! - [`InfraError`] - Infrastructure errors (database, configuration)
//! - [`AppError`] - Application-level errors combining domain and infra
//!
//! # Error Philosophy
//!
//! - A bad event must not corrupt a wallet's line: builders absorb parse
//!   failures and emit nothing.
//! - A bad wallet must not corrupt the rebuild: per-wallet errors are
//!   logged and the wallet is skipped.
//! - A failed rebuild must not corrupt the published view: the staging
//!   table is simply left behind and the published table stays live.

use thiserror::Error;

// ═══════════════════════════════════════════════════════════════════════════════
// DOMAIN ERRORS
// ═══════════════════════════════════════════════════════════════════════════════

/// Domain-level errors raised while replaying a wallet's history.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DomainError {
    /// A payload field is not a valid hex-prefixed 256-bit value.
    #[error(transparent)]
    InvalidPoints(#[from] crate::types::primitives::InvalidPoints),

    /// A stored event name is outside the closed vocabulary.
    #[error(transparent)]
    UnknownEventName(#[from] crate::types::enums::UnknownEventName),

    /// A checked 256-bit operation overflowed. Aborts the current wallet
    /// replay; other wallets are unaffected.
    #[error(transparent)]
    ArithmeticOverflow(#[from] crate::types::primitives::ArithmeticOverflow),
}

// ═══════════════════════════════════════════════════════════════════════════════
// INFRASTRUCTURE ERRORS
// ═══════════════════════════════════════════════════════════════════════════════

/// Infrastructure-level errors from external systems.
///
/// These errors are logged but their details are not surfaced to callers
/// of the published queries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InfraError {
    /// Database error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Database migration error.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// JSON serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Resource not found in storage.
    #[error("resource not found")]
    NotFound,

    /// Configuration file error.
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

// ═══════════════════════════════════════════════════════════════════════════════
// APPLICATION ERRORS
// ═══════════════════════════════════════════════════════════════════════════════

/// Application-level errors combining domain and infrastructure errors.
///
/// This is the primary error type used throughout the service.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppError {
    /// Scoring logic error.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Infrastructure error.
    #[error(transparent)]
    Infra(#[from] InfraError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Initialization error.
    #[error("initialization error: {0}")]
    Initialization(String),

    /// Graceful shutdown requested.
    #[error("shutdown requested")]
    ShutdownRequested,
}

/// Type alias for application Results.
pub type Result<T> = std::result::Result<T, AppError>;

// ═══════════════════════════════════════════════════════════════════════════════
// CONVENIENCE CONVERSIONS
// ═══════════════════════════════════════════════════════════════════════════════

impl From<crate::types::primitives::ArithmeticOverflow> for AppError {
    fn from(err: crate::types::primitives::ArithmeticOverflow) -> Self {
        Self::Domain(err.into())
    }
}

impl From<crate::types::primitives::InvalidPoints> for AppError {
    fn from(err: crate::types::primitives::InvalidPoints) -> Self {
        Self::Domain(err.into())
    }
}

impl From<crate::types::enums::UnknownEventName> for AppError {
    fn from(err: crate::types::enums::UnknownEventName) -> Self {
        Self::Domain(err.into())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        Self::Infra(err.into())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
