//! BucketSend error type.
//!
//! Variants mirror the operational error taxonomy: a `Store` failure on
//! the bucket-list fetch is fatal to the run, `Profile`/`CopyGen`
//! failures are bucket-scoped, `Channel` failures are client-scoped.
//! Scope is decided by the caller, not encoded here.

use thiserror::Error;

/// All errors produced by BucketSend subsystems.
#[derive(Error, Debug)]
pub enum BucketSendError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Profile error: {0}")]
    Profile(String),

    #[error("Copy generation error: {0}")]
    CopyGen(String),

    #[error("Channel error: {0}")]
    Channel(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result alias used across all BucketSend crates.
pub type Result<T> = std::result::Result<T, BucketSendError>;
