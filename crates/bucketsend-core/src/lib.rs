//! # BucketSend Core
//!
//! Shared foundation for the nudge dispatcher: configuration, the error
//! type, domain types, and the traits every external collaborator
//! (stores, SMS provider, copy generator) is accessed through.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::BucketSendConfig;
pub use error::{BucketSendError, Result};
