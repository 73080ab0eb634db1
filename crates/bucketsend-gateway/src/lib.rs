//! # BucketSend Gateway
//! HTTP trigger for the nudge pipeline, designed to be fired by an
//! external scheduler with no required payload.

pub mod server;

pub use server::{build_router, serve, AppState};
