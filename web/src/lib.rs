//! Axum integration for Doorlist.
//!
//! The HTTP layer is an imperative shell around the engine: handlers parse a
//! request into a typed operation call, invoke the engine, and map the typed
//! outcome to a response. This crate provides the error half of that
//! mapping: [`AppError`] turns expected, recoverable outcomes into
//! machine-readable 4xx bodies and infrastructure failures into logged 5xx
//! responses.

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;

pub use error::AppError;

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
