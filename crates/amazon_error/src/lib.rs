//! Error types for the amazon-core client layer.
//!
//! This crate provides the error taxonomy shared by every Amazon API
//! integration in the workspace.
//!
//! # Error Hierarchy
//!
//! Errors follow the `ErrorKind` + wrapper struct pattern:
//! - [`AmazonErrorKind`] enumerates the failure classes and their payloads
//! - [`AmazonError`] wraps the kind with shared metadata (code, retryable,
//!   timestamp, cause) and source location tracking
//! - [`ApiErrorFactory`] is the only place raw HTTP error responses are turned
//!   into errors
//!
//! # Examples
//!
//! ```
//! use amazon_error::{AmazonError, AmazonResult, RetryableError};
//!
//! fn fetch_orders() -> AmazonResult<Vec<String>> {
//!     Err(AmazonError::http(503, "Service Unavailable", None))
//! }
//!
//! match fetch_orders() {
//!     Ok(orders) => println!("Got {} orders", orders.len()),
//!     Err(e) if e.is_retryable() => eprintln!("transient: {}", e),
//!     Err(e) => eprintln!("fatal: {}", e),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod factory;
mod kind;
mod provider;
mod retryable;
mod sanitize;

pub use error::{AmazonError, AmazonResult};
pub use factory::{ApiErrorFactory, ErrorResponse, from_response, parse_retry_after};
pub use kind::{AmazonErrorKind, ConnectionFailure, FieldViolation, RateLimitInfo};
pub use provider::Provider;
pub use retryable::RetryableError;
pub use sanitize::SanitizedError;
