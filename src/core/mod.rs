//! Core types shared across the crate
//!
//! - `HandlerError` / `ErrorKind` - Typed invocation failures
//! - `HandlerResult` - Result alias

pub mod error;

pub use error::{ErrorKind, HandlerError, HandlerResult};
