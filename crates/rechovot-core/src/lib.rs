//! Rechovot Core: the error taxonomy shared across the Rechovot crates.
//!
//! This crate has no internal dependencies (dependency level 0). Every other
//! crate in the workspace reports failures through [`Error`] so that the
//! loader binary and the HTTP layer can classify them the same way.
//!
//! # Modules
//!
//! - [`error`]: Error types and Result alias

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;

// Re-export key types at crate root for convenience
pub use error::{Error, Result};
