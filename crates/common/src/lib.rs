//! Common types for Model Store
//! 
//! This crate provides the error taxonomy shared by the storage, configuration
//! and application crates.

pub mod error;

// Re-export commonly used types
pub use error::{BoxError, Error, Result};
