//! Helpdesk Shared Types
//!
//! This crate contains types and errors shared across the helpdesk platform.

pub mod error;
pub mod types;

pub use error::*;
pub use types::*;
