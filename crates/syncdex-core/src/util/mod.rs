//! Utility functions for Syncdex.
//!
//! - [`text`]: query-text cleaning and model-name derivation
//! - [`json`]: document merging helpers

pub mod json;
pub mod text;

pub use json::deep_merge;
pub use text::{clean, pluralize};
