//! Syncdex search index mirroring — umbrella crate.
//!
//! This crate re-exports all Syncdex components for convenience.
//! Use feature flags to enable specific functionality.

#![doc = include_str!("../README.md")]

pub use syncdex_core as core;

#[cfg(feature = "client")]
pub use syncdex_client as client;

#[cfg(feature = "sync")]
pub use syncdex_sync as sync;
