//! # Exo-MerCat Common Library
//!
//! Shared code for the Exo-MerCat crates:
//! - Error types
//! - Configuration loading (CLI > ENV > TOML > compiled defaults)
//! - Known-mistake replacement tables

pub mod config;
pub mod error;
pub mod replacements;

pub use error::{Error, Result};
pub use replacements::ReplacementPolicy;
