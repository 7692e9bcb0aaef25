//! Identity-field cleanup ahead of resolution
//!
//! - [`NameNormalizer`]: designation rewriting + known-mistake replacements
//! - [`BinaryLabelExtractor`]: binary-component labels out of host strings
//! - [`RowStandardizer`]: per-row standardization (letters, brown dwarfs, measurements)
//! - [`unify_alias_hosts`]: fold hosts that are aliases of other hosts

pub mod alias_host;
pub mod binary_label;
pub mod name_normalizer;
pub mod nomenclature;
pub mod standardize;

pub use alias_host::unify_alias_hosts;
pub use binary_label::BinaryLabelExtractor;
pub use name_normalizer::NameNormalizer;
pub use standardize::RowStandardizer;
