//! emc-merge library interface
//!
//! Cross-catalog identity resolution and merge engine. Uniform rows from the
//! source catalogs go in; one merged entry per planet comes out, together
//! with an [`AuditLog`] of every conflict and correction along the way.

pub mod audit;
pub mod catalog_io;
pub mod error;
pub mod merge;
pub mod normalize;
pub mod pipeline;
pub mod resolve;
pub mod types;
pub mod validate;

pub use crate::audit::{AuditCategory, AuditLog, AuditRecord};
pub use crate::error::{MergeError, MergeResult, ResolverError};
pub use crate::pipeline::{MergePipeline, PipelineOutput};
pub use crate::types::{MergedEntry, Row};
