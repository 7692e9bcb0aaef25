//! Canonical stellar identity resolution
//!
//! The merge engine only talks to the external name/coordinate service
//! through [`NameResolver`] and [`ConeResolver`]. [`SimbadClient`] is the
//! production implementation; tests substitute canned resolvers.

pub mod angles;
pub mod identity_resolver;
pub mod simbad_client;

pub use identity_resolver::IdentityResolver;
pub use simbad_client::SimbadClient;

use crate::error::ResolverError;
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};

/// Answer to a single name query
#[derive(Debug, Clone, PartialEq)]
pub struct NameMatch {
    pub main_id: String,
    /// Canonical coordinates, decimal degrees
    pub ra: Option<f64>,
    pub dec: Option<f64>,
    /// Every identifier the service knows for the object
    pub aliases: BTreeSet<String>,
}

/// One object found inside a search cone
#[derive(Debug, Clone, PartialEq)]
pub struct ConeMatch {
    pub main_id: String,
    pub ra: f64,
    pub dec: f64,
}

/// Bulk name lookup capability
///
/// Returns at most one match per query string; names without a match are
/// absent from the map.
#[async_trait]
pub trait NameResolver: Send + Sync {
    async fn lookup_by_name(
        &self,
        names: &BTreeSet<String>,
    ) -> Result<BTreeMap<String, NameMatch>, ResolverError>;
}

/// Cone search capability (unranked results)
#[async_trait]
pub trait ConeResolver: Send + Sync {
    async fn lookup_by_cone(
        &self,
        ra: f64,
        dec: f64,
        radius: f64,
    ) -> Result<Vec<ConeMatch>, ResolverError>;
}

/// Resolver that never finds anything (runs without network access)
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineResolver;

#[async_trait]
impl NameResolver for OfflineResolver {
    async fn lookup_by_name(
        &self,
        _names: &BTreeSet<String>,
    ) -> Result<BTreeMap<String, NameMatch>, ResolverError> {
        Ok(BTreeMap::new())
    }
}

#[async_trait]
impl ConeResolver for OfflineResolver {
    async fn lookup_by_cone(
        &self,
        _ra: f64,
        _dec: f64,
        _radius: f64,
    ) -> Result<Vec<ConeMatch>, ResolverError> {
        Ok(Vec::new())
    }
}
