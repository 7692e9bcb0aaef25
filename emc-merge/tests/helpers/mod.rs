//! Test helpers: row builder and a canned resolver standing in for SIMBAD

#![allow(dead_code)]

use async_trait::async_trait;
use emc_common::config::TomlConfig;
use emc_common::ReplacementPolicy;
use emc_merge::resolve::{ConeMatch, ConeResolver, NameMatch, NameResolver};
use emc_merge::types::{BinaryLabel, Measurement, Row, SourceCatalog};
use emc_merge::{MergePipeline, MergeResult, PipelineOutput, ResolverError};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Builder for uniform rows as the per-source adapters would emit them
pub struct RowBuilder {
    row: Row,
}

pub fn row(catalog: SourceCatalog, name: &str, host: &str) -> RowBuilder {
    RowBuilder {
        row: Row::new(catalog, name, host),
    }
}

impl RowBuilder {
    pub fn coords(mut self, ra: f64, dec: f64) -> Self {
        self.row.ra = Some(ra);
        self.row.dec = Some(dec);
        self
    }

    pub fn period(mut self, p: f64) -> Self {
        let url = self.row.catalog.as_str();
        self.row.params.p = Measurement::new(p, p * 0.001, p * 0.001, url);
        self
    }

    pub fn mass(mut self, value: f64, err: f64) -> Self {
        let url = self.row.catalog.as_str();
        self.row.params.mass = Measurement::new(value, err, err, url);
        self
    }

    pub fn msini(mut self, value: f64, err: f64) -> Self {
        let url = self.row.catalog.as_str();
        self.row.params.msini = Measurement::new(value, err, err, url);
        self
    }

    pub fn binary(mut self, label: &str) -> Self {
        self.row.binary = BinaryLabel::parse(label);
        self
    }

    pub fn alias(mut self, alias: &str) -> Self {
        self.row.alias.insert(alias.to_string());
        self
    }

    pub fn build(self) -> Row {
        self.row
    }
}

/// Canned name and cone answers with call counting
#[derive(Default)]
pub struct FakeResolver {
    names: BTreeMap<String, NameMatch>,
    cone_objects: Vec<ConeMatch>,
    fail: bool,
    name_calls: AtomicUsize,
    cone_calls: AtomicUsize,
}

impl FakeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolver whose every call fails
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Answer `query` with `main_id` at (ra, dec)
    pub fn with_name(mut self, query: &str, main_id: &str, ra: f64, dec: f64) -> Self {
        let aliases: BTreeSet<String> = [query, main_id].iter().map(|s| s.to_string()).collect();
        self.names.insert(
            query.to_string(),
            NameMatch {
                main_id: main_id.to_string(),
                ra: Some(ra),
                dec: Some(dec),
                aliases,
            },
        );
        self
    }

    /// Object returned by any cone that contains it
    pub fn with_object(mut self, main_id: &str, ra: f64, dec: f64) -> Self {
        self.cone_objects.push(ConeMatch {
            main_id: main_id.to_string(),
            ra,
            dec,
        });
        self
    }

    pub fn name_calls(&self) -> usize {
        self.name_calls.load(Ordering::SeqCst)
    }

    pub fn cone_calls(&self) -> usize {
        self.cone_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NameResolver for FakeResolver {
    async fn lookup_by_name(
        &self,
        names: &BTreeSet<String>,
    ) -> Result<BTreeMap<String, NameMatch>, ResolverError> {
        self.name_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ResolverError::Status(503, "unavailable".to_string()));
        }
        Ok(names
            .iter()
            .filter_map(|n| self.names.get(n).map(|m| (n.clone(), m.clone())))
            .collect())
    }
}

#[async_trait]
impl ConeResolver for FakeResolver {
    async fn lookup_by_cone(
        &self,
        ra: f64,
        dec: f64,
        radius: f64,
    ) -> Result<Vec<ConeMatch>, ResolverError> {
        self.cone_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ResolverError::Malformed("timeout".to_string()));
        }
        Ok(self
            .cone_objects
            .iter()
            .filter(|o| (o.ra - ra).abs() <= radius && (o.dec - dec).abs() <= radius)
            .cloned()
            .collect())
    }
}

/// Run the full pipeline with default config and no replacement rules
pub async fn run_pipeline(resolver: &FakeResolver, rows: Vec<Row>) -> MergeResult<PipelineOutput> {
    let config = TomlConfig::default();
    MergePipeline::new(ReplacementPolicy::default(), resolver, resolver, &config)
        .run(rows)
        .await
}
