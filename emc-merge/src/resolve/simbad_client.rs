// SIMBAD TAP Client
//
// Concept: Production implementation of the name and cone capabilities
// against the SIMBAD TAP synchronous endpoint (ADQL over HTTP, JSON results)
//
// Rate limiting: every HTTP request waits on a token-bucket limiter sized by
// [resolver] max_requests_per_second.
// Timeout: one fixed client timeout from [resolver] timeout_secs.
//
// API Documentation: https://simbad.cds.unistra.fr/simbad/sim-tap

use crate::error::ResolverError;
use async_trait::async_trait;
use emc_common::config::ResolverConfig;
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::num::NonZeroU32;
use std::time::Duration;

use super::angles::{parse_dec, parse_ra};
use super::{ConeMatch, ConeResolver, NameMatch, NameResolver};

const USER_AGENT: &str = concat!("exo-mercat/", env!("CARGO_PKG_VERSION"));

/// TAP JSON result table
#[derive(Debug, Deserialize)]
struct TapResponse {
    metadata: Vec<TapColumn>,
    #[serde(default)]
    data: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct TapColumn {
    name: String,
}

impl TapResponse {
    fn column(&self, name: &str) -> Result<usize, ResolverError> {
        self.metadata
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| ResolverError::Malformed(format!("missing column '{}'", name)))
    }
}

/// SIMBAD TAP client (name + cone capabilities)
pub struct SimbadClient {
    client: Client,
    base_url: String,
    /// Maximum identifiers per `IN (...)` query
    batch_size: usize,
    rate_limiter: RateLimiter<
        governor::state::direct::NotKeyed,
        governor::state::InMemoryState,
        governor::clock::DefaultClock,
    >,
}

impl SimbadClient {
    pub fn new(config: &ResolverConfig) -> Result<Self, ResolverError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()?;

        let per_second = NonZeroU32::new(config.max_requests_per_second).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = RateLimiter::direct(Quota::per_second(per_second));

        Ok(Self {
            client,
            base_url: config.simbad_tap_url.trim_end_matches('/').to_string(),
            batch_size: config.name_batch_size.max(1),
            rate_limiter,
        })
    }

    /// Run one ADQL query against `{base}/sync`
    async fn query(&self, adql: &str) -> Result<TapResponse, ResolverError> {
        self.rate_limiter.until_ready().await;

        let url = format!("{}/sync", self.base_url);
        tracing::debug!("SIMBAD TAP query: {}", adql);

        let response = self
            .client
            .post(&url)
            .form(&[
                ("REQUEST", "doQuery"),
                ("LANG", "ADQL"),
                ("FORMAT", "json"),
                ("QUERY", adql),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ResolverError::Status(status.as_u16(), body));
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ResolverError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl NameResolver for SimbadClient {
    async fn lookup_by_name(
        &self,
        names: &BTreeSet<String>,
    ) -> Result<BTreeMap<String, NameMatch>, ResolverError> {
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        let mut matches = BTreeMap::new();
        let mut last_error = None;
        let mut succeeded = 0usize;

        for chunk in names.chunks(self.batch_size) {
            match self.query(&name_query(chunk)).await.and_then(parse_name_rows) {
                Ok(found) => {
                    succeeded += 1;
                    for (query, m) in found {
                        matches.entry(query).or_insert(m);
                    }
                }
                Err(e) => {
                    tracing::warn!("SIMBAD name batch of {} failed: {}", chunk.len(), e);
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if succeeded == 0 => Err(e),
            _ => {
                tracing::debug!("SIMBAD resolved {}/{} names", matches.len(), names.len());
                Ok(matches)
            }
        }
    }
}

#[async_trait]
impl ConeResolver for SimbadClient {
    async fn lookup_by_cone(
        &self,
        ra: f64,
        dec: f64,
        radius: f64,
    ) -> Result<Vec<ConeMatch>, ResolverError> {
        let response = self.query(&cone_query(ra, dec, radius)).await?;
        parse_cone_rows(response)
    }
}

fn quote(name: &str) -> String {
    format!("'{}'", name.replace('\'', "''"))
}

/// Bulk identifier query: one result row per matching identifier
pub fn name_query(names: &[&str]) -> String {
    let list = names.iter().map(|n| quote(n)).collect::<Vec<_>>().join(", ");
    format!(
        "SELECT ident.id AS query, basic.main_id, basic.ra, basic.dec, ids.ids \
         FROM ident JOIN basic ON ident.oidref = basic.oid \
         LEFT OUTER JOIN ids ON basic.oid = ids.oidref \
         WHERE ident.id IN ({})",
        list
    )
}

/// Objects inside a circle of `radius` degrees
pub fn cone_query(ra: f64, dec: f64, radius: f64) -> String {
    format!(
        "SELECT basic.main_id, basic.ra, basic.dec FROM basic \
         WHERE CONTAINS(POINT('ICRS', basic.ra, basic.dec), CIRCLE('ICRS', {}, {}, {})) = 1",
        ra, dec, radius
    )
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn coordinate(value: &Value, parse: fn(&str) -> Option<f64>) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse(s),
        _ => None,
    }
}

fn parse_name_rows(response: TapResponse) -> Result<BTreeMap<String, NameMatch>, ResolverError> {
    let query_col = response.column("query")?;
    let id_col = response.column("main_id")?;
    let ra_col = response.column("ra")?;
    let dec_col = response.column("dec")?;
    let ids_col = response.column("ids")?;

    let mut matches = BTreeMap::new();
    for row in &response.data {
        let cell = |idx: usize| row.get(idx).unwrap_or(&Value::Null);
        let (Some(query), Some(main_id)) = (text(cell(query_col)), text(cell(id_col))) else {
            continue;
        };

        let aliases: BTreeSet<String> = text(cell(ids_col))
            .unwrap_or_default()
            .split('|')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();

        matches.entry(query).or_insert(NameMatch {
            main_id,
            ra: coordinate(cell(ra_col), parse_ra),
            dec: coordinate(cell(dec_col), parse_dec),
            aliases,
        });
    }
    Ok(matches)
}

fn parse_cone_rows(response: TapResponse) -> Result<Vec<ConeMatch>, ResolverError> {
    let id_col = response.column("main_id")?;
    let ra_col = response.column("ra")?;
    let dec_col = response.column("dec")?;

    Ok(response
        .data
        .iter()
        .filter_map(|row| {
            let cell = |idx: usize| row.get(idx).unwrap_or(&Value::Null);
            Some(ConeMatch {
                main_id: text(cell(id_col))?,
                ra: coordinate(cell(ra_col), parse_ra)?,
                dec: coordinate(cell(dec_col), parse_dec)?,
            })
        })
        .collect())
}
