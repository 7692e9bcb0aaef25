// Identity Resolver
//
// Concept: Assign every row a canonical stellar identifier through a tiered
// fallback chain of external lookups
// Synchronization: Runs after row standardization and alias-host unification;
// mutates main_id, ra_simbad, dec_simbad, list_id, angular_separation and
// resolution_tier in place. Later stages never call the external service.
//
// Tiers (a row leaves the chain at its first hit):
// 1. host + " " + binary label
// 2. alias + " " + binary label
// 3. host + binary label (no space)
// 4. alias + binary label (no space)
// 5. host
// 6. alias
// 7. cone search around the host group's first row, growing radius
// Then: main_id polishing (strip planet / component suffixes and re-query)
//
// Every name tier is one bulk lookup over the distinct query strings of the
// rows still unresolved. A failed lookup is logged and counts as all-miss.

use crate::audit::{AuditCategory, AuditLog};
use crate::types::{BinaryLabel, ResolutionTier, Row};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};

use super::angles::angular_separation;
use super::{ConeMatch, ConeResolver, NameMatch, NameResolver};

static PLANET_LIKE_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s\d][b-i]$").unwrap());
static POLISH_PAREN_AB: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s\d]\(AB\)$").unwrap());
static POLISH_AB: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-z\s\d]AB$").unwrap());
static POLISH_COMPONENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s\d]([ABCSN])$").unwrap());

/// Name tiers in the order they are tried
const NAME_TIERS: [ResolutionTier; 6] = [
    ResolutionTier::HostBinary,
    ResolutionTier::AliasBinary,
    ResolutionTier::HostBinaryCompact,
    ResolutionTier::AliasBinaryCompact,
    ResolutionTier::Host,
    ResolutionTier::Alias,
];

/// Tiered identity resolver over injected name / cone capabilities
pub struct IdentityResolver<'a> {
    names: &'a dyn NameResolver,
    cones: &'a dyn ConeResolver,
    /// Cone radii in degrees, smallest first
    cone_radii: Vec<f64>,
}

impl<'a> IdentityResolver<'a> {
    pub fn new(
        names: &'a dyn NameResolver,
        cones: &'a dyn ConeResolver,
        cone_radii: Vec<f64>,
    ) -> Self {
        Self {
            names,
            cones,
            cone_radii,
        }
    }

    /// Resolve every row in place
    pub async fn resolve(&self, rows: &mut [Row], audit: &mut AuditLog) {
        for tier in NAME_TIERS {
            if rows.iter().all(Row::is_resolved) {
                break;
            }
            let resolved = self.run_name_tier(tier, rows, audit).await;
            tracing::info!("Tier '{}' resolved {} rows", tier.as_str(), resolved);
        }

        if rows.iter().any(|r| !r.is_resolved()) {
            let resolved = self.run_cone_search(rows).await;
            tracing::info!("Cone search resolved {} rows", resolved);
        }

        self.polish_main_ids(rows, audit).await;

        let unresolved = rows.iter().filter(|r| !r.is_resolved()).count();
        tracing::info!(
            "Identity resolution complete: {} rows, {} unresolved",
            rows.len(),
            unresolved
        );
    }

    async fn lookup(&self, queries: &BTreeSet<String>, what: &str) -> BTreeMap<String, NameMatch> {
        if queries.is_empty() {
            return BTreeMap::new();
        }
        match self.names.lookup_by_name(queries).await {
            Ok(matches) => matches,
            Err(e) => {
                tracing::warn!("{} lookup failed ({} names), treating as miss: {}", what, queries.len(), e);
                BTreeMap::new()
            }
        }
    }

    async fn run_name_tier(
        &self,
        tier: ResolutionTier,
        rows: &mut [Row],
        audit: &mut AuditLog,
    ) -> usize {
        // Step 1: per-row query strings, deduplicated into one bulk lookup
        let pending: Vec<(usize, Vec<String>)> = rows
            .iter()
            .enumerate()
            .filter(|(_, row)| !row.is_resolved())
            .map(|(idx, row)| (idx, tier_queries(tier, row)))
            .filter(|(_, queries)| !queries.is_empty())
            .collect();

        let queries: BTreeSet<String> = pending
            .iter()
            .flat_map(|(_, q)| q.iter().cloned())
            .collect();
        let matches = self.lookup(&queries, tier.as_str()).await;
        if matches.is_empty() {
            return 0;
        }

        // Step 2: first hit per row wins
        let mut resolved = 0;
        for (idx, row_queries) in pending {
            let hits: Vec<(&String, &NameMatch)> = row_queries
                .iter()
                .filter_map(|q| matches.get_key_value(q))
                .collect();
            let Some((_, first)) = hits.first() else {
                continue;
            };

            let distinct: BTreeSet<&str> = hits.iter().map(|(_, m)| m.main_id.as_str()).collect();
            if distinct.len() > 1 {
                let detail = hits
                    .iter()
                    .map(|(q, m)| format!("{} -> {}", q, m.main_id))
                    .collect::<Vec<_>>()
                    .join(", ");
                audit.record(
                    AuditCategory::IdentityResolution,
                    rows[idx].name.clone(),
                    format!("aliases disagree, kept {}: {}", first.main_id, detail),
                );
            }

            apply_name_match(&mut rows[idx], first, tier);
            resolved += 1;
        }
        resolved
    }

    async fn run_cone_search(&self, rows: &mut [Row]) -> usize {
        let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (idx, row) in rows.iter().enumerate() {
            if !row.is_resolved() && row.ra.is_some() && row.dec.is_some() {
                groups.entry(row.host.clone()).or_default().push(idx);
            }
        }

        let mut resolved = 0;
        for (host, members) in &groups {
            let center = &rows[members[0]];
            let (Some(ra), Some(dec)) = (center.ra, center.dec) else {
                continue;
            };

            for &radius in &self.cone_radii {
                let candidates = match self.cones.lookup_by_cone(ra, dec, radius).await {
                    Ok(candidates) => candidates,
                    Err(e) => {
                        tracing::warn!("Cone search for '{}' at {} deg failed: {}", host, radius, e);
                        continue;
                    }
                };

                if let Some((best, separation)) = pick_cone_match(ra, dec, candidates) {
                    tracing::debug!(
                        "Cone match for '{}': {} at {:.6} deg (radius {})",
                        host,
                        best.main_id,
                        separation,
                        radius
                    );
                    for &idx in members {
                        let row = &mut rows[idx];
                        row.main_id = best.main_id.clone();
                        row.ra_simbad = Some(best.ra);
                        row.dec_simbad = Some(best.dec);
                        row.angular_separation = separation;
                        row.resolution_tier = Some(ResolutionTier::Cone);
                    }
                    resolved += members.len();
                    break;
                }
            }
        }

        // Alias sets of cone-resolved identifiers
        let ids: BTreeSet<String> = rows
            .iter()
            .filter(|r| r.resolution_tier == Some(ResolutionTier::Cone))
            .map(|r| r.main_id.clone())
            .collect();
        let matches = self.lookup(&ids, "Cone alias").await;
        for row in rows
            .iter_mut()
            .filter(|r| r.resolution_tier == Some(ResolutionTier::Cone))
        {
            if let Some(m) = matches.get(&row.main_id) {
                row.list_id.extend(m.aliases.iter().cloned());
            }
        }

        resolved
    }

    async fn polish_main_ids(&self, rows: &mut [Row], audit: &mut AuditLog) {
        // Step 1: identifiers carrying a planet / component suffix
        let ids: BTreeSet<&str> = rows
            .iter()
            .filter(|r| r.is_resolved())
            .map(|r| r.main_id.as_str())
            .collect();
        let candidates: Vec<(String, String, Option<BinaryLabel>)> = ids
            .into_iter()
            .filter_map(|id| polish_candidate(id).map(|(base, label)| (id.to_string(), base, label)))
            .collect();
        if candidates.is_empty() {
            return;
        }

        // Members are collected before any rewrite
        let members: Vec<Vec<usize>> = candidates
            .iter()
            .map(|(old, _, _)| {
                rows.iter()
                    .enumerate()
                    .filter(|(_, r)| &r.main_id == old)
                    .map(|(idx, _)| idx)
                    .collect()
            })
            .collect();

        // Step 2: one bulk lookup of the stripped identifiers
        let queries: BTreeSet<String> = candidates.iter().map(|(_, base, _)| base.clone()).collect();
        let matches = self.lookup(&queries, "Polish").await;

        // Step 3: apply
        for ((old, base, label), members) in candidates.iter().zip(members) {
            let Some(found) = matches.get(base) else {
                audit.record(
                    AuditCategory::MainIdCorrection,
                    old.clone(),
                    format!("{} cannot be found", base),
                );
                continue;
            };

            for &idx in &members {
                let row = &mut rows[idx];
                row.main_id = found.main_id.clone();
                if found.ra.is_some() && found.dec.is_some() {
                    row.ra_simbad = found.ra;
                    row.dec_simbad = found.dec;
                }
                row.list_id.extend(found.aliases.iter().cloned());
            }

            if let Some(label) = label {
                if members.iter().all(|&idx| rows[idx].binary.is_weak()) {
                    for &idx in &members {
                        rows[idx].binary = label.clone();
                    }
                } else if members.iter().any(|&idx| rows[idx].binary != *label) {
                    let labels: BTreeSet<&str> =
                        members.iter().map(|&idx| rows[idx].binary.as_str()).collect();
                    audit.record(
                        AuditCategory::MainIdCorrection,
                        old.clone(),
                        format!(
                            "suffix {} disagrees with row labels {:?}, labels kept",
                            label,
                            labels
                        ),
                    );
                }
            }

            audit.record(
                AuditCategory::MainIdCorrection,
                old.clone(),
                format!("-> {} ({} rows)", found.main_id, members.len()),
            );
        }
    }
}

/// Query strings a row contributes to a name tier, sorted, ASCII only
fn tier_queries(tier: ResolutionTier, row: &Row) -> Vec<String> {
    let suffix = row.binary.query_suffix();
    let hosts = || std::iter::once(row.host.as_str());
    let aliases = || row.alias.iter().map(String::as_str);

    let queries: Vec<String> = match tier {
        ResolutionTier::HostBinary => hosts().map(|n| spaced(n, suffix)).collect(),
        ResolutionTier::AliasBinary => aliases().map(|n| spaced(n, suffix)).collect(),
        ResolutionTier::HostBinaryCompact => match suffix {
            Some(s) => hosts().map(|n| format!("{}{}", n, s)).collect(),
            None => Vec::new(),
        },
        ResolutionTier::AliasBinaryCompact => match suffix {
            Some(s) => aliases().map(|n| format!("{}{}", n, s)).collect(),
            None => Vec::new(),
        },
        ResolutionTier::Host => hosts().map(String::from).collect(),
        ResolutionTier::Alias => aliases().map(String::from).collect(),
        ResolutionTier::Cone => Vec::new(),
    };

    let mut queries: Vec<String> = queries
        .into_iter()
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty() && q.is_ascii())
        .collect();
    queries.dedup();
    queries
}

fn spaced(name: &str, suffix: Option<&str>) -> String {
    match suffix {
        Some(s) => format!("{} {}", name, s),
        None => name.to_string(),
    }
}

fn apply_name_match(row: &mut Row, found: &NameMatch, tier: ResolutionTier) {
    row.main_id = found.main_id.clone();
    row.ra_simbad = found.ra;
    row.dec_simbad = found.dec;
    row.list_id = found.aliases.clone();
    row.angular_separation = 0.0;
    row.resolution_tier = Some(tier);
}

/// Closest cone candidate; ties broken on the lexicographically smallest identifier
///
/// Candidates that look like planets are ignored whenever a non-planet
/// candidate exists.
pub fn pick_cone_match(ra: f64, dec: f64, candidates: Vec<ConeMatch>) -> Option<(ConeMatch, f64)> {
    let has_star = candidates.iter().any(|c| !PLANET_LIKE_ID.is_match(&c.main_id));
    candidates
        .into_iter()
        .filter(|c| !has_star || !PLANET_LIKE_ID.is_match(&c.main_id))
        .map(|c| {
            let separation = angular_separation(ra, dec, c.ra, c.dec);
            (c, separation)
        })
        .min_by(|(a, sep_a), (b, sep_b)| {
            sep_a
                .total_cmp(sep_b)
                .then_with(|| a.main_id.cmp(&b.main_id))
        })
}

/// Stripped identifier to re-query, and the component label the suffix implied
///
/// First matching rule wins: planet letter, "(AB)", "AB", single component.
pub fn polish_candidate(main_id: &str) -> Option<(String, Option<BinaryLabel>)> {
    let id = main_id.trim_end();
    if PLANET_LIKE_ID.is_match(id) {
        let base = id[..id.len() - 1].trim().replace("NAME ", "");
        return Some((base, None));
    }
    if POLISH_PAREN_AB.is_match(id) {
        let base = id[..id.len() - 4].trim().to_string();
        return Some((base, Some(BinaryLabel::Circumbinary)));
    }
    if POLISH_AB.is_match(id) {
        let base = id[..id.len() - 2].trim().to_string();
        return Some((base, Some(BinaryLabel::Circumbinary)));
    }
    if let Some(captures) = POLISH_COMPONENT.captures(id) {
        let base = id[..id.len() - 1].trim().to_string();
        return Some((base, Some(BinaryLabel::parse(&captures[1]))));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ResolverError;
    use crate::types::SourceCatalog;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Canned answers keyed by query string, counting bulk calls
    #[derive(Default)]
    struct CannedNames {
        answers: BTreeMap<String, NameMatch>,
        calls: Mutex<Vec<BTreeSet<String>>>,
    }

    impl CannedNames {
        fn with(mut self, query: &str, main_id: &str, ra: f64, dec: f64) -> Self {
            self.answers.insert(
                query.to_string(),
                NameMatch {
                    main_id: main_id.to_string(),
                    ra: Some(ra),
                    dec: Some(dec),
                    aliases: [main_id.to_string(), query.to_string()].into_iter().collect(),
                },
            );
            self
        }
    }

    #[async_trait]
    impl NameResolver for CannedNames {
        async fn lookup_by_name(
            &self,
            names: &BTreeSet<String>,
        ) -> Result<BTreeMap<String, NameMatch>, ResolverError> {
            self.calls.lock().unwrap().push(names.clone());
            Ok(names
                .iter()
                .filter_map(|n| self.answers.get(n).map(|m| (n.clone(), m.clone())))
                .collect())
        }
    }

    #[derive(Default)]
    struct CannedCone {
        /// Objects visible to every cone, filtered by radius
        objects: Vec<ConeMatch>,
        fail: bool,
    }

    #[async_trait]
    impl ConeResolver for CannedCone {
        async fn lookup_by_cone(
            &self,
            ra: f64,
            dec: f64,
            radius: f64,
        ) -> Result<Vec<ConeMatch>, ResolverError> {
            if self.fail {
                return Err(ResolverError::Malformed("down".to_string()));
            }
            Ok(self
                .objects
                .iter()
                .filter(|o| angular_separation(ra, dec, o.ra, o.dec) <= radius)
                .cloned()
                .collect())
        }
    }

    struct FailingNames;

    #[async_trait]
    impl NameResolver for FailingNames {
        async fn lookup_by_name(
            &self,
            _names: &BTreeSet<String>,
        ) -> Result<BTreeMap<String, NameMatch>, ResolverError> {
            Err(ResolverError::Status(503, "unavailable".to_string()))
        }
    }

    fn radii() -> Vec<f64> {
        vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5]
    }

    fn row(host: &str, binary: &str, aliases: &[&str]) -> Row {
        let mut row = Row::new(SourceCatalog::Eu, &format!("{} b", host), host);
        row.binary = BinaryLabel::parse(binary);
        row.letter = "b".to_string();
        row.alias = aliases.iter().map(|a| a.to_string()).collect();
        row
    }

    #[tokio::test]
    async fn test_host_binary_tier_wins_first() {
        let names = CannedNames::default()
            .with("HD 41004 B", "HD  41004B", 10.0, -5.0)
            .with("HD 41004", "HD  41004", 10.0, -5.0);
        let cones = CannedCone::default();
        let resolver = IdentityResolver::new(&names, &cones, radii());

        let mut rows = vec![row("HD 41004", "B", &[])];
        let mut audit = AuditLog::new();
        resolver.resolve(&mut rows, &mut audit).await;

        assert_eq!(rows[0].main_id, "HD  41004B");
        assert_eq!(rows[0].resolution_tier, Some(ResolutionTier::HostBinary));
        assert_eq!(rows[0].angular_separation, 0.0);
        assert_eq!(rows[0].ra_simbad, Some(10.0));
    }

    #[tokio::test]
    async fn test_falls_through_to_alias_then_compact() {
        let names = CannedNames::default()
            .with("HIP 5", "HD 5", 1.0, 1.0)
            .with("Kepler-16AB", "Kepler-16", 2.0, 2.0);
        let cones = CannedCone::default();
        let resolver = IdentityResolver::new(&names, &cones, radii());

        let mut rows = vec![row("Foo 5", "", &["HIP 5"]), row("Kepler-16", "AB", &[])];
        let mut audit = AuditLog::new();
        resolver.resolve(&mut rows, &mut audit).await;

        assert_eq!(rows[0].main_id, "HD 5");
        assert_eq!(rows[0].resolution_tier, Some(ResolutionTier::AliasBinary));
        assert_eq!(rows[1].main_id, "Kepler-16");
        assert_eq!(rows[1].resolution_tier, Some(ResolutionTier::HostBinaryCompact));
    }

    #[tokio::test]
    async fn test_bulk_queries_are_deduplicated() {
        let names = CannedNames::default().with("WASP-1", "WASP-1", 3.0, 3.0);
        let cones = CannedCone::default();
        let resolver = IdentityResolver::new(&names, &cones, radii());

        let mut rows = vec![row("WASP-1", "", &[]), row("WASP-1", "", &[])];
        let mut audit = AuditLog::new();
        resolver.resolve(&mut rows, &mut audit).await;

        let calls = names.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].len(), 1);
        assert!(rows.iter().all(|r| r.main_id == "WASP-1"));
    }

    #[tokio::test]
    async fn test_non_ascii_queries_are_skipped() {
        let names = CannedNames::default();
        let cones = CannedCone::default();
        let resolver = IdentityResolver::new(&names, &cones, radii());

        let mut rows = vec![row("Tau Boö", "", &[])];
        let mut audit = AuditLog::new();
        resolver.resolve(&mut rows, &mut audit).await;

        assert!(names.calls.lock().unwrap().is_empty());
        assert!(!rows[0].is_resolved());
    }

    #[tokio::test]
    async fn test_alias_disagreement_is_audited() {
        let names = CannedNames::default()
            .with("HIP 1", "HD 1", 1.0, 1.0)
            .with("TYC 1", "HD 2", 1.0, 1.0);
        let cones = CannedCone::default();
        let resolver = IdentityResolver::new(&names, &cones, radii());

        let mut rows = vec![row("Foo", "", &["TYC 1", "HIP 1"])];
        let mut audit = AuditLog::new();
        resolver.resolve(&mut rows, &mut audit).await;

        // Sorted alias order: "HIP 1" before "TYC 1"
        assert_eq!(rows[0].main_id, "HD 1");
        assert_eq!(audit.count(AuditCategory::IdentityResolution), 1);
    }

    #[tokio::test]
    async fn test_cone_search_grows_radius_and_fetches_aliases() {
        let names = CannedNames::default().with("TIC 99", "TIC 99", 0.0, 0.0);
        let cones = CannedCone {
            objects: vec![ConeMatch {
                main_id: "TIC 99".to_string(),
                ra: 100.003,
                dec: 20.0,
            }],
            fail: false,
        };
        let resolver = IdentityResolver::new(&names, &cones, radii());

        let mut r = row("Unknown-1", "", &[]);
        r.ra = Some(100.0);
        r.dec = Some(20.0);
        let mut rows = vec![r];
        let mut audit = AuditLog::new();
        resolver.resolve(&mut rows, &mut audit).await;

        assert_eq!(rows[0].main_id, "TIC 99");
        assert_eq!(rows[0].resolution_tier, Some(ResolutionTier::Cone));
        assert!(rows[0].angular_separation > 0.0);
        assert!(rows[0].angular_separation < 0.005);
        assert!(rows[0].list_id.contains("TIC 99"));
    }

    #[tokio::test]
    async fn test_resolver_failures_are_misses() {
        let cones = CannedCone {
            objects: Vec::new(),
            fail: true,
        };
        let resolver = IdentityResolver::new(&FailingNames, &cones, radii());

        let mut r = row("HD 1", "", &["HIP 1"]);
        r.ra = Some(1.0);
        r.dec = Some(1.0);
        let mut rows = vec![r];
        let mut audit = AuditLog::new();
        resolver.resolve(&mut rows, &mut audit).await;

        assert!(!rows[0].is_resolved());
        assert_eq!(rows[0].resolution_tier, None);
    }

    #[test]
    fn test_pick_cone_match_tie_break_and_planet_filter() {
        let candidates = vec![
            ConeMatch {
                main_id: "Zeta".to_string(),
                ra: 0.0,
                dec: 0.5,
            },
            ConeMatch {
                main_id: "Alpha".to_string(),
                ra: 0.0,
                dec: -0.5,
            },
            ConeMatch {
                main_id: "HD 1 b".to_string(),
                ra: 0.0,
                dec: 0.0,
            },
        ];
        // Equidistant pair, closer planet ignored
        let (best, _) = pick_cone_match(0.0, 0.0, candidates).unwrap();
        assert_eq!(best.main_id, "Alpha");

        let only_planet = vec![ConeMatch {
            main_id: "HD 1 b".to_string(),
            ra: 10.0,
            dec: 0.0,
        }];
        let (best, sep) = pick_cone_match(10.0, 0.0, only_planet).unwrap();
        assert_eq!(best.main_id, "HD 1 b");
        assert_eq!(sep, 0.0);

        assert!(pick_cone_match(0.0, 0.0, Vec::new()).is_none());
    }

    #[test]
    fn test_polish_candidate_rules() {
        assert_eq!(
            polish_candidate("NAME Kepler-16 b"),
            Some(("Kepler-16".to_string(), None))
        );
        assert_eq!(
            polish_candidate("Kepler-34 (AB)"),
            Some(("Kepler-34".to_string(), Some(BinaryLabel::Circumbinary)))
        );
        assert_eq!(
            polish_candidate("Kepler-47AB"),
            Some(("Kepler-47".to_string(), Some(BinaryLabel::Circumbinary)))
        );
        assert_eq!(
            polish_candidate("HD 41004 B"),
            Some(("HD 41004".to_string(), Some(BinaryLabel::parse("B"))))
        );
        assert_eq!(polish_candidate("HD 209458"), None);
        // Planet letters stop at "i"
        assert_eq!(polish_candidate("Gliese 9 j"), None);
    }

    #[tokio::test]
    async fn test_polish_applies_component_to_weak_labels() {
        let names = CannedNames::default()
            .with("XO-2 S", "XO-2 S", 1.0, 1.0)
            .with("XO-2", "XO-2", 1.5, 1.5);
        let cones = CannedCone::default();
        let resolver = IdentityResolver::new(&names, &cones, radii());

        let mut rows = vec![row("XO-2 S", "", &[])];
        let mut audit = AuditLog::new();
        resolver.resolve(&mut rows, &mut audit).await;

        assert_eq!(rows[0].main_id, "XO-2");
        assert_eq!(rows[0].binary, BinaryLabel::parse("S"));
        assert_eq!(rows[0].ra_simbad, Some(1.5));
        assert!(rows[0].list_id.contains("XO-2 S"));
        assert_eq!(audit.count(AuditCategory::MainIdCorrection), 1);
    }

    #[tokio::test]
    async fn test_polish_miss_is_audited() {
        let names = CannedNames::default().with("Foo B", "Foo B", 1.0, 1.0);
        let cones = CannedCone::default();
        let resolver = IdentityResolver::new(&names, &cones, radii());

        let mut rows = vec![row("Foo B", "", &[])];
        let mut audit = AuditLog::new();
        resolver.resolve(&mut rows, &mut audit).await;

        assert_eq!(rows[0].main_id, "Foo B");
        let record = audit.by_category(AuditCategory::MainIdCorrection).next().unwrap();
        assert!(record.detail.contains("cannot be found"));
    }
}
