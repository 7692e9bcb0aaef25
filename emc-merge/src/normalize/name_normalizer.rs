// Name Normalizer
//
// Concept: Rule-based rewriting of star and planet designations
// Synchronization: Applied to every name/host/alias field before identity
// resolution; owns the injected known-mistake ReplacementPolicy
//
// Rule order:
// 1. Transliterate to ASCII, strip quotes, collapse whitespace
// 2. Catalog-prefix canonicalization (KOI, TOI, 2MASS, GJ, OGLE, MOA, KMT, ...)
// 3. Constellation Greek-letter / genitive substitution
//
// Transliteration runs first so that the later rules see plain ASCII and a
// second application of normalize() is a no-op.

use crate::audit::{AuditCategory, AuditLog};
use crate::types::{BinaryLabel, Row};
use emc_common::ReplacementPolicy;
use once_cell::sync::Lazy;
use regex::Regex;

use super::nomenclature::substitute_constellation_tokens;

static TWO_MASS_SHORT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^2M[\d ]").unwrap());
static VHS_SHORT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^VHS \d").unwrap());

/// Literal substring rewrites applied after the prefix rules
const PREFIX_REPLACEMENTS: &[(&str, &str)] = &[
    ("KOI ", "KOI-"),
    ("kepler", "Kepler"),
    ("Kepler ", "Kepler-"),
    ("BD ", "BD"),
];

/// Name normalizer (rule-based designation rewriting)
pub struct NameNormalizer {
    policy: ReplacementPolicy,
}

impl Default for NameNormalizer {
    fn default() -> Self {
        Self::new(ReplacementPolicy::default())
    }
}

impl NameNormalizer {
    pub fn new(policy: ReplacementPolicy) -> Self {
        Self { policy }
    }

    /// Normalize a single designation. Never fails; unmatched input passes through.
    pub fn normalize(&self, raw: &str) -> String {
        let ascii = deunicode::deunicode(raw);
        let unquoted: String = ascii.chars().filter(|c| *c != '\'' && *c != '"').collect();
        let collapsed = collapse_whitespace(&unquoted);

        let prefixed = canonicalize_prefixes(&collapsed);
        let substituted = substitute_constellation_tokens(&prefixed);

        collapse_whitespace(&substituted)
    }

    /// Apply the known-mistake replacement table to raw rows
    ///
    /// Drops rows matching a `[drop]` rule, then rewrites name/host/coordinates
    /// and forces binary labels. Every rule that matched nothing is recorded
    /// as an `UnusedReplacement`.
    pub fn apply_replacements(&self, rows: Vec<Row>, audit: &mut AuditLog) -> Vec<Row> {
        let policy = &self.policy;
        let before = rows.len();

        // Step 1: DROP
        let mut rows: Vec<Row> = rows
            .into_iter()
            .filter(|row| {
                !policy.drop.iter().any(|(column, needles)| {
                    needles.iter().any(|needle| match column.as_str() {
                        "name" => row.name.contains(needle.as_str()),
                        "host" => row.host.contains(needle.as_str()),
                        "alias" => row.alias.iter().any(|a| a.contains(needle.as_str())),
                        _ => false,
                    })
                })
            })
            .collect();
        let dropped = before - rows.len();

        // Step 2: NAME -> NAME
        for (from, to) in &policy.name_to_name {
            let hits = rewrite(&mut rows, |r| r.name == *from, |r| r.name = to.clone());
            note_rule(audit, "name_to_name", from, to, hits);
        }

        // Step 3: NAME -> HOST
        for (name, host) in &policy.name_to_host {
            let hits = rewrite(&mut rows, |r| r.name == *name, |r| r.host = host.clone());
            note_rule(audit, "name_to_host", name, host, hits);
        }

        // Step 4: HOST -> HOST
        for (from, to) in &policy.host_to_host {
            let hits = rewrite(&mut rows, |r| r.host == *from, |r| r.host = to.clone());
            note_rule(audit, "host_to_host", from, to, hits);
        }

        // Step 5: HOST -> coordinates
        for (host, ra) in &policy.host_to_ra {
            let hits = rewrite(&mut rows, |r| r.host == *host, |r| r.ra = Some(*ra));
            note_rule(audit, "host_to_ra", host, &ra.to_string(), hits);
        }
        for (host, dec) in &policy.host_to_dec {
            let hits = rewrite(&mut rows, |r| r.host == *host, |r| r.dec = Some(*dec));
            note_rule(audit, "host_to_dec", host, &dec.to_string(), hits);
        }

        // Step 6: NAME -> BINARY
        for (name, label) in &policy.name_to_binary {
            let label = BinaryLabel::parse(&label.replace("NaN", ""));
            let hits = rewrite(&mut rows, |r| r.name == *name, |r| r.binary = label.clone());
            note_rule(audit, "name_to_binary", name, label.as_str(), hits);
        }

        tracing::info!(
            "Known mistakes replaced: {} rules, {} rows dropped, {} rules unused",
            policy.len(),
            dropped,
            audit.count(AuditCategory::UnusedReplacement)
        );

        rows
    }
}

fn rewrite(
    rows: &mut [Row],
    matches: impl Fn(&Row) -> bool,
    apply: impl Fn(&mut Row),
) -> usize {
    let mut hits = 0;
    for row in rows.iter_mut().filter(|r| matches(r)) {
        apply(row);
        hits += 1;
    }
    hits
}

fn note_rule(audit: &mut AuditLog, section: &str, key: &str, value: &str, hits: usize) {
    if hits == 0 {
        audit.record(AuditCategory::UnusedReplacement, key, section);
    } else {
        audit.record(
            AuditCategory::Replacement,
            key,
            format!("{}: -> {} ({} rows)", section, value, hits),
        );
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Catalog-prefix canonicalization
fn canonicalize_prefixes(name: &str) -> String {
    let mut name = name.to_string();

    // K00752.01 -> KOI-752.01
    if name.starts_with("K0") {
        name = format!("KOI-{}", name.trim_start_matches('K').trim_start_matches('0'));
    }
    if let Some(rest) = name.strip_prefix("TOI ") {
        name = format!("TOI-{}", rest.trim_start());
    }
    if TWO_MASS_SHORT.is_match(&name) {
        name = format!("2MASS J{}", name[2..].trim_start());
        name = name.replace("JJ", "J").replace("J ", "J");
    }
    name = name.replace("Gliese ", "GJ ");
    if VHS_SHORT.is_match(&name) {
        name = name.replacen("VHS ", "VHS J", 1);
    }
    name = name.replace("Gl ", "GJ ");
    if name.contains("KMT-") {
        if let Some((head, _)) = name.split_once('/') {
            name = head.to_string();
        }
        name = name.trim_end_matches('L').replace(':', "-");
    }
    if name.contains("MOA-") {
        name = name.replace("MOA-", "MOA ").trim_end_matches('L').to_string();
    }
    if name.contains("OGLE") {
        name = name
            .replace("OGLE--", "OGLE ")
            .replace("OGLE-", "OGLE ")
            .trim_end_matches('L')
            .to_string();
    }
    if name.contains("CoRoT-") {
        name = name.replace("CoRoT-", "CoRoT ");
    }
    if name.contains("2MASS") {
        name = name.trim_end_matches([' ', 'a']).to_string();
    }

    for (from, to) in PREFIX_REPLACEMENTS {
        if name.contains(from) {
            name = name.replace(from, to);
        }
    }

    name
}
