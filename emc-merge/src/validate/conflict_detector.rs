// Conflict Detector
//
// Concept: Annotate resolved rows with data-quality flags before merging
// Synchronization: Runs after IdentityResolver. Sets coordinate_mismatch and
// potential_binary_mismatch in place; everything else it finds is written to
// the AuditLog only. Never fails: conflicts become flags, not errors.
//
// Checks, in order:
// 1. Coordinate mismatch within unresolved host groups (mode of rounded ra/dec)
// 2. Binary-label mismatch within (host, letter) groups
// 3. Binary-label mismatch within (main_id, letter) groups, host when unresolved
// 4. Post-resolution identity checks (audit only)

use crate::audit::{AuditCategory, AuditLog};
use crate::types::{BinaryLabel, BinaryMismatch, CoordinateMismatch, Row};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};

static BINARY_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s\d]([ABCNS])$").unwrap());

/// Grouping key for the binary-label check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupingKey {
    Host,
    MainId,
}

impl GroupingKey {
    fn of(self, row: &Row) -> &str {
        match self {
            Self::Host => &row.host,
            Self::MainId => row.identity_key(),
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Host => "host",
            Self::MainId => "main_id",
        }
    }
}

/// Summary of one annotate() run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConflictSummary {
    pub coordinate_mismatches: usize,
    pub auto_fixed_binaries: usize,
    pub unresolved_binaries: usize,
}

/// Conflict detector (coordinate and binary-label policy)
pub struct ConflictDetector {
    /// Coordinate tolerance in degrees
    tolerance: f64,
}

impl Default for ConflictDetector {
    fn default() -> Self {
        Self::new(0.01)
    }
}

impl ConflictDetector {
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }

    /// Run every check over the row table
    pub fn annotate(&self, rows: &mut [Row], audit: &mut AuditLog) -> ConflictSummary {
        let coordinate_mismatches = self.check_coordinates(rows, audit);
        self.check_binary_mismatch(rows, GroupingKey::Host, audit);
        self.check_binary_mismatch(rows, GroupingKey::MainId, audit);
        self.post_resolution_checks(rows, audit);

        let summary = ConflictSummary {
            coordinate_mismatches,
            auto_fixed_binaries: rows
                .iter()
                .filter(|r| r.potential_binary_mismatch == BinaryMismatch::AutoFixed)
                .count(),
            unresolved_binaries: rows
                .iter()
                .filter(|r| r.potential_binary_mismatch == BinaryMismatch::Unresolved)
                .count(),
        };
        tracing::info!(
            "Conflicts: {} coordinate mismatches, {} suspect binary fixes, {} unresolved binary labels",
            summary.coordinate_mismatches,
            summary.auto_fixed_binaries,
            summary.unresolved_binaries
        );
        summary
    }

    /// Flag unresolved rows whose ra/dec deviates from their host group's mode
    ///
    /// Resolved rows trust the canonical coordinates and are skipped.
    /// Returns the number of rows flagged.
    pub fn check_coordinates(&self, rows: &mut [Row], audit: &mut AuditLog) -> usize {
        let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (idx, row) in rows.iter().enumerate() {
            if !row.is_resolved() {
                groups.entry(row.host.clone()).or_default().push(idx);
            }
        }

        let mut flagged = 0;
        for (host, members) in groups.iter().filter(|(_, m)| m.len() > 1) {
            let ra_mode = rounded_mode(members.iter().filter_map(|&i| rows[i].ra));
            let dec_mode = rounded_mode(members.iter().filter_map(|&i| rows[i].dec));

            for &idx in members {
                let row = &mut rows[idx];
                let deviates = |value: Option<f64>, mode: Option<f64>| match (value, mode) {
                    (Some(v), Some(m)) => (v - m).abs() > self.tolerance,
                    _ => false,
                };
                let mismatch = CoordinateMismatch::from_axes(
                    deviates(row.ra, ra_mode),
                    deviates(row.dec, dec_mode),
                );
                if mismatch == CoordinateMismatch::None {
                    continue;
                }

                row.coordinate_mismatch = row.coordinate_mismatch.combine(mismatch);
                flagged += 1;
                audit.record(
                    AuditCategory::CoordinateMismatch,
                    host.as_str(),
                    format!(
                        "{} ({}) {}: ra={:?} dec={:?}, group mode ra={:?} dec={:?}",
                        row.name,
                        row.catalog,
                        mismatch.as_str(),
                        row.ra,
                        row.dec,
                        ra_mode,
                        dec_mode
                    ),
                );
            }
        }

        tracing::debug!("Coordinate check flagged {} rows", flagged);
        flagged
    }

    /// Reconcile binary labels within (key, letter) groups
    ///
    /// Pass 1 moves "S-type" onto the most common other label, empty
    /// included; pass 2 moves empty labels onto the most common non-empty
    /// label. Rows relabeled while their coordinates disagree with the target
    /// label's rows get `AutoFixed`; groups that still disagree get
    /// `Unresolved`. An `Unresolved` verdict from an earlier key is cleared
    /// first; `AutoFixed` stays, since the relabel it marks is already applied.
    pub fn check_binary_mismatch(&self, rows: &mut [Row], key: GroupingKey, audit: &mut AuditLog) {
        let mut groups: BTreeMap<(String, String), Vec<usize>> = BTreeMap::new();
        for (idx, row) in rows.iter_mut().enumerate() {
            if row.potential_binary_mismatch == BinaryMismatch::Unresolved {
                row.potential_binary_mismatch = BinaryMismatch::None;
            }
            let k = key.of(row);
            if k.is_empty() {
                continue;
            }
            groups
                .entry((k.to_string(), row.letter.clone()))
                .or_default()
                .push(idx);
        }

        for ((group_key, letter), members) in &groups {
            self.note_missed_binary(rows, key, group_key, members, audit);

            if distinct_labels(rows, members).len() < 2 {
                continue;
            }
            let before = members
                .iter()
                .map(|&i| rows[i].binary.as_str())
                .collect::<Vec<_>>()
                .join(",");

            // Step 1: S-type against every other label
            if distinct_labels(rows, members).contains(&BinaryLabel::SType) {
                let target = most_common(
                    members
                        .iter()
                        .map(|&i| &rows[i].binary)
                        .filter(|b| **b != BinaryLabel::SType),
                );
                if let Some(target) = target {
                    self.relabel(rows, members, &BinaryLabel::SType, &target);
                }
            }

            // Step 2: empty against non-empty labels
            let labels = distinct_labels(rows, members);
            if labels.contains(&BinaryLabel::None) {
                let target = most_common(
                    members
                        .iter()
                        .map(|&i| &rows[i].binary)
                        .filter(|b| **b != BinaryLabel::None),
                );
                if let Some(target) = target {
                    self.relabel(rows, members, &BinaryLabel::None, &target);
                }
            }

            // Step 3: residual disagreement
            let labels = distinct_labels(rows, members);
            let outcome = if labels.len() > 1 {
                for &idx in members {
                    raise(&mut rows[idx], BinaryMismatch::Unresolved);
                }
                "unresolved"
            } else {
                "reconciled"
            };

            audit.record(
                AuditCategory::BinaryMismatch,
                format!("{} {} {}", key.as_str(), group_key, letter),
                format!(
                    "labels [{}] {} -> [{}]",
                    before,
                    outcome,
                    labels.iter().map(BinaryLabel::as_str).collect::<Vec<_>>().join(",")
                ),
            );
        }
    }

    fn relabel(&self, rows: &mut [Row], members: &[usize], from: &BinaryLabel, to: &BinaryLabel) {
        let anchors: Vec<(Option<f64>, Option<f64>)> = members
            .iter()
            .filter(|&&i| rows[i].binary == *to)
            .map(|&i| (rows[i].ra, rows[i].dec))
            .collect();

        for &idx in members {
            if rows[idx].binary != *from {
                continue;
            }
            let row = &mut rows[idx];
            let suspect = anchors.iter().any(|&(ra, dec)| {
                self.differs(row.ra, ra) && self.differs(row.dec, dec)
            });
            row.binary = to.clone();
            if suspect {
                raise(row, BinaryMismatch::AutoFixed);
            }
        }
    }

    fn differs(&self, a: Option<f64>, b: Option<f64>) -> bool {
        match (a, b) {
            (Some(a), Some(b)) => (a - b).abs() > self.tolerance,
            _ => false,
        }
    }

    /// Key ends in a component letter the rows' labels do not carry
    fn note_missed_binary(
        &self,
        rows: &[Row],
        key: GroupingKey,
        group_key: &str,
        members: &[usize],
        audit: &mut AuditLog,
    ) {
        let Some(captures) = BINARY_SUFFIX.captures(group_key) else {
            return;
        };
        let suffix = &captures[1];
        for &idx in members {
            let row = &rows[idx];
            if row.binary.as_str() != suffix {
                audit.record(
                    AuditCategory::BinaryMismatch,
                    format!("{} {}", key.as_str(), group_key),
                    format!(
                        "MISSED POTENTIAL BINARY: {} ({}) labeled '{}'",
                        row.name, row.catalog, row.binary
                    ),
                );
            }
        }
    }

    /// Identity checks after resolution; audit records only
    pub fn post_resolution_checks(&self, rows: &[Row], audit: &mut AuditLog) {
        let mut by_host: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        let mut by_host_binary: BTreeMap<(&str, &str), BTreeSet<&str>> = BTreeMap::new();
        let mut by_main_id: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();

        for row in rows.iter().filter(|r| r.is_resolved()) {
            by_host.entry(&row.host).or_default().insert(&row.main_id);
            by_host_binary
                .entry((&row.host, row.binary.as_str()))
                .or_default()
                .insert(&row.main_id);
            by_main_id.entry(&row.main_id).or_default().insert(&row.host);
        }

        for (host, ids) in by_host.iter().filter(|(_, ids)| ids.len() > 1) {
            audit.record(
                AuditCategory::IdentityResolution,
                *host,
                format!("same host resolved to different main_id: {:?}", ids),
            );
        }
        for ((host, binary), ids) in by_host_binary.iter().filter(|(_, ids)| ids.len() > 1) {
            audit.record(
                AuditCategory::IdentityResolution,
                format!("{} {}", host, binary),
                format!("same host and binary resolved to different main_id: {:?}", ids),
            );
        }
        for (main_id, hosts) in by_main_id.iter().filter(|(_, hosts)| hosts.len() > 1) {
            audit.record(
                AuditCategory::IdentityResolution,
                *main_id,
                format!("same main_id reached from different hosts: {:?}", hosts),
            );
        }
    }
}

fn raise(row: &mut Row, flag: BinaryMismatch) {
    row.potential_binary_mismatch = row.potential_binary_mismatch.max(flag);
}

fn distinct_labels(rows: &[Row], members: &[usize]) -> Vec<BinaryLabel> {
    let mut labels: Vec<BinaryLabel> = members.iter().map(|&i| rows[i].binary.clone()).collect();
    labels.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    labels.dedup();
    labels
}

/// Most frequent label; ties go to the label whose text sorts first
fn most_common<'a>(labels: impl Iterator<Item = &'a BinaryLabel>) -> Option<BinaryLabel> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for label in labels {
        *counts.entry(label.as_str()).or_default() += 1;
    }

    let mut best: Option<(&str, usize)> = None;
    for (label, count) in counts {
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((label, count));
        }
    }
    best.map(|(label, _)| BinaryLabel::parse(label))
}

/// Statistical mode of values rounded to 3 decimals
///
/// Rounding is half away from zero; ties go to the value seen first.
pub fn rounded_mode(values: impl Iterator<Item = f64>) -> Option<f64> {
    let mut counts: Vec<(i64, usize)> = Vec::new();
    for value in values {
        let key = (value * 1000.0).round() as i64;
        match counts.iter_mut().find(|(k, _)| *k == key) {
            Some((_, count)) => *count += 1,
            None => counts.push((key, 1)),
        }
    }

    let mut best: Option<(i64, usize)> = None;
    for (key, count) in counts {
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((key, count));
        }
    }
    best.map(|(key, _)| key as f64 / 1000.0)
}
