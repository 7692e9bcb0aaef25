// Group Merger
//
// Concept: Collapse same-planet rows from different catalogs into one
// MergedEntry each
// Synchronization: Consumes the annotated, identity-resolved row table;
// emits MergedEntry values sorted by display name. Rows are read, never
// mutated.
//
// Algorithm:
// 1. Fit catalog-wide log bins for period and semi-major axis
// 2. Group rows by (main_id or host, binary, letter)
// 3. Split a group when its rows fall in more than one period bin
//    (semi-major axis bin when no row has a period)
// 4. Merge each sub-group field by field
//
// Every row lands in exactly one sub-group.

use crate::audit::{AuditCategory, AuditLog};
use crate::error::{MergeError, MergeResult};
use crate::types::{
    BinaryLabel, BinaryMismatch, CoordinateMismatch, MergedEntry, MergingMismatch, Parameter,
    Parameters, Row, SourceCatalog, Status,
};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};

use super::best_measurement::{best_mass, select_best};
use super::binning::{assign_bins, NO_BIN};

static TRAILING_COMPONENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s\d][ABCNS]$").unwrap());

/// Alias tokens that carry no identity on their own
const NOISE_ALIASES: [&str; 3] = ["", "A", "B"];
/// Discovery method placeholder some catalogs emit
const DEFAULT_METHOD: &str = "Default";

/// Working period / sma bin of every row, by row index
#[derive(Debug, Clone, PartialEq)]
pub struct RowBins {
    pub period: Vec<i32>,
    pub sma: Vec<i32>,
}

/// Rows that merge into one entry
#[derive(Debug, Clone, PartialEq)]
pub struct SubGroup {
    pub members: Vec<usize>,
    pub merging_mismatch: MergingMismatch,
}

/// Output name: main_id without its component letter, then binary, then letter
pub fn display_name(main_id: &str, binary: &BinaryLabel, letter: &str) -> String {
    let base = if TRAILING_COMPONENT.is_match(main_id) {
        main_id[..main_id.len() - 1].trim_end()
    } else {
        main_id
    };

    let mut name = base.to_string();
    if !binary.as_str().is_empty() {
        name.push(' ');
        name.push_str(binary.as_str());
    }
    if !letter.is_empty() {
        name.push(' ');
        name.push_str(letter);
    }
    name
}

/// Group merger (identity grouping + period split + field merge)
pub struct GroupMerger {
    period_bins: usize,
}

impl Default for GroupMerger {
    fn default() -> Self {
        Self::new(300)
    }
}

impl GroupMerger {
    pub fn new(period_bins: usize) -> Self {
        Self { period_bins }
    }

    /// Catalog-wide period and sma bins
    pub fn bin_rows(&self, rows: &[Row]) -> RowBins {
        let periods: Vec<Option<f64>> = rows.iter().map(|r| r.params.p.value).collect();
        let smas: Vec<Option<f64>> = rows.iter().map(|r| r.params.a.value).collect();
        RowBins {
            period: assign_bins(&periods, self.period_bins),
            sma: assign_bins(&smas, self.period_bins),
        }
    }

    /// Partition row indices into merge sub-groups
    ///
    /// Fails with `MergeError::Invariant` when a row has no planet letter.
    pub fn partition(
        &self,
        rows: &[Row],
        bins: &RowBins,
        audit: &mut AuditLog,
    ) -> MergeResult<Vec<SubGroup>> {
        if let Some(row) = rows.iter().find(|r| r.letter.is_empty()) {
            return Err(MergeError::Invariant(format!(
                "row '{}' from {} reached merging without a planet letter",
                row.name, row.catalog
            )));
        }

        // Step 1: identity groups
        let mut groups: BTreeMap<(String, String, String), Vec<usize>> = BTreeMap::new();
        for (idx, row) in rows.iter().enumerate() {
            groups
                .entry((
                    row.identity_key().to_string(),
                    row.binary.as_str().to_string(),
                    row.letter.clone(),
                ))
                .or_default()
                .push(idx);
        }

        // Step 2: period / sma split
        let mut subgroups = Vec::new();
        for ((key, binary, letter), members) in groups {
            let period_bins = distinct_bins(&members, &bins.period);
            let sma_bins = distinct_bins(&members, &bins.sma);

            let (split_on, parameter) = if !period_bins.is_empty() {
                (&bins.period, "period")
            } else if !sma_bins.is_empty() {
                (&bins.sma, "sma")
            } else {
                subgroups.push(SubGroup {
                    members,
                    merging_mismatch: MergingMismatch::Fallback,
                });
                continue;
            };

            let distinct = distinct_bins(&members, split_on);
            if distinct.len() == 1 {
                subgroups.push(SubGroup {
                    members,
                    merging_mismatch: MergingMismatch::Agreement,
                });
                continue;
            }

            audit.record(
                AuditCategory::ContrastingPeriod,
                format!("{} {} {}", key, binary, letter),
                format!(
                    "{} rows split on {} bins {:?}: {}",
                    members.len(),
                    parameter,
                    distinct,
                    members
                        .iter()
                        .map(|&i| format!("{}: {}", rows[i].catalog, rows[i].catalog_name))
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            );

            let mut by_bin: BTreeMap<i32, Vec<usize>> = BTreeMap::new();
            for idx in members {
                by_bin.entry(split_on[idx]).or_default().push(idx);
            }
            subgroups.extend(by_bin.into_values().map(|members| SubGroup {
                members,
                merging_mismatch: MergingMismatch::Split,
            }));
        }

        Ok(subgroups)
    }

    /// Merge the whole row table
    pub fn merge(&self, rows: &[Row], audit: &mut AuditLog) -> MergeResult<Vec<MergedEntry>> {
        let bins = self.bin_rows(rows);
        let subgroups = self.partition(rows, &bins, audit)?;

        let mut entries: Vec<MergedEntry> = subgroups
            .iter()
            .map(|group| self.merge_group(rows, &bins, group, audit))
            .collect();
        entries.sort_by(|a, b| a.display_name.cmp(&b.display_name));

        let split = subgroups
            .iter()
            .filter(|g| g.merging_mismatch == MergingMismatch::Split)
            .count();
        let duplicates = entries.iter().filter(|e| e.duplicate_flag).count();
        tracing::info!(
            "Merged {} rows into {} entries ({} split on period, {} with duplicate sources)",
            rows.len(),
            entries.len(),
            split,
            duplicates
        );

        Ok(entries)
    }

    fn merge_group(
        &self,
        rows: &[Row],
        bins: &RowBins,
        group: &SubGroup,
        audit: &mut AuditLog,
    ) -> MergedEntry {
        let members: Vec<&Row> = group.members.iter().map(|&i| &rows[i]).collect();
        let first = members[0];

        // Step 1: physical parameters
        let mut params = Parameters::default();
        for parameter in Parameter::ALL {
            *params.get_mut(parameter) = select_best(members.iter().map(|r| r.params.get(parameter)));
        }
        let (best_mass, best_mass_provenance) = best_mass(&params);

        // Step 2: identity and coordinates from the best-provenance row
        let preferred = members
            .iter()
            .min_by_key(|r| r.provenance().preference())
            .copied()
            .unwrap_or(first);
        let (ra, dec) = preferred.best_coordinates();
        let main_id = first.identity_key().to_string();

        // Step 3: bookkeeping
        let catalogs: BTreeSet<SourceCatalog> = members.iter().map(|r| r.catalog).collect();
        let mut catalog_names = BTreeMap::new();
        for row in &members {
            catalog_names
                .entry(row.catalog)
                .or_insert_with(|| row.catalog_name.clone());
        }

        let aliases: BTreeSet<String> = members
            .iter()
            .flat_map(|r| r.alias.iter().chain(r.list_id.iter()))
            .map(|a| a.trim().to_string())
            .filter(|a| !NOISE_ALIASES.contains(&a.as_str()))
            .collect();

        let separations: BTreeSet<u64> = members
            .iter()
            .map(|r| r.angular_separation.to_bits())
            .collect();

        let duplicate_flag = members.len() > catalogs.len();
        let duplicate_names: Vec<String> = if duplicate_flag {
            members
                .iter()
                .map(|r| format!("{}: {}", r.catalog, r.catalog_name))
                .collect()
        } else {
            Vec::new()
        };
        let display = display_name(&main_id, &first.binary, &first.letter);
        if duplicate_flag {
            audit.record(
                AuditCategory::DuplicateEntry,
                display.as_str(),
                duplicate_names.join(", "),
            );
        }

        MergedEntry {
            display_name: display,
            main_id,
            host: most_common_host(&members),
            binary: first.binary.clone(),
            letter: first.letter.clone(),
            ra,
            dec,
            main_id_provenance: preferred.provenance(),
            params,
            best_mass,
            best_mass_provenance,
            status: merged_status(&members),
            discovery_method: merged_discovery_method(&members),
            discovery_year: members.iter().filter_map(|r| r.discovery_year).min(),
            aliases,
            catalogs,
            catalog_names,
            coordinate_mismatch: members
                .iter()
                .fold(CoordinateMismatch::None, |acc, r| acc.combine(r.coordinate_mismatch)),
            potential_binary_mismatch: members
                .iter()
                .map(|r| r.potential_binary_mismatch)
                .max()
                .unwrap_or(BinaryMismatch::None),
            angular_separation: members
                .iter()
                .map(|r| r.angular_separation)
                .fold(0.0, f64::max),
            angular_separation_flag: separations.len().saturating_sub(1),
            merging_mismatch: group.merging_mismatch,
            duplicate_flag,
            duplicate_names,
            emc_duplicate_flag: false,
            period_bin: single_bin(&group.members, &bins.period),
            sma_bin: single_bin(&group.members, &bins.sma),
        }
    }
}

fn distinct_bins(members: &[usize], bins: &[i32]) -> BTreeSet<i32> {
    members
        .iter()
        .map(|&i| bins[i])
        .filter(|b| *b != NO_BIN)
        .collect()
}

fn single_bin(members: &[usize], bins: &[i32]) -> i32 {
    let distinct = distinct_bins(members, bins);
    match distinct.len() {
        1 => distinct.into_iter().next().unwrap_or(NO_BIN),
        _ => NO_BIN,
    }
}

fn merged_status(members: &[&Row]) -> Status {
    let statuses: BTreeSet<Status> = members.iter().map(|r| r.status).collect();
    match statuses.len() {
        1 => statuses.into_iter().next().unwrap_or(Status::Unknown),
        _ => Status::Controversial,
    }
}

/// Union of methods; TOI's blanket "Transit" yields when other sources disagree
fn merged_discovery_method(members: &[&Row]) -> String {
    let methods = |include_toi: bool| -> BTreeSet<String> {
        members
            .iter()
            .filter(|r| include_toi || r.catalog != SourceCatalog::Toi)
            .flat_map(|r| r.discovery_method.split(','))
            .map(str::trim)
            .filter(|m| !m.is_empty() && *m != DEFAULT_METHOD)
            .map(String::from)
            .collect()
    };

    let mut union = methods(true);
    if union.len() > 1 && members.iter().any(|r| r.catalog == SourceCatalog::Toi) {
        let without_toi = methods(false);
        if !without_toi.is_empty() {
            union = without_toi;
        }
    }
    union.into_iter().collect::<Vec<_>>().join(",")
}

fn most_common_host(members: &[&Row]) -> String {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for row in members {
        *counts.entry(row.host.as_str()).or_default() += 1;
    }
    let mut best: Option<(&str, usize)> = None;
    for (host, count) in counts {
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((host, count));
        }
    }
    best.map(|(h, _)| h.to_string()).unwrap_or_default()
}
