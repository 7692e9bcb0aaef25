// Post-Merge Auditor
//
// Concept: Second look at the merged catalog
// Synchronization: Consumes GroupMerger output, returns it re-sorted.
//
// 1. Letter reconciliation within (main_id, binary) period / sma bins
// 2. Residual duplicate flagging on (main_id, binary, letter)
// Reconciliation runs first so that entries it relabels onto the same letter
// are reported as duplicates. No entries are merged here.

use crate::audit::{AuditCategory, AuditLog};
use crate::normalize::standardize::{is_placeholder_letter, BROWN_DWARF_LETTER};
use crate::types::MergedEntry;
use std::collections::{BTreeMap, BTreeSet};

use super::binning::NO_BIN;
use super::group_merger::display_name;

/// Post-merge auditor
#[derive(Debug, Default, Clone, Copy)]
pub struct PostMergeAuditor;

impl PostMergeAuditor {
    pub fn new() -> Self {
        Self
    }

    pub fn audit_and_repair(
        &self,
        mut entries: Vec<MergedEntry>,
        audit: &mut AuditLog,
    ) -> Vec<MergedEntry> {
        let fixed = self.reconcile_letters(&mut entries, audit);
        let duplicates = self.flag_duplicates(&mut entries, audit);
        entries.sort_by(|a, b| a.display_name.cmp(&b.display_name));

        tracing::info!(
            "Post-merge audit: {} letters fixed, {} entries flagged as duplicates",
            fixed,
            duplicates
        );
        entries
    }

    /// Give entries that share a period (or sma) bin one planet letter
    ///
    /// Within a bin holding several letters: "BD" wins outright; otherwise a
    /// single real letter replaces ".0N" placeholders. Returns entries changed.
    pub fn reconcile_letters(&self, entries: &mut [MergedEntry], audit: &mut AuditLog) -> usize {
        let mut bins: BTreeMap<(String, String, char, i32), Vec<usize>> = BTreeMap::new();
        for (idx, entry) in entries.iter().enumerate() {
            let bin = if entry.period_bin != NO_BIN {
                ('p', entry.period_bin)
            } else if entry.sma_bin != NO_BIN {
                ('a', entry.sma_bin)
            } else {
                continue;
            };
            bins.entry((
                entry.main_id.clone(),
                entry.binary.as_str().to_string(),
                bin.0,
                bin.1,
            ))
            .or_default()
            .push(idx);
        }

        let mut fixed = 0;
        for ((main_id, binary, kind, bin), members) in bins {
            let letters: BTreeSet<String> =
                members.iter().map(|&i| entries[i].letter.clone()).collect();
            if letters.len() < 2 {
                continue;
            }

            let target = if letters.contains(BROWN_DWARF_LETTER) {
                BROWN_DWARF_LETTER.to_string()
            } else {
                let real: Vec<&String> = letters
                    .iter()
                    .filter(|l| !is_placeholder_letter(l))
                    .collect();
                match real.as_slice() {
                    [only] => (*only).clone(),
                    _ => {
                        tracing::debug!(
                            "Letters {:?} for {} {} in {} bin {} left as is",
                            letters,
                            main_id,
                            binary,
                            kind,
                            bin
                        );
                        continue;
                    }
                }
            };

            for &idx in &members {
                let entry = &mut entries[idx];
                if entry.letter == target {
                    continue;
                }
                audit.record(
                    AuditCategory::LetterFix,
                    entry.display_name.as_str(),
                    format!("letter {} -> {} ({} bin {})", entry.letter, target, kind, bin),
                );
                entry.letter = target.clone();
                entry.display_name = display_name(&entry.main_id, &entry.binary, &entry.letter);
                fixed += 1;
            }
        }
        fixed
    }

    /// Flag entries that still share (main_id, binary, letter)
    pub fn flag_duplicates(&self, entries: &mut [MergedEntry], audit: &mut AuditLog) -> usize {
        let mut groups: BTreeMap<(String, String, String), Vec<usize>> = BTreeMap::new();
        for (idx, entry) in entries.iter().enumerate() {
            groups
                .entry((
                    entry.main_id.clone(),
                    entry.binary.as_str().to_string(),
                    entry.letter.clone(),
                ))
                .or_default()
                .push(idx);
        }

        let mut flagged = 0;
        for members in groups.into_values().filter(|m| m.len() > 1) {
            let names: Vec<String> = members
                .iter()
                .map(|&i| {
                    let e = &entries[i];
                    format!(
                        "{} [{}] p_bin={} a_bin={}",
                        e.display_name,
                        e.catalogs.iter().map(|c| c.as_str()).collect::<Vec<_>>().join(","),
                        e.period_bin,
                        e.sma_bin
                    )
                })
                .collect();
            audit.record(
                AuditCategory::PostMergeDuplicate,
                entries[members[0]].display_name.as_str(),
                names.join("; "),
            );
            for &idx in &members {
                entries[idx].emc_duplicate_flag = true;
            }
            flagged += members.len();
        }
        flagged
    }
}

/// Move entries heavier than `mass_limit` (Jupiter masses) to a separate list
///
/// Uses the true mass, falling back to msini. Returns (planets, brown dwarfs).
pub fn split_known_brown_dwarfs(
    entries: Vec<MergedEntry>,
    mass_limit: f64,
) -> (Vec<MergedEntry>, Vec<MergedEntry>) {
    let (brown_dwarfs, planets): (Vec<_>, Vec<_>) = entries
        .into_iter()
        .partition(|e| e.screening_mass().is_some_and(|m| m > mass_limit));

    tracing::info!(
        "{} entries above {} Mjup moved to the brown dwarf list",
        brown_dwarfs.len(),
        mass_limit
    );
    (planets, brown_dwarfs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::group_merger::GroupMerger;
    use crate::types::{Measurement, ResolutionTier, Row, SourceCatalog};

    fn row(catalog: SourceCatalog, main_id: &str, letter: &str, p: f64) -> Row {
        let mut r = Row::new(catalog, &format!("{} {}", main_id, letter), main_id);
        r.main_id = main_id.to_string();
        r.resolution_tier = Some(ResolutionTier::Host);
        r.letter = letter.to_string();
        r.params.p = Measurement::new(p, 0.01, 0.01, catalog.as_str());
        r
    }

    fn merged(rows: Vec<Row>) -> Vec<MergedEntry> {
        let mut audit = AuditLog::new();
        GroupMerger::default().merge(&rows, &mut audit).unwrap()
    }

    #[test]
    fn test_placeholder_takes_the_real_letter() {
        let entries = merged(vec![
            row(SourceCatalog::Koi, "Kepler-10", ".01", 0.837),
            row(SourceCatalog::Nasa, "Kepler-10", "b", 0.837),
            row(SourceCatalog::Nasa, "Kepler-10", "c", 45.29),
        ]);
        assert_eq!(entries.len(), 3);
        let mut audit = AuditLog::new();

        let entries = PostMergeAuditor::new().audit_and_repair(entries, &mut audit);

        let letters: Vec<&str> = entries.iter().map(|e| e.letter.as_str()).collect();
        assert_eq!(letters, vec!["b", "b", "c"]);
        assert_eq!(audit.count(AuditCategory::LetterFix), 1);
        // Relabeled entry now collides with the NASA one
        assert_eq!(entries.iter().filter(|e| e.emc_duplicate_flag).count(), 2);
        assert_eq!(audit.count(AuditCategory::PostMergeDuplicate), 1);
    }

    #[test]
    fn test_brown_dwarf_letter_dominates() {
        let entries = merged(vec![
            row(SourceCatalog::Eu, "HD 3", "BD", 700.0),
            row(SourceCatalog::Nasa, "HD 3", "b", 700.0),
        ]);
        let mut audit = AuditLog::new();

        let entries = PostMergeAuditor::new().audit_and_repair(entries, &mut audit);

        assert!(entries.iter().all(|e| e.letter == "BD"));
        assert!(entries.iter().all(|e| e.display_name == "HD 3 BD"));
    }

    #[test]
    fn test_two_real_letters_are_left_alone() {
        let entries = merged(vec![
            row(SourceCatalog::Eu, "HD 4", "b", 10.0),
            row(SourceCatalog::Nasa, "HD 4", "c", 10.0),
        ]);
        let mut audit = AuditLog::new();

        let entries = PostMergeAuditor::new().audit_and_repair(entries, &mut audit);

        assert_eq!(entries[0].letter, "b");
        assert_eq!(entries[1].letter, "c");
        assert!(entries.iter().all(|e| !e.emc_duplicate_flag));
        assert!(audit.is_empty());
    }

    #[test]
    fn test_split_entries_are_flagged_not_merged() {
        let entries = merged(vec![
            row(SourceCatalog::Eu, "HD 5", "b", 3.0),
            row(SourceCatalog::Nasa, "HD 5", "b", 300.0),
        ]);
        let mut audit = AuditLog::new();

        let entries = PostMergeAuditor::new().audit_and_repair(entries, &mut audit);

        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.emc_duplicate_flag));
    }

    #[test]
    fn test_split_known_brown_dwarfs() {
        let mut rows = vec![
            row(SourceCatalog::Eu, "HD 6", "b", 3.0),
            row(SourceCatalog::Eu, "HD 7", "b", 3.0),
            row(SourceCatalog::Eu, "HD 8", "b", 3.0),
        ];
        rows[0].params.mass = Measurement::new(35.0, 1.0, 1.0, "eu");
        rows[1].params.msini = Measurement::new(2.0, 0.1, 0.1, "eu");

        let (planets, brown_dwarfs) = split_known_brown_dwarfs(merged(rows), 20.0);

        assert_eq!(brown_dwarfs.len(), 1);
        assert_eq!(brown_dwarfs[0].main_id, "HD 6");
        assert_eq!(planets.len(), 2);
    }
}
