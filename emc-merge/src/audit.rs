//! Audit log
//!
//! Every stage appends structured records describing the conflicts it found
//! and the corrections it made. The core never touches the filesystem; the
//! binary serializes the accumulated log with [`AuditLog::write_to_dir`].

use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

/// One category per human-review file
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AuditCategory {
    /// Replacement rule that matched no row
    UnusedReplacement,
    /// Manual replacement that was applied
    Replacement,
    AliasAsHost,
    CoordinateMismatch,
    BinaryMismatch,
    /// Resolver bookkeeping: alias disagreement, same host with different ids
    IdentityResolution,
    MainIdCorrection,
    /// Same identity group split on disagreeing period / sma
    ContrastingPeriod,
    DuplicateEntry,
    PostMergeDuplicate,
    LetterFix,
}

impl AuditCategory {
    pub fn file_name(self) -> &'static str {
        match self {
            Self::UnusedReplacement | Self::Replacement => "replace_known_mistakes.txt",
            Self::AliasAsHost => "alias_as_host.txt",
            Self::CoordinateMismatch => "check_coordinates.txt",
            Self::BinaryMismatch => "check_binary_mismatch.txt",
            Self::IdentityResolution => "post_main_id_query_checks.txt",
            Self::MainIdCorrection => "polish_main_id.txt",
            Self::ContrastingPeriod => "group_by_letter_check_period.txt",
            Self::DuplicateEntry => "merge_into_single_entry.txt",
            Self::PostMergeDuplicate => "potential_duplicates_after_merging.txt",
            Self::LetterFix => "group_by_period_check_letter.txt",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::UnusedReplacement => "UNUSED",
            Self::Replacement => "REPLACED",
            Self::AliasAsHost => "ALIAS AS HOST",
            Self::CoordinateMismatch => "COORDINATE MISMATCH",
            Self::BinaryMismatch => "BINARY MISMATCH",
            Self::IdentityResolution => "IDENTITY",
            Self::MainIdCorrection => "MAIN_ID",
            Self::ContrastingPeriod => "CONTRASTING PERIOD",
            Self::DuplicateEntry => "DUPLICATE",
            Self::PostMergeDuplicate => "EMC DUPLICATE",
            Self::LetterFix => "LETTER FIX",
        }
    }
}

/// A single audit entry
#[derive(Debug, Clone, PartialEq)]
pub struct AuditRecord {
    pub category: AuditCategory,
    /// Grouping key the record is about (host, main_id, planet name)
    pub key: String,
    pub detail: String,
}

impl fmt::Display for AuditRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} | {} | {}", self.category.label(), self.key, self.detail)
    }
}

/// Append-only collection of audit records
#[derive(Debug, Clone, Default)]
pub struct AuditLog {
    records: Vec<AuditRecord>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, category: AuditCategory, key: impl Into<String>, detail: impl Into<String>) {
        self.records.push(AuditRecord {
            category,
            key: key.into(),
            detail: detail.into(),
        });
    }

    pub fn extend(&mut self, other: AuditLog) {
        self.records.extend(other.records);
    }

    pub fn records(&self) -> &[AuditRecord] {
        &self.records
    }

    pub fn by_category(&self, category: AuditCategory) -> impl Iterator<Item = &AuditRecord> {
        self.records.iter().filter(move |r| r.category == category)
    }

    pub fn count(&self, category: AuditCategory) -> usize {
        self.by_category(category).count()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Append every record to its category file under `dir`
    ///
    /// Returns the files written, in file-name order.
    pub fn write_to_dir(&self, dir: &Path) -> std::io::Result<Vec<PathBuf>> {
        std::fs::create_dir_all(dir)?;

        let mut by_file: BTreeMap<&'static str, Vec<&AuditRecord>> = BTreeMap::new();
        for record in &self.records {
            by_file
                .entry(record.category.file_name())
                .or_default()
                .push(record);
        }

        let mut written = Vec::with_capacity(by_file.len());
        for (file_name, records) in by_file {
            let path = dir.join(file_name);
            let mut file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)?;
            for record in records {
                writeln!(file, "{}", record)?;
            }
            written.push(path);
        }

        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_count() {
        let mut log = AuditLog::new();
        log.record(AuditCategory::LetterFix, "HD 1", "b -> c");
        log.record(AuditCategory::LetterFix, "HD 2", "BD forced");
        log.record(AuditCategory::AliasAsHost, "HD 3", "HIP 3 -> HD 3");

        assert_eq!(log.len(), 3);
        assert_eq!(log.count(AuditCategory::LetterFix), 2);
        assert_eq!(log.count(AuditCategory::DuplicateEntry), 0);
    }

    #[test]
    fn test_extend_preserves_order() {
        let mut first = AuditLog::new();
        first.record(AuditCategory::BinaryMismatch, "a", "1");
        let mut second = AuditLog::new();
        second.record(AuditCategory::BinaryMismatch, "b", "2");

        first.extend(second);
        let keys: Vec<&str> = first.records().iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn test_write_to_dir_one_file_per_category() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = AuditLog::new();
        log.record(AuditCategory::UnusedReplacement, "HD 1", "host_to_host");
        log.record(AuditCategory::Replacement, "HD 2", "host_to_host");
        log.record(AuditCategory::CoordinateMismatch, "HD 3", "DEC");

        let written = log.write_to_dir(dir.path()).unwrap();
        assert_eq!(written.len(), 2);

        let content =
            std::fs::read_to_string(dir.path().join("replace_known_mistakes.txt")).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.starts_with("UNUSED | HD 1 | host_to_host"));
    }
}
