//! Known-mistake replacement tables
//!
//! Catalog curators maintain a small TOML file of manual corrections for
//! designations the rule-based normalizer cannot fix. The table is loaded
//! here and handed to the merge engine as a plain value; the engine never
//! reads it from disk.
//!
//! ```toml
//! [drop]
//! name = ["Kepler-1b"]
//!
//! [name_to_name]
//! "WASP-0 b" = "WASP-1 b"
//!
//! [host_to_ra]
//! "HD 1" = 10.5
//! ```

use crate::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Columns a `[drop]` rule may inspect
pub const DROP_COLUMNS: [&str; 3] = ["name", "host", "alias"];

/// Manual replacement rules, applied before rule-based normalization
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReplacementPolicy {
    /// column -> substrings; rows whose column contains any of them are removed
    pub drop: BTreeMap<String, Vec<String>>,
    /// planet name -> corrected planet name
    pub name_to_name: BTreeMap<String, String>,
    /// planet name -> corrected host
    pub name_to_host: BTreeMap<String, String>,
    /// host -> corrected host
    pub host_to_host: BTreeMap<String, String>,
    /// host -> corrected right ascension (degrees)
    pub host_to_ra: BTreeMap<String, f64>,
    /// host -> corrected declination (degrees)
    pub host_to_dec: BTreeMap<String, f64>,
    /// planet name -> binary label
    pub name_to_binary: BTreeMap<String, String>,
}

impl ReplacementPolicy {
    /// Load a replacement table from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let policy: ReplacementPolicy = toml::from_str(content)?;

        if let Some(column) = policy
            .drop
            .keys()
            .find(|c| !DROP_COLUMNS.contains(&c.as_str()))
        {
            return Err(Error::Config(format!(
                "Unknown [drop] column '{}' (expected one of {:?})",
                column, DROP_COLUMNS
            )));
        }

        Ok(policy)
    }

    /// Total number of rules across all sections
    pub fn len(&self) -> usize {
        self.drop.values().map(Vec::len).sum::<usize>()
            + self.name_to_name.len()
            + self.name_to_host.len()
            + self.host_to_host.len()
            + self.host_to_ra.len()
            + self.host_to_dec.len()
            + self.name_to_binary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_all_sections() {
        let policy = ReplacementPolicy::from_toml_str(
            r#"
[drop]
name = ["Solar System"]
host = ["SDSS J1110+0116"]

[name_to_name]
"GJ 9066 c" = "GJ 1036 c"

[name_to_host]
"Kepler-47 b" = "Kepler-47"

[host_to_host]
"EPIC 201170410.02" = "EPIC 201170410"

[host_to_ra]
"HD 1" = 10.5

[host_to_dec]
"HD 1" = -5.25

[name_to_binary]
"Kepler-16 b" = "AB"
"#,
        )
        .unwrap();

        assert_eq!(policy.len(), 8);
        assert_eq!(policy.drop["name"], vec!["Solar System".to_string()]);
        assert_eq!(policy.host_to_dec["HD 1"], -5.25);
        assert_eq!(policy.name_to_binary["Kepler-16 b"], "AB");
    }

    #[test]
    fn test_empty_table() {
        let policy = ReplacementPolicy::from_toml_str("").unwrap();
        assert!(policy.is_empty());
    }

    #[test]
    fn test_unknown_drop_column_rejected() {
        let result = ReplacementPolicy::from_toml_str("[drop]\nstatus = [\"x\"]\n");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_malformed_toml_rejected() {
        let result = ReplacementPolicy::from_toml_str("[host_to_ra]\n\"HD 1\" = \"ten\"\n");
        assert!(matches!(result, Err(Error::Toml(_))));
    }
}
