// Binary Label Extractor
//
// Concept: Separate a binary-component label from a star designation
// Synchronization: Runs after name normalization, before identity resolution.
// Host strings come out free of trailing component letters so that the
// resolver queries the star, and the label is carried in Row::binary.
//
// Precedence:
// 1. Planet letter erroneously copied into host -> trimmed as noise
// 2. Circumbinary "AB" / "(AB)" in host or before the planet letter in name
// 3. Component letter before the planet letter in name ("HD 41004 B b")
// 4. Component letter at the end of host ("HD 41004 B")
// 5. Catalog flag columns (circumbinary flag always wins; ternary flag only
//    fills an empty label)

use crate::types::{BinaryLabel, Row};
use once_cell::sync::Lazy;
use regex::Regex;

static PLANET_IN_HOST: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s\d][b-z]$").unwrap());
static CIRCUMBINARY_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\s\d](AB|\(AB\))\s[b-z]$").unwrap());
static CIRCUMBINARY_HOST: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s\d](AB|\(AB\))$").unwrap());
static COMPONENT_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\s\d]([ABCNS])[\s\d][b-z]$").unwrap());
static COMPONENT_HOST: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s\d]([ABCNS])$").unwrap());

/// Binary label extractor (string patterns + catalog flags)
#[derive(Debug, Default, Clone, Copy)]
pub struct BinaryLabelExtractor;

impl BinaryLabelExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Split `host` into a clean designation and a binary label
    ///
    /// `name` is only inspected, never rewritten.
    pub fn extract(&self, name: &str, host: &str) -> (String, BinaryLabel) {
        let mut host = host.trim().to_string();
        let mut label = BinaryLabel::None;

        // Step 1: planet letter copied into host
        if PLANET_IN_HOST.is_match(&host) {
            tracing::debug!("Planet letter in host '{}', trimming", host);
            host.pop();
            host = host.trim_end().to_string();
        }

        // Step 2: circumbinary
        if CIRCUMBINARY_NAME.is_match(name) || CIRCUMBINARY_HOST.is_match(&host) {
            label = BinaryLabel::Circumbinary;
            if let Some(stripped) = host.strip_suffix("(AB)").or_else(|| host.strip_suffix("AB")) {
                host = stripped.trim_end().to_string();
            }
        }

        // Step 3: component letter in name
        if let Some(captures) = COMPONENT_NAME.captures(name) {
            label = BinaryLabel::Component(captures[1].to_string());
        }

        // Step 4: component letter at the end of host
        if let Some(captures) = COMPONENT_HOST.captures(&host) {
            label = BinaryLabel::Component(captures[1].to_string());
            host.pop();
            host = host.trim_end().to_string();
        }

        (host, label)
    }

    /// Apply extraction and flag columns to a row in place
    ///
    /// A label already present on the row (forced by a replacement rule)
    /// is kept; the host is cleaned either way.
    pub fn apply(&self, row: &mut Row) {
        let (host, label) = self.extract(&row.name, &row.host);
        row.host = host;

        if row.binary == BinaryLabel::None {
            row.binary = label;

            if row.circumbinary_flag == Some(1) {
                row.binary = BinaryLabel::Circumbinary;
            }
            if row.binary == BinaryLabel::None {
                row.binary = match row.binary_flag {
                    Some(1) => BinaryLabel::Circumbinary,
                    Some(2) => BinaryLabel::SType,
                    Some(3) => BinaryLabel::Rogue,
                    _ => BinaryLabel::None,
                };
            }
        }
    }
}
