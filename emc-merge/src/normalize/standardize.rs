// Row standardization
//
// Concept: Bring uniformly-shaped source rows into the form the resolver and
// merger expect: normalized designations, default hosts, planet letters,
// brown-dwarf sentinels, binary labels, sane measurements, canonical
// discovery methods.

use crate::types::{BinaryLabel, Parameter, Parameters, Row};
use once_cell::sync::Lazy;
use regex::Regex;

use super::binary_label::BinaryLabelExtractor;
use super::name_normalizer::NameNormalizer;

/// Sentinel letter for suspected brown dwarfs
pub const BROWN_DWARF_LETTER: &str = "BD";

static KOI_STYLE_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.0\d$").unwrap());
static PLANET_LETTER_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r" [b-z]$").unwrap());
static TRAILING_COMPONENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[aABCD]$").unwrap());
static TRAILING_PARENTHESIS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(([^()]*)\)$").unwrap());

/// Designation of the only known planets whose name ends in a digit
const PULSAR_EXCEPTION: &str = "PSR B1257+12";

/// Remove a planet suffix (" b", ".01") from a designation
pub fn strip_planet_suffix(name: &str) -> &str {
    if KOI_STYLE_SUFFIX.is_match(name) {
        name[..name.len() - 3].trim_end()
    } else if PLANET_LETTER_SUFFIX.is_match(name) {
        name[..name.len() - 1].trim_end()
    } else {
        name
    }
}

/// Planet letter from a planet name: ".0N" for KOI-style names, else the last character
pub fn letter_from_name(name: &str) -> String {
    if KOI_STYLE_SUFFIX.is_match(name) {
        name[name.len() - 3..].to_string()
    } else {
        name.chars().last().map(String::from).unwrap_or_default()
    }
}

/// Whether a letter is a raw ".0N" placeholder rather than a real planet letter
pub fn is_placeholder_letter(letter: &str) -> bool {
    letter.starts_with(".0")
}

/// Flag names that do not end in a planet letter as probable brown dwarfs
///
/// - bare trailing digit (not ".0N") -> letter "BD"
/// - trailing component letter (a, A-D) -> letter "BD", binary = that letter
/// - trailing parenthesized group -> letter "BD", binary = group contents
pub fn identify_brown_dwarf(row: &mut Row) {
    let name = row.name.as_str();
    if name.contains(PULSAR_EXCEPTION) {
        return;
    }

    if name.ends_with(|c: char| c.is_ascii_digit()) && !KOI_STYLE_SUFFIX.is_match(name) {
        row.letter = BROWN_DWARF_LETTER.to_string();
    }
    if TRAILING_COMPONENT.is_match(name) {
        let component = name[name.len() - 1..].to_string();
        row.letter = BROWN_DWARF_LETTER.to_string();
        row.binary = BinaryLabel::parse(&component);
    }
    if let Some(captures) = TRAILING_PARENTHESIS.captures(name) {
        let inner = captures[1].to_string();
        row.letter = BROWN_DWARF_LETTER.to_string();
        row.binary = BinaryLabel::parse(&inner);
    }
}

/// Measurement hygiene for one row
///
/// Uncertainties become absolute; zero or infinite uncertainties count as
/// missing; negative central values and eccentricities above 1 are removed
/// together with their uncertainties.
pub fn clean_measurements(params: &mut Parameters) {
    for parameter in Parameter::ALL {
        let m = params.get_mut(parameter);

        m.min = m.min.map(f64::abs).filter(|v| *v != 0.0 && v.is_finite());
        m.max = m.max.map(f64::abs).filter(|v| *v != 0.0 && v.is_finite());
        m.value = m.value.filter(|v| v.is_finite());

        let impossible = match m.value {
            Some(v) if v < 0.0 => true,
            Some(v) if parameter == Parameter::Eccentricity && v > 1.0 => true,
            _ => false,
        };
        if impossible {
            m.value = None;
            m.min = None;
            m.max = None;
        }
    }
}

/// Canonical discovery-method label
pub fn canonical_discovery_method(method: &str) -> String {
    let method = method.trim();
    let canonical = match method {
        "nan" => "",
        "Primary Transit#TTV" | "Transit Timing Variations" | "Eclipse Timing Variations" => "TTV",
        "Primary Transit" | "transit" => "Transit",
        "Pulsar" | "Pulsation Timing Variations" | "Timing" | "timing" => "Pulsar Timing",
        "disk kinematics" | "Kinematic" | "Disk Kinematics" | "Orbital Brightness Modulation" => {
            "Other"
        }
        "astrometry" => "Astrometry",
        "microlensing" => "Microlensing",
        "imaging" => "Imaging",
        "RV" => "Radial Velocity",
        other => other,
    };
    canonical.to_string()
}

/// Row standardizer: normalizer + binary extractor + letter assignment
pub struct RowStandardizer<'a> {
    normalizer: &'a NameNormalizer,
    extractor: BinaryLabelExtractor,
}

impl<'a> RowStandardizer<'a> {
    pub fn new(normalizer: &'a NameNormalizer) -> Self {
        Self {
            normalizer,
            extractor: BinaryLabelExtractor::new(),
        }
    }

    /// Standardize every row in place
    pub fn standardize(&self, rows: &mut [Row]) {
        let mut brown_dwarfs = 0usize;

        for row in rows.iter_mut() {
            self.standardize_row(row);
            if row.letter == BROWN_DWARF_LETTER {
                brown_dwarfs += 1;
            }
        }

        tracing::info!(
            "Standardized {} rows ({} probable brown dwarfs)",
            rows.len(),
            brown_dwarfs
        );
    }

    pub fn standardize_row(&self, row: &mut Row) {
        // Step 1: names
        row.name = self.normalizer.normalize(&row.name);
        let host = if row.host.trim().is_empty() {
            strip_planet_suffix(&row.name).to_string()
        } else {
            row.host.clone()
        };
        row.host = self.normalizer.normalize(&host);

        // Step 2: aliases without planet suffixes
        row.alias = row
            .alias
            .iter()
            .map(|a| self.normalizer.normalize(strip_planet_suffix(a.trim())))
            .filter(|a| !a.is_empty())
            .collect();

        // Step 3: binary label, then letter and brown-dwarf sentinel
        self.extractor.apply(row);
        row.letter = letter_from_name(&row.name);
        identify_brown_dwarf(row);

        // Step 4: measurements and bookkeeping
        clean_measurements(&mut row.params);
        row.discovery_method = canonical_discovery_method(&row.discovery_method);
    }
}
