// Shared Types and Data Contracts
//
// Row and MergedEntry are the explicit contracts between pipeline stages.
// Every column the merge engine reads or writes is a named, typed field here;
// stages mutate these fields in place or produce a new Vec for the next stage.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Enumerated labels
// ============================================================================

/// Source catalog a row was read from
///
/// Declared in alphabetical order so the derived `Ord` sorts catalog lists
/// the same way their names sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SourceCatalog {
    Epic,
    Eu,
    Koi,
    Nasa,
    Oec,
    Toi,
}

impl SourceCatalog {
    pub const ALL: [SourceCatalog; 6] = [
        Self::Epic,
        Self::Eu,
        Self::Koi,
        Self::Nasa,
        Self::Oec,
        Self::Toi,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Epic => "epic",
            Self::Eu => "eu",
            Self::Koi => "koi",
            Self::Nasa => "nasa",
            Self::Oec => "oec",
            Self::Toi => "toi",
        }
    }

    /// Preference when contributing rows disagree on where coordinates came from
    pub fn coordinate_preference(self) -> u8 {
        match self {
            Self::Toi => 0,
            Self::Nasa => 1,
            Self::Epic => 2,
            Self::Eu => 3,
            Self::Oec => 4,
            Self::Koi => 5,
        }
    }
}

impl fmt::Display for SourceCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceCatalog {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "epic" => Ok(Self::Epic),
            "eu" => Ok(Self::Eu),
            "koi" => Ok(Self::Koi),
            "nasa" => Ok(Self::Nasa),
            "oec" => Ok(Self::Oec),
            "toi" => Ok(Self::Toi),
            other => Err(format!("unknown source catalog '{}'", other)),
        }
    }
}

/// Planet status as reported by a catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Status {
    Confirmed,
    Candidate,
    FalsePositive,
    Controversial,
    Unknown,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Confirmed => "CONFIRMED",
            Self::Candidate => "CANDIDATE",
            Self::FalsePositive => "FALSE POSITIVE",
            Self::Controversial => "CONTROVERSIAL",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CONFIRMED" => Ok(Self::Confirmed),
            "CANDIDATE" => Ok(Self::Candidate),
            "FALSE POSITIVE" => Ok(Self::FalsePositive),
            "CONTROVERSIAL" => Ok(Self::Controversial),
            "UNKNOWN" | "" => Ok(Self::Unknown),
            other => Err(format!("unknown status '{}'", other)),
        }
    }
}

/// Binary-star component label
///
/// `None` and `SType` are the "weak" labels: both say nothing about which
/// component the planet orbits and yield to any explicit label.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum BinaryLabel {
    #[default]
    None,
    /// "AB": circumbinary
    Circumbinary,
    /// "S-type": orbits one component, which one is unknown
    SType,
    /// "Rogue": free-floating
    Rogue,
    /// A single component ("A", "B", "C", ...)
    Component(String),
}

impl BinaryLabel {
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "" => Self::None,
            "AB" => Self::Circumbinary,
            "S-type" => Self::SType,
            "Rogue" => Self::Rogue,
            other => Self::Component(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::None => "",
            Self::Circumbinary => "AB",
            Self::SType => "S-type",
            Self::Rogue => "Rogue",
            Self::Component(c) => c,
        }
    }

    pub fn is_weak(&self) -> bool {
        matches!(self, Self::None | Self::SType)
    }

    /// Suffix appended to a designation when querying the name resolver
    pub fn query_suffix(&self) -> Option<&str> {
        match self {
            Self::None | Self::SType | Self::Rogue => None,
            Self::Circumbinary => Some("AB"),
            Self::Component(c) => Some(c),
        }
    }
}

impl fmt::Display for BinaryLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Disagreement of a row's source coordinates with its host group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CoordinateMismatch {
    #[default]
    None,
    Ra,
    Dec,
    RaDec,
}

impl CoordinateMismatch {
    pub fn from_axes(ra: bool, dec: bool) -> Self {
        match (ra, dec) {
            (false, false) => Self::None,
            (true, false) => Self::Ra,
            (false, true) => Self::Dec,
            (true, true) => Self::RaDec,
        }
    }

    pub fn ra(self) -> bool {
        matches!(self, Self::Ra | Self::RaDec)
    }

    pub fn dec(self) -> bool {
        matches!(self, Self::Dec | Self::RaDec)
    }

    pub fn combine(self, other: Self) -> Self {
        Self::from_axes(self.ra() || other.ra(), self.dec() || other.dec())
    }

    /// 0 = none, 1 = one axis, 2 = both axes
    pub fn flag(self) -> u8 {
        self.ra() as u8 + self.dec() as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Ra => "RA",
            Self::Dec => "DEC",
            Self::RaDec => "RADEC",
        }
    }

    pub fn parse(s: &str) -> Self {
        let s = s.trim().to_ascii_uppercase();
        Self::from_axes(s.contains("RA"), s.contains("DEC"))
    }
}

/// Outcome of binary-label reconciliation for a row
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum BinaryMismatch {
    #[default]
    None = 0,
    /// Label fixed automatically, but the coordinates look suspicious
    AutoFixed = 1,
    /// Several explicit labels remain; needs a human
    Unresolved = 2,
}

impl BinaryMismatch {
    pub fn flag(self) -> u8 {
        self as u8
    }
}

/// How a merged entry's period/sma group was formed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MergingMismatch {
    /// All rows agreed on one period (or sma) bin
    #[default]
    Agreement = 0,
    /// Rows disagreed; this entry is one of several split off the group
    Split = 1,
    /// Neither period nor sma available; merged as a last resort
    Fallback = 2,
}

impl MergingMismatch {
    pub fn flag(self) -> u8 {
        self as u8
    }
}

/// Which resolver tier produced a row's canonical identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResolutionTier {
    HostBinary,
    AliasBinary,
    HostBinaryCompact,
    AliasBinaryCompact,
    Host,
    Alias,
    Cone,
}

impl ResolutionTier {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::HostBinary => "hostbinary",
            Self::AliasBinary => "aliasbinary",
            Self::HostBinaryCompact => "hostbinary2",
            Self::AliasBinaryCompact => "aliasbinary2",
            Self::Host => "host",
            Self::Alias => "alias",
            Self::Cone => "coordinates",
        }
    }
}

/// Origin of a canonical identifier and its coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MainIdProvenance {
    /// Name lookup against the external resolver
    Simbad,
    /// Cone search against the external resolver
    SimbadCoord,
    /// Unresolved: identity and coordinates taken from the source catalog
    Catalog(SourceCatalog),
}

impl MainIdProvenance {
    pub fn from_tier(tier: ResolutionTier) -> Self {
        match tier {
            ResolutionTier::Cone => Self::SimbadCoord,
            _ => Self::Simbad,
        }
    }

    /// Lower is preferred when contributing rows disagree
    pub fn preference(self) -> u8 {
        match self {
            Self::Simbad => 0,
            Self::SimbadCoord => 1,
            Self::Catalog(c) => 2 + c.coordinate_preference(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Simbad => "SIMBAD",
            Self::SimbadCoord => "SIMBADCOORD",
            Self::Catalog(c) => c.as_str(),
        }
    }
}

/// Which column the best mass came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MassProvenance {
    Mass,
    Msini,
}

impl MassProvenance {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mass => "Mass",
            Self::Msini => "Msini",
        }
    }
}

// ============================================================================
// Physical parameters
// ============================================================================

/// The seven merged physical parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Parameter {
    Period,
    SemiMajorAxis,
    Eccentricity,
    Inclination,
    Radius,
    Mass,
    Msini,
}

impl Parameter {
    pub const ALL: [Parameter; 7] = [
        Self::Period,
        Self::SemiMajorAxis,
        Self::Eccentricity,
        Self::Inclination,
        Self::Radius,
        Self::Mass,
        Self::Msini,
    ];

    /// Column prefix in the tabular formats
    pub fn column(self) -> &'static str {
        match self {
            Self::Period => "p",
            Self::SemiMajorAxis => "a",
            Self::Eccentricity => "e",
            Self::Inclination => "i",
            Self::Radius => "r",
            Self::Mass => "mass",
            Self::Msini => "msini",
        }
    }
}

/// Central value, absolute asymmetric uncertainties, and provenance
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Measurement {
    pub value: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub url: String,
}

impl Measurement {
    pub fn new(value: f64, min: f64, max: f64, url: &str) -> Self {
        Self {
            value: Some(value),
            min: Some(min),
            max: Some(max),
            url: url.to_string(),
        }
    }

    /// Relative uncertainty used to rank measurements
    ///
    /// `max(|max/value|, |min/value|)`; a component whose ratio is not finite
    /// (value at or near zero) contributes its raw uncertainty instead.
    /// `None` when the value or either finite uncertainty is missing.
    pub fn relative_uncertainty(&self) -> Option<f64> {
        let value = self.value?;
        let min = self.min.filter(|m| m.is_finite())?;
        let max = self.max.filter(|m| m.is_finite())?;

        let component = |err: f64| {
            let ratio = (err / value).abs();
            if ratio.is_finite() {
                ratio
            } else {
                err.abs()
            }
        };

        Some(component(max).max(component(min)))
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_none()
    }
}

/// One measurement per physical parameter
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Parameters {
    pub p: Measurement,
    pub a: Measurement,
    pub e: Measurement,
    pub i: Measurement,
    pub r: Measurement,
    pub mass: Measurement,
    pub msini: Measurement,
}

impl Parameters {
    pub fn get(&self, parameter: Parameter) -> &Measurement {
        match parameter {
            Parameter::Period => &self.p,
            Parameter::SemiMajorAxis => &self.a,
            Parameter::Eccentricity => &self.e,
            Parameter::Inclination => &self.i,
            Parameter::Radius => &self.r,
            Parameter::Mass => &self.mass,
            Parameter::Msini => &self.msini,
        }
    }

    pub fn get_mut(&mut self, parameter: Parameter) -> &mut Measurement {
        match parameter {
            Parameter::Period => &mut self.p,
            Parameter::SemiMajorAxis => &mut self.a,
            Parameter::Eccentricity => &mut self.e,
            Parameter::Inclination => &mut self.i,
            Parameter::Radius => &mut self.r,
            Parameter::Mass => &mut self.mass,
            Parameter::Msini => &mut self.msini,
        }
    }
}

// ============================================================================
// Row: one planet detection in one source catalog
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    // Identity
    pub name: String,
    pub host: String,
    pub binary: BinaryLabel,
    /// "b".."z", a ".0N" placeholder for unresolved candidates, or "BD"
    pub letter: String,
    pub alias: BTreeSet<String>,
    /// Source-catalog coordinates (degrees)
    pub ra: Option<f64>,
    pub dec: Option<f64>,

    pub params: Parameters,

    // Bookkeeping
    pub catalog: SourceCatalog,
    pub catalog_name: String,
    pub status: Status,
    pub discovery_method: String,
    pub discovery_year: Option<i32>,
    /// NASA circumbinary flag column
    pub circumbinary_flag: Option<u8>,
    /// OEC binary flag column (1 = AB, 2 = S-type, 3 = Rogue)
    pub binary_flag: Option<u8>,

    // Resolution (IdentityResolver)
    pub main_id: String,
    pub ra_simbad: Option<f64>,
    pub dec_simbad: Option<f64>,
    pub list_id: BTreeSet<String>,
    pub angular_separation: f64,
    pub resolution_tier: Option<ResolutionTier>,

    // Annotation (ConflictDetector / GroupMerger)
    pub coordinate_mismatch: CoordinateMismatch,
    pub potential_binary_mismatch: BinaryMismatch,
    pub duplicate_flag: bool,
    pub emc_duplicate_flag: bool,
}

impl Row {
    pub fn new(catalog: SourceCatalog, name: &str, host: &str) -> Self {
        Self {
            name: name.to_string(),
            host: host.to_string(),
            binary: BinaryLabel::None,
            letter: String::new(),
            alias: BTreeSet::new(),
            ra: None,
            dec: None,
            params: Parameters::default(),
            catalog,
            catalog_name: name.to_string(),
            status: Status::Unknown,
            discovery_method: String::new(),
            discovery_year: None,
            circumbinary_flag: None,
            binary_flag: None,
            main_id: String::new(),
            ra_simbad: None,
            dec_simbad: None,
            list_id: BTreeSet::new(),
            angular_separation: 0.0,
            resolution_tier: None,
            coordinate_mismatch: CoordinateMismatch::None,
            potential_binary_mismatch: BinaryMismatch::None,
            duplicate_flag: false,
            emc_duplicate_flag: false,
        }
    }

    pub fn is_resolved(&self) -> bool {
        !self.main_id.is_empty()
    }

    /// Grouping identity: canonical identifier, or host when unresolved
    pub fn identity_key(&self) -> &str {
        if self.main_id.is_empty() {
            &self.host
        } else {
            &self.main_id
        }
    }

    pub fn provenance(&self) -> MainIdProvenance {
        match self.resolution_tier {
            Some(tier) => MainIdProvenance::from_tier(tier),
            None => MainIdProvenance::Catalog(self.catalog),
        }
    }

    /// Canonical coordinates when resolved, source coordinates otherwise
    pub fn best_coordinates(&self) -> (Option<f64>, Option<f64>) {
        match (self.ra_simbad, self.dec_simbad) {
            (Some(ra), Some(dec)) => (Some(ra), Some(dec)),
            _ => (self.ra, self.dec),
        }
    }
}

// ============================================================================
// MergedEntry: one physical planet in the output catalog
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct MergedEntry {
    pub display_name: String,
    pub main_id: String,
    pub host: String,
    pub binary: BinaryLabel,
    pub letter: String,
    pub ra: Option<f64>,
    pub dec: Option<f64>,
    pub main_id_provenance: MainIdProvenance,

    /// Best measurement per parameter
    pub params: Parameters,
    pub best_mass: Measurement,
    pub best_mass_provenance: Option<MassProvenance>,

    pub status: Status,
    pub discovery_method: String,
    pub discovery_year: Option<i32>,
    pub aliases: BTreeSet<String>,
    pub catalogs: BTreeSet<SourceCatalog>,
    pub catalog_names: BTreeMap<SourceCatalog, String>,

    // Flags
    pub coordinate_mismatch: CoordinateMismatch,
    pub potential_binary_mismatch: BinaryMismatch,
    pub angular_separation: f64,
    /// Number of distinct angular separations among contributors, minus one
    pub angular_separation_flag: usize,
    pub merging_mismatch: MergingMismatch,
    pub duplicate_flag: bool,
    pub duplicate_names: Vec<String>,
    pub emc_duplicate_flag: bool,

    /// Working period / sma bins the entry was grouped under (-1 = none)
    pub period_bin: i32,
    pub sma_bin: i32,
}

impl MergedEntry {
    /// Mass used for brown-dwarf screening: true mass, else minimum mass
    pub fn screening_mass(&self) -> Option<f64> {
        self.params.mass.value.or(self.params.msini.value)
    }
}
