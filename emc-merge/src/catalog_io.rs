//! Uniform-catalog input and merged-catalog output
//!
//! Thin adapters around the core: the per-source adapters upstream write one
//! CSV with the uniform column set; the merged catalog goes out as one CSV
//! with a fixed column set, one row per [`MergedEntry`].

use crate::error::{MergeError, MergeResult};
use crate::types::{BinaryLabel, Measurement, MergedEntry, Parameter, Row, SourceCatalog, Status};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::io::{Read, Write};
use std::path::Path;

/// Latest merged catalog
pub const CATALOG_FILE: &str = "exo-mercat.csv";
/// Entries split off as known brown dwarfs
pub const BROWN_DWARF_FILE: &str = "exo-mercat_brown_dwarfs.csv";

/// Identity and bookkeeping columns every uniform catalog must carry
const REQUIRED_COLUMNS: [&str; 10] = [
    "name",
    "host",
    "alias",
    "ra",
    "dec",
    "catalog",
    "catalog_name",
    "status",
    "discovery_method",
    "discovery_year",
];

/// Dated copy of the catalog, e.g. `exo-mercat2026-10-19.csv`
pub fn dated_file_name(date: NaiveDate) -> String {
    format!("exo-mercat{}.csv", date.format("%Y-%m-%d"))
}

fn parameter_columns(parameter: Parameter) -> [String; 4] {
    let c = parameter.column();
    [
        c.to_string(),
        format!("{}_min", c),
        format!("{}_max", c),
        format!("{}_url", c),
    ]
}

// ============================================================================
// Input
// ============================================================================

/// Read uniform-catalog rows from a CSV file
pub fn read_rows(path: &Path) -> MergeResult<Vec<Row>> {
    tracing::info!("Loading uniform catalog from {}", path.display());
    let file = std::fs::File::open(path)?;
    let rows = read_rows_from(file)?;
    tracing::info!("Loaded {} rows", rows.len());
    Ok(rows)
}

/// Read uniform-catalog rows from any reader
///
/// A missing required column or an unparseable catalog / status field is a
/// `Schema` error. Empty or "nan" numeric cells are missing values.
pub fn read_rows_from<R: Read>(reader: R) -> MergeResult<Vec<Row>> {
    let mut reader = csv::Reader::from_reader(reader);
    let headers = reader.headers()?.clone();
    let index: HashMap<&str, usize> = headers.iter().enumerate().map(|(i, h)| (h.trim(), i)).collect();

    let mut required: Vec<String> = REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect();
    for parameter in Parameter::ALL {
        required.extend(parameter_columns(parameter));
    }
    let missing: Vec<&str> = required
        .iter()
        .map(String::as_str)
        .filter(|c| !index.contains_key(c))
        .collect();
    if !missing.is_empty() {
        return Err(MergeError::Schema(format!(
            "missing required columns: {}",
            missing.join(", ")
        )));
    }

    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record?;
        let field = |column: &str| cell(&record, &index, column);
        let schema_error = |what: String| MergeError::Schema(format!("row {}: {}", line + 1, what));

        let catalog: SourceCatalog = field("catalog").parse().map_err(schema_error)?;
        let status: Status = field("status").parse().map_err(schema_error)?;

        let mut row = Row::new(catalog, field("name"), field("host"));
        row.catalog_name = field("catalog_name").to_string();
        row.status = status;
        row.alias = field("alias")
            .split(',')
            .map(str::trim)
            .filter(|a| !a.is_empty() && *a != "nan")
            .map(String::from)
            .collect();
        row.ra = parse_float(field("ra"));
        row.dec = parse_float(field("dec"));
        row.discovery_method = field("discovery_method").to_string();
        row.discovery_year = parse_float(field("discovery_year")).map(|y| y as i32);
        row.binary = BinaryLabel::parse(field("binary"));
        row.circumbinary_flag = parse_float(field("cb_flag")).map(|f| f as u8);
        row.binary_flag = parse_float(field("binaryflag")).map(|f| f as u8);

        for parameter in Parameter::ALL {
            let [value, min, max, url] = parameter_columns(parameter);
            *row.params.get_mut(parameter) = Measurement {
                value: parse_float(field(&value)),
                min: parse_float(field(&min)),
                max: parse_float(field(&max)),
                url: field(&url).to_string(),
            };
        }

        rows.push(row);
    }
    Ok(rows)
}

/// Trimmed cell of `column`; empty when the column is absent
fn cell<'r>(record: &'r csv::StringRecord, index: &HashMap<&str, usize>, column: &str) -> &'r str {
    index
        .get(column)
        .and_then(|&i| record.get(i))
        .map(str::trim)
        .unwrap_or("")
}

fn parse_float(s: &str) -> Option<f64> {
    match s {
        "" => None,
        s if s.eq_ignore_ascii_case("nan") => None,
        s => s.parse::<f64>().ok().filter(|v| !v.is_nan()),
    }
}

// ============================================================================
// Output
// ============================================================================

fn header() -> Vec<String> {
    let mut columns: Vec<String> = [
        "exo_mercat_name",
        "main_id",
        "host",
        "binary",
        "letter",
        "ra",
        "dec",
        "main_id_provenance",
    ]
    .iter()
    .map(|c| c.to_string())
    .collect();

    for parameter in Parameter::ALL {
        columns.extend(parameter_columns(parameter));
    }

    columns.extend(
        [
            "bestmass",
            "bestmass_min",
            "bestmass_max",
            "bestmass_url",
            "bestmass_provenance",
            "status",
            "discovery_method",
            "discovery_year",
            "alias",
            "catalog",
        ]
        .iter()
        .map(|c| c.to_string()),
    );
    columns.extend(SourceCatalog::ALL.iter().map(|c| format!("{}_name", c)));
    columns.extend(
        [
            "coordinate_mismatch",
            "coordinate_mismatch_flag",
            "potential_binary_mismatch",
            "angular_separation",
            "angular_separation_flag",
            "merging_mismatch_flag",
            "duplicate_flag",
            "duplicate_names",
            "emc_duplicate_flag",
        ]
        .iter()
        .map(|c| c.to_string()),
    );
    columns
}

fn float(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn measurement_fields(m: &Measurement) -> [String; 4] {
    [float(m.value), float(m.min), float(m.max), m.url.clone()]
}

fn record(entry: &MergedEntry) -> Vec<String> {
    let mut fields = vec![
        entry.display_name.clone(),
        entry.main_id.clone(),
        entry.host.clone(),
        entry.binary.as_str().to_string(),
        entry.letter.clone(),
        float(entry.ra),
        float(entry.dec),
        entry.main_id_provenance.as_str().to_string(),
    ];

    for parameter in Parameter::ALL {
        fields.extend(measurement_fields(entry.params.get(parameter)));
    }

    fields.extend(measurement_fields(&entry.best_mass));
    fields.push(
        entry
            .best_mass_provenance
            .map(|p| p.as_str().to_string())
            .unwrap_or_default(),
    );
    fields.push(entry.status.as_str().to_string());
    fields.push(entry.discovery_method.clone());
    fields.push(entry.discovery_year.map(|y| y.to_string()).unwrap_or_default());
    fields.push(entry.aliases.iter().cloned().collect::<Vec<_>>().join(","));
    fields.push(
        entry
            .catalogs
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(","),
    );
    for catalog in SourceCatalog::ALL {
        fields.push(entry.catalog_names.get(&catalog).cloned().unwrap_or_default());
    }

    fields.push(entry.coordinate_mismatch.as_str().to_string());
    fields.push(entry.coordinate_mismatch.flag().to_string());
    fields.push(entry.potential_binary_mismatch.flag().to_string());
    fields.push(entry.angular_separation.to_string());
    fields.push(entry.angular_separation_flag.to_string());
    fields.push(entry.merging_mismatch.flag().to_string());
    fields.push((entry.duplicate_flag as u8).to_string());
    fields.push(entry.duplicate_names.join(", "));
    fields.push((entry.emc_duplicate_flag as u8).to_string());
    fields
}

/// Write the merged catalog to a CSV file
pub fn write_catalog(path: &Path, entries: &[MergedEntry]) -> MergeResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)?;
    write_catalog_to(file, entries)?;
    tracing::info!("Wrote {} entries to {}", entries.len(), path.display());
    Ok(())
}

/// Write the merged catalog to any writer, sorted by display name
pub fn write_catalog_to<W: Write>(writer: W, entries: &[MergedEntry]) -> MergeResult<()> {
    let mut sorted: Vec<&MergedEntry> = entries.iter().collect();
    sorted.sort_by(|a, b| a.display_name.cmp(&b.display_name));

    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(header())?;
    for entry in sorted {
        writer.write_record(record(entry))?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::AuditLog;
    use crate::merge::GroupMerger;

    fn uniform_header() -> String {
        let mut columns: Vec<String> = REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect();
        for parameter in Parameter::ALL {
            columns.extend(parameter_columns(parameter));
        }
        columns.push("binaryflag".to_string());
        columns.join(",")
    }

    fn uniform_line(name: &str, host: &str, catalog: &str, p: &str) -> String {
        // name,host,alias,ra,dec,catalog,catalog_name,status,discovery_method,discovery_year
        let mut fields = vec![
            name.to_string(),
            host.to_string(),
            "\"HIP 1,TYC 1\"".to_string(),
            "10.5".to_string(),
            "nan".to_string(),
            catalog.to_string(),
            name.to_string(),
            "CONFIRMED".to_string(),
            "Radial Velocity".to_string(),
            "2010.0".to_string(),
        ];
        for parameter in Parameter::ALL {
            if parameter == Parameter::Period {
                fields.extend([p.to_string(), "0.1".into(), "-0.2".into(), "url".into()]);
            } else {
                fields.extend(["".into(), "".into(), "".into(), "".into()]);
            }
        }
        fields.push("2".to_string());
        fields.join(",")
    }

    #[test]
    fn test_read_rows() {
        let csv = format!(
            "{}\n{}\n",
            uniform_header(),
            uniform_line("HD 1 b", "HD 1", "eu", "3.5")
        );
        let rows = read_rows_from(csv.as_bytes()).unwrap();

        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.catalog, SourceCatalog::Eu);
        assert_eq!(row.alias.len(), 2);
        assert_eq!(row.ra, Some(10.5));
        assert_eq!(row.dec, None);
        assert_eq!(row.discovery_year, Some(2010));
        assert_eq!(row.binary_flag, Some(2));
        assert_eq!(row.circumbinary_flag, None);
        assert_eq!(row.params.p.value, Some(3.5));
        assert_eq!(row.params.p.max, Some(-0.2));
        assert!(row.params.mass.is_empty());
    }

    #[test]
    fn test_missing_column_is_schema_error() {
        let csv = "name,host\nHD 1 b,HD 1\n";
        let err = read_rows_from(csv.as_bytes()).unwrap_err();
        match err {
            MergeError::Schema(msg) => {
                assert!(msg.contains("catalog"));
                assert!(msg.contains("msini_url"));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_unknown_catalog_is_schema_error() {
        let csv = format!(
            "{}\n{}\n",
            uniform_header(),
            uniform_line("HD 1 b", "HD 1", "simbad", "3.5")
        );
        assert!(matches!(
            read_rows_from(csv.as_bytes()),
            Err(MergeError::Schema(_))
        ));
    }

    #[test]
    fn test_write_catalog_sorted_with_fixed_columns() {
        let mut a = Row::new(SourceCatalog::Nasa, "WASP-2 b", "WASP-2");
        a.letter = "b".to_string();
        let mut b = Row::new(SourceCatalog::Eu, "HD 1 b", "HD 1");
        b.letter = "b".to_string();
        let mut audit = AuditLog::new();
        let entries = GroupMerger::default().merge(&[a, b], &mut audit).unwrap();
        let reversed: Vec<MergedEntry> = entries.into_iter().rev().collect();

        let mut out = Vec::new();
        write_catalog_to(&mut out, &reversed).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("exo_mercat_name,main_id,host,binary,letter"));
        assert!(lines[0].contains("nasa_name"));
        assert!(lines[1].starts_with("HD 1 b,HD 1,HD 1"));
        assert!(lines[2].starts_with("WASP-2 b"));
        let columns = header().len();
        assert!(lines.iter().all(|l| l.split(',').count() == columns));
    }

    #[test]
    fn test_dated_file_name() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(dated_file_name(date), "exo-mercat2024-03-07.csv");
    }
}
