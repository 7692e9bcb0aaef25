//! Sky-coordinate helpers

/// Great-circle separation between two positions, all in degrees
///
/// Haversine form; stable for the sub-arcsecond separations the cone search
/// ranks by.
pub fn angular_separation(ra1: f64, dec1: f64, ra2: f64, dec2: f64) -> f64 {
    let (ra1, dec1, ra2, dec2) = (
        ra1.to_radians(),
        dec1.to_radians(),
        ra2.to_radians(),
        dec2.to_radians(),
    );
    let half_ddec = ((dec2 - dec1) / 2.0).sin();
    let half_dra = ((ra2 - ra1) / 2.0).sin();
    let h = half_ddec * half_ddec + dec1.cos() * dec2.cos() * half_dra * half_dra;
    (2.0 * h.sqrt().min(1.0).asin()).to_degrees()
}

/// Parse a right ascension given either in decimal degrees or as "hh mm ss.s"
pub fn parse_ra(value: &str) -> Option<f64> {
    parse_coordinate(value, 15.0)
}

/// Parse a declination given either in decimal degrees or as "+dd mm ss.s"
pub fn parse_dec(value: &str) -> Option<f64> {
    parse_coordinate(value, 1.0)
}

fn parse_coordinate(value: &str, scale: f64) -> Option<f64> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    let fields: Vec<&str> = value
        .split(|c: char| c.is_whitespace() || c == ':')
        .filter(|f| !f.is_empty())
        .collect();

    if fields.len() == 1 {
        return fields[0].parse::<f64>().ok().filter(|v| v.is_finite());
    }
    if fields.len() > 3 {
        return None;
    }

    let negative = fields[0].starts_with('-');
    let mut total = 0.0;
    let mut unit = 1.0;
    for field in &fields {
        let part: f64 = field.trim_start_matches(['+', '-']).parse().ok()?;
        total += part / unit;
        unit *= 60.0;
    }

    let degrees = total * scale;
    Some(if negative { -degrees } else { degrees })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_separation_zero_and_known() {
        assert_eq!(angular_separation(10.0, 20.0, 10.0, 20.0), 0.0);
        let sep = angular_separation(0.0, 0.0, 0.0, 1.0);
        assert!((sep - 1.0).abs() < 1e-12);
        let sep = angular_separation(0.0, 0.0, 1.0, 0.0);
        assert!((sep - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_separation_shrinks_with_declination() {
        let equator = angular_separation(0.0, 0.0, 1.0, 0.0);
        let high = angular_separation(0.0, 60.0, 1.0, 60.0);
        assert!(high < equator);
        assert!((high - 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_parse_sexagesimal() {
        let ra = parse_ra("20 00 43.7").unwrap();
        assert!((ra - 300.182083).abs() < 1e-5);
        let dec = parse_dec("-08 59 06").unwrap();
        assert!((dec + 8.985).abs() < 1e-9);
        let dec = parse_dec("+22:57:00").unwrap();
        assert!((dec - 22.95).abs() < 1e-9);
        // Negative zero degrees keeps its sign
        let dec = parse_dec("-00 30 00").unwrap();
        assert!((dec + 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_parse_decimal_and_garbage() {
        assert_eq!(parse_ra("300.1820"), Some(300.182));
        assert_eq!(parse_dec(""), None);
        assert_eq!(parse_dec("north"), None);
        assert_eq!(parse_dec("1 2 3 4"), None);
    }
}
