use tracing::debug;

/// Parse a decimal written either as `1234.5` or in Brazilian notation `1.234,5`.
pub fn parse_decimal(raw: Option<&str>) -> Option<f64> {
    let value = raw.map(str::trim).filter(|s| !s.is_empty())?;

    let canonical = if value.contains(',') {
        value.replace('.', "").replace(',', ".")
    } else {
        value.to_string()
    };

    match canonical.parse::<f64>() {
        Ok(n) if n.is_finite() => Some(n),
        _ => {
            debug!("Discarding non-numeric value '{}'", value);
            None
        }
    }
}

/// Parse a non-negative whole quantity. Spreadsheets often hand these over as
/// floats such as `3.0`, which are accepted.
pub fn parse_quantity(raw: Option<&str>) -> Option<u32> {
    let n = parse_decimal(raw)?;
    if n >= 0.0 && n.fract() == 0.0 && n <= f64::from(u32::MAX) {
        Some(n as u32)
    } else {
        debug!("Discarding invalid quantity {}", n);
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_decimal_notations() {
        assert_eq!(parse_decimal(Some("1234.5")), Some(1234.5));
        assert_eq!(parse_decimal(Some("1.234,50")), Some(1234.5));
        assert_eq!(parse_decimal(Some("0,75")), Some(0.75));
        assert_eq!(parse_decimal(Some(" 12 ")), Some(12.0));
        assert_eq!(parse_decimal(Some("R$ 10")), None);
        assert_eq!(parse_decimal(Some("")), None);
        assert_eq!(parse_decimal(None), None);
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity(Some("3")), Some(3));
        assert_eq!(parse_quantity(Some("3.0")), Some(3));
        assert_eq!(parse_quantity(Some("2,5")), None);
        assert_eq!(parse_quantity(Some("-1")), None);
    }
}
