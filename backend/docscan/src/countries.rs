//! ISO 3166-1 alpha-3 codes to display names, for nationality fields read
//! out of the machine readable zone.

use std::collections::HashMap;

use once_cell::sync::Lazy;

static CODES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("HRV", "Croatia"),
        ("CRO", "Croatia"),
        ("DEU", "Germany"),
        ("GER", "Germany"),
        ("AUT", "Austria"),
        ("ITA", "Italy"),
        ("SVN", "Slovenia"),
        ("SRB", "Serbia"),
        ("BIH", "Bosnia and Herzegovina"),
        ("HUN", "Hungary"),
        ("CZE", "Czech Republic"),
        ("POL", "Poland"),
        ("SVK", "Slovakia"),
        ("GBR", "United Kingdom"),
        ("FRA", "France"),
        ("NLD", "Netherlands"),
        ("BEL", "Belgium"),
        ("CHE", "Switzerland"),
        ("ESP", "Spain"),
        ("PRT", "Portugal"),
        ("ROU", "Romania"),
        ("BGR", "Bulgaria"),
        ("GRC", "Greece"),
        ("USA", "United States"),
        ("CAN", "Canada"),
        ("AUS", "Australia"),
        ("UKR", "Ukraine"),
        ("TUR", "Turkey"),
        ("MNE", "Montenegro"),
        ("MKD", "North Macedonia"),
        ("ALB", "Albania"),
        ("IRL", "Ireland"),
        ("DNK", "Denmark"),
        ("SWE", "Sweden"),
        ("NOR", "Norway"),
        ("FIN", "Finland"),
    ])
});

/// Display name for an alpha-3 code; unknown codes pass through unchanged so
/// downstream country resolution can still try them.
pub fn display_name(code: &str) -> String {
    CODES
        .get(code)
        .map(|name| name.to_string())
        .unwrap_or_else(|| code.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_resolve() {
        assert_eq!(display_name("HRV"), "Croatia");
        assert_eq!(display_name("DEU"), "Germany");
    }

    #[test]
    fn unknown_codes_pass_through() {
        assert_eq!(display_name("XYZ"), "XYZ");
    }
}
