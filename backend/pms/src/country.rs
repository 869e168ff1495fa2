//! Mapping of scanned nationality strings to PMS country ids.
//!
//! OCR output names a country in whatever language and form the document
//! uses (ISO-3 codes in the MRZ, native spellings in the visual zone). The
//! alias table folds the common variants onto the canonical English names
//! the PMS country list uses.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use tracing::warn;

use crate::client::CatalogEntry;

static ALIASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("HRV", "Croatia"),
        ("CRO", "Croatia"),
        ("HR", "Croatia"),
        ("HRVATSKA", "Croatia"),
        ("REPUBLIC OF CROATIA", "Croatia"),
        ("DEU", "Germany"),
        ("GER", "Germany"),
        ("DE", "Germany"),
        ("DEUTSCHLAND", "Germany"),
        ("NJEMAČKA", "Germany"),
        ("AUT", "Austria"),
        ("AT", "Austria"),
        ("ÖSTERREICH", "Austria"),
        ("AUSTRIJA", "Austria"),
        ("ITA", "Italy"),
        ("IT", "Italy"),
        ("ITALIA", "Italy"),
        ("ITALIJA", "Italy"),
        ("SVN", "Slovenia"),
        ("SLO", "Slovenia"),
        ("SI", "Slovenia"),
        ("SLOVENIJA", "Slovenia"),
        ("SRB", "Serbia"),
        ("RS", "Serbia"),
        ("SRBIJA", "Serbia"),
        ("BIH", "Bosnia and Herzegovina"),
        ("BA", "Bosnia and Herzegovina"),
        ("BOSNA I HERCEGOVINA", "Bosnia and Herzegovina"),
        ("HUN", "Hungary"),
        ("HU", "Hungary"),
        ("MAGYARORSZÁG", "Hungary"),
        ("MAĐARSKA", "Hungary"),
        ("CZE", "Czech Republic"),
        ("CZ", "Czech Republic"),
        ("CZECHIA", "Czech Republic"),
        ("ČEŠKA", "Czech Republic"),
        ("POL", "Poland"),
        ("PL", "Poland"),
        ("POLSKA", "Poland"),
        ("POLJSKA", "Poland"),
        ("SVK", "Slovakia"),
        ("SK", "Slovakia"),
        ("SLOVENSKO", "Slovakia"),
        ("SLOVAČKA", "Slovakia"),
        ("GBR", "United Kingdom"),
        ("UK", "United Kingdom"),
        ("GB", "United Kingdom"),
        ("GREAT BRITAIN", "United Kingdom"),
        ("ENGLAND", "United Kingdom"),
        ("FRA", "France"),
        ("FR", "France"),
        ("FRANCUSKA", "France"),
        ("NLD", "Netherlands"),
        ("NL", "Netherlands"),
        ("HOLLAND", "Netherlands"),
        ("NIZOZEMSKA", "Netherlands"),
        ("BEL", "Belgium"),
        ("BE", "Belgium"),
        ("BELGIQUE", "Belgium"),
        ("BELGIJA", "Belgium"),
        ("CHE", "Switzerland"),
        ("CH", "Switzerland"),
        ("SCHWEIZ", "Switzerland"),
        ("ŠVICARSKA", "Switzerland"),
        ("ESP", "Spain"),
        ("ES", "Spain"),
        ("ESPAÑA", "Spain"),
        ("ŠPANJOLSKA", "Spain"),
        ("PRT", "Portugal"),
        ("PT", "Portugal"),
        ("ROU", "Romania"),
        ("RO", "Romania"),
        ("RUMUNJSKA", "Romania"),
        ("BGR", "Bulgaria"),
        ("BG", "Bulgaria"),
        ("BUGARSKA", "Bulgaria"),
        ("GRC", "Greece"),
        ("GR", "Greece"),
        ("GRČKA", "Greece"),
        ("USA", "United States"),
        ("US", "United States"),
        ("UNITED STATES OF AMERICA", "United States"),
        ("CAN", "Canada"),
        ("CA", "Canada"),
        ("KANADA", "Canada"),
        ("AUS", "Australia"),
        ("AU", "Australia"),
        ("AUSTRALIJA", "Australia"),
        ("RUS", "Russia"),
        ("RU", "Russia"),
        ("RUSSIAN FEDERATION", "Russia"),
        ("UKR", "Ukraine"),
        ("UA", "Ukraine"),
        ("UKRAJINA", "Ukraine"),
        ("TUR", "Turkey"),
        ("TR", "Turkey"),
        ("TÜRKIYE", "Turkey"),
        ("TURSKA", "Turkey"),
        ("MNE", "Montenegro"),
        ("ME", "Montenegro"),
        ("CRNA GORA", "Montenegro"),
        ("MKD", "North Macedonia"),
        ("MK", "North Macedonia"),
        ("MAKEDONIJA", "North Macedonia"),
        ("ALB", "Albania"),
        ("AL", "Albania"),
        ("ALBANIJA", "Albania"),
        ("XKX", "Kosovo"),
        ("XK", "Kosovo"),
        ("IRL", "Ireland"),
        ("IE", "Ireland"),
        ("IRSKA", "Ireland"),
        ("DNK", "Denmark"),
        ("DK", "Denmark"),
        ("DANMARK", "Denmark"),
        ("SWE", "Sweden"),
        ("SE", "Sweden"),
        ("SVERIGE", "Sweden"),
        ("NOR", "Norway"),
        ("NO", "Norway"),
        ("NORGE", "Norway"),
        ("FIN", "Finland"),
        ("FI", "Finland"),
        ("SUOMI", "Finland"),
    ])
});

/// Country lookup built from the PMS countries endpoint.
#[derive(Debug, Default)]
pub struct CountryMapper {
    by_name: HashMap<String, i64>,
}

impl CountryMapper {
    pub fn from_entries(entries: &[CatalogEntry]) -> Self {
        let mut by_name = HashMap::new();
        for entry in entries {
            let name = entry.name.trim();
            if !name.is_empty() {
                by_name.insert(name.to_uppercase(), entry.id);
            }
        }
        Self { by_name }
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Resolve a scanned country string to the PMS id: alias table first,
    /// then exact match, then substring containment either way.
    pub fn resolve(&self, input: &str) -> Option<i64> {
        let normalized = input.trim().to_uppercase();
        if normalized.is_empty() {
            return None;
        }

        if let Some(canonical) = ALIASES.get(normalized.as_str()) {
            if let Some(id) = self.by_name.get(&canonical.to_uppercase()) {
                return Some(*id);
            }
        }

        if let Some(id) = self.by_name.get(&normalized) {
            return Some(*id);
        }

        for (name, id) in &self.by_name {
            if name.contains(&normalized) || normalized.contains(name.as_str()) {
                return Some(*id);
            }
        }

        warn!(country = %input, "Country not found in PMS list");
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapper() -> CountryMapper {
        CountryMapper::from_entries(&[
            CatalogEntry { id: 1, name: "Croatia".into() },
            CatalogEntry { id: 2, name: "Germany".into() },
            CatalogEntry { id: 3, name: "Czech Republic".into() },
        ])
    }

    #[test]
    fn resolves_iso3_via_alias() {
        assert_eq!(mapper().resolve("HRV"), Some(1));
        assert_eq!(mapper().resolve("DEU"), Some(2));
    }

    #[test]
    fn resolves_native_spelling() {
        assert_eq!(mapper().resolve("Hrvatska"), Some(1));
        assert_eq!(mapper().resolve("deutschland"), Some(2));
    }

    #[test]
    fn resolves_exact_and_substring() {
        assert_eq!(mapper().resolve("Croatia"), Some(1));
        assert_eq!(mapper().resolve("Czech"), Some(3));
    }

    #[test]
    fn unknown_country_is_none() {
        assert_eq!(mapper().resolve("Atlantis"), None);
        assert_eq!(mapper().resolve(""), None);
    }
}
