//! Field extraction over recognized document text.
//!
//! Three strategies run in priority order: the machine readable zone is the
//! most reliable when the photo captured it, bilingual card labels cover
//! front-side photos, and a generic pass scrapes whatever looks usable out
//! of anything else. The first strategy producing a usable identity wins.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::info;

use innkeep_core::GuestProfile;

use crate::{labels, mrz};

/// Which strategy produced the profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    Mrz,
    LabeledFields,
    Generic,
}

/// Extraction result: the profile, how it was obtained, and the raw text it
/// came from.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub profile: GuestProfile,
    pub method: ExtractionMethod,
    pub raw_text: String,
}

impl ScanOutcome {
    /// Whether the scan produced enough to register a guest.
    pub fn is_valid(&self) -> bool {
        self.profile.has_identity()
    }
}

pub fn extract_guest(text: &str) -> ScanOutcome {
    let mut profile = mrz::parse(text);
    if profile.has_identity() {
        info!("Extracted identity from MRZ");
        // Residence is printed only in the visual zone.
        let (city, address) = labels::residence(text);
        if profile.city_of_residence.is_none() {
            profile.city_of_residence = city;
        }
        if profile.address.is_none() {
            profile.address = address;
        }
        return ScanOutcome {
            profile,
            method: ExtractionMethod::Mrz,
            raw_text: text.to_string(),
        };
    }

    let profile = labels::parse(text);
    if profile.has_identity() {
        info!("Extracted identity from card labels");
        return ScanOutcome {
            profile,
            method: ExtractionMethod::LabeledFields,
            raw_text: text.to_string(),
        };
    }

    ScanOutcome {
        profile: generic(text),
        method: ExtractionMethod::Generic,
        raw_text: text.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Generic fallback
// ---------------------------------------------------------------------------

static NINE_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{9})\b").unwrap());

static LOOSE_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{1,2})[.\s/](\d{1,2})[.\s/](\d{4})").unwrap());

static WORD_PAIR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([A-ZČĆŠĐŽ]{2,})\s+([A-ZČĆŠĐŽ]{2,})\b").unwrap());

/// Words that look like names but are card boilerplate.
const SKIP_WORDS: [&str; 18] = [
    "REPUBLIKA", "HRVATSKA", "CROATIA", "OSOBNA", "ISKAZNICA", "IDENTITY", "CARD", "PREZIME",
    "SURNAME", "IME", "NAME", "DATUM", "DATE", "SPOL", "SEX", "BROJ", "NUMBER", "RESIDENCE",
];

fn generic(text: &str) -> GuestProfile {
    let mut profile = GuestProfile::default();
    let text_upper = text.to_uppercase();

    if let Some(caps) = NINE_DIGITS.captures(text) {
        profile.document_number = Some(caps[1].to_string());
    }

    if let Some(caps) = LOOSE_DATE.captures(text) {
        profile.birth_date = chrono::NaiveDate::from_ymd_opt(
            caps[3].parse().unwrap_or(0),
            caps[2].parse().unwrap_or(0),
            caps[1].parse().unwrap_or(0),
        );
    }

    for caps in WORD_PAIR.captures_iter(&text_upper) {
        let (first, second) = (&caps[1], &caps[2]);
        if SKIP_WORDS.contains(&first) || SKIP_WORDS.contains(&second) {
            continue;
        }
        let first = title_case(first);
        let second = title_case(second);
        profile.full_name = Some(format!("{first} {second}"));
        profile.first_name = Some(first);
        profile.last_name = Some(second);
        break;
    }

    profile
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use innkeep_core::DocumentKind;

    #[test]
    fn mrz_wins_over_labels() {
        let text = "PREZIME/SURNAME\nNETKO\nIME/NAME\nDRUGI\n\
            IOHRV112233445512345678901<<<<\n\
            7505154F3001011HRV<<<<<<<<<<<2\n\
            HORVAT<<ANA<<<<<<<<<<<<<<<<<<<\n";
        let outcome = extract_guest(text);
        assert_eq!(outcome.method, ExtractionMethod::Mrz);
        assert_eq!(outcome.profile.last_name.as_deref(), Some("Horvat"));
        assert!(outcome.is_valid());
    }

    #[test]
    fn mrz_result_gains_residence_from_visual_zone() {
        let text = "PREBIVALIŠTE/RESIDENCE\nZAGREB\nILICA 5\n\
            IOHRV112233445512345678901<<<<\n\
            7505154F3001011HRV<<<<<<<<<<<2\n\
            HORVAT<<ANA<<<<<<<<<<<<<<<<<<<\n";
        let outcome = extract_guest(text);
        assert_eq!(outcome.method, ExtractionMethod::Mrz);
        assert_eq!(outcome.profile.city_of_residence.as_deref(), Some("Zagreb"));
        assert_eq!(outcome.profile.address.as_deref(), Some("Ilica 5"));
    }

    #[test]
    fn labels_win_when_mrz_is_absent() {
        let text = "PREZIME/SURNAME\nHORVAT\nIME/NAME\nANA\n\
            BROJ OSOBNE ISKAZNICE\n112233445\n";
        let outcome = extract_guest(text);
        assert_eq!(outcome.method, ExtractionMethod::LabeledFields);
        assert!(outcome.is_valid());
        assert_eq!(outcome.profile.document_number.as_deref(), Some("112233445"));
    }

    #[test]
    fn generic_fallback_scrapes_what_it_can() {
        let text = "broj 556677889\nMARKO MARULIC\n15.05.1975\n";
        let outcome = extract_guest(text);
        assert_eq!(outcome.method, ExtractionMethod::Generic);
        assert_eq!(outcome.profile.document_number.as_deref(), Some("556677889"));
        assert_eq!(outcome.profile.birth_date, NaiveDate::from_ymd_opt(1975, 5, 15));
        assert_eq!(outcome.profile.full_name.as_deref(), Some("Marko Marulic"));
        assert!(outcome.is_valid());
    }

    #[test]
    fn generic_skips_boilerplate_word_pairs() {
        let text = "REPUBLIKA HRVATSKA\nOSOBNA ISKAZNICA\n";
        let outcome = extract_guest(text);
        assert_eq!(outcome.method, ExtractionMethod::Generic);
        assert!(outcome.profile.full_name.is_none());
        assert!(!outcome.is_valid());
    }

    #[test]
    fn empty_text_yields_invalid_outcome() {
        let outcome = extract_guest("");
        assert!(!outcome.is_valid());
        assert_eq!(outcome.method, ExtractionMethod::Generic);
    }

    #[test]
    fn passport_photo_full_flow() {
        let text = "REISEPASS / PASSPORT\n\
            P<DEUSCHMIDT<<MARIA<<<<<<<<<<<<<<<<<<<<<<<<<\n\
            C01X00T478DEU8501012F2501017<<<<<<<<<<<<<<04\n";
        let outcome = extract_guest(text);
        assert_eq!(outcome.method, ExtractionMethod::Mrz);
        assert_eq!(outcome.profile.document_kind, Some(DocumentKind::Passport));
        assert_eq!(outcome.profile.nationality.as_deref(), Some("Germany"));
    }
}
