//! Machine readable zone parsing.
//!
//! Handles the TD1 layout of EU identity cards (three 30-char lines, name on
//! the last line) and the TD3 passport layout (two 44-char lines, name on
//! the first). OCR output is noisy: `<` fillers go missing, lines pick up
//! spaces, surrounding visual-zone text is interleaved. Candidate lines are
//! therefore selected by shape, not position.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use innkeep_core::{DocumentKind, Gender, GuestProfile};

use crate::countries;

/// National identity card line 1: document code + issuing state + 9-digit
/// document number.
static ID_DOCUMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"I[OACD]?([A-Z]{3})(\d{9})").unwrap());

/// Personal identification number that follows the document number and its
/// check digit on identity cards.
static ID_PERSONAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"I[OACD]?[A-Z]{3}\d{10}(\d{11})").unwrap());

/// Passport line 1 prefix: `P<XXX` (type letter sometimes misread).
static PASSPORT_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^P[<A-Z]([A-Z]{3})").unwrap());

/// Passport line 2 head: 9-char document number + check digit + issuing
/// state + birth date.
static PASSPORT_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Z0-9<]{9})\d([A-Z]{3})\d{6}").unwrap());

/// Shared data run: birth date + check digit + sex + expiry date.
static DATES_AND_SEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{6})(\d)([MF<])(\d{6})").unwrap());

/// Nationality on identity cards follows the expiry check digit.
static NATIONALITY_TD1: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[MF<]\d{6}\d([A-Z]{3})").unwrap());

/// Nationality on passports precedes the birth date.
static NATIONALITY_TD3: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Z]{3})\d{6}\d[MF<]").unwrap());

/// `SURNAME<<GIVEN` with optional further given names.
static NAME_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Z]{2,})<<([A-Z]+(?:<[A-Z]+)*)").unwrap());

/// Long uppercase-alphanumeric run: an MRZ line whose fillers OCR dropped.
static BARE_MRZ_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z0-9]{20,}$").unwrap());

/// Extract what the machine readable zone offers; an empty profile when no
/// plausible MRZ lines are present.
pub fn parse(text: &str) -> GuestProfile {
    let mut profile = GuestProfile::default();
    let lines = candidate_lines(text);
    if lines.len() < 2 {
        return profile;
    }
    debug!(count = lines.len(), "MRZ candidate lines found");

    if let Some(name_line) = lines.iter().find(|l| is_name_line(l)) {
        // Passports put the name on line 1 behind the `P<XXX` prefix.
        let cleaned = PASSPORT_PREFIX.replace(name_line, "");
        if let Some(caps) = NAME_RUN.captures(&cleaned) {
            let last = title_case(&caps[1]);
            let first = title_case(&caps[2].replace('<', " "));
            profile.full_name = Some(format!("{first} {last}"));
            profile.first_name = Some(first);
            profile.last_name = Some(last);
        }
    }

    for line in &lines {
        if let Some(caps) = ID_DOCUMENT.captures(line) {
            profile.document_number = Some(caps[2].to_string());
            profile.document_kind = Some(DocumentKind::IdCard);
            profile.nationality = Some(countries::display_name(&caps[1]));
            if let Some(pid) = ID_PERSONAL.captures(line) {
                profile.personal_id = Some(pid[1].to_string());
            }
            continue;
        }

        if let Some(caps) = PASSPORT_PREFIX.captures(line) {
            profile.document_kind = Some(DocumentKind::Passport);
            profile.nationality = Some(countries::display_name(&caps[1]));
            continue;
        }

        if profile.document_kind == Some(DocumentKind::Passport)
            || lines.iter().any(|l| PASSPORT_PREFIX.is_match(l))
        {
            if let Some(caps) = PASSPORT_NUMBER.captures(line) {
                let number = caps[1].trim_end_matches('<').to_string();
                if !number.is_empty() {
                    profile.document_number = Some(number);
                }
                if profile.nationality.is_none() {
                    profile.nationality = Some(countries::display_name(&caps[2]));
                }
            }
        }

        if let Some(caps) = DATES_AND_SEX.captures(line) {
            profile.birth_date = mrz_date(&caps[1]);
            profile.gender = caps[3].chars().next().and_then(Gender::from_mrz);
            profile.expiry_date = mrz_date(&caps[4]);

            if profile.nationality.is_none() {
                let nat = NATIONALITY_TD1
                    .captures(line)
                    .or_else(|| NATIONALITY_TD3.captures(line));
                if let Some(nat) = nat {
                    profile.nationality = Some(countries::display_name(&nat[1]));
                }
            }
        }
    }

    profile
}

fn candidate_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| line.trim().replace(' ', ""))
        .filter(|clean| {
            (clean.contains('<') && clean.len() >= 20)
                || (BARE_MRZ_LINE.is_match(clean) && clean.chars().any(|c| c.is_ascii_digit()))
        })
        .collect()
}

/// The name line carries `<<` and essentially no digits; data lines always
/// carry date runs.
fn is_name_line(line: &str) -> bool {
    line.contains("<<") && line.chars().filter(|c| c.is_ascii_digit()).count() <= 1
}

/// `YYMMDD` with a two-digit-year pivot: 00–30 → 2000s, 31–99 → 1900s.
fn mrz_date(raw: &str) -> Option<NaiveDate> {
    if raw.len() != 6 {
        return None;
    }
    let yy: i32 = raw[0..2].parse().ok()?;
    let mm: u32 = raw[2..4].parse().ok()?;
    let dd: u32 = raw[4..6].parse().ok()?;
    let year = if yy <= 30 { 2000 + yy } else { 1900 + yy };
    NaiveDate::from_ymd_opt(year, mm, dd)
}

fn title_case(word: &str) -> String {
    word.split_whitespace()
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID_CARD: &str = "REPUBLIKA HRVATSKA\n\
        OSOBNA ISKAZNICA\n\
        IOHRV112233445512345678901<<<<\n\
        7505154F3001011HRV<<<<<<<<<<<2\n\
        HORVAT<<ANA<<<<<<<<<<<<<<<<<<<\n";

    const PASSPORT: &str = "P<DEUSCHMIDT<<MARIA<<<<<<<<<<<<<<<<<<<<<<<<<\n\
        C01X00T478DEU8501012F2501017<<<<<<<<<<<<<<04\n";

    #[test]
    fn parses_identity_card_mrz() {
        let profile = parse(ID_CARD);
        assert_eq!(profile.last_name.as_deref(), Some("Horvat"));
        assert_eq!(profile.first_name.as_deref(), Some("Ana"));
        assert_eq!(profile.document_number.as_deref(), Some("112233445"));
        assert_eq!(profile.personal_id.as_deref(), Some("12345678901"));
        assert_eq!(profile.document_kind, Some(DocumentKind::IdCard));
        assert_eq!(profile.nationality.as_deref(), Some("Croatia"));
        assert_eq!(profile.birth_date, NaiveDate::from_ymd_opt(1975, 5, 15));
        assert_eq!(profile.expiry_date, NaiveDate::from_ymd_opt(2030, 1, 1));
        assert_eq!(profile.gender, Some(Gender::Female));
        assert!(profile.has_identity());
    }

    #[test]
    fn parses_passport_mrz() {
        let profile = parse(PASSPORT);
        assert_eq!(profile.last_name.as_deref(), Some("Schmidt"));
        assert_eq!(profile.first_name.as_deref(), Some("Maria"));
        assert_eq!(profile.document_kind, Some(DocumentKind::Passport));
        assert_eq!(profile.document_number.as_deref(), Some("C01X00T47"));
        assert_eq!(profile.nationality.as_deref(), Some("Germany"));
        assert_eq!(profile.birth_date, NaiveDate::from_ymd_opt(1985, 1, 1));
        assert_eq!(profile.expiry_date, NaiveDate::from_ymd_opt(2025, 1, 1));
        assert!(profile.has_identity());
    }

    #[test]
    fn multiple_given_names_join() {
        let text = "IOHRV998877665412345678901<<<<\n\
            8003059M2812314HRV<<<<<<<<<<<6\n\
            KOVAC<<IVAN<MARKO<<<<<<<<<<<<<\n";
        let profile = parse(text);
        assert_eq!(profile.first_name.as_deref(), Some("Ivan Marko"));
        assert_eq!(profile.full_name.as_deref(), Some("Ivan Marko Kovac"));
        assert_eq!(profile.gender, Some(Gender::Male));
    }

    #[test]
    fn tolerates_spaces_inside_lines() {
        let spaced = ID_CARD.replace("IOHRV11223344", "IOHRV 11223344");
        let profile = parse(&spaced);
        assert_eq!(profile.document_number.as_deref(), Some("112233445"));
    }

    #[test]
    fn too_few_lines_yield_empty_profile() {
        let profile = parse("HORVAT<<ANA<<<<<<<<<<<<<<<<<<<\n");
        assert!(profile.document_number.is_none());
        assert!(!profile.has_identity());
    }

    #[test]
    fn invalid_dates_are_dropped() {
        // Month 13 in the birth date.
        let text = "IOHRV112233445512345678901<<<<\n\
            7513154F3001011HRV<<<<<<<<<<<2\n\
            HORVAT<<ANA<<<<<<<<<<<<<<<<<<<\n";
        let profile = parse(text);
        assert!(profile.birth_date.is_none());
        assert_eq!(profile.expiry_date, NaiveDate::from_ymd_opt(2030, 1, 1));
    }

    #[test]
    fn century_pivot() {
        assert_eq!(mrz_date("300101"), NaiveDate::from_ymd_opt(2030, 1, 1));
        assert_eq!(mrz_date("310101"), NaiveDate::from_ymd_opt(1931, 1, 1));
        assert_eq!(mrz_date("000229"), NaiveDate::from_ymd_opt(2000, 2, 29));
    }
}
