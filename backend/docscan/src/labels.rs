//! Labeled-field extraction from the visual zone of identity cards.
//!
//! Croatian cards print bilingual labels (`PREZIME/SURNAME`) with the value
//! either on the same line after the label or on the following line. This
//! pass is the fallback when the MRZ was cropped out of the photo or OCR
//! mangled it.

use once_cell::sync::Lazy;
use regex::Regex;

use innkeep_core::{Gender, GuestProfile};

use crate::countries;

/// A line that is itself another label, e.g. `IME/NAME`.
static LABEL_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-ZČĆŠĐŽ]+/").unwrap());

/// Trailing label glued onto a value line by OCR.
static TRAILING_LABEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-ZČĆŠĐŽ]{2,}/").unwrap());

static DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{1,2})\s*[.\s]\s*(\d{1,2})\s*[.\s]\s*(\d{4})").unwrap());

static NINE_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{9})\b").unwrap());

static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());

pub fn parse(text: &str) -> GuestProfile {
    let mut profile = GuestProfile::default();
    let text_upper = text.to_uppercase();
    let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();

    if let Some(surname) =
        find_after_label(&["PREZIME/SURNAME", "PREZIME", "SURNAME"], &[], &lines)
    {
        if let Some(clean) = clean_name(&surname) {
            profile.last_name = Some(clean);
        }
    }
    // "NAME" also occurs inside "SURNAME", so surname lines are excluded.
    if let Some(first) = find_after_label(&["IME/NAME", "NAME"], &["PREZIME", "SURNAME"], &lines) {
        if let Some(clean) = clean_name(&first) {
            profile.first_name = Some(clean);
        }
    }
    if let (Some(first), Some(last)) = (&profile.first_name, &profile.last_name) {
        profile.full_name = Some(format!("{first} {last}"));
    }

    profile.birth_date = birth_date(&lines);
    profile.document_number = document_number(&lines);
    profile.gender = gender(&lines);

    if ["HRV", "HRVATSKA", "CROATIA"].iter().any(|n| text_upper.contains(n)) {
        profile.nationality = Some("Croatia".to_string());
    }

    let (city, address) = residence(text);
    profile.city_of_residence = city;
    profile.address = address;

    profile
}

/// Value printed after a label: the remainder of the same line when
/// non-empty, otherwise the next line unless that is itself a label.
fn find_after_label(patterns: &[&str], exclude: &[&str], lines: &[&str]) -> Option<String> {
    for (i, line) in lines.iter().enumerate() {
        let line_upper = line.to_uppercase();
        if exclude.iter().any(|e| line_upper.contains(e)) {
            continue;
        }
        for pattern in patterns {
            if !line_upper.contains(pattern) {
                continue;
            }
            let remainder = line_upper.split(pattern).last().unwrap_or("").trim().to_string();
            if !remainder.is_empty() && !remainder.starts_with('/') {
                let value = TRAILING_LABEL
                    .split(&remainder)
                    .next()
                    .unwrap_or("")
                    .trim()
                    .to_string();
                if !value.is_empty() {
                    return Some(value);
                }
            }
            if let Some(next) = lines.get(i + 1) {
                if !LABEL_LINE.is_match(&next.to_uppercase()) {
                    return Some(next.to_string());
                }
            }
        }
    }
    None
}

fn clean_name(raw: &str) -> Option<String> {
    let stripped = DIGITS.replace_all(raw, "");
    let stripped = stripped.trim();
    if stripped.len() > 1 {
        Some(title_case(stripped))
    } else {
        None
    }
}

fn birth_date(lines: &[&str]) -> Option<chrono::NaiveDate> {
    let idx = lines.iter().position(|line| {
        let upper = line.to_uppercase();
        upper.contains("ROĐENJA") || upper.contains("BIRTH")
    })?;
    // Label and value may be split across a couple of lines.
    let section = lines[idx..lines.len().min(idx + 3)].join(" ");
    let caps = DATE.captures(&section)?;
    chrono::NaiveDate::from_ymd_opt(
        caps[3].parse().ok()?,
        caps[2].parse().ok()?,
        caps[1].parse().ok()?,
    )
}

fn document_number(lines: &[&str]) -> Option<String> {
    // Preferred: the number printed under its own label.
    if let Some(idx) = lines.iter().position(|line| {
        let upper = line.to_uppercase();
        upper.contains("BROJ") && upper.contains("ISKAZNIC")
    }) {
        if let Some(next) = lines.get(idx + 1) {
            if let Some(caps) = NINE_DIGITS.captures(next) {
                return Some(caps[1].to_string());
            }
        }
    }
    // Fallback: any nine-digit run that is not a personal id line.
    lines.iter().find_map(|line| {
        let upper = line.to_uppercase();
        if upper.contains("OIB") || upper.contains("MBG") {
            return None;
        }
        NINE_DIGITS.captures(line).map(|caps| caps[1].to_string())
    })
}

fn gender(lines: &[&str]) -> Option<Gender> {
    let idx = lines.iter().position(|line| {
        let upper = line.to_uppercase();
        upper.contains("SPOL") || upper.contains("SEX")
    })?;
    // Value shares the label's line or follows it.
    let section = lines[idx..lines.len().min(idx + 2)].join(" ");
    let upper = section.to_uppercase();
    if section.contains('Ž') || upper.contains("Z/F") || upper.contains("/F") {
        Some(Gender::Female)
    } else if upper.contains("M/") || upper.contains("/M") {
        Some(Gender::Male)
    } else {
        None
    }
}

/// City (and street address, when present) printed under the residence
/// label. The city may share the label's line or sit on the next one, with
/// the street on the line after.
pub fn residence(text: &str) -> (Option<String>, Option<String>) {
    const STOP: [&str; 6] = ["IZDALA", "ISSUED", "DATUM", "OIB", "MBG", "PREBIVALIŠTE"];
    let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();

    for (i, line) in lines.iter().enumerate() {
        let upper = line.to_uppercase();
        if !upper.contains("PREBIVALIŠTE") && !upper.contains("RESIDENCE") {
            continue;
        }

        let mut after = upper.clone();
        for label in ["PREBIVALIŠTE/RESIDENCE", "PREBIVALIŠTE", "RESIDENCE"] {
            if let Some(idx) = after.find(label) {
                after = after[idx + label.len()..].trim().to_string();
                break;
            }
        }

        if after.len() > 2 && !after.starts_with('/') {
            // City on the label's own line; next line may be the street.
            let city = after.split(',').next().unwrap_or("").trim().to_string();
            let address = lines.get(i + 1).and_then(|next| {
                let next_upper = next.to_uppercase();
                (!STOP.iter().any(|s| next_upper.contains(s))).then(|| title_case(next))
            });
            return (Some(title_case(&city)), address);
        }

        if let Some(next) = lines.get(i + 1) {
            let next_upper = next.to_uppercase();
            if STOP.iter().any(|s| next_upper.contains(s)) {
                continue;
            }
            let city = title_case(next);
            let address = lines.get(i + 2).and_then(|after_next| {
                let upper = after_next.to_uppercase();
                let looks_like_street = after_next.chars().any(|c| c.is_ascii_digit());
                (!STOP.iter().any(|s| upper.contains(s)) && looks_like_street)
                    .then(|| title_case(after_next))
            });
            return (Some(city), address);
        }
    }

    (None, None)
}

fn title_case(input: &str) -> String {
    input
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
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
    use chrono::NaiveDate;

    const CARD_FRONT: &str = "REPUBLIKA HRVATSKA\n\
        OSOBNA ISKAZNICA / IDENTITY CARD\n\
        PREZIME/SURNAME\n\
        HORVAT\n\
        IME/NAME\n\
        ANA\n\
        SPOL/SEX\n\
        Ž/F\n\
        DATUM ROĐENJA/DATE OF BIRTH\n\
        15 05 1975\n\
        BROJ OSOBNE ISKAZNICE\n\
        112233445\n";

    #[test]
    fn parses_values_on_next_line() {
        let profile = parse(CARD_FRONT);
        assert_eq!(profile.last_name.as_deref(), Some("Horvat"));
        assert_eq!(profile.first_name.as_deref(), Some("Ana"));
        assert_eq!(profile.full_name.as_deref(), Some("Ana Horvat"));
        assert_eq!(profile.birth_date, NaiveDate::from_ymd_opt(1975, 5, 15));
        assert_eq!(profile.document_number.as_deref(), Some("112233445"));
        assert_eq!(profile.gender, Some(Gender::Female));
        assert_eq!(profile.nationality.as_deref(), Some("Croatia"));
        assert!(profile.has_identity());
    }

    #[test]
    fn parses_value_on_same_line() {
        let text = "PREZIME/SURNAME KOVAČ\nIME/NAME IVAN\nSPOL/SEX M/M\n998877665\n";
        let profile = parse(text);
        assert_eq!(profile.last_name.as_deref(), Some("Kovač"));
        assert_eq!(profile.first_name.as_deref(), Some("Ivan"));
        assert_eq!(profile.gender, Some(Gender::Male));
        assert_eq!(profile.document_number.as_deref(), Some("998877665"));
    }

    #[test]
    fn skips_personal_id_lines_for_document_number() {
        let text = "PREZIME/SURNAME\nHORVAT\nIME/NAME\nANA\nOIB 123456789\n556677889\n";
        let profile = parse(text);
        assert_eq!(profile.document_number.as_deref(), Some("556677889"));
    }

    #[test]
    fn residence_city_on_same_line() {
        let text = "PREBIVALIŠTE/RESIDENCE LADIMIREVCI, VALPOVO\nKOLODVORSKA 12\n";
        let (city, address) = residence(text);
        assert_eq!(city.as_deref(), Some("Ladimirevci"));
        assert_eq!(address.as_deref(), Some("Kolodvorska 12"));
    }

    #[test]
    fn residence_city_on_next_line() {
        let text = "PREBIVALIŠTE/RESIDENCE\nZAGREB\nILICA 5\nIZDALA/ISSUED BY PU ZAGREB\n";
        let (city, address) = residence(text);
        assert_eq!(city.as_deref(), Some("Zagreb"));
        assert_eq!(address.as_deref(), Some("Ilica 5"));
    }

    #[test]
    fn residence_stops_at_issuer_lines() {
        let text = "PREBIVALIŠTE/RESIDENCE\nIZDALA PU OSIJEK\n";
        let (city, address) = residence(text);
        assert!(city.is_none());
        assert!(address.is_none());
    }

    #[test]
    fn names_with_digits_are_cleaned() {
        let text = "PREZIME/SURNAME\nHORVAT 123\nIME/NAME\nANA\n";
        let profile = parse(text);
        assert_eq!(profile.last_name.as_deref(), Some("Horvat"));
    }
}
