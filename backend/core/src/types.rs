use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A reservation as tracked by the runtime, normalized from either the PMS
/// list API or a webhook payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub id: String,
    pub guest_name: String,
    pub guest_email: Option<String>,
    pub guest_phone: Option<String>,
    pub unit_id: Option<String>,
    pub unit_name: String,
    /// Arrival day as epoch seconds (the PMS pins these to midnight).
    pub arrival: i64,
    /// Departure day as epoch seconds.
    pub departure: i64,
    pub adults: u32,
    pub children: u32,
    pub total_nights: u32,
    pub total_price: f64,
    pub currency: String,
    /// OTA channel name ("Booking.com", "Airbnb", ...) or None for direct.
    pub channel: Option<String>,
    pub note: Option<String>,
    pub status: ReservationStatus,
    pub checked_in: bool,
    pub checkin_url: Option<String>,
    /// UUID extracted from the online check-in URL, used as a lookup key.
    pub checkin_token: Option<String>,
    /// Original wire payload, kept for debugging and re-parsing.
    #[serde(default)]
    pub raw: serde_json::Value,
}

/// Reservation lifecycle status as encoded by the PMS.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    Confirmed,
    Tentative,
    Cancelled,
    Unknown,
}

impl ReservationStatus {
    /// Wire codes used by the PMS reservations endpoint.
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Self::Confirmed,
            2 => Self::Tentative,
            3 => Self::Cancelled,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::Tentative => "tentative",
            Self::Cancelled => "cancelled",
            Self::Unknown => "unknown",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "confirmed" => Self::Confirmed,
            "tentative" => Self::Tentative,
            "cancelled" => Self::Cancelled,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn from_mrz(c: char) -> Option<Self> {
        match c {
            'M' => Some(Self::Male),
            'F' => Some(Self::Female),
            _ => None,
        }
    }

    pub fn letter(&self) -> char {
        match self {
            Self::Male => 'M',
            Self::Female => 'F',
        }
    }
}

/// The kind of travel document a guest presented.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    IdCard,
    Passport,
}

impl DocumentKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::IdCard => "ID card",
            Self::Passport => "Passport",
        }
    }
}

/// Structured identity record for one guest, produced by the document
/// scanner or loaded back from the cache.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GuestProfile {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub full_name: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub gender: Option<Gender>,
    /// Display name of the guest's nationality (e.g. "Croatia").
    pub nationality: Option<String>,
    pub document_kind: Option<DocumentKind>,
    pub document_number: Option<String>,
    pub expiry_date: Option<NaiveDate>,
    /// National personal identification number, where the document carries one.
    pub personal_id: Option<String>,
    pub city_of_residence: Option<String>,
    pub address: Option<String>,
}

impl GuestProfile {
    /// Best available display name: explicit full name, else "First Last".
    pub fn display_name(&self) -> Option<String> {
        if let Some(full) = &self.full_name {
            if !full.trim().is_empty() {
                return Some(full.trim().to_string());
            }
        }
        match (&self.first_name, &self.last_name) {
            (None, None) => None,
            (first, last) => {
                let joined = format!(
                    "{} {}",
                    first.as_deref().unwrap_or(""),
                    last.as_deref().unwrap_or("")
                );
                let joined = joined.trim().to_string();
                if joined.is_empty() { None } else { Some(joined) }
            }
        }
    }

    /// Minimum bar for a usable record: some name plus a document number.
    pub fn has_identity(&self) -> bool {
        self.display_name().is_some() && self.document_number.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_roundtrip() {
        assert_eq!(ReservationStatus::from_code(1), ReservationStatus::Confirmed);
        assert_eq!(ReservationStatus::from_code(3), ReservationStatus::Cancelled);
        assert_eq!(ReservationStatus::from_code(99), ReservationStatus::Unknown);
        assert_eq!(
            ReservationStatus::parse(ReservationStatus::Tentative.as_str()),
            ReservationStatus::Tentative
        );
    }

    #[test]
    fn display_name_prefers_full_name() {
        let profile = GuestProfile {
            first_name: Some("Ana".into()),
            last_name: Some("Horvat".into()),
            full_name: Some("Ana Horvat".into()),
            ..Default::default()
        };
        assert_eq!(profile.display_name().as_deref(), Some("Ana Horvat"));
    }

    #[test]
    fn display_name_joins_parts() {
        let profile = GuestProfile {
            last_name: Some("Horvat".into()),
            ..Default::default()
        };
        assert_eq!(profile.display_name().as_deref(), Some("Horvat"));
    }

    #[test]
    fn identity_requires_name_and_document() {
        let mut profile = GuestProfile::default();
        assert!(!profile.has_identity());
        profile.full_name = Some("Ana Horvat".into());
        assert!(!profile.has_identity());
        profile.document_number = Some("112233445".into());
        assert!(profile.has_identity());
    }
}
