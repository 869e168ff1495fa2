//! Wire types for PMS requests.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use innkeep_core::time::date_to_utc_midnight_epoch;
use innkeep_core::{Gender, GuestProfile};

/// Filter set for the reservations list endpoint.
#[derive(Debug, Clone, Default)]
pub struct ReservationQuery {
    pub property_id: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub status: Option<i64>,
    pub guest_name: Option<String>,
    pub limit: Option<u32>,
}

impl ReservationQuery {
    /// Window query spanning `[from, to]`, the common case.
    pub fn window(from: NaiveDate, to: NaiveDate, limit: u32) -> Self {
        Self {
            date_from: Some(from),
            date_to: Some(to),
            limit: Some(limit),
            ..Default::default()
        }
    }

    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![(
            "limit".to_string(),
            self.limit.unwrap_or(100).to_string(),
        )];
        if let Some(id) = &self.property_id {
            pairs.push(("propertyId".to_string(), id.clone()));
        }
        if let Some(from) = self.date_from {
            pairs.push(("dateFrom".to_string(), from.format("%Y-%m-%d").to_string()));
        }
        if let Some(to) = self.date_to {
            pairs.push(("dateTo".to_string(), to.format("%Y-%m-%d").to_string()));
        }
        if let Some(status) = self.status {
            pairs.push(("status".to_string(), status.to_string()));
        }
        if let Some(name) = &self.guest_name {
            pairs.push(("guestName".to_string(), name.clone()));
        }
        pairs
    }
}

/// Guest registration payload for the add-guests endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGuest {
    pub name: String,
    /// Y/N flags as the API expects them.
    pub is_booker: String,
    pub is_primary: String,
    pub is_additional: String,

    /// UTC-midnight epoch seconds, as a string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,

    /// 1 = female, 2 = male.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender_id: Option<u8>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub citizenship_country_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_of_birth_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_of_residence_id: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub travel_document_types_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_number: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub city_of_residence: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl NewGuest {
    /// Build the registration payload from a scanned profile. The first
    /// guest on a reservation is the primary, the rest are additional.
    pub fn from_profile(
        profile: &GuestProfile,
        is_primary: bool,
        fallback_name: &str,
        country_id: Option<i64>,
        document_type_id: Option<i64>,
    ) -> Self {
        let name = profile
            .display_name()
            .unwrap_or_else(|| fallback_name.to_string());

        // Document details double as a note so nothing is lost if a field
        // is rejected by PMS-side validation.
        let mut note_parts = Vec::new();
        if let Some(doc) = &profile.document_number {
            note_parts.push(format!("Doc: {doc}"));
        }
        if let Some(expiry) = profile.expiry_date {
            note_parts.push(format!("Exp: {}", innkeep_core::time::format_date(expiry)));
        }
        if let Some(pid) = &profile.personal_id {
            note_parts.push(format!("PIN: {pid}"));
        }

        Self {
            name,
            is_booker: "N".to_string(),
            is_primary: if is_primary { "Y" } else { "N" }.to_string(),
            is_additional: if is_primary { "N" } else { "Y" }.to_string(),
            date_of_birth: profile
                .birth_date
                .map(|d| date_to_utc_midnight_epoch(d).to_string()),
            gender_id: profile.gender.map(|g| match g {
                Gender::Female => 1,
                Gender::Male => 2,
            }),
            country_id,
            citizenship_country_id: country_id,
            country_of_birth_id: country_id,
            country_of_residence_id: country_id,
            travel_document_types_id: profile
                .document_number
                .as_ref()
                .and(document_type_id),
            document_number: profile.document_number.clone(),
            city_of_residence: profile.city_of_residence.clone(),
            address: profile.address.clone(),
            note: if note_parts.is_empty() {
                None
            } else {
                Some(note_parts.join(" | "))
            },
        }
    }
}

/// Outcome of the add-guests call.
#[derive(Debug, Clone, Default)]
pub struct GuestAddOutcome {
    pub added: Vec<Value>,
    pub messages: Vec<String>,
}

impl GuestAddOutcome {
    pub fn from_payload(payload: &Value) -> Self {
        let added = payload
            .get("guestAdded")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let messages = payload
            .get("messages")
            .and_then(Value::as_array)
            .map(|msgs| {
                msgs.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        Self { added, messages }
    }
}

/// Draft invoice line item.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceItemDraft {
    pub description: String,
    pub price: f64,
    pub quantity: f64,
    /// "Y" when the price already includes VAT.
    pub vat_included: String,
    pub taxes: Vec<InvoiceTax>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_percent: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceTax {
    pub label: String,
    pub rate: f64,
}

impl InvoiceItemDraft {
    /// Accommodation line with Croatian reduced VAT for lodging.
    pub fn accommodation(description: String, price_per_night: f64, nights: u32) -> Self {
        Self {
            description,
            price: price_per_night,
            quantity: nights.max(1) as f64,
            vat_included: "Y".to_string(),
            taxes: vec![InvoiceTax { label: "VAT".to_string(), rate: 13.0 }],
            discount_percent: Some(0.0),
        }
    }

    /// Free-form extra (parking, breakfast, tourist tax) at standard VAT.
    pub fn extra(description: String, price: f64, quantity: f64) -> Self {
        Self {
            description,
            price,
            quantity,
            vat_included: "Y".to_string(),
            taxes: vec![InvoiceTax { label: "VAT".to_string(), rate: 25.0 }],
            discount_percent: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn query_pairs_include_only_set_fields() {
        let q = ReservationQuery::window(
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 5, 8).unwrap(),
            50,
        );
        let pairs = q.to_pairs();
        assert!(pairs.contains(&("dateFrom".to_string(), "2024-05-01".to_string())));
        assert!(pairs.contains(&("dateTo".to_string(), "2024-05-08".to_string())));
        assert!(pairs.contains(&("limit".to_string(), "50".to_string())));
        assert!(!pairs.iter().any(|(k, _)| k == "guestName"));
    }

    #[test]
    fn new_guest_from_profile_sets_flags_and_note() {
        let profile = GuestProfile {
            first_name: Some("Ana".into()),
            last_name: Some("Horvat".into()),
            birth_date: NaiveDate::from_ymd_opt(1990, 4, 2),
            gender: Some(Gender::Female),
            document_number: Some("112233445".into()),
            personal_id: Some("12345678901".into()),
            ..Default::default()
        };
        let guest = NewGuest::from_profile(&profile, true, "Guest 1", Some(55), Some(2));
        assert_eq!(guest.name, "Ana Horvat");
        assert_eq!(guest.is_primary, "Y");
        assert_eq!(guest.is_additional, "N");
        assert_eq!(guest.gender_id, Some(1));
        assert_eq!(guest.country_id, Some(55));
        assert_eq!(guest.travel_document_types_id, Some(2));
        let note = guest.note.unwrap();
        assert!(note.contains("Doc: 112233445"));
        assert!(note.contains("PIN: 12345678901"));
        // UTC-midnight epoch, so divisible by a whole day.
        let dob: i64 = guest.date_of_birth.unwrap().parse().unwrap();
        assert_eq!(dob % 86_400, 0);
    }

    #[test]
    fn new_guest_without_document_has_no_type_id() {
        let profile = GuestProfile {
            full_name: Some("Ivan Kovač".into()),
            ..Default::default()
        };
        let guest = NewGuest::from_profile(&profile, false, "Guest 2", None, Some(2));
        assert_eq!(guest.is_primary, "N");
        assert_eq!(guest.is_additional, "Y");
        assert!(guest.travel_document_types_id.is_none());
        assert!(guest.note.is_none());
    }

    #[test]
    fn guest_add_outcome_parses_payload() {
        let payload = serde_json::json!({
            "guestAdded": [{"id": 1}],
            "messages": ["guest already exists"]
        });
        let outcome = GuestAddOutcome::from_payload(&payload);
        assert_eq!(outcome.added.len(), 1);
        assert_eq!(outcome.messages, vec!["guest already exists"]);
    }

    #[test]
    fn invoice_drafts_carry_vat() {
        let acc = InvoiceItemDraft::accommodation("Stay".into(), 60.0, 3);
        assert_eq!(acc.quantity, 3.0);
        assert_eq!(acc.taxes[0].rate, 13.0);
        let extra = InvoiceItemDraft::extra("Parking".into(), 10.0, 2.0);
        assert_eq!(extra.taxes[0].rate, 25.0);
    }
}
