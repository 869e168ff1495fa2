//! Normalization of PMS wire payloads into domain records.
//!
//! Two dialects reach the runtime: the list/details API (stable camelCase
//! keys, epoch dates) and webhook payloads (key names drift across event
//! versions, dates may be epoch or ISO strings). Both funnel into
//! [`Reservation`].

use chrono::{DateTime, Local, NaiveDate, TimeZone};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use innkeep_core::{Reservation, ReservationStatus};

/// UUID segment of an online check-in URL: `.../c/{uuid}/{code}`.
static CHECKIN_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/c/([a-f0-9-]+)/").unwrap());

/// Parse a reservation from the list/details API. Returns None when the
/// payload has no id.
pub fn reservation_from_api(data: &Value) -> Option<Reservation> {
    let id = id_of(data)?;
    let holder = data.get("holder").cloned().unwrap_or(Value::Null);

    let guest_name = str_of(data, &["guestName"])
        .or_else(|| str_of(&holder, &["name"]))
        .unwrap_or_else(|| "Unknown".to_string());

    let children = u32_of(data, &["children"]).unwrap_or(0)
        + u32_of(data, &["childrenUnder12"]).unwrap_or(0)
        + u32_of(data, &["childrenAbove12"]).unwrap_or(0);

    Some(Reservation {
        id,
        guest_name,
        guest_email: str_of(data, &["guestEmail"]).or_else(|| str_of(&holder, &["email"])),
        guest_phone: str_of(data, &["guestContactNumber"])
            .or_else(|| str_of(&holder, &["contactNumber"])),
        unit_id: str_of(data, &["unitId"]),
        unit_name: str_of(data, &["unitName"]).unwrap_or_default(),
        arrival: epoch_of(data, &["arrivalDate"]).unwrap_or(0),
        departure: epoch_of(data, &["departureDate"]).unwrap_or(0),
        adults: u32_of(data, &["adults"]).unwrap_or(0),
        children,
        total_nights: u32_of(data, &["totalNights"]).unwrap_or(0),
        total_price: f64_of(data, &["totalPrice"]).unwrap_or(0.0),
        currency: str_of(data, &["currency"]).unwrap_or_else(|| "EUR".to_string()),
        channel: str_of(data, &["otaChannelName"]),
        note: str_of(data, &["note"]).filter(|n| !n.trim().is_empty()),
        status: ReservationStatus::from_code(
            data.get("status").and_then(Value::as_i64).unwrap_or(0),
        ),
        checked_in: str_of(data, &["checkedIn"]).as_deref() == Some("Y"),
        checkin_url: None, // not exposed by the list API
        checkin_token: None,
        raw: data.clone(),
    })
}

/// Parse a reservation from a webhook payload, tolerating the key-name
/// drift between event versions.
pub fn reservation_from_webhook(data: &Value) -> Option<Reservation> {
    let id = str_of(data, &["id", "reservationId", "reservation_id"])
        .filter(|s| !s.is_empty())?;

    let checkin_url = str_of(data, &["onlineCheckInUrl", "online_checkin_url", "checkinUrl"]);
    let checkin_token = checkin_url.as_deref().and_then(extract_checkin_token);

    let children = u32_of(data, &["children"]).unwrap_or(0)
        + u32_of(data, &["childrenUnder12"]).unwrap_or(0)
        + u32_of(data, &["childrenAbove12"]).unwrap_or(0);

    Some(Reservation {
        id,
        guest_name: str_of(data, &["guestName", "guest_name", "name"])
            .unwrap_or_else(|| "Unknown".to_string()),
        guest_email: str_of(data, &["guestEmail", "guest_email", "email"]),
        guest_phone: str_of(data, &["guestContactNumber", "guest_phone", "phone"]),
        unit_id: str_of(data, &["unitId", "unit_id"]),
        unit_name: str_of(data, &["unitName", "unit_name", "propertyName"]).unwrap_or_default(),
        arrival: epoch_of(data, &["arrivalDate", "arrival_date", "checkIn"]).unwrap_or(0),
        departure: epoch_of(data, &["departureDate", "departure_date", "checkOut"]).unwrap_or(0),
        adults: u32_of(data, &["adults"]).unwrap_or(1),
        children,
        total_nights: u32_of(data, &["totalNights", "total_nights"]).unwrap_or(0),
        total_price: f64_of(data, &["totalPrice", "total_price"]).unwrap_or(0.0),
        currency: str_of(data, &["currency"]).unwrap_or_else(|| "EUR".to_string()),
        channel: str_of(data, &["otaChannelName", "channel", "source"]),
        note: str_of(data, &["note", "notes"]),
        status: ReservationStatus::Confirmed,
        checked_in: false,
        checkin_url,
        checkin_token,
        raw: data.clone(),
    })
}

/// Pull the UUID token out of a short check-in URL.
pub fn extract_checkin_token(url: &str) -> Option<String> {
    CHECKIN_TOKEN
        .captures(url)
        .map(|caps| caps[1].to_string())
}

// ---------------------------------------------------------------------------
// Field access helpers
// ---------------------------------------------------------------------------

fn id_of(data: &Value) -> Option<String> {
    match data.get("id") {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

fn str_of(data: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        data.get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}

fn u32_of(data: &Value, keys: &[&str]) -> Option<u32> {
    keys.iter()
        .find_map(|key| data.get(key).and_then(Value::as_u64))
        .map(|v| v as u32)
}

fn f64_of(data: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|key| data.get(key).and_then(Value::as_f64))
}

/// Dates arrive as epoch seconds, RFC 3339 stamps, or bare `YYYY-MM-DD`.
fn epoch_of(data: &Value, keys: &[&str]) -> Option<i64> {
    keys.iter().find_map(|key| value_to_epoch(data.get(key)?))
}

fn value_to_epoch(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => {
            if let Ok(dt) = DateTime::parse_from_rfc3339(&s.replace('Z', "+00:00")) {
                return Some(dt.timestamp());
            }
            let date: NaiveDate = s.get(..10)?.parse().ok()?;
            Local
                .from_local_datetime(&date.and_hms_opt(0, 0, 0)?)
                .earliest()
                .map(|dt| dt.timestamp())
        }
        _ => None,
    }
}
