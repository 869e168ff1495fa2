use serde::{Deserialize, Serialize};

use innkeep_core::GuestProfile;

/// An identity record scanned from a guest document, as stored in the cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannedGuest {
    pub id: i64,
    /// Reservation the guest was checked in against, once linked.
    pub reservation_id: Option<String>,
    pub profile: GuestProfile,
    /// Full OCR text the profile was extracted from.
    pub raw_text: String,
    pub created_at: i64,
}

/// One raw webhook delivery from the PMS.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEvent {
    pub id: i64,
    pub event_type: String,
    pub reservation_id: Option<String>,
    pub payload: serde_json::Value,
    pub processed: bool,
    pub created_at: i64,
}

/// Cache counters surfaced on the stats endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub reservations: u64,
    pub pending_checkins: u64,
    pub with_checkin_url: u64,
    pub scanned_guests: u64,
    pub webhook_events: u64,
}
