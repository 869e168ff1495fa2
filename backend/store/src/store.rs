//! Durable SQLite-backed cache.
//!
//! Holds reservations received over webhooks or API polls, identity records
//! scanned from guest documents, and a log of raw webhook deliveries. The
//! daemon keeps working from this cache when the PMS is unreachable.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tokio::sync::Mutex;
use tracing::{debug, info};

use innkeep_core::time::day_bounds;
use innkeep_core::{GuestProfile, Reservation, ReservationStatus};

use crate::types::{CacheStats, ScannedGuest, WebhookEvent};

pub struct CacheStore {
    conn: Mutex<Connection>,
}

const SCHEMA: &str = r#"
PRAGMA journal_mode=WAL;
CREATE TABLE IF NOT EXISTS reservations (
    id              TEXT PRIMARY KEY,
    guest_name      TEXT NOT NULL,
    guest_email     TEXT,
    guest_phone     TEXT,
    unit_id         TEXT,
    unit_name       TEXT NOT NULL DEFAULT '',
    arrival         INTEGER NOT NULL,
    departure       INTEGER NOT NULL,
    adults          INTEGER NOT NULL DEFAULT 1,
    children        INTEGER NOT NULL DEFAULT 0,
    total_nights    INTEGER NOT NULL DEFAULT 0,
    total_price     REAL NOT NULL DEFAULT 0,
    currency        TEXT NOT NULL DEFAULT 'EUR',
    channel         TEXT,
    note            TEXT,
    status          TEXT NOT NULL DEFAULT 'confirmed',
    checked_in      INTEGER NOT NULL DEFAULT 0,
    checkin_url     TEXT,
    checkin_token   TEXT,
    raw             TEXT,
    created_at      INTEGER NOT NULL,
    updated_at      INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS scanned_guests (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    reservation_id  TEXT REFERENCES reservations(id),
    full_name       TEXT NOT NULL,
    first_name      TEXT,
    last_name       TEXT,
    birth_date      TEXT,
    gender          TEXT,
    nationality     TEXT,
    document_kind   TEXT,
    document_number TEXT,
    expiry_date     TEXT,
    personal_id     TEXT,
    city_of_residence TEXT,
    address         TEXT,
    raw_text        TEXT NOT NULL DEFAULT '',
    created_at      INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS webhook_events (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    event_type      TEXT NOT NULL,
    reservation_id  TEXT,
    payload         TEXT NOT NULL,
    processed       INTEGER NOT NULL DEFAULT 0,
    created_at      INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_reservations_arrival ON reservations(arrival);
CREATE INDEX IF NOT EXISTS idx_reservations_status ON reservations(status);
CREATE INDEX IF NOT EXISTS idx_reservations_token ON reservations(checkin_token);
CREATE INDEX IF NOT EXISTS idx_guests_reservation ON scanned_guests(reservation_id);
"#;

impl CacheStore {
    /// Create or open a database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref()).context("open innkeep cache database")?;
        conn.execute_batch(SCHEMA).context("initialize cache schema")?;
        info!("Cache store opened at {:?}", path.as_ref());
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Open an in-memory database (for tests).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    // ------------------------------------------------------------------
    // Reservations
    // ------------------------------------------------------------------

    /// Insert or update a reservation. An existing check-in URL/token is
    /// never overwritten with NULL: list-API payloads omit them while
    /// webhook payloads carry them.
    pub async fn upsert_reservation(&self, res: &Reservation) -> Result<()> {
        let now = Utc::now().timestamp();
        let conn = self.conn.lock().await;
        conn.execute(
            r#"INSERT INTO reservations
               (id, guest_name, guest_email, guest_phone, unit_id, unit_name,
                arrival, departure, adults, children, total_nights, total_price,
                currency, channel, note, status, checked_in, checkin_url,
                checkin_token, raw, created_at, updated_at)
               VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16,?17,?18,?19,?20,?21,?21)
               ON CONFLICT(id) DO UPDATE SET
                 guest_name=excluded.guest_name,
                 guest_email=excluded.guest_email,
                 guest_phone=excluded.guest_phone,
                 unit_id=excluded.unit_id,
                 unit_name=excluded.unit_name,
                 arrival=excluded.arrival,
                 departure=excluded.departure,
                 adults=excluded.adults,
                 children=excluded.children,
                 total_nights=excluded.total_nights,
                 total_price=excluded.total_price,
                 currency=excluded.currency,
                 channel=excluded.channel,
                 note=excluded.note,
                 status=excluded.status,
                 checked_in=excluded.checked_in,
                 checkin_url=COALESCE(excluded.checkin_url, checkin_url),
                 checkin_token=COALESCE(excluded.checkin_token, checkin_token),
                 raw=excluded.raw,
                 updated_at=excluded.updated_at"#,
            params![
                res.id,
                res.guest_name,
                res.guest_email,
                res.guest_phone,
                res.unit_id,
                res.unit_name,
                res.arrival,
                res.departure,
                res.adults,
                res.children,
                res.total_nights,
                res.total_price,
                res.currency,
                res.channel,
                res.note,
                res.status.as_str(),
                res.checked_in as i32,
                res.checkin_url,
                res.checkin_token,
                serde_json::to_string(&res.raw)?,
                now,
            ],
        )?;
        debug!(reservation = %res.id, "Upserted reservation");
        Ok(())
    }

    pub async fn reservation(&self, id: &str) -> Result<Option<Reservation>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&select_reservations("WHERE id = ?1"))?;
        let res = stmt
            .query_row(params![id], row_to_reservation)
            .optional()?;
        Ok(res)
    }

    pub async fn reservation_by_token(&self, token: &str) -> Result<Option<Reservation>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&select_reservations("WHERE checkin_token = ?1"))?;
        let res = stmt
            .query_row(params![token], row_to_reservation)
            .optional()?;
        Ok(res)
    }

    /// Non-cancelled reservations arriving within `[today, today + days]`,
    /// ascending by arrival.
    pub async fn upcoming(&self, today: NaiveDate, days: i64) -> Result<Vec<Reservation>> {
        let (start, _) = day_bounds(today);
        let (_, end) = day_bounds(today + chrono::Duration::days(days));
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&select_reservations(
            "WHERE arrival >= ?1 AND arrival <= ?2 AND status != 'cancelled' ORDER BY arrival ASC",
        ))?;
        let rows = stmt
            .query_map(params![start, end], row_to_reservation)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(rows)
    }

    /// Reservations arriving today or tomorrow that still need check-in and
    /// have an online check-in URL.
    pub async fn pending_checkins(&self, today: NaiveDate) -> Result<Vec<Reservation>> {
        let (start, _) = day_bounds(today);
        let (_, end) = day_bounds(today + chrono::Duration::days(1));
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&select_reservations(
            "WHERE arrival >= ?1 AND arrival <= ?2 AND checked_in = 0 \
             AND status != 'cancelled' AND checkin_url IS NOT NULL ORDER BY arrival ASC",
        ))?;
        let rows = stmt
            .query_map(params![start, end], row_to_reservation)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(rows)
    }

    /// Case-insensitive substring search on guest name, newest arrivals first.
    pub async fn search(&self, query: &str, limit: u32) -> Result<Vec<Reservation>> {
        let pattern = format!("%{}%", query);
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&select_reservations(
            "WHERE guest_name LIKE ?1 ORDER BY arrival DESC LIMIT ?2",
        ))?;
        let rows = stmt
            .query_map(params![pattern, limit], row_to_reservation)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(rows)
    }

    pub async fn set_status(&self, id: &str, status: ReservationStatus) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            "UPDATE reservations SET status = ?1, updated_at = ?2 WHERE id = ?3",
            params![status.as_str(), Utc::now().timestamp(), id],
        )?;
        Ok(())
    }

    pub async fn mark_checked_in(&self, id: &str) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            "UPDATE reservations SET checked_in = 1, updated_at = ?1 WHERE id = ?2",
            params![Utc::now().timestamp(), id],
        )?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Scanned guests
    // ------------------------------------------------------------------

    /// Store an identity record from the document scanner. Returns the row id.
    pub async fn add_scanned_guest(
        &self,
        reservation_id: Option<&str>,
        profile: &GuestProfile,
        raw_text: &str,
    ) -> Result<i64> {
        let full_name = profile
            .display_name()
            .unwrap_or_else(|| "Unknown".to_string());
        let conn = self.conn.lock().await;
        conn.execute(
            r#"INSERT INTO scanned_guests
               (reservation_id, full_name, first_name, last_name, birth_date,
                gender, nationality, document_kind, document_number, expiry_date,
                personal_id, city_of_residence, address, raw_text, created_at)
               VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15)"#,
            params![
                reservation_id,
                full_name,
                profile.first_name,
                profile.last_name,
                profile.birth_date.map(|d| d.to_string()),
                profile.gender.map(|g| g.letter().to_string()),
                profile.nationality,
                profile.document_kind.map(kind_str),
                profile.document_number,
                profile.expiry_date.map(|d| d.to_string()),
                profile.personal_id,
                profile.city_of_residence,
                profile.address,
                raw_text,
                Utc::now().timestamp(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub async fn link_guest(&self, guest_id: i64, reservation_id: &str) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            "UPDATE scanned_guests SET reservation_id = ?1 WHERE id = ?2",
            params![reservation_id, guest_id],
        )?;
        Ok(())
    }

    pub async fn guests_for_reservation(&self, reservation_id: &str) -> Result<Vec<ScannedGuest>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&select_guests(
            "WHERE reservation_id = ?1 ORDER BY created_at ASC",
        ))?;
        let rows = stmt
            .query_map(params![reservation_id], row_to_guest)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(rows)
    }

    pub async fn recent_unlinked_guests(&self, limit: u32) -> Result<Vec<ScannedGuest>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&select_guests(
            "WHERE reservation_id IS NULL ORDER BY created_at DESC LIMIT ?1",
        ))?;
        let rows = stmt
            .query_map(params![limit], row_to_guest)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(rows)
    }

    // ------------------------------------------------------------------
    // Webhook event log
    // ------------------------------------------------------------------

    pub async fn log_webhook_event(
        &self,
        event_type: &str,
        reservation_id: Option<&str>,
        payload: &serde_json::Value,
    ) -> Result<i64> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO webhook_events (event_type, reservation_id, payload, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                event_type,
                reservation_id,
                serde_json::to_string(payload)?,
                Utc::now().timestamp()
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub async fn mark_webhook_processed(&self, event_id: i64) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            "UPDATE webhook_events SET processed = 1 WHERE id = ?1",
            params![event_id],
        )?;
        Ok(())
    }

    pub async fn unprocessed_webhooks(&self, limit: u32) -> Result<Vec<WebhookEvent>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT id, event_type, reservation_id, payload, processed, created_at
             FROM webhook_events WHERE processed = 0 ORDER BY created_at ASC LIMIT ?1",
        )?;
        let rows = stmt
            .query_map(params![limit], |row| {
                let payload_json: String = row.get(3)?;
                Ok(WebhookEvent {
                    id: row.get(0)?,
                    event_type: row.get(1)?,
                    reservation_id: row.get(2)?,
                    payload: serde_json::from_str(&payload_json)
                        .unwrap_or(serde_json::Value::Null),
                    processed: row.get::<_, i32>(4)? != 0,
                    created_at: row.get(5)?,
                })
            })?
            .filter_map(|r| r.ok())
            .collect();
        Ok(rows)
    }

    // ------------------------------------------------------------------
    // Stats
    // ------------------------------------------------------------------

    pub async fn stats(&self) -> Result<CacheStats> {
        let conn = self.conn.lock().await;
        let count = |sql: &str| -> Result<u64> {
            Ok(conn.query_row(sql, [], |row| row.get::<_, i64>(0))? as u64)
        };
        Ok(CacheStats {
            reservations: count("SELECT COUNT(*) FROM reservations")?,
            pending_checkins: count(
                "SELECT COUNT(*) FROM reservations WHERE checked_in = 0 AND status != 'cancelled'",
            )?,
            with_checkin_url: count(
                "SELECT COUNT(*) FROM reservations WHERE checkin_url IS NOT NULL",
            )?,
            scanned_guests: count("SELECT COUNT(*) FROM scanned_guests")?,
            webhook_events: count("SELECT COUNT(*) FROM webhook_events")?,
        })
    }
}

// ---------------------------------------------------------------------------
// Row deserialization helpers
// ---------------------------------------------------------------------------

fn select_reservations(suffix: &str) -> String {
    format!(
        "SELECT id, guest_name, guest_email, guest_phone, unit_id, unit_name, \
         arrival, departure, adults, children, total_nights, total_price, \
         currency, channel, note, status, checked_in, checkin_url, \
         checkin_token, raw FROM reservations {suffix}"
    )
}

fn row_to_reservation(row: &rusqlite::Row) -> rusqlite::Result<Reservation> {
    let status: String = row.get(15)?;
    let raw_json: Option<String> = row.get(19)?;
    Ok(Reservation {
        id: row.get(0)?,
        guest_name: row.get(1)?,
        guest_email: row.get(2)?,
        guest_phone: row.get(3)?,
        unit_id: row.get(4)?,
        unit_name: row.get(5)?,
        arrival: row.get(6)?,
        departure: row.get(7)?,
        adults: row.get::<_, i64>(8)? as u32,
        children: row.get::<_, i64>(9)? as u32,
        total_nights: row.get::<_, i64>(10)? as u32,
        total_price: row.get(11)?,
        currency: row.get(12)?,
        channel: row.get(13)?,
        note: row.get(14)?,
        status: ReservationStatus::parse(&status),
        checked_in: row.get::<_, i32>(16)? != 0,
        checkin_url: row.get(17)?,
        checkin_token: row.get(18)?,
        raw: raw_json
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or(serde_json::Value::Null),
    })
}

fn select_guests(suffix: &str) -> String {
    format!(
        "SELECT id, reservation_id, full_name, first_name, last_name, birth_date, \
         gender, nationality, document_kind, document_number, expiry_date, \
         personal_id, city_of_residence, address, raw_text, created_at \
         FROM scanned_guests {suffix}"
    )
}

fn row_to_guest(row: &rusqlite::Row) -> rusqlite::Result<ScannedGuest> {
    use innkeep_core::{DocumentKind, Gender};

    let gender: Option<String> = row.get(6)?;
    let kind: Option<String> = row.get(8)?;
    let birth: Option<String> = row.get(5)?;
    let expiry: Option<String> = row.get(10)?;

    let profile = GuestProfile {
        first_name: row.get(3)?,
        last_name: row.get(4)?,
        full_name: Some(row.get::<_, String>(2)?),
        birth_date: birth.and_then(|s| s.parse().ok()),
        gender: gender.and_then(|g| match g.as_str() {
            "M" => Some(Gender::Male),
            "F" => Some(Gender::Female),
            _ => None,
        }),
        nationality: row.get(7)?,
        document_kind: kind.and_then(|k| match k.as_str() {
            "id_card" => Some(DocumentKind::IdCard),
            "passport" => Some(DocumentKind::Passport),
            _ => None,
        }),
        document_number: row.get(9)?,
        expiry_date: expiry.and_then(|s| s.parse().ok()),
        personal_id: row.get(11)?,
        city_of_residence: row.get(12)?,
        address: row.get(13)?,
    };

    Ok(ScannedGuest {
        id: row.get(0)?,
        reservation_id: row.get(1)?,
        profile,
        raw_text: row.get(14)?,
        created_at: row.get(15)?,
    })
}

fn kind_str(kind: innkeep_core::DocumentKind) -> &'static str {
    match kind {
        innkeep_core::DocumentKind::IdCard => "id_card",
        innkeep_core::DocumentKind::Passport => "passport",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use innkeep_core::time::day_bounds;

    fn sample(id: &str, arrival_date: NaiveDate, nights: i64) -> Reservation {
        let (arrival, _) = day_bounds(arrival_date);
        let (departure, _) = day_bounds(arrival_date + chrono::Duration::days(nights));
        Reservation {
            id: id.to_string(),
            guest_name: "Ana Horvat".to_string(),
            guest_email: Some("ana@example.com".to_string()),
            guest_phone: Some("+385 91 111 2222".to_string()),
            unit_id: Some("u1".to_string()),
            unit_name: "Apartment Sunset".to_string(),
            arrival,
            departure,
            adults: 2,
            children: 0,
            total_nights: nights as u32,
            total_price: 300.0,
            currency: "EUR".to_string(),
            channel: Some("Booking.com".to_string()),
            note: None,
            status: ReservationStatus::Confirmed,
            checked_in: false,
            checkin_url: Some("https://ci.book.example/c/abc-123/999".to_string()),
            checkin_token: Some("abc-123".to_string()),
            raw: serde_json::Value::Null,
        }
    }

    #[tokio::test]
    async fn upsert_and_fetch_roundtrip() {
        let store = CacheStore::in_memory().unwrap();
        let today = chrono::Local::now().date_naive();
        let res = sample("R-1", today, 3);
        store.upsert_reservation(&res).await.unwrap();

        let fetched = store.reservation("R-1").await.unwrap().unwrap();
        assert_eq!(fetched.guest_name, "Ana Horvat");
        assert_eq!(fetched.total_nights, 3);
        assert_eq!(fetched.status, ReservationStatus::Confirmed);

        let by_token = store.reservation_by_token("abc-123").await.unwrap().unwrap();
        assert_eq!(by_token.id, "R-1");
    }

    #[tokio::test]
    async fn upsert_preserves_existing_checkin_url() {
        let store = CacheStore::in_memory().unwrap();
        let today = chrono::Local::now().date_naive();
        let first = sample("R-1", today, 2);
        store.upsert_reservation(&first).await.unwrap();

        // Second payload (list API) lacks the URL; it must survive.
        let mut second = sample("R-1", today, 2);
        second.checkin_url = None;
        second.checkin_token = None;
        store.upsert_reservation(&second).await.unwrap();

        let fetched = store.reservation("R-1").await.unwrap().unwrap();
        assert!(fetched.checkin_url.is_some());
        assert_eq!(fetched.checkin_token.as_deref(), Some("abc-123"));
    }

    #[tokio::test]
    async fn upcoming_excludes_cancelled_and_out_of_window() {
        let store = CacheStore::in_memory().unwrap();
        let today = chrono::Local::now().date_naive();

        store.upsert_reservation(&sample("in-window", today + chrono::Duration::days(2), 2))
            .await
            .unwrap();
        let mut cancelled = sample("cancelled", today + chrono::Duration::days(3), 2);
        cancelled.status = ReservationStatus::Cancelled;
        store.upsert_reservation(&cancelled).await.unwrap();
        store.upsert_reservation(&sample("far", today + chrono::Duration::days(30), 2))
            .await
            .unwrap();

        let upcoming = store.upcoming(today, 7).await.unwrap();
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].id, "in-window");
    }

    #[tokio::test]
    async fn pending_checkins_window_and_flags() {
        let store = CacheStore::in_memory().unwrap();
        let today = chrono::Local::now().date_naive();

        store.upsert_reservation(&sample("today", today, 2)).await.unwrap();
        store.upsert_reservation(&sample("tomorrow", today + chrono::Duration::days(1), 2))
            .await
            .unwrap();
        let mut no_url = sample("no-url", today, 2);
        no_url.checkin_url = None;
        no_url.checkin_token = None;
        store.upsert_reservation(&no_url).await.unwrap();
        let mut done = sample("done", today, 2);
        done.checked_in = true;
        store.upsert_reservation(&done).await.unwrap();

        let pending = store.pending_checkins(today).await.unwrap();
        let ids: Vec<_> = pending.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["today", "tomorrow"]);
    }

    #[tokio::test]
    async fn search_matches_substring() {
        let store = CacheStore::in_memory().unwrap();
        let today = chrono::Local::now().date_naive();
        store.upsert_reservation(&sample("R-1", today, 1)).await.unwrap();

        let hits = store.search("horv", 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        let miss = store.search("nobody", 10).await.unwrap();
        assert!(miss.is_empty());
    }

    #[tokio::test]
    async fn scanned_guest_lifecycle() {
        let store = CacheStore::in_memory().unwrap();
        let today = chrono::Local::now().date_naive();
        store.upsert_reservation(&sample("R-1", today, 1)).await.unwrap();

        let profile = GuestProfile {
            first_name: Some("Ivan".into()),
            last_name: Some("Kovač".into()),
            document_number: Some("112233445".into()),
            ..Default::default()
        };
        let guest_id = store.add_scanned_guest(None, &profile, "raw ocr").await.unwrap();

        let unlinked = store.recent_unlinked_guests(5).await.unwrap();
        assert_eq!(unlinked.len(), 1);
        assert_eq!(unlinked[0].profile.display_name().as_deref(), Some("Ivan Kovač"));

        store.link_guest(guest_id, "R-1").await.unwrap();
        assert!(store.recent_unlinked_guests(5).await.unwrap().is_empty());
        let linked = store.guests_for_reservation("R-1").await.unwrap();
        assert_eq!(linked.len(), 1);
        assert_eq!(linked[0].raw_text, "raw ocr");
    }

    #[tokio::test]
    async fn webhook_event_log_processing() {
        let store = CacheStore::in_memory().unwrap();
        let payload = serde_json::json!({"id": "R-9"});
        let event_id = store
            .log_webhook_event("reservation-created", Some("R-9"), &payload)
            .await
            .unwrap();

        let pending = store.unprocessed_webhooks(10).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].event_type, "reservation-created");

        store.mark_webhook_processed(event_id).await.unwrap();
        assert!(store.unprocessed_webhooks(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn stats_counts() {
        let store = CacheStore::in_memory().unwrap();
        let today = chrono::Local::now().date_naive();
        store.upsert_reservation(&sample("R-1", today, 1)).await.unwrap();
        store
            .log_webhook_event("reservation-created", Some("R-1"), &serde_json::json!({}))
            .await
            .unwrap();

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.reservations, 1);
        assert_eq!(stats.with_checkin_url, 1);
        assert_eq!(stats.webhook_events, 1);
        assert_eq!(stats.scanned_guests, 0);
    }
}
