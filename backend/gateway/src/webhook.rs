//! PMS webhook intake.
//!
//! Deliveries arrive either enveloped (`{token, event: {type, id, payload}}`)
//! or as a bare reservation object, depending on the event generation. Every
//! delivery is logged to the event table before any processing, so nothing
//! is lost to a parse bug. The endpoint answers 200 even for payloads it
//! cannot use, since a non-2xx makes the PMS retry-storm.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};
use tracing::{info, warn};

use innkeep_core::time::format_epoch_date;
use innkeep_core::Reservation;
use innkeep_pms::parse::reservation_from_webhook;

use crate::server::GatewayState;

/// Event type and payload pulled out of a delivery.
pub fn unwrap_event(body: &Value) -> (String, Value) {
    if let Some(event) = body.get("event") {
        let event_type = event
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string();
        let payload = event.get("payload").cloned().unwrap_or_else(|| body.clone());
        return (event_type, payload);
    }

    // Bare payloads carry no type; infer from shape.
    let looks_like_reservation =
        body.get("id").is_some() && (body.get("guestName").is_some() || body.get("guest_name").is_some());
    let event_type = if looks_like_reservation {
        "reservation-created".to_string()
    } else {
        "unknown".to_string()
    };
    (event_type, body.clone())
}

fn delivery_token(body: &Value) -> Option<&str> {
    body.get("token").and_then(Value::as_str)
}

fn notification_text(res: &Reservation) -> String {
    let mut text = format!(
        "🆕 *New reservation!*\n\n👤 {}\n🏠 {}\n📅 {} → {}\n👥 {} adults{}\n💰 {:.0} {}\n📱 {}",
        res.guest_name,
        res.unit_name,
        format_epoch_date(res.arrival),
        format_epoch_date(res.departure),
        res.adults,
        if res.children > 0 { format!(" + {} children", res.children) } else { String::new() },
        res.total_price,
        res.currency,
        res.channel.as_deref().unwrap_or("Direct"),
    );
    if res.checkin_url.is_some() {
        text.push_str("\n🔗 Online check-in URL saved!");
    }
    if let Some(phone) = &res.guest_phone {
        text.push_str(&format!("\n📞 {phone}"));
    }
    text
}

pub async fn receive_pms_webhook(
    State(state): State<GatewayState>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if let Some(expected) = &state.webhook_token {
        if delivery_token(&body) != Some(expected.as_str()) {
            warn!("Webhook rejected: bad or missing token");
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({"status": "unauthorized"})),
            );
        }
    }

    let (event_type, payload) = unwrap_event(&body);
    let reservation = reservation_from_webhook(&payload);
    let reservation_id = reservation.as_ref().map(|r| r.id.clone());

    let event_id = match state
        .store
        .log_webhook_event(&event_type, reservation_id.as_deref(), &payload)
        .await
    {
        Ok(id) => Some(id),
        Err(e) => {
            warn!(error = %e, "Could not log webhook event");
            None
        }
    };

    let Some(res) = reservation else {
        info!(event_type, "Webhook had no usable reservation payload");
        return (StatusCode::OK, Json(json!({"status": "ignored"})));
    };

    info!(
        event_type,
        reservation = %res.id,
        guest = %res.guest_name,
        "Webhook reservation received"
    );

    if let Err(e) = state.store.upsert_reservation(&res).await {
        warn!(error = %e, reservation = %res.id, "Could not cache reservation");
        return (StatusCode::OK, Json(json!({"status": "store_error"})));
    }
    if let Some(event_id) = event_id {
        state.store.mark_webhook_processed(event_id).await.ok();
    }

    if event_type.contains("created") {
        if let Some(notices) = &state.notices {
            if notices.send(notification_text(&res)).await.is_err() {
                warn!("Operator notice channel closed");
            }
        }
    }

    (
        StatusCode::OK,
        Json(json!({"status": "ok", "reservationId": res.id})),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use innkeep_store::CacheStore;
    use tokio::sync::mpsc;

    fn state(
        token: Option<&str>,
        notices: Option<mpsc::Sender<String>>,
    ) -> GatewayState {
        GatewayState {
            store: Arc::new(CacheStore::in_memory().unwrap()),
            webhook_token: token.map(str::to_string),
            notices,
        }
    }

    fn enveloped() -> Value {
        json!({
            "token": "secret",
            "event": {
                "type": "reservation-created",
                "id": "evt-1",
                "payload": {
                    "id": "R-42",
                    "guestName": "Ana Horvat",
                    "unitName": "Sunset",
                    "arrivalDate": 1714521600,
                    "departureDate": 1714780800,
                    "adults": 2,
                    "onlineCheckInUrl": "https://ci.book.rentl.io/c/ab-12-cd/777",
                    "totalPrice": 450.0
                }
            }
        })
    }

    #[test]
    fn unwraps_enveloped_events() {
        let (event_type, payload) = unwrap_event(&enveloped());
        assert_eq!(event_type, "reservation-created");
        assert_eq!(payload["id"], "R-42");
    }

    #[test]
    fn infers_type_for_bare_reservations() {
        let (event_type, _) = unwrap_event(&json!({"id": "R-1", "guestName": "x"}));
        assert_eq!(event_type, "reservation-created");
        let (event_type, _) = unwrap_event(&json!({"something": "else"}));
        assert_eq!(event_type, "unknown");
    }

    #[tokio::test]
    async fn stores_reservation_and_notifies() {
        let (tx, mut rx) = mpsc::channel(4);
        let state = state(Some("secret"), Some(tx));
        let store = state.store.clone();

        let (status, _) = receive_pms_webhook(State(state), Json(enveloped())).await;
        assert_eq!(status, StatusCode::OK);

        let cached = store.reservation("R-42").await.unwrap().unwrap();
        assert_eq!(cached.guest_name, "Ana Horvat");
        assert_eq!(cached.checkin_token.as_deref(), Some("ab-12-cd"));

        let notice = rx.recv().await.unwrap();
        assert!(notice.contains("New reservation"));
        assert!(notice.contains("Ana Horvat"));

        // Logged and marked processed.
        assert!(store.unprocessed_webhooks(10).await.unwrap().is_empty());
        assert_eq!(store.stats().await.unwrap().webhook_events, 1);
    }

    #[tokio::test]
    async fn rejects_bad_token() {
        let state = state(Some("secret"), None);
        let mut body = enveloped();
        body["token"] = json!("wrong");
        let (status, _) = receive_pms_webhook(State(state), Json(body)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unusable_payload_still_answers_ok() {
        let state = state(None, None);
        let store = state.store.clone();
        let (status, _) =
            receive_pms_webhook(State(state), Json(json!({"ping": true}))).await;
        assert_eq!(status, StatusCode::OK);
        // Still logged for inspection.
        assert_eq!(store.stats().await.unwrap().webhook_events, 1);
    }
}
