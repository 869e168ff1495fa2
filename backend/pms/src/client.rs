//! HTTP client for the PMS REST API.
//!
//! Authentication is a static `apikey` header; responses wrap collections in
//! a `data` envelope and report failures as JSON bodies with a `message`
//! field.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use innkeep_core::Reservation;

use crate::parse;
use crate::types::{GuestAddOutcome, InvoiceItemDraft, NewGuest, ReservationQuery};

#[derive(Debug, Error)]
pub enum PmsError {
    #[error("PMS API error ({status}): {message}")]
    Api {
        status: u16,
        message: String,
        body: Option<Value>,
    },

    #[error("PMS transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Numeric id + display name pair used by enum endpoints (countries,
/// travel document types).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: i64,
    pub name: String,
}

pub struct PmsClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl PmsClient {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    async fn request(
        &self,
        method: reqwest::Method,
        path: &str,
        query: &[(String, String)],
        body: Option<&Value>,
    ) -> Result<Value, PmsError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(method = %method, url = %url, "PMS request");

        let mut req = self
            .http
            .request(method, &url)
            .header("apikey", &self.api_key)
            .header("Accept", "application/json");
        if !query.is_empty() {
            req = req.query(query);
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        let resp = req.send().await?;
        let status = resp.status();
        let payload: Value = resp.json().await.unwrap_or(Value::Null);

        if !status.is_success() {
            let message = payload
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("Unknown error")
                .to_string();
            return Err(PmsError::Api {
                status: status.as_u16(),
                message,
                body: Some(payload),
            });
        }

        debug!(status = status.as_u16(), "PMS response");
        Ok(payload)
    }

    fn data_array(payload: Value) -> Vec<Value> {
        match payload.get("data") {
            Some(Value::Array(items)) => items.clone(),
            _ => Vec::new(),
        }
    }

    // ------------------------------------------------------------------
    // Properties
    // ------------------------------------------------------------------

    pub async fn properties(&self) -> Result<Vec<Value>, PmsError> {
        let payload = self
            .request(reqwest::Method::GET, "/properties", &[], None)
            .await?;
        Ok(Self::data_array(payload))
    }

    // ------------------------------------------------------------------
    // Reservations
    // ------------------------------------------------------------------

    /// Fetch reservations matching the query, parsed into domain records.
    /// Payloads that cannot be parsed are skipped.
    pub async fn reservations(
        &self,
        query: &ReservationQuery,
    ) -> Result<Vec<Reservation>, PmsError> {
        let payload = self
            .request(reqwest::Method::GET, "/reservations", &query.to_pairs(), None)
            .await?;
        Ok(Self::data_array(payload)
            .iter()
            .filter_map(parse::reservation_from_api)
            .collect())
    }

    /// Detailed reservation payload, including the holder sub-object.
    pub async fn reservation_details(&self, id: &str) -> Result<Value, PmsError> {
        self.request(
            reqwest::Method::GET,
            &format!("/reservations/{id}/details"),
            &[],
            None,
        )
        .await
    }

    pub async fn reservation_guests(&self, id: &str) -> Result<Vec<Value>, PmsError> {
        let payload = self
            .request(
                reqwest::Method::GET,
                &format!("/reservations/{id}/guests"),
                &[],
                None,
            )
            .await?;
        Ok(Self::data_array(payload))
    }

    /// Register guests against a reservation. The response lists which
    /// guests were actually added plus any per-guest messages.
    pub async fn add_reservation_guests(
        &self,
        id: &str,
        guests: &[NewGuest],
    ) -> Result<GuestAddOutcome, PmsError> {
        let body = serde_json::json!({ "guests": guests });
        let payload = self
            .request(
                reqwest::Method::POST,
                &format!("/reservations/{id}/guests"),
                &[],
                Some(&body),
            )
            .await?;
        Ok(GuestAddOutcome::from_payload(&payload))
    }

    pub async fn check_in(&self, id: &str) -> Result<Value, PmsError> {
        self.request(
            reqwest::Method::PUT,
            &format!("/reservations/{id}/checkin"),
            &[],
            None,
        )
        .await
    }

    pub async fn check_out(&self, id: &str) -> Result<Value, PmsError> {
        self.request(
            reqwest::Method::PUT,
            &format!("/reservations/{id}/checkout"),
            &[],
            None,
        )
        .await
    }

    // ------------------------------------------------------------------
    // Invoices
    // ------------------------------------------------------------------

    pub async fn invoices_for_reservation(&self, id: &str) -> Result<Vec<Value>, PmsError> {
        let payload = self
            .request(
                reqwest::Method::GET,
                &format!("/reservations/{id}/invoices"),
                &[],
                None,
            )
            .await?;
        Ok(Self::data_array(payload))
    }

    pub async fn invoice_details(&self, invoice_id: &str) -> Result<Value, PmsError> {
        self.request(
            reqwest::Method::GET,
            &format!("/invoices/{invoice_id}"),
            &[],
            None,
        )
        .await
    }

    /// Add a line item to the reservation's draft invoice (created
    /// implicitly by the PMS when none exists).
    pub async fn add_invoice_item(
        &self,
        reservation_id: &str,
        item: &InvoiceItemDraft,
    ) -> Result<Value, PmsError> {
        let body = serde_json::to_value(item).unwrap_or(Value::Null);
        self.request(
            reqwest::Method::POST,
            &format!("/reservations/{reservation_id}/invoices/items"),
            &[],
            Some(&body),
        )
        .await
    }

    // ------------------------------------------------------------------
    // Enums & guests in house
    // ------------------------------------------------------------------

    pub async fn countries(&self) -> Result<Vec<CatalogEntry>, PmsError> {
        let payload = self
            .request(reqwest::Method::GET, "/countries", &[], None)
            .await?;
        Ok(Self::data_array(payload)
            .into_iter()
            .filter_map(|v| serde_json::from_value(v).ok())
            .collect())
    }

    pub async fn document_types(&self) -> Result<Vec<CatalogEntry>, PmsError> {
        let payload = self
            .request(reqwest::Method::GET, "/travel-document-types", &[], None)
            .await?;
        Ok(Self::data_array(payload)
            .into_iter()
            .filter_map(|v| serde_json::from_value(v).ok())
            .collect())
    }

    pub async fn checked_in_guests(
        &self,
        property_id: &str,
        date_from: &str,
        date_to: &str,
    ) -> Result<Vec<Value>, PmsError> {
        let payload = self
            .request(
                reqwest::Method::GET,
                &format!("/properties/{property_id}/guests/checked-in"),
                &[
                    ("dateFrom".to_string(), date_from.to_string()),
                    ("dateTo".to_string(), date_to.to_string()),
                ],
                None,
            )
            .await?;
        Ok(Self::data_array(payload))
    }
}
