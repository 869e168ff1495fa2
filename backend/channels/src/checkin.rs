//! Per-chat check-in flow state.
//!
//! The flow is: operator sends document photos (any number), continues to
//! reservation selection, picks one, and the guests are registered against
//! it. State lives in memory per chat; a restart simply restarts the flow.

use std::collections::HashMap;

use innkeep_core::Reservation;
use innkeep_docscan::ScanOutcome;

#[derive(Debug, Default, Clone, PartialEq)]
pub enum SessionState {
    /// Waiting for document photos.
    #[default]
    CollectingDocuments,
    /// Photos collected; waiting for the operator to pick a reservation.
    SelectingReservation,
    /// Waiting for a free-text invoice line (`description, price, qty`).
    AwaitingInvoiceItem { reservation_id: String },
}

#[derive(Debug, Default)]
pub struct CheckinSession {
    pub state: SessionState,
    pub guests: Vec<ScanOutcome>,
    /// Candidate reservations shown as buttons, keyed by id.
    pub candidates: HashMap<String, Reservation>,
    /// Set once guests were registered, for follow-up invoicing.
    pub completed: Option<Reservation>,
}

impl CheckinSession {
    /// Add a scanned guest; returns the running count.
    pub fn add_guest(&mut self, outcome: ScanOutcome) -> usize {
        self.guests.push(outcome);
        self.guests.len()
    }
}

/// Callback-data tags used by the inline keyboards.
pub mod callback {
    pub const CONTINUE: &str = "ci:continue";
    pub const CANCEL: &str = "ci:cancel";
    pub const DONE: &str = "ci:done";
    pub const RESERVATION_PREFIX: &str = "ci:res:";
    pub const CHECKIN_INVOICE_PREFIX: &str = "ci:invoice:";
    pub const INVOICE_ADD_PREFIX: &str = "inv:add:";
    pub const INVOICE_DETAILS_PREFIX: &str = "inv:details:";
    pub const INVOICE_DONE: &str = "inv:done";
}

#[cfg(test)]
mod tests {
    use super::*;
    use innkeep_core::GuestProfile;
    use innkeep_docscan::ExtractionMethod;

    fn outcome(name: &str) -> ScanOutcome {
        ScanOutcome {
            profile: GuestProfile {
                full_name: Some(name.to_string()),
                document_number: Some("112233445".to_string()),
                ..Default::default()
            },
            method: ExtractionMethod::Mrz,
            raw_text: String::new(),
        }
    }

    #[test]
    fn counts_guests() {
        let mut session = CheckinSession::default();
        assert_eq!(session.add_guest(outcome("Ana")), 1);
        assert_eq!(session.add_guest(outcome("Ivan")), 2);
        assert_eq!(session.state, SessionState::CollectingDocuments);
    }
}
