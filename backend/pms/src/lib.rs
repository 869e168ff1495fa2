pub mod client;
pub mod country;
pub mod document_types;
pub mod parse;
pub mod schedule;
pub mod types;

pub use client::{CatalogEntry, PmsClient, PmsError};
pub use country::CountryMapper;
pub use document_types::DocumentTypeCatalog;
pub use types::{GuestAddOutcome, InvoiceItemDraft, InvoiceTax, NewGuest, ReservationQuery};
