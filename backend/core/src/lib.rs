pub mod error;
pub mod time;
pub mod types;

pub use error::InnkeepError;
pub use types::{DocumentKind, Gender, GuestProfile, Reservation, ReservationStatus};
