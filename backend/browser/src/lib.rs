pub mod checkin_url;
pub mod form_filler;

pub use form_filler::{FillReport, FormFiller};
