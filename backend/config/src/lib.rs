pub mod env;
pub mod redact;
pub mod schema;
pub mod validation;

pub use env::from_env;
pub use redact::redacted;
pub use schema::InnkeepConfig;
pub use validation::validate;
