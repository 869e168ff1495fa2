pub mod digest;

pub use digest::{DigestRequest, DigestScheduler};
