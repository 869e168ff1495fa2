pub mod server;
pub mod webhook;

pub use server::{build_router, start_server, GatewayState};
