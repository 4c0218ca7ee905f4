//! Gateway: HTTP front door for the relay.
//!
//! Single port serves a health probe (`GET /`) and the message endpoint (`POST /api/message`).

mod server;

pub use server::{router, run_gateway, GatewayState};
