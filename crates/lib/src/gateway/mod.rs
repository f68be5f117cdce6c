//! Gateway: the HTTP surface LINE delivers webhooks to.
//!
//! Single port serves `POST /callback` (signed event batches) and `GET /` (health).

mod server;

pub use server::{build_app, build_state, run_gateway, GatewayState};
