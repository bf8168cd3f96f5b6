//! HTTP control API for the queue worker.
//!
//! ## Endpoints
//!
//! - `GET /api/health` - Health check
//! - `POST /api/worker/start` - Start the worker (`{"mode": "..."}` optional)
//! - `POST /api/worker/stop` - Ask the running worker to stop
//! - `GET /api/worker/status` - Status snapshot as JSON
//! - `GET /api/worker/status/text` - Status snapshot as plain text

mod routes;
pub mod types;

pub use routes::{router, serve, AppState};
pub use types::*;
