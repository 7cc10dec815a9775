//! HTTP API for the web front-end
//!
//! - POST /sessions - Create a session
//! - POST /analyze - Classify images into the caller's session
//! - GET /analyze/live?url= - Classify one image for the live feed
//! - GET /history?session_id= - Session history
//! - GET /history/live - Live feed history
//! - GET /history/stats - Combined counts
//! - POST /admin/sessions/cleanup - Sweep expired sessions now
//! - GET /admin/stats - Per-session details
//! - GET /health - Health check
//! - GET /static/uploads/* - Analyzed images

mod handlers;
mod routes;
mod state;

pub use handlers::SESSION_HEADER;
pub use routes::{create_router, UPLOADS_ROUTE};
pub use state::AppState;
