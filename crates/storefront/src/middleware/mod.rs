//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request span with status and latency)
//! 3. Request ID (recorded into the request span)
//! 4. Session layer (tower-sessions with the in-memory store)

pub mod request_id;
pub mod session;
pub mod shopper;

pub use request_id::request_id_middleware;
pub use session::{SESSION_COOKIE_NAME, create_session_layer};
pub use shopper::{OptionalShopper, SessionUnavailable};
