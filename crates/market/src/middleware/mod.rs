//! HTTP middleware stack.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Session layer (tower-sessions with in-memory store)
//! 5. Rate limiting on `/auth` (governor)

pub mod rate_limit;
pub mod request_id;
pub mod session;

pub use rate_limit::auth_rate_limiter;
pub use request_id::request_id_middleware;
pub use session::{Shopper, create_session_layer};
