//! HTTP middleware stack for the API.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, transactions)
//! 2. `TraceLayer` (request span)
//! 3. Security headers
//! 4. CORS (answers every `OPTIONS` as a preflight)
//! 5. Rate limiting (fixed window per client)
//! 6. Request ID (echo or generate, record in span and Sentry scope)
//! 7. Panic catcher (converts panics to the global error response)

pub mod cors;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;

pub use cors::cors_layer;
pub use rate_limit::{RateLimiter, client_ip, rate_limit_middleware, rate_limiter};
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
pub use security_headers::security_headers_middleware;
