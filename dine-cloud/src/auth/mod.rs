//! Session authentication, dashboard gate and rate limiting

pub mod dashboard;
pub mod rate_limit;
pub mod session;

pub use session::SessionIdentity;
