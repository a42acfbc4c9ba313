//! Order lifecycle
//!
//! Status moves through a fixed graph:
//!
//! ```text
//! PENDING ──> PREPARING ──> COMPLETED
//!    │            │
//!    └────────────┴──────> CANCELED (reason required)
//! ```
//!
//! `paid` and `is_locked` are independent of the status and are set together
//! by marking the order as paid. Every mutation goes through [`OrderState`]
//! before it touches the database.

mod lifecycle;
mod status;

pub use lifecycle::{LifecycleError, MAX_CANCEL_REASON_LEN, OrderState};
pub use status::{OrderSource, OrderStatus, UnknownValue};
