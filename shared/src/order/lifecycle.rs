use thiserror::Error;

use super::status::OrderStatus;
use crate::error::{AppError, ErrorCode};

/// Longest cancel reason accepted, in characters
pub const MAX_CANCEL_REASON_LEN: usize = 500;

/// Lifecycle-relevant part of an order row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderState {
    pub status: OrderStatus,
    pub paid: bool,
    pub is_locked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("Cannot change status from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("A reason is required to cancel an order")]
    ReasonRequired,

    #[error("Cancel reason exceeds {MAX_CANCEL_REASON_LEN} characters")]
    ReasonTooLong,

    #[error("Order has already been paid")]
    AlreadyPaid,

    #[error("Order is locked")]
    Locked,

    #[error("Order is {0}")]
    Closed(OrderStatus),
}

impl From<LifecycleError> for AppError {
    fn from(err: LifecycleError) -> Self {
        let message = err.to_string();
        match err {
            LifecycleError::InvalidTransition { from, to } => {
                AppError::with_message(ErrorCode::InvalidStatusTransition, message)
                    .with_detail("from", from.as_str())
                    .with_detail("to", to.as_str())
            }
            LifecycleError::ReasonRequired => {
                AppError::new(ErrorCode::CancelReasonRequired).with_detail("field", "reason")
            }
            LifecycleError::ReasonTooLong => {
                AppError::with_message(ErrorCode::ValueOutOfRange, message)
                    .with_detail("field", "reason")
            }
            LifecycleError::AlreadyPaid => AppError::new(ErrorCode::OrderAlreadyPaid),
            LifecycleError::Locked => AppError::new(ErrorCode::OrderLocked),
            LifecycleError::Closed(status) => {
                AppError::with_message(ErrorCode::OrderClosed, message)
                    .with_detail("status", status.as_str())
            }
        }
    }
}

impl OrderState {
    /// A freshly placed order
    pub const fn new() -> Self {
        Self {
            status: OrderStatus::Pending,
            paid: false,
            is_locked: false,
        }
    }

    /// Validate a status change and return the new state plus the cancel
    /// reason to store (trimmed, only for cancellation).
    pub fn check_status_change(
        &self,
        next: OrderStatus,
        reason: Option<&str>,
    ) -> Result<(OrderState, Option<String>), LifecycleError> {
        if !self.status.can_transition_to(next) {
            return Err(LifecycleError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }

        let reason = if next == OrderStatus::Canceled {
            let reason = reason.map(str::trim).unwrap_or_default();
            if reason.is_empty() {
                return Err(LifecycleError::ReasonRequired);
            }
            if reason.chars().count() > MAX_CANCEL_REASON_LEN {
                return Err(LifecycleError::ReasonTooLong);
            }
            Some(reason.to_string())
        } else {
            None
        };

        Ok((
            OrderState {
                status: next,
                ..*self
            },
            reason,
        ))
    }

    /// Marking as paid sets both flags. Completed orders can still be paid.
    pub fn check_mark_paid(&self) -> Result<OrderState, LifecycleError> {
        if self.paid {
            return Err(LifecycleError::AlreadyPaid);
        }
        if self.status == OrderStatus::Canceled {
            return Err(LifecycleError::Closed(self.status));
        }
        Ok(OrderState {
            paid: true,
            is_locked: true,
            ..*self
        })
    }

    pub fn check_items_editable(&self) -> Result<(), LifecycleError> {
        if self.is_locked {
            return Err(LifecycleError::Locked);
        }
        if self.status.is_terminal() {
            return Err(LifecycleError::Closed(self.status));
        }
        Ok(())
    }
}

impl Default for OrderState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(status: OrderStatus, paid: bool) -> OrderState {
        OrderState {
            status,
            paid,
            is_locked: paid,
        }
    }

    #[test]
    fn happy_path() {
        let s = OrderState::new();
        let (s, reason) = s.check_status_change(OrderStatus::Preparing, None).unwrap();
        assert_eq!(s.status, OrderStatus::Preparing);
        assert!(reason.is_none());

        let (s, _) = s.check_status_change(OrderStatus::Completed, None).unwrap();
        assert_eq!(s.status, OrderStatus::Completed);

        let s = s.check_mark_paid().unwrap();
        assert!(s.paid && s.is_locked);
        assert_eq!(s.status, OrderStatus::Completed);
    }

    #[test]
    fn cannot_skip_or_repeat() {
        let s = OrderState::new();
        assert_eq!(
            s.check_status_change(OrderStatus::Completed, None),
            Err(LifecycleError::InvalidTransition {
                from: OrderStatus::Pending,
                to: OrderStatus::Completed
            })
        );
        assert!(s.check_status_change(OrderStatus::Pending, None).is_err());
    }

    #[test]
    fn terminal_states_are_final() {
        for status in [OrderStatus::Completed, OrderStatus::Canceled] {
            let s = state(status, false);
            for next in [
                OrderStatus::Pending,
                OrderStatus::Preparing,
                OrderStatus::Completed,
                OrderStatus::Canceled,
            ] {
                assert!(s.check_status_change(next, Some("late")).is_err());
            }
        }
    }

    #[test]
    fn cancel_requires_reason() {
        let s = state(OrderStatus::Preparing, false);
        assert_eq!(
            s.check_status_change(OrderStatus::Canceled, None),
            Err(LifecycleError::ReasonRequired)
        );
        assert_eq!(
            s.check_status_change(OrderStatus::Canceled, Some("   ")),
            Err(LifecycleError::ReasonRequired)
        );
        let long = "x".repeat(MAX_CANCEL_REASON_LEN + 1);
        assert_eq!(
            s.check_status_change(OrderStatus::Canceled, Some(&long)),
            Err(LifecycleError::ReasonTooLong)
        );

        let (next, reason) = s
            .check_status_change(OrderStatus::Canceled, Some("  out of stock "))
            .unwrap();
        assert_eq!(next.status, OrderStatus::Canceled);
        assert_eq!(reason.as_deref(), Some("out of stock"));
    }

    #[test]
    fn paid_order_can_still_progress() {
        let s = state(OrderStatus::Pending, true);
        let (s, _) = s.check_status_change(OrderStatus::Preparing, None).unwrap();
        assert!(s.paid && s.is_locked);
    }

    #[test]
    fn mark_paid_rules() {
        assert_eq!(
            state(OrderStatus::Pending, true).check_mark_paid(),
            Err(LifecycleError::AlreadyPaid)
        );
        assert_eq!(
            state(OrderStatus::Canceled, false).check_mark_paid(),
            Err(LifecycleError::Closed(OrderStatus::Canceled))
        );
    }

    #[test]
    fn locked_orders_reject_item_edits() {
        assert_eq!(OrderState::new().check_items_editable(), Ok(()));
        assert_eq!(
            state(OrderStatus::Pending, true).check_items_editable(),
            Err(LifecycleError::Locked)
        );
        assert_eq!(
            state(OrderStatus::Completed, false).check_items_editable(),
            Err(LifecycleError::Closed(OrderStatus::Completed))
        );
    }

    #[test]
    fn app_error_codes() {
        let err: AppError = LifecycleError::Locked.into();
        assert_eq!(err.code, ErrorCode::OrderLocked);
        assert_eq!(err.http_status(), http::StatusCode::CONFLICT);

        let err: AppError = LifecycleError::ReasonRequired.into();
        assert_eq!(err.code, ErrorCode::CancelReasonRequired);
        assert_eq!(err.http_status(), http::StatusCode::BAD_REQUEST);

        let err: AppError = LifecycleError::InvalidTransition {
            from: OrderStatus::Pending,
            to: OrderStatus::Completed,
        }
        .into();
        assert_eq!(err.message, "Cannot change status from PENDING to COMPLETED");
    }
}
