//! Unified service-layer error type for dine-cloud
//!
//! `ServiceError` bridges the gap between DB-layer errors (`sqlx::Error`, `BoxError`)
//! and the API-layer error (`AppError`). It enables `?` propagation without manual
//! `.map_err(|e| { tracing::error!(...); AppError::new(...) })` boilerplate.

use axum::response::IntoResponse;
use shared::error::{AppError, ErrorCode};
use shared::menu::LayoutError;
use shared::order::LifecycleError;

use crate::BoxError;

/// Service-layer error
///
/// - `Db`: Database/infrastructure errors (auto-logged, mapped to InternalError)
/// - `App`: Business-rule errors (transparent pass-through to client)
#[derive(Debug)]
pub enum ServiceError {
    /// Database or infrastructure error (sqlx, serde, io, etc.)
    Db(BoxError),
    /// Business-rule error (already an AppError with the correct ErrorCode)
    App(AppError),
}

impl From<sqlx::Error> for ServiceError {
    fn from(e: sqlx::Error) -> Self {
        ServiceError::Db(e.into())
    }
}

impl From<BoxError> for ServiceError {
    fn from(e: BoxError) -> Self {
        ServiceError::Db(e)
    }
}

impl From<AppError> for ServiceError {
    fn from(e: AppError) -> Self {
        ServiceError::App(e)
    }
}

impl From<LifecycleError> for ServiceError {
    fn from(e: LifecycleError) -> Self {
        ServiceError::App(e.into())
    }
}

impl From<LayoutError> for ServiceError {
    fn from(e: LayoutError) -> Self {
        ServiceError::App(e.into())
    }
}

impl From<ServiceError> for AppError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::App(app_err) => app_err,
            ServiceError::Db(db_err) => {
                tracing::error!(error = %db_err, "Service database error");
                AppError::new(ErrorCode::InternalError)
            }
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> axum::response::Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

/// Convenience type alias for service-layer results
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Name of the violated unique constraint when `err` is a unique violation.
pub fn unique_violation(err: &sqlx::Error) -> Option<&str> {
    match err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            Some(db.constraint().unwrap_or_default())
        }
        _ => None,
    }
}

/// Report a unique violation as `code`, anything else as an infrastructure error.
pub fn conflict_on_unique(err: sqlx::Error, code: ErrorCode) -> ServiceError {
    if unique_violation(&err).is_some() {
        ServiceError::App(AppError::new(code))
    } else {
        err.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_errors_become_internal() {
        let err: ServiceError = sqlx::Error::RowNotFound.into();
        let app: AppError = err.into();
        assert_eq!(app.code, ErrorCode::InternalError);
    }

    #[test]
    fn app_errors_pass_through() {
        let err: ServiceError = AppError::new(ErrorCode::OrderLocked).into();
        let app: AppError = err.into();
        assert_eq!(app.code, ErrorCode::OrderLocked);
    }

    #[test]
    fn non_unique_errors_stay_infrastructure() {
        let err = conflict_on_unique(sqlx::Error::PoolTimedOut, ErrorCode::TableNameExists);
        assert!(matches!(err, ServiceError::Db(_)));
    }

    #[test]
    fn service_error_response_status() {
        let response = ServiceError::App(AppError::new(ErrorCode::MenuNotFound)).into_response();
        assert_eq!(response.status(), axum::http::StatusCode::NOT_FOUND);

        let response = ServiceError::Db("connection reset".into()).into_response();
        assert_eq!(response.status(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    }
}
