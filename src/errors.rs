use crate::domain::auth::AccessDenied;
use crate::domain::cabinet::{RecordTimesheetEntryError, UpdateFixedCostError, ViewError};
use crate::outbound::api::error::ApiError;
use axum::Json;
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use serde::Serialize;
use thiserror::Error;

#[derive(Serialize)]
pub struct AppErrorResponse {
    code: u16,
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("auth required")]
    Unauthorized(Option<String>),

    #[error("internal server error")]
    InternalServerError,

    #[error("bad request")]
    BadRequest(Option<String>),

    #[error("user may not perform that action")]
    Forbidden,

    #[error("request path not found")]
    NotFound,

    #[error("request was rejected")]
    Rejected(Option<String>),

    #[error("back-office api unavailable")]
    BadGateway,
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Rejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BadGateway => StatusCode::BAD_GATEWAY,
        }
    }

    fn message(&self) -> Option<String> {
        match self {
            Self::Unauthorized(message) | Self::BadRequest(message) | Self::Rejected(message) => {
                message.clone()
            }
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();

        (
            status_code,
            Json(AppErrorResponse {
                code: status_code.as_u16(),
                status: self.to_string(),
                message: self.message(),
            }),
        )
            .into_response()
    }
}

pub fn internal_error<E: ToString>(err: E) -> AppError {
    tracing::error!("{}", err.to_string());
    AppError::InternalServerError
}

pub fn bad_request() -> AppError {
    AppError::BadRequest(None)
}

/// An expired back-office token ends the session; anything else the back-office does wrong is
/// reported as a gateway failure.
pub fn upstream_error(err: ApiError) -> AppError {
    match err {
        ApiError::Unauthorized => {
            AppError::Unauthorized(Some("back-office session expired".to_string()))
        }
        err => {
            tracing::error!("back-office api call failed: {}", err);
            AppError::BadGateway
        }
    }
}

impl From<AccessDenied> for AppError {
    fn from(err: AccessDenied) -> Self {
        tracing::debug!("{}", err);
        AppError::Forbidden
    }
}

impl From<ViewError> for AppError {
    fn from(err: ViewError) -> Self {
        match err {
            ViewError::Upstream(err) => upstream_error(err),
        }
    }
}

impl From<RecordTimesheetEntryError> for AppError {
    fn from(err: RecordTimesheetEntryError) -> Self {
        match err {
            RecordTimesheetEntryError::Invalid(err) => AppError::Rejected(Some(err.to_string())),
            RecordTimesheetEntryError::Upstream(err) => upstream_error(err),
        }
    }
}

impl From<UpdateFixedCostError> for AppError {
    fn from(err: UpdateFixedCostError) -> Self {
        match err {
            UpdateFixedCostError::InvalidAmount => AppError::Rejected(Some(err.to_string())),
            UpdateFixedCostError::Upstream(err) => upstream_error(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::auth::{Capability, Role};
    use crate::domain::cabinet::TimesheetEntryError;

    #[test]
    fn test_upstream_unauthorized_is_unauthorized() {
        let err = upstream_error(ApiError::Unauthorized);

        assert_eq!(StatusCode::UNAUTHORIZED, err.status_code());
    }

    #[test]
    fn test_upstream_failure_is_bad_gateway() {
        let err: AppError = ViewError::Upstream(ApiError::Status {
            status: 500,
            message: "".to_string(),
        })
        .into();

        assert_eq!(StatusCode::BAD_GATEWAY, err.status_code());
    }

    #[test]
    fn test_access_denied_is_forbidden() {
        let err: AppError = AccessDenied {
            role: Role::Collaborateur,
            capability: Capability::ViewStatistics,
        }
        .into();

        assert_eq!(StatusCode::FORBIDDEN, err.status_code());
    }

    #[test]
    fn test_invalid_entry_is_rejected_with_reason() {
        let err: AppError =
            RecordTimesheetEntryError::Invalid(TimesheetEntryError::EndNotAfterStart).into();

        assert_eq!(StatusCode::UNPROCESSABLE_ENTITY, err.status_code());
        assert_eq!(
            Some("end time must be after start time".to_string()),
            err.message()
        );
    }
}
