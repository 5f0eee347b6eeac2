use crate::core::application::ApplicationServices;
use crate::domain::auth::{AuthService, ServiceLogoutError, ServiceLogoutParams};
use crate::errors::{AppError, internal_error};
use axum::extract::State;
use axum::response::IntoResponse;
use http::StatusCode;
use tower_sessions::Session;

pub async fn auth_logout<S: ApplicationServices>(
    State(state): State<S>,
    session: Session,
) -> Result<impl IntoResponse, AppError> {
    let auth_service = state.auth_service();

    auth_service
        .logout(ServiceLogoutParams { session })
        .await
        .map_err(|e| match e {
            ServiceLogoutError::SessionError(e) => internal_error(e),
        })?;

    Ok(StatusCode::NO_CONTENT)
}
