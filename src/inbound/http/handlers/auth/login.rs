use crate::core::application::ApplicationServices;
use crate::domain::auth::{
    AuthService, ServiceLoginError, ServiceLoginParams, ServiceProfileResult,
};
use crate::errors::{AppError, bad_request, internal_error, upstream_error};
use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;
use serde::Deserialize;
use tower_sessions::Session;

#[derive(Debug, Deserialize)]
pub(crate) struct LoginRequest {
    #[serde(alias = "email")]
    username: String,
    password: String,
}

pub async fn auth_login<S: ApplicationServices>(
    State(state): State<S>,
    session: Session,
    Json(request): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    if request.username.trim().is_empty() || request.password.is_empty() {
        return Err(bad_request());
    }

    let auth_service = state.auth_service();
    let user = auth_service
        .login(ServiceLoginParams {
            session,
            username: request.username.trim().to_string(),
            password: request.password,
        })
        .await
        .map_err(|e| match e {
            ServiceLoginError::InvalidCredentials => {
                AppError::Unauthorized(Some("invalid credentials".to_string()))
            }
            ServiceLoginError::UnknownRole(e) => {
                tracing::warn!("{}", e);
                AppError::Forbidden
            }
            ServiceLoginError::Upstream(e) => upstream_error(e),
            ServiceLoginError::SessionError(e) => internal_error(e),
        })?;

    Ok(ServiceProfileResult::from(user))
}
