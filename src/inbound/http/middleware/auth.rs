use crate::core::application::ApplicationServices;
use crate::domain::auth::{AuthService, ServiceCurrentUserError, ServiceCurrentUserParams};
use crate::errors::AppError;
use axum::extract::{FromRequestParts, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use tower_sessions::Session;

/// Loads the signed-in user once per request and hands it to handlers as an
/// `Extension<CurrentUser>`.
pub async fn auth<S: ApplicationServices>(
    State(state): State<S>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_service = state.auth_service();
    let (mut parts, body) = req.into_parts();
    let session = Session::from_request_parts(&mut parts, &state)
        .await
        .map_err(|_e| AppError::InternalServerError)?;

    let user = auth_service
        .current_user(ServiceCurrentUserParams { session })
        .await
        .map_err(|e| match e {
            ServiceCurrentUserError::SessionError(_) => AppError::Unauthorized(None),
        })?
        .ok_or(AppError::Unauthorized(None))?;

    let mut req = Request::from_parts(parts, body);
    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}
