use crate::core::application::ApplicationServices;
use crate::domain::auth::{Capability, CurrentUser};
use crate::domain::cabinet::{CabinetService, DashboardParams};
use crate::errors::AppError;
use crate::inbound::http::responses::shared::{DataResponse, ResponseType};
use axum::Extension;
use axum::extract::State;
use axum::response::IntoResponse;

pub async fn dashboard<S: ApplicationServices>(
    State(state): State<S>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, AppError> {
    user.require(Capability::ViewDashboard)?;

    let result = state
        .cabinet_service()
        .dashboard(DashboardParams { user })
        .await?;

    Ok(DataResponse::new(ResponseType::Dashboard, result))
}
