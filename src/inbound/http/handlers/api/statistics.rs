use crate::core::application::ApplicationServices;
use crate::domain::auth::{Capability, CurrentUser};
use crate::domain::cabinet::{CabinetService, StatisticsKind, StatisticsParams};
use crate::errors::AppError;
use crate::inbound::http::responses::shared::{DataResponse, ResponseType};
use axum::Extension;
use axum::extract::{Path, State};
use axum::response::IntoResponse;

pub async fn statistics<S: ApplicationServices>(
    State(state): State<S>,
    Extension(user): Extension<CurrentUser>,
    Path(kind): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    user.require(Capability::ViewStatistics)?;
    let kind = kind.parse::<StatisticsKind>().map_err(|e| {
        tracing::debug!("{}", e);
        AppError::NotFound
    })?;

    let statistics = state
        .cabinet_service()
        .statistics(StatisticsParams { user, kind })
        .await?;

    Ok(DataResponse::new(ResponseType::Statistics, statistics))
}
