use crate::core::application::ApplicationServices;
use crate::domain::auth::{Capability, CurrentUser};
use crate::domain::cabinet::{CabinetService, FixedCostCategory, UpdateFixedCostParams};
use crate::errors::AppError;
use crate::inbound::http::responses::shared::{DataResponse, ResponseType};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::{Extension, Json};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct FixedCostBody {
    value: f64,
}

pub async fn update_fixed_cost<S: ApplicationServices>(
    State(state): State<S>,
    Extension(user): Extension<CurrentUser>,
    Path(category): Path<String>,
    Json(body): Json<FixedCostBody>,
) -> Result<impl IntoResponse, AppError> {
    user.require(Capability::ManageFixedCosts)?;
    let category = category.parse::<FixedCostCategory>().map_err(|e| {
        tracing::debug!("{}", e);
        AppError::NotFound
    })?;

    let fixed_costs = state
        .cabinet_service()
        .update_fixed_cost(UpdateFixedCostParams {
            user,
            category,
            amount: body.value,
        })
        .await?;

    Ok(DataResponse::new(ResponseType::FixedCosts, fixed_costs))
}
