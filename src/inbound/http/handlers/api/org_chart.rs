use crate::core::application::ApplicationServices;
use crate::domain::auth::{Capability, CurrentUser};
use crate::domain::cabinet::{CabinetService, OrgChartParams, Position, SaveNodePositionParams};
use crate::errors::AppError;
use crate::inbound::http::responses::shared::{DataResponse, ResponseType};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::{Extension, Json};
use http::StatusCode;

pub async fn org_chart<S: ApplicationServices>(
    State(state): State<S>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, AppError> {
    user.require(Capability::ViewOrgChart)?;

    let graph = state
        .cabinet_service()
        .org_chart(OrgChartParams { user })
        .await?;

    Ok(DataResponse::new(ResponseType::OrgChart, graph))
}

/// Stores where the user dropped a node. The write happens in the background and the
/// response does not wait for it.
pub async fn save_org_chart_position<S: ApplicationServices>(
    State(state): State<S>,
    Extension(user): Extension<CurrentUser>,
    Path(node_id): Path<String>,
    Json(position): Json<Position>,
) -> Result<impl IntoResponse, AppError> {
    user.require(Capability::ViewOrgChart)?;

    let cabinet_service = state.cabinet_service();
    let params = SaveNodePositionParams {
        user_id: user.user_id,
        node_id,
        position,
    };

    tokio::spawn(async move {
        let node_id = params.node_id.clone();
        if let Err(e) = cabinet_service.save_node_position(params).await {
            tracing::error!(node_id = %node_id, "failed to save org chart position: {}", e);
        }
    });

    Ok(StatusCode::ACCEPTED)
}
