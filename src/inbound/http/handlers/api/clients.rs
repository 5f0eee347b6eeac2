use crate::core::application::ApplicationServices;
use crate::domain::auth::{Capability, CurrentUser};
use crate::domain::cabinet::{
    CabinetService, ClientMarginsParams, ClientMarginsResult, ClientSortKey, SortDirection,
    SortState,
};
use crate::errors::AppError;
use crate::inbound::http::responses::shared::{DataResponse, ResponseType};
use axum::Extension;
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use serde::Deserialize;

/// `sort` and `order` carry the state the list is currently shown in. `select` is the column
/// the user picked: the current column flips its direction, any other sorts ascending.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct SortQueryParams {
    sort: Option<ClientSortKey>,
    order: Option<SortDirection>,
    select: Option<ClientSortKey>,
}

impl From<SortQueryParams> for SortState<ClientSortKey> {
    fn from(params: SortQueryParams) -> Self {
        let mut state = SortState {
            key: params.sort.unwrap_or_default(),
            direction: params.order.unwrap_or_default(),
        };
        if let Some(key) = params.select {
            state.select(key);
        }

        state
    }
}

async fn margins<S: ApplicationServices>(
    state: S,
    user: CurrentUser,
    collaborator_id: Option<String>,
    sort: SortState<ClientSortKey>,
) -> Result<DataResponse<ClientMarginsResult>, AppError> {
    let result = state
        .cabinet_service()
        .client_margins(ClientMarginsParams {
            user,
            collaborator_id,
            sort,
        })
        .await?;

    Ok(DataResponse::new(ResponseType::Clients, result))
}

pub async fn client_margins<S: ApplicationServices>(
    State(state): State<S>,
    Extension(user): Extension<CurrentUser>,
    Query(params): Query<SortQueryParams>,
) -> Result<impl IntoResponse, AppError> {
    user.require(Capability::ViewClients)?;

    margins(state, user, None, params.into()).await
}

pub async fn collaborator_client_margins<S: ApplicationServices>(
    State(state): State<S>,
    Extension(user): Extension<CurrentUser>,
    Path(collaborator_id): Path<String>,
    Query(params): Query<SortQueryParams>,
) -> Result<impl IntoResponse, AppError> {
    user.require(Capability::ViewCollaborators)?;

    margins(state, user, Some(collaborator_id), params.into()).await
}
