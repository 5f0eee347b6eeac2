use crate::domain::auth::{Role, ServiceProfileResult};
use crate::inbound::http::responses::shared::ResponseType;
use axum::Json;
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use serde::Serialize;

#[derive(Serialize)]
pub struct ProfileResponse {
    data: ProfileData,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileAttributes {
    username: String,
    role: Role,
    collaborator_id: Option<String>,
}

#[derive(Serialize)]
pub struct ProfileData {
    id: String,
    #[serde(rename = "type")]
    object_type: ResponseType,
    attributes: ProfileAttributes,
}

impl IntoResponse for ServiceProfileResult {
    fn into_response(self) -> Response {
        let response = ProfileResponse {
            data: ProfileData {
                id: self.user_id,
                attributes: ProfileAttributes {
                    username: self.username,
                    role: self.role,
                    collaborator_id: self.collaborator_id,
                },
                object_type: ResponseType::Profile,
            },
        };

        (StatusCode::OK, Json(response)).into_response()
    }
}
