use axum::Json;
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use serde::Serialize;

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ResponseType {
    Health,
    Profile,
    Dashboard,
    Clients,
    OrgChart,
    TimesheetStats,
    TimesheetDay,
    TimesheetEntry,
    Statistics,
    FixedCosts,
}

/// The `{ "data": ..., "type": ... }` body every endpoint answers with.
#[derive(Serialize)]
pub struct DataResponse<T: Serialize> {
    data: T,
    #[serde(rename = "type")]
    object_type: ResponseType,
    #[serde(skip)]
    status: StatusCode,
}

impl<T: Serialize> DataResponse<T> {
    pub fn new(object_type: ResponseType, data: T) -> Self {
        Self {
            data,
            object_type,
            status: StatusCode::OK,
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }
}

impl<T: Serialize> IntoResponse for DataResponse<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}
