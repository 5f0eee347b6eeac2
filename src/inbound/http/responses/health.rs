use crate::inbound::http::responses::shared::{DataResponse, ResponseType};
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthData {
    status: &'static str,
}

pub fn health_response() -> DataResponse<HealthData> {
    DataResponse::new(ResponseType::Health, HealthData { status: "OK" })
}
