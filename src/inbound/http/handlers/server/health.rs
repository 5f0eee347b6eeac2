use crate::inbound::http::responses::health::health_response;
use axum::response::IntoResponse;

pub async fn server_health() -> impl IntoResponse {
    health_response()
}
