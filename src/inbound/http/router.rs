use crate::core::application::{Application, ApplicationServices};
use crate::domain::auth::AuthService;
use crate::domain::cabinet::CabinetService;
use crate::inbound::http::handlers::{
    auth_login, auth_logout, auth_profile, client_margins, collaborator_client_margins,
    dashboard, org_chart, record_timesheet_entry, save_org_chart_position, server_health,
    statistics, timesheet_day, timesheet_stats, update_fixed_cost,
};
use crate::inbound::http::middleware::auth;
use axum::Router;
use axum::extract::{MatchedPath, Request};
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post, put};
use axum_extra::extract::cookie::SameSite;
use http::header::{ACCEPT, ACCESS_CONTROL_ALLOW_ORIGIN, AUTHORIZATION, CONTENT_TYPE, ORIGIN};
use http::{HeaderValue, Method, StatusCode};
use time::Duration;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::sensitive_headers::SetSensitiveHeadersLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, SessionManagerLayer, SessionStore};

pub fn router<
    AUTH: AuthService + Send + Sync + 'static,
    CABINET: CabinetService + Send + Sync + 'static,
    Store: SessionStore + Clone + Send + Sync + 'static,
>(
    application: Application<AUTH, CABINET>,
    session_store: Store,
) -> Router {
    let config = application.config();
    let same_site = if config.secure_session {
        SameSite::None
    } else {
        SameSite::Lax
    };
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(config.secure_session)
        .with_expiry(Expiry::OnInactivity(Duration::hours(1)))
        .with_same_site(same_site);

    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(vec![
            ORIGIN,
            AUTHORIZATION,
            ACCEPT,
            CONTENT_TYPE,
            ACCESS_CONTROL_ALLOW_ORIGIN,
        ])
        .allow_origin(cors_origins(&config.cors_hosts))
        .allow_credentials(true);

    let auth_routes = auth_routes(application.clone());
    let api_routes = api_routes(application.clone());

    Router::new()
        .route("/healthz", get(server_health))
        .nest("/backend/auth", auth_routes)
        .nest("/backend/api", api_routes)
        .layer(cors)
        .layer(session_layer)
        .layer((
            SetSensitiveHeadersLayer::new([AUTHORIZATION]),
            CompressionLayer::new(),
            TraceLayer::new_for_http()
                .make_span_with(|req: &Request| {
                    let method = req.method();
                    let uri = req.uri();

                    let matched_path = req
                        .extensions()
                        .get::<MatchedPath>()
                        .map(|matched_path| matched_path.as_str());

                    tracing::debug_span!("request", %method, %uri, matched_path)
                })
                .on_failure(()),
            TimeoutLayer::with_status_code(
                StatusCode::GATEWAY_TIMEOUT,
                std::time::Duration::from_secs(30),
            ),
            CatchPanicLayer::new(),
        ))
        .with_state(application)
}

fn cors_origins(hosts: &[String]) -> Vec<HeaderValue> {
    hosts
        .iter()
        .filter_map(|host| match host.parse() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(host = %host, "ignoring invalid cors host: {}", e);
                None
            }
        })
        .collect()
}

fn auth_routes<APP>(application: APP) -> Router<APP>
where
    APP: ApplicationServices + Send + Sync + 'static,
{
    let protected = Router::new()
        .route("/profile", get(auth_profile::<APP>))
        .route_layer(from_fn_with_state(application, auth::<APP>));

    Router::new()
        .route("/login", post(auth_login::<APP>))
        .route("/logout", get(auth_logout::<APP>))
        .merge(protected)
}

fn api_routes<APP>(application: APP) -> Router<APP>
where
    APP: ApplicationServices + Send + Sync + 'static,
{
    Router::new()
        .route("/dashboard", get(dashboard::<APP>))
        .route("/clients", get(client_margins::<APP>))
        .route(
            "/collaborators/{collaborator_id}/clients",
            get(collaborator_client_margins::<APP>),
        )
        .route("/org-chart", get(org_chart::<APP>))
        .route(
            "/org-chart/positions/{node_id}",
            put(save_org_chart_position::<APP>),
        )
        .route("/timesheets", post(record_timesheet_entry::<APP>))
        .route(
            "/timesheets/{collaborator_id}/stats",
            get(timesheet_stats::<APP>),
        )
        .route(
            "/timesheets/{collaborator_id}/day",
            get(timesheet_day::<APP>),
        )
        .route("/statistics/{kind}", get(statistics::<APP>))
        .route("/fixed-costs/{category}", put(update_fixed_cost::<APP>))
        .route_layer(from_fn_with_state(application, auth::<APP>))
}

#[cfg(test)]
mod tests {
    use super::cors_origins;
    use crate::core::config::Config;
    use crate::domain::auth::MockAuthService;
    use crate::domain::cabinet::MockCabinetService;
    use crate::inbound::http::handlers::test_support::server;
    use http::{HeaderValue, StatusCode};

    #[tokio::test]
    async fn test_secure_session_default_config() {
        let config = Config::default();
        assert_eq!(false, config.secure_session);
    }

    #[test]
    fn test_cors_origins_skips_invalid_hosts() {
        let origins = cors_origins(&[
            "https://cabinet.example.com".to_string(),
            "bad\nhost".to_string(),
        ]);

        assert_eq!(
            vec![HeaderValue::from_static("https://cabinet.example.com")],
            origins
        );
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let response = server(MockAuthService::new(), MockCabinetService::new())
            .get("/backend/api/nothing-here")
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
    }
}
