use crate::domain::auth::{CredentialsLoginParams, CredentialsLoginResult, CredentialsPort};
use crate::domain::cabinet::{
    ApiAuth, BackOfficeApiPort, CreateTimesheetApiParams, ListTimesheetsApiParams,
    UpdateFixedCostApiParams,
};
use crate::outbound::api::error::ApiError;
use async_trait::async_trait;
use reqwest::{Method, StatusCode, Url};
use serde_json::{Value, json};
use std::time::Duration;

/// Maps error statuses to [`ApiError`], leaving successful responses untouched.
async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    if resp.status() == StatusCode::UNAUTHORIZED {
        return Err(ApiError::Unauthorized);
    }
    if !resp.status().is_success() {
        return Err(ApiError::Status {
            status: resp.status().as_u16(),
            message: resp.text().await.unwrap_or_default(),
        });
    }
    Ok(resp)
}

#[derive(Debug, Clone)]
pub struct ApiAdapter {
    http_client: reqwest::Client,
    base_url: Url,
}

pub struct NewApiAdapterParams {
    pub base_url: String,
    pub timeout: Duration,
}

impl ApiAdapter {
    pub fn new(params: NewApiAdapterParams) -> Result<Self, ApiError> {
        let base_url = Url::parse(&params.base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(
                url::ParseError::RelativeUrlWithCannotBeABaseBase,
            ));
        }
        tracing::debug!(base_url = %base_url, "creating back-office api client");

        let http_client = reqwest::Client::builder()
            .timeout(params.timeout)
            .build()?;

        Ok(Self {
            http_client,
            base_url,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .push("api")
            .extend(segments);

        Ok(url)
    }

    async fn send(
        &self,
        method: Method,
        segments: &[&str],
        auth: Option<&ApiAuth>,
        body: Option<Value>,
    ) -> Result<Value, ApiError> {
        let url = self.endpoint(segments)?;
        tracing::debug!(%method, %url, "calling back-office api");

        let mut request = self.http_client.request(method, url);
        if let Some(auth) = auth {
            request = request.bearer_auth(&auth.token);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let resp = check_response(request.send().await?).await?;

        Ok(resp.json().await?)
    }
}

#[async_trait]
impl BackOfficeApiPort for ApiAdapter {
    async fn list_clients(&self, params: ApiAuth) -> Result<Value, ApiError> {
        self.send(Method::GET, &["clients"], Some(&params), None)
            .await
    }

    async fn list_collaborators(&self, params: ApiAuth) -> Result<Value, ApiError> {
        self.send(Method::GET, &["collaborators"], Some(&params), None)
            .await
    }

    async fn list_timesheets(&self, params: ListTimesheetsApiParams) -> Result<Value, ApiError> {
        self.send(
            Method::GET,
            &["timesheets", "collaborator", &params.collaborator_id],
            Some(&params.auth),
            None,
        )
        .await
    }

    async fn create_timesheet(&self, params: CreateTimesheetApiParams) -> Result<Value, ApiError> {
        let body = json!(params.entry);

        self.send(Method::POST, &["timesheets"], Some(&params.auth), Some(body))
            .await
    }

    async fn get_fixed_costs(&self, params: ApiAuth) -> Result<Value, ApiError> {
        self.send(Method::GET, &["fixedcosts"], Some(&params), None)
            .await
    }

    async fn update_fixed_cost(
        &self,
        params: UpdateFixedCostApiParams,
    ) -> Result<Value, ApiError> {
        self.send(
            Method::PUT,
            &["fixedcosts", params.category.key()],
            Some(&params.auth),
            Some(json!({ "value": params.amount })),
        )
        .await
    }
}

#[async_trait]
impl CredentialsPort for ApiAdapter {
    async fn login(
        &self,
        params: CredentialsLoginParams,
    ) -> Result<CredentialsLoginResult, ApiError> {
        let body = json!({ "email": params.email, "password": params.password });
        // a 4xx on login is a refused login
        let payload = match self
            .send(Method::POST, &["auth", "login"], None, Some(body))
            .await
        {
            Err(ApiError::Status { status, message }) if (400..500).contains(&status) => {
                tracing::debug!(status, "login refused: {}", message);
                return Err(ApiError::Unauthorized);
            }
            result => result?,
        };

        serde_json::from_value(payload).map_err(|e| {
            tracing::warn!("unexpected login response: {}", e);
            ApiError::Status {
                status: StatusCode::BAD_GATEWAY.as_u16(),
                message: "unexpected login response".to_string(),
            }
        })
    }
}
