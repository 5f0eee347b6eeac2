use crate::domain::auth::{CurrentUser, Role, UnknownRole};
use crate::domain::session::SessionError;
use crate::outbound::api::error::ApiError;
use async_trait::async_trait;
use mockall::automock;
use serde::Deserialize;
use thiserror::Error;
use tower_sessions::Session;

////////////////////////////////////////////////////////////////////////////////////////////////////
// Service
////////////////////////////////////////////////////////////////////////////////////////////////////

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait AuthService: Send + Sync {
    async fn login(&self, params: ServiceLoginParams) -> Result<CurrentUser, ServiceLoginError>;
    async fn logout(&self, params: ServiceLogoutParams) -> Result<(), ServiceLogoutError>;
    async fn current_user(
        &self,
        params: ServiceCurrentUserParams,
    ) -> Result<Option<CurrentUser>, ServiceCurrentUserError>;
    async fn profile(
        &self,
        params: ServiceProfileParams,
    ) -> Result<ServiceProfileResult, ServiceProfileError>;
}

////////////////////////////////////////////////////////////////////////////////////////////////////
// Ports
////////////////////////////////////////////////////////////////////////////////////////////////////

#[async_trait]
#[automock]
pub trait CredentialsPort: Send + Sync {
    async fn login(&self, params: CredentialsLoginParams)
    -> Result<CredentialsLoginResult, ApiError>;
}

////////////////////////////////////////////////////////////////////////////////////////////////////
// Results
////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceProfileResult {
    pub user_id: String,
    pub username: String,
    pub role: Role,
    pub collaborator_id: Option<String>,
}

impl From<CurrentUser> for ServiceProfileResult {
    fn from(user: CurrentUser) -> Self {
        Self {
            user_id: user.user_id,
            username: user.username,
            role: user.role,
            collaborator_id: user.collaborator_id,
        }
    }
}

/// Body of a successful upstream login.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CredentialsLoginResult {
    pub token: String,
    pub user: UpstreamUser,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamUser {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub email: String,
    pub role: String,
    #[serde(default, alias = "collaborator")]
    pub collaborator_id: Option<String>,
}

////////////////////////////////////////////////////////////////////////////////////////////////////
// Params
////////////////////////////////////////////////////////////////////////////////////////////////////

pub struct ServiceLoginParams {
    pub session: Session,
    pub username: String,
    pub password: String,
}

pub struct ServiceLogoutParams {
    pub session: Session,
}

pub struct ServiceCurrentUserParams {
    pub session: Session,
}

pub struct ServiceProfileParams {
    pub session: Session,
}

/// The back-office signs users in by email.
#[derive(Debug, Clone, PartialEq)]
pub struct CredentialsLoginParams {
    pub email: String,
    pub password: String,
}

////////////////////////////////////////////////////////////////////////////////////////////////////
// Errors
////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Error)]
pub enum ServiceLoginError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error(transparent)]
    UnknownRole(#[from] UnknownRole),

    #[error(transparent)]
    Upstream(ApiError),

    #[error(transparent)]
    SessionError(#[from] SessionError),
}

impl From<ApiError> for ServiceLoginError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Unauthorized => ServiceLoginError::InvalidCredentials,
            other => ServiceLoginError::Upstream(other),
        }
    }
}

#[derive(Debug, Error)]
pub enum ServiceLogoutError {
    #[error(transparent)]
    SessionError(#[from] SessionError),
}

#[derive(Debug, Error)]
pub enum ServiceCurrentUserError {
    #[error(transparent)]
    SessionError(#[from] SessionError),
}

#[derive(Debug, Error)]
pub enum ServiceProfileError {
    #[error("user is not authenticated")]
    Unauthenticated,

    #[error(transparent)]
    SessionError(#[from] SessionError),
}
