use crate::domain::auth::CurrentUser;
use async_trait::async_trait;
use mockall::automock;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("error writing session")]
    WriteSessionError,

    #[error("error reading session")]
    ReadSessionError,

    #[error(transparent)]
    TowerSessionsError(#[from] tower_sessions::session::Error),
}

#[async_trait]
#[automock]
pub trait SessionPort: Send + Sync {
    async fn write_current_user(&self, user: CurrentUser) -> Result<(), SessionError>;
    async fn get_current_user(&self) -> Result<Option<CurrentUser>, SessionError>;
    async fn flush(&self) -> Result<(), SessionError>;
}
