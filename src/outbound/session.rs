use crate::domain::auth::CurrentUser;
use crate::domain::session::{SessionError, SessionPort};
use async_trait::async_trait;
use mockall::automock;
use tower_sessions::Session;

const CURRENT_USER: &str = "current_user";

#[automock]
pub trait SessionFactory<S: SessionPort> {
    fn build(&self, session: Session) -> S;
}

#[derive(Debug, Clone)]
pub struct SessionAdapterFactory {}

#[derive(Debug, Clone)]
pub struct SessionAdapter {
    session: Session,
}

impl Default for SessionAdapterFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionAdapterFactory {
    pub fn new() -> Self {
        Self {}
    }
}

impl SessionFactory<SessionAdapter> for SessionAdapterFactory {
    fn build(&self, session: Session) -> SessionAdapter {
        SessionAdapter::new(session)
    }
}

impl SessionAdapter {
    fn new(session: Session) -> Self {
        Self { session }
    }
}

#[async_trait]
impl SessionPort for SessionAdapter {
    async fn write_current_user(&self, user: CurrentUser) -> Result<(), SessionError> {
        self.session.insert(CURRENT_USER, user).await?;

        Ok(())
    }

    async fn get_current_user(&self) -> Result<Option<CurrentUser>, SessionError> {
        let user = self.session.get::<CurrentUser>(CURRENT_USER).await?;

        Ok(user)
    }

    async fn flush(&self) -> Result<(), SessionError> {
        self.session.flush().await?;
        self.session.save().await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::auth::Role;
    use std::sync::Arc;
    use tower_sessions::MemoryStore;

    fn adapter() -> SessionAdapter {
        let store = Arc::new(MemoryStore::default());
        SessionAdapterFactory::new().build(Session::new(None, store, None))
    }

    fn user() -> CurrentUser {
        CurrentUser {
            user_id: "u1".to_string(),
            username: "claire@cabinet.fr".to_string(),
            role: Role::Admin,
            collaborator_id: None,
            token: "jwt".to_string(),
        }
    }

    #[tokio::test]
    async fn test_current_user_round_trips_through_session() {
        let adapter = adapter();

        adapter.write_current_user(user()).await.unwrap();

        assert_eq!(Some(user()), adapter.get_current_user().await.unwrap());
    }

    #[tokio::test]
    async fn test_flush_forgets_user() {
        let adapter = adapter();
        adapter.write_current_user(user()).await.unwrap();

        adapter.flush().await.unwrap();

        assert_eq!(None, adapter.get_current_user().await.unwrap());
    }

    #[tokio::test]
    async fn test_empty_session() {
        assert_eq!(None, adapter().get_current_user().await.unwrap());
    }
}
