use crate::domain::auth::{
    AuthService, CredentialsLoginParams, CredentialsPort, CurrentUser, Role,
    ServiceCurrentUserError, ServiceCurrentUserParams, ServiceLoginError, ServiceLoginParams,
    ServiceLogoutError, ServiceLogoutParams, ServiceProfileError, ServiceProfileParams,
    ServiceProfileResult,
};
use crate::domain::session::SessionPort;
use crate::outbound::session::SessionFactory;
use async_trait::async_trait;
use std::marker::PhantomData;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Service<SESSION, CREDENTIALS, F>
where
    SESSION: SessionPort + Send + Sync + 'static,
    CREDENTIALS: CredentialsPort + Send + Sync + 'static,
    F: SessionFactory<SESSION> + Send + Sync + 'static,
{
    credentials: Arc<CREDENTIALS>,
    session_factory: F,
    _session: PhantomData<SESSION>,
}

impl<SESSION, CREDENTIALS, F> Service<SESSION, CREDENTIALS, F>
where
    SESSION: SessionPort + Send + Sync + 'static,
    CREDENTIALS: CredentialsPort + Send + Sync + 'static,
    F: SessionFactory<SESSION> + Send + Sync + 'static,
{
    pub fn new(credentials: CREDENTIALS, session_adapter_factory: F) -> Self {
        Self {
            credentials: Arc::new(credentials),
            session_factory: session_adapter_factory,
            _session: PhantomData,
        }
    }
}

#[async_trait]
impl<SESSION, CREDENTIALS, F> AuthService for Service<SESSION, CREDENTIALS, F>
where
    SESSION: SessionPort + Send + Sync + 'static,
    CREDENTIALS: CredentialsPort + Send + Sync + 'static,
    F: SessionFactory<SESSION> + Send + Sync + 'static,
{
    async fn login(&self, params: ServiceLoginParams) -> Result<CurrentUser, ServiceLoginError> {
        let session = self.session_factory.build(params.session);
        let login = self
            .credentials
            .login(CredentialsLoginParams {
                email: params.username,
                password: params.password,
            })
            .await?;
        let role: Role = login.user.role.parse()?;

        let user = CurrentUser {
            user_id: login.user.id,
            username: login.user.email,
            role,
            collaborator_id: login.user.collaborator_id.filter(|id| !id.is_empty()),
            token: login.token,
        };

        // never carry anything from a previous login into the new one
        session.flush().await?;
        session.write_current_user(user.clone()).await?;
        tracing::debug!(user = %user.user_id, role = %user.role, "user logged in");

        Ok(user)
    }

    async fn logout(&self, params: ServiceLogoutParams) -> Result<(), ServiceLogoutError> {
        let session = self.session_factory.build(params.session);
        session.flush().await?;

        Ok(())
    }

    async fn current_user(
        &self,
        params: ServiceCurrentUserParams,
    ) -> Result<Option<CurrentUser>, ServiceCurrentUserError> {
        let session = self.session_factory.build(params.session);

        Ok(session.get_current_user().await?)
    }

    async fn profile(
        &self,
        params: ServiceProfileParams,
    ) -> Result<ServiceProfileResult, ServiceProfileError> {
        let session = self.session_factory.build(params.session);

        match session.get_current_user().await? {
            Some(user) => Ok(user.into()),
            None => Err(ServiceProfileError::Unauthenticated),
        }
    }
}
