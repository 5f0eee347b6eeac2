use crate::core::config::Config;
use crate::domain::auth::AuthService;
use crate::domain::cabinet::CabinetService;
use std::sync::Arc;

/// Everything a handler can reach: the loaded config and the two domain services.
pub trait ApplicationServices: Clone + Send + Sync + 'static {
    type AUTH: AuthService + Send;
    type CABINET: CabinetService + Send;

    fn config(&self) -> Arc<Config>;

    fn auth_service(&self) -> Arc<Self::AUTH>;

    fn cabinet_service(&self) -> Arc<Self::CABINET>;
}

pub struct Application<AUTH, CABINET>
where
    AUTH: AuthService + Send + Sync + 'static,
    CABINET: CabinetService + Send + Sync + 'static,
{
    config: Arc<Config>,
    auth_service: Arc<AUTH>,
    cabinet_service: Arc<CABINET>,
}

impl<AUTH, CABINET> Application<AUTH, CABINET>
where
    AUTH: AuthService + Send + Sync + 'static,
    CABINET: CabinetService + Send + Sync + 'static,
{
    pub fn new(config: Config, auth_service: AUTH, cabinet_service: CABINET) -> Self {
        Self {
            config: Arc::new(config),
            auth_service: Arc::new(auth_service),
            cabinet_service: Arc::new(cabinet_service),
        }
    }
}

impl<AUTH, CABINET> Clone for Application<AUTH, CABINET>
where
    AUTH: AuthService + Send + Sync + 'static,
    CABINET: CabinetService + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            auth_service: Arc::clone(&self.auth_service),
            cabinet_service: Arc::clone(&self.cabinet_service),
        }
    }
}

impl<AUTH, CABINET> ApplicationServices for Application<AUTH, CABINET>
where
    AUTH: AuthService + Send + Sync + 'static,
    CABINET: CabinetService + Send + Sync + 'static,
{
    type AUTH = AUTH;
    type CABINET = CABINET;

    fn config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    fn auth_service(&self) -> Arc<Self::AUTH> {
        Arc::clone(&self.auth_service)
    }

    fn cabinet_service(&self) -> Arc<Self::CABINET> {
        Arc::clone(&self.cabinet_service)
    }
}
