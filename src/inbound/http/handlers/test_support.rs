use crate::core::application::tests::{MockAppInstanceParameters, MockApplication};
use crate::domain::auth::{CurrentUser, MockAuthService, Role};
use crate::domain::cabinet::MockCabinetService;
use crate::inbound::http::router;
use axum_test::TestServer;
use std::future;
use tower_sessions::MemoryStore;

pub fn user(role: Role) -> CurrentUser {
    CurrentUser {
        user_id: "u1".to_string(),
        username: "claire@cabinet.fr".to_string(),
        role,
        collaborator_id: Some("k1".to_string()),
        token: "jwt".to_string(),
    }
}

/// An auth service whose session always holds `user`.
pub fn signed_in(user: CurrentUser) -> MockAuthService {
    let mut auth_service = MockAuthService::new();
    auth_service
        .expect_current_user()
        .returning(move |_| Box::pin(future::ready(Ok(Some(user.clone())))));
    auth_service
}

pub fn server(auth_service: MockAuthService, cabinet_service: MockCabinetService) -> TestServer {
    let app = MockApplication::mock_instance(MockAppInstanceParameters {
        auth_service: Some(auth_service),
        cabinet_service: Some(cabinet_service),
        ..Default::default()
    });

    TestServer::new(router(app, MemoryStore::default())).unwrap()
}
