pub mod auth;
pub mod cabinet;
pub mod session;
