mod api;
mod auth;
mod server;

pub use api::*;
pub use auth::*;
pub use server::*;

#[cfg(test)]
pub(crate) mod test_support;
