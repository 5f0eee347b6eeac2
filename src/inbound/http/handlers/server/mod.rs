mod health;

pub use health::server_health;
