use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("error with sqlx")]
    DatabaseError(#[from] sqlx::Error),

    #[error("failed to run database migrations")]
    MigrationError(#[from] sqlx::migrate::MigrateError),
}
