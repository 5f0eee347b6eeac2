use crate::core::config::DB;
use crate::outbound::db::error::Error;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

const MAX_CONNECTIONS: u32 = 5;

/// Opens the pool and brings the schema up to date.
pub async fn connect(config: &DB) -> Result<PgPool, Error> {
    tracing::debug!(host = %config.host, database = %config.database, "connecting to database");
    let pool = PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect(config.connection_string().as_str())
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::debug!("database migrations applied");

    Ok(pool)
}
