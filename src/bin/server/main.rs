use anyhow::anyhow;
use cabinet::core::application::{Application, ApplicationServices};
use cabinet::core::config::Config;
use cabinet::domain::{auth, cabinet as cabinet_domain};
use cabinet::inbound::http::router;
use cabinet::outbound::api::adapter::{ApiAdapter, NewApiAdapterParams};
use cabinet::outbound::db::connection::connect;
use cabinet::outbound::db::repository::Repository;
use cabinet::outbound::session::{SessionAdapter, SessionAdapterFactory};
use clap::{Parser, Subcommand};
use fred::clients::Pool;
use fred::interfaces::ClientLike;
use fred::prelude::ReconnectPolicy;
use sqlx::PgPool;
use std::process::exit;
use std::sync::Arc;
use tower_sessions_redis_store::RedisStore;
use tracing::error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

type ApplicationAlias = Application<
    auth::Service<SessionAdapter, ApiAdapter, SessionAdapterFactory>,
    cabinet_domain::Service<ApiAdapter, Repository>,
>;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    #[arg(long)]
    config_path: Option<String>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP API
    Run,
    /// Apply database migrations and exit
    Migrate,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "{}=debug,{}=debug,tower_http=debug",
                    env!("CARGO_PKG_NAME"),
                    env!("CARGO_CRATE_NAME")
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = start(cli).await {
        error!("Error: {:#?}", e);
        exit(1);
    }
}

async fn start(cli: Cli) -> anyhow::Result<(), anyhow::Error> {
    let config = Config::parse(cli.config_path)?;
    if !config.is_valid() {
        return Err(anyhow!("config is not valid"));
    }

    let pool = connect(&config.db).await?;

    match cli.command {
        None | Some(Commands::Migrate) => Ok(()),
        Some(Commands::Run) => {
            let application = create_application(pool, config)?;
            run_server(application).await
        }
    }
}

fn create_application(pool: PgPool, config: Config) -> Result<ApplicationAlias, anyhow::Error> {
    let api = ApiAdapter::new(NewApiAdapterParams {
        base_url: config.api.base_url.clone(),
        timeout: config.api.timeout(),
    })?;
    tracing::debug!("created back-office api client");

    let repo = Repository::new(pool);
    let session_factory = SessionAdapterFactory::new();
    let auth_service = auth::Service::new(api.clone(), session_factory);
    let cabinet_service = cabinet_domain::Service::new(api, repo);

    Ok(Application::new(config, auth_service, cabinet_service))
}

async fn run_server(app: ApplicationAlias) -> anyhow::Result<()> {
    tracing::debug!("creating session store.");
    let session_store = new_session_store(app.config())
        .await
        .map_err(|_| anyhow!("failed to create redis session store"))?;
    tracing::debug!("created session store.");

    let bind_address = app.config().bind_address().to_string();
    let router = router(app, session_store);

    let listener = tokio::net::TcpListener::bind(bind_address.as_str())
        .await
        .map_err(|e| anyhow!("server failed to bind {}: {}", bind_address, e))?;

    tracing::info!(
        "listening on {}",
        listener
            .local_addr()
            .map_err(|_| anyhow!("failed to get local_addr"))?
    );

    axum::serve(listener, router)
        .await
        .map_err(|_| anyhow!("failed to start server"))
}

async fn new_session_store(config: Arc<Config>) -> Result<RedisStore<Pool>, anyhow::Error> {
    let config: fred::types::config::Config = config
        .redis
        .clone()
        .try_into()
        .map_err(|e| anyhow!("failed to parse redis session store connection url: {}", e))?;

    let pool = Pool::new(
        config,
        None,
        None,
        Some(ReconnectPolicy::new_constant(0, 5_000)),
        10,
    )?;
    let redis_connection = pool.connect();
    tokio::spawn(redis_connection);
    pool.wait_for_connect().await.map_err(|e| {
        error!("redis connection failed: {:?}", e);
        anyhow!("redis connection failed")
    })?;

    Ok(RedisStore::new(pool))
}
