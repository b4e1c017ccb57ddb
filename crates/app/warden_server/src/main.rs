//! Warden authentication server binary.
//!
//! Serves the login/refresh/logout endpoints over Postgres credentials and
//! grants, with sessions in Redis.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};
use warden_api::config::ApiConfig;
use warden_core::auth::queries::PgCredentialStore;
use warden_core::config::AuthConfig;
use warden_core::models::auth::TokenKind;
use warden_core::permissions::queries::PgGrantSource;
use warden_core::session::SessionStore;
use warden_core::session::memory::MemorySessionStore;
use warden_core::session::redis::RedisSessionStore;

/// CLI arguments for the server.
#[derive(Parser, Debug)]
#[command(name = "warden_server", about = "Warden authentication server")]
struct Args {
    /// Address to listen on. Overrides `BIND_ADDR`.
    #[arg(long)]
    bind_addr: Option<String>,

    /// PostgreSQL connection URL. Overrides `DATABASE_URL`.
    #[arg(long)]
    database_url: Option<String>,

    /// Redis connection URL for session records. Overrides `REDIS_URL`.
    #[arg(long)]
    redis_url: Option<String>,

    /// Maximum number of database connections in the pool.
    #[arg(long, default_value_t = 5)]
    max_connections: u32,

    /// Keep sessions in process memory instead of Redis.
    ///
    /// Single-node development only: revocation is not shared between
    /// instances.
    #[arg(long, default_value_t = false)]
    in_memory_sessions: bool,

    /// Skip embedded migrations on startup.
    #[arg(long, default_value_t = false)]
    skip_migrations: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("info,warden_api=debug,warden_core=debug")
            }),
        )
        .init();

    let args = Args::parse();
    let config = ApiConfig::from_env().with_overrides(
        args.bind_addr,
        args.database_url,
        args.redis_url,
    );
    let auth = AuthConfig::from_env()?;
    // Fail at startup rather than on the first login.
    auth.access.check(TokenKind::Access)?;
    auth.refresh.check(TokenKind::Refresh)?;

    info!(
        bind_addr = %config.bind_addr,
        environment = %auth.environment,
        "starting warden_server"
    );

    let pool = PgPoolOptions::new()
        .max_connections(args.max_connections)
        .acquire_timeout(auth.store_timeout.max(Duration::from_secs(1)))
        .connect(&config.database_url)
        .await?;

    if args.skip_migrations {
        warn!("skipping database migrations");
    } else {
        info!("running database migrations");
        warden_api::migrate(&pool).await?;
    }

    let sessions: Arc<dyn SessionStore> = if args.in_memory_sessions {
        warn!("using in-memory session store; sessions are not shared between instances");
        let store = Arc::new(MemorySessionStore::new());
        store.spawn_cleanup_task();
        store as Arc<dyn SessionStore>
    } else {
        Arc::new(RedisSessionStore::connect(&config.redis_url).await?)
    };

    let state = warden_api::AppState::new(
        auth,
        Arc::new(PgCredentialStore::new(pool.clone())),
        Arc::new(PgGrantSource::new(pool)),
        sessions,
    );
    let app = warden_api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "REST API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await?;

    Ok(())
}
