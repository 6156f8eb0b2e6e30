//! Studium API server binary.
//!
//! Loads configuration from the environment (fatal if incomplete), runs
//! migrations, and serves the REST API.

use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

/// CLI arguments for the API server.
#[derive(Parser, Debug)]
#[command(name = "studium_server", about = "Studium API server")]
struct Args {
    /// Maximum number of database connections in the pool.
    #[arg(long, default_value_t = 5)]
    max_connections: u32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,studium_api=debug,studium_core=debug".parse().unwrap()),
        )
        .init();

    let args = Args::parse();

    // Missing or malformed configuration aborts startup; the process must
    // not serve traffic without its secrets.
    let config = studium_api::config::ApiConfig::from_env()?;

    info!(bind_addr = %config.bind_addr, "starting studium_server");

    let pool = PgPoolOptions::new()
        .max_connections(args.max_connections)
        .acquire_timeout(std::time::Duration::from_secs(30))
        .connect(&config.pg_connection_url)
        .await?;

    info!("running database migrations");
    studium_api::migrate(&pool).await?;

    // Vault construction also validates the encryption key length.
    let state = studium_api::AppState::new(pool, config.clone())?;
    let app = studium_api::router(state);

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
