use sqlx::postgres::PgPoolOptions;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use hairy_shield::config::Config;
use hairy_shield::shield::Shield;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    // Initialize structured logging (set RUST_LOG=info for output)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    tracing::info!("Hairy Shield starting");

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config = Config::load(&config_path)?;
    tracing::info!(
        chain = %config.shield.chain,
        risk_threshold = config.shield.risk_threshold,
        own_address = config.shield.own_address.is_some(),
        "Configuration loaded from {}",
        config_path
    );

    // Remote store is optional; without it reports stay on this device
    let pool = match &config.database {
        Some(database) => {
            let pool = PgPoolOptions::new()
                .max_connections(database.max_connections)
                .connect(&database.url)
                .await
                .map_err(|e| eyre::eyre!("Failed to connect to database: {}", e))?;
            tracing::info!("Connected to PostgreSQL");

            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .map_err(|e| eyre::eyre!("Failed to run migrations: {}", e))?;
            tracing::info!("Database migrations complete");

            Some(pool)
        }
        None => None,
    };

    let shield = Shield::init(&config, pool).await?;
    tracing::info!(
        cached = shield.registry.cached_count().await,
        "Shield initialized"
    );

    if !config.api.enabled {
        let stats = shield.registry.stats().await;
        tracing::info!(
            total_reported = stats.total_reported,
            reports_today = stats.reports_today,
            top_threats = ?stats.top_threats,
            "API disabled, nothing left to serve"
        );
        return Ok(());
    }

    let shutdown = CancellationToken::new();
    let server = {
        let shutdown = shutdown.clone();
        let host = config.api.host.clone();
        let port = config.api.port;
        tokio::spawn(async move {
            if let Err(e) = hairy_shield::api::serve(shield, &host, port, shutdown).await {
                tracing::error!(error = %e, "API server failed");
            }
        })
    };

    tracing::info!("Press Ctrl+C to stop.");

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received, stopping API server...");
    shutdown.cancel();
    let _ = server.await;

    tracing::info!("Hairy Shield stopped gracefully");
    Ok(())
}
