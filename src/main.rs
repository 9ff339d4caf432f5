use book_lending::{
    adapters::memory::{InMemoryCatalogRepository, InMemoryRentalLedger},
    adapters::postgres::{PostgresCatalogRepository, PostgresRentalLedger},
    api::{handlers::AppState, router::create_router},
    application::library::ServiceDependencies,
    config::AppConfig,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "book_lending=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;

    // Initialize adapters
    let service_deps = match &config.database_url {
        Some(database_url) => {
            tracing::info!("Using PostgreSQL backend");

            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(config.database_max_connections)
                .connect(database_url)
                .await?;

            sqlx::migrate!("./migrations").run(&pool).await?;

            ServiceDependencies {
                catalog: Arc::new(PostgresCatalogRepository::new(pool.clone())),
                ledger: Arc::new(PostgresRentalLedger::new(pool)),
            }
        }
        None => {
            tracing::info!("DATABASE_URL not set, using in-memory backend");

            ServiceDependencies {
                catalog: Arc::new(InMemoryCatalogRepository::new()),
                ledger: Arc::new(InMemoryRentalLedger::new()),
            }
        }
    };

    // Create application state and router
    let app = create_router(Arc::new(AppState::new(service_deps)));

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
