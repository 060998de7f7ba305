use books_service::config::ServiceConfig;
use books_service::routes::router;
use books_service::storage::connect;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("books_service=info,tower_http=info")),
        )
        .init();

    let config = ServiceConfig::from_env()?;
    info!("Using {} backend", config.backend.name());

    let backend = connect(&config.backend).await?;
    if let Err(e) = backend.test_connection().await {
        error!("Failed to connect to storage backend: {}", e);
        std::process::exit(1);
    }
    info!("Storage backend connection successful");

    let app = router(backend);
    let addr = config.bind_addr();

    info!("Books service starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
