//! HTTP server: `ecosolo-server`.

use ecosolo::{build_router, connect_pool, AppState, Settings};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("ecosolo=info,tower_http=info")),
        )
        .init();

    let settings = Settings::from_env()?;
    let pool = connect_pool(&settings.database_url, settings.database_max_connections, false).await?;
    let territory_pool = if settings.territory_database_url() == settings.database_url {
        pool.clone()
    } else {
        connect_pool(settings.territory_database_url(), settings.database_max_connections, false).await?
    };

    let address = settings.bind_address();
    tracing::info!(
        app = %settings.app_name,
        environment = %settings.environment,
        debug = settings.debug,
        "starting"
    );
    let app = build_router(AppState::new(pool, territory_pool, settings));
    let listener = TcpListener::bind(&address).await?;
    tracing::info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
