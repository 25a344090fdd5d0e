//! Database setup: `ecosolo-setup [--no-seed]`. Creates the databases when
//! missing, migrates both schemas and loads sample data.

use ecosolo::model::primary_model;
use ecosolo::territory::ensure_schema;
use ecosolo::{apply_migrations, connect_pool, ensure_database_exists, seed_database, Settings};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("ecosolo=info")),
        )
        .init();

    let seed = !std::env::args().skip(1).any(|a| a == "--no-seed");
    let settings = Settings::from_env()?;

    ensure_database_exists(&settings.database_url).await?;
    let pool = connect_pool(&settings.database_url, 2, false).await?;
    apply_migrations(&pool, &primary_model()).await?;
    tracing::info!("primary schema ready");

    let territory_url = settings.territory_database_url();
    let territory_pool = if territory_url == settings.database_url {
        pool.clone()
    } else {
        ensure_database_exists(territory_url).await?;
        connect_pool(territory_url, 2, false).await?
    };
    ensure_schema(&territory_pool).await?;

    if seed {
        let report = seed_database(&pool, settings.bcrypt_cost).await?;
        tracing::info!(?report, "sample data loaded");
    } else {
        tracing::info!("skipping sample data");
    }
    Ok(())
}
