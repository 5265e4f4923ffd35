use backend::config::AppConfig;
use backend::db;
use backend::web_server::{run_server, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::filter::LevelFilter::INFO)
        .init();

    let app_config = AppConfig::from_env()?;

    let db_pool = db::connect(&app_config.database).await?;

    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(&db_pool).await?;
    tracing::info!("Migrations complete.");

    let app_state = AppState {
        db_pool,
        app_config,
    };

    run_server(app_state).await;

    Ok(())
}
