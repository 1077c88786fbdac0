use anyhow::Result;
use opensase_storefront::{config::Config, db, publisher::EventPublisher, router, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())).with(tracing_subscriber::fmt::layer()).init();
    let cfg = Config::from_env()?;
    let db = db::connect(&cfg.database_url, cfg.db_max_connections).await?;
    let events = EventPublisher::connect(cfg.nats_url.as_deref(), &cfg.event_subject_prefix).await;
    let app = router(AppState { db, events, shipping_flat_rate: cfg.shipping_flat_rate });
    tracing::info!("Storefront service listening on port {}", cfg.port);
    axum::serve(tokio::net::TcpListener::bind(format!("0.0.0.0:{}", cfg.port)).await?, app).await?;
    Ok(())
}
