use actix_web::{web, App, HttpServer};
use anyhow::Context;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use blog_service::cache::PageCache;
use blog_service::{db, handlers, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().map_err(anyhow::Error::msg)?;
    tracing::info!("Starting blog-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    let pool = db::create_pool(&config.database)
        .await
        .context("failed to create database pool")?;
    db::MIGRATOR
        .run(&pool)
        .await
        .context("failed to run database migrations")?;
    tracing::info!("Connected to database, schema is current");

    // The page cache is best-effort: without Redis every request renders.
    let page_cache = match PageCache::connect(&config.cache.url, config.cache.page_ttl_secs).await {
        Ok(cache) => Some(cache),
        Err(e) => {
            tracing::warn!("Redis unavailable, serving without the page cache: {}", e);
            None
        }
    };

    let bind_address = (config.app.host.clone(), config.app.port);
    tracing::info!(
        "Starting HTTP server at {}:{}",
        bind_address.0,
        bind_address.1
    );

    let config_data = web::Data::new(config);
    let pool_data = web::Data::new(pool);

    HttpServer::new(move || {
        let mut app = App::new()
            .wrap(TracingLogger::default())
            .app_data(config_data.clone())
            .app_data(pool_data.clone());
        if let Some(cache) = &page_cache {
            app = app.app_data(web::Data::new(cache.clone()));
        }
        app.configure(handlers::configure)
    })
    .bind(bind_address)?
    .run()
    .await
    .context("server error")
}
