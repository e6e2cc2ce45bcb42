use actix_web::{web, App, HttpServer};
use anyhow::Context;
use image_analysis_api::{
    constants::START_TIME,
    graceful_shutdown::shutdown_signal,
    routes::{build_cors, configure_routes},
    settings::AppConfig,
    AppState,
};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::EnvFilter;

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if config.is_production() {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = match AppConfig::new() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    init_tracing(&config);
    tracing::info!("Loaded configuration: {:?}", config);
    once_cell::sync::Lazy::force(&START_TIME);

    let app_state = web::Data::new(
        AppState::from_config(&config)
            .await
            .context("Failed to initialize application state")?,
    );

    let server_addr = config.server_addr();
    let max_upload_bytes = config.max_upload_bytes;
    let cors_origins = config.cors_origins();

    tracing::info!(
        "🚀 Starting {} v{} on {} (uploads in {})",
        config.name,
        env!("CARGO_PKG_VERSION"),
        server_addr,
        config.upload_dir.display()
    );

    let server = HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(build_cors(&cors_origins))
            .wrap(TracingLogger::default())
            .configure(configure_routes(max_upload_bytes))
    })
    .workers(config.worker_count)
    .bind(&server_addr)
    .with_context(|| format!("Failed to bind {}", server_addr))?
    .run();

    let handle = server.handle();

    tokio::select! {
        res = server => res.context("Server error")?,
        _ = shutdown_signal() => {
            handle.stop(true).await;
            tracing::info!("Image analysis API stopped");
        }
    }

    Ok(())
}
