use actix_cors::Cors;
use actix_web::{http::header, middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use authgate_server::{configure, AppState, Settings};
use dotenv::dotenv;
use std::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    // Load configuration
    let config = Settings::new().context("failed to load configuration")?;
    info!("Configuration loaded successfully ({})", config.environment);
    if config.auth.token_expiry_hours.is_none() {
        info!("Session tokens are issued without expiry");
    }

    // No store, no server
    let state = AppState::new(config.clone())
        .await
        .context("failed to connect to the user store")?;
    info!("Connected to the user store");
    let state = web::Data::new(state);

    let listener = TcpListener::bind(format!("{}:{}", config.server.host, config.server.port))
        .with_context(|| format!("failed to bind {}:{}", config.server.host, config.server.port))?;
    info!("Server running on {}:{}", config.server.host, config.server.port);

    let cors_config = config.cors.clone();
    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&cors_config.allowed_origin)
            .allowed_methods(vec!["GET", "POST"])
            .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE])
            .supports_credentials()
            .max_age(cors_config.max_age as usize);

        App::new()
            .wrap(cors)
            .wrap(Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .listen(listener)?
    .workers(config.server.workers as usize)
    .run()
    .await
    .context("server terminated with an error")?;

    Ok(())
}
