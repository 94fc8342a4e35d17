use std::sync::Arc;

use poem::listener::TcpListener;
use psi_vision::{
    client::Providers, core::db::init_pool, init_openapi_route, settings::get_config, AppState,
};
use tracing::Level;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match get_config() {
        Ok(val) => val,
        Err(err) => {
            eprintln!("invalid configuration: {:#}", err);
            std::process::exit(1);
        }
    };

    let log_level = if config.is_debug() {
        Level::DEBUG
    } else {
        Level::INFO
    };
    // Logging to File
    let file_appender = tracing_appender::rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(log_level)
        .init();

    // Logging to Console
    // tracing_subscriber::fmt().with_max_level(log_level).init();

    tracing::info!(
        "run with prefix {}, debug {}",
        config.prefix(),
        config.is_debug()
    );

    // Init Database Connection
    tracing::info!("Init Postgres connection");
    let pool = init_pool(&config).await?;
    // Init Redis Connection
    tracing::info!("Init Redis connection");
    let client = redis::Client::open(config.redis_url.clone())?;
    let redis_pool = r2d2::Pool::builder().build(client)?;
    // Init outbound providers
    let providers = Providers::from_config(&config)?;
    if config.openai_api_key.is_none() {
        tracing::warn!("OPENAI_API_KEY is not set, chat and image generation will fail");
    }
    if config.cloudinary_credentials()?.is_none() {
        tracing::warn!("Cloudinary credentials are not set, image upload will fail");
    }
    // Init App State
    let app_state = Arc::new(AppState {
        db: pool,
        redis_conn: redis_pool,
        config: config.clone(),
        providers,
    });

    let app = init_openapi_route(app_state, &config);
    tracing::info!("run server on {}:{}", config.host, config.port);
    poem::Server::new(TcpListener::bind(format!(
        "{}:{}",
        config.host, config.port
    )))
    .run(app)
    .await?;
    Ok(())
}
