use std::io;

use dotenvy::dotenv;
use storefront_api::config::AppConfig;
use storefront_api::{build_server, build_state, create_pool, run_migrations};

fn startup_error(context: &str, e: impl std::fmt::Display) -> io::Error {
    log::error!("{context}: {e}");
    io::Error::other(format!("{context}: {e}"))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = AppConfig::from_env().map_err(|e| startup_error("invalid configuration", e))?;

    let pool = create_pool(&config.database_url, config.db_pool_size)
        .map_err(|e| startup_error("failed to create database pool", e))?;
    run_migrations(&pool).map_err(|e| startup_error("failed to run database migrations", e))?;

    let (state, _mail_worker) =
        build_state(&config, pool).map_err(|e| startup_error("failed to initialise services", e))?;

    log::info!(
        "Starting server at http://{}:{} ({})",
        config.host,
        config.port,
        config.environment
    );

    build_server(state, &config)?.await
}
