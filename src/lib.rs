pub mod application;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod schema;

#[cfg(test)]
mod testing;

use std::error::Error;
use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::middleware::{Condition, ErrorHandlers, Logger};
use actix_web::{web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use tokio::task::JoinHandle;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::application::notifier::Notifier;
use crate::application::tokens::TokenService;
use crate::config::AppConfig;
use crate::domain::ports::{CacheStore, Mailer, ObjectStorage};
use crate::handlers::openapi::ApiDoc;
use crate::handlers::{routes, AppState};
use crate::infrastructure::cache::{InMemoryCache, RedisCache};
use crate::infrastructure::mailer::{spawn_worker, LogMailer, SmtpMailer};
use crate::infrastructure::storage::{HttpObjectStorage, UnconfiguredStorage};
use crate::infrastructure::Repositories;

pub use db::{create_pool, DbPool};

pub type BoxError = Box<dyn Error + Send + Sync>;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) -> Result<(), BoxError> {
    let mut conn = pool.get()?;
    let applied = conn.run_pending_migrations(MIGRATIONS)?;
    log::info!("applied {} pending migration(s)", applied.len());
    Ok(())
}

/// Wires the configured collaborators into the shared application state and
/// starts the mail worker. Must be called inside a Tokio runtime.
pub fn build_state(config: &AppConfig, pool: DbPool) -> Result<(AppState, JoinHandle<()>), BoxError> {
    let cache: Arc<dyn CacheStore> = match &config.redis_url {
        Some(url) => {
            log::info!("using redis cache");
            Arc::new(RedisCache::connect(url)?)
        }
        None => {
            log::info!("REDIS_URL not set, using in-process cache");
            Arc::new(InMemoryCache::new())
        }
    };

    let mailer: Arc<dyn Mailer> = match &config.smtp {
        Some(smtp) => Arc::new(SmtpMailer::new(smtp)?),
        None => {
            log::warn!("SMTP_HOST not set, emails will only be logged");
            Arc::new(LogMailer)
        }
    };

    let storage: Arc<dyn ObjectStorage> = match &config.storage {
        Some(settings) => Arc::new(HttpObjectStorage::new(settings.clone())),
        None => {
            log::warn!("STORAGE_URL/STORAGE_KEY not set, image uploads are disabled");
            Arc::new(UnconfiguredStorage)
        }
    };

    let tokens = TokenService::new(
        config.jwt_secret.clone(),
        config.jwt_refresh_secret.clone(),
        config.access_ttl_secs,
        config.refresh_ttl_secs,
    );
    let (notifier, rx) = Notifier::channel();
    let worker = spawn_worker(mailer, rx, config.currency.clone());

    let state = AppState::new(Repositories::diesel(pool), cache, tokens, notifier, storage);
    Ok((state, worker))
}

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server. Outside production, 500 responses also carry the
/// underlying error message.
pub fn build_server(
    state: AppState,
    config: &AppConfig,
) -> std::io::Result<actix_web::dev::Server> {
    let state = web::Data::new(state);
    let openapi = ApiDoc::openapi();
    let expose_internal_details = !config.is_production();
    Ok(HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Condition::new(
                expose_internal_details,
                ErrorHandlers::new()
                    .handler(StatusCode::INTERNAL_SERVER_ERROR, errors::with_internal_details),
            ))
            .wrap(Logger::default())
            .configure(routes)
            .service(SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", openapi.clone()))
    })
    .bind((config.host.clone(), config.port))?
    .run())
}
