use std::env;

use thiserror::Error;

use crate::application::tokens::{DEFAULT_ACCESS_TTL_SECS, DEFAULT_REFRESH_TTL_SECS};
use crate::infrastructure::mailer::SmtpSettings;
use crate::infrastructure::storage::StorageSettings;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} is not valid: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub db_pool_size: u32,
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub redis_url: Option<String>,
    pub jwt_secret: String,
    pub jwt_refresh_secret: String,
    pub access_ttl_secs: i64,
    pub refresh_ttl_secs: i64,
    pub smtp: Option<SmtpSettings>,
    pub storage: Option<StorageSettings>,
    pub currency: String,
}

impl AppConfig {
    /// Reads the process environment. Call `dotenvy::dotenv()` first to pick up `.env`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let environment = get("APP_ENV").unwrap_or_else(|| "development".to_string());
        let production = environment == "production";

        let jwt_secret = match get("JWT_SECRET") {
            Some(secret) => secret,
            None if production => return Err(ConfigError::Missing("JWT_SECRET")),
            None => {
                log::warn!("JWT_SECRET is not set, using an insecure development secret");
                "dev-access-secret-change-me".to_string()
            }
        };
        let jwt_refresh_secret = match get("JWT_REFRESH_SECRET") {
            Some(secret) => secret,
            None if production => return Err(ConfigError::Missing("JWT_REFRESH_SECRET")),
            None => format!("{jwt_secret}-refresh"),
        };

        let smtp = match get("SMTP_HOST") {
            Some(host) => Some(SmtpSettings {
                host,
                port: parse(&get, "SMTP_PORT", 587)?,
                username: get("SMTP_USERNAME"),
                password: get("SMTP_PASSWORD"),
                from_address: required("EMAIL_FROM_ADDRESS")?,
                from_name: get("EMAIL_FROM_NAME").unwrap_or_else(|| "Supplements Store".to_string()),
            }),
            None => None,
        };

        let storage = match (get("STORAGE_URL"), get("STORAGE_KEY")) {
            (Some(url), Some(service_key)) => Some(StorageSettings {
                url,
                service_key,
                bucket: get("STORAGE_BUCKET").unwrap_or_else(|| "product-images".to_string()),
            }),
            _ => None,
        };

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            db_pool_size: parse(&get, "DB_POOL_SIZE", 10)?,
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse(&get, "PORT", 8080)?,
            environment,
            redis_url: get("REDIS_URL"),
            jwt_secret,
            jwt_refresh_secret,
            access_ttl_secs: parse(&get, "JWT_ACCESS_TTL_SECS", DEFAULT_ACCESS_TTL_SECS)?,
            refresh_ttl_secs: parse(&get, "JWT_REFRESH_TTL_SECS", DEFAULT_REFRESH_TTL_SECS)?,
            smtp,
            storage,
            currency: get("CURRENCY").unwrap_or_else(|| "PKR".to_string()),
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

fn parse<T: std::str::FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match get(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply() {
        let cfg = config(&[("DATABASE_URL", "postgres://localhost/shop")]).expect("config");
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.db_pool_size, 10);
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.currency, "PKR");
        assert_eq!(cfg.access_ttl_secs, DEFAULT_ACCESS_TTL_SECS);
        assert!(cfg.smtp.is_none());
        assert!(cfg.storage.is_none());
        assert!(!cfg.is_production());
        assert_ne!(cfg.jwt_secret, cfg.jwt_refresh_secret);
    }

    #[test]
    fn database_url_is_required() {
        assert!(matches!(
            config(&[]),
            Err(ConfigError::Missing("DATABASE_URL"))
        ));
    }

    #[test]
    fn production_requires_jwt_secrets() {
        let err = config(&[
            ("DATABASE_URL", "postgres://localhost/shop"),
            ("APP_ENV", "production"),
        ])
        .expect_err("secret required");
        assert!(matches!(err, ConfigError::Missing("JWT_SECRET")));
    }

    #[test]
    fn bad_port_is_reported() {
        let err = config(&[
            ("DATABASE_URL", "postgres://localhost/shop"),
            ("PORT", "eighty"),
        ])
        .expect_err("invalid port");
        assert_eq!(err.to_string(), "PORT is not valid: eighty");
    }

    #[test]
    fn smtp_needs_a_sender() {
        let cfg = config(&[
            ("DATABASE_URL", "postgres://localhost/shop"),
            ("SMTP_HOST", "smtp.example.test"),
            ("EMAIL_FROM_ADDRESS", "orders@example.test"),
        ])
        .expect("config");
        let smtp = cfg.smtp.expect("smtp configured");
        assert_eq!(smtp.port, 587);
        assert_eq!(smtp.from_address, "orders@example.test");
    }
}
