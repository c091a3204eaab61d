use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

/// Process-wide settings read from the environment (and `.env`).
///
/// Everything that changes per deliverable lives in
/// [`DeliverableLayout`](crate::layout::DeliverableLayout) instead.
#[derive(Debug, Clone)]
pub struct Config {
    pub db_url: String,
    pub app_name: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok(); // Load from .env file if available
        let db_url = match env::var("DB_URL") {
            Ok(url) => url,
            Err(_) => format!(
                "{}://{}:{}@{}:{}/{}",
                env::var("DB_PREFIX").unwrap_or_else(|_| "postgresql".to_string()),
                env::var("DB_USER").context("DB_USER must be set when DB_URL is not")?,
                env::var("DB_PASSWORD").context("DB_PASSWORD must be set when DB_URL is not")?,
                env::var("DB_HOST").context("DB_HOST must be set when DB_URL is not")?,
                env::var("DB_PORT").unwrap_or_else(|_| "5432".to_string()),
                env::var("DB_NAME").context("DB_NAME must be set when DB_URL is not")?,
            ),
        };

        Ok(Config {
            app_name: env::var("APP_NAME").unwrap_or_else(|_| "soils-etl".to_string()),
            db_url,
        })
    }

    /// Environment config with the database URL replaced, e.g. from `--db-url`
    pub fn with_db_url(db_url: Option<String>) -> Result<Self> {
        match db_url {
            Some(db_url) => Ok(Config {
                app_name: env::var("APP_NAME").unwrap_or_else(|_| "soils-etl".to_string()),
                db_url,
            }),
            None => Self::from_env(),
        }
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        Config {
            db_url: "sqlite::memory:".to_string(),
            app_name: "soils-etl-test".to_string(),
        }
    }
}
