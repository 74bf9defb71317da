use anyhow::Context;
use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    /// `DATABASE_URL` is required; `APP_HOST` and `APP_PORT` fall back to
    /// 127.0.0.1:3000.
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = match env::var("APP_PORT") {
            Ok(raw) => raw
                .parse::<u16>()
                .with_context(|| format!("APP_PORT {raw:?} is not a valid port"))?,
            Err(_) => 3000,
        };
        Ok(Self {
            database_url,
            host,
            port,
        })
    }
}
