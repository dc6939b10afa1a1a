use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ImageHostConfig {
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
    /// Base of the `secure_url` handed back to clients.
    pub public_url: String,
    /// Prefix under which offer pictures are stored.
    pub folder: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub host: String,
    pub port: u16,
    pub images: ImageHostConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let db_max_connections = parsed_var("DB_MAX_CONNECTIONS").unwrap_or(10);
        let host = std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port = parsed_var("APP_PORT")
            .or_else(|| parsed_var("PORT"))
            .unwrap_or(8080);

        let endpoint = std::env::var("IMAGE_ENDPOINT").context("IMAGE_ENDPOINT is not set")?;
        let bucket = std::env::var("IMAGE_BUCKET").context("IMAGE_BUCKET is not set")?;
        let images = ImageHostConfig {
            public_url: std::env::var("IMAGE_PUBLIC_URL")
                .unwrap_or_else(|_| format!("{}/{}", endpoint.trim_end_matches('/'), bucket)),
            access_key: std::env::var("IMAGE_ACCESS_KEY").context("IMAGE_ACCESS_KEY is not set")?,
            secret_key: std::env::var("IMAGE_SECRET_KEY").context("IMAGE_SECRET_KEY is not set")?,
            region: std::env::var("IMAGE_REGION").unwrap_or_else(|_| "us-east-1".into()),
            folder: std::env::var("IMAGE_FOLDER").unwrap_or_else(|_| "vinted/offers".into()),
            timeout: Duration::from_secs(parsed_var("IMAGE_TIMEOUT_SECS").unwrap_or(30)),
            endpoint,
            bucket,
        };

        Ok(Self {
            database_url,
            db_max_connections,
            host,
            port,
            images,
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parsed_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}
