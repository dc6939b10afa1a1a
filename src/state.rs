use crate::auth::repo::{PgUserRepo, UserRepo};
use crate::config::AppConfig;
use crate::offers::repo::{OfferRepo, PgOfferRepo};
use crate::storage::{ImageHost, S3ImageHost};
use anyhow::Context;
use sqlx::PgPool;
use std::sync::Arc;

/// Handles built once at startup and cloned into every request.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserRepo>,
    pub offers: Arc<dyn OfferRepo>,
    pub images: Arc<dyn ImageHost>,
}

impl AppState {
    /// Connects the pool and the image host. Returns the pool as well so the
    /// caller can run migrations on it.
    pub async fn init() -> anyhow::Result<(Self, PgPool)> {
        let config = Arc::new(AppConfig::from_env()?);

        let db = sqlx::postgres::PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;

        let images = Arc::new(S3ImageHost::new(&config.images).await?) as Arc<dyn ImageHost>;

        let state = Self::from_parts(
            config,
            Arc::new(PgUserRepo::new(db.clone())),
            Arc::new(PgOfferRepo::new(db.clone())),
            images,
        );
        Ok((state, db))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        users: Arc<dyn UserRepo>,
        offers: Arc<dyn OfferRepo>,
        images: Arc<dyn ImageHost>,
    ) -> Self {
        Self {
            config,
            users,
            offers,
            images,
        }
    }
}
