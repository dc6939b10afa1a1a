use anyhow::Context;
use async_trait::async_trait;
use aws_config::{defaults, BehaviorVersion};
use aws_credential_types::Credentials;
use aws_sdk_s3::{
    config::{Builder as S3ConfigBuilder, Region},
    Client,
};
use aws_smithy_types::byte_stream::ByteStream;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::config::ImageHostConfig;

/// Reference to an asset held by the image host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredImage {
    pub secure_url: String,
    pub public_id: String,
}

#[async_trait]
pub trait ImageHost: Send + Sync {
    /// Stores `body` under `public_id`, replacing any asset already there.
    async fn upload(
        &self,
        public_id: &str,
        body: Bytes,
        content_type: &str,
    ) -> anyhow::Result<StoredImage>;

    /// Removes the asset. Removing an asset that does not exist succeeds.
    async fn destroy(&self, public_id: &str) -> anyhow::Result<()>;
}

/// S3-compatible bucket (AWS, MinIO, R2...) serving offer pictures.
#[derive(Clone)]
pub struct S3ImageHost {
    client: Client,
    bucket: String,
    public_url: String,
}

impl S3ImageHost {
    pub async fn new(cfg: &ImageHostConfig) -> anyhow::Result<Self> {
        let shared = defaults(BehaviorVersion::latest())
            .region(Region::new(cfg.region.clone()))
            .credentials_provider(Credentials::new(
                &cfg.access_key,
                &cfg.secret_key,
                None,
                None,
                "static",
            ))
            .endpoint_url(&cfg.endpoint)
            .load()
            .await;

        let conf = S3ConfigBuilder::from(&shared)
            .endpoint_url(&cfg.endpoint)
            .force_path_style(true)
            .build();

        Ok(Self {
            client: Client::from_conf(conf),
            bucket: cfg.bucket.clone(),
            public_url: cfg.public_url.trim_end_matches('/').to_string(),
        })
    }

    fn secure_url(&self, public_id: &str) -> String {
        format!("{}/{}", self.public_url, public_id)
    }
}

#[async_trait]
impl ImageHost for S3ImageHost {
    async fn upload(
        &self,
        public_id: &str,
        body: Bytes,
        content_type: &str,
    ) -> anyhow::Result<StoredImage> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(public_id)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .context("s3 put_object")?;
        Ok(StoredImage {
            secure_url: self.secure_url(public_id),
            public_id: public_id.to_string(),
        })
    }

    async fn destroy(&self, public_id: &str) -> anyhow::Result<()> {
        // S3 answers 204 for missing keys too.
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(public_id)
            .send()
            .await
            .context("s3 delete_object")?;
        Ok(())
    }
}
