//! Posting image storage using Cloudflare R2
//!
//! Files are served via R2 Custom Domain (CDN).

use async_trait::async_trait;
use aws_sdk_s3::Client as S3Client;

use super::ObjectStore;
use crate::error::AppError;
use crate::metrics::{MEDIA_BYTES_UPLOADED, MEDIA_UPLOADS_TOTAL};
use crate::storage::build_r2_http_client;

/// File extension for a supported image MIME type
pub fn extension_for(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

/// R2-backed object store for posting images
pub struct MediaStorage {
    /// S3-compatible client for R2
    client: S3Client,
    bucket: String,
    /// Public URL base (Custom Domain)
    /// e.g., "https://media.example.com"
    public_url: String,
}

impl MediaStorage {
    /// Create new media storage client
    ///
    /// # Errors
    /// Returns error if S3 client initialization fails
    pub async fn new(
        config: &crate::config::MediaStorageConfig,
        cloudflare: &crate::config::CloudflareConfig,
    ) -> Result<Self, AppError> {
        use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};

        // R2 endpoint: https://{account_id}.r2.cloudflarestorage.com
        let endpoint = format!("https://{}.r2.cloudflarestorage.com", cloudflare.account_id);

        let credentials = Credentials::new(
            &cloudflare.r2_access_key_id,
            &cloudflare.r2_secret_access_key,
            None,
            None,
            "homefeed-r2",
        );

        let s3_config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .http_client(build_r2_http_client())
            .region(Region::new("auto"))
            .endpoint_url(&endpoint)
            .credentials_provider(credentials)
            .build();

        Ok(Self {
            client: S3Client::from_conf(s3_config),
            bucket: config.bucket.clone(),
            public_url: config.public_url.trim_end_matches('/').to_string(),
        })
    }

    fn public_url_for(&self, key: &str) -> String {
        format!("{}/{}", self.public_url, key)
    }
}

#[async_trait]
impl ObjectStore for MediaStorage {
    async fn store(&self, data: Vec<u8>, content_type: &str) -> Result<String, AppError> {
        use aws_sdk_s3::primitives::ByteStream;

        let ext = extension_for(content_type).ok_or_else(|| {
            AppError::Validation(format!("unsupported image type: {content_type}"))
        })?;
        let key = format!("postings/{}.{}", ulid::Ulid::new().to_string().to_lowercase(), ext);
        let size = data.len();

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(data))
            .content_type(content_type)
            .cache_control("public, max-age=31536000") // 1 year
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("R2 upload failed: {}", e)))?;

        MEDIA_UPLOADS_TOTAL.inc();
        MEDIA_BYTES_UPLOADED.inc_by(size as f64);
        tracing::debug!(%key, size, "Posting image uploaded");

        Ok(self.public_url_for(&key))
    }
}
