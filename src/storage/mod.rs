//! Object storage for posting images
//!
//! Handlers only see [`ObjectStore`]; production wires in R2.

mod media;

use async_trait::async_trait;

use crate::error::AppError;

pub use media::{MediaStorage, extension_for};

/// Stores a blob and returns the public URL it is served from
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn store(&self, data: Vec<u8>, content_type: &str) -> Result<String, AppError>;
}

pub(crate) fn build_r2_http_client() -> aws_sdk_s3::config::SharedHttpClient {
    use aws_smithy_runtime::client::http::hyper_014::HyperClientBuilder;

    let https_connector = hyper_rustls::HttpsConnectorBuilder::new()
        .with_webpki_roots()
        .https_only()
        .enable_http1()
        .enable_http2()
        .build();

    HyperClientBuilder::new().build(https_connector)
}
