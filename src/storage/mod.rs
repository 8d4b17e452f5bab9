mod s3;
pub mod signing;

use async_trait::async_trait;
use axum::body::Bytes;

use crate::error::ServiceError;

pub use s3::S3Uploader;

/// An image received from a multipart form, not yet stored.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

#[derive(Debug, Clone)]
pub struct UploadResult {
    /// Publicly reachable URL handed to the prediction API.
    pub url: String,
    pub key: String,
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn upload(&self, image: ImageUpload) -> Result<UploadResult, ServiceError>;
}
