use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Url, header};
use tracing::info;
use uuid::Uuid;

use crate::{
    config::StorageConfig,
    error::ServiceError,
    storage::{
        ImageUpload, ObjectStore, UploadResult,
        signing::{self, CanonicalRequest, Credentials},
    },
};

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Uploads objects to an S3-compatible bucket using path-style addressing.
pub struct S3Uploader {
    http: reqwest::Client,
    endpoint: Url,
    config: StorageConfig,
}

impl S3Uploader {
    pub fn new(config: StorageConfig) -> Result<Self, ServiceError> {
        let endpoint = Url::parse(config.endpoint.trim_end_matches('/')).map_err(|e| {
            ServiceError::Storage(format!("invalid S3 endpoint {}: {e}", config.endpoint))
        })?;
        if endpoint.host_str().is_none() {
            return Err(ServiceError::Storage(format!(
                "S3 endpoint has no host: {}",
                config.endpoint
            )));
        }
        Ok(Self {
            http: reqwest::Client::new(),
            endpoint,
            config,
        })
    }

    fn object_key(&self, image: &ImageUpload) -> String {
        let ext = extension_for(image.file_name.as_deref(), image.content_type.as_deref());
        let prefix = self.config.prefix.trim_matches('/');
        if prefix.is_empty() {
            format!("{}.{ext}", Uuid::new_v4())
        } else {
            format!("{prefix}/{}.{ext}", Uuid::new_v4())
        }
    }

    fn object_path(&self, key: &str) -> String {
        let base = self.endpoint.path().trim_end_matches('/');
        signing::encode_path(&format!("{base}/{}/{key}", self.config.bucket))
    }

    fn host(&self) -> String {
        // `host_str` presence is checked in `new`.
        let host = self.endpoint.host_str().unwrap_or_default();
        match self.endpoint.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        }
    }

    fn public_url(&self, key: &str, object_url: &str) -> String {
        match self.config.public_url.as_deref() {
            Some(base) => format!("{}/{key}", base.trim_end_matches('/')),
            None => object_url.to_string(),
        }
    }
}

#[async_trait]
impl ObjectStore for S3Uploader {
    async fn upload(&self, image: ImageUpload) -> Result<UploadResult, ServiceError> {
        let key = self.object_key(&image);
        let path = self.object_path(&key);
        let object_url = format!(
            "{}://{}{path}",
            self.endpoint.scheme(),
            self.host()
        );
        let content_type = image
            .content_type
            .clone()
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

        let now = Utc::now();
        let payload_sha256 = signing::sha256_hex(&image.bytes);
        let mut signed = vec![
            ("host".to_string(), self.host()),
            ("x-amz-content-sha256".to_string(), payload_sha256.clone()),
            ("x-amz-date".to_string(), signing::amz_date(now)),
        ];
        if let Some(acl) = &self.config.acl {
            signed.push(("x-amz-acl".to_string(), acl.clone()));
        }

        let authorization = signing::authorization(
            &Credentials {
                access_key_id: &self.config.access_key_id,
                secret_access_key: &self.config.secret_access_key,
            },
            &self.config.region,
            "s3",
            now,
            &CanonicalRequest {
                method: "PUT",
                uri: &path,
                query: "",
                headers: &signed,
                payload_sha256: &payload_sha256,
            },
        );

        let size = image.bytes.len();
        let mut request = self
            .http
            .put(&object_url)
            .header(header::AUTHORIZATION, authorization)
            .header(header::CONTENT_TYPE, content_type)
            .body(image.bytes);
        // reqwest derives Host from the URL.
        for (name, value) in signed.iter().filter(|(name, _)| name != "host") {
            request = request.header(name.as_str(), value.as_str());
        }

        let resp = request.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ServiceError::Storage(format!(
                "S3 upload failed ({}): {}",
                status.as_u16(),
                body.trim()
            )));
        }

        info!(%key, size, bucket = %self.config.bucket, "image stored");
        Ok(UploadResult {
            url: self.public_url(&key, &object_url),
            key,
        })
    }
}

fn extension_for(file_name: Option<&str>, content_type: Option<&str>) -> String {
    let from_name = file_name
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric()));
    if let Some(ext) = from_name {
        return ext;
    }

    let ext = match content_type.map(|ct| ct.split(';').next().unwrap_or(ct).trim()) {
        Some("image/jpeg") | Some("image/jpg") => "jpg",
        Some("image/png") => "png",
        Some("image/webp") => "webp",
        Some("image/gif") => "gif",
        Some("image/bmp") => "bmp",
        Some("image/tiff") => "tiff",
        _ => "bin",
    };
    ext.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(endpoint: &str, public_url: Option<&str>) -> StorageConfig {
        StorageConfig {
            bucket: "photos".into(),
            region: "us-east-1".into(),
            endpoint: endpoint.into(),
            access_key_id: "AKIDEXAMPLE".into(),
            secret_access_key: "secret".into(),
            prefix: "/uploads/".into(),
            public_url: public_url.map(str::to_string),
            acl: None,
        }
    }

    fn image(file_name: Option<&str>, content_type: Option<&str>) -> ImageUpload {
        ImageUpload {
            file_name: file_name.map(str::to_string),
            content_type: content_type.map(str::to_string),
            bytes: axum::body::Bytes::from_static(b"\x89PNG"),
        }
    }

    #[test]
    fn extension_prefers_file_name() {
        assert_eq!(extension_for(Some("Old Photo.JPEG"), Some("image/png")), "jpeg");
    }

    #[test]
    fn extension_falls_back_to_content_type() {
        assert_eq!(extension_for(Some("photo"), Some("image/jpeg")), "jpg");
        assert_eq!(extension_for(None, Some("image/webp; charset=binary")), "webp");
        assert_eq!(extension_for(Some("weird.p?g"), None), "bin");
    }

    #[test]
    fn key_uses_trimmed_prefix() {
        let uploader = S3Uploader::new(config("https://s3.us-east-1.amazonaws.com", None)).unwrap();
        let key = uploader.object_key(&image(Some("a.png"), None));
        assert!(key.starts_with("uploads/"));
        assert!(key.ends_with(".png"));
        assert_eq!(key.len(), "uploads/".len() + 36 + ".png".len());
    }

    #[test]
    fn path_style_object_path_and_host() {
        let uploader = S3Uploader::new(config("http://localhost:9000/", None)).unwrap();
        assert_eq!(uploader.host(), "localhost:9000");
        assert_eq!(uploader.object_path("uploads/x.png"), "/photos/uploads/x.png");
    }

    #[test]
    fn public_url_overrides_object_url() {
        let uploader = S3Uploader::new(config(
            "https://s3.us-east-1.amazonaws.com",
            Some("https://cdn.example.com/"),
        ))
        .unwrap();
        assert_eq!(
            uploader.public_url("uploads/x.png", "https://s3.us-east-1.amazonaws.com/photos/uploads/x.png"),
            "https://cdn.example.com/uploads/x.png"
        );
    }

    #[test]
    fn rejects_unparseable_endpoint() {
        assert!(S3Uploader::new(config("not a url", None)).is_err());
    }
}
