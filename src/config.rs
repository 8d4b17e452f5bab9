use std::{
    env,
    net::{IpAddr, Ipv4Addr, SocketAddr},
};

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub listen_addr: SocketAddr,
    pub model: ModelConfig,
    pub max_upload_bytes: usize,
    pub replicate: ReplicateConfig,
    pub storage: StorageConfig,
}

/// The single model this endpoint forwards images to.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Alias used by the handler, e.g. `ddcolor`.
    pub name: String,
    /// Replicate `owner/name`.
    pub reference: String,
    pub version: Option<String>,
    pub output_formats: Vec<String>,
}

#[derive(Clone)]
pub struct ReplicateConfig {
    pub api_url: String,
    pub api_token: String,
}

#[derive(Clone)]
pub struct StorageConfig {
    pub bucket: String,
    pub region: String,
    pub endpoint: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub prefix: String,
    pub public_url: Option<String>,
    pub acl: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let listen_addr = env::var("SERVER_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".into())
            .parse()
            .unwrap_or_else(|_| SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 8080));

        let model = ModelConfig {
            name: env::var("MODEL_NAME").unwrap_or_else(|_| "ddcolor".to_string()),
            reference: env::var("MODEL_REF").unwrap_or_else(|_| "piddnad/ddcolor".to_string()),
            version: env::var("MODEL_VERSION").ok().filter(|v| !v.trim().is_empty()),
            output_formats: parse_list(
                &env::var("OUTPUT_FORMATS").unwrap_or_else(|_| "png,jpg,webp".to_string()),
            ),
        };

        let max_upload_bytes = env::var("MAX_UPLOAD_BYTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(20 * 1024 * 1024);

        let replicate = ReplicateConfig {
            api_url: env::var("REPLICATE_API_URL")
                .unwrap_or_else(|_| "https://api.replicate.com/v1".to_string()),
            api_token: required("REPLICATE_API_TOKEN")?,
        };

        let region = env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".to_string());
        let storage = StorageConfig {
            bucket: required("S3_BUCKET")?,
            endpoint: env::var("S3_ENDPOINT")
                .unwrap_or_else(|_| format!("https://s3.{region}.amazonaws.com")),
            region,
            access_key_id: required("S3_ACCESS_KEY_ID")?,
            secret_access_key: required("S3_SECRET_ACCESS_KEY")?,
            prefix: env::var("S3_PREFIX").unwrap_or_else(|_| "uploads".to_string()),
            public_url: env::var("S3_PUBLIC_URL").ok().filter(|v| !v.trim().is_empty()),
            acl: env::var("S3_ACL").ok().filter(|v| !v.trim().is_empty()),
        };

        Ok(Self {
            listen_addr,
            model,
            max_upload_bytes,
            replicate,
            storage,
        })
    }
}

// Secrets stay out of `{:?}` output, which main logs at startup.
impl std::fmt::Debug for ReplicateConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplicateConfig")
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .field("prefix", &self.prefix)
            .field("public_url", &self.public_url)
            .field("acl", &self.acl)
            .finish_non_exhaustive()
    }
}

fn required(name: &str) -> anyhow::Result<String> {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .with_context(|| format!("environment variable {name} must be set"))
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_list_trims_and_lowercases() {
        assert_eq!(parse_list(" PNG, jpg ,,webp "), vec!["png", "jpg", "webp"]);
    }

    #[test]
    fn parse_list_empty_input() {
        assert!(parse_list("").is_empty());
    }

    #[test]
    fn debug_output_hides_secrets() {
        let storage = StorageConfig {
            bucket: "images".into(),
            region: "us-east-1".into(),
            endpoint: "https://s3.us-east-1.amazonaws.com".into(),
            access_key_id: "AKIDEXAMPLE".into(),
            secret_access_key: "very-secret".into(),
            prefix: "uploads".into(),
            public_url: None,
            acl: None,
        };
        let rendered = format!("{storage:?}");
        assert!(rendered.contains("images"));
        assert!(!rendered.contains("very-secret"));
        assert!(!rendered.contains("AKIDEXAMPLE"));

        let replicate = ReplicateConfig {
            api_url: "https://api.replicate.com/v1".into(),
            api_token: "r8_secret".into(),
        };
        assert!(!format!("{replicate:?}").contains("r8_secret"));
    }
}
