pub mod config;
pub mod cors;
pub mod envelope;
pub mod error;
pub mod prediction;
pub mod server;
pub mod storage;

pub use config::AppConfig;
pub use envelope::ApiResponse;
pub use error::ServiceError;
pub use prediction::{PredictionClient, PredictionResult, PredictionStatus, ReplicateClient};
pub use server::build_router;
pub use storage::{ImageUpload, ObjectStore, S3Uploader, UploadResult};
