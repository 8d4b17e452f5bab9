use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::{error::ServiceError, prediction::PredictionResult};

/// A remote API that runs image models as asynchronous prediction jobs.
#[async_trait]
pub trait PredictionClient: Send + Sync {
    /// Output formats `model` accepts for its `output_format` input.
    async fn supported_formats(&self, model: &str) -> Result<Vec<String>, ServiceError>;

    /// Submits a job. The returned status is whatever the API reports at
    /// submission time; `output` is usually still empty.
    async fn create_prediction(
        &self,
        model: &str,
        input: Map<String, Value>,
        format: Option<&str>,
    ) -> Result<PredictionResult, ServiceError>;
}
